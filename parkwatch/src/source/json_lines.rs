//! JSON-lines source.
//!
//! Reads one fix per line (`{"lat": 53.5511, "lon": 9.9937}`) from any async
//! reader, such as stdin or a pipe from a GPS daemon. A malformed line
//! (including one that is not valid UTF-8) is reported as a per-sample
//! error; end of input terminates the stream.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::geo::Coordinate;

use super::{
    LocationSource, PositionFuture, RawFix, SampleItem, SampleStream, SourceError,
    DEFAULT_SAMPLE_CHANNEL_CAPACITY,
};

/// Source reading JSON fixes line by line.
///
/// Subscribing spawns a reader task on the current Tokio runtime.
pub struct JsonLinesSource<R> {
    reader: Mutex<Option<R>>,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
}

impl<R> JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            last_fix: Arc::new(Mutex::new(None)),
        }
    }
}

impl<R> LocationSource for JsonLinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn subscribe(&self) -> Result<SampleStream, SourceError> {
        let handle = Handle::try_current()
            .map_err(|e| SourceError::Unavailable(format!("no async runtime: {}", e)))?;
        let reader = self
            .reader
            .lock()
            .take()
            .ok_or(SourceError::AlreadySubscribed)?;

        let (tx, rx) = mpsc::channel(DEFAULT_SAMPLE_CHANNEL_CAPACITY);
        handle.spawn(read_lines(reader, tx, Arc::clone(&self.last_fix)));
        Ok(rx)
    }

    fn current_position(&self) -> PositionFuture<'_> {
        let result = (*self.last_fix.lock()).ok_or(SourceError::NoFix);
        Box::pin(std::future::ready(result))
    }
}

async fn read_lines<R>(
    mut reader: R,
    tx: mpsc::Sender<SampleItem>,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                let _ = tx.send(Err(SourceError::Io(e.to_string()))).await;
                break;
            }
        }
        line_no += 1;

        let item = match std::str::from_utf8(&buf) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with('#') {
                    continue;
                }
                serde_json::from_str::<RawFix>(trimmed).map_err(|e| SourceError::Malformed {
                    line: line_no,
                    reason: e.to_string(),
                })
            }
            // Bad bytes only spoil their own line.
            Err(e) => Err(SourceError::Malformed {
                line: line_no,
                reason: e.to_string(),
            }),
        };
        if let Ok(Ok(coordinate)) = item.as_ref().map(RawFix::coordinate) {
            *last_fix.lock() = Some(coordinate);
        }

        if tx.send(item).await.is_err() {
            tracing::debug!("Sample subscriber gone, stopping reader");
            break;
        }
    }

    tracing::debug!(lines = line_no, "Location input ended");
}
