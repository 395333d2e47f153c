//! In-process channel source.
//!
//! The producing side ([`SampleSender`]) is handed to whatever receives
//! fixes from the platform; the [`ChannelSource`] is handed to the session.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::geo::Coordinate;

use super::{
    LocationSource, PositionFuture, RawFix, SampleItem, SampleStream, SourceError,
    DEFAULT_SAMPLE_CHANNEL_CAPACITY,
};

/// Single-subscriber source fed through a [`SampleSender`].
#[derive(Debug)]
pub struct ChannelSource {
    receiver: Mutex<Option<SampleStream>>,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
}

/// Producing side of a [`ChannelSource`].
///
/// Dropping every sender terminates the stream.
#[derive(Debug, Clone)]
pub struct SampleSender {
    tx: mpsc::Sender<SampleItem>,
    last_fix: Arc<Mutex<Option<Coordinate>>>,
}

impl ChannelSource {
    /// Create a source with the default channel capacity.
    pub fn new() -> (Self, SampleSender) {
        Self::with_capacity(DEFAULT_SAMPLE_CHANNEL_CAPACITY)
    }

    /// Create a source with a specific channel capacity.
    pub fn with_capacity(capacity: usize) -> (Self, SampleSender) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let last_fix = Arc::new(Mutex::new(None));
        let source = Self {
            receiver: Mutex::new(Some(rx)),
            last_fix: Arc::clone(&last_fix),
        };
        (source, SampleSender { tx, last_fix })
    }
}

impl LocationSource for ChannelSource {
    fn subscribe(&self) -> Result<SampleStream, SourceError> {
        self.receiver
            .lock()
            .take()
            .ok_or(SourceError::AlreadySubscribed)
    }

    fn current_position(&self) -> PositionFuture<'_> {
        let result = (*self.last_fix.lock()).ok_or(SourceError::NoFix);
        Box::pin(std::future::ready(result))
    }
}

impl SampleSender {
    /// Send a coordinate.
    pub async fn send(&self, coordinate: Coordinate) -> Result<(), SourceError> {
        self.send_fix(RawFix::from(coordinate)).await
    }

    /// Send a raw fix, possibly incomplete.
    pub async fn send_fix(&self, fix: RawFix) -> Result<(), SourceError> {
        if let Ok(coordinate) = fix.coordinate() {
            *self.last_fix.lock() = Some(coordinate);
        }
        self.tx
            .send(Ok(fix))
            .await
            .map_err(|_| SourceError::Closed)
    }

    /// Report a failure for a single sample.
    pub async fn send_error(&self, error: SourceError) -> Result<(), SourceError> {
        self.tx
            .send(Err(error))
            .await
            .map_err(|_| SourceError::Closed)
    }

    /// Whether the subscriber is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
