//! Location sample sources.
//!
//! A [`LocationSource`] delivers a stream of raw fixes to a tracking session
//! and can be asked for a single current position on demand.
//!
//! # Architecture
//!
//! ```text
//! platform / stdin / test ──► LocationSource::subscribe() ──► SampleStream
//!                                                             (mpsc of Result<RawFix, SourceError>)
//! ```
//!
//! A stream item may be an error for a single sample; the stream closing
//! means the source has terminated.

mod channel;
mod json_lines;

pub use channel::{ChannelSource, SampleSender};
pub use json_lines::JsonLinesSource;

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::geo::Coordinate;

/// Default capacity of a source's sample channel.
pub const DEFAULT_SAMPLE_CHANNEL_CAPACITY: usize = 256;

/// One item of a sample stream.
pub type SampleItem = Result<RawFix, SourceError>;

/// Receiving side of a subscription.
pub type SampleStream = mpsc::Receiver<SampleItem>;

/// Future returned by [`LocationSource::current_position`].
pub type PositionFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Coordinate, SourceError>> + Send + 'a>>;

/// Errors reported by a location source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The source only supports a single subscriber.
    #[error("Source already has a subscriber")]
    AlreadySubscribed,

    /// No position has been observed yet.
    #[error("No position fix available")]
    NoFix,

    /// The receiving side of the stream is gone.
    #[error("Sample stream closed")]
    Closed,

    /// The platform location service is unavailable.
    #[error("Location service unavailable: {0}")]
    Unavailable(String),

    /// A single sample could not be decoded.
    #[error("Malformed sample on line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    /// Reading from the underlying input failed.
    #[error("I/O error: {0}")]
    Io(String),
}

/// Errors for a fix that cannot be turned into a coordinate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("Sample is missing latitude or longitude")]
    MissingCoordinate,

    #[error("Sample coordinate is not finite ({latitude}, {longitude})")]
    NotFinite { latitude: f64, longitude: f64 },
}

/// A fix as delivered by a source, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFix {
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
}

impl RawFix {
    /// Convert to a coordinate, rejecting missing or non-finite components.
    ///
    /// Out-of-range values pass; range checks belong to the caller.
    pub fn coordinate(&self) -> Result<Coordinate, SampleError> {
        let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) else {
            return Err(SampleError::MissingCoordinate);
        };
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(SampleError::NotFinite {
                latitude,
                longitude,
            });
        }
        Ok(Coordinate::new(latitude, longitude))
    }
}

impl From<Coordinate> for RawFix {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: Some(c.latitude),
            longitude: Some(c.longitude),
        }
    }
}

/// Producer of location samples.
pub trait LocationSource: Send + Sync {
    /// Start receiving samples.
    fn subscribe(&self) -> Result<SampleStream, SourceError>;

    /// Get the current position once.
    fn current_position(&self) -> PositionFuture<'_>;
}
