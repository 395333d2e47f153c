//! Tracking session error types.

use thiserror::Error;

use crate::detection::DetectionError;
use crate::geo::GeoError;
use crate::source::{SampleError, SourceError};

/// Errors raised by a [`super::TrackingSession`].
///
/// Per-sample variants are delivered through
/// [`super::SessionHandler::on_warning`] and never end the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// `start` was called while a worker is still running.
    #[error("Tracking session already running")]
    AlreadyRunning,

    /// No Tokio runtime to spawn the worker on.
    #[error("Tracking session needs a Tokio runtime: {0}")]
    NoRuntime(String),

    #[error(transparent)]
    InvalidConfig(DetectionError),

    /// The source refused the subscription.
    #[error("Failed to subscribe to location source: {0}")]
    Subscribe(SourceError),

    /// The source reported a failure for a single sample.
    #[error("Location source error: {0}")]
    Source(SourceError),

    /// A sample without a usable coordinate was skipped.
    #[error("Skipped invalid sample: {0}")]
    InvalidSample(SampleError),

    /// A sample outside the valid coordinate range was skipped.
    #[error("Skipped out-of-range sample: {0}")]
    OutOfRange(GeoError),

    /// The confirm timer could not be scheduled. Fatal to the session.
    #[error("Failed to schedule confirm timer: {0}")]
    TimerSchedule(DetectionError),

    /// The worker task panicked or was aborted.
    #[error("Tracking worker failed: {0}")]
    WorkerFailed(String),
}

impl SessionError {
    /// Whether this error ended the session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SessionError::TimerSchedule(_) | SessionError::WorkerFailed(_)
        )
    }
}

impl From<GeoError> for SessionError {
    fn from(e: GeoError) -> Self {
        SessionError::OutOfRange(e)
    }
}

impl From<SampleError> for SessionError {
    fn from(e: SampleError) -> Self {
        SessionError::InvalidSample(e)
    }
}
