//! Reporting error types.

use thiserror::Error;

/// Errors from reporting collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReportError {
    /// The spot store rejected or failed an operation.
    #[error("Spot store error: {0}")]
    Store(String),

    /// Reverse geocoding failed.
    #[error("Geocoding failed: {0}")]
    Geocode(String),

    /// A notification could not be delivered.
    #[error("Notification failed: {0}")]
    Notify(String),
}
