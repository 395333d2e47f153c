//! Parking detection error types.

use thiserror::Error;

/// Errors raised by the detection layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectionError {
    /// Thresholds or policy values are inconsistent.
    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    /// The confirm deadline cannot be represented on this clock.
    #[error("Confirm timer deadline overflows the clock")]
    TimerOverflow,
}
