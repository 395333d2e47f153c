//! Point-in-time view of session counters.

use std::fmt;
use std::time::Duration;

/// Copy of [`super::SessionMetrics`] at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub uptime: Duration,
    pub samples_received: u64,
    pub samples_skipped: u64,
    pub source_errors: u64,
    pub timers_started: u64,
    pub timers_cancelled: u64,
    pub parks_detected: u64,
    pub leaves_detected: u64,
}

impl SessionSnapshot {
    /// Uptime as `HH:MM:SS`.
    pub fn uptime_human(&self) -> String {
        let secs = self.uptime.as_secs();
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    /// Fraction of delivered samples that were rejected.
    pub fn skip_rate(&self) -> f64 {
        let total = self.samples_received + self.samples_skipped;
        if total == 0 {
            0.0
        } else {
            self.samples_skipped as f64 / total as f64
        }
    }
}

impl fmt::Display for SessionSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] samples: {} ({} skipped, {} source errors) | parks: {} | leaves: {} | timers: {} started, {} cancelled",
            self.uptime_human(),
            self.samples_received,
            self.samples_skipped,
            self.source_errors,
            self.parks_detected,
            self.leaves_detected,
            self.timers_started,
            self.timers_cancelled
        )
    }
}
