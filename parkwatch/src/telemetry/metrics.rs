//! Atomic counters for a tracking session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::snapshot::SessionSnapshot;

/// Counters updated from the session worker.
///
/// All updates use relaxed ordering; snapshots are not a consistent cut
/// across counters.
#[derive(Debug)]
pub struct SessionMetrics {
    started_at: Instant,
    samples_received: AtomicU64,
    samples_skipped: AtomicU64,
    source_errors: AtomicU64,
    timers_started: AtomicU64,
    timers_cancelled: AtomicU64,
    parks_detected: AtomicU64,
    leaves_detected: AtomicU64,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            samples_received: AtomicU64::new(0),
            samples_skipped: AtomicU64::new(0),
            source_errors: AtomicU64::new(0),
            timers_started: AtomicU64::new(0),
            timers_cancelled: AtomicU64::new(0),
            parks_detected: AtomicU64::new(0),
            leaves_detected: AtomicU64::new(0),
        }
    }

    /// A valid sample reached the state machine.
    pub fn sample_received(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    /// An invalid sample was dropped at the boundary.
    pub fn sample_skipped(&self) {
        self.samples_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn source_error(&self) {
        self.source_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timer_started(&self) {
        self.timers_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn timer_cancelled(&self) {
        self.timers_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn park_detected(&self) {
        self.parks_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn leave_detected(&self) {
        self.leaves_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            uptime: self.started_at.elapsed(),
            samples_received: self.samples_received.load(Ordering::Relaxed),
            samples_skipped: self.samples_skipped.load(Ordering::Relaxed),
            source_errors: self.source_errors.load(Ordering::Relaxed),
            timers_started: self.timers_started.load(Ordering::Relaxed),
            timers_cancelled: self.timers_cancelled.load(Ordering::Relaxed),
            parks_detected: self.parks_detected.load(Ordering::Relaxed),
            leaves_detected: self.leaves_detected.load(Ordering::Relaxed),
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}
