//! Session telemetry for observability and user feedback.
//!
//! Lock-free atomic counters updated by the tracking session worker, with
//! point-in-time snapshots for display.
//!
//! # Architecture
//!
//! ```text
//! Session worker ─────► SessionMetrics ─────► SessionSnapshot ─────► Views
//!                       (atomic counters)     (point-in-time copy)     (CLI, logs)
//! ```
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parkwatch::telemetry::SessionMetrics;
//!
//! let metrics = Arc::new(SessionMetrics::new());
//! metrics.sample_received();
//! metrics.park_detected();
//!
//! let snapshot = metrics.snapshot();
//! assert_eq!(snapshot.samples_received, 1);
//! assert_eq!(snapshot.parks_detected, 1);
//! ```

mod metrics;
mod snapshot;

pub use metrics::SessionMetrics;
pub use snapshot::SessionSnapshot;
