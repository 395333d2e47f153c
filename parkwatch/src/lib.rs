//! ParkWatch - automatic parking spot detection.
//!
//! Watches a stream of location fixes and detects, without user action,
//! when the user has parked and when they have left the spot again.
//!
//! # Modules
//!
//! - [`geo`]: coordinates and great-circle distance
//! - [`detection`]: the parking-state machine and offline replay
//! - [`source`]: location sample sources
//! - [`session`]: live tracking sessions driving the state machine
//! - [`report`]: turning parking events into shared spot records
//! - [`telemetry`]: session counters
//! - [`config`]: INI configuration
//! - [`logging`]: tracing subscriber setup

pub mod config;
pub mod detection;
pub mod geo;
pub mod logging;
pub mod report;
pub mod session;
pub mod source;
pub mod telemetry;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
