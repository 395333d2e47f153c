//! Parking detection.
//!
//! Consumes a stream of location samples and decides when the user has
//! stopped long enough to be considered parked, and when they have moved far
//! enough from that spot to be considered gone.
//!
//! # Architecture
//!
//! ```text
//! Coordinate + Instant ─────► ParkingStateMachine ─────► Option<ParkingEvent>
//!                             (Idle/Moving/PendingPark/Parked)
//! ```
//!
//! The machine never reads a clock itself. Live tracking goes through
//! [`crate::session::TrackingSession`]; recorded tracks go through
//! [`replay::replay`].

mod config;
mod error;
mod machine;
pub mod replay;

pub use config::{
    DetectionConfig, StationaryAnchor, DEFAULT_CONFIRM_DELAY, DEFAULT_LEAVING_RADIUS_M,
    DEFAULT_STATIONARY_RADIUS_M,
};
pub use error::DetectionError;
pub use machine::{ParkingEvent, ParkingStateMachine, TrackingState};
