//! Live tracking sessions.
//!
//! A [`TrackingSession`] connects a [`crate::source::LocationSource`] to a
//! [`crate::detection::ParkingStateMachine`] and reports what happens to a
//! [`SessionHandler`].
//!
//! # Architecture
//!
//! ```text
//! LocationSource ──► SampleStream ──► Worker task ──► SessionHandler
//!                                     │  select!(cancel, sample, deadline)
//!                                     └─► SessionMetrics
//! ```
//!
//! The worker is the only owner of the state machine. Samples are stamped
//! with the Tokio clock on arrival, so paused time in tests drives the
//! confirm timer deterministically.
//!
//! # Example
//!
//! ```no_run
//! use parkwatch::session::{ChannelHandler, SessionEvent, TrackingSession};
//! use parkwatch::source::ChannelSource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (source, sender) = ChannelSource::new();
//! let (handler, mut events) = ChannelHandler::new();
//!
//! let mut session = TrackingSession::with_defaults();
//! session.start(&source, handler)?;
//!
//! while let Some(event) = events.recv().await {
//!     if let SessionEvent::Park(at) = event {
//!         println!("parked at {}", at);
//!     }
//! }
//! # drop(sender);
//! session.stop().await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod handler;

pub use controller::TrackingSession;
pub use error::SessionError;
pub use handler::{Callbacks, ChannelHandler, SessionEvent, SessionHandler};
