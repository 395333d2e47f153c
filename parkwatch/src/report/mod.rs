//! Spot reporting.
//!
//! Turns parking events into shared parking-spot records. The storage,
//! address lookup and push delivery backends are collaborators behind
//! traits; this module only owns the flow between them.
//!
//! # Architecture
//!
//! ```text
//! SessionEvent::Park  ──► Geocoder::reverse ──► SpotStore::create_spot  ──► Notifier
//! SessionEvent::Leave ─────────────────────────► SpotStore::release_spot ──► Notifier
//! ```
//!
//! Every operation runs on behalf of an explicit [`AuthSession`].

mod error;
mod geocoder;
mod memory;
mod model;
mod notifier;
mod reporter;
mod traits;

pub use error::ReportError;
pub use geocoder::CoordinateGeocoder;
pub use memory::{MemorySpotStore, RELEASE_MATCH_RADIUS_M};
pub use model::{AuthSession, NewSpot, ParkingSpot, SpotId, SpotNotice};
pub use notifier::LogNotifier;
pub use reporter::{ReporterStats, SpotReporter};
pub use traits::{BoxFuture, Geocoder, Notifier, SpotStore};
