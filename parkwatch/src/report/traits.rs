//! Collaborator contracts for spot reporting.
//!
//! All traits are dyn-compatible (boxed futures) so the composition root can
//! hold them as `Arc<dyn ...>`.

use std::future::Future;
use std::pin::Pin;

use crate::geo::Coordinate;

use super::error::ReportError;
use super::model::{NewSpot, ParkingSpot, SpotNotice};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistent storage of spot records.
pub trait SpotStore: Send + Sync {
    /// Store a new, occupied spot.
    fn create_spot(&self, spot: NewSpot) -> BoxFuture<'_, Result<ParkingSpot, ReportError>>;

    /// Mark the occupied spot `reporter_id` reported at `coordinate` as
    /// available.
    ///
    /// Returns `Ok(None)` when no matching occupied record exists.
    fn release_spot<'a>(
        &'a self,
        reporter_id: &'a str,
        coordinate: Coordinate,
    ) -> BoxFuture<'a, Result<Option<ParkingSpot>, ReportError>>;

    /// Available spots within `radius_m` of `center`, nearest first.
    fn spots_near(
        &self,
        center: Coordinate,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<Vec<ParkingSpot>, ReportError>>;
}

/// Reverse geocoding.
pub trait Geocoder: Send + Sync {
    /// Human-readable address for `coordinate`.
    fn reverse(&self, coordinate: Coordinate) -> BoxFuture<'_, Result<String, ReportError>>;
}

/// Push delivery of spot notices.
pub trait Notifier: Send + Sync {
    fn notify<'a>(&'a self, notice: &'a SpotNotice) -> BoxFuture<'a, Result<(), ReportError>>;
}
