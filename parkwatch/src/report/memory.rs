//! In-memory spot store.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::geo::{self, Coordinate};

use super::error::ReportError;
use super::model::{NewSpot, ParkingSpot, SpotId};
use super::traits::{BoxFuture, SpotStore};

/// How close (meters) a release must be to the stored spot to match it.
pub const RELEASE_MATCH_RADIUS_M: f64 = 5.0;

/// Spot store held entirely in process memory.
///
/// Records are lost on exit.
#[derive(Debug)]
pub struct MemorySpotStore {
    spots: RwLock<Vec<ParkingSpot>>,
    next_id: AtomicU64,
}

impl MemorySpotStore {
    pub fn new() -> Self {
        Self {
            spots: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of stored records, occupied or not.
    pub fn len(&self) -> usize {
        self.spots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.spots.read().is_empty()
    }

    /// Copy of every stored record.
    pub fn all(&self) -> Vec<ParkingSpot> {
        self.spots.read().clone()
    }
}

impl Default for MemorySpotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotStore for MemorySpotStore {
    fn create_spot(&self, spot: NewSpot) -> BoxFuture<'_, Result<ParkingSpot, ReportError>> {
        Box::pin(async move {
            if !spot.coordinate.latitude.is_finite() || !spot.coordinate.longitude.is_finite() {
                return Err(ReportError::Store(format!(
                    "refusing spot with non-finite coordinate ({}, {})",
                    spot.coordinate.latitude, spot.coordinate.longitude
                )));
            }
            let record = ParkingSpot {
                id: SpotId(self.next_id.fetch_add(1, Ordering::Relaxed)),
                coordinate: spot.coordinate,
                address: spot.address,
                paid: spot.paid,
                reporter_id: spot.reporter_id,
                reported_at: Utc::now(),
                available: false,
            };
            debug!(spot = %record.id, "Stored spot");
            self.spots.write().push(record.clone());
            Ok(record)
        })
    }

    fn release_spot<'a>(
        &'a self,
        reporter_id: &'a str,
        coordinate: Coordinate,
    ) -> BoxFuture<'a, Result<Option<ParkingSpot>, ReportError>> {
        Box::pin(async move {
            let mut spots = self.spots.write();
            let nearest = spots
                .iter_mut()
                .filter(|s| !s.available && s.reporter_id == reporter_id)
                .map(|s| (geo::distance(s.coordinate, coordinate), s))
                .filter(|(d, _)| *d <= RELEASE_MATCH_RADIUS_M)
                .min_by(|(a, _), (b, _)| a.total_cmp(b));

            Ok(nearest.map(|(_, spot)| {
                spot.available = true;
                debug!(spot = %spot.id, "Released spot");
                spot.clone()
            }))
        })
    }

    fn spots_near(
        &self,
        center: Coordinate,
        radius_m: f64,
    ) -> BoxFuture<'_, Result<Vec<ParkingSpot>, ReportError>> {
        Box::pin(async move {
            let mut found: Vec<ParkingSpot> = self
                .spots
                .read()
                .iter()
                .filter(|s| s.available && geo::distance(s.coordinate, center) <= radius_m)
                .cloned()
                .collect();
            geo::sort_by_distance(&mut found, center, |s| s.coordinate);
            Ok(found)
        })
    }
}
