//! Event-to-record flow.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::detection::ParkingEvent;
use crate::geo::Coordinate;
use crate::session::SessionEvent;

use super::error::ReportError;
use super::model::{AuthSession, NewSpot, ParkingSpot, SpotNotice};
use super::traits::{Geocoder, Notifier, SpotStore};

/// Counts from a [`SpotReporter::run`] loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReporterStats {
    pub spots_created: u64,
    pub spots_released: u64,
    pub failures: u64,
}

/// Publishes parks and departures of one user as spot records.
pub struct SpotReporter {
    auth: AuthSession,
    paid: bool,
    store: Arc<dyn SpotStore>,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn Notifier>,
}

impl SpotReporter {
    pub fn new(
        auth: AuthSession,
        store: Arc<dyn SpotStore>,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            auth,
            paid: false,
            store,
            geocoder,
            notifier,
        }
    }

    /// Mark reported spots as paid parking.
    pub fn with_paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    /// Handle one parking event.
    ///
    /// Returns the created or released spot. A leave without a matching
    /// occupied record returns `Ok(None)`.
    pub async fn handle(&self, event: &ParkingEvent) -> Result<Option<ParkingSpot>, ReportError> {
        match *event {
            ParkingEvent::ParkDetected(at) => self.report_park(at).await.map(Some),
            ParkingEvent::LeavingDetected(at) => self.report_leave(at).await,
        }
    }

    async fn report_park(&self, at: Coordinate) -> Result<ParkingSpot, ReportError> {
        let address = match self.geocoder.reverse(at).await {
            Ok(address) => address,
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, using coordinate");
                at.to_string()
            }
        };

        let spot = self
            .store
            .create_spot(NewSpot {
                coordinate: at,
                address,
                paid: self.paid,
                reporter_id: self.auth.user_id.clone(),
            })
            .await?;
        info!(spot = %spot.id, address = %spot.address, "Reported parked spot");

        self.announce(SpotNotice::Taken(spot.clone())).await;
        Ok(spot)
    }

    async fn report_leave(&self, at: Coordinate) -> Result<Option<ParkingSpot>, ReportError> {
        let Some(spot) = self.store.release_spot(&self.auth.user_id, at).await? else {
            debug!(%at, "No occupied spot to release");
            return Ok(None);
        };
        info!(spot = %spot.id, address = %spot.address, "Released spot");

        self.announce(SpotNotice::Freed(spot.clone())).await;
        Ok(Some(spot))
    }

    async fn announce(&self, notice: SpotNotice) {
        if let Err(e) = self.notifier.notify(&notice).await {
            warn!(error = %e, spot = %notice.spot().id, "Failed to deliver notice");
        }
    }

    /// Consume session events until the channel closes or `cancel` fires.
    ///
    /// Failures are logged and counted; the loop keeps going.
    pub async fn run(
        &self,
        mut events: mpsc::UnboundedReceiver<SessionEvent>,
        cancel: CancellationToken,
    ) -> ReporterStats {
        let mut stats = ReporterStats::default();

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let parking_event = match event {
                SessionEvent::Park(at) => ParkingEvent::ParkDetected(at),
                SessionEvent::Leave(at) => ParkingEvent::LeavingDetected(at),
                SessionEvent::Update(_) | SessionEvent::Warning(_) => continue,
            };

            match self.handle(&parking_event).await {
                Ok(Some(_)) => match parking_event {
                    ParkingEvent::ParkDetected(_) => stats.spots_created += 1,
                    ParkingEvent::LeavingDetected(_) => stats.spots_released += 1,
                },
                Ok(None) => {}
                Err(e) => {
                    stats.failures += 1;
                    warn!(error = %e, event = %parking_event, "Failed to report event");
                }
            }
        }

        debug!(?stats, "Spot reporter stopped");
        stats
    }
}
