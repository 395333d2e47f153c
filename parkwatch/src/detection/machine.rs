//! Parking-state machine.
//!
//! Infers "parked" and "left the spot" transitions from a sequence of
//! location samples without explicit user action.
//!
//! # Detection Logic
//!
//! ```text
//! Stationary: displacement < stationary_radius_m   (from previous sample)
//! Parked:     stationary for confirm_delay          (confirm timer elapsed)
//! Left:       displacement > leaving_radius_m       (from the parked anchor)
//! ```
//!
//! | State                     | Small displacement            | Large displacement                 |
//! |---------------------------|-------------------------------|------------------------------------|
//! | Idle/Moving (no timer)    | start timer → PendingPark     | stay Moving                        |
//! | PendingPark (not elapsed) | no-op                         | cancel timer → Moving              |
//! | PendingPark (elapsed)     | confirm → Parked, ParkDetected|                                    |
//! | Parked                    | no-op                         | beyond leaving radius → Moving, LeavingDetected |
//!
//! Time is always supplied by the caller, so the machine is deterministic
//! and testable without a clock.

use std::fmt;
use std::time::Instant;

use crate::geo::{distance, Coordinate};

use super::config::{DetectionConfig, StationaryAnchor};
use super::error::DetectionError;

/// Tracking state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingState {
    /// No sample seen yet; there is no reference point.
    #[default]
    Idle,

    /// Last displacement exceeded the stationary radius, or no timer is running.
    Moving,

    /// Stationary, confirm timer running, park not yet confirmed.
    PendingPark,

    /// Park confirmed; the anchor is pinned to the parked position.
    Parked,
}

impl TrackingState {
    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            TrackingState::Idle => "waiting for first fix",
            TrackingState::Moving => "moving",
            TrackingState::PendingPark => "stationary, confirming park",
            TrackingState::Parked => "parked",
        }
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingState::Idle => write!(f, "idle"),
            TrackingState::Moving => write!(f, "moving"),
            TrackingState::PendingPark => write!(f, "pending_park"),
            TrackingState::Parked => write!(f, "parked"),
        }
    }
}

/// Transition emitted by the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParkingEvent {
    /// The user parked at this position.
    ParkDetected(Coordinate),

    /// The user left the spot at this (previously parked) position.
    LeavingDetected(Coordinate),
}

impl ParkingEvent {
    /// Position carried by the event.
    pub fn coordinate(&self) -> Coordinate {
        match self {
            ParkingEvent::ParkDetected(c) | ParkingEvent::LeavingDetected(c) => *c,
        }
    }

    /// Short name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ParkingEvent::ParkDetected(_) => "park",
            ParkingEvent::LeavingDetected(_) => "leave",
        }
    }
}

impl fmt::Display for ParkingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParkingEvent::ParkDetected(c) => write!(f, "parked at {}", c),
            ParkingEvent::LeavingDetected(c) => write!(f, "left spot at {}", c),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ConfirmTimer {
    started_at: Instant,
    /// Sample the pending window is measured from under `WindowStart`.
    origin: Coordinate,
}

/// Heuristic park/leave detector.
///
/// # Example
///
/// ```
/// use std::time::{Duration, Instant};
/// use parkwatch::detection::{ParkingEvent, ParkingStateMachine};
/// use parkwatch::geo::Coordinate;
///
/// let mut machine = ParkingStateMachine::with_defaults();
/// let spot = Coordinate::new(53.5511, 9.9937);
/// let t0 = Instant::now();
///
/// assert_eq!(machine.feed(spot, t0), None);
/// assert_eq!(machine.feed(spot, t0 + Duration::from_secs(5)), None);
/// assert_eq!(
///     machine.feed(spot, t0 + Duration::from_secs(35)),
///     Some(ParkingEvent::ParkDetected(spot))
/// );
/// ```
#[derive(Debug)]
pub struct ParkingStateMachine {
    config: DetectionConfig,
    state: TrackingState,
    anchor: Option<Coordinate>,
    timer: Option<ConfirmTimer>,
}

impl ParkingStateMachine {
    /// Create a machine with the given configuration.
    pub fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            state: TrackingState::Idle,
            anchor: None,
            timer: None,
        }
    }

    /// Create with default thresholds.
    pub fn with_defaults() -> Self {
        Self::new(DetectionConfig::default())
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    /// Current reference point, if any sample has been seen.
    pub fn anchor(&self) -> Option<Coordinate> {
        self.anchor
    }

    /// Parked position while in `Parked`.
    pub fn parked_at(&self) -> Option<Coordinate> {
        match self.state {
            TrackingState::Parked => self.anchor,
            _ => None,
        }
    }

    pub fn has_pending_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// When the pending confirm timer expires.
    ///
    /// Returns `Ok(None)` when no timer is running and
    /// [`DetectionError::TimerOverflow`] when the deadline is not
    /// representable.
    pub fn confirm_deadline(&self) -> Result<Option<Instant>, DetectionError> {
        match self.timer {
            None => Ok(None),
            Some(timer) => timer
                .started_at
                .checked_add(self.config.confirm_delay)
                .map(Some)
                .ok_or(DetectionError::TimerOverflow),
        }
    }

    /// Feed one location sample received at `now`.
    ///
    /// Emits at most one event. The very first sample only establishes the
    /// baseline. Callers should reject non-finite coordinates beforehand; a
    /// NaN displacement is treated as movement.
    pub fn feed(&mut self, sample: Coordinate, now: Instant) -> Option<ParkingEvent> {
        let Some(anchor) = self.anchor else {
            self.anchor = Some(sample);
            self.state = TrackingState::Moving;
            tracing::debug!(lat = sample.latitude, lon = sample.longitude, "Baseline fix");
            return None;
        };

        if self.state == TrackingState::Parked {
            return self.feed_parked(anchor, sample);
        }

        let reference = match (self.config.stationary_anchor, self.timer) {
            (StationaryAnchor::WindowStart, Some(timer)) => timer.origin,
            _ => anchor,
        };
        let displacement = distance(reference, sample);
        self.anchor = Some(sample);

        if displacement < self.config.stationary_radius_m {
            let pending = self.timer;
            match pending {
                None => {
                    self.timer = Some(ConfirmTimer {
                        started_at: now,
                        origin: anchor,
                    });
                    self.state = TrackingState::PendingPark;
                    tracing::debug!(
                        displacement_m = displacement,
                        delay_secs = self.config.confirm_delay.as_secs_f64(),
                        "Stationary, confirm timer started"
                    );
                    None
                }
                Some(timer)
                    if now.saturating_duration_since(timer.started_at)
                        >= self.config.confirm_delay =>
                {
                    Some(self.confirm_park(sample))
                }
                Some(_) => None,
            }
        } else {
            if self.timer.take().is_some() {
                tracing::debug!(
                    displacement_m = displacement,
                    "Movement cancelled pending park"
                );
            }
            self.state = TrackingState::Moving;
            None
        }
    }

    /// Confirm a pending park whose delay has elapsed without a new sample.
    ///
    /// The park is reported at the most recent sample.
    pub fn poll_timer(&mut self, now: Instant) -> Option<ParkingEvent> {
        if self.state != TrackingState::PendingPark {
            return None;
        }
        let timer = self.timer?;
        if now.saturating_duration_since(timer.started_at) < self.config.confirm_delay {
            return None;
        }
        let at = self.anchor?;
        Some(self.confirm_park(at))
    }

    /// Drop any pending confirm timer.
    ///
    /// Returns `true` if a timer was running.
    pub fn cancel_timer(&mut self) -> bool {
        if self.timer.take().is_none() {
            return false;
        }
        if self.state == TrackingState::PendingPark {
            self.state = TrackingState::Moving;
        }
        true
    }

    /// Forget all state, as if freshly created.
    pub fn reset(&mut self) {
        self.state = TrackingState::Idle;
        self.anchor = None;
        self.timer = None;
    }

    fn feed_parked(&mut self, parked: Coordinate, sample: Coordinate) -> Option<ParkingEvent> {
        let displacement = distance(parked, sample);
        if displacement > self.config.leaving_radius_m {
            self.state = TrackingState::Moving;
            self.anchor = Some(sample);
            tracing::info!(
                lat = parked.latitude,
                lon = parked.longitude,
                displacement_m = displacement,
                "Leaving detected"
            );
            Some(ParkingEvent::LeavingDetected(parked))
        } else {
            None
        }
    }

    fn confirm_park(&mut self, at: Coordinate) -> ParkingEvent {
        self.state = TrackingState::Parked;
        self.anchor = Some(at);
        self.timer = None;
        tracing::info!(lat = at.latitude, lon = at.longitude, "Park detected");
        ParkingEvent::ParkDetected(at)
    }
}

impl Default for ParkingStateMachine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SPOT: Coordinate = Coordinate::new(53.5511, 9.9937);

    /// Meters per degree of latitude on the haversine sphere.
    const M_PER_DEG_LAT: f64 = 111_194.93;

    fn north_of(c: Coordinate, meters: f64) -> Coordinate {
        Coordinate::new(c.latitude + meters / M_PER_DEG_LAT, c.longitude)
    }

    fn secs(base: Instant, s: u64) -> Instant {
        base + Duration::from_secs(s)
    }

    /// Drive a fresh machine into `Parked` at `SPOT`.
    fn parked_machine(t0: Instant) -> ParkingStateMachine {
        let mut machine = ParkingStateMachine::with_defaults();
        machine.feed(SPOT, t0);
        machine.feed(SPOT, secs(t0, 5));
        let event = machine.feed(SPOT, secs(t0, 35));
        assert_eq!(event, Some(ParkingEvent::ParkDetected(SPOT)));
        machine
    }

    #[test]
    fn test_tracking_state_display() {
        assert_eq!(format!("{}", TrackingState::Idle), "idle");
        assert_eq!(format!("{}", TrackingState::PendingPark), "pending_park");
        assert_eq!(TrackingState::Parked.description(), "parked");
    }

    #[test]
    fn test_initial_state() {
        let machine = ParkingStateMachine::with_defaults();
        assert_eq!(machine.state(), TrackingState::Idle);
        assert_eq!(machine.anchor(), None);
        assert!(!machine.has_pending_timer());
        assert_eq!(machine.confirm_deadline(), Ok(None));
    }

    #[test]
    fn test_first_sample_never_emits() {
        let mut machine = ParkingStateMachine::with_defaults();
        assert_eq!(machine.feed(SPOT, Instant::now()), None);
        assert_eq!(machine.state(), TrackingState::Moving);
        assert_eq!(machine.anchor(), Some(SPOT));
        assert!(!machine.has_pending_timer());
    }

    #[test]
    fn test_reference_scenario() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();

        assert_eq!(machine.feed(SPOT, t0), None);
        assert_eq!(machine.feed(SPOT, secs(t0, 5)), None);
        assert_eq!(machine.state(), TrackingState::PendingPark);
        assert_eq!(machine.confirm_deadline(), Ok(Some(secs(t0, 35))));

        assert_eq!(
            machine.feed(SPOT, secs(t0, 35)),
            Some(ParkingEvent::ParkDetected(SPOT))
        );
        assert_eq!(machine.state(), TrackingState::Parked);
        assert_eq!(machine.parked_at(), Some(SPOT));

        let away = Coordinate::new(53.5520, 9.9937);
        assert_eq!(
            machine.feed(away, secs(t0, 40)),
            Some(ParkingEvent::LeavingDetected(SPOT))
        );
        assert_eq!(machine.state(), TrackingState::Moving);
        assert_eq!(machine.anchor(), Some(away));
    }

    #[test]
    fn test_park_fires_once() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();
        let nearby = north_of(SPOT, 5.0);

        machine.feed(SPOT, t0);
        assert_eq!(machine.feed(nearby, secs(t0, 1)), None);

        let third = north_of(nearby, 4.0);
        assert_eq!(
            machine.feed(third, secs(t0, 31)),
            Some(ParkingEvent::ParkDetected(third))
        );

        for i in 0..10 {
            assert_eq!(machine.feed(north_of(third, 2.0), secs(t0, 40 + i)), None);
        }
        assert_eq!(machine.state(), TrackingState::Parked);
        assert_eq!(machine.parked_at(), Some(third));
    }

    #[test]
    fn test_not_elapsed_is_no_op() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();

        machine.feed(SPOT, t0);
        machine.feed(SPOT, secs(t0, 5));
        assert_eq!(machine.feed(SPOT, secs(t0, 20)), None);
        assert_eq!(machine.feed(SPOT, secs(t0, 34)), None);
        assert_eq!(machine.state(), TrackingState::PendingPark);
    }

    #[test]
    fn test_rapid_feeds_do_not_restart_timer() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();

        machine.feed(SPOT, t0);
        machine.feed(SPOT, secs(t0, 1));
        let deadline = machine.confirm_deadline().unwrap();

        for s in 2..10 {
            machine.feed(SPOT, secs(t0, s));
            assert_eq!(machine.confirm_deadline().unwrap(), deadline);
        }

        // Timer started at t=1, so t=31 confirms
        assert!(matches!(
            machine.feed(SPOT, secs(t0, 31)),
            Some(ParkingEvent::ParkDetected(_))
        ));
    }

    #[test]
    fn test_movement_cancels_pending_park() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();

        machine.feed(SPOT, t0);
        machine.feed(SPOT, secs(t0, 5));
        assert!(machine.has_pending_timer());

        let moved = north_of(SPOT, 25.0);
        assert_eq!(machine.feed(moved, secs(t0, 10)), None);
        assert!(!machine.has_pending_timer());
        assert_eq!(machine.state(), TrackingState::Moving);
        assert_eq!(machine.anchor(), Some(moved));

        // A stationary sample after the old deadline restarts the window
        assert_eq!(machine.feed(moved, secs(t0, 40)), None);
        assert_eq!(machine.state(), TrackingState::PendingPark);
        assert_eq!(machine.confirm_deadline(), Ok(Some(secs(t0, 70))));
    }

    #[test]
    fn test_moving_updates_anchor() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();
        let mut position = SPOT;
        machine.feed(position, t0);

        for i in 1..=5 {
            position = north_of(position, 100.0);
            assert_eq!(machine.feed(position, secs(t0, i)), None);
            assert_eq!(machine.anchor(), Some(position));
            assert_eq!(machine.state(), TrackingState::Moving);
        }
    }

    #[test]
    fn test_leaving_reports_parked_coordinate() {
        let t0 = Instant::now();
        let mut machine = parked_machine(t0);

        let far = north_of(SPOT, 100.0);
        assert_eq!(
            machine.feed(far, secs(t0, 36)),
            Some(ParkingEvent::LeavingDetected(SPOT))
        );
        // Exactly one leaving event
        assert_eq!(machine.feed(north_of(far, 100.0), secs(t0, 37)), None);
    }

    #[test]
    fn test_between_radii_while_parked_stays_parked() {
        let t0 = Instant::now();
        let mut machine = parked_machine(t0);

        assert_eq!(machine.feed(north_of(SPOT, 30.0), secs(t0, 36)), None);
        assert_eq!(machine.state(), TrackingState::Parked);
        assert_eq!(machine.anchor(), Some(SPOT));
    }

    #[test]
    fn test_parked_anchor_is_pinned() {
        let t0 = Instant::now();
        let mut machine = parked_machine(t0);

        // Walking away in 30m steps never exceeds 50m from the previous
        // sample, but does from the pinned anchor
        assert_eq!(machine.feed(north_of(SPOT, 30.0), secs(t0, 40)), None);
        assert_eq!(
            machine.feed(north_of(SPOT, 60.0), secs(t0, 45)),
            Some(ParkingEvent::LeavingDetected(SPOT))
        );
    }

    #[test]
    fn test_poll_timer_confirms_without_sample() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();
        let last = north_of(SPOT, 3.0);

        machine.feed(SPOT, t0);
        machine.feed(last, secs(t0, 5));

        assert_eq!(machine.poll_timer(secs(t0, 30)), None);
        assert_eq!(
            machine.poll_timer(secs(t0, 35)),
            Some(ParkingEvent::ParkDetected(last))
        );
        assert_eq!(machine.state(), TrackingState::Parked);
        assert_eq!(machine.poll_timer(secs(t0, 100)), None);
    }

    #[test]
    fn test_poll_timer_without_timer() {
        let mut machine = ParkingStateMachine::with_defaults();
        assert_eq!(machine.poll_timer(Instant::now()), None);
        machine.feed(SPOT, Instant::now());
        assert_eq!(machine.poll_timer(Instant::now() + Duration::from_secs(600)), None);
    }

    #[test]
    fn test_cancel_timer() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();

        assert!(!machine.cancel_timer());

        machine.feed(SPOT, t0);
        machine.feed(SPOT, secs(t0, 5));
        assert!(machine.cancel_timer());
        assert_eq!(machine.state(), TrackingState::Moving);
        assert_eq!(machine.poll_timer(secs(t0, 100)), None);
    }

    #[test]
    fn test_previous_sample_policy_allows_slow_drift() {
        let t0 = Instant::now();
        let mut machine = ParkingStateMachine::with_defaults();
        let mut position = SPOT;
        machine.feed(position, t0);

        // 15m per 5s: every step is under the radius
        let mut event = None;
        for i in 1..=7 {
            position = north_of(position, 15.0);
            event = machine.feed(position, secs(t0, i * 5));
        }
        assert!(matches!(event, Some(ParkingEvent::ParkDetected(_))));
    }

    #[test]
    fn test_window_start_policy_cancels_on_drift() {
        let t0 = Instant::now();
        let config = DetectionConfig::default().with_stationary_anchor(StationaryAnchor::WindowStart);
        let mut machine = ParkingStateMachine::new(config);
        let mut position = SPOT;
        machine.feed(position, t0);

        for i in 1..=7 {
            position = north_of(position, 15.0);
            assert_eq!(machine.feed(position, secs(t0, i * 5)), None);
        }
        assert_ne!(machine.state(), TrackingState::Parked);
    }

    #[test]
    fn test_window_start_policy_still_parks_when_stationary() {
        let t0 = Instant::now();
        let config = DetectionConfig::default().with_stationary_anchor(StationaryAnchor::WindowStart);
        let mut machine = ParkingStateMachine::new(config);

        machine.feed(SPOT, t0);
        machine.feed(north_of(SPOT, 4.0), secs(t0, 5));
        machine.feed(north_of(SPOT, 8.0), secs(t0, 20));
        assert_eq!(
            machine.feed(north_of(SPOT, 6.0), secs(t0, 35)),
            Some(ParkingEvent::ParkDetected(north_of(SPOT, 6.0)))
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let t0 = Instant::now();
        let config = DetectionConfig::default()
            .with_stationary_radius(5.0)
            .with_leaving_radius(10.0)
            .with_confirm_delay(Duration::from_secs(10));
        let mut machine = ParkingStateMachine::new(config);

        machine.feed(SPOT, t0);
        // 8m is movement under a 5m radius
        machine.feed(north_of(SPOT, 8.0), secs(t0, 1));
        assert_eq!(machine.state(), TrackingState::Moving);

        let here = north_of(SPOT, 8.0);
        machine.feed(here, secs(t0, 2));
        assert_eq!(
            machine.feed(here, secs(t0, 12)),
            Some(ParkingEvent::ParkDetected(here))
        );
        assert_eq!(
            machine.feed(north_of(here, 12.0), secs(t0, 13)),
            Some(ParkingEvent::LeavingDetected(here))
        );
    }

    #[test]
    fn test_reset() {
        let t0 = Instant::now();
        let mut machine = parked_machine(t0);
        machine.reset();
        assert_eq!(machine.state(), TrackingState::Idle);
        assert_eq!(machine.anchor(), None);
        assert_eq!(machine.feed(SPOT, secs(t0, 50)), None);
    }

    #[test]
    fn test_event_accessors() {
        let park = ParkingEvent::ParkDetected(SPOT);
        let leave = ParkingEvent::LeavingDetected(SPOT);
        assert_eq!(park.coordinate(), SPOT);
        assert_eq!(park.kind(), "park");
        assert_eq!(leave.kind(), "leave");
        assert_eq!(leave.to_string(), "left spot at 53.55110, 9.99370");
    }
}
