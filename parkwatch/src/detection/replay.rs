//! Offline replay of recorded tracks.
//!
//! Runs a fresh [`ParkingStateMachine`] over a timestamped track with virtual
//! time, for tuning thresholds against recorded drives.
//!
//! # Track format
//!
//! One JSON object per line, `t` in seconds from the start of the track:
//!
//! ```text
//! {"t": 0,  "lat": 53.5511, "lon": 9.9937}
//! {"t": 5,  "lat": 53.5511, "lon": 9.9937}
//! {"t": 35, "lat": 53.5511, "lon": 9.9937}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.
//!
//! # Timer ordering
//!
//! A confirm timer that expires strictly before the next sample fires at its
//! deadline. A timer expiring exactly at a sample's time is resolved by that
//! sample.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;

use crate::geo::Coordinate;
use crate::source::RawFix;

use super::config::DetectionConfig;
use super::error::DetectionError;
use super::machine::{ParkingEvent, ParkingStateMachine};

/// Errors reading a recorded track.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: timestamp goes backwards or is not finite")]
    OutOfOrder { line: usize },

    /// A timestamp is too far from the start of the track for the clock.
    #[error("point {index}: timestamp {t}s is out of range")]
    TimestampOutOfRange { index: usize, t: f64 },

    /// A pending confirm timer cannot be scheduled.
    #[error("confirm timer failed: {0}")]
    Timer(#[from] DetectionError),
}

/// One recorded fix.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct TrackPoint {
    /// Seconds since the start of the track.
    pub t: f64,
    #[serde(default, alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(default, alias = "longitude")]
    pub lon: Option<f64>,
}

impl TrackPoint {
    pub fn new(t: f64, coordinate: Coordinate) -> Self {
        Self {
            t,
            lat: Some(coordinate.latitude),
            lon: Some(coordinate.longitude),
        }
    }

    fn fix(&self) -> RawFix {
        RawFix {
            latitude: self.lat,
            longitude: self.lon,
        }
    }
}

/// An event together with the virtual time it fired at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    pub at_secs: f64,
    pub event: ParkingEvent,
}

/// Result of replaying a track.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    pub events: Vec<TimedEvent>,
    pub samples_fed: usize,
    pub samples_skipped: usize,
}

impl ReplayReport {
    pub fn parks(&self) -> usize {
        self.count(|e| matches!(e, ParkingEvent::ParkDetected(_)))
    }

    pub fn leaves(&self) -> usize {
        self.count(|e| matches!(e, ParkingEvent::LeavingDetected(_)))
    }

    fn count(&self, pred: impl Fn(&ParkingEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.event)).count()
    }
}

/// Load a JSON-lines track from disk.
pub fn load_track(path: &Path) -> Result<Vec<TrackPoint>, ReplayError> {
    let file = File::open(path)?;
    parse_track(BufReader::new(file))
}

/// Parse a JSON-lines track.
///
/// Timestamps must be finite and non-decreasing.
pub fn parse_track<R: BufRead>(reader: R) -> Result<Vec<TrackPoint>, ReplayError> {
    let mut points = Vec::new();
    let mut last_t = 0.0_f64;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let line_no = index + 1;
        let point: TrackPoint = serde_json::from_str(trimmed).map_err(|source| {
            ReplayError::Parse {
                line: line_no,
                source,
            }
        })?;
        if !point.t.is_finite() || point.t < 0.0 || point.t < last_t {
            return Err(ReplayError::OutOfOrder { line: line_no });
        }
        last_t = point.t;
        points.push(point);
    }

    Ok(points)
}

/// Replay `points` through a fresh machine.
///
/// With `flush_pending`, a timer still running after the last point fires at
/// its deadline. Fails if a timestamp or a confirm deadline cannot be
/// represented on the clock.
pub fn replay(
    config: &DetectionConfig,
    points: &[TrackPoint],
    flush_pending: bool,
) -> Result<ReplayReport, ReplayError> {
    let mut machine = ParkingStateMachine::new(config.clone());
    let mut report = ReplayReport::default();
    let base = Instant::now();
    let secs_of = |instant: Instant| instant.saturating_duration_since(base).as_secs_f64();

    for (index, point) in points.iter().enumerate() {
        let now = Duration::try_from_secs_f64(point.t)
            .ok()
            .and_then(|offset| base.checked_add(offset))
            .ok_or(ReplayError::TimestampOutOfRange { index, t: point.t })?;

        if let Some(deadline) = machine.confirm_deadline()? {
            if deadline < now {
                if let Some(event) = machine.poll_timer(deadline) {
                    report.events.push(TimedEvent {
                        at_secs: secs_of(deadline),
                        event,
                    });
                }
            }
        }

        let coordinate = match point.fix().coordinate() {
            Ok(c) if !config.strict_coordinates || c.validate().is_ok() => c,
            Ok(c) => {
                tracing::warn!(t = point.t, %c, "Skipping out-of-range point");
                report.samples_skipped += 1;
                continue;
            }
            Err(e) => {
                tracing::warn!(t = point.t, error = %e, "Skipping invalid point");
                report.samples_skipped += 1;
                continue;
            }
        };

        report.samples_fed += 1;
        if let Some(event) = machine.feed(coordinate, now) {
            report.events.push(TimedEvent {
                at_secs: point.t,
                event,
            });
        }
    }

    if flush_pending {
        if let Some(deadline) = machine.confirm_deadline()? {
            if let Some(event) = machine.poll_timer(deadline) {
                report.events.push(TimedEvent {
                    at_secs: secs_of(deadline),
                    event,
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPOT: Coordinate = Coordinate::new(53.5511, 9.9937);
    const AWAY: Coordinate = Coordinate::new(53.5520, 9.9937);

    #[test]
    fn test_parse_track() {
        let input = "\
# recorded on Jungfernstieg
{\"t\": 0, \"lat\": 53.5511, \"lon\": 9.9937}

{\"t\": 5, \"latitude\": 53.5511, \"longitude\": 9.9937}
{\"t\": 6}
";
        let points = parse_track(input.as_bytes()).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], TrackPoint::new(0.0, SPOT));
        assert_eq!(points[1], TrackPoint::new(5.0, SPOT));
        assert_eq!(points[2].lat, None);
    }

    #[test]
    fn test_parse_track_rejects_garbage() {
        let err = parse_track("{\"t\": 0, \"lat\": 1, \"lon\": 2}\nnot json\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_parse_track_rejects_backwards_time() {
        let input = "{\"t\": 10, \"lat\": 1, \"lon\": 2}\n{\"t\": 5, \"lat\": 1, \"lon\": 2}\n";
        let err = parse_track(input.as_bytes()).unwrap_err();
        assert!(matches!(err, ReplayError::OutOfOrder { line: 2 }));
    }

    #[test]
    fn test_replay_reference_scenario() {
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint::new(5.0, SPOT),
            TrackPoint::new(35.0, SPOT),
            TrackPoint::new(40.0, AWAY),
        ];

        let report = replay(&DetectionConfig::default(), &points, false).unwrap();

        assert_eq!(
            report.events,
            vec![
                TimedEvent {
                    at_secs: 35.0,
                    event: ParkingEvent::ParkDetected(SPOT),
                },
                TimedEvent {
                    at_secs: 40.0,
                    event: ParkingEvent::LeavingDetected(SPOT),
                },
            ]
        );
        assert_eq!(report.samples_fed, 4);
        assert_eq!(report.parks(), 1);
        assert_eq!(report.leaves(), 1);
    }

    #[test]
    fn test_replay_timer_fires_between_samples() {
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint::new(5.0, SPOT),
            TrackPoint::new(120.0, AWAY),
        ];

        let report = replay(&DetectionConfig::default(), &points, false).unwrap();

        assert_eq!(report.events.len(), 2);
        assert_eq!(report.events[0].event, ParkingEvent::ParkDetected(SPOT));
        assert!((report.events[0].at_secs - 35.0).abs() < 1e-6);
        assert_eq!(report.events[1].event, ParkingEvent::LeavingDetected(SPOT));
    }

    #[test]
    fn test_replay_flush_pending() {
        let points = vec![TrackPoint::new(0.0, SPOT), TrackPoint::new(5.0, SPOT)];

        assert!(replay(&DetectionConfig::default(), &points, false)
            .unwrap()
            .events
            .is_empty());

        let flushed = replay(&DetectionConfig::default(), &points, true).unwrap();
        assert_eq!(flushed.parks(), 1);
        assert!((flushed.events[0].at_secs - 35.0).abs() < 1e-6);
    }

    #[test]
    fn test_replay_skips_invalid_points() {
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint {
                t: 3.0,
                lat: None,
                lon: Some(9.9937),
            },
            TrackPoint::new(5.0, SPOT),
            TrackPoint::new(35.0, SPOT),
        ];

        let report = replay(&DetectionConfig::default(), &points, false).unwrap();
        assert_eq!(report.samples_skipped, 1);
        assert_eq!(report.samples_fed, 3);
        assert_eq!(report.parks(), 1);
    }

    #[test]
    fn test_replay_strict_skips_out_of_range() {
        let config = DetectionConfig::default().with_strict_coordinates(true);
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint::new(1.0, Coordinate::new(123.0, 9.9937)),
        ];

        let report = replay(&config, &points, false).unwrap();
        assert_eq!(report.samples_skipped, 1);
        assert_eq!(report.samples_fed, 1);
    }

    #[test]
    fn test_replay_rejects_timestamp_beyond_clock() {
        let points = parse_track(
            "{\"t\": 0, \"lat\": 53.5511, \"lon\": 9.9937}\n\
             {\"t\": 1e19, \"lat\": 53.5511, \"lon\": 9.9937}\n"
                .as_bytes(),
        )
        .unwrap();

        let err = replay(&DetectionConfig::default(), &points, false).unwrap_err();
        assert!(matches!(err, ReplayError::TimestampOutOfRange { index: 1, .. }));
    }

    #[test]
    fn test_replay_rejects_timestamp_beyond_duration() {
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint::new(5.0, SPOT),
            TrackPoint::new(1e25, SPOT),
        ];

        let err = replay(&DetectionConfig::default(), &points, false).unwrap_err();
        assert!(matches!(err, ReplayError::TimestampOutOfRange { index: 2, .. }));
    }

    #[test]
    fn test_replay_reports_unschedulable_timer() {
        let config = DetectionConfig::default().with_confirm_delay(Duration::MAX);
        let points = vec![
            TrackPoint::new(0.0, SPOT),
            TrackPoint::new(5.0, SPOT),
            TrackPoint::new(10.0, SPOT),
        ];

        let err = replay(&config, &points, false).unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Timer(DetectionError::TimerOverflow)
        ));

        let flushed = replay(&config, &points[..2], true).unwrap_err();
        assert!(matches!(
            flushed,
            ReplayError::Timer(DetectionError::TimerOverflow)
        ));
    }
}
