//! Geographic coordinates and great-circle distance.
//!
//! Provides the [`Coordinate`] value type used throughout the crate and the
//! haversine [`distance`] function that both the parking-state machine and
//! nearby-spot lookups are built on.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in meters used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Errors returned by [`Coordinate::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),

    #[error("coordinate is not finite ({latitude}, {longitude})")]
    NotFinite { latitude: f64, longitude: f64 },
}

/// A WGS84 position in decimal degrees.
///
/// Construction never validates. Out-of-range values are carried as-is and
/// simply produce meaningless distances; call [`Coordinate::validate`] when
/// strict input checking is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check that both components are finite and within range.
    pub fn validate(&self) -> Result<Self, GeoError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(GeoError::NotFinite {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(MIN_LAT..=MAX_LAT).contains(&self.latitude) {
            return Err(GeoError::LatitudeOutOfRange(self.latitude));
        }
        if !(MIN_LON..=MAX_LON).contains(&self.longitude) {
            return Err(GeoError::LongitudeOutOfRange(self.longitude));
        }
        Ok(*self)
    }

    /// Distance to another coordinate in meters.
    #[inline]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(*self, *other)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two coordinates in meters (haversine).
///
/// NaN inputs yield NaN; no other failure mode exists.
#[inline]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let delta_phi = (b.latitude - a.latitude).to_radians();
    let delta_lambda = (b.longitude - a.longitude).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sort items by their distance from `center`, nearest first.
///
/// Items whose distance is NaN sort last.
pub fn sort_by_distance<T, F>(items: &mut [T], center: Coordinate, position: F)
where
    F: Fn(&T) -> Coordinate,
{
    let key = |item: &T| {
        let d = distance(center, position(item));
        // total_cmp orders negative NaN before everything else.
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    };
    items.sort_by(|a, b| key(a).total_cmp(&key(b)));
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAMBURG_TOWN_HALL: Coordinate = Coordinate::new(53.5511, 9.9937);

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance(HAMBURG_TOWN_HALL, HAMBURG_TOWN_HALL), 0.0);
    }

    #[test]
    fn test_distance_hundredth_degree_north() {
        let north = Coordinate::new(53.5611, 9.9937);
        let d = distance(HAMBURG_TOWN_HALL, north);
        assert!((d - 1112.0).abs() < 5.0, "Expected ~1112m, got {}", d);
    }

    #[test]
    fn test_distance_hamburg_to_london() {
        // London: 51.5074°N, 0.1278°W, roughly 720 km from Hamburg
        let london = Coordinate::new(51.5074, -0.1278);
        let d = distance(HAMBURG_TOWN_HALL, london);
        assert!((d - 720_000.0).abs() < 10_000.0, "Got {}", d);
    }

    #[test]
    fn test_distance_nan_propagates() {
        let broken = Coordinate::new(f64::NAN, 9.9937);
        assert!(distance(HAMBURG_TOWN_HALL, broken).is_nan());
    }

    #[test]
    fn test_out_of_range_does_not_panic() {
        let bogus = Coordinate::new(200.0, 500.0);
        let _ = distance(HAMBURG_TOWN_HALL, bogus);
    }

    #[test]
    fn test_validate_accepts_valid() {
        assert_eq!(HAMBURG_TOWN_HALL.validate(), Ok(HAMBURG_TOWN_HALL));
        assert!(Coordinate::new(90.0, -180.0).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(91.0, 0.0).validate(),
            Err(GeoError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(0.0, -180.5).validate(),
            Err(GeoError::LongitudeOutOfRange(_))
        ));
        assert!(matches!(
            Coordinate::new(f64::INFINITY, 0.0).validate(),
            Err(GeoError::NotFinite { .. })
        ));
    }

    #[test]
    fn test_sort_by_distance() {
        let near = Coordinate::new(53.5512, 9.9937);
        let far = Coordinate::new(53.6, 9.9937);
        let mid = Coordinate::new(53.56, 9.9937);
        let mut points = vec![far, near, mid];

        sort_by_distance(&mut points, HAMBURG_TOWN_HALL, |c| *c);

        assert_eq!(points, vec![near, mid, far]);
    }

    #[test]
    fn test_sort_by_distance_nan_last() {
        let near = Coordinate::new(53.5512, 9.9937);
        let far = Coordinate::new(53.6, 9.9937);
        let mut points = vec![
            Coordinate::new(-f64::NAN, 9.9937),
            far,
            Coordinate::new(f64::NAN, 9.9937),
            near,
        ];

        sort_by_distance(&mut points, HAMBURG_TOWN_HALL, |c| *c);

        assert_eq!(&points[..2], &[near, far]);
        assert!(points[2..].iter().all(|c| c.latitude.is_nan()));
    }

    #[test]
    fn test_deserialize_short_names() {
        let c: Coordinate = serde_json::from_str(r#"{"lat": 53.5, "lon": 10.0}"#).unwrap();
        assert_eq!(c, Coordinate::new(53.5, 10.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(HAMBURG_TOWN_HALL.to_string(), "53.55110, 9.99370");
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_distance_symmetric(
                lat1 in -90.0..90.0_f64,
                lon1 in -180.0..180.0_f64,
                lat2 in -90.0..90.0_f64,
                lon2 in -180.0..180.0_f64,
            ) {
                let a = Coordinate::new(lat1, lon1);
                let b = Coordinate::new(lat2, lon2);
                let ab = distance(a, b);
                let ba = distance(b, a);
                // Near-antipodal pairs can round h above 1
                prop_assume!(ab.is_finite() && ba.is_finite());
                prop_assert!(
                    (ab - ba).abs() < 1e-6,
                    "Asymmetric distance: {} vs {}",
                    ab, ba
                );
            }

            #[test]
            fn test_distance_to_self_is_zero(
                lat in -90.0..90.0_f64,
                lon in -180.0..180.0_f64,
            ) {
                let a = Coordinate::new(lat, lon);
                prop_assert_eq!(distance(a, a), 0.0);
            }
        }
    }
}
