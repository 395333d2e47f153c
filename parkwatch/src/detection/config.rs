//! Configuration for parking detection.
//!
//! # Example Configuration (INI)
//!
//! ```ini
//! [detection]
//! stationary_radius_m = 20
//! leaving_radius_m = 50
//! confirm_delay_secs = 30
//! stationary_anchor = previous_sample
//! strict_coordinates = false
//! ```

use std::fmt;
use std::time::Duration;

use super::error::DetectionError;

/// Default displacement below which a sample counts as "not moving".
pub const DEFAULT_STATIONARY_RADIUS_M: f64 = 20.0;

/// Default displacement from the parked anchor that counts as "left".
pub const DEFAULT_LEAVING_RADIUS_M: f64 = 50.0;

/// Default time a user must stay stationary before a park is confirmed.
pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_secs(30);

/// Which point a sample is compared against while a park is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StationaryAnchor {
    /// Compare each sample with the one immediately before it.
    ///
    /// At low sample rates slow drift can keep every step under the radius
    /// while the cumulative displacement grows without bound.
    #[default]
    PreviousSample,

    /// Compare each sample with the sample that opened the pending window.
    WindowStart,
}

impl StationaryAnchor {
    /// Config-file spelling of this policy.
    pub fn as_str(&self) -> &'static str {
        match self {
            StationaryAnchor::PreviousSample => "previous_sample",
            StationaryAnchor::WindowStart => "window_start",
        }
    }
}

impl fmt::Display for StationaryAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StationaryAnchor {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "previous_sample" | "previous" => Ok(Self::PreviousSample),
            "window_start" | "window" => Ok(Self::WindowStart),
            other => Err(DetectionError::InvalidConfig(format!(
                "unknown stationary anchor '{}'",
                other
            ))),
        }
    }
}

/// Thresholds and policies for the parking-state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Displacement (meters) below which the user is considered stationary.
    pub stationary_radius_m: f64,

    /// Displacement (meters) from the parked anchor beyond which the user
    /// has left the spot.
    pub leaving_radius_m: f64,

    /// How long the user must stay stationary before a park fires.
    pub confirm_delay: Duration,

    /// Reference point for the stationary check during a pending park.
    pub stationary_anchor: StationaryAnchor,

    /// Reject out-of-range coordinates at the session boundary.
    ///
    /// When `false`, out-of-range samples are fed to the machine unchanged.
    pub strict_coordinates: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            stationary_radius_m: DEFAULT_STATIONARY_RADIUS_M,
            leaving_radius_m: DEFAULT_LEAVING_RADIUS_M,
            confirm_delay: DEFAULT_CONFIRM_DELAY,
            stationary_anchor: StationaryAnchor::default(),
            strict_coordinates: false,
        }
    }
}

impl DetectionConfig {
    /// Set the stationary radius in meters.
    pub fn with_stationary_radius(mut self, meters: f64) -> Self {
        self.stationary_radius_m = meters;
        self
    }

    /// Set the leaving radius in meters.
    pub fn with_leaving_radius(mut self, meters: f64) -> Self {
        self.leaving_radius_m = meters;
        self
    }

    /// Set the confirm delay.
    pub fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = delay;
        self
    }

    /// Set the stationary anchor policy.
    pub fn with_stationary_anchor(mut self, anchor: StationaryAnchor) -> Self {
        self.stationary_anchor = anchor;
        self
    }

    /// Enable or disable strict coordinate checking.
    pub fn with_strict_coordinates(mut self, strict: bool) -> Self {
        self.strict_coordinates = strict;
        self
    }

    /// Check the thresholds for consistency.
    pub fn validate(&self) -> Result<(), DetectionError> {
        if !self.stationary_radius_m.is_finite() || self.stationary_radius_m <= 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "stationary radius must be positive, got {}",
                self.stationary_radius_m
            )));
        }
        if !self.leaving_radius_m.is_finite() || self.leaving_radius_m <= 0.0 {
            return Err(DetectionError::InvalidConfig(format!(
                "leaving radius must be positive, got {}",
                self.leaving_radius_m
            )));
        }
        if self.leaving_radius_m < self.stationary_radius_m {
            return Err(DetectionError::InvalidConfig(format!(
                "leaving radius ({}m) is smaller than stationary radius ({}m)",
                self.leaving_radius_m, self.stationary_radius_m
            )));
        }
        if self.confirm_delay.is_zero() {
            return Err(DetectionError::InvalidConfig(
                "confirm delay must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_thresholds() {
        let config = DetectionConfig::default();
        assert_eq!(config.stationary_radius_m, 20.0);
        assert_eq!(config.leaving_radius_m, 50.0);
        assert_eq!(config.confirm_delay, Duration::from_secs(30));
        assert_eq!(config.stationary_anchor, StationaryAnchor::PreviousSample);
        assert!(!config.strict_coordinates);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DetectionConfig::default()
            .with_stationary_radius(10.0)
            .with_leaving_radius(80.0)
            .with_confirm_delay(Duration::from_secs(60))
            .with_stationary_anchor(StationaryAnchor::WindowStart)
            .with_strict_coordinates(true);

        assert_eq!(config.stationary_radius_m, 10.0);
        assert_eq!(config.leaving_radius_m, 80.0);
        assert_eq!(config.confirm_delay, Duration::from_secs(60));
        assert_eq!(config.stationary_anchor, StationaryAnchor::WindowStart);
        assert!(config.strict_coordinates);
    }

    #[test]
    fn test_validate_rejects_inverted_radii() {
        let config = DetectionConfig::default()
            .with_stationary_radius(60.0)
            .with_leaving_radius(50.0);
        assert!(matches!(
            config.validate(),
            Err(DetectionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(DetectionConfig::default()
            .with_stationary_radius(0.0)
            .validate()
            .is_err());
        assert!(DetectionConfig::default()
            .with_leaving_radius(f64::NAN)
            .validate()
            .is_err());
        assert!(DetectionConfig::default()
            .with_confirm_delay(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_stationary_anchor_parse() {
        assert_eq!(
            "previous_sample".parse::<StationaryAnchor>().unwrap(),
            StationaryAnchor::PreviousSample
        );
        assert_eq!(
            "Window-Start".parse::<StationaryAnchor>().unwrap(),
            StationaryAnchor::WindowStart
        );
        assert!("sometimes".parse::<StationaryAnchor>().is_err());
    }

    #[test]
    fn test_stationary_anchor_display_roundtrip() {
        for anchor in [StationaryAnchor::PreviousSample, StationaryAnchor::WindowStart] {
            assert_eq!(anchor.to_string().parse::<StationaryAnchor>().unwrap(), anchor);
        }
    }
}
