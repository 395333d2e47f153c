//! Addressable configuration keys.
//!
//! Each key is named `section.key` and can be read or written as a string,
//! which is what `parkwatch config get|set` operates on.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use crate::detection::StationaryAnchor;

use super::file::{ConfigError, ConfigFile};

/// A single setting in `config.ini`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DetectionStationaryRadius,
    DetectionLeavingRadius,
    DetectionConfirmDelay,
    DetectionStationaryAnchor,
    DetectionStrictCoordinates,
    LoggingLevel,
    LoggingDirectory,
    ReporterUserId,
    ReporterPaid,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::DetectionStationaryRadius,
            ConfigKey::DetectionLeavingRadius,
            ConfigKey::DetectionConfirmDelay,
            ConfigKey::DetectionStationaryAnchor,
            ConfigKey::DetectionStrictCoordinates,
            ConfigKey::LoggingLevel,
            ConfigKey::LoggingDirectory,
            ConfigKey::ReporterUserId,
            ConfigKey::ReporterPaid,
        ]
    }

    pub fn section(&self) -> &'static str {
        match self {
            ConfigKey::DetectionStationaryRadius
            | ConfigKey::DetectionLeavingRadius
            | ConfigKey::DetectionConfirmDelay
            | ConfigKey::DetectionStationaryAnchor
            | ConfigKey::DetectionStrictCoordinates => "detection",
            ConfigKey::LoggingLevel | ConfigKey::LoggingDirectory => "logging",
            ConfigKey::ReporterUserId | ConfigKey::ReporterPaid => "reporter",
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            ConfigKey::DetectionStationaryRadius => "stationary_radius_m",
            ConfigKey::DetectionLeavingRadius => "leaving_radius_m",
            ConfigKey::DetectionConfirmDelay => "confirm_delay_secs",
            ConfigKey::DetectionStationaryAnchor => "stationary_anchor",
            ConfigKey::DetectionStrictCoordinates => "strict_coordinates",
            ConfigKey::LoggingLevel => "level",
            ConfigKey::LoggingDirectory => "directory",
            ConfigKey::ReporterUserId => "user_id",
            ConfigKey::ReporterPaid => "paid",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as written to the file. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::DetectionStationaryRadius => config.detection.stationary_radius_m.to_string(),
            ConfigKey::DetectionLeavingRadius => config.detection.leaving_radius_m.to_string(),
            ConfigKey::DetectionConfirmDelay => {
                config.detection.confirm_delay.as_secs_f64().to_string()
            }
            ConfigKey::DetectionStationaryAnchor => {
                config.detection.stationary_anchor.as_str().to_string()
            }
            ConfigKey::DetectionStrictCoordinates => {
                config.detection.strict_coordinates.to_string()
            }
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            ConfigKey::ReporterUserId => config.reporter.user_id.clone().unwrap_or_default(),
            ConfigKey::ReporterPaid => config.reporter.paid.to_string(),
        }
    }

    /// Parse `value` and store it.
    ///
    /// Cross-field consistency (leaving radius vs stationary radius) is not
    /// checked here; see [`ConfigFile::detection_config`].
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::DetectionStationaryRadius => {
                config.detection.stationary_radius_m = self.parse_meters(value)?;
            }
            ConfigKey::DetectionLeavingRadius => {
                config.detection.leaving_radius_m = self.parse_meters(value)?;
            }
            ConfigKey::DetectionConfirmDelay => {
                let secs: f64 = value.parse().map_err(|_| self.invalid(value, "expected seconds"))?;
                config.detection.confirm_delay = Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|d| !d.is_zero())
                    .ok_or_else(|| self.invalid(value, "must be a positive number of seconds"))?;
            }
            ConfigKey::DetectionStationaryAnchor => {
                config.detection.stationary_anchor = StationaryAnchor::from_str(value)
                    .map_err(|_| self.invalid(value, "expected previous_sample or window_start"))?;
            }
            ConfigKey::DetectionStrictCoordinates => {
                config.detection.strict_coordinates = self.parse_bool(value)?;
            }
            ConfigKey::LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "level must not be empty"));
                }
                EnvFilter::try_new(value).map_err(|e| self.invalid(value, &e.to_string()))?;
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            ConfigKey::ReporterUserId => {
                config.reporter.user_id = (!value.is_empty()).then(|| value.to_string());
            }
            ConfigKey::ReporterPaid => {
                config.reporter.paid = self.parse_bool(value)?;
            }
        }
        Ok(())
    }

    fn parse_meters(&self, value: &str) -> Result<f64, ConfigError> {
        value
            .parse::<f64>()
            .ok()
            .filter(|m| m.is_finite() && *m > 0.0)
            .ok_or_else(|| self.invalid(value, "expected a positive number of meters"))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" | "" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
