//! Common types and utilities shared across CLI commands.

use std::time::Duration;

use clap::{Args, ValueEnum};
use parkwatch::config::ConfigFile;
use parkwatch::detection::{DetectionConfig, StationaryAnchor};
use parkwatch::geo::Coordinate;

use crate::error::CliError;

/// Stationary anchor selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum AnchorArg {
    /// Compare each sample with the one before it
    PreviousSample,
    /// Compare each sample with the one that started the pending window
    WindowStart,
}

impl From<AnchorArg> for StationaryAnchor {
    fn from(arg: AnchorArg) -> Self {
        match arg {
            AnchorArg::PreviousSample => StationaryAnchor::PreviousSample,
            AnchorArg::WindowStart => StationaryAnchor::WindowStart,
        }
    }
}

/// Detection threshold overrides shared by `track` and `replay`.
#[derive(Debug, Clone, Default, Args)]
pub struct DetectionArgs {
    /// Movement below this many meters counts as standing still
    #[arg(long, value_name = "METERS")]
    pub stationary_radius: Option<f64>,

    /// Moving this many meters from the parked spot counts as leaving
    #[arg(long, value_name = "METERS")]
    pub leaving_radius: Option<f64>,

    /// Seconds to stand still before a park is confirmed
    #[arg(long, value_name = "SECS")]
    pub confirm_delay: Option<f64>,

    /// Reference point for the stationary check
    #[arg(long, value_enum)]
    pub anchor: Option<AnchorArg>,

    /// Skip fixes outside valid latitude/longitude ranges
    #[arg(long)]
    pub strict: bool,
}

/// Resolve detection settings: CLI > config file > defaults.
pub fn resolve_detection_config(
    args: &DetectionArgs,
    config: &ConfigFile,
) -> Result<DetectionConfig, CliError> {
    let mut detection = config.detection.clone();

    if let Some(meters) = args.stationary_radius {
        detection = detection.with_stationary_radius(meters);
    }
    if let Some(meters) = args.leaving_radius {
        detection = detection.with_leaving_radius(meters);
    }
    if let Some(secs) = args.confirm_delay {
        let delay = Duration::try_from_secs_f64(secs).map_err(|_| {
            CliError::Config(format!("--confirm-delay must be a positive number, got {}", secs))
        })?;
        detection = detection.with_confirm_delay(delay);
    }
    if let Some(anchor) = args.anchor {
        detection = detection.with_stationary_anchor(anchor.into());
    }
    if args.strict {
        detection = detection.with_strict_coordinates(true);
    }

    detection
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(detection)
}

/// Parse `LAT,LON` into a validated coordinate.
pub fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    let (lat, lon) = s
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{}'", s))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;
    Coordinate::new(latitude, longitude)
        .validate()
        .map_err(|e| e.to_string())
}
