//! Loading and saving the INI config file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::detection::{DetectionConfig, DetectionError};
use crate::logging::LoggingConfig;

use super::keys::ConfigKey;

const APP_DIR: &str = "parkwatch";
const CONFIG_FILE: &str = "config.ini";

/// Errors reading or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] ini::Error),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error(transparent)]
    Detection(#[from] DetectionError),
}

/// Who reports spots and how.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReporterSettings {
    /// Identity spots are reported under. Unset disables reporting.
    pub user_id: Option<String>,
    /// Whether spots are reported as paid parking.
    pub paid: bool,
}

/// Everything stored in `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub detection: DetectionConfig,
    pub logging: LoggingConfig,
    pub reporter: ReporterSettings,
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut config = Self::default();

        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|section| section.get(key.key_name()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path)?;

        tracing::debug!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Detection thresholds, checked for consistency.
    pub fn detection_config(&self) -> Result<DetectionConfig, ConfigError> {
        self.detection.validate()?;
        Ok(self.detection.clone())
    }
}

/// Directory holding parkwatch configuration.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Path to `config.ini`.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::StationaryAnchor;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&dir.path().join("config.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.detection = DetectionConfig::default()
            .with_stationary_radius(15.0)
            .with_confirm_delay(Duration::from_secs(45))
            .with_stationary_anchor(StationaryAnchor::WindowStart)
            .with_strict_coordinates(true);
        config.logging.level = "debug".to_string();
        config.logging.directory = Some(dir.path().join("logs"));
        config.reporter.user_id = Some("alice".to_string());
        config.reporter.paid = true;

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[detection]\nleaving_radius_m = 80\n").unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.detection.leaving_radius_m, 80.0);
        assert_eq!(config.detection.stationary_radius_m, 20.0);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_bad_value_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");
        fs::write(&path, "[detection]\nconfirm_delay_secs = soon\n").unwrap();

        let err = ConfigFile::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "detection.confirm_delay_secs"));
    }

    #[test]
    fn test_detection_config_validates() {
        let mut config = ConfigFile::default();
        assert!(config.detection_config().is_ok());

        config.detection.leaving_radius_m = 5.0;
        assert!(matches!(
            config.detection_config(),
            Err(ConfigError::Detection(_))
        ));
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir() {
        let path = config_file_path();
        assert!(path.ends_with("parkwatch/config.ini"));
    }
}
