//! Shared setup for commands that do real work.

use parkwatch::config::ConfigFile;
use parkwatch::logging::{init_logging, LoggingGuard};
use tracing::info;

use crate::error::CliError;

/// Loaded configuration plus an installed logger.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load `config.ini` and start logging.
    pub fn new() -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let logging = init_logging(&config.logging)?;
        Ok(Self {
            config,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(version = parkwatch::VERSION, command, "ParkWatch starting");
    }
}
