//! CLI error type.

use std::io;

use parkwatch::config::ConfigError;
use parkwatch::detection::replay::ReplayError;
use parkwatch::logging::LoggingError;
use parkwatch::session::SessionError;
use thiserror::Error;

/// Errors surfaced to the user by a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("Failed to initialize logging: {0}")]
    Logging(#[from] LoggingError),

    #[error("Tracking failed: {0}")]
    Session(#[from] SessionError),

    #[error("Replay failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("Failed to set signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to start async runtime: {0}")]
    Runtime(io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_handler_failure_is_not_a_config_error() {
        let err = CliError::from(ctrlc::Error::MultipleHandlers);
        assert!(matches!(err, CliError::Signal(_)));
        assert!(err.to_string().starts_with("Failed to set signal handler"));
    }
}
