//! Error types for the s2n CLI
//!
//! Messages are shown to the user as-is, so they say what to do next.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// The broker core rejected the request
    #[error("Broker error: {0}")]
    Broker(#[from] s2n_broker::BrokerError),

    #[error("Fixture error: {0}")]
    Fixture(#[from] s2n_common::S2nError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your environment variables or .env file.")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File operation failed: {0}. Check file permissions.")]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = CliError::config("No fixture directory");
        assert_eq!(
            err.to_string(),
            "Configuration error: No fixture directory. Check your environment variables or .env file."
        );
    }

    #[test]
    fn test_broker_error_converts() {
        let err: CliError = s2n_broker::BrokerError::configuration("missing map").into();
        assert_eq!(err.to_string(), "Broker error: Configuration error: missing map");
    }
}
