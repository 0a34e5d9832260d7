//! Error types for the broker core
//!
//! Only two kinds of failure cross the core's boundary. [`ProviderFailure`]
//! is always recovered into an error entry on that provider's envelope.
//! [`BrokerError::Configuration`] means the broker was assembled wrongly and
//! is returned to the caller unchanged.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BrokerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BrokerError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BrokerError::Configuration(message.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, BrokerError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, BrokerError>;

/// Invalid use of an [`OutputEnvelope`](crate::envelope::OutputEnvelope)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("Unrecognized envelope field: {0}")]
    UnknownField(String),

    #[error("{0} is not a multi-value element, use set_field")]
    NotAppendable(String),

    #[error("{0} is a multi-value element, use append")]
    NotSettable(String),

    #[error("Invalid value for {field}: expected {expected}")]
    InvalidValue { field: String, expected: &'static str },

    #[error("Response keys do not match the envelope protocol (missing: {missing:?}, extra: {extra:?})")]
    Protocol {
        missing: Vec<String>,
        extra: Vec<String>,
    },
}

/// One provider's query could not produce records
///
/// The display text becomes the message of the `error` entry on that
/// provider's envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderFailure {
    #[error("Failed to fetch from {provider}: {message}")]
    Fetch { provider: String, message: String },

    #[error("Request to {provider} timed out after {seconds} seconds")]
    Timeout { provider: String, seconds: u64 },

    #[error("{provider} responded with status {status}: {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Unexpected {provider} response: {message}")]
    UnexpectedShape { provider: String, message: String },

    #[error("Processing {provider} response failed: {message}")]
    Panicked { provider: String, message: String },
}

impl ProviderFailure {
    pub fn fetch(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderFailure::Fetch {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn shape(provider: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderFailure::UnexpectedShape {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// HTTP-style status carried by the failure, if the provider answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderFailure::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_provider() {
        let failure = ProviderFailure::Timeout {
            provider: "idb".to_string(),
            seconds: 30,
        };
        assert_eq!(failure.to_string(), "Request to idb timed out after 30 seconds");
        assert_eq!(failure.status_code(), None);
    }

    #[test]
    fn test_status_failure_keeps_code() {
        let failure = ProviderFailure::Status {
            provider: "gbif".to_string(),
            status: 503,
            message: "Service Unavailable".to_string(),
        };
        assert_eq!(failure.status_code(), Some(503));
    }

    #[test]
    fn test_not_appendable_message() {
        let err = EnvelopeError::NotAppendable("count".to_string());
        assert_eq!(err.to_string(), "count is not a multi-value element, use set_field");
    }

    #[test]
    fn test_configuration_helper() {
        let err = BrokerError::configuration("no map for itis/occurrence");
        assert!(err.is_configuration());
        assert!(!BrokerError::UnknownProvider("xyz".into()).is_configuration());
    }
}
