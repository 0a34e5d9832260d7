//! Error types shared across the workspace

use thiserror::Error;

#[derive(Error, Debug)]
pub enum S2nError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fixture not found: {0}")]
    FixtureNotFound(String),
}

pub type Result<T> = std::result::Result<T, S2nError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: S2nError = io.into();
        assert!(matches!(err, S2nError::Io(_)));
        assert_eq!(err.to_string(), "IO error: gone");
    }

    #[test]
    fn test_serialization_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: S2nError = json_err.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
