//! Error types for the chronoprep library

use thiserror::Error;

/// Result type alias for chronoprep operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for the chronoprep library
#[derive(Error, Debug)]
pub enum PrepError {
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("Missing temporal axis: {0}")]
    MissingTemporalAxis(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("No input data: {0}")]
    NoInputData(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for PrepError {
    fn from(err: polars::error::PolarsError) -> Self {
        PrepError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PrepError {
    fn from(err: serde_json::Error) -> Self {
        PrepError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PrepError::InvalidPolicy("zigzag".to_string());
        assert_eq!(err.to_string(), "Invalid policy: zigzag");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PrepError = io_err.into();
        assert!(matches!(err, PrepError::IoError(_)));
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::error::PolarsError::ColumnNotFound("x".into());
        let err: PrepError = polars_err.into();
        assert!(matches!(err, PrepError::DataError(_)));
    }
}
