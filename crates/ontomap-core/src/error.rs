//! Unified error type for the core crate.

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Ontology schema is malformed or inconsistent.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// BAS point or history source failure.
    #[error("Source error: {0}")]
    Source(String),

    /// Scoring model could not be invoked.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Scoring model produced an unusable result or artifact.
    #[error("Model error: {0}")]
    Model(String),

    /// Not found error.
    #[error("Resource not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a model error.
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("AHU-1");
        assert!(err.to_string().contains("AHU-1"));
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{oops");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
