//! Error types for pktforge

use thiserror::Error;

/// pktforge error type
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Template rejected before it reached a table
    #[error("invalid template: {0}")]
    InvalidTemplate(String),

    /// Template data could not be decoded
    #[error("template encoding error: {0}")]
    Encoding(String),

    /// Configuration error
    #[error("config error: {0}")]
    ConfigError(String),

    /// Logging could not be initialised
    #[error("logging error: {0}")]
    Logging(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for pktforge
pub type ForgeResult<T> = Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ForgeError::InvalidTemplate("length 4000 exceeds 2048".into());
        assert_eq!(err.to_string(), "invalid template: length 4000 exceeds 2048");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ForgeError = io.into();
        assert!(matches!(err, ForgeError::IoError(_)));
    }
}
