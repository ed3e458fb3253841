//! Error types for the OmniCAP tooling.
//!
//! Codec failures from `omnicap-cap` are folded into a serializable summary
//! so they can be reported alongside configuration and I/O errors.

use omnicap_cap::CodecError;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Result type alias using OmniCapError as the error type.
pub type Result<T> = std::result::Result<T, OmniCapError>;

/// Top-level error type for OmniCAP operations.
#[derive(Debug, Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum OmniCapError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A document could not be decoded or encoded
    #[error("Codec error: {message}")]
    Codec { message: String, errors: usize },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
}

impl From<CodecError> for OmniCapError {
    fn from(err: CodecError) -> Self {
        let errors = match &err {
            CodecError::Invalid(diagnostics) => diagnostics.errors().count(),
            _ => 1,
        };
        OmniCapError::Codec {
            message: err.to_string(),
            errors,
        }
    }
}

/// Errors related to configuration.
///
/// These errors occur when loading, parsing, or validating configuration files.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {reason}")]
    LoadFailed { path: String, reason: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {reason}")]
    InvalidFormat { reason: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    /// Creates a file not found error.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Wrapper for I/O errors to make them serializable.
#[derive(Debug, Error, Serialize, Deserialize)]
#[error("I/O error: {kind:?}: {message}")]
pub struct IoError {
    pub kind: IoErrorKind,
    pub message: String,
}

impl From<io::Error> for IoError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind().into(),
            message: err.to_string(),
        }
    }
}

impl From<io::Error> for OmniCapError {
    fn from(err: io::Error) -> Self {
        OmniCapError::Io(err.into())
    }
}

/// Serializable version of the file-related `std::io::ErrorKind`s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoErrorKind {
    NotFound,
    PermissionDenied,
    InvalidData,
    UnexpectedEof,
    Other,
}

impl From<io::ErrorKind> for IoErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => IoErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            io::ErrorKind::InvalidData => IoErrorKind::InvalidData,
            io::ErrorKind::UnexpectedEof => IoErrorKind::UnexpectedEof,
            _ => IoErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnicap_cap::decode_strict;

    #[test]
    fn test_error_serialization() {
        let err = OmniCapError::Config(ConfigError::file_not_found("/etc/omnicap/config.yaml"));
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("Config"));
        assert!(json.contains("/etc/omnicap/config.yaml"));
    }

    #[test]
    fn test_codec_error_conversion() {
        let err: OmniCapError = decode_strict("<alert").unwrap_err().into();
        match err {
            OmniCapError::Codec { message, errors } => {
                assert!(message.starts_with("Malformed input"));
                assert_eq!(errors, 1);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_config_error_helpers() {
        let err = ConfigError::invalid_value("logging.level", "unknown level");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let omnicap_err: OmniCapError = io_err.into();
        match omnicap_err {
            OmniCapError::Io(e) => assert_eq!(e.kind, IoErrorKind::NotFound),
            other => panic!("unexpected error: {}", other),
        }
    }
}
