//! Error types for tabdump.

use thiserror::Error;

/// Result type for tabdump operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while exporting a spreadsheet.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Authentication or token endpoint failure.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Transport-level HTTP failure (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(String),

    /// The Sheets API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed A1 range.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ExportError {
    /// Create an authentication error.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Create an HTTP transport error.
    pub fn http(message: impl Into<String>) -> Self {
        Self::Http(message.into())
    }

    /// Create an API error from a status code and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an invalid range error.
    pub fn invalid_range(range: impl Into<String>) -> Self {
        Self::InvalidRange(range.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ExportError::api(403, "The caller does not have permission");
        assert_eq!(
            err.to_string(),
            "API error (HTTP 403): The caller does not have permission"
        );
    }

    #[test]
    fn test_io_error_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: ExportError = io.into();
        assert!(matches!(err, ExportError::Io(_)));
        assert!(err.to_string().starts_with("I/O error"));
    }

    #[test]
    fn test_helpers() {
        assert!(matches!(ExportError::auth("x"), ExportError::Auth(m) if m == "x"));
        assert!(matches!(ExportError::http("x"), ExportError::Http(_)));
        assert!(matches!(ExportError::config("x"), ExportError::Config(_)));
        assert!(matches!(
            ExportError::invalid_range("1:Z"),
            ExportError::InvalidRange(r) if r == "1:Z"
        ));
    }
}
