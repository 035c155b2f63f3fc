//! Error types for the HTTP plumbing.

use std::io;
use thiserror::Error;

/// Errors that can occur while parsing, forwarding or serving HTTP.
#[derive(Debug, Error)]
pub enum HttpError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// HTTP parsing error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Message is not complete yet.
    #[error("Incomplete message")]
    Incomplete,

    /// Invalid HTTP method.
    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    /// Invalid URI.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Request too large.
    #[error("Request too large: {size} bytes (max: {max})")]
    RequestTooLarge {
        /// Actual size.
        size: usize,
        /// Maximum allowed.
        max: usize,
    },

    /// Upstream failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

impl From<httparse::Error> for HttpError {
    fn from(err: httparse::Error) -> Self {
        HttpError::Parse(err.to_string())
    }
}

impl From<http::uri::InvalidUri> for HttpError {
    fn from(err: http::uri::InvalidUri) -> Self {
        HttpError::InvalidUri(err.to_string())
    }
}

impl From<http::method::InvalidMethod> for HttpError {
    fn from(err: http::method::InvalidMethod) -> Self {
        HttpError::InvalidMethod(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HttpError::RequestTooLarge {
            size: 2048,
            max: 1024,
        };
        assert_eq!(err.to_string(), "Request too large: 2048 bytes (max: 1024)");

        let err = HttpError::Backend("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend error: connection refused");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let http_err = HttpError::from(io_err);
        assert!(matches!(http_err, HttpError::Io(_)));
    }
}
