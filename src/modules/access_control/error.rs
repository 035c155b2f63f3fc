//! Error types for access control.

use thiserror::Error;

/// Result type for access control operations.
pub type AccessControlResult<T> = Result<T, AccessControlError>;

/// Errors raised while building access control policies.
///
/// These only occur at startup. Per-request denials are decisions, not errors.
#[derive(Debug, Error)]
pub enum AccessControlError {
    /// IP address parsing error.
    #[error("invalid IP address: {0}")]
    InvalidIpAddress(String),

    /// CIDR parsing error.
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),

    /// Whitelist pattern error.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    /// Whitelist method qualifier error.
    #[error("invalid method: {0}")]
    InvalidMethod(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AccessControlError::InvalidIpAddress("300.1.1.1".to_string());
        assert_eq!(err.to_string(), "invalid IP address: 300.1.1.1");

        let err = AccessControlError::InvalidCidr("not/valid".to_string());
        assert_eq!(err.to_string(), "invalid CIDR notation: not/valid");

        let err = AccessControlError::InvalidPattern("users/**/x".to_string());
        assert_eq!(err.to_string(), "invalid path pattern: users/**/x");
    }
}
