//! Configuration for the token codec.

use serde::{Deserialize, Serialize};

/// Minimum HS256 secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime in seconds (ten years).
pub const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Token signing configuration.
///
/// The same secret must be provisioned on every service that issues tokens
/// and on every gateway that verifies them.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Shared HMAC secret.
    #[serde(skip_serializing)]
    pub secret: String,

    /// Lifetime of access tokens in seconds.
    pub ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: 3600,
        }
    }
}

impl TokenConfig {
    /// Create a config with the given secret and the default TTL.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    /// Set the token lifetime.
    #[must_use]
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.secret.is_empty() {
            return Err("token.secret is not set".to_string());
        }
        if self.secret.len() < MIN_SECRET_LEN {
            return Err(format!(
                "token.secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                self.secret.len()
            ));
        }
        if self.ttl_secs == 0 {
            return Err("token.ttl_secs must be greater than 0".to_string());
        }
        if self.ttl_secs > MAX_TTL_SECS {
            return Err(format!(
                "token.ttl_secs must be at most {MAX_TTL_SECS}, got {}",
                self.ttl_secs
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TokenConfig::default().validate().is_err());
        assert!(TokenConfig::new("short").validate().is_err());

        let config = TokenConfig::new("a".repeat(MIN_SECRET_LEN));
        assert!(config.validate().is_ok());
        assert!(config.clone().with_ttl_secs(0).validate().is_err());
        assert!(config.clone().with_ttl_secs(MAX_TTL_SECS).validate().is_ok());
    }

    #[test]
    fn test_validate_ttl_upper_bound() {
        let config = TokenConfig::new("a".repeat(MIN_SECRET_LEN));

        let err = config
            .clone()
            .with_ttl_secs(MAX_TTL_SECS + 1)
            .validate()
            .unwrap_err();
        assert!(err.contains("token.ttl_secs"));
        assert!(config.clone().with_ttl_secs(u64::MAX).validate().is_err());
        assert!(config
            .with_ttl_secs(9_000_000_000_000_000)
            .validate()
            .is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = TokenConfig::new("super-secret-value-that-is-long-enough");
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
