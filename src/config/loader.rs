//! Configuration file loader.

use super::error::{ConfigError, ConfigResult};
use super::types::GatewayConfig;
use super::validation::{BasicValidator, SecurityValidator, Validator};
use std::path::Path;
use tracing::warn;

/// Environment variable that overrides `[token] secret`.
pub const TOKEN_SECRET_ENV: &str = "EDGE_GUARD_TOKEN_SECRET";

/// Configuration loader with validation support.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    /// Validators to run on loaded configuration.
    validators: Vec<Box<dyn Validator>>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with the basic and security validators.
    #[must_use]
    pub fn with_default_validators() -> Self {
        Self::new()
            .with_validator(BasicValidator::new())
            .with_validator(SecurityValidator::new())
    }

    /// Add a validator to the loader.
    #[must_use]
    pub fn with_validator<V: Validator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Load configuration from a file path.
    ///
    /// The token secret is taken from `EDGE_GUARD_TOKEN_SECRET` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(&self, path: P) -> ConfigResult<GatewayConfig> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        self.load_with_secret(&content, std::env::var(TOKEN_SECRET_ENV).ok())
    }

    /// Load configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML is malformed
    /// - Validation fails
    pub fn load_str(&self, content: &str) -> ConfigResult<GatewayConfig> {
        self.load_with_secret(content, None)
    }

    /// Load configuration from a TOML string, replacing the token secret
    /// when `secret_override` is set and non-empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    pub fn load_with_secret(
        &self,
        content: &str,
        secret_override: Option<String>,
    ) -> ConfigResult<GatewayConfig> {
        let mut config: GatewayConfig = toml::from_str(content)?;

        if let Some(secret) = secret_override.filter(|s| !s.is_empty()) {
            config.token.secret = secret;
        }

        self.validate(&config)?;
        Ok(config)
    }

    /// Validate a configuration against all registered validators.
    fn validate(&self, config: &GatewayConfig) -> ConfigResult<()> {
        for validator in &self.validators {
            let result = validator.validate(config);

            for warning in result.warnings() {
                warn!(field = %warning.field, "{}", warning.message);
            }

            if !result.is_valid() {
                let errors: Vec<String> = result
                    .errors_only()
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                return Err(ConfigError::ValidationError(errors.join("; ")));
            }
        }
        Ok(())
    }
}
