//! Configuration validation system.

use super::types::GatewayConfig;
use crate::modules::access_control::Cidr;

/// A single validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field path that failed validation.
    pub field: String,
    /// Error message.
    pub message: String,
    /// Severity level.
    pub severity: ValidationSeverity,
}

impl ValidationError {
    /// Create a new error.
    pub fn error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Error,
        }
    }

    /// Create a new warning.
    pub fn warning(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            severity: ValidationSeverity::Warning,
        }
    }
}

/// Severity of validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Error - configuration is invalid.
    Error,
    /// Warning - configuration may have issues.
    Warning,
}

/// Result of configuration validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty (valid) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Record a section-level `validate()` failure as an error.
    fn check(&mut self, field: &str, outcome: Result<(), String>) {
        if let Err(message) = outcome {
            self.add_error(ValidationError::error(field, message));
        }
    }

    /// Check if the validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| e.severity == ValidationSeverity::Error)
    }

    /// Get all validation errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get only errors (not warnings).
    #[must_use]
    pub fn errors_only(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Error)
            .collect()
    }

    /// Get only warnings.
    #[must_use]
    pub fn warnings(&self) -> Vec<&ValidationError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ValidationSeverity::Warning)
            .collect()
    }

    /// Merge another validation result into this one.
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }
}

/// Trait for configuration validators.
pub trait Validator: std::fmt::Debug + Send + Sync {
    /// Validate a configuration and return any errors.
    fn validate(&self, config: &GatewayConfig) -> ValidationResult;
}

/// Built-in validator for structural configuration checks.
#[derive(Debug, Default)]
pub struct BasicValidator;

impl BasicValidator {
    /// Create a new basic validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for BasicValidator {
    fn validate(&self, config: &GatewayConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.gateway.name.is_empty() {
            result.add_error(ValidationError::error(
                "gateway.name",
                "Gateway name cannot be empty",
            ));
        }

        result.check("gateway", config.gateway.validate());
        result.check("access_control", config.access_control.validate());
        result.check("credential_auth", config.credential_auth.validate());

        if let Err(e) = config.access_control.allowed_network.parse::<Cidr>() {
            result.add_error(ValidationError::error(
                "access_control.allowed_network",
                e.to_string(),
            ));
        }

        for (i, proxy) in config.access_control.trusted_proxies.iter().enumerate() {
            if let Err(e) = proxy.parse::<Cidr>() {
                result.add_error(ValidationError::error(
                    format!("access_control.trusted_proxies[{i}]"),
                    e.to_string(),
                ));
            }
        }

        let mut seen_routes = std::collections::HashSet::new();
        for route in &config.gateway.routes {
            if !seen_routes.insert(&route.name) {
                result.add_error(ValidationError::error(
                    format!("gateway.routes.{}", route.name),
                    format!("Duplicate route name: {}", route.name),
                ));
            }
        }

        result
    }
}

/// Validator for the security-sensitive settings.
#[derive(Debug, Default)]
pub struct SecurityValidator;

impl SecurityValidator {
    /// Create a new security validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for SecurityValidator {
    fn validate(&self, config: &GatewayConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.check("token", config.token.validate());

        if let Ok(cidr) = config.access_control.allowed_network.parse::<Cidr>() {
            if cidr.prefix_len() == 0 {
                result.add_error(ValidationError::warning(
                    "access_control.allowed_network",
                    format!("{cidr} allows every client address"),
                ));
            }
        }

        if config.access_control.trust_proxy_headers
            && config.access_control.trusted_proxies.is_empty()
        {
            result.add_error(ValidationError::error(
                "access_control.trusted_proxies",
                "trust_proxy_headers = true requires at least one trusted proxy",
            ));
        }

        if config.credential_auth.enabled && config.credential_auth.users.is_empty() {
            result.add_error(ValidationError::warning(
                "credential_auth.users",
                "Login endpoint is enabled but no users are configured",
            ));
        }

        result
    }
}
