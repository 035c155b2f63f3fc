//! Configuration type definitions.

use serde::{Deserialize, Serialize};

use crate::modules::access_control::AccessControlConfig;
use crate::modules::credential_auth::CredentialAuthConfig;
use crate::modules::filter_chain::{FilterConfig, LoggingFilter};
use crate::modules::http_handler::HttpHandlerConfig;
use crate::modules::token::TokenConfig;

/// Root configuration structure for edge-guard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener, dispatch and routing configuration.
    pub gateway: HttpHandlerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Token signing configuration.
    pub token: TokenConfig,

    /// Whitelist and network policy.
    pub access_control: AccessControlConfig,

    /// Per-filter configuration.
    pub filters: FiltersConfig,

    /// Login endpoint.
    pub credential_auth: CredentialAuthConfig,
}

/// Per-filter configuration (`[filters.*]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    /// Global logging filter. Absent means not installed.
    pub global: Option<FilterConfig>,

    /// Gateway authentication filter.
    pub auth: FilterConfig,

    /// Logging filter.
    pub logging: FilterConfig,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            global: None,
            auth: FilterConfig::with_precedence(0),
            logging: LoggingFilter::default_config(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: LogLevel,

    /// Log format (json, pretty, compact).
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
        }
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose).
    Trace,
    /// Debug level.
    Debug,
    /// Info level (default).
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level (least verbose).
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (machine-readable).
    Json,
    /// Pretty format with colors (default).
    #[default]
    Pretty,
    /// Compact single-line format.
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::access_control::WhitelistEntry;

    #[test]
    fn test_default_gateway_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.gateway.name, "edge-guard");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.token.ttl_secs, 3600);
        assert!(config.filters.global.is_none());
        assert_eq!(config.filters.logging.precedence, i32::MAX);
        assert_eq!(config.credential_auth.login_path, "/login");
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
            [gateway]
            name = "test-gateway"
        "#;

        let config: GatewayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.name, "test-gateway");
        assert_eq!(config.gateway.listen_port, 8000);
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [gateway]
            name = "full-gateway"
            listen_address = "127.0.0.1"
            listen_port = 8080
            backend_timeout_ms = 5000

            [[gateway.routes]]
            name = "users"
            path = "/users/**"
            upstream = "127.0.0.1:9001"

            [logging]
            level = "debug"
            format = "json"

            [token]
            secret = "0123456789abcdef0123456789abcdef"
            ttl_secs = 600

            [access_control]
            allowed_network = "192.168.56.1/32"
            whitelist = [
                "/actuator/**",
                { path = "/users", methods = ["POST"] },
            ]

            [filters.global]
            precedence = -2147483648
            base_message = "global filter"

            [filters.auth]
            precedence = 10

            [credential_auth]
            login_path = "/auth/login"
        "#;

        let config: GatewayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.listen_port, 8080);
        assert_eq!(config.gateway.routes.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.token.ttl_secs, 600);
        assert_eq!(config.access_control.allowed_network, "192.168.56.1/32");
        assert_eq!(
            config.access_control.whitelist[1],
            WhitelistEntry::with_methods("/users", &["POST"])
        );
        assert_eq!(
            config.filters.global.as_ref().map(|g| g.precedence),
            Some(i32::MIN)
        );
        assert_eq!(config.filters.auth.precedence, 10);
        assert_eq!(config.credential_auth.login_path, "/auth/login");
    }
}
