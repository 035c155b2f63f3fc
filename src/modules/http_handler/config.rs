//! Configuration types for the gateway listener and routes.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Listener, dispatch and routing configuration (`[gateway]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpHandlerConfig {
    /// Gateway instance name.
    pub name: String,

    /// Address to bind to.
    pub listen_address: String,

    /// Port to listen on.
    pub listen_port: u16,

    /// Time allowed for a backend to answer, in milliseconds.
    pub backend_timeout_ms: u64,

    /// Time a connection may sit idle between requests, in milliseconds.
    pub idle_timeout_ms: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Maximum request head size in bytes.
    pub max_header_size: usize,

    /// Upstream routes, first match wins.
    pub routes: Vec<RouteConfig>,
}

impl Default for HttpHandlerConfig {
    fn default() -> Self {
        Self {
            name: "edge-guard".to_string(),
            listen_address: "0.0.0.0".to_string(),
            listen_port: 8000,
            backend_timeout_ms: 30_000,
            idle_timeout_ms: 60_000,
            max_body_size: 1024 * 1024,
            max_header_size: 16 * 1024,
            routes: Vec::new(),
        }
    }
}

impl HttpHandlerConfig {
    /// Get the socket address to listen on.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        format!("{}:{}", self.listen_address, self.listen_port)
            .parse()
            .ok()
    }

    /// Get the backend timeout.
    #[must_use]
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    /// Get the idle connection timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Add a route.
    #[must_use]
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.socket_addr().is_none() {
            return Err(format!(
                "invalid listen address '{}:{}'",
                self.listen_address, self.listen_port
            ));
        }
        if self.backend_timeout_ms == 0 {
            return Err("gateway.backend_timeout_ms must be greater than 0".to_string());
        }
        if self.idle_timeout_ms == 0 {
            return Err("gateway.idle_timeout_ms must be greater than 0".to_string());
        }
        if self.max_body_size == 0 {
            return Err("gateway.max_body_size must be greater than 0".to_string());
        }

        for route in &self.routes {
            route.validate()?;
        }

        Ok(())
    }
}

/// Upstream route (`[[gateway.routes]]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route name for identification.
    pub name: String,

    /// Path pattern to match.
    pub path: String,

    /// Upstream `host:port`.
    pub upstream: String,

    /// Strip the literal prefix of the pattern before forwarding.
    #[serde(default)]
    pub strip_prefix: bool,
}

impl RouteConfig {
    /// Create a route.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        upstream: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            upstream: upstream.into(),
            strip_prefix: false,
        }
    }

    /// Strip the matched prefix before forwarding.
    #[must_use]
    pub fn with_strip_prefix(mut self) -> Self {
        self.strip_prefix = true;
        self
    }

    /// Validate the route.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("route name cannot be empty".to_string());
        }
        if !self.path.starts_with('/') {
            return Err(format!(
                "route '{}': path '{}' must start with '/'",
                self.name, self.path
            ));
        }
        if self.upstream.is_empty() {
            return Err(format!("route '{}': upstream cannot be empty", self.name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpHandlerConfig::default();
        assert_eq!(config.socket_addr(), "0.0.0.0:8000".parse().ok());
        assert_eq!(config.backend_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_routes() {
        let toml = r#"
            listen_port = 8080

            [[routes]]
            name = "user-service"
            path = "/user-service/**"
            upstream = "127.0.0.1:9001"
            strip_prefix = true

            [[routes]]
            name = "catalog"
            path = "/catalogs/**"
            upstream = "127.0.0.1:9002"
        "#;

        let config: HttpHandlerConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.listen_port, 8080);
        assert_eq!(config.routes.len(), 2);
        assert!(config.routes[0].strip_prefix);
        assert!(!config.routes[1].strip_prefix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut config = HttpHandlerConfig::default();
        config.backend_timeout_ms = 0;
        assert!(config.validate().is_err());

        let config = HttpHandlerConfig::default()
            .with_route(RouteConfig::new("bad", "users", "127.0.0.1:9001"));
        assert!(config.validate().is_err());

        let mut config = HttpHandlerConfig::default();
        config.listen_address = "not an address".to_string();
        assert!(config.validate().is_err());
    }
}
