//! Configuration for access control.

use serde::{Deserialize, Serialize};

/// Access control configuration.
///
/// ```toml
/// [access_control]
/// allowed_network = "192.168.56.1/32"
/// whitelist = [
///     "/actuator/**",
///     "/welcome",
///     { path = "/users", methods = ["POST"] },
/// ]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Paths that bypass both the network check and token authentication.
    pub whitelist: Vec<WhitelistEntry>,

    /// The single network (CIDR) allowed to reach protected paths.
    pub allowed_network: String,

    /// Resolve the client address from proxy headers.
    pub trust_proxy_headers: bool,

    /// Peers whose proxy headers are trusted (CIDR). Empty trusts every peer.
    pub trusted_proxies: Vec<String>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            whitelist: vec![
                WhitelistEntry::from("/actuator/**"),
                WhitelistEntry::from("/health_check/**"),
                WhitelistEntry::from("/welcome"),
            ],
            allowed_network: "127.0.0.1/32".to_string(),
            trust_proxy_headers: false,
            trusted_proxies: Vec::new(),
        }
    }
}

impl AccessControlConfig {
    /// Create a config allowing the given network and nothing whitelisted.
    #[must_use]
    pub fn new(allowed_network: impl Into<String>) -> Self {
        Self {
            whitelist: Vec::new(),
            allowed_network: allowed_network.into(),
            ..Self::default()
        }
    }

    /// Add a whitelist entry.
    #[must_use]
    pub fn with_whitelist(mut self, entry: impl Into<WhitelistEntry>) -> Self {
        self.whitelist.push(entry.into());
        self
    }

    /// Trust proxy headers from the given peers.
    #[must_use]
    pub fn with_trusted_proxies(mut self, proxies: Vec<String>) -> Self {
        self.trust_proxy_headers = true;
        self.trusted_proxies = proxies;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.allowed_network.trim().is_empty() {
            return Err("access_control.allowed_network cannot be empty".to_string());
        }

        for entry in &self.whitelist {
            if !entry.path().starts_with('/') {
                return Err(format!(
                    "whitelist path '{}' must start with '/'",
                    entry.path()
                ));
            }
        }

        if !self.trust_proxy_headers && !self.trusted_proxies.is_empty() {
            return Err(
                "trusted_proxies requires trust_proxy_headers = true".to_string(),
            );
        }

        Ok(())
    }
}

/// A whitelist entry: a bare path pattern or a pattern with a method qualifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WhitelistEntry {
    /// Pattern matching any method.
    Path(String),

    /// Pattern restricted to the listed methods.
    Rule {
        /// Path pattern.
        path: String,
        /// Allowed methods (empty means any).
        #[serde(default)]
        methods: Vec<String>,
    },
}

impl WhitelistEntry {
    /// Create an entry restricted to the given methods.
    #[must_use]
    pub fn with_methods(path: impl Into<String>, methods: &[&str]) -> Self {
        Self::Rule {
            path: path.into(),
            methods: methods.iter().map(|m| (*m).to_string()).collect(),
        }
    }

    /// Get the path pattern.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Path(path) | Self::Rule { path, .. } => path,
        }
    }

    /// Get the method qualifier.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        match self {
            Self::Path(_) => &[],
            Self::Rule { methods, .. } => methods,
        }
    }
}

impl From<&str> for WhitelistEntry {
    fn from(path: &str) -> Self {
        Self::Path(path.to_string())
    }
}
