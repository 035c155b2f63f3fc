//! Per-request access decisions.

use http::Method;
use std::fmt;
use tracing::debug;

use super::config::AccessControlConfig;
use super::error::AccessControlResult;
use super::ip_filter::IpPolicy;
use super::path::is_canonical_path;
use super::whitelist::Whitelist;

/// The rule that produced a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedRule {
    /// A whitelist pattern covered the path.
    Whitelist(String),
    /// The client address is inside the allowed network.
    IpMatch(String),
    /// Nothing allowed the request.
    DefaultDeny,
}

impl fmt::Display for MatchedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whitelist(pattern) => write!(f, "whitelist:{pattern}"),
            Self::IpMatch(cidr) => write!(f, "ip:{cidr}"),
            Self::DefaultDeny => write!(f, "default-deny"),
        }
    }
}

/// Outcome of the access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDecision {
    /// Whether the request may proceed.
    pub allowed: bool,

    /// The rule that matched.
    pub matched_rule: MatchedRule,
}

impl AccessDecision {
    /// Create an allow decision.
    #[must_use]
    pub fn allow(rule: MatchedRule) -> Self {
        Self {
            allowed: true,
            matched_rule: rule,
        }
    }

    /// Create a deny decision.
    #[must_use]
    pub fn deny() -> Self {
        Self {
            allowed: false,
            matched_rule: MatchedRule::DefaultDeny,
        }
    }

    /// Check if the request was allowed through the whitelist.
    #[must_use]
    pub fn is_whitelisted(&self) -> bool {
        matches!(self.matched_rule, MatchedRule::Whitelist(_))
    }
}

/// Composes the path whitelist and the network policy.
///
/// Whitelisted paths are allowed from anywhere. Every other path requires
/// the client address to be inside the allowed network.
#[derive(Debug, Clone)]
pub struct AccessDecisionPolicy {
    whitelist: Whitelist,
    ip_policy: IpPolicy,
}

impl AccessDecisionPolicy {
    /// Create a policy from its parts.
    #[must_use]
    pub fn new(whitelist: Whitelist, ip_policy: IpPolicy) -> Self {
        Self {
            whitelist,
            ip_policy,
        }
    }

    /// Build the policy from configuration.
    pub fn from_config(config: &AccessControlConfig) -> AccessControlResult<Self> {
        Ok(Self::new(
            Whitelist::from_entries(&config.whitelist)?,
            IpPolicy::from_config(config)?,
        ))
    }

    /// Get the network policy.
    #[must_use]
    pub fn ip_policy(&self) -> &IpPolicy {
        &self.ip_policy
    }

    /// Get the whitelist.
    #[must_use]
    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Decide whether a request may enter the filter chain.
    ///
    /// Only canonical paths are matched against the whitelist.
    #[must_use]
    pub fn decide(&self, method: &Method, path: &str, client_ip: &str) -> AccessDecision {
        if let Some(pattern) = is_canonical_path(path)
            .then(|| self.whitelist.matches(method, path))
            .flatten()
        {
            debug!(path = %path, pattern = %pattern, "Path whitelisted");
            return AccessDecision::allow(MatchedRule::Whitelist(pattern.to_string()));
        }

        if self.ip_policy.matches(client_ip) {
            return AccessDecision::allow(MatchedRule::IpMatch(
                self.ip_policy.allowed().to_string(),
            ));
        }

        debug!(
            path = %path,
            client_ip = %client_ip,
            allowed_network = %self.ip_policy.allowed(),
            "Client outside allowed network"
        );
        AccessDecision::deny()
    }
}
