//! Path whitelist.

use http::Method;
use std::str::FromStr;

use super::config::WhitelistEntry;
use super::error::{AccessControlError, AccessControlResult};
use crate::modules::http_handler::PathPattern;

#[derive(Debug, Clone)]
struct WhitelistRule {
    pattern: PathPattern,
    methods: Vec<Method>,
}

impl WhitelistRule {
    fn matches(&self, method: &Method, path: &str) -> bool {
        (self.methods.is_empty() || self.methods.contains(method)) && self.pattern.matches(path)
    }
}

/// Ordered set of path patterns exempt from protection.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<WhitelistRule>,
}

impl Whitelist {
    /// Compile whitelist entries.
    pub fn from_entries(entries: &[WhitelistEntry]) -> AccessControlResult<Self> {
        let mut rules = Vec::with_capacity(entries.len());

        for entry in entries {
            let pattern = PathPattern::compile(entry.path())
                .map_err(|e| AccessControlError::InvalidPattern(e.to_string()))?;
            let methods = entry
                .methods()
                .iter()
                .map(|m| {
                    Method::from_str(&m.to_ascii_uppercase())
                        .map_err(|_| AccessControlError::InvalidMethod(m.clone()))
                })
                .collect::<AccessControlResult<Vec<_>>>()?;

            rules.push(WhitelistRule { pattern, methods });
        }

        Ok(Self { rules })
    }

    /// Compile plain path patterns that apply to every method.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> AccessControlResult<Self> {
        let entries: Vec<WhitelistEntry> = paths
            .iter()
            .map(|p| WhitelistEntry::from(p.as_ref()))
            .collect();
        Self::from_entries(&entries)
    }

    /// Find the first pattern that covers the request.
    #[must_use]
    pub fn matches(&self, method: &Method, path: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(method, path))
            .map(|rule| rule.pattern.as_str())
    }

    /// Get the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the whitelist is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
