//! Token claim set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Claim names owned by the codec.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "tokenType", "iat", "exp"];

/// Kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    /// Short-lived access token presented to the gateway.
    #[serde(rename = "ACCESS")]
    Access,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Access => write!(f, "ACCESS"),
        }
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (canonical user identifier).
    pub sub: String,

    /// Token kind.
    #[serde(rename = "tokenType")]
    pub token_type: TokenType,

    /// Issued at, epoch seconds.
    pub iat: i64,

    /// Expires at, epoch seconds.
    pub exp: i64,

    /// Additional caller-supplied claims.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Claims {
    /// Build an access claim set.
    #[must_use]
    pub fn access(subject: impl Into<String>, iat: i64, exp: i64) -> Self {
        Self {
            sub: subject.into(),
            token_type: TokenType::Access,
            iat,
            exp,
            extra: BTreeMap::new(),
        }
    }

    /// Check whether the claims are expired at `now` (epoch seconds).
    ///
    /// A token whose expiry equals `now` is still valid.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp < now
    }

    /// Get an extra claim.
    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
