//! Token signing and verification.

use super::claims::{Claims, RESERVED_CLAIMS};
use super::config::{TokenConfig, MAX_TTL_SECS, MIN_SECRET_LEN};
use super::error::{TokenError, TokenResult};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A compact signed token (`header.payload.signature`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the raw token string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Result of validating a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationOutcome {
    /// The token is valid for this subject.
    Authenticated(String),
    /// The token was rejected. The reason is informational only.
    Rejected(String),
}

impl AuthenticationOutcome {
    /// Check if the outcome is authenticated.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// Get the authenticated subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Authenticated(subject) => Some(subject),
            Self::Rejected(_) => None,
        }
    }
}

/// HS256 token codec.
///
/// Holds only immutable key material, so one instance can be shared by
/// every request.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.header.alg)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::MissingSecret` or `TokenError::WeakSecret` when the
    /// secret cannot be used for HS256, and `TokenError::InvalidTtl` when
    /// `ttl_secs` exceeds `MAX_TTL_SECS`.
    pub fn new(config: &TokenConfig) -> TokenResult<Self> {
        let ttl = Some(config.ttl_secs)
            .filter(|secs| *secs <= MAX_TTL_SECS)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(Duration::try_seconds)
            .ok_or_else(|| TokenError::InvalidTtl(format!("{}s", config.ttl_secs)))?;
        Self::with_ttl(&config.secret, ttl)
    }

    /// Create a codec with an explicit TTL.
    ///
    /// A zero TTL is accepted here; process configuration rejects it.
    /// A negative TTL is refused.
    pub fn with_ttl(secret: &str, ttl: Duration) -> TokenResult<Self> {
        if ttl < Duration::zero() {
            return Err(TokenError::InvalidTtl(format!("{}s", ttl.num_seconds())));
        }
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::WeakSecret {
                len: secret.len(),
                min: MIN_SECRET_LEN,
            });
        }

        // Expiry is checked against an explicit clock in `inspect_at`.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            validation,
            ttl,
        })
    }

    /// Get the configured token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue an access token for `subject`.
    pub fn issue(
        &self,
        subject: &str,
        extra_claims: BTreeMap<String, Value>,
    ) -> TokenResult<Token> {
        self.issue_at(subject, extra_claims, Utc::now())
    }

    /// Issue an access token as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        extra_claims: BTreeMap<String, Value>,
        now: DateTime<Utc>,
    ) -> TokenResult<Token> {
        if subject.is_empty() {
            return Err(TokenError::EmptySubject);
        }
        if let Some(name) = extra_claims
            .keys()
            .find(|k| RESERVED_CLAIMS.contains(&k.as_str()))
        {
            return Err(TokenError::ReservedClaim(name.clone()));
        }

        let iat = now.timestamp();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?
            .timestamp();
        let mut claims = Claims::access(subject, iat, exp);
        claims.extra = extra_claims;

        let raw = jsonwebtoken::encode(&self.header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        debug!(subject = %subject, exp = exp, "Issued access token");
        Ok(Token(raw))
    }

    /// Validate a token against the current time.
    #[must_use]
    pub fn validate(&self, token: &str) -> AuthenticationOutcome {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`.
    ///
    /// Every failure collapses into `AuthenticationOutcome::Rejected`.
    #[must_use]
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> AuthenticationOutcome {
        match self.inspect_at(token, now) {
            Ok(claims) => AuthenticationOutcome::Authenticated(claims.sub),
            Err(e) => {
                debug!(error = %e, "Token rejected");
                AuthenticationOutcome::Rejected(e.to_string())
            },
        }
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns the precise reason the token is not acceptable at `now`.
    pub fn inspect_at(&self, token: &str, now: DateTime<Utc>) -> TokenResult<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.sub.is_empty() {
            return Err(TokenError::EmptySubject);
        }

        let now = now.timestamp();
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired {
                exp: claims.exp,
                now,
            });
        }

        Ok(claims)
    }
}
