//! Error types for token issuance and verification.

use thiserror::Error;

/// Result type for token operations.
pub type TokenResult<T> = Result<T, TokenError>;

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No signing secret was configured.
    #[error("signing secret is not configured")]
    MissingSecret,

    /// The signing secret is too short for HS256.
    #[error("signing secret is too short: {len} bytes (min: {min})")]
    WeakSecret {
        /// Actual secret length in bytes.
        len: usize,
        /// Minimum accepted length in bytes.
        min: usize,
    },

    /// The token lifetime is negative or too long to represent.
    #[error("token lifetime out of range: {0}")]
    InvalidTtl(String),

    /// Adding the lifetime to the issue time overflowed.
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,

    /// Tokens must carry a non-empty subject.
    #[error("token subject is empty")]
    EmptySubject,

    /// An extra claim tried to shadow a reserved claim name.
    #[error("claim '{0}' is reserved")]
    ReservedClaim(String),

    /// The token could not be decoded.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The signature does not match the claims.
    #[error("signature mismatch")]
    SignatureMismatch,

    /// The token expired before the validation instant.
    #[error("token expired at {exp} (now: {now})")]
    Expired {
        /// Expiry, epoch seconds.
        exp: i64,
        /// Validation instant, epoch seconds.
        now: i64,
    },

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Check if this error stems from bad configuration rather than a bad token.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::MissingSecret | Self::WeakSecret { .. } | Self::InvalidTtl(_)
        )
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::SignatureMismatch,
            ErrorKind::MissingRequiredClaim(claim) if claim == "sub" => Self::EmptySubject,
            _ => Self::Malformed(err.to_string()),
        }
    }
}
