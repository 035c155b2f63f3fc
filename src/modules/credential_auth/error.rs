//! Error types for credential login.

use thiserror::Error;

use crate::modules::filter_chain::Rejection;
use crate::modules::token::TokenError;

/// Result type for credential login operations.
pub type CredentialAuthResult<T> = Result<T, CredentialAuthError>;

/// Errors that can occur during login or directory setup.
#[derive(Debug, Error)]
pub enum CredentialAuthError {
    /// The login attempt was refused.
    #[error("login rejected: {0}")]
    Rejected(Rejection),

    /// Token issuance failed.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// The credential directory could not answer.
    #[error("directory unavailable: {0}")]
    Directory(String),

    /// Password hashing or hash parsing failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CredentialAuthError {
    /// Get the rejection, if this error is one.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

impl From<Rejection> for CredentialAuthError {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<argon2::password_hash::Error> for CredentialAuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::PasswordHash(err.to_string())
    }
}
