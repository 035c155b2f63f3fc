//! # Credential Auth Module
//!
//! Gateway-served login endpoint. A `POST` with a JSON
//! `{"email": ..., "password": ...}` body is verified against a
//! [`CredentialVerifier`], the user id is resolved through a [`UserLookup`],
//! and a signed token is returned in the `token` and `userId` response
//! headers.
//!
//! [`InMemoryDirectory`] implements both capabilities over argon2 password
//! hashes loaded from configuration.

mod config;
mod credentials;
mod directory;
mod error;
mod handler;

pub use config::{CredentialAuthConfig, UserEntry};
pub use credentials::Credentials;
pub use directory::{
    hash_password, hash_password_with_params, CredentialVerifier, InMemoryDirectory, LookupError,
    UserLookup, VerificationFailure, VerifiedIdentity,
};
pub use error::{CredentialAuthError, CredentialAuthResult};
pub use handler::{CredentialAuthFilter, LoginSuccess, TOKEN_HEADER, USER_ID_HEADER};
