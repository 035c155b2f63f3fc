//! Login request body.

use serde::Deserialize;

use crate::modules::filter_chain::Rejection;

/// Email/password pair submitted to the login endpoint.
///
/// Never persisted. The password is not printed by `Debug`.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    /// Login email.
    pub email: String,

    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Parse a JSON login body.
    ///
    /// # Errors
    ///
    /// Returns `Rejection::MalformedRequest` for invalid JSON, missing fields,
    /// or an empty email or password.
    pub fn parse(body: &[u8]) -> Result<Self, Rejection> {
        let credentials: Self =
            serde_json::from_slice(body).map_err(|_| Rejection::MalformedRequest)?;

        if credentials.email.trim().is_empty() || credentials.password.is_empty() {
            return Err(Rejection::MalformedRequest);
        }

        Ok(credentials)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
