//! Login endpoint: credentials in, signed token out.

use async_trait::async_trait;
use http::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::config::CredentialAuthConfig;
use super::credentials::Credentials;
use super::directory::{CredentialVerifier, LookupError, UserLookup, VerificationFailure};
use super::error::{CredentialAuthError, CredentialAuthResult};
use crate::modules::filter_chain::{Rejection, RequestContext};
use crate::modules::http_handler::{Backend, HttpResult, Response};
use crate::modules::token::{Token, TokenCodec};

/// Response header carrying the issued token.
pub const TOKEN_HEADER: &str = "token";

/// Response header carrying the canonical user id.
pub const USER_ID_HEADER: &str = "userId";

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    /// Canonical user id, also the token subject.
    pub user_id: String,

    /// Issued access token.
    pub token: Token,
}

/// Authenticates `POST` requests on the login path and issues tokens.
///
/// Only the login endpoint reaches this filter. Every other request is
/// dispatched elsewhere.
pub struct CredentialAuthFilter {
    codec: Arc<TokenCodec>,
    verifier: Arc<dyn CredentialVerifier>,
    lookup: Arc<dyn UserLookup>,
    login_path: String,
}

impl std::fmt::Debug for CredentialAuthFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialAuthFilter")
            .field("login_path", &self.login_path)
            .finish_non_exhaustive()
    }
}

impl CredentialAuthFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(
        codec: Arc<TokenCodec>,
        verifier: Arc<dyn CredentialVerifier>,
        lookup: Arc<dyn UserLookup>,
        config: &CredentialAuthConfig,
    ) -> Self {
        Self {
            codec,
            verifier,
            lookup,
            login_path: config.login_path.clone(),
        }
    }

    /// Get the login path.
    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Check whether a request targets the login endpoint.
    #[must_use]
    pub fn handles(&self, method: &Method, path: &str) -> bool {
        method == Method::POST && path == self.login_path
    }

    /// Run the login flow on a raw request body.
    ///
    /// # Errors
    ///
    /// Returns a `Rejected` error for malformed bodies and refused
    /// credentials, or an internal error when the directory or the token
    /// codec fails.
    pub async fn login(&self, body: &[u8]) -> CredentialAuthResult<LoginSuccess> {
        let credentials = Credentials::parse(body)?;

        let identity = match self
            .verifier
            .verify_credentials(&credentials.email, &credentials.password)
            .await
        {
            Ok(identity) => identity,
            Err(VerificationFailure::Unavailable(reason)) => {
                return Err(CredentialAuthError::Directory(reason));
            },
            Err(failure) => {
                info!(email = %credentials.email, reason = %failure, "Login refused");
                return Err(Rejection::BadCredentials.into());
            },
        };

        let user_id = match self.lookup.lookup_user_id(&identity.subject).await {
            Ok(user_id) => user_id,
            Err(LookupError::NotFound(subject)) => {
                // verified but has no user record
                error!(subject = %subject, "Verified user has no user id");
                return Err(Rejection::BadCredentials.into());
            },
            Err(LookupError::Unavailable(reason)) => {
                return Err(CredentialAuthError::Directory(reason));
            },
        };

        let token = self.codec.issue(&user_id, BTreeMap::new())?;
        debug!(user_id = %user_id, "Login succeeded");

        Ok(LoginSuccess { user_id, token })
    }

    /// Answer a login request.
    pub async fn handle(&self, ctx: &RequestContext) -> Response {
        match self.login(ctx.request().body()).await {
            Ok(success) => Response::ok()
                .header(TOKEN_HEADER, success.token.into_string())
                .header(USER_ID_HEADER, success.user_id)
                .build(),
            Err(CredentialAuthError::Rejected(rejection)) => rejection.into_response(),
            Err(e) => {
                warn!(request_id = %ctx.request_id(), error = %e, "Login failed");
                Response::internal_error().text("login failed").build()
            },
        }
    }
}

#[async_trait]
impl Backend for CredentialAuthFilter {
    async fn call(&self, ctx: &RequestContext) -> HttpResult<Response> {
        Ok(self.handle(ctx).await)
    }
}
