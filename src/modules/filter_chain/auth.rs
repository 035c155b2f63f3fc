//! Bearer token authentication at the gateway.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::context::RequestContext;
use super::filter::{FilterAction, FilterConfig, GatewayFilter};
use super::rejection::Rejection;
use crate::modules::access_control::Whitelist;
use crate::modules::token::{AuthenticationOutcome, TokenCodec};

/// Authorization scheme accepted by the gateway.
const BEARER_SCHEME: &str = "Bearer";

/// Demands a valid bearer token on every protected path.
///
/// Whitelisted requests and `open_paths` (the login endpoint) pass through
/// without a token.
pub struct GatewayAuthFilter {
    codec: Arc<TokenCodec>,
    config: FilterConfig,
    open_paths: Whitelist,
}

impl std::fmt::Debug for GatewayAuthFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayAuthFilter")
            .field("precedence", &self.config.precedence)
            .field("open_paths", &self.open_paths.len())
            .finish()
    }
}

impl GatewayAuthFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(codec: Arc<TokenCodec>, config: FilterConfig) -> Self {
        Self {
            codec,
            config,
            open_paths: Whitelist::default(),
        }
    }

    /// Exempt paths from the token check.
    #[must_use]
    pub fn with_open_paths(mut self, open_paths: Whitelist) -> Self {
        self.open_paths = open_paths;
        self
    }

    /// Extract the token from an `Authorization` header value.
    ///
    /// Returns `None` when the header does not use the Bearer scheme.
    fn bearer_token(header: &str) -> Option<&str> {
        let (scheme, token) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
            return None;
        }
        let token = token.trim();
        (!token.is_empty()).then_some(token)
    }
}

#[async_trait]
impl GatewayFilter for GatewayAuthFilter {
    fn name(&self) -> &str {
        "gateway-auth"
    }

    fn precedence(&self) -> i32 {
        self.config.precedence
    }

    async fn pre(&self, ctx: &mut RequestContext) -> FilterAction {
        if ctx.is_whitelisted() || self.open_paths.matches(ctx.method(), ctx.path()).is_some() {
            return FilterAction::Continue;
        }

        let Some(header) = ctx.header("authorization") else {
            debug!(request_id = %ctx.request_id(), path = %ctx.path(), "No authorization header");
            return FilterAction::Respond(Rejection::MissingCredential.into_response());
        };

        let Some(token) = Self::bearer_token(header) else {
            debug!(request_id = %ctx.request_id(), "Authorization header is not a bearer token");
            return FilterAction::Respond(Rejection::InvalidCredential.into_response());
        };

        match self.codec.validate(token) {
            AuthenticationOutcome::Authenticated(subject) => {
                debug!(request_id = %ctx.request_id(), subject = %subject, "Token accepted");
                ctx.set_subject(subject);
                FilterAction::Continue
            },
            AuthenticationOutcome::Rejected(reason) => {
                debug!(request_id = %ctx.request_id(), reason = %reason, "JWT token is not valid");
                FilterAction::Respond(Rejection::InvalidCredential.into_response())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::http_handler::Request;
    use crate::modules::token::TokenConfig;
    use http::{Method, StatusCode};
    use std::collections::BTreeMap;

    const SECRET: &str = "gateway-auth-filter-test-secret-0123456789";

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&TokenConfig::new(SECRET)).unwrap())
    }

    fn filter() -> GatewayAuthFilter {
        GatewayAuthFilter::new(codec(), FilterConfig::default())
            .with_open_paths(Whitelist::from_paths(&["/login"]).unwrap())
    }

    fn context(method: Method, path: &str, authorization: Option<&str>) -> RequestContext {
        let mut builder = Request::builder().method(method).uri(path).unwrap();
        if let Some(value) = authorization {
            builder = builder.header("Authorization", value);
        }
        RequestContext::new(builder.build(), "127.0.0.1")
    }

    fn rejected_status(action: FilterAction) -> StatusCode {
        match action {
            FilterAction::Respond(response) => response.status(),
            FilterAction::Continue => panic!("request was not rejected"),
        }
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(GatewayAuthFilter::bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(GatewayAuthFilter::bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(GatewayAuthFilter::bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(GatewayAuthFilter::bearer_token("Bearer"), None);
        assert_eq!(GatewayAuthFilter::bearer_token("Bearer   "), None);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let mut ctx = context(Method::GET, "/users", None);
        let action = filter().pre(&mut ctx).await;
        assert_eq!(rejected_status(action), StatusCode::UNAUTHORIZED);
        assert!(ctx.subject().is_none());
    }

    #[tokio::test]
    async fn test_valid_token_attaches_subject() {
        let token = codec().issue("u1", BTreeMap::new()).unwrap();
        let header = format!("Bearer {token}");

        let mut ctx = context(Method::GET, "/users", Some(&header));
        let action = filter().pre(&mut ctx).await;

        assert!(action.is_continue());
        assert_eq!(ctx.subject(), Some("u1"));
    }

    #[tokio::test]
    async fn test_invalid_token() {
        let mut ctx = context(Method::GET, "/users", Some("Bearer not.a.token"));
        let action = filter().pre(&mut ctx).await;
        assert_eq!(rejected_status(action), StatusCode::UNAUTHORIZED);
        assert!(ctx.subject().is_none());
    }

    #[tokio::test]
    async fn test_token_from_other_issuer() {
        let other = TokenCodec::new(&TokenConfig::new("some-other-secret-0123456789abcdef")).unwrap();
        let token = other.issue("u1", BTreeMap::new()).unwrap();
        let header = format!("Bearer {token}");

        let mut ctx = context(Method::GET, "/users", Some(&header));
        let action = filter().pre(&mut ctx).await;
        assert_eq!(rejected_status(action), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_invalid() {
        let mut ctx = context(Method::GET, "/users", Some("Basic dXNlcjpwYXNz"));
        let response = match filter().pre(&mut ctx).await {
            FilterAction::Respond(response) => response,
            FilterAction::Continue => panic!("request was not rejected"),
        };
        assert_eq!(response.body().as_ref(), b"invalid credential");
    }

    #[tokio::test]
    async fn test_whitelisted_and_open_paths_skip_check() {
        let mut ctx = context(Method::GET, "/actuator/health", None);
        ctx.set_whitelisted(true);
        assert!(filter().pre(&mut ctx).await.is_continue());

        let mut ctx = context(Method::POST, "/login", None);
        assert!(filter().pre(&mut ctx).await.is_continue());
    }

    #[test]
    fn test_precedence_from_config() {
        let filter = GatewayAuthFilter::new(codec(), FilterConfig::with_precedence(-3));
        assert_eq!(filter.precedence(), -3);
        assert_eq!(filter.name(), "gateway-auth");
    }
}
