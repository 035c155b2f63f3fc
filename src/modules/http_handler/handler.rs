//! Per-request pipeline: network policy, filter chain, dispatch.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::backend::{Backend, RoutedBackend};
use super::error::{HttpError, HttpResult};
use super::request::Request;
use super::response::Response;
use super::router::Router;
use crate::config::GatewayConfig;
use crate::modules::access_control::{
    check_path, AccessDecisionPolicy, Whitelist, WhitelistEntry,
};
use crate::modules::credential_auth::{CredentialAuthFilter, InMemoryDirectory};
use crate::modules::filter_chain::{
    FilterChain, GatewayAuthFilter, LoggingFilter, Rejection, RequestContext, REQUEST_ID_HEADER,
};
use crate::modules::token::TokenCodec;

/// Sends login requests to the login endpoint and everything else upstream.
struct Dispatcher {
    login: Option<Arc<CredentialAuthFilter>>,
    upstream: Arc<dyn Backend>,
}

#[async_trait]
impl Backend for Dispatcher {
    async fn call(&self, ctx: &RequestContext) -> HttpResult<Response> {
        match &self.login {
            Some(login) if login.handles(ctx.method(), ctx.path()) => login.call(ctx).await,
            _ => self.upstream.call(ctx).await,
        }
    }
}

/// The gateway request pipeline.
///
/// Every request is first checked by the [`AccessDecisionPolicy`]. A denied
/// request is answered with 403 before any filter runs. Allowed requests go
/// through the [`FilterChain`] and are dispatched to the login endpoint or
/// the routed upstream.
pub struct GatewayHandler {
    policy: AccessDecisionPolicy,
    chain: FilterChain,
    dispatcher: Dispatcher,
}

impl std::fmt::Debug for GatewayHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayHandler")
            .field("filters", &self.chain.filter_names())
            .field("login", &self.dispatcher.login.is_some())
            .finish_non_exhaustive()
    }
}

impl GatewayHandler {
    /// Create a handler from its parts.
    #[must_use]
    pub fn new(policy: AccessDecisionPolicy, chain: FilterChain, upstream: Arc<dyn Backend>) -> Self {
        Self {
            policy,
            chain,
            dispatcher: Dispatcher {
                login: None,
                upstream,
            },
        }
    }

    /// Serve the login endpoint.
    #[must_use]
    pub fn with_login(mut self, login: Arc<CredentialAuthFilter>) -> Self {
        self.dispatcher.login = Some(login);
        self
    }

    /// Build the full pipeline from configuration, forwarding to the
    /// configured routes.
    ///
    /// # Errors
    ///
    /// Returns an error for a missing or weak token secret, an invalid
    /// network or pattern, an invalid route, or an invalid user entry.
    pub fn from_config(config: &GatewayConfig) -> HttpResult<Self> {
        let router = Router::from_configs(&config.gateway.routes)?;
        Self::from_config_with_backend(config, Arc::new(RoutedBackend::new(router)))
    }

    /// Build the full pipeline from configuration with a custom upstream.
    ///
    /// # Errors
    ///
    /// Same as [`GatewayHandler::from_config`].
    pub fn from_config_with_backend(
        config: &GatewayConfig,
        upstream: Arc<dyn Backend>,
    ) -> HttpResult<Self> {
        let codec = Arc::new(
            TokenCodec::new(&config.token).map_err(|e| HttpError::Config(e.to_string()))?,
        );
        let policy = AccessDecisionPolicy::from_config(&config.access_control)
            .map_err(|e| HttpError::Config(e.to_string()))?;

        let login_config = &config.credential_auth;
        let open_paths = if login_config.enabled {
            Whitelist::from_entries(&[WhitelistEntry::with_methods(
                login_config.login_path.as_str(),
                &["POST"],
            )])
            .map_err(|e| HttpError::Config(e.to_string()))?
        } else {
            Whitelist::default()
        };

        let mut chain = FilterChain::new().with_dispatch_timeout(config.gateway.backend_timeout());
        if let Some(global) = &config.filters.global {
            chain.add(Arc::new(LoggingFilter::global(global.clone())));
        }
        chain.add(Arc::new(
            GatewayAuthFilter::new(Arc::clone(&codec), config.filters.auth.clone())
                .with_open_paths(open_paths),
        ));
        chain.add(Arc::new(LoggingFilter::new(config.filters.logging.clone())));

        let mut handler = Self::new(policy, chain, upstream);

        if login_config.enabled {
            let directory = Arc::new(
                InMemoryDirectory::from_entries(&login_config.users)
                    .map_err(|e| HttpError::Config(e.to_string()))?,
            );
            handler = handler.with_login(Arc::new(CredentialAuthFilter::new(
                codec,
                directory.clone(),
                directory,
                login_config,
            )));
        }

        info!(
            filters = ?handler.chain.filter_names(),
            allowed_network = %handler.policy.ip_policy().allowed(),
            whitelist = handler.policy.whitelist().len(),
            login = login_config.enabled,
            "Gateway pipeline ready"
        );

        Ok(handler)
    }

    /// Get the access policy.
    #[must_use]
    pub fn policy(&self) -> &AccessDecisionPolicy {
        &self.policy
    }

    /// Get the filter chain.
    #[must_use]
    pub fn chain(&self) -> &FilterChain {
        &self.chain
    }

    /// Handle one request from `peer_ip`.
    pub async fn handle(&self, request: Request, peer_ip: &str) -> Response {
        let client_ip = self
            .policy
            .ip_policy()
            .client_ip(peer_ip, request.headers());
        let mut ctx = RequestContext::new(request, client_ip);

        if let Err(violation) = check_path(ctx.path()) {
            info!(
                request_id = %ctx.request_id(),
                client_ip = %ctx.client_ip(),
                path = %ctx.path(),
                reason = %violation,
                "Rejected non-canonical path"
            );
            let mut response = Rejection::InvalidPath.into_response();
            response.set_header(REQUEST_ID_HEADER, ctx.request_id());
            return response;
        }

        let decision = self
            .policy
            .decide(ctx.method(), ctx.path(), ctx.client_ip());

        let mut response = if decision.allowed {
            ctx.set_whitelisted(decision.is_whitelisted());
            debug!(
                request_id = %ctx.request_id(),
                rule = %decision.matched_rule,
                "Request admitted"
            );
            self.chain.execute(&mut ctx, &self.dispatcher).await
        } else {
            info!(
                request_id = %ctx.request_id(),
                client_ip = %ctx.client_ip(),
                method = %ctx.method(),
                path = %ctx.path(),
                "Network denied"
            );
            Rejection::NetworkDenied.into_response()
        };

        response.set_header(REQUEST_ID_HEADER, ctx.request_id());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::access_control::AccessControlConfig;
    use http::{Method, StatusCode};

    struct Echo;

    #[async_trait]
    impl Backend for Echo {
        async fn call(&self, ctx: &RequestContext) -> HttpResult<Response> {
            Ok(Response::ok()
                .header("x-subject", ctx.subject().unwrap_or("-"))
                .text(ctx.path().to_string())
                .build())
        }
    }

    fn config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.token.secret = "0123456789abcdef0123456789abcdef".to_string();
        config.access_control = AccessControlConfig::new("10.0.0.0/8").with_whitelist("/welcome");
        config
    }

    fn get(path: &str) -> Request {
        Request::builder().method(Method::GET).uri(path).unwrap().build()
    }

    #[test]
    fn test_from_config_filter_order() {
        let mut config = config();
        config.filters.global = Some(LoggingFilter::global_config());

        let handler = GatewayHandler::from_config_with_backend(&config, Arc::new(Echo)).unwrap();
        assert_eq!(
            handler.chain().filter_names(),
            vec!["global", "gateway-auth", "logging"]
        );
    }

    #[test]
    fn test_from_config_rejects_weak_secret() {
        let mut config = config();
        config.token.secret = "short".to_string();

        let err = GatewayHandler::from_config_with_backend(&config, Arc::new(Echo)).unwrap_err();
        assert!(matches!(err, HttpError::Config(_)));
    }

    #[tokio::test]
    async fn test_network_denied() {
        let handler = GatewayHandler::from_config_with_backend(&config(), Arc::new(Echo)).unwrap();

        let response = handler.handle(get("/users"), "192.168.1.1").await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.header(REQUEST_ID_HEADER).is_some());
    }

    #[tokio::test]
    async fn test_non_canonical_path_rejected_before_policy() {
        let handler = GatewayHandler::from_config_with_backend(&config(), Arc::new(Echo)).unwrap();

        for peer in ["192.168.1.1", "10.1.2.3"] {
            let response = handler.handle(get("/welcome/../users"), peer).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(response.body().as_ref(), b"invalid path");
            assert!(response.header(REQUEST_ID_HEADER).is_some());
        }
    }

    #[tokio::test]
    async fn test_whitelisted_from_any_network() {
        let handler = GatewayHandler::from_config_with_backend(&config(), Arc::new(Echo)).unwrap();

        let response = handler.handle(get("/welcome"), "192.168.1.1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"/welcome");
    }

    #[tokio::test]
    async fn test_protected_requires_token() {
        let handler = GatewayHandler::from_config_with_backend(&config(), Arc::new(Echo)).unwrap();

        let response = handler.handle(get("/users"), "10.1.2.3").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_path_skips_token_check() {
        let handler = GatewayHandler::from_config_with_backend(&config(), Arc::new(Echo)).unwrap();

        let request = Request::builder()
            .method(Method::POST)
            .uri("/login")
            .unwrap()
            .body(r#"{"email":"nobody@example.com","password":"pw"}"#)
            .build();

        // reaches the login endpoint, which refuses the unknown user
        let response = handler.handle(request, "10.1.2.3").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.body().as_ref(), b"bad credentials");
    }
}
