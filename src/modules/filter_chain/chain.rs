//! Ordered execution of gateway filters around a backend.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::context::{ChainPhase, RequestContext};
use super::filter::{FilterAction, GatewayFilter};
use crate::modules::http_handler::{Backend, Response};

/// Default time allowed for the backend to answer.
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

/// An ordered pipeline of filters.
///
/// Filters run in ascending precedence for both phases. Ties keep
/// registration order.
pub struct FilterChain {
    filters: Vec<Arc<dyn GatewayFilter>>,
    dispatch_timeout: Duration,
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filter_names())
            .field("dispatch_timeout", &self.dispatch_timeout)
            .finish()
    }
}

impl FilterChain {
    /// Create an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Set the backend timeout.
    #[must_use]
    pub fn with_dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    /// Register a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Arc<dyn GatewayFilter>) -> Self {
        self.add(filter);
        self
    }

    /// Register a filter.
    pub fn add(&mut self, filter: Arc<dyn GatewayFilter>) {
        self.filters.push(filter);
        // sort_by_key is stable
        self.filters.sort_by_key(|f| f.precedence());
    }

    /// Get the filter names in execution order.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Get the number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Check if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run one request through the chain.
    ///
    /// A pre-hook response is a hard stop: later pre-hooks, the backend and
    /// every post-hook are skipped. Otherwise post-hooks run once the backend
    /// has answered, failed (502) or timed out (504).
    pub async fn execute(&self, ctx: &mut RequestContext, backend: &dyn Backend) -> Response {
        ctx.set_phase(ChainPhase::PreRun);

        for filter in &self.filters {
            if let FilterAction::Respond(response) = filter.pre(ctx).await {
                debug!(
                    filter = %filter.name(),
                    request_id = %ctx.request_id(),
                    status = response.status().as_u16(),
                    "Filter short-circuited request"
                );
                ctx.set_status(response.status());
                ctx.set_phase(ChainPhase::Completed);
                return response;
            }
        }

        ctx.set_phase(ChainPhase::Dispatched);
        let response = match tokio::time::timeout(self.dispatch_timeout, backend.call(ctx)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(request_id = %ctx.request_id(), error = %e, "Backend failed");
                Response::bad_gateway().text("bad gateway").build()
            },
            Err(_) => {
                warn!(
                    request_id = %ctx.request_id(),
                    timeout_ms = self.dispatch_timeout.as_millis() as u64,
                    "Backend timed out"
                );
                Response::gateway_timeout().text("gateway timeout").build()
            },
        };
        ctx.set_status(response.status());

        ctx.set_phase(ChainPhase::PostRun);
        for filter in &self.filters {
            filter.post(ctx).await;
        }

        ctx.set_phase(ChainPhase::Completed);
        response
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::http_handler::{HttpError, HttpResult, Request};
    use async_trait::async_trait;
    use http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: String,
        precedence: i32,
        log: Log,
        reject: bool,
    }

    impl Recording {
        fn new(name: &str, precedence: i32, log: &Log) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                precedence,
                log: Arc::clone(log),
                reject: false,
            })
        }

        fn rejecting(name: &str, precedence: i32, log: &Log) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                precedence,
                log: Arc::clone(log),
                reject: true,
            })
        }
    }

    #[async_trait]
    impl GatewayFilter for Recording {
        fn name(&self) -> &str {
            &self.name
        }

        fn precedence(&self) -> i32 {
            self.precedence
        }

        async fn pre(&self, _ctx: &mut RequestContext) -> FilterAction {
            self.log.lock().unwrap().push(format!("pre:{}", self.name));
            if self.reject {
                FilterAction::Respond(Response::unauthorized().build())
            } else {
                FilterAction::Continue
            }
        }

        async fn post(&self, ctx: &RequestContext) {
            self.log.lock().unwrap().push(format!(
                "post:{}:{}",
                self.name,
                ctx.status().map_or(0, |s| s.as_u16())
            ));
        }
    }

    enum Mode {
        Ok,
        Fail,
        Hang,
    }

    struct TestBackend {
        mode: Mode,
        calls: AtomicUsize,
    }

    impl TestBackend {
        fn new(mode: Mode) -> Self {
            Self {
                mode,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Backend for TestBackend {
        async fn call(&self, ctx: &RequestContext) -> HttpResult<Response> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(ctx.phase(), ChainPhase::Dispatched);
            match self.mode {
                Mode::Ok => Ok(Response::ok().text("hello").build()),
                Mode::Fail => Err(HttpError::Backend("connection refused".to_string())),
                Mode::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(Response::ok().build())
                },
            }
        }
    }

    fn context() -> RequestContext {
        RequestContext::new(Request::builder().uri("/users").unwrap().build(), "10.0.0.1")
    }

    #[tokio::test]
    async fn test_precedence_order() {
        let log = Log::default();
        let chain = FilterChain::new()
            .with_filter(Recording::new("ten", 10, &log))
            .with_filter(Recording::new("zero", 0, &log))
            .with_filter(Recording::new("hundred", 100, &log));

        assert_eq!(chain.filter_names(), vec!["zero", "ten", "hundred"]);

        let backend = TestBackend::new(Mode::Ok);
        let mut ctx = context();
        let response = chain.execute(&mut ctx, &backend).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(ctx.phase(), ChainPhase::Completed);
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "pre:zero",
                "pre:ten",
                "pre:hundred",
                "post:zero:200",
                "post:ten:200",
                "post:hundred:200",
            ]
        );
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let log = Log::default();
        let chain = FilterChain::new()
            .with_filter(Recording::new("first", 5, &log))
            .with_filter(Recording::new("second", 5, &log))
            .with_filter(Recording::new("early", i32::MIN, &log))
            .with_filter(Recording::new("late", i32::MAX, &log));

        assert_eq!(chain.filter_names(), vec!["early", "first", "second", "late"]);
    }

    #[tokio::test]
    async fn test_short_circuit_is_hard_stop() {
        let log = Log::default();
        let chain = FilterChain::new()
            .with_filter(Recording::new("a", 0, &log))
            .with_filter(Recording::rejecting("auth", 1, &log))
            .with_filter(Recording::new("b", 2, &log));

        let backend = TestBackend::new(Mode::Ok);
        let mut ctx = context();
        let response = chain.execute(&mut ctx, &backend).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ctx.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(ctx.phase(), ChainPhase::Completed);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*log.lock().unwrap(), vec!["pre:a", "pre:auth"]);
    }

    #[tokio::test]
    async fn test_backend_failure_runs_post_hooks() {
        let log = Log::default();
        let chain = FilterChain::new().with_filter(Recording::new("logging", 0, &log));

        let backend = TestBackend::new(Mode::Fail);
        let mut ctx = context();
        let response = chain.execute(&mut ctx, &backend).await;

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(*log.lock().unwrap(), vec!["pre:logging", "post:logging:502"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backend_timeout_runs_post_hooks() {
        let log = Log::default();
        let chain = FilterChain::new()
            .with_dispatch_timeout(Duration::from_millis(50))
            .with_filter(Recording::new("logging", 0, &log));

        let backend = TestBackend::new(Mode::Hang);
        let mut ctx = context();
        let response = chain.execute(&mut ctx, &backend).await;

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*log.lock().unwrap(), vec!["pre:logging", "post:logging:504"]);
    }

    #[tokio::test]
    async fn test_empty_chain_dispatches() {
        let chain = FilterChain::default();
        assert!(chain.is_empty());

        let backend = TestBackend::new(Mode::Ok);
        let mut ctx = context();
        let response = chain.execute(&mut ctx, &backend).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }
}
