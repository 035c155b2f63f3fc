//! Request/response logging filter.

use async_trait::async_trait;
use tracing::info;

use super::context::RequestContext;
use super::filter::{FilterAction, FilterConfig, GatewayFilter};

/// Records pre/post events for every request. Never changes the outcome.
#[derive(Debug, Clone)]
pub struct LoggingFilter {
    name: &'static str,
    config: FilterConfig,
}

impl LoggingFilter {
    /// Create the route-level logging filter (runs last by default).
    #[must_use]
    pub fn new(config: FilterConfig) -> Self {
        Self {
            name: "logging",
            config,
        }
    }

    /// Create the global logging filter (runs first by default).
    #[must_use]
    pub fn global(config: FilterConfig) -> Self {
        Self {
            name: "global",
            config,
        }
    }

    /// Default config for [`LoggingFilter::new`].
    #[must_use]
    pub fn default_config() -> FilterConfig {
        FilterConfig::with_precedence(i32::MAX)
            .with_base_message("edge-guard logging filter")
    }

    /// Default config for [`LoggingFilter::global`].
    #[must_use]
    pub fn global_config() -> FilterConfig {
        FilterConfig::with_precedence(i32::MIN)
            .with_base_message("edge-guard global filter")
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

#[async_trait]
impl GatewayFilter for LoggingFilter {
    fn name(&self) -> &str {
        self.name
    }

    fn precedence(&self) -> i32 {
        self.config.precedence
    }

    async fn pre(&self, ctx: &mut RequestContext) -> FilterAction {
        info!(filter = self.name, base_message = %self.config.base_message, "Filter base message");

        if self.config.log_pre {
            info!(
                filter = self.name,
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                client_ip = %ctx.client_ip(),
                "Request received"
            );
        }

        FilterAction::Continue
    }

    async fn post(&self, ctx: &RequestContext) {
        if self.config.log_post {
            info!(
                filter = self.name,
                request_id = %ctx.request_id(),
                status = ctx.status().map_or(0, |s| s.as_u16()),
                subject = ?ctx.subject(),
                elapsed_ms = ctx.elapsed().as_millis() as u64,
                "Response completed"
            );
        }
    }
}
