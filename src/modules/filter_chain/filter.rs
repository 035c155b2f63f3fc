//! Filter trait and per-filter configuration.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::context::RequestContext;
use crate::modules::http_handler::Response;

/// Immutable per-filter configuration, shared by every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Ordering key. Lower runs earlier.
    pub precedence: i32,

    /// Message recorded on every request.
    pub base_message: String,

    /// Record an event before dispatch.
    pub log_pre: bool,

    /// Record an event after dispatch.
    pub log_post: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            precedence: 0,
            base_message: String::new(),
            log_pre: true,
            log_post: true,
        }
    }
}

impl FilterConfig {
    /// Create a config with the given precedence.
    #[must_use]
    pub fn with_precedence(precedence: i32) -> Self {
        Self {
            precedence,
            ..Self::default()
        }
    }

    /// Set the base message.
    #[must_use]
    pub fn with_base_message(mut self, message: impl Into<String>) -> Self {
        self.base_message = message.into();
        self
    }

    /// Enable or disable the pre/post events.
    #[must_use]
    pub fn with_logging(mut self, log_pre: bool, log_post: bool) -> Self {
        self.log_pre = log_pre;
        self.log_post = log_post;
        self
    }
}

/// What the chain does after a pre-hook.
#[derive(Debug)]
pub enum FilterAction {
    /// Run the next filter.
    Continue,
    /// Stop the chain and answer with this response.
    Respond(Response),
}

impl FilterAction {
    /// Check if the chain continues.
    #[must_use]
    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }
}

/// A member of the gateway filter chain.
///
/// Filters hold only immutable configuration. All per-request state lives in
/// the [`RequestContext`].
#[async_trait]
pub trait GatewayFilter: Send + Sync {
    /// Filter name.
    fn name(&self) -> &str;

    /// Ordering key. Lower runs earlier.
    fn precedence(&self) -> i32 {
        0
    }

    /// Runs before dispatch.
    async fn pre(&self, _ctx: &mut RequestContext) -> FilterAction {
        FilterAction::Continue
    }

    /// Runs after dispatch, once the outgoing status is known.
    async fn post(&self, _ctx: &RequestContext) {}
}
