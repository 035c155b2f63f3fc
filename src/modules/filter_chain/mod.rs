//! # Filter Chain Module
//!
//! Ordered request/response filters executed once per request at the
//! gateway.
//!
//! ## Lifecycle
//!
//! `Created → PreRun → Dispatched → PostRun → Completed`
//!
//! Filters are sorted by ascending precedence. Pre-hooks run in that order,
//! then the backend is called, then post-hooks run in the same order. A
//! pre-hook that responds stops the chain: no further pre-hooks, no
//! dispatch and no post-hooks.
//!
//! ## Built-in Filters
//!
//! - [`GatewayAuthFilter`] - bearer token check on protected paths
//! - [`LoggingFilter`] - pre/post observability events

mod auth;
mod chain;
mod context;
mod filter;
mod logging;
mod rejection;

pub use auth::GatewayAuthFilter;
pub use chain::{FilterChain, DEFAULT_DISPATCH_TIMEOUT};
pub use context::{ChainPhase, RequestContext, REQUEST_ID_HEADER};
pub use filter::{FilterAction, FilterConfig, GatewayFilter};
pub use logging::LoggingFilter;
pub use rejection::Rejection;
