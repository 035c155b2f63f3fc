//! # edge-guard
//!
//! An edge gateway that authenticates and admits traffic before it reaches
//! backend services.
//!
//! ## Features
//!
//! - Signed HS256 access tokens issued at login and verified at the edge
//! - Path whitelist and single-network IP policy checked before any filter
//! - Ordered pre/post filter chain with short-circuit responses
//! - Path-based routing to plain HTTP upstreams
//!
//! ## Architecture
//!
//! Each request is resolved to a client address and checked by the
//! [`modules::access_control::AccessDecisionPolicy`]. Admitted requests run
//! through the [`modules::filter_chain::FilterChain`] and are dispatched to
//! the login endpoint or a routed upstream by the
//! [`modules::http_handler::GatewayHandler`].

pub mod config;
pub mod modules;
