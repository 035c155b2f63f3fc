//! # Access Control Module
//!
//! Network and path based admission for requests entering the gateway.
//!
//! ## Features
//!
//! - **Path whitelist**: exact, `*` and trailing `/**` patterns with an
//!   optional method qualifier
//! - **CIDR match**: a single allowed IPv4 or IPv6 network
//! - **Proxy awareness**: `X-Forwarded-For` / `X-Real-IP` from trusted peers
//! - **Path screening**: non-canonical paths never match the whitelist
//!
//! ## Usage
//!
//! ```ignore
//! use edge_guard::modules::access_control::{AccessControlConfig, AccessDecisionPolicy};
//!
//! let policy = AccessDecisionPolicy::from_config(&AccessControlConfig::default())?;
//! let decision = policy.decide(&Method::GET, "/users", "127.0.0.1");
//! if !decision.allowed {
//!     // Return 403 Forbidden
//! }
//! ```

mod config;
mod error;
mod ip_filter;
mod path;
mod policy;
mod whitelist;

pub use config::{AccessControlConfig, WhitelistEntry};
pub use error::{AccessControlError, AccessControlResult};
pub use ip_filter::{Cidr, IpPolicy};
pub use path::{check_path, is_canonical_path, PathViolation};
pub use policy::{AccessDecision, AccessDecisionPolicy, MatchedRule};
pub use whitelist::Whitelist;
