//! # Gateway Modules
//!
//! ## Available Modules
//!
//! - [`token`] - HS256 access token issuance and validation
//! - [`access_control`] - Path whitelist and client network policy
//! - [`filter_chain`] - Ordered request filters: bearer auth and logging
//! - [`credential_auth`] - Login endpoint issuing tokens for verified credentials
//! - [`http_handler`] - HTTP/1.1 listener, routing and the request pipeline

pub mod access_control;
pub mod credential_auth;
pub mod filter_chain;
pub mod http_handler;
pub mod token;
