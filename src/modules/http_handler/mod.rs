//! # HTTP Handler Module
//!
//! HTTP/1.1 plumbing for the gateway: request and response types, the
//! listener and connection loop, path routing to upstreams, and the
//! [`GatewayHandler`] that ties the access policy, the filter chain and
//! dispatch together.
//!
//! ## Example
//!
//! ```rust,ignore
//! use edge_guard::config::ConfigLoader;
//! use edge_guard::modules::http_handler::{GatewayHandler, GatewayServer};
//!
//! let config = ConfigLoader::with_default_validators().load("edge-guard.toml")?;
//! let handler = GatewayHandler::from_config(&config)?;
//! GatewayServer::new(Arc::new(handler), config.gateway.clone())
//!     .run(shutdown_signal())
//!     .await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod handler;
pub mod request;
pub mod response;
pub mod router;
pub mod server;

pub use backend::{Backend, RoutedBackend};
pub use config::{HttpHandlerConfig, RouteConfig};
pub use error::{HttpError, HttpResult};
pub use handler::GatewayHandler;
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
pub use router::{PathPattern, Route, Router};
pub use server::{shutdown_signal, GatewayServer};
