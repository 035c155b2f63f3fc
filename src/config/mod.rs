//! # Configuration System
//!
//! TOML-based configuration for edge-guard: parsing, defaults and
//! validation. Each section maps onto the configuration type of the module
//! that consumes it.
//!
//! ## Example Configuration
//!
//! ```toml
//! [gateway]
//! listen_address = "0.0.0.0"
//! listen_port = 8000
//!
//! [[gateway.routes]]
//! name = "user-service"
//! path = "/users/**"
//! upstream = "127.0.0.1:9001"
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [token]
//! secret = "at least thirty-two bytes of secret material"
//! ttl_secs = 3600
//!
//! [access_control]
//! allowed_network = "192.168.56.1/32"
//! whitelist = ["/actuator/**", "/health_check/**", "/welcome"]
//! ```

mod error;
mod loader;
mod types;
mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, TOKEN_SECRET_ENV};
pub use types::{FiltersConfig, GatewayConfig, LogFormat, LogLevel, LoggingConfig};
pub use validation::{
    BasicValidator, SecurityValidator, ValidationError, ValidationResult, ValidationSeverity,
    Validator,
};
