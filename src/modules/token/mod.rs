//! # Token Module
//!
//! Compact signed tokens shared by the login service (issuer) and the
//! gateway (verifier).
//!
//! Tokens are HS256 JWS strings carrying `{sub, tokenType, iat, exp}`.
//! Validation fails closed: every problem with a token collapses into
//! [`AuthenticationOutcome::Rejected`].
//!
//! ## Usage
//!
//! ```ignore
//! use edge_guard::modules::token::{TokenCodec, TokenConfig};
//!
//! let codec = TokenCodec::new(&TokenConfig::new(secret))?;
//! let token = codec.issue("u1", Default::default())?;
//! assert!(codec.validate(token.as_str()).is_authenticated());
//! ```

mod claims;
mod codec;
mod config;
mod error;

pub use claims::{Claims, TokenType, RESERVED_CLAIMS};
pub use codec::{AuthenticationOutcome, Token, TokenCodec};
pub use config::{TokenConfig, MIN_SECRET_LEN};
pub use error::{TokenError, TokenResult};
