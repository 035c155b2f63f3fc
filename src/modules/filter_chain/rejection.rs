//! Terminal rejections produced by filters.

use http::StatusCode;
use thiserror::Error;

use crate::modules::http_handler::Response;

/// Why a request was refused.
///
/// Each rejection is converted to a terminal response by the filter that
/// detects it and never propagates past the chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// No `Authorization` header on a protected path.
    #[error("missing credential")]
    MissingCredential,

    /// The presented token was not accepted.
    #[error("invalid credential")]
    InvalidCredential,

    /// The request path is not in canonical form.
    #[error("invalid path")]
    InvalidPath,

    /// The login body could not be parsed.
    #[error("malformed request")]
    MalformedRequest,

    /// The login credentials were not accepted.
    #[error("bad credentials")]
    BadCredentials,

    /// The client address is outside the allowed network.
    #[error("network denied")]
    NetworkDenied,
}

impl Rejection {
    /// Get the HTTP status for this rejection.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredential | Self::InvalidCredential | Self::BadCredentials => {
                StatusCode::UNAUTHORIZED
            },
            Self::InvalidPath | Self::MalformedRequest => StatusCode::BAD_REQUEST,
            Self::NetworkDenied => StatusCode::FORBIDDEN,
        }
    }

    /// Build the terminal response.
    #[must_use]
    pub fn into_response(self) -> Response {
        let mut builder = Response::builder().status(self.status());
        if self.status() == StatusCode::UNAUTHORIZED {
            builder = builder.header("www-authenticate", "Bearer");
        }
        builder.text(self.to_string()).build()
    }
}

impl From<Rejection> for Response {
    fn from(rejection: Rejection) -> Self {
        rejection.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Rejection::MissingCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::BadCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Rejection::InvalidPath.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::MalformedRequest.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Rejection::NetworkDenied.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_into_response() {
        let response = Rejection::MissingCredential.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("www-authenticate"), Some("Bearer"));
        assert_eq!(response.body().as_ref(), b"missing credential");

        let response: Response = Rejection::NetworkDenied.into();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.header("www-authenticate").is_none());
    }
}
