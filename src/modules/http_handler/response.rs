//! HTTP response building and serialization.

use super::error::{HttpError, HttpResult};
use bytes::{Bytes, BytesMut};
use http::{StatusCode, Version};
use std::collections::HashMap;

/// HTTP response.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    version: Version,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Response {
    /// Create a new response builder.
    #[must_use]
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::new()
    }

    /// Create an OK (200) response.
    #[must_use]
    pub fn ok() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::OK)
    }

    /// Create a Bad Request (400) response.
    #[must_use]
    pub fn bad_request() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::BAD_REQUEST)
    }

    /// Create an Unauthorized (401) response.
    #[must_use]
    pub fn unauthorized() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::UNAUTHORIZED)
    }

    /// Create a Forbidden (403) response.
    #[must_use]
    pub fn forbidden() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::FORBIDDEN)
    }

    /// Create a Not Found (404) response.
    #[must_use]
    pub fn not_found() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::NOT_FOUND)
    }

    /// Create a Payload Too Large (413) response.
    #[must_use]
    pub fn payload_too_large() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::PAYLOAD_TOO_LARGE)
    }

    /// Create an Internal Server Error (500) response.
    #[must_use]
    pub fn internal_error() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Create a Bad Gateway (502) response.
    #[must_use]
    pub fn bad_gateway() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::BAD_GATEWAY)
    }

    /// Create a Gateway Timeout (504) response.
    #[must_use]
    pub fn gateway_timeout() -> ResponseBuilder {
        ResponseBuilder::new().status(StatusCode::GATEWAY_TIMEOUT)
    }

    /// Get the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Get a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// Get all headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Get the Content-Length.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|s| s.trim().parse().ok())
    }

    /// Get the response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the response body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Set a header value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into().to_lowercase(), value.into());
    }

    /// Remove a header.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_lowercase())
    }

    /// Serialize the response to bytes.
    ///
    /// Content-Length always reflects the body actually carried.
    #[must_use]
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(128 + self.body.len());

        let version_str = match self.version {
            Version::HTTP_10 => "HTTP/1.0",
            _ => "HTTP/1.1",
        };
        buf.extend_from_slice(
            format!(
                "{version_str} {} {}\r\n",
                self.status.as_u16(),
                self.status.canonical_reason().unwrap_or("")
            )
            .as_bytes(),
        );

        for (name, value) in &self.headers {
            if name == "content-length" || name == "transfer-encoding" {
                continue;
            }
            buf.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        buf.extend_from_slice(format!("content-length: {}\r\n", self.body.len()).as_bytes());
        buf.extend_from_slice(b"\r\n");

        if !self.body.is_empty() {
            buf.extend_from_slice(&self.body);
        }

        buf
    }

    /// Parse a response head from bytes.
    ///
    /// Returns the response (with an empty body) and the offset of the body.
    pub fn parse(data: &[u8]) -> HttpResult<(Self, usize)> {
        let mut headers = [httparse::EMPTY_HEADER; 100];
        let mut resp = httparse::Response::new(&mut headers);

        match resp.parse(data)? {
            httparse::Status::Complete(body_offset) => {
                let status = resp
                    .code
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .ok_or_else(|| HttpError::Parse("invalid status code".to_string()))?;

                let version = match resp.version {
                    Some(0) => Version::HTTP_10,
                    _ => Version::HTTP_11,
                };

                let headers = resp
                    .headers
                    .iter()
                    .map(|h| {
                        (
                            h.name.to_lowercase(),
                            String::from_utf8_lossy(h.value).into_owned(),
                        )
                    })
                    .collect();

                let response = Response {
                    status,
                    version,
                    headers,
                    body: Bytes::new(),
                };

                Ok((response, body_offset))
            },
            httparse::Status::Partial => Err(HttpError::Incomplete),
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            version: Version::HTTP_11,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }
}

/// Builder for HTTP responses.
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl ResponseBuilder {
    /// Create a new response builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Set the status code.
    #[must_use]
    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Set the Content-Type header.
    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header("content-type", content_type)
    }

    /// Set the response body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a text body with Content-Type: text/plain.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.content_type("text/plain; charset=utf-8")
            .body(Bytes::from(text.into()))
    }

    /// Set a JSON body with Content-Type: application/json.
    #[must_use]
    pub fn json(self, json: impl Into<String>) -> Self {
        self.content_type("application/json")
            .body(Bytes::from(json.into()))
    }

    /// Build the response.
    #[must_use]
    pub fn build(self) -> Response {
        Response {
            status: self.status,
            version: Version::HTTP_11,
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
