//! HTTP request parsing.

use super::error::{HttpError, HttpResult};
use bytes::{Bytes, BytesMut};
use http::{Method, Uri, Version};
use std::collections::HashMap;
use std::str::FromStr;

/// Maximum number of headers to parse.
const MAX_HEADERS: usize = 100;

/// Parsed HTTP/1.x request.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl Request {
    /// Create a new request builder.
    #[must_use]
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    /// Get the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Get the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Get the query string.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Get the HTTP version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
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

    /// Get the Content-Length header as usize.
    #[must_use]
    pub fn content_length(&self) -> Option<usize> {
        self.header("content-length").and_then(|s| s.trim().parse().ok())
    }

    /// Get the request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Replace the request body.
    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    /// Replace the path, keeping the query string.
    pub fn set_path(&mut self, path: &str) -> HttpResult<()> {
        let target = match self.uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path.to_string(),
        };
        self.uri = Uri::from_str(&target)?;
        Ok(())
    }

    /// Set a header value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into().to_lowercase(), value.into());
    }

    /// Remove a header.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&name.to_lowercase())
    }

    /// Parse the request head from bytes.
    ///
    /// Returns the request (with an empty body) and the offset of the body.
    pub fn parse(data: &[u8]) -> HttpResult<(Self, usize)> {
        let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
        let mut req = httparse::Request::new(&mut headers);

        match req.parse(data)? {
            httparse::Status::Complete(body_offset) => {
                let method = Method::from_str(req.method.unwrap_or("GET"))?;
                let uri = Uri::from_str(req.path.unwrap_or("/"))?;
                let version = match req.version {
                    Some(0) => Version::HTTP_10,
                    _ => Version::HTTP_11,
                };

                let mut lengths = req
                    .headers
                    .iter()
                    .filter(|h| h.name.eq_ignore_ascii_case("content-length"))
                    .map(|h| h.value);
                if let Some(first) = lengths.next() {
                    if lengths.any(|v| v != first) {
                        return Err(HttpError::Parse(
                            "conflicting Content-Length headers".to_string(),
                        ));
                    }
                }

                let headers = req
                    .headers
                    .iter()
                    .map(|h| {
                        (
                            h.name.to_lowercase(),
                            String::from_utf8_lossy(h.value).into_owned(),
                        )
                    })
                    .collect();

                let request = Request {
                    method,
                    uri,
                    version,
                    headers,
                    body: Bytes::new(),
                };

                Ok((request, body_offset))
            },
            httparse::Status::Partial => Err(HttpError::Incomplete),
        }
    }

    /// Serialize the request for forwarding upstream.
    pub fn serialize(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(256 + self.body.len());

        let version_str = match self.version {
            Version::HTTP_10 => "HTTP/1.0",
            _ => "HTTP/1.1",
        };
        let target = self
            .uri
            .path_and_query()
            .map_or_else(|| self.uri.path().to_string(), |pq| pq.as_str().to_string());
        buf.extend_from_slice(format!("{} {target} {version_str}\r\n", self.method).as_bytes());

        for (name, value) in &self.headers {
            buf.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        buf.extend_from_slice(b"\r\n");

        if !self.body.is_empty() {
            buf.extend_from_slice(&self.body);
        }

        buf
    }
}

/// Builder for HTTP requests.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HashMap<String, String>,
    body: Bytes,
}

impl RequestBuilder {
    /// Create a new request builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the request URI.
    pub fn uri(mut self, uri: impl AsRef<str>) -> HttpResult<Self> {
        self.uri = Some(Uri::from_str(uri.as_ref())?);
        Ok(self)
    }

    /// Add a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_lowercase(), value.into());
        self
    }

    /// Set the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Build the request.
    #[must_use]
    pub fn build(self) -> Request {
        let mut headers = self.headers;
        if !self.body.is_empty() {
            headers
                .entry("content-length".to_string())
                .or_insert_with(|| self.body.len().to_string());
        }

        Request {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            version: Version::HTTP_11,
            headers,
            body: self.body,
        }
    }
}
