//! Dispatch targets behind the filter chain.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::error::{HttpError, HttpResult};
use super::response::Response;
use super::router::Router;
use crate::modules::filter_chain::{RequestContext, REQUEST_ID_HEADER};

/// Maximum upstream response size.
const MAX_RESPONSE_SIZE: u64 = 16 * 1024 * 1024;

/// Something that produces a response for a request that passed the pre-hooks.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Handle the request.
    ///
    /// # Errors
    ///
    /// An error is answered with 502 by the filter chain.
    async fn call(&self, ctx: &RequestContext) -> HttpResult<Response>;
}

/// Forwards requests to plain HTTP upstreams selected by path.
#[derive(Debug, Clone)]
pub struct RoutedBackend {
    router: Router,
}

impl RoutedBackend {
    /// Create a backend over a route table.
    #[must_use]
    pub fn new(router: Router) -> Self {
        Self { router }
    }

    /// Get the route table.
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    async fn forward(upstream: &str, data: &[u8]) -> HttpResult<Response> {
        let mut stream = TcpStream::connect(upstream)
            .await
            .map_err(|e| HttpError::Backend(format!("connect to {upstream} failed: {e}")))?;

        stream.write_all(data).await?;
        stream.flush().await?;

        let mut buf = Vec::with_capacity(8192);
        (&mut stream)
            .take(MAX_RESPONSE_SIZE)
            .read_to_end(&mut buf)
            .await?;

        let (mut response, body_offset) = Response::parse(&buf)
            .map_err(|e| HttpError::Backend(format!("invalid upstream response: {e}")))?;

        let raw_body = &buf[body_offset..];
        let chunked = response
            .header("transfer-encoding")
            .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));

        let body = if chunked {
            response.remove_header("transfer-encoding");
            decode_chunked(raw_body)?
        } else {
            match response.content_length() {
                Some(len) if len <= raw_body.len() => Bytes::copy_from_slice(&raw_body[..len]),
                Some(len) => {
                    return Err(HttpError::Backend(format!(
                        "upstream closed after {} of {len} body bytes",
                        raw_body.len()
                    )));
                },
                None => Bytes::copy_from_slice(raw_body),
            }
        };

        response.set_body(body);
        Ok(response)
    }
}

#[async_trait]
impl Backend for RoutedBackend {
    async fn call(&self, ctx: &RequestContext) -> HttpResult<Response> {
        let Some(route) = self.router.find(ctx.path()) else {
            debug!(path = %ctx.path(), "No route matched");
            return Ok(Response::not_found().text("no route").build());
        };

        let mut request = ctx.request().clone();
        request.set_path(&route.transform_path(ctx.path()))?;
        request.set_header("host", route.upstream());
        request.set_header("connection", "close");
        request.set_header(REQUEST_ID_HEADER, ctx.request_id());

        let forwarded_for = match ctx.header("x-forwarded-for") {
            Some(existing) => format!("{existing}, {}", ctx.client_ip()),
            None => ctx.client_ip().to_string(),
        };
        request.set_header("x-forwarded-for", forwarded_for);

        debug!(
            route = %route.name(),
            upstream = %route.upstream(),
            path = %request.path(),
            "Forwarding request"
        );

        Self::forward(route.upstream(), &request.serialize()).await
    }
}

/// Decode a chunked transfer-encoded body.
fn decode_chunked(mut data: &[u8]) -> HttpResult<Bytes> {
    let mut body = BytesMut::new();

    loop {
        let (offset, size) = match httparse::parse_chunk_size(data) {
            Ok(httparse::Status::Complete(parsed)) => parsed,
            Ok(httparse::Status::Partial) => return Err(HttpError::Incomplete),
            Err(_) => return Err(HttpError::Parse("invalid chunk size".to_string())),
        };
        let size = usize::try_from(size)
            .map_err(|_| HttpError::Parse("chunk too large".to_string()))?;

        data = &data[offset..];
        if size == 0 {
            return Ok(body.freeze());
        }
        if data.len() < size + 2 {
            return Err(HttpError::Incomplete);
        }

        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}
