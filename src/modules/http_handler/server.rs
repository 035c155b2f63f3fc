//! TCP listener and HTTP/1.1 connection loop.

use bytes::{Buf, BytesMut};
use http::{StatusCode, Version};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use super::config::HttpHandlerConfig;
use super::error::{HttpError, HttpResult};
use super::handler::GatewayHandler;
use super::request::Request;
use super::response::Response;

/// Serves a [`GatewayHandler`] over plain HTTP/1.1.
#[derive(Debug)]
pub struct GatewayServer {
    handler: Arc<GatewayHandler>,
    config: HttpHandlerConfig,
}

/// Why reading the next request stopped.
enum ReadOutcome {
    /// A complete request.
    Request(Request),
    /// The peer closed or went idle between requests.
    Closed,
    /// The request cannot be served; answer and close.
    Reject(Response),
}

impl GatewayServer {
    /// Create a server.
    #[must_use]
    pub fn new(handler: Arc<GatewayHandler>, config: HttpHandlerConfig) -> Self {
        Self { handler, config }
    }

    /// Bind the configured listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is invalid or cannot be bound.
    pub async fn bind(&self) -> HttpResult<TcpListener> {
        let addr = self.config.socket_addr().ok_or_else(|| {
            HttpError::Config(format!(
                "invalid listen address '{}:{}'",
                self.config.listen_address, self.config.listen_port
            ))
        })?;

        let listener = TcpListener::bind(addr).await?;
        info!(address = %addr, name = %self.config.name, "Gateway listener started");
        Ok(listener)
    }

    /// Accept connections until `shutdown` completes.
    ///
    /// In-flight connections are left to finish on their own tasks.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> HttpResult<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!(peer = %peer, "New connection");

                            let handler = Arc::clone(&self.handler);
                            let config = self.config.clone();

                            tokio::spawn(async move {
                                Self::handle_connection(stream, peer, handler, config).await;
                            });
                        }
                        Err(e) => {
                            warn!(error = %e, "Accept error");
                        }
                    }
                }
                () = &mut shutdown => {
                    info!("Listener shutting down");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Bind and serve until `shutdown` completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn run<F>(self, shutdown: F) -> HttpResult<()>
    where
        F: Future<Output = ()>,
    {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    async fn handle_connection(
        mut stream: TcpStream,
        peer: SocketAddr,
        handler: Arc<GatewayHandler>,
        config: HttpHandlerConfig,
    ) {
        let peer_ip = peer.ip().to_string();
        let mut buf = BytesMut::with_capacity(8192);

        loop {
            let request = match Self::read_request(&mut stream, &mut buf, &config).await {
                ReadOutcome::Request(request) => request,
                ReadOutcome::Closed => break,
                ReadOutcome::Reject(response) => {
                    let _ = stream.write_all(&response.serialize()).await;
                    break;
                },
            };

            let keep_alive = is_keep_alive(&request);
            let mut response = handler.handle(request, &peer_ip).await;
            if !keep_alive {
                response.set_header("connection", "close");
            }

            if let Err(e) = stream.write_all(&response.serialize()).await {
                debug!(peer = %peer, error = %e, "Write error");
                break;
            }

            if !keep_alive {
                break;
            }
        }

        let _ = stream.shutdown().await;
        debug!(peer = %peer, "Connection closed");
    }

    /// Read one request, keeping any pipelined bytes in `buf`.
    async fn read_request(
        stream: &mut TcpStream,
        buf: &mut BytesMut,
        config: &HttpHandlerConfig,
    ) -> ReadOutcome {
        let (mut request, body_offset) = loop {
            if !buf.is_empty() {
                match Request::parse(&buf[..]) {
                    Ok(parsed) => break parsed,
                    Err(HttpError::Incomplete) => {},
                    Err(e) => {
                        warn!(error = %e, "Failed to parse request");
                        return ReadOutcome::Reject(
                            Response::bad_request().text("bad request").build(),
                        );
                    },
                }
            }

            if buf.len() >= config.max_header_size {
                return ReadOutcome::Reject(
                    Response::builder()
                        .status(StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE)
                        .text("request header too large")
                        .build(),
                );
            }

            match Self::fill(stream, buf, config).await {
                Ok(true) => {},
                Ok(false) => return ReadOutcome::Closed,
                Err(e) => {
                    debug!(error = %e, "Read error");
                    return ReadOutcome::Closed;
                },
            }
        };

        if request
            .header("transfer-encoding")
            .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"))
        {
            return ReadOutcome::Reject(
                Response::builder()
                    .status(StatusCode::LENGTH_REQUIRED)
                    .text("chunked request bodies are not supported")
                    .build(),
            );
        }

        let body_len = match (request.header("content-length"), request.content_length()) {
            (None, _) => 0,
            (Some(_), Some(len)) => len,
            (Some(value), None) => {
                warn!(content_length = %value, "Invalid Content-Length");
                return ReadOutcome::Reject(
                    Response::bad_request().text("invalid content-length").build(),
                );
            },
        };
        if body_len > config.max_body_size {
            let err = HttpError::RequestTooLarge {
                size: body_len,
                max: config.max_body_size,
            };
            debug!(error = %err, "Rejecting request body");
            return ReadOutcome::Reject(Response::payload_too_large().text(err.to_string()).build());
        }

        while buf.len() < body_offset + body_len {
            match Self::fill(stream, buf, config).await {
                Ok(true) => {},
                Ok(false) | Err(_) => {
                    debug!("Connection closed mid-body");
                    return ReadOutcome::Closed;
                },
            }
        }

        buf.advance(body_offset);
        request.set_body(buf.split_to(body_len).freeze());
        ReadOutcome::Request(request)
    }

    /// Read more bytes. `Ok(false)` on EOF or idle timeout.
    async fn fill(
        stream: &mut TcpStream,
        buf: &mut BytesMut,
        config: &HttpHandlerConfig,
    ) -> std::io::Result<bool> {
        match tokio::time::timeout(config.idle_timeout(), stream.read_buf(buf)).await {
            Ok(Ok(0)) => Ok(false),
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_) => {
                debug!("Read timeout");
                Ok(false)
            },
        }
    }
}

/// HTTP/1.1 defaults to keep-alive, HTTP/1.0 to close.
fn is_keep_alive(request: &Request) -> bool {
    let connection = request.header("connection").map(str::to_ascii_lowercase);
    match request.version() {
        Version::HTTP_10 => connection.as_deref() == Some("keep-alive"),
        _ => connection.as_deref() != Some("close"),
    }
}

/// Wait for Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
