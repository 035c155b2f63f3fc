//! Per-request state carried through the filter chain.

use http::{Method, StatusCode};
use std::time::{Duration, Instant};

use crate::modules::http_handler::Request;

/// Header carrying the correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Position of a request in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPhase {
    /// Context built, no filter has run.
    Created,
    /// Pre-hooks are running.
    PreRun,
    /// The backend is handling the request.
    Dispatched,
    /// Post-hooks are running.
    PostRun,
    /// A response has been produced.
    Completed,
}

/// Mutable scratch state owned by one request's execution.
#[derive(Debug)]
pub struct RequestContext {
    request: Request,
    request_id: String,
    client_ip: String,
    subject: Option<String>,
    whitelisted: bool,
    status: Option<StatusCode>,
    phase: ChainPhase,
    started: Instant,
}

impl RequestContext {
    /// Create a context for a request from `client_ip`.
    ///
    /// An incoming `X-Request-ID` is kept, otherwise a new id is generated.
    #[must_use]
    pub fn new(request: Request, client_ip: impl Into<String>) -> Self {
        let request_id = request
            .header(REQUEST_ID_HEADER)
            .filter(|id| !id.is_empty())
            .map_or_else(generate_request_id, str::to_string);

        Self {
            request,
            request_id,
            client_ip: client_ip.into(),
            subject: None,
            whitelisted: false,
            status: None,
            phase: ChainPhase::Created,
            started: Instant::now(),
        }
    }

    /// Get the request.
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Get the request mutably.
    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Get the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Get the request path.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request.path()
    }

    /// Get a request header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    /// Get the correlation id.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Get the resolved client address.
    #[must_use]
    pub fn client_ip(&self) -> &str {
        &self.client_ip
    }

    /// Get the authenticated subject.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Attach the authenticated subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.subject = Some(subject.into());
    }

    /// Check if the path was admitted by the whitelist.
    #[must_use]
    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted
    }

    /// Mark the path as whitelisted.
    pub fn set_whitelisted(&mut self, whitelisted: bool) {
        self.whitelisted = whitelisted;
    }

    /// Get the outgoing status, once known.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Record the outgoing status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    /// Get the chain phase.
    #[must_use]
    pub fn phase(&self) -> ChainPhase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: ChainPhase) {
        self.phase = phase;
    }

    /// Time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Generate a correlation id.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let random: u32 = rand::random();
    format!("{timestamp:x}-{random:08x}")
}
