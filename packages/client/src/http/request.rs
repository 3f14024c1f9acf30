//! Request shape handed to the transport
//!
//! The engines construct a [`TransportRequest`] per revalidation or mutation
//! attempt; HTTP semantics beyond the field names are passed through to the
//! transport opaquely.

use bytes::Bytes;
use http::{HeaderMap, Method};

use super::cancel::CancelHandle;

/// A fully constructed request for [`Transport::perform`](super::Transport::perform).
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Request target: URL or opaque path, exactly as the key resolver produced it
    pub target: String,
    /// HTTP method
    pub method: Method,
    /// Merged request headers
    pub headers: HeaderMap,
    /// Serialized request body, if any
    pub body: Option<Bytes>,
    /// Cancellation signal; the transport should abort the underlying call
    /// when this is raised
    pub cancel: CancelHandle,
}

impl TransportRequest {
    /// Create a request with no headers or body.
    pub fn new(target: impl Into<String>, method: Method) -> Self {
        Self {
            target: target.into(),
            method,
            headers: HeaderMap::new(),
            body: None,
            cancel: CancelHandle::new(),
        }
    }

    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }
}
