//! Response shape returned by the transport

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

/// A complete response as delivered by the transport.
///
/// Bodies are fully materialized; the engines never stream.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Status text from the wire, when the transport preserves one
    pub status_text: Option<String>,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body bytes, possibly empty
    pub body: Bytes,
}

impl TransportResponse {
    /// Create a response with empty headers and body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().map(str::to_owned),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    #[must_use]
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    /// True for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
