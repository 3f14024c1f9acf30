//! Query configuration

use std::time::Duration;

use http::{HeaderMap, Method};
use serde_json::Value;

/// Options for one query consumer.
///
/// `ttl` and `stale_while_revalidate` drive the expiry policy; the remaining
/// fields are passed through to the transport on every revalidation.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Freshness window for values fetched by this query
    pub ttl: Duration,
    /// Serve an expired value immediately and refresh behind it
    pub stale_while_revalidate: bool,
    /// HTTP method for revalidation requests
    pub method: Method,
    /// Extra request headers
    pub headers: HeaderMap,
    /// Request body as a JSON value; `Null` means no body
    pub body: Value,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            ttl: Duration::ZERO,
            stale_while_revalidate: false,
            method: Method::GET,
            headers: HeaderMap::new(),
            body: Value::Null,
        }
    }
}
