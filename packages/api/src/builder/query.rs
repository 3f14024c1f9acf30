//! Fluent query builder

use std::sync::Arc;
use std::time::Duration;

use cachet_client::error;
use cachet_client::{CacheStore, Error, HttpQuery, QueryKey, QueryOptions, Transport};
use http::{HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::global_store;

/// Builds an [`HttpQuery`] consumer.
///
/// The transport is required; the store defaults to the process-wide
/// instance. Invalid inputs (bad header names, unserializable bodies) are
/// remembered and surfaced by [`build`](QueryBuilder::build) so chaining
/// stays ergonomic.
pub struct QueryBuilder {
    key: QueryKey,
    options: QueryOptions,
    store: Option<Arc<CacheStore>>,
    transport: Option<Arc<dyn Transport>>,
    error: Option<Error>,
}

impl QueryBuilder {
    /// Start a builder for `key`.
    pub fn new(key: impl Into<QueryKey>) -> Self {
        Self {
            key: key.into(),
            options: QueryOptions::default(),
            store: None,
            transport: None,
            error: None,
        }
    }

    /// Freshness window for fetched values.
    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.options.ttl = ttl;
        self
    }

    /// Serve an expired value immediately and refresh behind it.
    #[must_use]
    pub fn stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.options.stale_while_revalidate = enabled;
        self
    }

    /// HTTP method for revalidation requests (default GET).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.options.method = method;
        self
    }

    /// Add one request header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            name.parse::<HeaderName>(),
            value.parse::<HeaderValue>(),
        ) {
            (Ok(name), Ok(value)) => {
                self.options.headers.insert(name, value);
            }
            _ => {
                self.error.get_or_insert_with(|| {
                    error::builder(format!("invalid header: {name}"))
                });
            }
        }
        self
    }

    /// Add several request headers.
    #[must_use]
    pub fn headers<'a>(mut self, headers: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, value) in headers {
            self = self.header(name, value);
        }
        self
    }

    /// JSON request body sent on every revalidation.
    #[must_use]
    pub fn body(mut self, body: impl Serialize) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.options.body = value,
            Err(e) => {
                self.error
                    .get_or_insert_with(|| error::builder("query body is not serializable").with(e));
            }
        }
        self
    }

    /// Use an explicitly owned cache store instead of the process default.
    #[must_use]
    pub fn store(mut self, store: Arc<CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Transport that performs the actual requests. Required.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Create the query consumer.
    ///
    /// Binds the consumer to the cache key: hydrates from an existing entry
    /// or seeds a new one, and takes one reference either way.
    pub fn build<T>(self) -> Result<HttpQuery<T>, Error>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if let Some(err) = self.error {
            return Err(err);
        }
        let transport = self
            .transport
            .ok_or_else(|| error::builder("query requires a transport"))?;
        let store = self.store.unwrap_or_else(global_store);

        tracing::debug!(
            target: "cachet::builder",
            ttl_ms = self.options.ttl.as_millis() as u64,
            stale_while_revalidate = self.options.stale_while_revalidate,
            "building query"
        );
        HttpQuery::new(store, transport, self.key, self.options)
    }
}
