//! Per-consumer query engine
//!
//! Each [`HttpQuery`] owns one consumer's view of a cache key: the
//! `data`/`loading`/`error` cells, the fetch state machine (fresh serve,
//! stale-while-revalidate, in-flight coalescing, forced supersession), and
//! the refcount lifecycle that reclaims the entry when the last consumer is
//! gone.

use std::sync::Arc;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::cache::{CacheEntry, CacheStore, InFlight, QueryKey, ResolvedKey};
use crate::error::{self, Error};
use crate::http::{
    CancelHandle, Transport, TransportRequest, merge_json_content_type, read_json_body,
    write_json_body,
};
use crate::state::StateCell;

use super::options::QueryOptions;

/// One consumer's handle onto a cached query.
///
/// Created through the query factory; dropping it (or calling
/// [`dispose`](HttpQuery::dispose)) releases the consumer's reference and
/// may evict the cache entry.
pub struct HttpQuery<T> {
    store: Arc<CacheStore>,
    transport: Arc<dyn Transport>,
    key: ResolvedKey,
    options: QueryOptions,
    data: StateCell<Option<T>>,
    loading: StateCell<bool>,
    error: StateCell<Option<Error>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for HttpQuery<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQuery")
            .field("store", &self.store)
            .field("transport", &format_args!("<dyn Transport>"))
            .field("key", &self.key)
            .field("options", &self.options)
            .field("data", &self.data)
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish()
    }
}

impl<T> HttpQuery<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Bind a consumer to `key`.
    ///
    /// If the key is already cached the consumer joins it: the reference
    /// count goes up and `data` hydrates from the cached value with no
    /// network round trip. Otherwise a seed entry (no data, already expired)
    /// is written so this consumer is counted from the start.
    pub fn new(
        store: Arc<CacheStore>,
        transport: Arc<dyn Transport>,
        key: QueryKey,
        options: QueryOptions,
    ) -> Result<Self, Error> {
        let key = key.resolve()?;
        let query = Self {
            store,
            transport,
            key,
            options,
            data: StateCell::new(None),
            loading: StateCell::new(false),
            error: StateCell::new(None),
        };

        match query.store.get(&query.key.cache_key) {
            Some(entry) => {
                query.store.increment_ref(&query.key.cache_key);
                if let Some(value) = &entry.data {
                    query.publish_value(value);
                }
            }
            None => {
                query
                    .store
                    .set(&query.key.cache_key, CacheEntry::seed(query.options.ttl));
            }
        }

        Ok(query)
    }

    /// Resolved cache key this consumer is bound to.
    pub fn cache_key(&self) -> &str {
        &self.key.cache_key
    }

    /// Effective request target.
    pub fn target(&self) -> &str {
        &self.key.target
    }

    /// Current data value.
    pub fn data(&self) -> Option<T> {
        self.data.get()
    }

    /// Whether a revalidation started by this consumer is running.
    pub fn loading(&self) -> bool {
        self.loading.get()
    }

    /// Last published error, if any.
    pub fn error(&self) -> Option<Error> {
        self.error.get()
    }

    /// Observable `data` cell.
    pub fn data_cell(&self) -> &StateCell<Option<T>> {
        &self.data
    }

    /// Observable `loading` cell.
    pub fn loading_cell(&self) -> &StateCell<bool> {
        &self.loading
    }

    /// Observable `error` cell.
    pub fn error_cell(&self) -> &StateCell<Option<Error>> {
        &self.error
    }

    /// Fetch through the cache.
    ///
    /// Serves fresh data without a network call, joins an in-flight request
    /// for the same key, applies stale-while-revalidate when configured, and
    /// revalidates otherwise. Failures land in the `error` cell; this method
    /// never returns one.
    pub async fn fetch(&self) {
        self.fetch_inner(false).await;
    }

    /// Fetch bypassing freshness checks.
    ///
    /// Cancels any outstanding request for the key, waits for its silent
    /// settle, then revalidates unconditionally.
    pub async fn fetch_force(&self) {
        self.fetch_inner(true).await;
    }

    async fn fetch_inner(&self, force: bool) {
        let entry = self.store.get(&self.key.cache_key);

        if let Some(entry) = entry {
            if let Some(in_flight) = entry.in_flight.clone() {
                if !force {
                    tracing::debug!(
                        target: "cachet::query",
                        key = %self.key.cache_key,
                        "joining in-flight request"
                    );
                    let outcome = in_flight.await;
                    self.publish_outcome(&outcome);
                    return;
                }

                // Supersede: cancel the outstanding request and wait for its
                // silent settle so only one revalidation per key exists.
                tracing::debug!(
                    target: "cachet::query",
                    key = %self.key.cache_key,
                    "forced fetch superseding in-flight request"
                );
                entry.cancel_in_flight();
                let _ = in_flight.await;
            } else if !force {
                if !entry.is_expired(Instant::now()) {
                    if let Some(value) = &entry.data {
                        tracing::debug!(
                            target: "cachet::query",
                            key = %self.key.cache_key,
                            "serving fresh cached value"
                        );
                        self.publish_value(value);
                        return;
                    }
                } else if self.options.stale_while_revalidate {
                    if let Some(value) = &entry.data {
                        // Stale value first, synchronously; the refresh runs
                        // behind it and the await below reflects its outcome.
                        tracing::debug!(
                            target: "cachet::query",
                            key = %self.key.cache_key,
                            "serving stale value, revalidating"
                        );
                        self.publish_value(value);
                    }
                }
            }
        }

        self.revalidate().await;
    }

    /// Start a revalidation for this key and wait for it to settle.
    ///
    /// The placeholder entry (with the shared in-flight future and the
    /// cancellation handle) is written before the spawned task may touch the
    /// transport, so every concurrent fetch coalesces onto it.
    pub async fn revalidate(&self) {
        self.loading.set(true);
        self.error.set(None);

        let cancel = CancelHandle::new();
        let (prior_data, prior_timestamp, ref_count) = match self.store.get(&self.key.cache_key) {
            Some(entry) => (entry.data, entry.timestamp, entry.ref_count),
            None => (None, None, 0),
        };

        let task = RevalidationTask {
            store: Arc::clone(&self.store),
            transport: Arc::clone(&self.transport),
            key: self.key.clone(),
            options: self.options.clone(),
            cancel: cancel.clone(),
            data: self.data.clone(),
            loading: self.loading.clone(),
            error: self.error.clone(),
        };

        // Gate the task on a oneshot until the placeholder is in the store;
        // without it the task could finish before the in-flight future is
        // visible to anyone.
        let (release, released) = oneshot::channel();
        let in_flight = share_join(tokio::spawn(task.run(released)));

        self.store.set(
            &self.key.cache_key,
            CacheEntry {
                data: prior_data,
                timestamp: prior_timestamp,
                ttl: self.options.ttl,
                in_flight: Some(in_flight.clone()),
                cancel: Some(cancel),
                ref_count,
            },
        );
        let _ = release.send(());

        // The task publishes to this consumer's cells; awaiting here only
        // ties fetch completion to the revalidation outcome.
        let _ = in_flight.await;
    }

    /// Mark this key expired without dropping its cached data.
    ///
    /// Cancels in-flight work; the next fetch revalidates regardless of TTL,
    /// and stale-while-revalidate can still serve the preserved value.
    pub fn invalidate(&self) {
        self.store.invalidate(&self.key.cache_key);
    }

    /// Release this consumer's reference explicitly.
    ///
    /// Equivalent to dropping the handle; the entry is evicted once the last
    /// consumer releases it.
    pub fn dispose(self) {
        drop(self);
    }

    fn publish_value(&self, value: &Value) {
        match serde_json::from_value::<T>(value.clone()) {
            Ok(typed) => {
                self.data.set(Some(typed));
                self.error.set(None);
            }
            Err(e) => {
                self.error.set(Some(error::decode(e)));
            }
        }
    }

    fn publish_outcome(&self, outcome: &Result<Value, Error>) {
        match outcome {
            Ok(value) => self.publish_value(value),
            // A superseded request resolves quietly; a newer request owns
            // this consumer's state now.
            Err(e) if e.is_cancelled() => {}
            Err(e) => self.error.set(Some(e.clone())),
        }
        self.loading.set(false);
    }
}

impl<T> Drop for HttpQuery<T> {
    fn drop(&mut self) {
        self.store.decrement_ref(&self.key.cache_key);
    }
}

/// Wrap a spawned revalidation into the shareable in-flight future.
fn share_join(handle: JoinHandle<Result<Value, Error>>) -> InFlight {
    async move {
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(error::normalize(join_error, "revalidation task failed")),
        }
    }
    .boxed()
    .shared()
}

/// The spawned half of a revalidation: transport call, final cache write and
/// cell publishing for the consumer that initiated it.
struct RevalidationTask<T> {
    store: Arc<CacheStore>,
    transport: Arc<dyn Transport>,
    key: ResolvedKey,
    options: QueryOptions,
    cancel: CancelHandle,
    data: StateCell<Option<T>>,
    loading: StateCell<bool>,
    error: StateCell<Option<Error>>,
}

impl<T> RevalidationTask<T>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn run(self, released: oneshot::Receiver<()>) -> Result<Value, Error> {
        // Wait until the placeholder entry is visible.
        let _ = released.await;

        let outcome = self.perform().await;

        match &outcome {
            Ok(value) => {
                // Consumers may have come and gone while the request was in
                // flight; the refcount is re-read at completion.
                let ref_count = self
                    .store
                    .get(&self.key.cache_key)
                    .map_or(0, |entry| entry.ref_count);
                self.store.set(
                    &self.key.cache_key,
                    CacheEntry {
                        data: Some(value.clone()),
                        timestamp: Some(Instant::now()),
                        ttl: self.options.ttl,
                        in_flight: None,
                        cancel: None,
                        ref_count,
                    },
                );
            }
            Err(e) if e.is_cancelled() => {
                // Superseded or evicted: the newer owner already replaced or
                // removed the entry. Touch nothing.
            }
            Err(e) => {
                tracing::debug!(
                    target: "cachet::query",
                    key = %self.key.cache_key,
                    error = %e,
                    "revalidation failed"
                );
                // Keep the stale value; only the in-flight marker comes off.
                if let Some(entry) = self.store.get(&self.key.cache_key) {
                    self.store.set(
                        &self.key.cache_key,
                        CacheEntry {
                            in_flight: None,
                            cancel: None,
                            ..entry
                        },
                    );
                }
            }
        }

        self.publish(&outcome);
        outcome
    }

    async fn perform(&self) -> Result<Value, Error> {
        let mut headers = self.options.headers.clone();
        let body = write_json_body(&self.options.body)?;
        if body.is_some() {
            merge_json_content_type(&mut headers);
        }

        let mut request = TransportRequest::new(&self.key.target, self.options.method.clone())
            .with_headers(headers)
            .with_cancel(self.cancel.clone());
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = tokio::select! {
            _ = self.cancel.cancelled() => return Err(error::cancelled()),
            result = self.transport.perform(request) => result?,
        };

        // The handle may have been raised in the same tick the transport
        // settled; the silent branch still wins.
        if self.cancel.is_cancelled() {
            return Err(error::cancelled());
        }

        if !response.is_success() {
            return Err(error::status(response.status, response.status_text));
        }

        Ok(read_json_body(&response.body))
    }

    fn publish(&self, outcome: &Result<Value, Error>) {
        match outcome {
            Ok(value) => match serde_json::from_value::<T>(value.clone()) {
                Ok(typed) => {
                    self.data.set(Some(typed));
                    self.error.set(None);
                }
                Err(e) => {
                    self.error.set(Some(error::decode(e)));
                }
            },
            Err(e) if e.is_cancelled() => {}
            Err(e) => self.error.set(Some(e.clone())),
        }
        self.loading.set(false);
    }
}
