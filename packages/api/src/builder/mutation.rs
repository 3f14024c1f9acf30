//! Fluent mutation builder

use std::sync::Arc;
use std::time::Duration;

use cachet_client::error;
use cachet_client::mutation::http_operation;
use cachet_client::{
    CacheStore, Error, HttpMutation, MutationHooks, MutationOptions, MutationTarget, QueryKey,
    RetryDelay, RetryPolicy, Transport,
};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::global_store;

/// Builds an [`HttpMutation`] consumer over the HTTP-flavored operation.
///
/// `V` is the variables type the mutation is called with; the result type is
/// chosen at [`build`](MutationBuilder::build). Hooks at this level are the
/// simple no-argument/error-only callbacks; the full-signature hooks live on
/// the engine's [`MutationOptions`] for callers that need the variables and
/// context threaded through.
pub struct MutationBuilder<V> {
    target: MutationTarget<V>,
    method: Method,
    headers: HeaderMap,
    invalidate_keys: Vec<QueryKey>,
    retry: RetryPolicy,
    on_success: Option<Box<dyn Fn() + Send + Sync>>,
    on_error: Option<Box<dyn Fn(&Error) + Send + Sync>>,
    on_finally: Option<Box<dyn Fn() + Send + Sync>>,
    store: Option<Arc<CacheStore>>,
    transport: Option<Arc<dyn Transport>>,
    error: Option<Error>,
}

impl<V> MutationBuilder<V> {
    /// Start a builder for `target` (a fixed string or a function of the
    /// variables).
    pub fn new(target: impl Into<MutationTarget<V>>) -> Self {
        Self {
            target: target.into(),
            method: Method::POST,
            headers: HeaderMap::new(),
            invalidate_keys: Vec::new(),
            retry: RetryPolicy::default(),
            on_success: None,
            on_error: None,
            on_finally: None,
            store: None,
            transport: None,
            error: None,
        }
    }

    /// HTTP method (default POST).
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Add one request header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                self.error
                    .get_or_insert_with(|| error::builder(format!("invalid header: {name}")));
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

    /// Number of retries after the initial attempt (default 0).
    #[must_use]
    pub fn retry(mut self, retries: u32) -> Self {
        self.retry.retries = retries;
        self
    }

    /// Constant delay between attempts (default 1 second).
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = RetryDelay::Fixed(delay);
        self
    }

    /// Delay computed from the attempt number (1 for the first retry).
    #[must_use]
    pub fn retry_delay_with(
        mut self,
        delay: impl Fn(u32) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.retry.delay = RetryDelay::Backoff(Arc::new(delay));
        self
    }

    /// Mark one related query key expired after a successful mutation.
    #[must_use]
    pub fn invalidate_key(mut self, key: impl Into<QueryKey>) -> Self {
        self.invalidate_keys.push(key.into());
        self
    }

    /// Mark several related query keys expired after a successful mutation.
    #[must_use]
    pub fn invalidate_keys(mut self, keys: impl IntoIterator<Item = QueryKey>) -> Self {
        self.invalidate_keys.extend(keys);
        self
    }

    /// Called after a successful mutation, after related keys invalidate.
    #[must_use]
    pub fn on_success(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    /// Called with the normalized error once retries are exhausted.
    #[must_use]
    pub fn on_error(mut self, hook: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Called on every outcome, after the success or error hook.
    #[must_use]
    pub fn on_finally(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_finally = Some(Box::new(hook));
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
}

impl<V> MutationBuilder<V>
where
    V: Serialize + 'static,
{
    /// Create the mutation consumer with result type `T`.
    pub fn build<T>(self) -> Result<HttpMutation<T, V>, Error>
    where
        T: DeserializeOwned + Clone + Send + Sync + 'static,
    {
        if let Some(err) = self.error {
            return Err(err);
        }
        let transport = self
            .transport
            .ok_or_else(|| error::builder("mutation requires a transport"))?;
        let store = self.store.unwrap_or_else(global_store);

        tracing::debug!(
            target: "cachet::builder",
            method = %self.method,
            retries = self.retry.retries,
            invalidate_keys = self.invalidate_keys.len(),
            "building mutation"
        );
        let operation = http_operation::<T, V>(transport, self.target, self.method, self.headers);

        let hooks = MutationHooks {
            on_mutate: None,
            on_success: self.on_success.map(|hook| {
                Box::new(move |_: &T, _: &V, _: Option<&()>| hook())
                    as Box<dyn Fn(&T, &V, Option<&()>) + Send + Sync>
            }),
            on_error: self.on_error.map(|hook| {
                Box::new(move |err: &Error, _: &V, _: Option<&()>| hook(err))
                    as Box<dyn Fn(&Error, &V, Option<&()>) + Send + Sync>
            }),
            on_finally: self.on_finally.map(|hook| {
                Box::new(move |_: Option<&T>, _: Option<&Error>, _: &V, _: Option<&()>| hook())
                    as Box<dyn Fn(Option<&T>, Option<&Error>, &V, Option<&()>) + Send + Sync>
            }),
        };

        Ok(HttpMutation::new(
            store,
            operation,
            MutationOptions {
                hooks,
                invalidate_keys: self.invalidate_keys,
                retry: self.retry,
            },
        ))
    }
}
