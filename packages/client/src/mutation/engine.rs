//! Per-consumer mutation engine
//!
//! Executes a side-effecting operation with bounded retry, publishes
//! `data`/`error`/`status` cells, threads an optional context value through
//! the lifecycle hooks, and invalidates related query keys after a success.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::cache::{CacheStore, QueryKey};
use crate::error::{self, Error};
use crate::retry::RetryPolicy;
use crate::state::StateCell;

/// The side-effecting operation a mutation runs.
///
/// Invoked once per attempt; the variables are borrowed so the retry loop
/// can re-run it without cloning them.
pub type MutationOperation<T, V> =
    Arc<dyn Fn(&V) -> BoxFuture<'static, Result<T, Error>> + Send + Sync>;

/// Lifecycle position of a mutation consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

/// Lifecycle callbacks around a mutation.
///
/// `on_mutate` runs before the first attempt and may produce a context value
/// handed to every later hook. `on_finally` always receives both the
/// (possibly absent) result and the (possibly absent) error, whichever
/// branch executed.
pub struct MutationHooks<T, V, C> {
    pub on_mutate: Option<Box<dyn Fn(&V) -> C + Send + Sync>>,
    pub on_success: Option<Box<dyn Fn(&T, &V, Option<&C>) + Send + Sync>>,
    pub on_error: Option<Box<dyn Fn(&Error, &V, Option<&C>) + Send + Sync>>,
    pub on_finally: Option<Box<dyn Fn(Option<&T>, Option<&Error>, &V, Option<&C>) + Send + Sync>>,
}

impl<T, V, C> Default for MutationHooks<T, V, C> {
    fn default() -> Self {
        Self {
            on_mutate: None,
            on_success: None,
            on_error: None,
            on_finally: None,
        }
    }
}

/// Configuration for a mutation consumer.
pub struct MutationOptions<T, V, C> {
    pub hooks: MutationHooks<T, V, C>,
    /// Query keys whose cache entries are marked expired after a success
    pub invalidate_keys: Vec<QueryKey>,
    pub retry: RetryPolicy,
}

impl<T, V, C> Default for MutationOptions<T, V, C> {
    fn default() -> Self {
        Self {
            hooks: MutationHooks::default(),
            invalidate_keys: Vec::new(),
            retry: RetryPolicy::default(),
        }
    }
}

/// One consumer's handle onto a mutation.
///
/// State machine `idle -> pending -> (success | error)`, re-armed by
/// [`reset`](HttpMutation::reset) or simply by mutating again.
pub struct HttpMutation<T, V, C = ()> {
    store: Arc<CacheStore>,
    operation: MutationOperation<T, V>,
    options: MutationOptions<T, V, C>,
    data: StateCell<Option<T>>,
    error: StateCell<Option<Error>>,
    status: StateCell<MutationStatus>,
}

impl<T, V, C> HttpMutation<T, V, C>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a mutation consumer around `operation`.
    pub fn new(
        store: Arc<CacheStore>,
        operation: MutationOperation<T, V>,
        options: MutationOptions<T, V, C>,
    ) -> Self {
        Self {
            store,
            operation,
            options,
            data: StateCell::new(None),
            error: StateCell::new(None),
            status: StateCell::new(MutationStatus::Idle),
        }
    }

    /// Last successful result.
    pub fn data(&self) -> Option<T> {
        self.data.get()
    }

    /// Error from the last failed run, if any.
    pub fn error(&self) -> Option<Error> {
        self.error.get()
    }

    /// Current lifecycle position.
    pub fn status(&self) -> MutationStatus {
        self.status.get()
    }

    pub fn is_idle(&self) -> bool {
        self.status.get() == MutationStatus::Idle
    }

    pub fn is_pending(&self) -> bool {
        self.status.get() == MutationStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status.get() == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status.get() == MutationStatus::Error
    }

    /// Observable `data` cell.
    pub fn data_cell(&self) -> &StateCell<Option<T>> {
        &self.data
    }

    /// Observable `error` cell.
    pub fn error_cell(&self) -> &StateCell<Option<Error>> {
        &self.error
    }

    /// Observable `status` cell.
    pub fn status_cell(&self) -> &StateCell<MutationStatus> {
        &self.status
    }

    /// Run the mutation.
    ///
    /// Retries per the configured policy; retries are invisible to the
    /// caller except as elapsed time. On success the related query keys are
    /// invalidated before the success hook runs. The normalized error is
    /// both published to the `error` cell and returned, so callers can use
    /// direct error handling in addition to observing state.
    pub async fn mutate(&self, variables: V) -> Result<T, Error> {
        self.error.set(None);
        self.status.set(MutationStatus::Pending);

        let context = self.options.hooks.on_mutate.as_ref().map(|hook| hook(&variables));

        let mut attempt: u32 = 0;
        let outcome = loop {
            match (self.operation)(&variables).await {
                Ok(value) => break Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt <= self.options.retry.retries {
                        let delay = self.options.retry.delay_for(attempt);
                        tracing::debug!(
                            target: "cachet::mutation",
                            attempt = attempt,
                            delay_ms = delay.as_millis() as u64,
                            "mutation attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    break Err(err);
                }
            }
        };

        match outcome {
            Ok(value) => {
                self.data.set(Some(value.clone()));
                self.status.set(MutationStatus::Success);

                self.invalidate_related();

                if let Some(hook) = &self.options.hooks.on_success {
                    hook(&value, &variables, context.as_ref());
                }
                if let Some(hook) = &self.options.hooks.on_finally {
                    hook(Some(&value), None, &variables, context.as_ref());
                }
                Ok(value)
            }
            Err(raw) => {
                let err = error::normalize(raw, "mutation failed");
                self.error.set(Some(err.clone()));
                self.status.set(MutationStatus::Error);

                if let Some(hook) = &self.options.hooks.on_error {
                    hook(&err, &variables, context.as_ref());
                }
                if let Some(hook) = &self.options.hooks.on_finally {
                    hook(None, Some(&err), &variables, context.as_ref());
                }
                Err(err)
            }
        }
    }

    /// Return to `idle`, clearing `data` and `error` unconditionally.
    pub fn reset(&self) {
        self.data.set(None);
        self.error.set(None);
        self.status.set(MutationStatus::Idle);
    }

    /// Mark every configured related key expired, cancelling its in-flight
    /// fetch; cached data stays for stale-while-revalidate.
    fn invalidate_related(&self) {
        for key in &self.options.invalidate_keys {
            match key.resolve() {
                Ok(resolved) => {
                    self.store.invalidate(&resolved.cache_key);
                    tracing::debug!(
                        target: "cachet::mutation",
                        key = %resolved.cache_key,
                        "invalidated related query key"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        target: "cachet::mutation",
                        error = %e,
                        "skipping unresolvable invalidate key"
                    );
                }
            }
        }
    }
}
