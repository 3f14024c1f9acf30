//! # Cachet Public API
//!
//! Fluent client-side query cache: deduplicated reads with TTL and
//! stale-while-revalidate, and mutations with retry, lifecycle hooks and
//! related-key invalidation. The engine lives in the `cachet_client` crate;
//! this crate exposes the builder surface and the process-wide default
//! cache store.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use cachet::{Cachet, Transport};
//! use serde::Deserialize;
//!
//! #[derive(Clone, Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn example(transport: Arc<dyn Transport>) -> Result<(), cachet::Error> {
//! let user = Cachet::query("/users/1")
//!     .ttl(Duration::from_secs(5))
//!     .stale_while_revalidate(true)
//!     .transport(transport)
//!     .build::<User>()?;
//!
//! user.fetch().await;
//! if let Some(user) = user.data() {
//!     println!("{}", user.name);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

use std::sync::{Arc, OnceLock};

pub mod builder;

// Re-export the builder surface
pub use builder::{MutationBuilder, QueryBuilder};

// Re-export important types from the engine package
pub use cachet_client::{
    CacheEntry, CacheStats, CacheStatsSnapshot, CacheStore, CancelHandle, Error, HeaderMap,
    HeaderName, HeaderValue, HttpMutation, HttpQuery, Kind, Method, MutationHooks,
    MutationOperation, MutationOptions, MutationStatus, MutationTarget, QueryKey, QueryOptions,
    ResolvedKey, RetryDelay, RetryPolicy, StateCell, StatusCode, Transport, TransportRequest,
    TransportResponse,
};

/// Process-wide default cache store.
///
/// One cache per process is the default usage pattern; builders fall back to
/// this instance unless [`store`](QueryBuilder::store) overrides it with an
/// explicitly owned one.
static GLOBAL_STORE: OnceLock<Arc<CacheStore>> = OnceLock::new();

/// Get the process-wide default cache store.
///
/// Initialized on first use and shared by every builder that does not
/// provide its own store.
pub fn global_store() -> Arc<CacheStore> {
    GLOBAL_STORE
        .get_or_init(|| Arc::new(CacheStore::new()))
        .clone()
}

/// Main Cachet entry point providing static builder methods
pub struct Cachet;

impl Cachet {
    /// Start building a query for `key`.
    ///
    /// Shorthand for `QueryBuilder::new(key)`
    pub fn query(key: impl Into<QueryKey>) -> QueryBuilder {
        QueryBuilder::new(key)
    }

    /// Start building a mutation against `target`.
    ///
    /// Shorthand for `MutationBuilder::new(target)`
    pub fn mutation<V>(target: impl Into<MutationTarget<V>>) -> MutationBuilder<V> {
        MutationBuilder::new(target)
    }
}

/// Start building a query for `key`.
///
/// Shorthand for `Cachet::query(key)`
pub fn query(key: impl Into<QueryKey>) -> QueryBuilder {
    Cachet::query(key)
}

/// Start building a mutation against `target`.
///
/// Shorthand for `Cachet::mutation(target)`
pub fn mutation<V>(target: impl Into<MutationTarget<V>>) -> MutationBuilder<V> {
    Cachet::mutation(target)
}
