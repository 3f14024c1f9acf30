//! Cachet engine prelude
//!
//! This module contains the essential types that end users need for cached
//! queries and mutations. Only canonical types that are part of the public
//! API belong here.

// The shared cache store and its records
pub use crate::cache::{CacheEntry, CacheStats, CacheStatsSnapshot, CacheStore, QueryKey, ResolvedKey};

// Error types
pub use crate::error::{Error, Kind, Result};

// Query and mutation consumers
pub use crate::mutation::{
    HttpMutation, MutationHooks, MutationOperation, MutationOptions, MutationStatus,
    MutationTarget,
};
pub use crate::query::{HttpQuery, QueryOptions};

// Retry configuration
pub use crate::retry::{RetryDelay, RetryPolicy};

// Transport boundary
pub use crate::http::{CancelHandle, Transport, TransportRequest, TransportResponse};

// Observable state cells
pub use crate::state::StateCell;

// HTTP standard types from http crate
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
