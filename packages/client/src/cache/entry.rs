//! Cache entry record
//!
//! One [`CacheEntry`] per cache key: the last fetched value, its freshness
//! window, the shared in-flight revalidation (if one is running), the
//! cancellation handle for that work, and the consumer reference count.

use std::fmt;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use tokio::time::Instant;
use serde_json::Value;

use crate::error::Error;
use crate::http::CancelHandle;

/// Shared handle to an in-flight revalidation.
///
/// Every concurrent fetch for the same key awaits one clone of this future,
/// which is what makes duplicate requests coalesce into a single transport
/// call.
pub type InFlight = Shared<BoxFuture<'static, Result<Value, Error>>>;

/// A single cache slot.
///
/// Writes always replace the whole record; callers carry forward the fields
/// they want preserved (notably `ref_count`).
#[derive(Clone)]
pub struct CacheEntry {
    /// Last successfully fetched value, `None` if never fetched
    pub data: Option<Value>,
    /// Time of the last successful write; `None` is the expired sentinel and
    /// always reads as expired regardless of `ttl`
    pub timestamp: Option<Instant>,
    /// Freshness window, copied from the request options at write time
    pub ttl: Duration,
    /// In-flight revalidation; at most one per key at any instant
    pub in_flight: Option<InFlight>,
    /// Lets a newer request or an eviction cancel the in-flight work
    pub cancel: Option<CancelHandle>,
    /// Count of live consumers currently holding this key
    pub ref_count: u32,
}

impl CacheEntry {
    /// Seed entry for a consumer that bound a key nobody has fetched yet:
    /// no data, expired sentinel, one reference.
    pub fn seed(ttl: Duration) -> Self {
        Self {
            data: None,
            timestamp: None,
            ttl,
            in_flight: None,
            cancel: None,
            ref_count: 1,
        }
    }

    /// Whether the entry's value is older than its freshness window.
    ///
    /// The sentinel timestamp always reads as expired.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self.timestamp {
            Some(written) => now.duration_since(written) > self.ttl,
            None => true,
        }
    }

    /// Raise the entry's cancellation handle, if in-flight work exists.
    pub fn cancel_in_flight(&self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("data", &self.data)
            .field("timestamp", &self.timestamp)
            .field("ttl", &self.ttl)
            .field("in_flight", &self.in_flight.is_some())
            .field("ref_count", &self.ref_count)
            .finish()
    }
}
