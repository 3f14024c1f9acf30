//! Keyed entry table with reference counting
//!
//! The [`CacheStore`] is the only shared mutable resource in the system.
//! Higher-level engines never touch the underlying table directly; every
//! mutation goes through the operations here, each of which is atomic from
//! the caller's perspective.

use dashmap::DashMap;

use super::entry::CacheEntry;
use super::stats::CacheStats;

/// Process-wide table of cache entries, `cache key -> entry`.
///
/// Owned explicitly and injected into the query/mutation factories; the api
/// crate keeps a default instance for the one-cache-per-process usage
/// pattern. Entries live until an explicit [`remove`](CacheStore::remove),
/// [`clear`](CacheStore::clear), or a refcount-driven eviction.
#[derive(Debug, Default)]
pub struct CacheStore {
    entries: DashMap<String, CacheEntry>,
    stats: CacheStats,
}

impl CacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry, returning a cloned snapshot.
    ///
    /// Pure lookup: entry state is never modified, only the diagnostic
    /// hit/miss counters move.
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Replace the full entry record for `key`.
    ///
    /// Callers carry forward fields they want preserved (notably
    /// `ref_count`); the store does not merge.
    pub fn set(&self, key: &str, entry: CacheEntry) {
        tracing::trace!(
            target: "cachet::cache",
            key = key,
            has_data = entry.data.is_some(),
            in_flight = entry.in_flight.is_some(),
            ref_count = entry.ref_count,
            "cache entry written"
        );
        self.entries.insert(key.to_owned(), entry);
    }

    /// Remove the entry, cancelling any in-flight work attached to it.
    pub fn remove(&self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some((_, entry)) => {
                entry.cancel_in_flight();
                tracing::debug!(target: "cachet::cache", key = key, "cache entry removed");
                true
            }
            None => false,
        }
    }

    /// Cancel all in-flight work and empty the table.
    pub fn clear(&self) {
        for entry in self.entries.iter() {
            entry.value().cancel_in_flight();
        }
        self.entries.clear();
        tracing::debug!(target: "cachet::cache", "cache cleared");
    }

    /// Mark the entry expired in place, cancelling in-flight work but
    /// preserving cached data.
    ///
    /// The preserved data is what lets a later fetch still serve
    /// stale-while-revalidate. Returns `false` if the key is absent.
    pub fn invalidate(&self, key: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.cancel_in_flight();
                entry.in_flight = None;
                entry.cancel = None;
                entry.timestamp = None;
                tracing::debug!(target: "cachet::cache", key = key, "cache entry invalidated");
                true
            }
            None => false,
        }
    }

    /// Record one more live consumer for `key`. No-op if the key is absent.
    pub fn increment_ref(&self, key: &str) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.ref_count += 1;
        }
    }

    /// Record one fewer live consumer for `key`, evicting the entry when the
    /// count reaches zero.
    ///
    /// Eviction cancels in-flight work via [`remove`](CacheStore::remove).
    /// Returns `true` only when the entry was evicted; absent keys are
    /// no-ops.
    pub fn decrement_ref(&self, key: &str) -> bool {
        let evict = match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.ref_count = entry.ref_count.saturating_sub(1);
                entry.ref_count == 0
            }
            None => return false,
        };

        if evict {
            self.remove(key);
            self.stats.record_eviction();
            tracing::debug!(target: "cachet::cache", key = key, "cache entry evicted, no consumers left");
        }
        evict
    }

    /// All keys currently in the table.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether an entry exists for `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Diagnostic hit/miss/eviction counters.
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
