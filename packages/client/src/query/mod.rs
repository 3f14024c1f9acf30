//! Query engine: cached reads with deduplication and revalidation
//!
//! The per-consumer read path. Serves fresh values from the cache, coalesces
//! concurrent fetches for the same key onto one transport call, applies
//! TTL-based expiry with optional stale-while-revalidate, and supersedes
//! in-flight work on forced fetches.

pub mod engine;
pub mod options;

pub use engine::HttpQuery;
pub use options::QueryOptions;
