//! Query key resolution
//!
//! A query is identified either by a plain target string or by a structured
//! tuple whose first element is the target and whose remaining elements
//! discriminate variants of it (user id, page, filters). The full tuple
//! serializes into the cache key so that structurally equal tuples always
//! dedupe to the same slot.

use serde_json::Value;

use crate::error::{self, Error};

/// Logical identifier of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryKey {
    /// Plain target, used directly as both cache key and request target
    Target(String),
    /// `[target, ...discriminators]` tuple; the serialized whole becomes the
    /// cache key
    Tuple(Vec<Value>),
}

/// Output of [`QueryKey::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Stable cache slot identifier
    pub cache_key: String,
    /// Effective request target
    pub target: String,
}

impl QueryKey {
    /// Normalize this key into a cache slot identifier and a request target.
    ///
    /// Tuple serialization is deterministic: `serde_json` keeps object keys
    /// in sorted order, so two structurally equal tuples produce byte-equal
    /// cache keys no matter how their maps were built.
    pub fn resolve(&self) -> Result<ResolvedKey, Error> {
        match self {
            QueryKey::Target(target) => Ok(ResolvedKey {
                cache_key: target.clone(),
                target: target.clone(),
            }),
            QueryKey::Tuple(parts) => {
                let target = parts
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        error::builder("query key tuple must start with a string target")
                    })?
                    .to_owned();
                let cache_key = serde_json::to_string(parts)
                    .map_err(|e| error::builder("query key tuple is not serializable").with(e))?;
                Ok(ResolvedKey { cache_key, target })
            }
        }
    }
}

impl From<&str> for QueryKey {
    fn from(target: &str) -> Self {
        QueryKey::Target(target.to_owned())
    }
}

impl From<String> for QueryKey {
    fn from(target: String) -> Self {
        QueryKey::Target(target)
    }
}

impl From<Vec<Value>> for QueryKey {
    fn from(parts: Vec<Value>) -> Self {
        QueryKey::Tuple(parts)
    }
}
