//! # Cachet Engine
//!
//! Client-side request cache and deduplication engine. Sits between
//! application code and a network transport: serves fresh data from memory
//! per logical request key, coalesces duplicate concurrent requests onto one
//! transport call, applies TTL-based staleness with an optional
//! stale-while-revalidate policy, and reference-counts consumers so entries
//! are reclaimed when nobody needs them. Mutations run through a separate
//! engine with lifecycle hooks, bounded retry and related-key invalidation.
//!
//! ## Design
//!
//! - **One shared resource**: the [`CacheStore`] table. Engines mutate it
//!   only through its operations, each atomic from the caller's view.
//! - **One in-flight request per key**: revalidations register a shared
//!   future in the entry; concurrent fetches await it instead of hitting the
//!   transport again. A forced fetch cancels the outstanding request first.
//! - **Cancellation is silent**: a superseded or evicted request resolves
//!   through the cancelled branch and never publishes an error.
//! - **Transport is a collaborator**: anything implementing [`Transport`]
//!   plugs in; this crate links no HTTP stack.

#![deny(unsafe_code)]
#![warn(clippy::all)]

// Core modules
pub mod cache;
pub mod error;
pub mod http;
pub mod mutation;
pub mod query;
pub mod retry;
pub mod state;

// Prelude with canonical types
pub mod prelude;

// Essential public API - only what end users actually need
pub use crate::prelude::*;
