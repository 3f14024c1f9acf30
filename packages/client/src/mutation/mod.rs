//! Mutation engine: side-effecting requests with retry and invalidation
//!
//! The per-consumer write path. Runs an operation with bounded retry,
//! publishes status cells, threads a context value through the lifecycle
//! hooks and marks related query keys expired after a success.

pub mod engine;
pub mod http;

pub use engine::{
    HttpMutation, MutationHooks, MutationOperation, MutationOptions, MutationStatus,
};
pub use http::{MutationTarget, http_operation};
