//! Retry support for the mutation engine

pub mod policy;

pub use policy::{RetryDelay, RetryPolicy};
