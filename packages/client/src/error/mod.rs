//! Error normalization for the cache engines
//!
//! Every failure crossing an engine boundary is converted into [`Error`], a
//! single tagged shape carrying a [`Kind`], an optional message, optional
//! HTTP status fields and the original cause.

pub mod constructors;
pub mod types;

pub use constructors::{builder, cancelled, decode, normalize, status, transport};
pub use types::{Error, Kind, Result};
