//! HTTP vocabulary and the transport boundary
//!
//! Request/response value types over the `http` crate's `Method`,
//! `StatusCode` and `HeaderMap`, the [`Transport`] trait the engines call
//! through, cancellation handles, and the permissive body codec.

pub mod body;
pub mod cancel;
pub mod request;
pub mod response;
pub mod transport;

pub use body::{merge_json_content_type, read_json_body, write_json_body};
pub use cancel::CancelHandle;
pub use request::TransportRequest;
pub use response::TransportResponse;
pub use transport::Transport;
