//! Transport contract
//!
//! The engines treat the network as an external collaborator: anything that
//! can turn a [`TransportRequest`] into a [`TransportResponse`] (or a
//! failure) plugs in here. No HTTP stack is linked by this crate.

use futures::future::BoxFuture;

use super::request::TransportRequest;
use super::response::TransportResponse;
use crate::error::Error;

/// Performs an actual request on behalf of the engines.
///
/// Implementations should honor `request.cancel` by aborting the underlying
/// call when the handle is raised; the engines additionally race the call
/// against the handle, so a transport that ignores it still cancels
/// correctly, just without freeing the connection early.
pub trait Transport: Send + Sync + 'static {
    /// Perform the request, resolving with the complete response or a failure.
    ///
    /// Non-success statuses are returned as `Ok` responses; classifying them
    /// is the engines' job.
    fn perform(&self, request: TransportRequest) -> BoxFuture<'static, Result<TransportResponse, Error>>;
}
