//! HTTP-flavored mutation operations
//!
//! Builds a [`MutationOperation`] out of a transport plus request shape: the
//! target is a fixed string or computed from the variables, the variables
//! serialize into a JSON body, non-success statuses become status errors and
//! the body is read permissively before the typed decode.

use std::sync::Arc;

use futures::FutureExt;
use http::{HeaderMap, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::engine::MutationOperation;
use crate::error;
use crate::http::{
    Transport, TransportRequest, merge_json_content_type, read_json_body, write_json_body,
};

/// Where a mutation request goes: a fixed target, or one computed from the
/// variables (for targets like `/users/{id}`).
#[derive(Clone)]
pub enum MutationTarget<V> {
    Url(String),
    Resolver(Arc<dyn Fn(&V) -> String + Send + Sync>),
}

impl<V> MutationTarget<V> {
    /// Target computed from the mutation variables.
    pub fn resolver(resolve: impl Fn(&V) -> String + Send + Sync + 'static) -> Self {
        MutationTarget::Resolver(Arc::new(resolve))
    }

    fn resolve(&self, variables: &V) -> String {
        match self {
            MutationTarget::Url(url) => url.clone(),
            MutationTarget::Resolver(resolve) => resolve(variables),
        }
    }
}

impl<V> From<&str> for MutationTarget<V> {
    fn from(url: &str) -> Self {
        MutationTarget::Url(url.to_owned())
    }
}

impl<V> From<String> for MutationTarget<V> {
    fn from(url: String) -> Self {
        MutationTarget::Url(url)
    }
}

/// Build the transport-backed operation used by HTTP mutations.
///
/// The variables serialize to JSON (`()` and `Null` mean no body); a JSON
/// body gets `content-type: application/json` unless the caller set one.
pub fn http_operation<T, V>(
    transport: Arc<dyn Transport>,
    target: MutationTarget<V>,
    method: Method,
    headers: HeaderMap,
) -> MutationOperation<T, V>
where
    T: DeserializeOwned + Send + 'static,
    V: Serialize + 'static,
{
    Arc::new(move |variables: &V| {
        let target = target.resolve(variables);
        let body_value = serde_json::to_value(variables).map_err(error::decode);
        let transport = Arc::clone(&transport);
        let method = method.clone();
        let mut headers = headers.clone();

        async move {
            let body = write_json_body(&body_value?)?;
            if body.is_some() {
                merge_json_content_type(&mut headers);
            }

            let mut request = TransportRequest::new(target, method).with_headers(headers);
            if let Some(body) = body {
                request = request.with_body(body);
            }

            let response = transport.perform(request).await?;
            if !response.is_success() {
                return Err(error::status(response.status, response.status_text));
            }

            let value = read_json_body(&response.body);
            serde_json::from_value::<T>(value).map_err(error::decode)
        }
        .boxed()
    })
}
