//! Body serialization and permissive interpretation
//!
//! The read side is deliberately lenient: an empty body is an empty value and
//! a malformed non-empty body is surfaced as raw text rather than a failure.
//! Typed decoding happens later, at the engine edge.

use bytes::Bytes;
use http::HeaderMap;
use http::header::CONTENT_TYPE;
use serde_json::{Map, Value};

use crate::error::{self, Error};

/// Interpret response bytes as a JSON value.
///
/// Empty bodies yield an empty object; bodies that are not valid JSON come
/// back as a string of the raw text.
pub fn read_json_body(bytes: &Bytes) -> Value {
    if bytes.is_empty() {
        return Value::Object(Map::new());
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Serialize a JSON value into request body bytes.
///
/// `Null` means "no body"; everything else is encoded as JSON.
pub fn write_json_body(value: &Value) -> Result<Option<Bytes>, Error> {
    if value.is_null() {
        return Ok(None);
    }
    let encoded = serde_json::to_vec(value).map_err(error::decode)?;
    Ok(Some(Bytes::from(encoded)))
}

/// Add `content-type: application/json` unless the caller already set one.
pub fn merge_json_content_type(headers: &mut HeaderMap) {
    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
    }
}
