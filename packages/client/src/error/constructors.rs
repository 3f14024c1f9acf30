use http::StatusCode;

use super::types::{Error, Kind};

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Creates an `Error` for invalid factory or builder input.
pub fn builder(message: impl Into<String>) -> Error {
    Error::new(Kind::Builder).with_message(message)
}

/// Creates an `Error` for a failed transport call.
pub fn transport<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Transport).with(e.into())
}

/// Creates an `Error` for a response carrying a non-success status.
///
/// The message carries the bare status line (`HTTP 404`); the status code
/// and status text are preserved as structured fields.
pub fn status(code: StatusCode, status_text: Option<String>) -> Error {
    let text = status_text.or_else(|| code.canonical_reason().map(str::to_owned));
    Error::new(Kind::Status)
        .with_message(format!("HTTP {}", code.as_u16()))
        .with_status(code, text)
}

/// Creates an `Error` for a body that could not be decoded into the expected shape.
pub fn decode<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Decode).with(e.into())
}

/// Creates an `Error` marking a deliberately superseded request.
pub fn cancelled() -> Error {
    Error::new(Kind::Cancelled)
}

/// Normalizes an arbitrary failure into the engine error shape.
///
/// An [`Error`] passes through untouched, keeping its kind, message and
/// status fields. Anything else becomes a transport-kind failure with
/// `default_message` and the raw value retained as the cause.
pub fn normalize<E: Into<BoxError>>(raw: E, default_message: &str) -> Error {
    let raw = raw.into();
    match raw.downcast::<Error>() {
        Ok(err) => *err,
        Err(other) => Error::new(Kind::Transport)
            .with_message(default_message)
            .with(other),
    }
}
