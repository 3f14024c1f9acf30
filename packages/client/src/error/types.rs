use std::error::Error as StdError;
use std::fmt;

use http::StatusCode;

/// A `Result` alias where the `Err` case is `cachet_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents every failure the cache engines can produce.
///
/// Transport failures, non-success responses, decode problems and deliberate
/// cancellation all normalize into this one shape so callers branch on
/// [`Kind`] instead of a zoo of ad hoc error values.
#[derive(Clone)]
pub struct Error {
    pub(crate) inner: Box<Inner>,
}

pub(crate) struct Inner {
    pub(crate) kind: Kind,
    pub(crate) message: Option<String>,
    pub(crate) status: Option<StatusCode>,
    pub(crate) status_text: Option<String>,
    pub(crate) source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Clone for Inner {
    fn clone(&self) -> Self {
        Inner {
            kind: self.kind,
            message: self.message.clone(),
            status: self.status,
            status_text: self.status_text.clone(),
            source: None, // Cannot clone trait objects, so we lose the source
        }
    }
}

/// Classification of a failure, used by the engines to pick a handling branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Invalid input to a factory or builder (malformed query key, missing transport)
    Builder,
    /// The underlying call could not complete (connection, DNS, task failure)
    Transport,
    /// A response arrived but indicates failure (non-2xx status)
    Status,
    /// The response body or cached value could not be decoded into the expected shape
    Decode,
    /// The request was deliberately superseded or evicted; never published to an error cell
    Cancelled,
}

impl Error {
    pub(crate) fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                message: None,
                status: None,
                status_text: None,
                source: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Error {
        self.inner.message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: StatusCode, status_text: Option<String>) -> Error {
        self.inner.status = Some(status);
        self.inner.status_text = status_text;
        self
    }

    /// Classification of this error.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Human readable message, falling back to the kind's description.
    #[must_use]
    pub fn message(&self) -> String {
        match &self.inner.message {
            Some(message) => message.clone(),
            None => self.to_string(),
        }
    }

    /// HTTP status code, populated for non-success responses.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.inner.status
    }

    /// Status text accompanying the status code, if the transport provided one.
    #[must_use]
    pub fn status_text(&self) -> Option<&str> {
        self.inner.status_text.as_deref()
    }

    /// True when this failure is a deliberate cancellation.
    ///
    /// A superseded request resolves through this branch and must never be
    /// published as a consumer-visible error.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self.inner.kind, Kind::Cancelled)
    }

    /// True when a response was received but carried a non-success status.
    #[must_use]
    pub fn is_status(&self) -> bool {
        matches!(self.inner.kind, Kind::Status)
    }

    /// True when the underlying call itself failed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self.inner.kind, Kind::Transport)
    }

    /// True when a body or cached value could not be decoded.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self.inner.kind, Kind::Decode)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("cachet::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref message) = self.inner.message {
            f.field("message", message);
        }

        if let Some(status) = self.inner.status {
            f.field("status", &status);
        }

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref message) = self.inner.message {
            f.write_str(message)?;
        } else {
            match self.inner.kind {
                Kind::Builder => f.write_str("builder error")?,
                Kind::Transport => f.write_str("error performing request")?,
                Kind::Status => {
                    let prefix = match self.inner.status {
                        Some(code) if code.is_client_error() => "HTTP status client error",
                        Some(_) => "HTTP status server error",
                        None => "HTTP status error",
                    };
                    f.write_str(prefix)?;
                }
                Kind::Decode => f.write_str("error decoding response body")?,
                Kind::Cancelled => f.write_str("request cancelled")?,
            }
        }

        if let Some(status) = self.inner.status {
            match self.inner.status_text {
                Some(ref text) => write!(f, " ({} {})", status.as_str(), text)?,
                None => write!(f, " ({status})")?,
            }
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
