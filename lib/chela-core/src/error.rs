//! Error types for chela.

use derive_more::{Display, Error, From};

/// Main error type for chela request construction and execution.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// HTTP-level errors (non-2xx status codes).
    #[display("HTTP error {status}: {message}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Response body, if available.
        #[error(not(source))]
        body: Option<bytes::Bytes>,
    },

    /// JSON serialization or deserialization error.
    #[display("JSON error: {_0}")]
    #[from]
    Json(serde_json::Error),

    /// Form URL-encoded serialization error.
    #[display("form serialization error: {_0}")]
    #[from]
    UrlEncoded(serde_urlencoded::ser::Error),

    /// URL parsing error.
    #[display("invalid URL: {_0}")]
    #[from]
    InvalidUrl(url::ParseError),

    /// A path placeholder had no value at request-construction time.
    #[display("missing value for path placeholder {{{key}}}")]
    #[from(skip)]
    MissingPathValue {
        /// The placeholder name.
        key: String,
    },

    /// An argument value did not have the shape the plan expects.
    #[display("invalid argument: {_0}")]
    #[from(skip)]
    Argument(#[error(not(source))] String),

    /// The request was cancelled through its cancellation token.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),
}

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an HTTP error from status code and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: None,
        }
    }

    /// Create an HTTP error with body.
    #[must_use]
    pub fn http_with_body(status: u16, message: impl Into<String>, body: bytes::Bytes) -> Self {
        Self::Http {
            status,
            message: message.into(),
            body: Some(body),
        }
    }

    /// Create an invalid-argument error.
    #[must_use]
    pub fn argument(message: impl Into<String>) -> Self {
        Self::Argument(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = Error::http(404, "Not Found");
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");

        let err = Error::Cancelled;
        assert_eq!(err.to_string(), "request cancelled");

        let err = Error::MissingPathValue {
            key: "accountId".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "missing value for path placeholder {accountId}"
        );
    }

    #[test]
    fn error_status() {
        assert_eq!(Error::http(404, "Not Found").status(), Some(404));
        assert!(Error::http(404, "Not Found").is_client_error());
        assert!(Error::http(502, "Bad Gateway").is_server_error());
        assert_eq!(Error::Cancelled.status(), None);
    }

    #[test]
    fn error_is_cancelled() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::argument("nope").is_cancelled());
    }
}
