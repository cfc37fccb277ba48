//! HTTP response types returned by a [`Requester`].
//!
//! [`Requester`]: crate::Requester

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;

use crate::Result;

/// A streaming response body: chunks of bytes arriving over time.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// A raw HTTP response: status, ordered headers, and buffered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl ResponseMessage {
    /// Creates a new response message.
    #[must_use]
    pub fn new(status: u16, headers: Vec<(String, String)>, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers in wire order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First header value with the given name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Consume into the body.
    #[must_use]
    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Deserialize the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON for `T`.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(Into::into)
    }
}

/// A deserialized value paired with the response it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response<T> {
    value: T,
    message: ResponseMessage,
}

impl<T> Response<T> {
    /// Creates a new response.
    #[must_use]
    pub fn new(value: T, message: ResponseMessage) -> Self {
        Self { value, message }
    }

    /// The deserialized value.
    #[must_use]
    pub const fn value(&self) -> &T {
        &self.value
    }

    /// The raw response message.
    #[must_use]
    pub const fn message(&self) -> &ResponseMessage {
        &self.message
    }

    /// Consume into the value.
    #[must_use]
    pub fn into_value(self) -> T {
        self.value
    }

    /// Consume into (value, message).
    #[must_use]
    pub fn into_parts(self) -> (T, ResponseMessage) {
        (self.value, self.message)
    }
}

impl Response<serde_json::Value> {
    /// Re-deserialize the dynamic value into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns an error if the value does not match the target shape.
    pub fn deserialize<T: serde::de::DeserializeOwned>(self) -> Result<Response<T>> {
        let (value, message) = self.into_parts();
        Ok(Response::new(crate::from_value(value)?, message))
    }
}
