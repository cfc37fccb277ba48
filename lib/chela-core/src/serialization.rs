//! Serialization methods and pluggable value codecs.
//!
//! Every path, query, and body value carries a serialization method chosen at
//! generation time. `ToString` renders the value's canonical textual form;
//! `Serialized` delegates to the codec held by the [`Requester`].
//!
//! [`Requester`]: crate::Requester

use bytes::Bytes;
use serde_json::Value;

use crate::Result;

/// How a path substitution value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PathSerializationMethod {
    /// Canonical stringification of the value.
    #[default]
    ToString,
    /// Delegated to the configured [`PathParamSerializer`].
    Serialized,
}

/// How a query value is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuerySerializationMethod {
    /// Canonical stringification of the value.
    #[default]
    ToString,
    /// Delegated to the configured [`QueryParamSerializer`].
    Serialized,
}

/// How a request body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BodySerializationMethod {
    /// Delegated to the configured [`BodySerializer`].
    #[default]
    Serialized,
    /// URL-encoded form body.
    UrlEncoded,
}

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Form URL-encoded content type (`application/x-www-form-urlencoded`).
    FormUrlEncoded,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::FormUrlEncoded => "application/x-www-form-urlencoded",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Canonical textual form of a value.
///
/// Strings render without quotes; every other value renders as its JSON text.
/// This is the `ToString` serialization method.
#[must_use]
pub fn canonical_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Convert a serializable value into a dynamic [`Value`].
///
/// # Errors
///
/// Returns an error if the value cannot be represented as JSON.
pub fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(Into::into)
}

/// Deserialize a dynamic [`Value`] into a concrete type.
///
/// # Errors
///
/// Returns an error if the value does not match the target shape.
pub fn from_value<T: serde::de::DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(Into::into)
}

/// Strategy for rendering `Serialized` path values.
pub trait PathParamSerializer: Send + Sync {
    /// Render a path value as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn serialize_value(&self, value: &Value) -> Result<String>;
}

/// Strategy for rendering `Serialized` query values.
pub trait QueryParamSerializer: Send + Sync {
    /// Render a query value as a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    fn serialize_value(&self, value: &Value) -> Result<String>;
}

/// Strategy for encoding request bodies.
pub trait BodySerializer: Send + Sync {
    /// The content type this serializer produces.
    fn content_type(&self) -> ContentType;

    /// Encode a body value to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded.
    fn serialize_body(&self, value: &Value) -> Result<Bytes>;
}

/// JSON codec for path values, query values, and bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl PathParamSerializer for JsonSerializer {
    fn serialize_value(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(Into::into)
    }
}

impl QueryParamSerializer for JsonSerializer {
    fn serialize_value(&self, value: &Value) -> Result<String> {
        serde_json::to_string(value).map_err(Into::into)
    }
}

impl BodySerializer for JsonSerializer {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn serialize_body(&self, value: &Value) -> Result<Bytes> {
        serde_json::to_vec(value).map(Bytes::from).map_err(Into::into)
    }
}

/// Form URL-encoded codec for request bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncodedSerializer;

impl BodySerializer for UrlEncodedSerializer {
    fn content_type(&self) -> ContentType {
        ContentType::FormUrlEncoded
    }

    fn serialize_body(&self, value: &Value) -> Result<Bytes> {
        let encoded = serde_urlencoded::to_string(value)?;
        Ok(Bytes::from(encoded))
    }
}

/// The codec set held by a [`Requester`].
///
/// Instances are owned by the requester, never global.
///
/// [`Requester`]: crate::Requester
pub struct Serializers {
    path: Box<dyn PathParamSerializer>,
    query: Box<dyn QueryParamSerializer>,
    body: Box<dyn BodySerializer>,
}

impl Serializers {
    /// Replace the path value codec.
    #[must_use]
    pub fn with_path(mut self, path: impl PathParamSerializer + 'static) -> Self {
        self.path = Box::new(path);
        self
    }

    /// Replace the query value codec.
    #[must_use]
    pub fn with_query(mut self, query: impl QueryParamSerializer + 'static) -> Self {
        self.query = Box::new(query);
        self
    }

    /// Replace the body codec.
    #[must_use]
    pub fn with_body(mut self, body: impl BodySerializer + 'static) -> Self {
        self.body = Box::new(body);
        self
    }

    /// Render a `Serialized` path value through the configured codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec fails.
    pub fn serialize_path_value(&self, value: &Value) -> Result<String> {
        self.path.serialize_value(value)
    }

    /// Render a `Serialized` query value through the configured codec.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec fails.
    pub fn serialize_query_value(&self, value: &Value) -> Result<String> {
        self.query.serialize_value(value)
    }

    /// Encode a body through the configured codec, returning the bytes and
    /// their content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec fails.
    pub fn serialize_body(&self, value: &Value) -> Result<(Bytes, ContentType)> {
        Ok((self.body.serialize_body(value)?, self.body.content_type()))
    }
}

impl Default for Serializers {
    fn default() -> Self {
        Self {
            path: Box::new(JsonSerializer),
            query: Box::new(JsonSerializer),
            body: Box::new(JsonSerializer),
        }
    }
}

impl std::fmt::Debug for Serializers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Serializers").finish_non_exhaustive()
    }
}
