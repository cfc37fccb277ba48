//! Core types for the chela declarative HTTP-client generator.
//!
//! This crate provides the runtime-facing types shared by generated clients:
//! - [`Method`] - HTTP verb enum (closed set)
//! - [`RequestDescription`] - the record a generated method assembles per call
//! - [`Requester`] - the injected capability that executes a description
//! - [`Response`] and [`ResponseMessage`] - response types
//! - [`PathTemplate`] - `{name}` placeholder extraction and expansion
//! - Serialization-method enums and the pluggable codec traits
//! - [`Error`] and [`Result`] - error handling
//! - [`StatusCode`] - HTTP status codes (re-exported from the `http` crate)

mod description;
mod error;
mod method;
mod path_template;
pub mod prelude;
mod requester;
mod response;
mod serialization;

pub use description::{BodyParam, MessageProperty, PathParam, QueryParam, RequestDescription};
pub use error::{Error, Result};
pub use method::Method;
pub use path_template::PathTemplate;
pub use requester::Requester;
pub use response::{BodyStream, Response, ResponseMessage};
pub use serialization::{
    BodySerializationMethod, BodySerializer, ContentType, JsonSerializer, PathParamSerializer,
    PathSerializationMethod, QueryParamSerializer, QuerySerializationMethod, Serializers,
    UrlEncodedSerializer, canonical_string, from_value, to_value,
};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};

// Re-export collaborator crates referenced by generated source text
pub use bytes;
pub use url;

// Re-exports used by generated source text
pub use serde_json::Value;
pub use tokio_util::sync::CancellationToken;
