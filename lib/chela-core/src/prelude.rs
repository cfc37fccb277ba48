//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and functions
//! for easy glob importing:
//!
//! ```ignore
//! use chela_core::prelude::*;
//! ```

pub use crate::{
    BodySerializationMethod, BodySerializer, ContentType, Error, Method, PathSerializationMethod,
    PathTemplate, QuerySerializationMethod, RequestDescription, Requester, Response,
    ResponseMessage, Result, Serializers, canonical_string, from_value, to_value,
};
