//! The requester capability.
//!
//! A [`Requester`] is the injected collaborator that executes a
//! [`RequestDescription`]. Generated plans never touch the network
//! themselves; they assemble a description and hand it to one of the
//! requester's entry points.
//!
//! Implement this trait for custom transports or for in-process test
//! doubles that record the descriptions they receive.

use std::future::Future;

use bytes::Bytes;
use serde_json::Value;

use crate::response::{BodyStream, Response, ResponseMessage};
use crate::serialization::Serializers;
use crate::{RequestDescription, Result};

/// Executes request descriptions produced by generated clients.
///
/// All entry points are async-first; the description carries the
/// cancellation token, so honoring cancellation is the implementation's
/// responsibility.
pub trait Requester: Send + Sync {
    /// The codecs used to render `Serialized` values and bodies.
    fn serializers(&self) -> &Serializers;

    /// Execute a request, discarding any response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected status code.
    fn request_void(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Execute a request and deserialize the response body.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a rejected status code, or a
    /// body that is not valid JSON.
    fn request_json(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<Value>> + Send;

    /// Execute a request and return the raw response message.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure.
    fn request_response_message(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<ResponseMessage>> + Send;

    /// Execute a request and return the deserialized body together with the
    /// raw response message.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or an undeserializable body.
    fn request_response(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<Response<Value>>> + Send;

    /// Execute a request and return the raw body bytes.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected status code.
    fn request_raw_bytes(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<Bytes>> + Send;

    /// Execute a request and return the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a rejected status code, or a
    /// non-UTF-8 body.
    fn request_raw_string(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Execute a request and return the body as a stream of chunks.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a rejected status code.
    fn request_raw_stream(
        &self,
        description: RequestDescription,
    ) -> impl Future<Output = Result<BodyStream>> + Send;

    /// Release any resources held by the requester.
    ///
    /// Generated dispose methods delegate here.
    fn dispose(&self);
}
