//! The emitter contract.
//!
//! Emission is polymorphic: the generator drives one of several backends
//! through the trait family here. Each emission call is total - it accepts
//! any well-formed input - and the caller guarantees it is invoked at most
//! once per contribution. Backends must observe identical ordering:
//! type-level setup, property contributions in property declaration order,
//! method headers, parameter contributions in parameter declaration order,
//! then dispatch.

use chela_core::{BodySerializationMethod, PathSerializationMethod, QuerySerializationMethod};

use crate::model::{
    HeaderAttr, MethodModel, PropertyModel, RequestAttr, ReturnType, TypeModel,
};

/// Handle to a property the type emitter has materialized.
///
/// Method emitters reference properties through this handle so both
/// backends agree on slot numbering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedProperty {
    /// Slot index in property declaration order (requester excluded).
    pub slot: usize,
    /// Property name.
    pub name: String,
}

/// A backend that can emit one annotated interface.
pub trait Emitter {
    /// The finished artifact: a runtime plan, source text, or similar.
    type Output;
    /// The per-type emitter this backend produces.
    type TypeEmitter: TypeEmitter<Output = Self::Output>;

    /// Begin emission for one interface.
    fn emit_type(&self, model: &TypeModel) -> Self::TypeEmitter;
}

/// Per-type emission state.
pub trait TypeEmitter {
    /// The finished artifact.
    type Output;
    /// The per-method emitter this type emitter produces.
    type MethodEmitter: MethodEmitter;

    /// Record the requester property.
    fn emit_requester_property(&mut self, property: &PropertyModel);

    /// Record a non-requester property, returning its handle.
    fn emit_property(&mut self, property: &PropertyModel) -> EmittedProperty;

    /// Begin emission of a request method, recording request-info
    /// construction with the method's verb and path template.
    fn emit_method(&mut self, method: &MethodModel, request: &RequestAttr) -> Self::MethodEmitter;

    /// Accept a finished method emitter back.
    fn finish_method(&mut self, method: Self::MethodEmitter);

    /// Record the dispose method as a delegation to the requester's
    /// release capability.
    fn emit_dispose_method(&mut self, method: &MethodModel);

    /// Finalize and return the artifact.
    fn generate(self) -> Self::Output;
}

/// Per-method emission operations.
///
/// Operations are recorded in call order; the order is part of the
/// contract because header and query ordering may be observable at the
/// wire.
pub trait MethodEmitter {
    /// Accept any response status code for this method.
    fn set_allow_any_status_code(&mut self);

    /// Prepend the type's base-path template.
    fn set_base_path(&mut self, template: &str);

    /// Contribute a header-annotated property.
    fn add_header_property(&mut self, property: &EmittedProperty, header: &HeaderAttr);

    /// Contribute a path-annotated property.
    fn add_path_property(
        &mut self,
        property: &EmittedProperty,
        key: &str,
        method: PathSerializationMethod,
    );

    /// Contribute a query-annotated property.
    fn add_query_property(
        &mut self,
        property: &EmittedProperty,
        name: &str,
        method: QuerySerializationMethod,
    );

    /// Contribute a message-property-annotated property.
    fn add_message_property_property(&mut self, property: &EmittedProperty, key: &str);

    /// Contribute a method-level header.
    fn add_method_header(&mut self, header: &HeaderAttr);

    /// Flow the cancellation-token argument into the request.
    fn set_cancellation_token(&mut self, index: usize);

    /// Contribute a header argument.
    fn add_header_parameter(&mut self, index: usize, name: &str);

    /// Contribute a path-substitution argument.
    fn add_path_parameter(&mut self, index: usize, key: &str, method: PathSerializationMethod);

    /// Contribute a query argument.
    fn add_query_parameter(&mut self, index: usize, name: &str, method: QuerySerializationMethod);

    /// Contribute a message-property argument.
    fn add_message_property_parameter(&mut self, index: usize, key: &str);

    /// Contribute a raw query-string argument.
    fn add_raw_query_string_parameter(&mut self, index: usize);

    /// Contribute a query-map argument.
    ///
    /// Returns false when the parameter's type is not a key-value mapping;
    /// the caller reports the diagnostic.
    fn try_add_query_map_parameter(
        &mut self,
        index: usize,
        is_map: bool,
        method: QuerySerializationMethod,
    ) -> bool;

    /// Contribute the body argument.
    fn set_body_parameter(&mut self, index: usize, method: BodySerializationMethod);

    /// Record the dispatch against the requester.
    ///
    /// Returns false when the return type is not one of the recognized
    /// request shapes; the caller reports the diagnostic.
    fn try_emit_invocation(&mut self, return_type: &ReturnType) -> bool;
}
