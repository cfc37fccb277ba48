//! Pipeline orchestration.
//!
//! [`generate`] drives one [`TypeModel`] through validation and emission
//! against any backend. Diagnostics accumulate; emission continues past
//! errors so one pass surfaces every reachable finding. The caller decides
//! afterwards whether the artifact is usable, typically through
//! [`Generation::into_result`].

use derive_more::{Display, Error};
use tracing::debug;

use crate::diagnostics::Diagnostics;
use crate::emit::{Emitter, EmittedProperty, MethodEmitter, TypeEmitter};
use crate::model::{
    MethodModel, ParameterRole, PropertyAttr, PropertyModel, TypeModel,
};
use crate::resolve::SerializationResolver;
use crate::validate;

/// The artifact of one generation pass, with everything the validator and
/// emitter reported along the way.
#[derive(Debug)]
pub struct Generation<T> {
    /// The emitted artifact. Meaningful only when no error diagnostics
    /// accumulated.
    pub artifact: T,
    /// Everything reported during the pass, in declaration order.
    pub diagnostics: Diagnostics,
}

impl<T> Generation<T> {
    /// The artifact, or an error when any error diagnostic accumulated.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Invalid`] carrying the diagnostics.
    pub fn into_result(self) -> Result<T, GenerateError> {
        if self.diagnostics.has_errors() {
            Err(GenerateError::Invalid {
                diagnostics: self.diagnostics,
            })
        } else {
            Ok(self.artifact)
        }
    }
}

/// Errors surfaced after a generation pass.
#[derive(Debug, Display, Error)]
pub enum GenerateError {
    /// The interface violated at least one rule.
    #[display("interface is invalid: {} diagnostic(s)", diagnostics.len())]
    Invalid {
        /// Everything reported during the pass.
        #[error(not(source))]
        diagnostics: Diagnostics,
    },
}

/// Generate one interface against a backend.
///
/// The sequence is fixed: type-level validation, type emission, path
/// properties, per-property validation and emission, then per-method
/// emission with request-info construction, status-code handling, base
/// path, property contributions in property declaration order, method
/// headers, parameter contributions in parameter declaration order, and
/// finally dispatch.
pub fn generate<E: Emitter>(model: &TypeModel, emitter: &E) -> Generation<E::Output> {
    let mut diags = Diagnostics::new();

    debug!(interface = %model.name, "validating type-level attributes");
    validate::validate_type_headers(model, &mut diags);
    validate::validate_allow_any_status_code(model, &mut diags);
    validate::validate_events(model, &mut diags);

    let mut type_emitter = emitter.emit_type(model);

    let path_property_keys = validate::validate_path_properties(model, &mut diags);

    debug!(
        interface = %model.name,
        properties = model.properties.len(),
        "emitting properties"
    );
    let mut emitted: Vec<(EmittedProperty, &PropertyModel)> = Vec::new();
    let mut requester_seen = false;
    for property in &model.properties {
        if property.is_requester {
            validate::validate_requester_property(property, requester_seen, &mut diags);
            if !requester_seen {
                type_emitter.emit_requester_property(property);
            }
            requester_seen = true;
        } else {
            validate::validate_property(property, &mut diags);
            let handle = type_emitter.emit_property(property);
            emitted.push((handle, property));
        }
    }

    debug!(
        interface = %model.name,
        methods = model.methods.len(),
        "emitting methods"
    );
    for method in &model.methods {
        if method.is_dispose {
            type_emitter.emit_dispose_method(method);
            continue;
        }
        let Some(request) = &method.request else {
            diags.method_must_have_request_attribute(method);
            continue;
        };

        validate::validate_method_path(method, request, &path_property_keys, &mut diags);
        validate::validate_method_headers(method, &mut diags);
        validate::validate_message_property_keys(method, &mut diags);

        let resolver = SerializationResolver::new(
            model.serialization_methods,
            method.serialization_methods,
        );
        let mut method_emitter = type_emitter.emit_method(method, request);

        let allow_any = method.allow_any_status_code.is_some()
            || model.allow_any_status_code.is_some();
        if allow_any {
            method_emitter.set_allow_any_status_code();
        }

        if let Some(base_path) = &model.base_path {
            method_emitter.set_base_path(&base_path.attr.template);
        }

        emit_property_contributions(&emitted, &resolver, &mut method_emitter);

        for header in &method.headers {
            method_emitter.add_method_header(header);
        }

        emit_parameter_contributions(method, &resolver, &mut method_emitter, &mut diags);

        if !method_emitter.try_emit_invocation(&method.return_type) {
            diags.method_must_have_valid_return_type(method);
        }
        type_emitter.finish_method(method_emitter);
    }

    let artifact = type_emitter.generate();
    debug!(
        interface = %model.name,
        diagnostics = diags.len(),
        "generation finished"
    );
    Generation {
        artifact,
        diagnostics: diags,
    }
}

fn emit_property_contributions<M: MethodEmitter>(
    emitted: &[(EmittedProperty, &PropertyModel)],
    resolver: &SerializationResolver,
    method_emitter: &mut M,
) {
    for (handle, property) in emitted {
        // Exactly one attribute on a valid property; the first decides on
        // invalid ones so emission still proceeds.
        match property.attrs.first() {
            Some(PropertyAttr::Header(header)) => {
                method_emitter.add_header_property(handle, header);
            }
            Some(PropertyAttr::Path(path)) => {
                let key = path.name.as_deref().unwrap_or(&property.name);
                method_emitter.add_path_property(handle, key, resolver.resolve_path(path.method));
            }
            Some(PropertyAttr::Query(query)) => {
                let name = query.name.as_deref().unwrap_or(&property.name);
                method_emitter.add_query_property(
                    handle,
                    name,
                    resolver.resolve_query(query.method),
                );
            }
            Some(PropertyAttr::MessageProperty(attr)) => {
                let key = attr.key.as_deref().unwrap_or(&property.name);
                method_emitter.add_message_property_property(handle, key);
            }
            None => {}
        }
    }
}

fn emit_parameter_contributions<M: MethodEmitter>(
    method: &MethodModel,
    resolver: &SerializationResolver,
    method_emitter: &mut M,
    diags: &mut Diagnostics,
) {
    let mut token_seen = false;
    let mut body_seen = false;
    for (index, param) in method.params.iter().enumerate() {
        let role = param.role();
        if role == ParameterRole::CancellationToken {
            if !param.attrs.is_empty() {
                diags.cancellation_token_must_have_zero_attributes(method, param);
            }
            if token_seen {
                diags.multiple_cancellation_token_parameters(method, param);
            } else {
                token_seen = true;
                method_emitter.set_cancellation_token(index);
            }
            continue;
        }
        if param.attrs.len() > 1 {
            diags.parameter_must_have_zero_or_one_attributes(method, param);
        }
        match role {
            // Handled above.
            ParameterRole::CancellationToken => {}
            ParameterRole::Header(header) => {
                if header.name.contains(':') {
                    diags.header_name_must_not_contain_colon(header);
                }
                if header.value.is_some() {
                    diags.header_parameter_must_not_have_value(method, param);
                }
                method_emitter.add_header_parameter(index, &header.name);
            }
            ParameterRole::Path(path) => {
                let key = path.name.as_deref().unwrap_or(&param.name);
                method_emitter.add_path_parameter(index, key, resolver.resolve_path(path.method));
            }
            ParameterRole::Query(query) => {
                let name = query.name.as_deref().unwrap_or(&param.name);
                method_emitter.add_query_parameter(
                    index,
                    name,
                    resolver.resolve_query(query.method),
                );
            }
            ParameterRole::QueryMap(map) => {
                let method_resolved = resolver.resolve_query(map.method);
                if !method_emitter.try_add_query_map_parameter(
                    index,
                    param.ty.is_map,
                    method_resolved,
                ) {
                    diags.query_map_parameter_is_not_a_dictionary(method, param);
                }
            }
            ParameterRole::RawQueryString => {
                method_emitter.add_raw_query_string_parameter(index);
            }
            ParameterRole::Body(body) => {
                if body_seen {
                    diags.multiple_body_parameters(method, param);
                } else {
                    body_seen = true;
                    method_emitter.set_body_parameter(index, resolver.resolve_body(body.method));
                }
            }
            ParameterRole::MessageProperty(attr) => {
                let key = attr.key.as_deref().unwrap_or(&param.name);
                method_emitter.add_message_property_parameter(index, key);
            }
            ParameterRole::Implicit => {
                method_emitter.add_query_parameter(
                    index,
                    &param.name,
                    chela_core::QuerySerializationMethod::default(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chela_core::Method;

    use super::*;
    use crate::model::{RequestAttr, ReturnType};
    use crate::plan::PlanEmitter;

    #[test]
    fn empty_interface_generates_cleanly() {
        let model = TypeModel::new("EmptyApi");
        let generation = generate(&model, &PlanEmitter);
        assert!(generation.diagnostics.is_empty());
        let plan = generation.into_result().expect("valid");
        assert_eq!(plan.type_name(), "EmptyApi");
        assert!(plan.methods().is_empty());
    }

    #[test]
    fn unannotated_method_is_reported_and_skipped() {
        let model = TypeModel::new("Api")
            .with_method(MethodModel::unannotated("mystery", ReturnType::FutureVoid));
        let generation = generate(&model, &PlanEmitter);
        assert!(generation.diagnostics.has_errors());
        assert!(generation.artifact.methods().is_empty());
    }

    #[test]
    fn into_result_fails_on_errors() {
        let model = TypeModel::new("Api")
            .with_method(MethodModel::unannotated("mystery", ReturnType::FutureVoid));
        let generation = generate(&model, &PlanEmitter);
        let err = generation.into_result().expect_err("invalid");
        assert!(err.to_string().contains("1 diagnostic"));
    }

    #[test]
    fn dispose_method_recorded() {
        let model = TypeModel::new("Api").with_method(MethodModel::dispose("close"));
        let generation = generate(&model, &PlanEmitter);
        assert!(generation.diagnostics.is_empty());
        assert_eq!(generation.artifact.dispose_method(), Some("close"));
    }

    #[test]
    fn generation_is_deterministic() {
        let model = TypeModel::new("Api").with_method(MethodModel::new(
            "ping",
            RequestAttr::new(Method::Get, "/ping"),
            ReturnType::FutureVoid,
        ));
        let first = generate(&model, &PlanEmitter).artifact;
        let second = generate(&model, &PlanEmitter).artifact;
        assert_eq!(first, second);
    }
}
