//! Structural validation over a [`TypeModel`].
//!
//! Every function here is pure: it reads the model and writes findings to
//! the [`Diagnostics`] sink. Nothing aborts; the generator keeps emitting
//! past errors so all reachable findings surface in one pass.

use std::collections::BTreeSet;

use chela_core::PathTemplate;

use crate::diagnostics::Diagnostics;
use crate::model::{MethodModel, PropertyAttr, PropertyModel, RequestAttr, TypeModel};

/// Validate type-level headers: a value must be present and the name must
/// not contain a colon.
pub fn validate_type_headers(model: &TypeModel, diags: &mut Diagnostics) {
    for declared in &model.headers {
        let header = &declared.attr;
        if header.name.contains(':') {
            diags.header_name_must_not_contain_colon(header);
        }
        if header.value.is_none() {
            diags.header_on_interface_must_have_value(header);
        }
    }
}

/// Validate that the status-code override is declared on the leaf
/// interface.
pub fn validate_allow_any_status_code(model: &TypeModel, diags: &mut Diagnostics) {
    if let Some(declared) = &model.allow_any_status_code
        && let crate::model::Origin::Parent(parent) = &declared.origin
    {
        diags.allow_any_status_code_not_allowed_on_parent(&model.name, parent);
    }
}

/// Reject every event declaration.
pub fn validate_events(model: &TypeModel, diags: &mut Diagnostics) {
    for event in &model.events {
        diags.event_not_allowed(event);
    }
}

/// Validate path properties and return the set of distinct path keys.
///
/// Duplicate keys are reported on the second and later declarations; the
/// base-path placeholders are then checked against the distinct keys.
pub fn validate_path_properties(model: &TypeModel, diags: &mut Diagnostics) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for property in &model.properties {
        if let Some(key) = property.path_key() {
            if !keys.insert(key.to_string()) {
                diags.multiple_path_properties_for_key(key, property);
            }
        }
    }

    if let Some(base_path) = &model.base_path {
        let template = PathTemplate::new(base_path.attr.template.clone());
        let mut seen = BTreeSet::new();
        for placeholder in template.placeholders() {
            if seen.insert(placeholder) && !keys.contains(placeholder) {
                diags.missing_path_property_for_base_path_placeholder(
                    placeholder,
                    &base_path.attr.template,
                );
            }
        }
    }

    keys
}

/// Validate the shape of the requester property.
///
/// `already_seen` is true when an earlier property was the requester.
pub fn validate_requester_property(
    property: &PropertyModel,
    already_seen: bool,
    diags: &mut Diagnostics,
) {
    if already_seen {
        diags.multiple_requester_properties(property);
    }
    if !property.attrs.is_empty() {
        diags.requester_property_must_have_zero_attributes(property);
    }
    if property.has_setter {
        diags.property_must_be_read_only(property);
    }
}

/// Validate the shape of a non-requester property.
pub fn validate_property(property: &PropertyModel, diags: &mut Diagnostics) {
    if !(property.has_getter && property.has_setter) {
        diags.property_must_be_read_write(property);
    }
    if property.attrs.len() != 1 {
        diags.property_must_have_one_attribute(property);
    }
    for attr in &property.attrs {
        if let PropertyAttr::Header(header) = attr {
            if !header.name.contains(':') {
                diags.header_property_name_must_contain_colon(property);
            }
            if header.value.is_some() && !property.ty.nullable {
                diags.header_property_with_value_must_be_nullable(property);
            }
        }
    }
}

/// Validate method-level header names.
pub fn validate_method_headers(method: &MethodModel, diags: &mut Diagnostics) {
    for header in &method.headers {
        if header.name.contains(':') {
            diags.header_name_must_not_contain_colon(header);
        }
    }
}

/// Validate one method's path template against its path parameters and the
/// type's path properties.
///
/// Checks both directions: every placeholder needs a matching parameter or
/// property, and every path parameter needs a placeholder. Path properties
/// are optional contextual values and need no placeholder.
pub fn validate_method_path(
    method: &MethodModel,
    request: &RequestAttr,
    path_property_keys: &BTreeSet<String>,
    diags: &mut Diagnostics,
) {
    let mut param_keys: Vec<&str> = Vec::new();
    for param in &method.params {
        if let Some(key) = param.path_key() {
            if param_keys.contains(&key) {
                diags.multiple_path_parameters_for_key(method, key);
            } else {
                param_keys.push(key);
            }
        }
    }

    let template = PathTemplate::new(request.path.clone());
    let placeholders = template.placeholders();

    let mut seen = BTreeSet::new();
    for placeholder in &placeholders {
        if seen.insert(*placeholder)
            && !param_keys.contains(placeholder)
            && !path_property_keys.contains(*placeholder)
        {
            diags.missing_path_property_or_parameter_for_placeholder(method, placeholder);
        }
    }

    for key in param_keys {
        if !placeholders.contains(&key) {
            diags.missing_placeholder_for_path_parameter(method, key);
        }
    }
}

/// Detect duplicate message-property keys across one method's parameters.
///
/// Keys are case-sensitive; duplicates are reported on the second and
/// later parameters.
pub fn validate_message_property_keys(method: &MethodModel, diags: &mut Diagnostics) {
    let mut keys: Vec<&str> = Vec::new();
    for param in &method.params {
        if let Some(key) = param.message_property_key() {
            if keys.contains(&key) {
                diags.duplicate_message_property_key(method, key);
            } else {
                keys.push(key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chela_core::Method;

    use super::*;
    use crate::diagnostics::DiagnosticCode;
    use crate::model::{
        EventModel, HeaderAttr, MessagePropertyAttr, ParameterAttr, ParameterModel, PathAttr,
        ReturnType, TypeRef,
    };

    fn codes(diags: &Diagnostics) -> Vec<DiagnosticCode> {
        diags.codes()
    }

    #[test]
    fn interface_header_needs_value_and_no_colon() {
        let model = TypeModel::new("Api")
            .with_header(HeaderAttr::with_value("X-Bad: value", "v"))
            .with_header(HeaderAttr::new("X-Empty"));
        let mut diags = Diagnostics::new();
        validate_type_headers(&model, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![
                DiagnosticCode::HeaderNameMustNotContainColon,
                DiagnosticCode::HeaderOnInterfaceMustHaveValue,
            ]
        );
    }

    #[test]
    fn allow_any_status_code_on_parent_rejected() {
        let mut model = TypeModel::new("Api");
        model.allow_any_status_code = Some(crate::model::Declared::inherited(
            crate::model::AllowAnyStatusCodeAttr,
            "BaseApi",
        ));
        let mut diags = Diagnostics::new();
        validate_allow_any_status_code(&model, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::AllowAnyStatusCodeNotAllowedOnParent]
        );
    }

    #[test]
    fn allow_any_status_code_on_leaf_accepted() {
        let model = TypeModel::new("Api").allow_any_status_code();
        let mut diags = Diagnostics::new();
        validate_allow_any_status_code(&model, &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn events_always_rejected() {
        let model = TypeModel::new("Api").with_event(EventModel::new("Changed"));
        let mut diags = Diagnostics::new();
        validate_events(&model, &mut diags);
        assert_eq!(codes(&diags), vec![DiagnosticCode::EventNotAllowed]);
    }

    #[test]
    fn duplicate_path_property_keys() {
        let model = TypeModel::new("Api")
            .with_property(
                PropertyModel::new("a", TypeRef::new("String"))
                    .with_attr(PropertyAttr::Path(PathAttr::named("accountId"))),
            )
            .with_property(
                PropertyModel::new("b", TypeRef::new("String"))
                    .with_attr(PropertyAttr::Path(PathAttr::named("accountId"))),
            );
        let mut diags = Diagnostics::new();
        let keys = validate_path_properties(&model, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::MultiplePathPropertiesForKey]
        );
        assert!(keys.contains("accountId"));
    }

    #[test]
    fn base_path_placeholder_needs_property() {
        let model = TypeModel::new("Api").with_base_path("/v1/{tenant}");
        let mut diags = Diagnostics::new();
        validate_path_properties(&model, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::MissingPathPropertyForBasePathPlaceholder]
        );
    }

    #[test]
    fn property_shape_rules() {
        let mut diags = Diagnostics::new();
        let read_only = PropertyModel::new("p", TypeRef::new("String")).read_only();
        validate_property(&read_only, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![
                DiagnosticCode::PropertyMustBeReadWrite,
                DiagnosticCode::PropertyMustHaveOneAttribute,
            ]
        );
    }

    #[test]
    fn property_header_colon_and_nullability() {
        let mut diags = Diagnostics::new();
        let property = PropertyModel::new("key", TypeRef::new("String"))
            .with_attr(PropertyAttr::Header(HeaderAttr::with_value("X-Good", "v")));
        validate_property(&property, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![
                DiagnosticCode::HeaderPropertyNameMustContainColon,
                DiagnosticCode::HeaderPropertyWithValueMustBeNullable,
            ]
        );

        let mut diags = Diagnostics::new();
        let property = PropertyModel::new("key", TypeRef::nullable("Option<String>"))
            .with_attr(PropertyAttr::Header(HeaderAttr::with_value("X-Key:", "v")));
        validate_property(&property, &mut diags);
        assert!(diags.is_empty());
    }

    #[test]
    fn requester_property_rules() {
        let mut diags = Diagnostics::new();
        let mut property = PropertyModel::requester("requester");
        property.has_setter = true;
        property.attrs.push(PropertyAttr::Query(Default::default()));
        validate_requester_property(&property, true, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![
                DiagnosticCode::MultipleRequesterProperties,
                DiagnosticCode::RequesterPropertyMustHaveZeroAttributes,
                DiagnosticCode::PropertyMustBeReadOnly,
            ]
        );
    }

    fn get(path: &str) -> RequestAttr {
        RequestAttr::new(Method::Get, path)
    }

    #[test]
    fn method_path_both_directions() {
        let method = MethodModel::new("get_user", get("/users/{id}"), ReturnType::FutureVoid)
            .with_param(
                ParameterModel::new("other", TypeRef::new("u64"))
                    .with_attr(ParameterAttr::Path(PathAttr::new())),
            );
        let mut diags = Diagnostics::new();
        validate_method_path(
            &method,
            method.request.as_ref().expect("request"),
            &BTreeSet::new(),
            &mut diags,
        );
        assert_eq!(
            codes(&diags),
            vec![
                DiagnosticCode::MissingPathPropertyOrParameterForPlaceholder,
                DiagnosticCode::MissingPlaceholderForPathParameter,
            ]
        );
    }

    #[test]
    fn method_path_satisfied_by_property() {
        let method = MethodModel::new(
            "list_users",
            get("/accounts/{accountId}/users"),
            ReturnType::FutureVoid,
        );
        let mut keys = BTreeSet::new();
        keys.insert("accountId".to_string());
        let mut diags = Diagnostics::new();
        validate_method_path(
            &method,
            method.request.as_ref().expect("request"),
            &keys,
            &mut diags,
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn duplicate_path_parameter_keys() {
        let method = MethodModel::new("get", get("/x/{id}"), ReturnType::FutureVoid)
            .with_param(
                ParameterModel::new("id", TypeRef::new("u64"))
                    .with_attr(ParameterAttr::Path(PathAttr::new())),
            )
            .with_param(
                ParameterModel::new("dup", TypeRef::new("u64"))
                    .with_attr(ParameterAttr::Path(PathAttr::named("id"))),
            );
        let mut diags = Diagnostics::new();
        validate_method_path(
            &method,
            method.request.as_ref().expect("request"),
            &BTreeSet::new(),
            &mut diags,
        );
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::MultiplePathParametersForKey]
        );
    }

    #[test]
    fn duplicate_message_property_keys_case_sensitive() {
        let method = MethodModel::new("send", get("/send"), ReturnType::FutureVoid)
            .with_param(
                ParameterModel::new("a", TypeRef::new("String"))
                    .with_attr(ParameterAttr::MessageProperty(MessagePropertyAttr::keyed(
                        "trace",
                    ))),
            )
            .with_param(
                ParameterModel::new("b", TypeRef::new("String"))
                    .with_attr(ParameterAttr::MessageProperty(MessagePropertyAttr::keyed(
                        "Trace",
                    ))),
            )
            .with_param(
                ParameterModel::new("c", TypeRef::new("String"))
                    .with_attr(ParameterAttr::MessageProperty(MessagePropertyAttr::keyed(
                        "trace",
                    ))),
            );
        let mut diags = Diagnostics::new();
        validate_message_property_keys(&method, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::DuplicateMessagePropertyKey]
        );
    }

    #[test]
    fn method_header_colon_rejected() {
        let method = MethodModel::new("get", get("/x"), ReturnType::FutureVoid)
            .with_header(HeaderAttr::with_value("X-Bad: v", "v"));
        let mut diags = Diagnostics::new();
        validate_method_headers(&method, &mut diags);
        assert_eq!(
            codes(&diags),
            vec![DiagnosticCode::HeaderNameMustNotContainColon]
        );
    }
}
