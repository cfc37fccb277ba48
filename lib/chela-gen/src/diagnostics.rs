//! Diagnostic accumulation for the generation pipeline.
//!
//! The reporter is a sink: every rule violation maps to exactly one
//! [`DiagnosticCode`], reporting never aborts, and emission continues past
//! errors so one pass surfaces every reachable finding. After generation
//! the caller inspects the collected diagnostics and decides whether the
//! artifact is usable.

use derive_more::Display;

use crate::model::{EventModel, HeaderAttr, MethodModel, ParameterModel, PropertyModel};

/// The closed set of diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Interface-level header with a null value.
    HeaderOnInterfaceMustHaveValue,
    /// Interface/method/parameter header name contains `:`.
    HeaderNameMustNotContainColon,
    /// Property-level header name missing `:`.
    HeaderPropertyNameMustContainColon,
    /// Property header default on a non-nullable type.
    HeaderPropertyWithValueMustBeNullable,
    /// Parameter header carries a value literal.
    HeaderParameterMustNotHaveValue,
    /// Status-code override declared on an inherited interface.
    AllowAnyStatusCodeNotAllowedOnParent,
    /// The interface declares an event.
    EventNotAllowed,
    /// Method missing its verb-and-path annotation.
    MethodMustHaveRequestAttribute,
    /// Return type not in the recognized set.
    MethodMustHaveValidReturnType,
    /// More than one requester property.
    MultipleRequesterProperties,
    /// Requester property carries other annotations.
    RequesterPropertyMustHaveZeroAttributes,
    /// Requester property has a setter.
    PropertyMustBeReadOnly,
    /// Non-requester property missing a getter or setter.
    PropertyMustBeReadWrite,
    /// Non-requester property without exactly one relevant annotation.
    PropertyMustHaveOneAttribute,
    /// Duplicate path-property key.
    MultiplePathPropertiesForKey,
    /// Base-path placeholder with no matching path property.
    MissingPathPropertyForBasePathPlaceholder,
    /// Duplicate path-parameter key in one method.
    MultiplePathParametersForKey,
    /// Method-path placeholder with no matching parameter or property.
    MissingPathPropertyOrParameterForPlaceholder,
    /// Path parameter unused by the method's template.
    MissingPlaceholderForPathParameter,
    /// More than one body parameter.
    MultipleBodyParameters,
    /// More than one cancellation-token parameter.
    MultipleCancellationTokenParameters,
    /// Cancellation-token parameter carries annotations.
    CancellationTokenMustHaveZeroAttributes,
    /// Parameter carries more than one annotation.
    ParameterMustHaveZeroOrOneAttributes,
    /// Query-map parameter type is not a key-value mapping.
    QueryMapParameterIsNotADictionary,
    /// Duplicate message-property key in one method.
    DuplicateMessagePropertyKey,
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Severity {
    /// Fatal for the interface being generated.
    #[display("error")]
    Error,
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The rule that was violated.
    pub code: DiagnosticCode,
    /// Severity of the finding.
    pub severity: Severity,
    /// The offending entity (interface, member, or key).
    pub subject: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.code, self.subject, self.message
        )
    }
}

/// The diagnostic sink. Findings accumulate in report order.
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn report(&mut self, code: DiagnosticCode, subject: impl Into<String>, message: String) {
        self.items.push(Diagnostic {
            code,
            severity: Severity::Error,
            subject: subject.into(),
            message,
        });
    }

    /// Interface-level header with a null value.
    pub fn header_on_interface_must_have_value(&mut self, header: &HeaderAttr) {
        self.report(
            DiagnosticCode::HeaderOnInterfaceMustHaveValue,
            &header.name,
            format!("interface header '{}' must have a value", header.name),
        );
    }

    /// Interface/method/parameter header name contains a colon.
    pub fn header_name_must_not_contain_colon(&mut self, header: &HeaderAttr) {
        self.report(
            DiagnosticCode::HeaderNameMustNotContainColon,
            &header.name,
            format!("header name '{}' must not contain ':'", header.name),
        );
    }

    /// Property header name missing a colon.
    pub fn header_property_name_must_contain_colon(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::HeaderPropertyNameMustContainColon,
            &property.name,
            format!(
                "header name on property '{}' must contain ':'",
                property.name
            ),
        );
    }

    /// Property header default on a non-nullable type.
    pub fn header_property_with_value_must_be_nullable(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::HeaderPropertyWithValueMustBeNullable,
            &property.name,
            format!(
                "property '{}' has a header default, so its type '{}' must be nullable",
                property.name, property.ty.name
            ),
        );
    }

    /// Parameter header carries a value literal.
    pub fn header_parameter_must_not_have_value(
        &mut self,
        method: &MethodModel,
        param: &ParameterModel,
    ) {
        self.report(
            DiagnosticCode::HeaderParameterMustNotHaveValue,
            format!("{}::{}", method.name, param.name),
            format!(
                "header on parameter '{}' of method '{}' must not have a value",
                param.name, method.name
            ),
        );
    }

    /// Status-code override declared on an inherited interface.
    pub fn allow_any_status_code_not_allowed_on_parent(&mut self, type_name: &str, parent: &str) {
        self.report(
            DiagnosticCode::AllowAnyStatusCodeNotAllowedOnParent,
            type_name,
            format!(
                "accepting any status code must be declared on '{type_name}' itself, not inherited from '{parent}'"
            ),
        );
    }

    /// The interface declares an event.
    pub fn event_not_allowed(&mut self, event: &EventModel) {
        self.report(
            DiagnosticCode::EventNotAllowed,
            &event.name,
            format!("event '{}' is not allowed on a client interface", event.name),
        );
    }

    /// Method missing its verb-and-path annotation.
    pub fn method_must_have_request_attribute(&mut self, method: &MethodModel) {
        self.report(
            DiagnosticCode::MethodMustHaveRequestAttribute,
            &method.name,
            format!(
                "method '{}' must have a verb and path annotation",
                method.name
            ),
        );
    }

    /// Return type not in the recognized set.
    pub fn method_must_have_valid_return_type(&mut self, method: &MethodModel) {
        self.report(
            DiagnosticCode::MethodMustHaveValidReturnType,
            &method.name,
            format!("method '{}' has an unsupported return type", method.name),
        );
    }

    /// More than one requester property.
    pub fn multiple_requester_properties(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::MultipleRequesterProperties,
            &property.name,
            format!(
                "property '{}' is a second requester property; only one is allowed",
                property.name
            ),
        );
    }

    /// Requester property carries other annotations.
    pub fn requester_property_must_have_zero_attributes(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::RequesterPropertyMustHaveZeroAttributes,
            &property.name,
            format!(
                "requester property '{}' must not carry annotations",
                property.name
            ),
        );
    }

    /// Requester property has a setter.
    pub fn property_must_be_read_only(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::PropertyMustBeReadOnly,
            &property.name,
            format!("requester property '{}' must be read-only", property.name),
        );
    }

    /// Non-requester property missing a getter or setter.
    pub fn property_must_be_read_write(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::PropertyMustBeReadWrite,
            &property.name,
            format!(
                "property '{}' must have both a getter and a setter",
                property.name
            ),
        );
    }

    /// Non-requester property without exactly one relevant annotation.
    pub fn property_must_have_one_attribute(&mut self, property: &PropertyModel) {
        self.report(
            DiagnosticCode::PropertyMustHaveOneAttribute,
            &property.name,
            format!(
                "property '{}' must have exactly one annotation, found {}",
                property.name,
                property.attrs.len()
            ),
        );
    }

    /// Duplicate path-property key.
    pub fn multiple_path_properties_for_key(&mut self, key: &str, property: &PropertyModel) {
        self.report(
            DiagnosticCode::MultiplePathPropertiesForKey,
            key,
            format!(
                "property '{}' duplicates path key '{key}'",
                property.name
            ),
        );
    }

    /// Base-path placeholder with no matching path property.
    pub fn missing_path_property_for_base_path_placeholder(&mut self, key: &str, template: &str) {
        self.report(
            DiagnosticCode::MissingPathPropertyForBasePathPlaceholder,
            key,
            format!(
                "base path '{template}' placeholder '{{{key}}}' has no matching path property"
            ),
        );
    }

    /// Duplicate path-parameter key in one method.
    pub fn multiple_path_parameters_for_key(&mut self, method: &MethodModel, key: &str) {
        self.report(
            DiagnosticCode::MultiplePathParametersForKey,
            format!("{}::{key}", method.name),
            format!(
                "method '{}' has more than one path parameter for key '{key}'",
                method.name
            ),
        );
    }

    /// Method-path placeholder with no matching parameter or property.
    pub fn missing_path_property_or_parameter_for_placeholder(
        &mut self,
        method: &MethodModel,
        key: &str,
    ) {
        self.report(
            DiagnosticCode::MissingPathPropertyOrParameterForPlaceholder,
            key,
            format!(
                "placeholder '{{{key}}}' in method '{}' has no matching path parameter or property",
                method.name
            ),
        );
    }

    /// Path parameter unused by the method's template.
    pub fn missing_placeholder_for_path_parameter(&mut self, method: &MethodModel, key: &str) {
        self.report(
            DiagnosticCode::MissingPlaceholderForPathParameter,
            key,
            format!(
                "path parameter '{key}' of method '{}' has no placeholder in the path template",
                method.name
            ),
        );
    }

    /// More than one body parameter.
    pub fn multiple_body_parameters(&mut self, method: &MethodModel, param: &ParameterModel) {
        self.report(
            DiagnosticCode::MultipleBodyParameters,
            format!("{}::{}", method.name, param.name),
            format!(
                "parameter '{}' is a second body parameter on method '{}'",
                param.name, method.name
            ),
        );
    }

    /// More than one cancellation-token parameter.
    pub fn multiple_cancellation_token_parameters(
        &mut self,
        method: &MethodModel,
        param: &ParameterModel,
    ) {
        self.report(
            DiagnosticCode::MultipleCancellationTokenParameters,
            format!("{}::{}", method.name, param.name),
            format!(
                "parameter '{}' is a second cancellation token on method '{}'",
                param.name, method.name
            ),
        );
    }

    /// Cancellation-token parameter carries annotations.
    pub fn cancellation_token_must_have_zero_attributes(
        &mut self,
        method: &MethodModel,
        param: &ParameterModel,
    ) {
        self.report(
            DiagnosticCode::CancellationTokenMustHaveZeroAttributes,
            format!("{}::{}", method.name, param.name),
            format!(
                "cancellation token '{}' of method '{}' must not carry annotations",
                param.name, method.name
            ),
        );
    }

    /// Parameter carries more than one annotation.
    pub fn parameter_must_have_zero_or_one_attributes(
        &mut self,
        method: &MethodModel,
        param: &ParameterModel,
    ) {
        self.report(
            DiagnosticCode::ParameterMustHaveZeroOrOneAttributes,
            format!("{}::{}", method.name, param.name),
            format!(
                "parameter '{}' of method '{}' carries {} annotations; at most one is allowed",
                param.name,
                method.name,
                param.attrs.len()
            ),
        );
    }

    /// Query-map parameter type is not a key-value mapping.
    pub fn query_map_parameter_is_not_a_dictionary(
        &mut self,
        method: &MethodModel,
        param: &ParameterModel,
    ) {
        self.report(
            DiagnosticCode::QueryMapParameterIsNotADictionary,
            format!("{}::{}", method.name, param.name),
            format!(
                "query-map parameter '{}' of method '{}' has type '{}', which is not a key-value mapping",
                param.name, method.name, param.ty.name
            ),
        );
    }

    /// Duplicate message-property key in one method.
    pub fn duplicate_message_property_key(&mut self, method: &MethodModel, key: &str) {
        self.report(
            DiagnosticCode::DuplicateMessagePropertyKey,
            format!("{}::{key}", method.name),
            format!(
                "method '{}' attaches message property '{key}' more than once",
                method.name
            ),
        );
    }

    /// All findings in report order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    /// The codes of all findings, in report order.
    #[must_use]
    pub fn codes(&self) -> Vec<DiagnosticCode> {
        self.items.iter().map(|d| d.code).collect()
    }

    /// Whether any error-severity finding was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.items
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the sink is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TypeRef;

    #[test]
    fn reporting_accumulates_in_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        assert!(!diags.has_errors());

        let event = EventModel::new("Changed");
        let header = HeaderAttr::with_value("X:Bad", "v");
        diags.event_not_allowed(&event);
        diags.header_name_must_not_contain_colon(&header);

        assert_eq!(diags.len(), 2);
        assert!(diags.has_errors());
        assert_eq!(
            diags.codes(),
            vec![
                DiagnosticCode::EventNotAllowed,
                DiagnosticCode::HeaderNameMustNotContainColon,
            ]
        );
    }

    #[test]
    fn diagnostic_display_names_the_subject() {
        let mut diags = Diagnostics::new();
        let property = PropertyModel::new("api_key", TypeRef::new("String"));
        diags.header_property_name_must_contain_colon(&property);

        let rendered = diags.iter().next().expect("one finding").to_string();
        assert!(rendered.contains("HeaderPropertyNameMustContainColon"));
        assert!(rendered.contains("api_key"));
    }

    #[test]
    fn no_deduplication() {
        let mut diags = Diagnostics::new();
        let event = EventModel::new("Changed");
        diags.event_not_allowed(&event);
        diags.event_not_allowed(&event);
        assert_eq!(diags.len(), 2);
    }
}
