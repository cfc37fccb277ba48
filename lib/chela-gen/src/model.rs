//! The interface model consumed by the pipeline.
//!
//! A [`TypeModel`] is a passive description of one annotated service
//! interface: its type-level attributes, properties, methods, parameters,
//! and (always-rejected) events. It is produced by a collaborator - a
//! macro, a static analyzer, or a hand-authored descriptor - and is
//! immutable once built.
//!
//! Attribute multiplicity is deliberately not typed away: a property or
//! parameter carries a *list* of annotations so the validator can report
//! on models a stricter type would make unrepresentable.

use chela_core::{
    BodySerializationMethod, Method, PathSerializationMethod, QuerySerializationMethod,
};

/// A declared type: its display name plus the shape facts the pipeline
/// needs (nullability, key-value-mapping-ness).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Type name as written in the interface declaration.
    pub name: String,
    /// Whether the type admits an absent value.
    pub nullable: bool,
    /// Whether the type is a key-value mapping (query-map eligibility).
    pub is_map: bool,
}

impl TypeRef {
    /// A plain, non-nullable type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
            is_map: false,
        }
    }

    /// A nullable type.
    #[must_use]
    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            nullable: true,
            ..Self::new(name)
        }
    }

    /// A key-value mapping type.
    #[must_use]
    pub fn map(name: impl Into<String>) -> Self {
        Self {
            is_map: true,
            ..Self::new(name)
        }
    }
}

/// Which interface in the inheritance chain declared an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// Declared on the interface being generated.
    Leaf,
    /// Inherited from a parent interface.
    Parent(String),
}

impl Origin {
    /// Whether the attribute was declared on the leaf interface.
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf)
    }
}

/// An attribute together with the interface that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declared<A> {
    /// The attribute payload.
    pub attr: A,
    /// The declaring interface.
    pub origin: Origin,
}

impl<A> Declared<A> {
    /// An attribute declared on the leaf interface.
    #[must_use]
    pub fn leaf(attr: A) -> Self {
        Self {
            attr,
            origin: Origin::Leaf,
        }
    }

    /// An attribute inherited from `parent`.
    #[must_use]
    pub fn inherited(attr: A, parent: impl Into<String>) -> Self {
        Self {
            attr,
            origin: Origin::Parent(parent.into()),
        }
    }
}

/// A header annotation: a name and an optional value literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderAttr {
    /// Header name.
    pub name: String,
    /// Value literal (interface/method headers) or default (properties).
    pub value: Option<String>,
}

impl HeaderAttr {
    /// A header with no value literal.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// A header with a value literal.
    #[must_use]
    pub fn with_value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    /// The wire name: everything before the first `:`, trimmed.
    ///
    /// Property headers embed a trailing colon in the declared name; the
    /// wire name strips it.
    #[must_use]
    pub fn wire_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(name, _)| name)
            .trim()
    }
}

/// A base-path annotation on the interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasePathAttr {
    /// Base-path template prepended to every method path.
    pub template: String,
}

impl BasePathAttr {
    /// Create a base-path annotation.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

/// Accept any response status code instead of only 2xx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AllowAnyStatusCodeAttr;

/// Default serialization methods, settable on the interface or a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializationMethodsAttr {
    /// Default for path values, if specified.
    pub path: Option<PathSerializationMethod>,
    /// Default for query values, if specified.
    pub query: Option<QuerySerializationMethod>,
    /// Default for bodies, if specified.
    pub body: Option<BodySerializationMethod>,
}

/// The verb-and-path annotation that makes a method a request method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestAttr {
    /// HTTP verb.
    pub method: Method,
    /// Relative path template.
    pub path: String,
}

impl RequestAttr {
    /// Create a request annotation.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

/// A path annotation on a property or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathAttr {
    /// Placeholder key override; the member name is used when absent.
    pub name: Option<String>,
    /// Serialization override; resolver precedence applies when absent.
    pub method: Option<PathSerializationMethod>,
}

impl PathAttr {
    /// A path annotation keyed by the member name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A path annotation with an explicit placeholder key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            method: None,
        }
    }

    /// Set the serialization override.
    #[must_use]
    pub fn with_method(mut self, method: PathSerializationMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// A query annotation on a property or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryAttr {
    /// Query name override; the member name is used when absent.
    pub name: Option<String>,
    /// Serialization override; resolver precedence applies when absent.
    pub method: Option<QuerySerializationMethod>,
}

impl QueryAttr {
    /// A query annotation keyed by the member name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A query annotation with an explicit name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            method: None,
        }
    }

    /// Set the serialization override.
    #[must_use]
    pub fn with_method(mut self, method: QuerySerializationMethod) -> Self {
        self.method = Some(method);
        self
    }
}

/// A query-map annotation on a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryMapAttr {
    /// Serialization override applied to every entry value.
    pub method: Option<QuerySerializationMethod>,
}

/// A body annotation on a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyAttr {
    /// Serialization override; resolver precedence applies when absent.
    pub method: Option<BodySerializationMethod>,
}

/// A message-property annotation on a property or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePropertyAttr {
    /// Property key override; the member name is used when absent.
    pub key: Option<String>,
}

impl MessagePropertyAttr {
    /// A message property keyed by the member name.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A message property with an explicit key.
    #[must_use]
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
        }
    }
}

/// The annotations a property may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAttr {
    /// Contribute a header to every request.
    Header(HeaderAttr),
    /// Contribute a path substitution to every request.
    Path(PathAttr),
    /// Contribute a query entry to every request.
    Query(QueryAttr),
    /// Contribute a message property to every request.
    MessageProperty(MessagePropertyAttr),
}

/// The annotations a parameter may carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterAttr {
    /// Send the argument as a header.
    Header(HeaderAttr),
    /// Substitute the argument into a path placeholder.
    Path(PathAttr),
    /// Send the argument as a query entry.
    Query(QueryAttr),
    /// Expand a key-value mapping argument into query entries.
    QueryMap(QueryMapAttr),
    /// Append the argument verbatim to the query string.
    RawQueryString,
    /// Send the argument as the request body.
    Body(BodyAttr),
    /// Attach the argument as a message property.
    MessageProperty(MessagePropertyAttr),
}

/// The resolved role a parameter plays in request construction.
///
/// Collapses the attribute-detection chain into a single match: a
/// cancellation token outranks annotations (their presence is a separate
/// diagnostic), the first annotation otherwise decides, and an
/// unannotated parameter is an implicit query entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRole<'a> {
    /// Cooperative-cancellation handle.
    CancellationToken,
    /// Header argument.
    Header(&'a HeaderAttr),
    /// Path substitution argument.
    Path(&'a PathAttr),
    /// Query argument.
    Query(&'a QueryAttr),
    /// Query-map argument.
    QueryMap(&'a QueryMapAttr),
    /// Raw query-string argument.
    RawQueryString,
    /// Body argument.
    Body(&'a BodyAttr),
    /// Message-property argument.
    MessageProperty(&'a MessagePropertyAttr),
    /// Unannotated: implicit query argument with default serialization.
    Implicit,
}

/// One property of the interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyModel {
    /// Property name.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Whether the property has a getter.
    pub has_getter: bool,
    /// Whether the property has a setter.
    pub has_setter: bool,
    /// Whether the declared type is the injected requester capability.
    pub is_requester: bool,
    /// Annotations, in declaration order.
    pub attrs: Vec<PropertyAttr>,
}

impl PropertyModel {
    /// A read-write property with no annotations.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            has_getter: true,
            has_setter: true,
            is_requester: false,
            attrs: Vec::new(),
        }
    }

    /// The read-only requester property.
    #[must_use]
    pub fn requester(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new("Requester"),
            has_getter: true,
            has_setter: false,
            is_requester: true,
            attrs: Vec::new(),
        }
    }

    /// Add an annotation.
    #[must_use]
    pub fn with_attr(mut self, attr: PropertyAttr) -> Self {
        self.attrs.push(attr);
        self
    }

    /// Drop the setter.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.has_setter = false;
        self
    }

    /// The path key this property fills, when path-annotated.
    #[must_use]
    pub fn path_key(&self) -> Option<&str> {
        self.attrs.iter().find_map(|attr| match attr {
            PropertyAttr::Path(path) => Some(path.name.as_deref().unwrap_or(&self.name)),
            _ => None,
        })
    }
}

/// One parameter of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterModel {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub ty: TypeRef,
    /// Whether the declared type is the cooperative-cancellation capability.
    pub is_cancellation_token: bool,
    /// Annotations, in declaration order.
    pub attrs: Vec<ParameterAttr>,
}

impl ParameterModel {
    /// An unannotated parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            is_cancellation_token: false,
            attrs: Vec::new(),
        }
    }

    /// A cancellation-token parameter.
    #[must_use]
    pub fn cancellation_token(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeRef::new("CancellationToken"),
            is_cancellation_token: true,
            attrs: Vec::new(),
        }
    }

    /// Add an annotation.
    #[must_use]
    pub fn with_attr(mut self, attr: ParameterAttr) -> Self {
        self.attrs.push(attr);
        self
    }

    /// The role this parameter plays in request construction.
    #[must_use]
    pub fn role(&self) -> ParameterRole<'_> {
        if self.is_cancellation_token {
            return ParameterRole::CancellationToken;
        }
        match self.attrs.first() {
            Some(ParameterAttr::Header(attr)) => ParameterRole::Header(attr),
            Some(ParameterAttr::Path(attr)) => ParameterRole::Path(attr),
            Some(ParameterAttr::Query(attr)) => ParameterRole::Query(attr),
            Some(ParameterAttr::QueryMap(attr)) => ParameterRole::QueryMap(attr),
            Some(ParameterAttr::RawQueryString) => ParameterRole::RawQueryString,
            Some(ParameterAttr::Body(attr)) => ParameterRole::Body(attr),
            Some(ParameterAttr::MessageProperty(attr)) => ParameterRole::MessageProperty(attr),
            None => ParameterRole::Implicit,
        }
    }

    /// The path key this parameter fills, when path-annotated.
    #[must_use]
    pub fn path_key(&self) -> Option<&str> {
        match self.role() {
            ParameterRole::Path(attr) => Some(attr.name.as_deref().unwrap_or(&self.name)),
            _ => None,
        }
    }

    /// The message-property key, when message-property-annotated.
    #[must_use]
    pub fn message_property_key(&self) -> Option<&str> {
        match self.role() {
            ParameterRole::MessageProperty(attr) => {
                Some(attr.key.as_deref().unwrap_or(&self.name))
            }
            _ => None,
        }
    }
}

/// The declared return type of a method.
///
/// Request methods return a future of one of the recognized shapes; any
/// other declared type is preserved for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnType {
    /// Future of unit.
    FutureVoid,
    /// Future of a deserialized value of the given type.
    FutureJson(TypeRef),
    /// Future of the raw response message.
    FutureResponseMessage,
    /// Future of a deserialized value paired with its response message.
    FutureResponse(TypeRef),
    /// Future of raw body bytes.
    FutureBytes,
    /// Future of the body as text.
    FutureString,
    /// Future of the body as a chunk stream.
    FutureStream,
    /// Anything else; rejected at emission time.
    Other(String),
}

/// One method of the interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodModel {
    /// Method name.
    pub name: String,
    /// Declared return type.
    pub return_type: ReturnType,
    /// Parameters, in declaration order.
    pub params: Vec<ParameterModel>,
    /// Whether this is the resource-release method.
    pub is_dispose: bool,
    /// Verb-and-path annotation; absent on unannotated methods.
    pub request: Option<RequestAttr>,
    /// Method-level status-code override.
    pub allow_any_status_code: Option<AllowAnyStatusCodeAttr>,
    /// Method-level serialization defaults.
    pub serialization_methods: Option<SerializationMethodsAttr>,
    /// Method-level headers, in declaration order.
    pub headers: Vec<HeaderAttr>,
}

impl MethodModel {
    /// A request method.
    #[must_use]
    pub fn new(name: impl Into<String>, request: RequestAttr, return_type: ReturnType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            is_dispose: false,
            request: Some(request),
            allow_any_status_code: None,
            serialization_methods: None,
            headers: Vec::new(),
        }
    }

    /// A method with no verb-and-path annotation.
    #[must_use]
    pub fn unannotated(name: impl Into<String>, return_type: ReturnType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
            is_dispose: false,
            request: None,
            allow_any_status_code: None,
            serialization_methods: None,
            headers: Vec::new(),
        }
    }

    /// The resource-release method.
    #[must_use]
    pub fn dispose(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_type: ReturnType::FutureVoid,
            params: Vec::new(),
            is_dispose: true,
            request: None,
            allow_any_status_code: None,
            serialization_methods: None,
            headers: Vec::new(),
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParameterModel) -> Self {
        self.params.push(param);
        self
    }

    /// Add a method-level header.
    #[must_use]
    pub fn with_header(mut self, header: HeaderAttr) -> Self {
        self.headers.push(header);
        self
    }

    /// Accept any response status code for this method.
    #[must_use]
    pub fn allow_any_status_code(mut self) -> Self {
        self.allow_any_status_code = Some(AllowAnyStatusCodeAttr);
        self
    }

    /// Set the method-level serialization defaults.
    #[must_use]
    pub fn with_serialization_methods(mut self, attr: SerializationMethodsAttr) -> Self {
        self.serialization_methods = Some(attr);
        self
    }
}

/// An event declaration. Events are always rejected; the model carries
/// them so the rejection can name them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventModel {
    /// Event name.
    pub name: String,
}

impl EventModel {
    /// Create an event declaration.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// One annotated interface, ready for validation and emission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeModel {
    /// Interface name.
    pub name: String,
    /// Type-level headers, with their declaring interface.
    pub headers: Vec<Declared<HeaderAttr>>,
    /// Base-path template, with its declaring interface.
    pub base_path: Option<Declared<BasePathAttr>>,
    /// Type-level status-code override, with its declaring interface.
    pub allow_any_status_code: Option<Declared<AllowAnyStatusCodeAttr>>,
    /// Type-level serialization defaults.
    pub serialization_methods: Option<SerializationMethodsAttr>,
    /// Properties, in declaration order.
    pub properties: Vec<PropertyModel>,
    /// Methods, in declaration order.
    pub methods: Vec<MethodModel>,
    /// Event declarations, in declaration order.
    pub events: Vec<EventModel>,
}

impl TypeModel {
    /// An empty interface model.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            headers: Vec::new(),
            base_path: None,
            allow_any_status_code: None,
            serialization_methods: None,
            properties: Vec::new(),
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Add a type-level header declared on the leaf interface.
    #[must_use]
    pub fn with_header(mut self, header: HeaderAttr) -> Self {
        self.headers.push(Declared::leaf(header));
        self
    }

    /// Set the base path.
    #[must_use]
    pub fn with_base_path(mut self, template: impl Into<String>) -> Self {
        self.base_path = Some(Declared::leaf(BasePathAttr::new(template)));
        self
    }

    /// Accept any response status code, declared on the leaf interface.
    #[must_use]
    pub fn allow_any_status_code(mut self) -> Self {
        self.allow_any_status_code = Some(Declared::leaf(AllowAnyStatusCodeAttr));
        self
    }

    /// Set the type-level serialization defaults.
    #[must_use]
    pub fn with_serialization_methods(mut self, attr: SerializationMethodsAttr) -> Self {
        self.serialization_methods = Some(attr);
        self
    }

    /// Add a property.
    #[must_use]
    pub fn with_property(mut self, property: PropertyModel) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method.
    #[must_use]
    pub fn with_method(mut self, method: MethodModel) -> Self {
        self.methods.push(method);
        self
    }

    /// Add an event declaration.
    #[must_use]
    pub fn with_event(mut self, event: EventModel) -> Self {
        self.events.push(event);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_role_cancellation_token_outranks_attrs() {
        let param = ParameterModel::cancellation_token("token")
            .with_attr(ParameterAttr::Query(QueryAttr::new()));
        assert_eq!(param.role(), ParameterRole::CancellationToken);
    }

    #[test]
    fn parameter_role_first_attr_wins() {
        let param = ParameterModel::new("id", TypeRef::new("u64"))
            .with_attr(ParameterAttr::Path(PathAttr::new()))
            .with_attr(ParameterAttr::Query(QueryAttr::new()));
        assert!(matches!(param.role(), ParameterRole::Path(_)));
    }

    #[test]
    fn parameter_role_implicit_when_unannotated() {
        let param = ParameterModel::new("q", TypeRef::new("String"));
        assert_eq!(param.role(), ParameterRole::Implicit);
    }

    #[test]
    fn path_key_defaults_to_member_name() {
        let param = ParameterModel::new("id", TypeRef::new("u64"))
            .with_attr(ParameterAttr::Path(PathAttr::new()));
        assert_eq!(param.path_key(), Some("id"));

        let param = ParameterModel::new("id", TypeRef::new("u64"))
            .with_attr(ParameterAttr::Path(PathAttr::named("userId")));
        assert_eq!(param.path_key(), Some("userId"));
    }

    #[test]
    fn property_path_key() {
        let property = PropertyModel::new("account_id", TypeRef::new("String"))
            .with_attr(PropertyAttr::Path(PathAttr::named("accountId")));
        assert_eq!(property.path_key(), Some("accountId"));

        let property = PropertyModel::new("account_id", TypeRef::new("String"));
        assert_eq!(property.path_key(), None);
    }

    #[test]
    fn header_wire_name_strips_colon() {
        assert_eq!(HeaderAttr::new("X-API-Key:").wire_name(), "X-API-Key");
        assert_eq!(HeaderAttr::new("X-Plain").wire_name(), "X-Plain");
    }

    #[test]
    fn requester_property_shape() {
        let property = PropertyModel::requester("requester");
        assert!(property.is_requester);
        assert!(property.has_getter);
        assert!(!property.has_setter);
        assert!(property.attrs.is_empty());
    }

    #[test]
    fn origin_is_leaf() {
        assert!(Origin::Leaf.is_leaf());
        assert!(!Origin::Parent("IBase".to_string()).is_leaf());
    }
}
