//! The runtime plan backend.
//!
//! Each emission operation appends a tagged record to an ordered list; the
//! finished [`ClientPlan`] is an immutable, shareable artifact. Invoking a
//! method plan walks its records with the call's property and argument
//! values, assembles a [`RequestDescription`], and dispatches the matching
//! requester entry point.

use bytes::Bytes;
use chela_core::{
    BodySerializationMethod, BodyStream, CancellationToken, Error, Method, PathSerializationMethod,
    QuerySerializationMethod, RequestDescription, Requester, Response, ResponseMessage, Result,
    Value, canonical_string,
};

use crate::emit::{Emitter, EmittedProperty, MethodEmitter, TypeEmitter};
use crate::model::{HeaderAttr, MethodModel, PropertyModel, RequestAttr, ReturnType, TypeModel};

/// One tagged emission record.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOp {
    /// Accept any response status code.
    SetAllowAnyStatusCode,
    /// Prepend the base-path template.
    SetBasePath {
        /// Base-path template.
        template: String,
    },
    /// A type-level header baked in at generation time.
    TypeHeader {
        /// Header name.
        name: String,
        /// Header value.
        value: String,
    },
    /// A header fed from a property slot.
    HeaderProperty {
        /// Property slot.
        slot: usize,
        /// Wire header name.
        name: String,
        /// Default used when the property value is null.
        default: Option<String>,
    },
    /// A path substitution fed from a property slot.
    PathProperty {
        /// Property slot.
        slot: usize,
        /// Placeholder key.
        key: String,
        /// Rendering method.
        method: PathSerializationMethod,
    },
    /// A query entry fed from a property slot.
    QueryProperty {
        /// Property slot.
        slot: usize,
        /// Query name.
        name: String,
        /// Rendering method.
        method: QuerySerializationMethod,
    },
    /// A message property fed from a property slot.
    MessagePropertyProperty {
        /// Property slot.
        slot: usize,
        /// Property key.
        key: String,
    },
    /// A method-level header.
    MethodHeader {
        /// Header name.
        name: String,
        /// Header value; a valueless header contributes nothing.
        value: Option<String>,
    },
    /// The cancellation-token argument.
    CancellationToken {
        /// Argument index.
        arg: usize,
    },
    /// A header argument.
    HeaderParameter {
        /// Argument index.
        arg: usize,
        /// Header name.
        name: String,
    },
    /// A path-substitution argument.
    PathParameter {
        /// Argument index.
        arg: usize,
        /// Placeholder key.
        key: String,
        /// Rendering method.
        method: PathSerializationMethod,
    },
    /// A query argument.
    QueryParameter {
        /// Argument index.
        arg: usize,
        /// Query name.
        name: String,
        /// Rendering method.
        method: QuerySerializationMethod,
    },
    /// A message-property argument.
    MessagePropertyParameter {
        /// Argument index.
        arg: usize,
        /// Property key.
        key: String,
    },
    /// A raw query-string argument.
    RawQueryStringParameter {
        /// Argument index.
        arg: usize,
    },
    /// A query-map argument expanded entry by entry.
    QueryMapParameter {
        /// Argument index.
        arg: usize,
        /// Rendering method for every entry value.
        method: QuerySerializationMethod,
    },
    /// The body argument.
    BodyParameter {
        /// Argument index.
        arg: usize,
        /// Encoding method.
        method: BodySerializationMethod,
    },
}

/// The dispatch shape of a method's return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Discard the response body.
    Void,
    /// Deserialize the response body.
    Json,
    /// Return the raw response message.
    ResponseMessage,
    /// Deserialize the body and keep the response message.
    Response,
    /// Return raw body bytes.
    Bytes,
    /// Return the body as text.
    Text,
    /// Return the body as a chunk stream.
    Stream,
}

impl ReturnShape {
    fn of(return_type: &ReturnType) -> Option<Self> {
        match return_type {
            ReturnType::FutureVoid => Some(Self::Void),
            ReturnType::FutureJson(_) => Some(Self::Json),
            ReturnType::FutureResponseMessage => Some(Self::ResponseMessage),
            ReturnType::FutureResponse(_) => Some(Self::Response),
            ReturnType::FutureBytes => Some(Self::Bytes),
            ReturnType::FutureString => Some(Self::Text),
            ReturnType::FutureStream => Some(Self::Stream),
            ReturnType::Other(_) => None,
        }
    }
}

/// One argument value at invocation time.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A dynamic value.
    Value(Value),
    /// A cancellation token.
    Token(CancellationToken),
}

impl Arg {
    fn value(&self) -> Result<&Value> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Token(_) => Err(Error::argument(
                "expected a value argument, found a cancellation token",
            )),
        }
    }

    fn token(&self) -> Result<&CancellationToken> {
        match self {
            Self::Token(token) => Ok(token),
            Self::Value(_) => Err(Error::argument(
                "expected a cancellation token, found a value argument",
            )),
        }
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<CancellationToken> for Arg {
    fn from(token: CancellationToken) -> Self {
        Self::Token(token)
    }
}

/// The result of invoking a method plan.
pub enum Invoked {
    /// The response body was discarded.
    Void,
    /// The deserialized response body.
    Json(Value),
    /// The raw response message.
    ResponseMessage(ResponseMessage),
    /// The deserialized body with its response message.
    Response(Response<Value>),
    /// Raw body bytes.
    Bytes(Bytes),
    /// The body as text.
    Text(String),
    /// The body as a chunk stream.
    Stream(BodyStream),
}

impl Invoked {
    /// The deserialized body, when the method returned one.
    #[must_use]
    pub fn json(self) -> Option<Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The raw response message, when the method returned one.
    #[must_use]
    pub fn response_message(self) -> Option<ResponseMessage> {
        match self {
            Self::ResponseMessage(message) => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Invoked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Void => f.write_str("Void"),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::ResponseMessage(message) => {
                f.debug_tuple("ResponseMessage").field(message).finish()
            }
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(bytes).finish(),
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// The plan for one request method.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodPlan {
    name: String,
    verb: Method,
    path: String,
    ops: Vec<PlanOp>,
    return_shape: Option<ReturnShape>,
}

impl MethodPlan {
    /// Method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP verb.
    #[must_use]
    pub const fn verb(&self) -> Method {
        self.verb
    }

    /// Relative path template.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The recorded operations, in emission order.
    #[must_use]
    pub fn ops(&self) -> &[PlanOp] {
        &self.ops
    }

    /// The dispatch shape, absent when the return type was rejected.
    #[must_use]
    pub const fn return_shape(&self) -> Option<ReturnShape> {
        self.return_shape
    }

    /// Walk the operations and assemble a request description.
    ///
    /// `properties` holds the current property values by slot; `args` holds
    /// the call's arguments in declaration order. Null optional values skip
    /// their contribution.
    ///
    /// # Errors
    ///
    /// Returns an error when an argument has the wrong shape for its
    /// recorded role.
    pub fn build_description(&self, properties: &[Value], args: &[Arg]) -> Result<RequestDescription> {
        let mut desc = RequestDescription::new(self.verb, self.path.as_str());
        desc.set_method_name(self.name.clone());

        for op in &self.ops {
            match op {
                PlanOp::SetAllowAnyStatusCode => desc.set_allow_any_status_code(true),
                PlanOp::SetBasePath { template } => desc.set_base_path(template.as_str()),
                PlanOp::TypeHeader { name, value } => desc.add_header(name, value),
                PlanOp::HeaderProperty {
                    slot,
                    name,
                    default,
                } => {
                    let value = property_value(properties, *slot);
                    if value.is_null() {
                        if let Some(default) = default {
                            desc.add_header(name, default);
                        }
                    } else {
                        desc.add_header(name, canonical_string(value));
                    }
                }
                PlanOp::PathProperty { slot, key, method } => {
                    desc.add_path_param(key, property_value(properties, *slot).clone(), *method);
                }
                PlanOp::QueryProperty { slot, name, method } => {
                    let value = property_value(properties, *slot);
                    if !value.is_null() {
                        desc.add_query_param(name, value.clone(), *method);
                    }
                }
                PlanOp::MessagePropertyProperty { slot, key } => {
                    desc.add_message_property(key, property_value(properties, *slot).clone());
                }
                PlanOp::MethodHeader { name, value } => {
                    if let Some(value) = value {
                        desc.add_header(name, value);
                    }
                }
                PlanOp::CancellationToken { arg } => {
                    desc.set_cancellation_token(argument(args, *arg)?.token()?.clone());
                }
                PlanOp::HeaderParameter { arg, name } => {
                    let value = argument(args, *arg)?.value()?;
                    if !value.is_null() {
                        desc.add_header(name, canonical_string(value));
                    }
                }
                PlanOp::PathParameter { arg, key, method } => {
                    desc.add_path_param(key, argument(args, *arg)?.value()?.clone(), *method);
                }
                PlanOp::QueryParameter { arg, name, method } => {
                    let value = argument(args, *arg)?.value()?;
                    if !value.is_null() {
                        desc.add_query_param(name, value.clone(), *method);
                    }
                }
                PlanOp::MessagePropertyParameter { arg, key } => {
                    desc.add_message_property(key, argument(args, *arg)?.value()?.clone());
                }
                PlanOp::RawQueryStringParameter { arg } => {
                    let value = argument(args, *arg)?.value()?;
                    if !value.is_null() {
                        desc.add_raw_query(canonical_string(value));
                    }
                }
                PlanOp::QueryMapParameter { arg, method } => {
                    let value = argument(args, *arg)?.value()?;
                    if value.is_null() {
                        continue;
                    }
                    let entries = value.as_object().ok_or_else(|| {
                        Error::argument(format!(
                            "query-map argument {arg} of '{}' is not an object",
                            self.name
                        ))
                    })?;
                    for (name, entry) in entries {
                        if !entry.is_null() {
                            desc.add_query_param(name, entry.clone(), *method);
                        }
                    }
                }
                PlanOp::BodyParameter { arg, method } => {
                    let value = argument(args, *arg)?.value()?;
                    if !value.is_null() {
                        desc.set_body(value.clone(), *method);
                    }
                }
            }
        }

        Ok(desc)
    }

    /// Assemble a description and dispatch it against the requester.
    ///
    /// # Errors
    ///
    /// Returns an error when the description cannot be assembled, when the
    /// return type was rejected at generation time, or when the requester
    /// fails.
    pub async fn invoke<R: Requester>(
        &self,
        requester: &R,
        properties: &[Value],
        args: &[Arg],
    ) -> Result<Invoked> {
        let Some(shape) = self.return_shape else {
            return Err(Error::argument(format!(
                "method '{}' has an unsupported return type and cannot be invoked",
                self.name
            )));
        };
        let desc = self.build_description(properties, args)?;
        match shape {
            ReturnShape::Void => requester.request_void(desc).await.map(|()| Invoked::Void),
            ReturnShape::Json => requester.request_json(desc).await.map(Invoked::Json),
            ReturnShape::ResponseMessage => requester
                .request_response_message(desc)
                .await
                .map(Invoked::ResponseMessage),
            ReturnShape::Response => requester
                .request_response(desc)
                .await
                .map(Invoked::Response),
            ReturnShape::Bytes => requester.request_raw_bytes(desc).await.map(Invoked::Bytes),
            ReturnShape::Text => requester.request_raw_string(desc).await.map(Invoked::Text),
            ReturnShape::Stream => requester
                .request_raw_stream(desc)
                .await
                .map(Invoked::Stream),
        }
    }
}

fn property_value<'a>(properties: &'a [Value], slot: usize) -> &'a Value {
    properties.get(slot).unwrap_or(&Value::Null)
}

fn argument<'a>(args: &'a [Arg], index: usize) -> Result<&'a Arg> {
    args.get(index)
        .ok_or_else(|| Error::argument(format!("missing argument {index}")))
}

/// A property slot of the generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySlot {
    /// Property name.
    pub name: String,
}

/// The immutable artifact of the runtime backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientPlan {
    type_name: String,
    properties: Vec<PropertySlot>,
    requester_property: Option<String>,
    methods: Vec<MethodPlan>,
    dispose_method: Option<String>,
}

impl ClientPlan {
    /// Name of the interface this plan implements.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Property slots in declaration order.
    #[must_use]
    pub fn properties(&self) -> &[PropertySlot] {
        &self.properties
    }

    /// Name of the requester property, if the interface declared one.
    #[must_use]
    pub fn requester_property(&self) -> Option<&str> {
        self.requester_property.as_deref()
    }

    /// Method plans in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodPlan] {
        &self.methods
    }

    /// Look up a method plan by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodPlan> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Name of the dispose method, if the interface declared one.
    #[must_use]
    pub fn dispose_method(&self) -> Option<&str> {
        self.dispose_method.as_deref()
    }

    /// Release the requester, as the dispose method would.
    pub fn dispose<R: Requester>(&self, requester: &R) {
        requester.dispose();
    }
}

/// The runtime plan backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanEmitter;

impl Emitter for PlanEmitter {
    type Output = ClientPlan;
    type TypeEmitter = PlanTypeEmitter;

    fn emit_type(&self, model: &TypeModel) -> PlanTypeEmitter {
        let type_headers: Vec<(String, String)> = model
            .headers
            .iter()
            .filter_map(|declared| {
                let header = &declared.attr;
                header
                    .value
                    .as_ref()
                    .map(|value| (header.name.clone(), value.clone()))
            })
            .collect();
        PlanTypeEmitter {
            plan: ClientPlan {
                type_name: model.name.clone(),
                properties: Vec::new(),
                requester_property: None,
                methods: Vec::new(),
                dispose_method: None,
            },
            type_headers,
        }
    }
}

/// Per-type state of the runtime backend.
#[derive(Debug)]
pub struct PlanTypeEmitter {
    plan: ClientPlan,
    type_headers: Vec<(String, String)>,
}

impl TypeEmitter for PlanTypeEmitter {
    type Output = ClientPlan;
    type MethodEmitter = PlanMethodEmitter;

    fn emit_requester_property(&mut self, property: &PropertyModel) {
        if self.plan.requester_property.is_none() {
            self.plan.requester_property = Some(property.name.clone());
        }
    }

    fn emit_property(&mut self, property: &PropertyModel) -> EmittedProperty {
        let slot = self.plan.properties.len();
        self.plan.properties.push(PropertySlot {
            name: property.name.clone(),
        });
        EmittedProperty {
            slot,
            name: property.name.clone(),
        }
    }

    fn emit_method(&mut self, method: &MethodModel, request: &RequestAttr) -> PlanMethodEmitter {
        let ops = self
            .type_headers
            .iter()
            .map(|(name, value)| PlanOp::TypeHeader {
                name: name.clone(),
                value: value.clone(),
            })
            .collect();
        PlanMethodEmitter {
            plan: MethodPlan {
                name: method.name.clone(),
                verb: request.method,
                path: request.path.clone(),
                ops,
                return_shape: None,
            },
        }
    }

    fn finish_method(&mut self, method: PlanMethodEmitter) {
        self.plan.methods.push(method.plan);
    }

    fn emit_dispose_method(&mut self, method: &MethodModel) {
        self.plan.dispose_method = Some(method.name.clone());
    }

    fn generate(self) -> ClientPlan {
        self.plan
    }
}

/// Per-method state of the runtime backend.
#[derive(Debug)]
pub struct PlanMethodEmitter {
    plan: MethodPlan,
}

impl MethodEmitter for PlanMethodEmitter {
    fn set_allow_any_status_code(&mut self) {
        self.plan.ops.push(PlanOp::SetAllowAnyStatusCode);
    }

    fn set_base_path(&mut self, template: &str) {
        self.plan.ops.push(PlanOp::SetBasePath {
            template: template.to_string(),
        });
    }

    fn add_header_property(&mut self, property: &EmittedProperty, header: &HeaderAttr) {
        self.plan.ops.push(PlanOp::HeaderProperty {
            slot: property.slot,
            name: header.wire_name().to_string(),
            default: header.value.clone(),
        });
    }

    fn add_path_property(
        &mut self,
        property: &EmittedProperty,
        key: &str,
        method: PathSerializationMethod,
    ) {
        self.plan.ops.push(PlanOp::PathProperty {
            slot: property.slot,
            key: key.to_string(),
            method,
        });
    }

    fn add_query_property(
        &mut self,
        property: &EmittedProperty,
        name: &str,
        method: QuerySerializationMethod,
    ) {
        self.plan.ops.push(PlanOp::QueryProperty {
            slot: property.slot,
            name: name.to_string(),
            method,
        });
    }

    fn add_message_property_property(&mut self, property: &EmittedProperty, key: &str) {
        self.plan.ops.push(PlanOp::MessagePropertyProperty {
            slot: property.slot,
            key: key.to_string(),
        });
    }

    fn add_method_header(&mut self, header: &HeaderAttr) {
        self.plan.ops.push(PlanOp::MethodHeader {
            name: header.name.clone(),
            value: header.value.clone(),
        });
    }

    fn set_cancellation_token(&mut self, index: usize) {
        self.plan.ops.push(PlanOp::CancellationToken { arg: index });
    }

    fn add_header_parameter(&mut self, index: usize, name: &str) {
        self.plan.ops.push(PlanOp::HeaderParameter {
            arg: index,
            name: name.to_string(),
        });
    }

    fn add_path_parameter(&mut self, index: usize, key: &str, method: PathSerializationMethod) {
        self.plan.ops.push(PlanOp::PathParameter {
            arg: index,
            key: key.to_string(),
            method,
        });
    }

    fn add_query_parameter(&mut self, index: usize, name: &str, method: QuerySerializationMethod) {
        self.plan.ops.push(PlanOp::QueryParameter {
            arg: index,
            name: name.to_string(),
            method,
        });
    }

    fn add_message_property_parameter(&mut self, index: usize, key: &str) {
        self.plan.ops.push(PlanOp::MessagePropertyParameter {
            arg: index,
            key: key.to_string(),
        });
    }

    fn add_raw_query_string_parameter(&mut self, index: usize) {
        self.plan
            .ops
            .push(PlanOp::RawQueryStringParameter { arg: index });
    }

    fn try_add_query_map_parameter(
        &mut self,
        index: usize,
        is_map: bool,
        method: QuerySerializationMethod,
    ) -> bool {
        if !is_map {
            return false;
        }
        self.plan.ops.push(PlanOp::QueryMapParameter {
            arg: index,
            method,
        });
        true
    }

    fn set_body_parameter(&mut self, index: usize, method: BodySerializationMethod) {
        self.plan.ops.push(PlanOp::BodyParameter {
            arg: index,
            method,
        });
    }

    fn try_emit_invocation(&mut self, return_type: &ReturnType) -> bool {
        match ReturnShape::of(return_type) {
            Some(shape) => {
                self.plan.return_shape = Some(shape);
                true
            }
            None => false,
        }
    }
}
