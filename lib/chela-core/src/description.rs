//! The request description produced by executing a generated plan.
//!
//! A [`RequestDescription`] is a mutable, builder-shaped record of everything
//! a method call contributes to a request: verb, templates, headers, query
//! values, path substitutions, message properties, body, and cancellation.
//! The [`Requester`] turns it into a physical request.
//!
//! [`Requester`]: crate::Requester

use bytes::Bytes;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::path_template::PathTemplate;
use crate::serialization::{
    BodySerializationMethod, ContentType, PathSerializationMethod, QuerySerializationMethod,
    Serializers, canonical_string,
};
use crate::{Method, Result};

/// A query entry: name, dynamic value, and how to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    /// Query parameter name.
    pub name: String,
    /// Dynamic value.
    pub value: Value,
    /// Rendering method.
    pub method: QuerySerializationMethod,
}

impl QueryParam {
    /// Render the value according to its serialization method.
    ///
    /// # Errors
    ///
    /// Returns an error if the delegated codec fails.
    pub fn render(&self, serializers: &Serializers) -> Result<String> {
        match self.method {
            QuerySerializationMethod::ToString => Ok(canonical_string(&self.value)),
            QuerySerializationMethod::Serialized => serializers.serialize_query_value(&self.value),
        }
    }
}

/// A path substitution: placeholder key, dynamic value, rendering method.
#[derive(Debug, Clone, PartialEq)]
pub struct PathParam {
    /// Placeholder key this substitution fills.
    pub key: String,
    /// Dynamic value.
    pub value: Value,
    /// Rendering method.
    pub method: PathSerializationMethod,
}

impl PathParam {
    /// Render the value according to its serialization method.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingPathValue`] for a null value, or the
    /// delegated codec's error.
    pub fn render(&self, serializers: &Serializers) -> Result<String> {
        if self.value.is_null() {
            return Err(crate::Error::MissingPathValue {
                key: self.key.clone(),
            });
        }
        match self.method {
            PathSerializationMethod::ToString => Ok(canonical_string(&self.value)),
            PathSerializationMethod::Serialized => serializers.serialize_path_value(&self.value),
        }
    }
}

/// A message property: an out-of-band key/value attached to the request.
///
/// Keys are case-sensitive.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageProperty {
    /// Property key.
    pub key: String,
    /// Dynamic value.
    pub value: Value,
}

/// The request body: a dynamic value plus its encoding method.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyParam {
    /// Dynamic value.
    pub value: Value,
    /// Encoding method.
    pub method: BodySerializationMethod,
}

/// Everything a single method invocation contributes to a request.
#[derive(Debug, Clone)]
pub struct RequestDescription {
    method: Method,
    path: PathTemplate,
    base_path: Option<PathTemplate>,
    headers: Vec<(String, String)>,
    query_params: Vec<QueryParam>,
    path_params: Vec<PathParam>,
    raw_query: Vec<String>,
    message_properties: Vec<MessageProperty>,
    body: Option<BodyParam>,
    allow_any_status_code: bool,
    cancellation_token: Option<CancellationToken>,
    method_name: String,
}

impl RequestDescription {
    /// Create a description for a verb and relative path template.
    #[must_use]
    pub fn new(method: Method, path: impl Into<PathTemplate>) -> Self {
        Self {
            method,
            path: path.into(),
            base_path: None,
            headers: Vec::new(),
            query_params: Vec::new(),
            path_params: Vec::new(),
            raw_query: Vec::new(),
            message_properties: Vec::new(),
            body: None,
            allow_any_status_code: false,
            cancellation_token: None,
            method_name: String::new(),
        }
    }

    /// Set the base-path template prepended before the relative path.
    pub fn set_base_path(&mut self, template: impl Into<PathTemplate>) {
        self.base_path = Some(template.into());
    }

    /// Set whether any response status code is accepted.
    pub fn set_allow_any_status_code(&mut self, allow: bool) {
        self.allow_any_status_code = allow;
    }

    /// Append a header. Order of insertion is preserved.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// Append a query entry. Order of insertion is preserved.
    pub fn add_query_param(
        &mut self,
        name: impl Into<String>,
        value: Value,
        method: QuerySerializationMethod,
    ) {
        self.query_params.push(QueryParam {
            name: name.into(),
            value,
            method,
        });
    }

    /// Append a path substitution.
    pub fn add_path_param(
        &mut self,
        key: impl Into<String>,
        value: Value,
        method: PathSerializationMethod,
    ) {
        self.path_params.push(PathParam {
            key: key.into(),
            value,
            method,
        });
    }

    /// Append a raw query-string fragment, used verbatim.
    pub fn add_raw_query(&mut self, fragment: impl Into<String>) {
        self.raw_query.push(fragment.into());
    }

    /// Append a message property.
    pub fn add_message_property(&mut self, key: impl Into<String>, value: Value) {
        self.message_properties.push(MessageProperty {
            key: key.into(),
            value,
        });
    }

    /// Set the request body.
    pub fn set_body(&mut self, value: Value, method: BodySerializationMethod) {
        self.body = Some(BodyParam { value, method });
    }

    /// Set the cooperative cancellation token for this request.
    pub fn set_cancellation_token(&mut self, token: CancellationToken) {
        self.cancellation_token = Some(token);
    }

    /// Record the name of the invoked method.
    pub fn set_method_name(&mut self, name: impl Into<String>) {
        self.method_name = name.into();
    }

    /// HTTP verb.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Relative path template.
    #[must_use]
    pub const fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// Base-path template, if any.
    #[must_use]
    pub const fn base_path(&self) -> Option<&PathTemplate> {
        self.base_path.as_ref()
    }

    /// Headers in insertion order.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Query entries in insertion order.
    #[must_use]
    pub fn query_params(&self) -> &[QueryParam] {
        &self.query_params
    }

    /// Path substitutions in insertion order.
    #[must_use]
    pub fn path_params(&self) -> &[PathParam] {
        &self.path_params
    }

    /// Raw query-string fragments in insertion order.
    #[must_use]
    pub fn raw_query(&self) -> &[String] {
        &self.raw_query
    }

    /// Message properties in insertion order.
    #[must_use]
    pub fn message_properties(&self) -> &[MessageProperty] {
        &self.message_properties
    }

    /// Request body, if any.
    #[must_use]
    pub const fn body(&self) -> Option<&BodyParam> {
        self.body.as_ref()
    }

    /// Whether any response status code is accepted.
    #[must_use]
    pub const fn allow_any_status_code(&self) -> bool {
        self.allow_any_status_code
    }

    /// Cancellation token, if the method declared one.
    #[must_use]
    pub const fn cancellation_token(&self) -> Option<&CancellationToken> {
        self.cancellation_token.as_ref()
    }

    /// Name of the invoked method.
    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Assemble the full request URL against `base`.
    ///
    /// The base-path template (if any) and the relative path template are
    /// expanded against the recorded path substitutions, joined onto `base`,
    /// then query entries and raw fragments are appended.
    ///
    /// # Errors
    ///
    /// Returns an error when a placeholder has no substitution, a value
    /// cannot be rendered, or the resulting URL is invalid.
    pub fn url(&self, base: &Url, serializers: &Serializers) -> Result<Url> {
        let mut rendered = String::new();
        if let Some(base_path) = &self.base_path {
            rendered.push_str(&self.expand(base_path, serializers)?);
        }
        rendered.push_str(&self.expand(&self.path, serializers)?);

        let mut url = base.join(rendered.trim_start_matches('/'))?;
        if !self.query_params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for param in &self.query_params {
                pairs.append_pair(&param.name, &param.render(serializers)?);
            }
        }
        if !self.raw_query.is_empty() {
            let joined = self.raw_query.join("&");
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{joined}"),
                _ => joined,
            };
            url.set_query(Some(&query));
        }
        Ok(url)
    }

    /// Encode the body, if any, returning the bytes and their content type.
    ///
    /// # Errors
    ///
    /// Returns an error if the codec fails.
    pub fn body_bytes(&self, serializers: &Serializers) -> Result<Option<(Bytes, ContentType)>> {
        let Some(body) = &self.body else {
            return Ok(None);
        };
        let encoded = match body.method {
            BodySerializationMethod::Serialized => serializers.serialize_body(&body.value)?,
            BodySerializationMethod::UrlEncoded => {
                let text = serde_urlencoded::to_string(&body.value)?;
                (Bytes::from(text), ContentType::FormUrlEncoded)
            }
        };
        Ok(Some(encoded))
    }

    fn expand(&self, template: &PathTemplate, serializers: &Serializers) -> Result<String> {
        let mut failure = None;
        let expanded = template.expand(|key| {
            let param = self.path_params.iter().find(|p| p.key == key)?;
            match param.render(serializers) {
                Ok(rendered) => Some(std::borrow::Cow::Owned(rendered)),
                Err(err) => {
                    failure = Some(err);
                    None
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => expanded,
        }
    }
}
