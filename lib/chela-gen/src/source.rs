//! The source-text backend.
//!
//! Each emission operation appends a token fragment; `generate` renders the
//! accumulated tokens as Rust source for downstream compilation. The
//! emitted client is a struct generic over any [`Requester`], with one
//! async method per request method, assembling the same
//! `RequestDescription` the runtime backend assembles - in the same order.
//!
//! [`Requester`]: chela_core::Requester

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use chela_core::{BodySerializationMethod, PathSerializationMethod, QuerySerializationMethod};

use crate::emit::{Emitter, EmittedProperty, MethodEmitter, TypeEmitter};
use crate::model::{
    HeaderAttr, MethodModel, PropertyModel, RequestAttr, ReturnType, TypeModel, TypeRef,
};

fn ident(name: &str) -> proc_macro2::Ident {
    format_ident!("{}", name)
}

fn type_tokens(ty: &TypeRef) -> TokenStream {
    ty.name
        .parse()
        .unwrap_or_else(|_| quote!(::chela_core::Value))
}

fn path_method_tokens(method: PathSerializationMethod) -> TokenStream {
    match method {
        PathSerializationMethod::ToString => {
            quote!(::chela_core::PathSerializationMethod::ToString)
        }
        PathSerializationMethod::Serialized => {
            quote!(::chela_core::PathSerializationMethod::Serialized)
        }
    }
}

fn query_method_tokens(method: QuerySerializationMethod) -> TokenStream {
    match method {
        QuerySerializationMethod::ToString => {
            quote!(::chela_core::QuerySerializationMethod::ToString)
        }
        QuerySerializationMethod::Serialized => {
            quote!(::chela_core::QuerySerializationMethod::Serialized)
        }
    }
}

fn body_method_tokens(method: BodySerializationMethod) -> TokenStream {
    match method {
        BodySerializationMethod::Serialized => {
            quote!(::chela_core::BodySerializationMethod::Serialized)
        }
        BodySerializationMethod::UrlEncoded => {
            quote!(::chela_core::BodySerializationMethod::UrlEncoded)
        }
    }
}

#[derive(Debug, Clone)]
struct FieldInfo {
    name: proc_macro2::Ident,
    nullable: bool,
}

#[derive(Debug, Clone)]
struct ArgInfo {
    name: proc_macro2::Ident,
    nullable: bool,
}

/// The source-text backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceEmitter;

impl Emitter for SourceEmitter {
    type Output = String;
    type TypeEmitter = SourceTypeEmitter;

    fn emit_type(&self, model: &TypeModel) -> SourceTypeEmitter {
        let type_headers = model
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
        SourceTypeEmitter {
            client_name: format_ident!("{}Client", model.name),
            type_headers,
            fields: Vec::new(),
            field_decls: Vec::new(),
            accessors: Vec::new(),
            methods: Vec::new(),
            requester_field: None,
        }
    }
}

/// Per-type state of the source-text backend.
#[derive(Debug)]
pub struct SourceTypeEmitter {
    client_name: proc_macro2::Ident,
    type_headers: Vec<(String, String)>,
    fields: Vec<FieldInfo>,
    field_decls: Vec<TokenStream>,
    accessors: Vec<TokenStream>,
    methods: Vec<TokenStream>,
    requester_field: Option<proc_macro2::Ident>,
}

impl TypeEmitter for SourceTypeEmitter {
    type Output = String;
    type MethodEmitter = SourceMethodEmitter;

    fn emit_requester_property(&mut self, property: &PropertyModel) {
        if self.requester_field.is_none() {
            let name = ident(&property.name);
            self.accessors.push(quote! {
                pub fn #name(&self) -> &R {
                    &self.requester
                }
            });
            self.requester_field = Some(name);
        }
    }

    fn emit_property(&mut self, property: &PropertyModel) -> EmittedProperty {
        let slot = self.fields.len();
        let name = ident(&property.name);
        let ty = type_tokens(&property.ty);
        let setter = format_ident!("set_{}", property.name);
        self.field_decls.push(quote! { #name: #ty });
        self.accessors.push(quote! {
            pub fn #name(&self) -> &#ty {
                &self.#name
            }

            pub fn #setter(&mut self, value: #ty) {
                self.#name = value;
            }
        });
        self.fields.push(FieldInfo {
            name,
            nullable: property.ty.nullable,
        });
        EmittedProperty {
            slot,
            name: property.name.clone(),
        }
    }

    fn emit_method(&mut self, method: &MethodModel, request: &RequestAttr) -> SourceMethodEmitter {
        // Method enum variants are capitalized verb names (Get, Post, ...).
        let verb = request.method.as_str();
        let variant = format_ident!("{}{}", &verb[..1], verb[1..].to_lowercase());
        let name = ident(&method.name);
        let name_literal = method.name.clone();
        let path = request.path.clone();

        let mut stmts = vec![quote! {
            let mut desc = ::chela_core::RequestDescription::new(
                ::chela_core::Method::#variant,
                #path,
            );
            desc.set_method_name(#name_literal);
        }];
        for (header_name, header_value) in &self.type_headers {
            stmts.push(quote! {
                desc.add_header(#header_name, #header_value);
            });
        }

        let args = method
            .params
            .iter()
            .map(|param| ArgInfo {
                name: ident(&param.name),
                nullable: param.ty.nullable,
            })
            .collect();
        let arg_decls = method
            .params
            .iter()
            .map(|param| {
                let arg = ident(&param.name);
                let ty = type_tokens(&param.ty);
                quote! { #arg: #ty }
            })
            .collect();

        SourceMethodEmitter {
            name,
            arg_decls,
            args,
            properties: self.fields.clone(),
            stmts,
            dispatch: None,
        }
    }

    fn finish_method(&mut self, method: SourceMethodEmitter) {
        let name = method.name;
        let arg_decls = method.arg_decls;
        let stmts = method.stmts;
        let (return_tokens, dispatch) = method.dispatch.unwrap_or_else(|| {
            // Rejected return type: keep a stub so the remaining methods
            // still render.
            (
                quote!(()),
                quote! {
                    let _ = desc;
                    Err(::chela_core::Error::argument("unsupported return type"))
                },
            )
        });
        self.methods.push(quote! {
            pub async fn #name(&self #(, #arg_decls)*) -> ::chela_core::Result<#return_tokens> {
                #(#stmts)*
                #dispatch
            }
        });
    }

    fn emit_dispose_method(&mut self, method: &MethodModel) {
        let name = ident(&method.name);
        self.methods.push(quote! {
            pub fn #name(&self) {
                self.requester.dispose();
            }
        });
    }

    fn generate(self) -> String {
        let client_name = self.client_name;
        let field_decls = self.field_decls;
        let field_inits = self.fields.iter().map(|field| {
            let name = &field.name;
            quote! { #name: Default::default() }
        });
        let accessors = self.accessors;
        let methods = self.methods;
        let tokens = quote! {
            pub struct #client_name<R> {
                requester: R,
                #(#field_decls,)*
            }

            impl<R: ::chela_core::Requester> #client_name<R> {
                pub fn new(requester: R) -> Self {
                    Self {
                        requester,
                        #(#field_inits,)*
                    }
                }

                #(#accessors)*

                #(#methods)*
            }
        };
        tokens.to_string()
    }
}

/// Per-method state of the source-text backend.
#[derive(Debug)]
pub struct SourceMethodEmitter {
    name: proc_macro2::Ident,
    arg_decls: Vec<TokenStream>,
    args: Vec<ArgInfo>,
    properties: Vec<FieldInfo>,
    stmts: Vec<TokenStream>,
    dispatch: Option<(TokenStream, TokenStream)>,
}

impl SourceMethodEmitter {
    fn property(&self, property: &EmittedProperty) -> &FieldInfo {
        self.properties
            .get(property.slot)
            .unwrap_or_else(|| panic!("property slot {} emitted out of order", property.slot))
    }

    fn arg(&self, index: usize) -> &ArgInfo {
        self.args
            .get(index)
            .unwrap_or_else(|| panic!("parameter index {index} out of range"))
    }
}

impl MethodEmitter for SourceMethodEmitter {
    fn set_allow_any_status_code(&mut self) {
        self.stmts.push(quote! {
            desc.set_allow_any_status_code(true);
        });
    }

    fn set_base_path(&mut self, template: &str) {
        self.stmts.push(quote! {
            desc.set_base_path(#template);
        });
    }

    fn add_header_property(&mut self, property: &EmittedProperty, header: &HeaderAttr) {
        let field = self.property(property);
        let name = &field.name;
        let wire_name = header.wire_name().to_string();
        let stmt = if field.nullable {
            match &header.value {
                Some(default) => quote! {
                    match &self.#name {
                        Some(value) => desc.add_header(#wire_name, value.to_string()),
                        None => desc.add_header(#wire_name, #default),
                    }
                },
                None => quote! {
                    if let Some(value) = &self.#name {
                        desc.add_header(#wire_name, value.to_string());
                    }
                },
            }
        } else {
            quote! {
                desc.add_header(#wire_name, self.#name.to_string());
            }
        };
        self.stmts.push(stmt);
    }

    fn add_path_property(
        &mut self,
        property: &EmittedProperty,
        key: &str,
        method: PathSerializationMethod,
    ) {
        let name = &self.property(property).name;
        let method = path_method_tokens(method);
        self.stmts.push(quote! {
            desc.add_path_param(#key, ::chela_core::to_value(&self.#name)?, #method);
        });
    }

    fn add_query_property(
        &mut self,
        property: &EmittedProperty,
        query_name: &str,
        method: QuerySerializationMethod,
    ) {
        let field = self.property(property);
        let name = &field.name;
        let method = query_method_tokens(method);
        let stmt = if field.nullable {
            quote! {
                if let Some(value) = &self.#name {
                    desc.add_query_param(#query_name, ::chela_core::to_value(value)?, #method);
                }
            }
        } else {
            quote! {
                desc.add_query_param(#query_name, ::chela_core::to_value(&self.#name)?, #method);
            }
        };
        self.stmts.push(stmt);
    }

    fn add_message_property_property(&mut self, property: &EmittedProperty, key: &str) {
        let name = &self.property(property).name;
        self.stmts.push(quote! {
            desc.add_message_property(#key, ::chela_core::to_value(&self.#name)?);
        });
    }

    fn add_method_header(&mut self, header: &HeaderAttr) {
        if let Some(value) = &header.value {
            let name = header.name.clone();
            self.stmts.push(quote! {
                desc.add_header(#name, #value);
            });
        }
    }

    fn set_cancellation_token(&mut self, index: usize) {
        let arg = &self.arg(index).name;
        self.stmts.push(quote! {
            desc.set_cancellation_token(#arg.clone());
        });
    }

    fn add_header_parameter(&mut self, index: usize, header_name: &str) {
        let info = self.arg(index);
        let arg = &info.name;
        let stmt = if info.nullable {
            quote! {
                if let Some(value) = &#arg {
                    desc.add_header(#header_name, value.to_string());
                }
            }
        } else {
            quote! {
                desc.add_header(#header_name, #arg.to_string());
            }
        };
        self.stmts.push(stmt);
    }

    fn add_path_parameter(&mut self, index: usize, key: &str, method: PathSerializationMethod) {
        let arg = &self.arg(index).name;
        let method = path_method_tokens(method);
        self.stmts.push(quote! {
            desc.add_path_param(#key, ::chela_core::to_value(&#arg)?, #method);
        });
    }

    fn add_query_parameter(
        &mut self,
        index: usize,
        query_name: &str,
        method: QuerySerializationMethod,
    ) {
        let info = self.arg(index);
        let arg = &info.name;
        let method = query_method_tokens(method);
        let stmt = if info.nullable {
            quote! {
                if let Some(value) = &#arg {
                    desc.add_query_param(#query_name, ::chela_core::to_value(value)?, #method);
                }
            }
        } else {
            quote! {
                desc.add_query_param(#query_name, ::chela_core::to_value(&#arg)?, #method);
            }
        };
        self.stmts.push(stmt);
    }

    fn add_message_property_parameter(&mut self, index: usize, key: &str) {
        let arg = &self.arg(index).name;
        self.stmts.push(quote! {
            desc.add_message_property(#key, ::chela_core::to_value(&#arg)?);
        });
    }

    fn add_raw_query_string_parameter(&mut self, index: usize) {
        let arg = &self.arg(index).name;
        self.stmts.push(quote! {
            desc.add_raw_query(#arg.to_string());
        });
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
        let arg = &self.arg(index).name;
        let method = query_method_tokens(method);
        self.stmts.push(quote! {
            for (name, value) in &#arg {
                desc.add_query_param(name.to_string(), ::chela_core::to_value(value)?, #method);
            }
        });
        true
    }

    fn set_body_parameter(&mut self, index: usize, method: BodySerializationMethod) {
        let arg = &self.arg(index).name;
        let method = body_method_tokens(method);
        self.stmts.push(quote! {
            desc.set_body(::chela_core::to_value(&#arg)?, #method);
        });
    }

    fn try_emit_invocation(&mut self, return_type: &ReturnType) -> bool {
        let dispatch = match return_type {
            ReturnType::FutureVoid => (
                quote!(()),
                quote! { self.requester.request_void(desc).await },
            ),
            ReturnType::FutureJson(ty) => {
                let ty = type_tokens(ty);
                (
                    quote!(#ty),
                    quote! {
                        let value = self.requester.request_json(desc).await?;
                        ::chela_core::from_value(value)
                    },
                )
            }
            ReturnType::FutureResponseMessage => (
                quote!(::chela_core::ResponseMessage),
                quote! { self.requester.request_response_message(desc).await },
            ),
            ReturnType::FutureResponse(ty) => {
                let ty = type_tokens(ty);
                (
                    quote!(::chela_core::Response<#ty>),
                    quote! {
                        let response = self.requester.request_response(desc).await?;
                        response.deserialize()
                    },
                )
            }
            ReturnType::FutureBytes => (
                quote!(::chela_core::bytes::Bytes),
                quote! { self.requester.request_raw_bytes(desc).await },
            ),
            ReturnType::FutureString => (
                quote!(String),
                quote! { self.requester.request_raw_string(desc).await },
            ),
            ReturnType::FutureStream => (
                quote!(::chela_core::BodyStream),
                quote! { self.requester.request_raw_stream(desc).await },
            ),
            ReturnType::Other(_) => return false,
        };
        self.dispatch = Some(dispatch);
        true
    }
}

#[cfg(test)]
mod tests {
    use chela_core::Method;

    use super::*;
    use crate::model::{ParameterModel, PropertyAttr, QueryAttr};

    #[test]
    fn minimal_method_renders() {
        let model = TypeModel::new("UserApi");
        let emitter = SourceEmitter;
        let mut te = emitter.emit_type(&model);
        let method = MethodModel::new(
            "list_users",
            RequestAttr::new(Method::Get, "/users"),
            ReturnType::FutureVoid,
        );
        let mut me = te.emit_method(&method, method.request.as_ref().expect("request"));
        assert!(me.try_emit_invocation(&method.return_type));
        te.finish_method(me);
        let source = te.generate();

        assert!(source.contains("struct UserApiClient"));
        assert!(source.contains("list_users"));
        assert!(source.contains("request_void"));
        assert!(source.contains("/users"));
    }

    #[test]
    fn rejected_return_type_reports_false() {
        let model = TypeModel::new("Api");
        let mut te = SourceEmitter.emit_type(&model);
        let method = MethodModel::new(
            "bad",
            RequestAttr::new(Method::Get, "/"),
            ReturnType::Other("u32".to_string()),
        );
        let mut me = te.emit_method(&method, method.request.as_ref().expect("request"));
        assert!(!me.try_emit_invocation(&method.return_type));
    }

    #[test]
    fn property_contributions_reference_fields() {
        let model = TypeModel::new("Api");
        let mut te = SourceEmitter.emit_type(&model);
        let property = PropertyModel::new("page_size", TypeRef::new("u32"))
            .with_attr(PropertyAttr::Query(QueryAttr::named("pageSize")));
        let handle = te.emit_property(&property);

        let method = MethodModel::new(
            "search",
            RequestAttr::new(Method::Get, "/search"),
            ReturnType::FutureVoid,
        )
        .with_param(ParameterModel::new("q", TypeRef::new("String")));
        let mut me = te.emit_method(&method, method.request.as_ref().expect("request"));
        me.add_query_property(&handle, "pageSize", QuerySerializationMethod::ToString);
        me.add_query_parameter(0, "q", QuerySerializationMethod::ToString);
        assert!(me.try_emit_invocation(&method.return_type));
        te.finish_method(me);
        let source = te.generate();

        assert!(source.contains("page_size"));
        assert!(source.contains("pageSize"));
        assert!(source.contains("set_page_size"));
    }

    #[test]
    fn generation_is_deterministic() {
        let render = || {
            let model = TypeModel::new("Api");
            let mut te = SourceEmitter.emit_type(&model);
            let method = MethodModel::new(
                "ping",
                RequestAttr::new(Method::Get, "/ping"),
                ReturnType::FutureVoid,
            );
            let mut me = te.emit_method(&method, method.request.as_ref().expect("request"));
            me.try_emit_invocation(&method.return_type);
            te.finish_method(me);
            te.generate()
        };
        assert_eq!(render(), render());
    }
}
