//! Serialization-method resolution.
//!
//! Every path, query, and body contribution resolves its effective
//! serialization method through the same precedence: an explicit override
//! at the call site, then the method-level default, then the type-level
//! default, then the framework default.

use chela_core::{BodySerializationMethod, PathSerializationMethod, QuerySerializationMethod};

use crate::model::SerializationMethodsAttr;

/// Resolves effective serialization methods for one method of one type.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializationResolver {
    type_level: Option<SerializationMethodsAttr>,
    method_level: Option<SerializationMethodsAttr>,
}

impl SerializationResolver {
    /// Build a resolver from the optional type-level and method-level
    /// defaults.
    #[must_use]
    pub const fn new(
        type_level: Option<SerializationMethodsAttr>,
        method_level: Option<SerializationMethodsAttr>,
    ) -> Self {
        Self {
            type_level,
            method_level,
        }
    }

    /// Effective path serialization for a call site.
    #[must_use]
    pub fn resolve_path(&self, site: Option<PathSerializationMethod>) -> PathSerializationMethod {
        site.or_else(|| self.method_level.and_then(|m| m.path))
            .or_else(|| self.type_level.and_then(|t| t.path))
            .unwrap_or_default()
    }

    /// Effective query serialization for a call site.
    #[must_use]
    pub fn resolve_query(
        &self,
        site: Option<QuerySerializationMethod>,
    ) -> QuerySerializationMethod {
        site.or_else(|| self.method_level.and_then(|m| m.query))
            .or_else(|| self.type_level.and_then(|t| t.query))
            .unwrap_or_default()
    }

    /// Effective body serialization for a call site.
    #[must_use]
    pub fn resolve_body(&self, site: Option<BodySerializationMethod>) -> BodySerializationMethod {
        site.or_else(|| self.method_level.and_then(|m| m.body))
            .or_else(|| self.type_level.and_then(|t| t.body))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr_query(method: QuerySerializationMethod) -> SerializationMethodsAttr {
        SerializationMethodsAttr {
            query: Some(method),
            ..SerializationMethodsAttr::default()
        }
    }

    #[test]
    fn framework_defaults() {
        let resolver = SerializationResolver::default();
        assert_eq!(
            resolver.resolve_path(None),
            PathSerializationMethod::ToString
        );
        assert_eq!(
            resolver.resolve_query(None),
            QuerySerializationMethod::ToString
        );
        assert_eq!(
            resolver.resolve_body(None),
            BodySerializationMethod::Serialized
        );
    }

    #[test]
    fn type_level_overrides_framework() {
        let resolver =
            SerializationResolver::new(Some(attr_query(QuerySerializationMethod::Serialized)), None);
        assert_eq!(
            resolver.resolve_query(None),
            QuerySerializationMethod::Serialized
        );
    }

    #[test]
    fn method_level_overrides_type_level() {
        let resolver = SerializationResolver::new(
            Some(attr_query(QuerySerializationMethod::Serialized)),
            Some(attr_query(QuerySerializationMethod::ToString)),
        );
        assert_eq!(
            resolver.resolve_query(None),
            QuerySerializationMethod::ToString
        );
    }

    #[test]
    fn call_site_overrides_everything() {
        let resolver = SerializationResolver::new(
            Some(attr_query(QuerySerializationMethod::ToString)),
            Some(attr_query(QuerySerializationMethod::ToString)),
        );
        assert_eq!(
            resolver.resolve_query(Some(QuerySerializationMethod::Serialized)),
            QuerySerializationMethod::Serialized
        );
    }

    #[test]
    fn unset_component_falls_through() {
        // A method-level attribute that only sets the body default must not
        // shadow the type-level query default.
        let type_level = attr_query(QuerySerializationMethod::Serialized);
        let method_level = SerializationMethodsAttr {
            body: Some(BodySerializationMethod::UrlEncoded),
            ..SerializationMethodsAttr::default()
        };
        let resolver = SerializationResolver::new(Some(type_level), Some(method_level));
        assert_eq!(
            resolver.resolve_query(None),
            QuerySerializationMethod::Serialized
        );
        assert_eq!(
            resolver.resolve_body(None),
            BodySerializationMethod::UrlEncoded
        );
    }
}
