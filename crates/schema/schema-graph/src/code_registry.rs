// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Runtime wiring attached to a schema: type resolvers for abstract types and scalar coercion.

use std::{collections::HashMap, fmt, sync::Arc};

use async_graphql_value::ConstValue;

use crate::{
    builtins,
    coercion::{Coercing, PassthroughCoercing},
    schema::Schema,
};

/// Picks the concrete object type of a value whose static type is an interface or union.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, value: &ConstValue, schema: &Schema) -> Option<String>;
}

/// Resolves by the `__typename` entry of an object value.
pub struct TypenameTypeResolver;

impl TypeResolver for TypenameTypeResolver {
    fn resolve_type(&self, value: &ConstValue, _schema: &Schema) -> Option<String> {
        match value {
            ConstValue::Object(fields) => match fields.get("__typename") {
                Some(ConstValue::String(name)) => Some(name.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Clone, Default)]
pub struct CodeRegistry {
    type_resolvers: HashMap<String, Arc<dyn TypeResolver>>,
    default_type_resolver: Option<Arc<dyn TypeResolver>>,
    coercings: HashMap<String, Arc<dyn Coercing>>,
}

static PASSTHROUGH: PassthroughCoercing = PassthroughCoercing;

impl CodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type_resolver(
        mut self,
        type_name: impl Into<String>,
        resolver: Arc<dyn TypeResolver>,
    ) -> Self {
        self.type_resolvers.insert(type_name.into(), resolver);
        self
    }

    /// Used for abstract types without a resolver of their own.
    pub fn with_default_type_resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.default_type_resolver = Some(resolver);
        self
    }

    pub fn with_coercing(
        mut self,
        scalar_name: impl Into<String>,
        coercing: Arc<dyn Coercing>,
    ) -> Self {
        self.coercings.insert(scalar_name.into(), coercing);
        self
    }

    pub fn type_resolver(&self, type_name: &str) -> Option<&dyn TypeResolver> {
        self.type_resolvers
            .get(type_name)
            .or(self.default_type_resolver.as_ref())
            .map(|resolver| resolver.as_ref())
    }

    pub fn has_type_resolver(&self, type_name: &str) -> bool {
        self.type_resolver(type_name).is_some()
    }

    /// Registered coercion, then the built-in one, then passthrough.
    pub fn coercing(&self, scalar_name: &str) -> &dyn Coercing {
        self.coercings
            .get(scalar_name)
            .map(|coercing| coercing.as_ref())
            .or_else(|| builtins::builtin_coercing(scalar_name))
            .unwrap_or(&PASSTHROUGH)
    }

    /// Moves registrations made under an old type name to the new one.
    pub(crate) fn renamed(&self, renames: &HashMap<String, String>) -> Self {
        let rename = |name: &String| renames.get(name).cloned().unwrap_or_else(|| name.clone());

        Self {
            type_resolvers: self
                .type_resolvers
                .iter()
                .map(|(name, resolver)| (rename(name), resolver.clone()))
                .collect(),
            default_type_resolver: self.default_type_resolver.clone(),
            coercings: self
                .coercings
                .iter()
                .map(|(name, coercing)| (rename(name), coercing.clone()))
                .collect(),
        }
    }
}

impl fmt::Debug for CodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut resolvers: Vec<_> = self.type_resolvers.keys().collect();
        resolvers.sort();
        let mut coercings: Vec<_> = self.coercings.keys().collect();
        coercings.sort();

        f.debug_struct("CodeRegistry")
            .field("type_resolvers", &resolvers)
            .field("default_type_resolver", &self.default_type_resolver.is_some())
            .field("coercings", &coercings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct Fixed(&'static str);

    impl TypeResolver for Fixed {
        fn resolve_type(&self, _value: &ConstValue, _schema: &Schema) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn default_resolver_is_a_fallback() {
        let registry = CodeRegistry::new().with_type_resolver("Pet", Arc::new(Fixed("Dog")));
        assert!(registry.has_type_resolver("Pet"));
        assert!(!registry.has_type_resolver("Node"));

        let registry = registry.with_default_type_resolver(Arc::new(TypenameTypeResolver));
        assert!(registry.has_type_resolver("Node"));
    }

    #[test]
    fn coercing_lookup_order() {
        let registry = CodeRegistry::new();
        assert!(
            registry
                .coercing("Int")
                .parse_value(&ConstValue::String("x".to_string()))
                .is_err()
        );
        assert!(
            registry
                .coercing("DateTime")
                .parse_value(&ConstValue::String("x".to_string()))
                .is_ok()
        );
    }

    #[test]
    fn renames_carry_registrations() {
        let registry = CodeRegistry::new().with_type_resolver("Pet", Arc::new(Fixed("Dog")));
        let renames = HashMap::from([("Pet".to_string(), "Animal".to_string())]);

        let renamed = registry.renamed(&renames);
        assert!(renamed.has_type_resolver("Animal"));
        assert!(!renamed.has_type_resolver("Pet"));
    }
}
