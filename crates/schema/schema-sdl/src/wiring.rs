// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use schema_graph::{
    code_registry::{CodeRegistry, TypeResolver, TypenameTypeResolver},
    coercion::Coercing,
};

/// Runtime behaviour attached to an SDL schema: scalar coercion and abstract type resolution.
#[derive(Debug, Clone, Default)]
pub struct RuntimeWiring {
    code_registry: CodeRegistry,
}

impl RuntimeWiring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom scalars pass values through unchanged and abstract types resolve through the
    /// `__typename` entry of a value.
    pub fn mocked() -> Self {
        Self {
            code_registry: CodeRegistry::new()
                .with_default_type_resolver(Arc::new(TypenameTypeResolver)),
        }
    }

    pub fn scalar(mut self, name: impl Into<String>, coercing: Arc<dyn Coercing>) -> Self {
        self.code_registry = self.code_registry.with_coercing(name, coercing);
        self
    }

    pub fn type_resolver(
        mut self,
        type_name: impl Into<String>,
        resolver: Arc<dyn TypeResolver>,
    ) -> Self {
        self.code_registry = self.code_registry.with_type_resolver(type_name, resolver);
        self
    }

    pub fn code_registry(&self) -> &CodeRegistry {
        &self.code_registry
    }

    pub(crate) fn into_code_registry(self) -> CodeRegistry {
        self.code_registry
    }
}
