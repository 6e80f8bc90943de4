// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::HashSet, sync::Arc};

use tracing::instrument;

use super::{DirectiveBuilder, TypeBuilder};
use crate::{
    arena::{ElementId, GraphArena},
    builtins,
    code_registry::CodeRegistry,
    element::{SchemaElement, SchemaRoot},
    error::SchemaError,
    schema::Schema,
};

/// Collects named types and directive definitions, then assembles them into a [`Schema`].
///
/// Types may refer to each other by name in any order; references are resolved by [`Self::build`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    arena: GraphArena,
    description: Option<String>,
    query: Option<String>,
    mutation: Option<String>,
    subscription: Option<String>,
    types: Vec<(String, ElementId)>,
    directives: Vec<(String, ElementId)>,
    code_registry: CodeRegistry,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn query_type(mut self, name: impl Into<String>) -> Self {
        self.query = Some(name.into());
        self
    }

    pub fn mutation_type(mut self, name: impl Into<String>) -> Self {
        self.mutation = Some(name.into());
        self
    }

    pub fn subscription_type(mut self, name: impl Into<String>) -> Self {
        self.subscription = Some(name.into());
        self
    }

    pub fn code_registry(mut self, code_registry: CodeRegistry) -> Self {
        self.code_registry = code_registry;
        self
    }

    pub fn add_type(mut self, ty: impl TypeBuilder) -> Result<Self, SchemaError> {
        let name = ty.type_name().to_string();
        let id = ty.build(&mut self.arena)?;
        self.types.push((name, id));
        Ok(self)
    }

    pub fn add_directive(mut self, directive: DirectiveBuilder) -> Result<Self, SchemaError> {
        let name = directive.directive_name().to_string();
        let id = directive.build(&mut self.arena)?;
        self.directives.push((name, id));
        Ok(self)
    }

    fn root_type(&self, name: Option<&String>) -> Result<Option<ElementId>, SchemaError> {
        name.map(|name| {
            self.types
                .iter()
                .find_map(|(existing, id)| (existing == name).then_some(*id))
                .ok_or_else(|| SchemaError::DanglingTypeReference { name: name.clone() })
        })
        .transpose()
    }

    #[instrument(name = "SchemaBuilder::build", skip_all, fields(types = self.types.len()))]
    pub fn build(mut self) -> Result<Schema, SchemaError> {
        let mut defined_directives = HashSet::new();
        for (name, _) in &self.directives {
            if !defined_directives.insert(name.clone()) {
                return Err(SchemaError::DuplicateDirectiveDefinition { name: name.clone() });
            }
        }

        for directive in builtins::builtin_directives() {
            if !defined_directives.contains(directive.directive_name()) {
                self = self.add_directive(directive)?;
            }
        }

        let query = self.root_type(self.query.as_ref())?;
        let mutation = self.root_type(self.mutation.as_ref())?;
        let subscription = self.root_type(self.subscription.as_ref())?;
        let roots = [query, mutation, subscription];

        let additional_types = self
            .types
            .iter()
            .map(|(_, id)| *id)
            .filter(|id| !roots.contains(&Some(*id)))
            .collect();

        let root = self.arena.alloc(SchemaElement::Schema(SchemaRoot {
            description: self.description,
            query,
            mutation,
            subscription,
            additional_types,
            directives: self.directives.into_iter().map(|(_, id)| id).collect(),
        }));

        Schema::assemble(self.arena, root, Arc::new(self.code_registry))
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::{
        builder::{DefinitionBuilder, FieldBuilder, ObjectTypeBuilder, ScalarTypeBuilder, TypeExpr},
        element::{ElementKind, SchemaElement},
        resolution::reachable_elements,
    };

    fn node_schema() -> Result<Schema, SchemaError> {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("node", TypeExpr::named("Node"))),
            )?
            .add_type(
                ObjectTypeBuilder::new("Node")
                    .field(FieldBuilder::new("id", TypeExpr::named("ID").non_null()))
                    .field(FieldBuilder::new("next", TypeExpr::named("Node"))),
            )?
            .build()
    }

    #[test]
    fn builds_self_referencing_types() {
        let schema = node_schema().unwrap();

        assert!(schema.type_by_name("ID").is_some());
        assert!(schema.type_by_name("Int").is_none());

        let unresolved = reachable_elements(schema.arena(), &[schema.root()])
            .into_iter()
            .filter(|&id| matches!(schema.element(id), SchemaElement::TypeReference(_)))
            .count();
        assert_eq!(unresolved, 0);

        let next = schema.field_definition("Node", "next").unwrap();
        assert_eq!(Some(next.ty), schema.type_id("Node"));
    }

    #[test]
    fn same_name_different_kind() {
        let result = SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("at", TypeExpr::named("Instant"))),
            )
            .and_then(|b| {
                b.add_type(
                    ObjectTypeBuilder::new("Instant")
                        .field(FieldBuilder::new("seconds", TypeExpr::named("Int"))),
                )
            })
            .and_then(|b| b.add_type(ScalarTypeBuilder::new("Instant")))
            .and_then(|b| b.build());

        assert!(matches!(
            result,
            Err(SchemaError::DuplicateTypeName {
                first: ElementKind::Object,
                second: ElementKind::Scalar,
                ..
            })
        ));
    }

    #[test]
    fn root_types_must_be_objects() {
        let result = SchemaBuilder::new()
            .query_type("Query")
            .add_type(ScalarTypeBuilder::new("Query"))
            .and_then(|b| b.build());

        assert!(matches!(
            result,
            Err(SchemaError::InvalidRootType {
                operation: "query",
                kind: ElementKind::Scalar,
                ..
            })
        ));
    }

    #[test]
    fn missing_root_type() {
        let result = SchemaBuilder::new().query_type("Query").build();
        assert_eq!(
            result.unwrap_err(),
            SchemaError::DanglingTypeReference {
                name: "Query".to_string()
            }
        );
    }

    #[test]
    fn custom_directive_replaces_builtin() {
        let schema = SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("version", TypeExpr::named("String"))),
            )
            .and_then(|b| {
                b.add_directive(
                    DirectiveBuilder::new("deprecated")
                        .description("Project specific deprecation")
                        .locations([crate::element::DirectiveLocation::FieldDefinition]),
                )
            })
            .and_then(|b| b.build())
            .unwrap();

        assert_eq!(schema.directives().len(), 4);
        assert_eq!(
            schema.directive("deprecated").and_then(|d| d.description.as_deref()),
            Some("Project specific deprecation")
        );
    }
}
