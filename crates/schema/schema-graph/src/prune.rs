// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Removes the parts of a schema nothing can reach.

use std::collections::HashSet;

use common::{config::EngineConfig, env_const::TYPEGRAPH_SCHEMA_TYPES, scope::SchemaScopeFilter};
use schema_env::{EnvError, Environment};
use tracing::{debug, instrument};

use crate::{
    arena::ElementId,
    element::{Edge, SchemaElement},
    error::TransformError,
    resolution::reachable_elements,
    schema::Schema,
    transform::SchemaTransformer,
    visitor::{SchemaVisitor, VisitContext, VisitResult},
};

/// Drops additional types that are not reachable from the operation roots or the directive
/// definitions. Types matching `keep` survive, along with everything they reach, and so do the
/// implementations of every surviving interface.
#[derive(Debug, Clone)]
pub struct SchemaPruner {
    keep: SchemaScopeFilter,
    config: EngineConfig,
}

impl SchemaPruner {
    pub fn new(keep: SchemaScopeFilter) -> Self {
        Self {
            keep,
            config: EngineConfig::default(),
        }
    }

    /// Each call to [`Self::prune`] gets a fresh traversal budget from `config`.
    pub fn with_config(self, config: EngineConfig) -> Self {
        Self { config, ..self }
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        let keep =
            SchemaScopeFilter::new_from_env(env, TYPEGRAPH_SCHEMA_TYPES, SchemaScopeFilter::none);
        Ok(Self::new(keep).with_config(EngineConfig::from_env(env)?))
    }

    #[instrument(name = "SchemaPruner::prune", skip_all)]
    pub fn prune(&self, schema: &Schema) -> Result<Schema, TransformError> {
        let root = schema.root_element();

        let kept_types = root.additional_types.iter().copied().filter(|id| {
            schema
                .element(*id)
                .type_name()
                .is_some_and(|name| self.keep.matches(name))
        });
        let entry_points: Vec<ElementId> = [root.query, root.mutation, root.subscription]
            .into_iter()
            .flatten()
            .chain(root.directives.iter().copied())
            .chain(kept_types)
            .collect();

        let mut reachable: HashSet<ElementId> = reachable_elements(schema.arena(), &entry_points)
            .into_iter()
            .collect();

        // Implementations of a reachable interface are possible types of it
        loop {
            let implementations: Vec<ElementId> = root
                .additional_types
                .iter()
                .copied()
                .filter(|id| !reachable.contains(id))
                .filter(|id| {
                    implemented_interfaces(schema.element(*id))
                        .iter()
                        .any(|interface| reachable.contains(interface))
                })
                .collect();
            if implementations.is_empty() {
                break;
            }
            reachable.extend(reachable_elements(schema.arena(), &implementations));
        }

        let mut visitor = PruningVisitor {
            reachable,
            pruned: vec![],
        };

        let budget = self.config.cancellation();
        let pruned = SchemaTransformer::with_cancellation(&budget).transform(schema, &mut visitor)?;
        debug!(pruned = ?visitor.pruned, "Pruned unreachable types");

        Ok(pruned)
    }
}

fn implemented_interfaces(element: &SchemaElement) -> &[ElementId] {
    match element {
        SchemaElement::Object(object) => &object.interfaces,
        SchemaElement::Interface(interface) => &interface.interfaces,
        _ => &[],
    }
}

struct PruningVisitor {
    reachable: HashSet<ElementId>,
    pruned: Vec<String>,
}

impl SchemaVisitor for PruningVisitor {
    fn visit_schema_element(
        &mut self,
        element: &SchemaElement,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        let additional = ctx
            .traverser_context()
            .location()
            .is_some_and(|location| location.edge == Edge::AdditionalTypes);

        match element.type_name() {
            Some(name) if additional && !self.reachable.contains(&ctx.node()) => {
                self.pruned.push(name.to_string());
                VisitResult::delete_node()
            }
            _ => VisitResult::CONTINUE,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::{cancellation::Cancelled, env_const::TYPEGRAPH_TRAVERSAL_MAX_STEPS};
    use schema_env::MapEnvironment;
    use test_log::test;

    use super::*;
    use crate::{
        builder::{FieldBuilder, InterfaceTypeBuilder, ObjectTypeBuilder, SchemaBuilder, TypeExpr},
        code_registry::{CodeRegistry, TypenameTypeResolver},
    };

    fn object(name: &str, fields: &[(&str, &str)]) -> ObjectTypeBuilder {
        fields
            .iter()
            .fold(ObjectTypeBuilder::new(name), |builder, (field, ty)| {
                builder.field(FieldBuilder::new(*field, TypeExpr::named(*ty)))
            })
    }

    fn schema_with_orphans() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(object("Query", &[("concert", "Concert")]))
            .and_then(|b| b.add_type(object("Concert", &[("title", "String")])))
            .and_then(|b| b.add_type(object("Orphan", &[("helper", "Helper")])))
            .and_then(|b| b.add_type(object("Helper", &[("count", "Int")])))
            .and_then(|b| b.add_type(object("KeptReport", &[("detail", "Detail")])))
            .and_then(|b| b.add_type(object("Detail", &[("note", "String")])))
            .and_then(|b| b.build())
            .unwrap()
    }

    fn type_names(schema: &Schema) -> Vec<&str> {
        schema.type_ids().map(|(name, _)| name).collect()
    }

    #[test]
    fn removes_unreachable_types() {
        let schema = schema_with_orphans();
        let pruned = SchemaPruner::new(SchemaScopeFilter::none())
            .prune(&schema)
            .unwrap();

        assert_eq!(type_names(&pruned), vec!["Boolean", "Concert", "Query", "String"]);
        // The input keeps everything
        assert!(schema.contains_type("Orphan"));
        assert!(schema.contains_type("Helper"));
    }

    #[test]
    fn kept_types_keep_what_they_reach() {
        let env: MapEnvironment = [(TYPEGRAPH_SCHEMA_TYPES, "Kept*")].into();
        let pruned = SchemaPruner::from_env(&env)
            .unwrap()
            .prune(&schema_with_orphans())
            .unwrap();

        assert!(pruned.contains_type("KeptReport"));
        assert!(pruned.contains_type("Detail"));
        assert!(!pruned.contains_type("Orphan"));
        assert!(!pruned.contains_type("Helper"));
        assert!(!pruned.contains_type("Int"));
    }

    #[test]
    fn keeps_implementations_of_reachable_interfaces() {
        let schema = SchemaBuilder::new()
            .query_type("Query")
            .add_type(object("Query", &[("pet", "Pet")]))
            .and_then(|b| {
                b.add_type(
                    InterfaceTypeBuilder::new("Pet")
                        .field(FieldBuilder::new("name", TypeExpr::named("String"))),
                )
            })
            .and_then(|b| {
                b.add_type(
                    InterfaceTypeBuilder::new("Animal")
                        .interface("Pet")
                        .field(FieldBuilder::new("name", TypeExpr::named("String"))),
                )
            })
            .and_then(|b| {
                b.add_type(
                    object("Dog", &[("name", "String"), ("owner", "Owner")])
                        .interface("Animal")
                        .interface("Pet"),
                )
            })
            .and_then(|b| b.add_type(object("Owner", &[("age", "Int")])))
            .and_then(|b| b.add_type(object("Rock", &[("name", "String")])))
            .map(|b| {
                b.code_registry(
                    CodeRegistry::new().with_default_type_resolver(Arc::new(TypenameTypeResolver)),
                )
            })
            .and_then(|b| b.build())
            .unwrap();

        let pruned = SchemaPruner::new(SchemaScopeFilter::none())
            .prune(&schema)
            .unwrap();

        assert!(pruned.contains_type("Animal"));
        assert!(pruned.contains_type("Owner"));
        assert!(pruned.contains_type("Int"));
        assert!(!pruned.contains_type("Rock"));
        assert_eq!(
            pruned.possible_types("Pet"),
            vec![pruned.type_id("Dog").unwrap()]
        );
    }

    #[test]
    fn pruning_runs_within_the_configured_budget() {
        let env: MapEnvironment = [(TYPEGRAPH_TRAVERSAL_MAX_STEPS, "2")].into();
        let result = SchemaPruner::from_env(&env)
            .unwrap()
            .prune(&schema_with_orphans());
        assert_eq!(result.unwrap_err(), TransformError::Cancelled(Cancelled));

        let config = EngineConfig {
            max_traversal_steps: Some(10_000),
            ..EngineConfig::default()
        };
        let pruner = SchemaPruner::new(SchemaScopeFilter::none()).with_config(config);
        // Budgets are per call
        assert!(pruner.prune(&schema_with_orphans()).is_ok());
        assert!(pruner.prune(&schema_with_orphans()).is_ok());
    }

    #[test]
    fn keeping_everything_is_an_identity() {
        let schema = schema_with_orphans();
        let pruned = SchemaPruner::new(SchemaScopeFilter::all())
            .prune(&schema)
            .unwrap();

        assert_eq!(type_names(&pruned), type_names(&schema));
        for (name, id) in schema.type_ids() {
            assert_eq!(pruned.type_id(name), Some(id));
        }
    }
}
