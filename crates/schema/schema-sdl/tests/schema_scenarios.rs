// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use common::scope::SchemaScopeFilter;
use schema_graph::{
    Schema,
    builder::{FieldBuilder, ObjectTypeBuilder, TypeBuilder, TypeExpr},
    element::{ObjectType, SchemaElement},
    prune::SchemaPruner,
    resolution::reachable_elements,
    transform::SchemaTransformer,
    traversal::TraversalControl,
    visitor::{SchemaTraverser, SchemaVisitor, VisitContext, VisitResult},
};
use schema_sdl::{RuntimeWiring, SchemaGenerator, SchemaPrinter};
use test_log::test;

const CONCERTS: &str = r#"
    type Query {
        concerts: [Concert!]!
        foo(id: ID!): Foo
    }

    type Concert {
        id: ID!
        title: String
        venue: Venue
    }

    type Venue {
        name: String
        concerts: [Concert!]!
    }

    type Foo {
        id: ID!
        related: [Foo!]
        concert: Concert
    }

    type Unused {
        note: String
    }
"#;

fn schema(sdl: &str) -> Schema {
    SchemaGenerator::from_sdl(sdl, RuntimeWiring::mocked()).unwrap()
}

fn print(schema: &Schema) -> String {
    SchemaPrinter::new().print(schema)
}

#[derive(Default)]
struct EntryCounter {
    node_entries: usize,
    cycles: Vec<String>,
}

impl SchemaVisitor for EntryCounter {
    fn visit_object(
        &mut self,
        object: &ObjectType,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        if object.name == "Node" {
            self.node_entries += 1;
        }
        VisitResult::CONTINUE
    }

    fn visit_back_ref(
        &mut self,
        element: &SchemaElement,
        ctx: &mut VisitContext<'_, '_>,
    ) -> TraversalControl {
        if ctx.is_cycle() {
            let field = ctx.parent_element().and_then(|parent| parent.name());
            self.cycles.push(format!(
                "{}.{}",
                element.name().unwrap_or_default(),
                field.unwrap_or_default()
            ));
        }
        TraversalControl::Continue
    }
}

#[test]
fn self_referencing_types_traverse_to_completion() {
    let schema = schema(
        r#"
        type Query { node: Node }
        type Node { id: ID! next: Node }
        "#,
    );
    let mut counter = EntryCounter::default();

    let result = SchemaTraverser::new().visit(&schema, &mut counter).unwrap();

    assert!(result.is_completed());
    assert_eq!(counter.node_entries, 1);
    assert_eq!(counter.cycles, vec!["Node.next"]);
}

#[test]
fn built_schemas_hold_no_type_references() {
    let schema = schema(CONCERTS);

    let references = reachable_elements(schema.arena(), &[schema.root()])
        .into_iter()
        .filter(|&id| matches!(schema.element(id), SchemaElement::TypeReference(_)))
        .count();

    assert_eq!(references, 0);
}

struct Identity;
impl SchemaVisitor for Identity {}

#[test]
fn identity_transformation_prints_the_same_schema() {
    let schema = schema(CONCERTS);

    let transformed = SchemaTransformer::new()
        .transform(&schema, &mut Identity)
        .unwrap();

    assert_eq!(print(&transformed), print(&schema));
}

struct RenameFoo;

impl SchemaVisitor for RenameFoo {
    fn visit_object(
        &mut self,
        object: &ObjectType,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        if object.name == "Foo" {
            VisitResult::change_node(SchemaElement::Object(ObjectType {
                name: "Bar".to_string(),
                ..object.clone()
            }))
        } else {
            VisitResult::CONTINUE
        }
    }
}

#[test]
fn renaming_leaves_no_reference_to_the_old_name() {
    let schema = schema(CONCERTS);

    let renamed = SchemaTransformer::new()
        .transform(&schema, &mut RenameFoo)
        .unwrap();
    let printed = print(&renamed);

    assert!(!printed.contains("Foo"));
    assert!(printed.contains("type Bar {"));
    assert!(printed.contains("related: [Bar!]"));
    assert!(printed.contains("foo(id: ID!): Bar"));
    assert!(print(&schema).contains("type Foo {"));
}

/// Adds a `capacity` field to `Venue`.
struct AddCapacity;

impl SchemaVisitor for AddCapacity {
    fn visit_object(&mut self, object: &ObjectType, ctx: &mut VisitContext<'_, '_>) -> VisitResult {
        if object.name != "Venue" {
            return VisitResult::CONTINUE;
        }

        let Some(arena) = ctx.arena_mut() else {
            return VisitResult::ABORT;
        };
        let venue = ObjectTypeBuilder::from_existing(arena, object)
            .field(FieldBuilder::new("capacity", TypeExpr::named("Int")))
            .build_element(arena);

        match venue {
            Ok(venue) => VisitResult::change_node(venue),
            Err(_) => VisitResult::ABORT,
        }
    }
}

#[test]
fn editing_one_type_shares_every_other_type() {
    let schema = schema(CONCERTS);

    let edited = SchemaTransformer::new()
        .transform(&schema, &mut AddCapacity)
        .unwrap();

    assert!(edited.field_definition("Venue", "capacity").is_some());
    assert!(schema.field_definition("Venue", "capacity").is_none());
    assert!(edited.contains_type("Int"));

    for (name, id) in schema.type_ids() {
        if name == "Venue" {
            assert!(!Arc::ptr_eq(schema.element_arc(id), edited.element_arc(id)));
        } else {
            assert!(
                Arc::ptr_eq(schema.element_arc(id), edited.element_arc(id)),
                "{name} was rebuilt"
            );
        }
    }

    insta::assert_snapshot!(print(&edited), @r#"
    type Concert {
      id: ID!
      title: String
      venue: Venue
    }

    type Foo {
      id: ID!
      related: [Foo!]
      concert: Concert
    }

    type Query {
      concerts: [Concert!]!
      foo(id: ID!): Foo
    }

    type Unused {
      note: String
    }

    type Venue {
      name: String
      concerts: [Concert!]!
      capacity: Int
    }
    "#);
}

#[test]
fn pruning_drops_unreachable_types() {
    let schema = schema(CONCERTS);

    let pruned = SchemaPruner::new(SchemaScopeFilter::none())
        .prune(&schema)
        .unwrap();

    assert!(!pruned.contains_type("Unused"));
    assert!(pruned.contains_type("Venue"));
    assert!(!print(&pruned).contains("Unused"));
}
