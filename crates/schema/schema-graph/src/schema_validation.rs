// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Structural rules of a type system, checked when a schema is assembled.
//!
//! All problems are collected and reported together in [`SchemaError::InvalidSchema`].

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::{
    arena::{ElementId, GraphArena},
    element::{ArgumentDefinition, FieldDefinition, NamedElement, SchemaElement},
    error::SchemaError,
    type_util::{TypeShape, is_input_type, is_output_type, type_display},
};

pub(crate) fn validate(
    arena: &GraphArena,
    types: &BTreeMap<String, ElementId>,
) -> Result<(), SchemaError> {
    let mut problems = vec![];

    for (name, &id) in types {
        match &arena[id] {
            SchemaElement::Object(object) => {
                check_fields(arena, name, &object.fields, &mut problems);
                check_implementations(
                    arena,
                    name,
                    &object.fields,
                    &object.interfaces,
                    &mut problems,
                );
            }
            SchemaElement::Interface(interface) => {
                check_fields(arena, name, &interface.fields, &mut problems);
                check_implementations(
                    arena,
                    name,
                    &interface.fields,
                    &interface.interfaces,
                    &mut problems,
                );
            }
            SchemaElement::Union(union) => {
                for &member in &union.types {
                    if !matches!(arena[member], SchemaElement::Object(_)) {
                        problems.push(format!(
                            "Union '{name}' can only include object types, but includes {}",
                            arena[member]
                        ));
                    }
                }
            }
            SchemaElement::Enum(enum_type) => {
                if enum_type.values.is_empty() {
                    problems.push(format!("Enum '{name}' must define one or more values"));
                }
            }
            SchemaElement::InputObject(input) => {
                for &field in &input.fields {
                    if let SchemaElement::InputField(field) = &arena[field] {
                        if !is_input_type(arena, field.ty) {
                            problems.push(format!(
                                "The type of '{name}.{}' must be an input type, but is '{}'",
                                field.name,
                                type_display(arena, field.ty)
                            ));
                        }
                    }
                }
                check_non_null_input_cycle(arena, id, &mut problems);
            }
            _ => {}
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        debug!(count = problems.len(), "schema structure problems");
        Err(SchemaError::InvalidSchema { problems })
    }
}

fn fields_of<'a>(
    arena: &'a GraphArena,
    ids: &'a [ElementId],
) -> impl Iterator<Item = &'a FieldDefinition> {
    ids.iter().filter_map(|&id| match &arena[id] {
        SchemaElement::Field(field) => Some(field),
        _ => None,
    })
}

fn arguments_of<'a>(
    arena: &'a GraphArena,
    ids: &'a [ElementId],
) -> impl Iterator<Item = &'a ArgumentDefinition> {
    ids.iter().filter_map(|&id| match &arena[id] {
        SchemaElement::Argument(argument) => Some(argument),
        _ => None,
    })
}

fn check_fields(
    arena: &GraphArena,
    owner: &str,
    fields: &[ElementId],
    problems: &mut Vec<String>,
) {
    for field in fields_of(arena, fields) {
        if !is_output_type(arena, field.ty) {
            problems.push(format!(
                "The type of '{owner}.{}' must be an output type, but is '{}'",
                field.name,
                type_display(arena, field.ty)
            ));
        }

        for argument in arguments_of(arena, &field.arguments) {
            if !is_input_type(arena, argument.ty) {
                problems.push(format!(
                    "The type of '{owner}.{}({}:)' must be an input type, but is '{}'",
                    field.name,
                    argument.name,
                    type_display(arena, argument.ty)
                ));
            }
        }
    }
}

fn check_implementations(
    arena: &GraphArena,
    owner: &str,
    fields: &[ElementId],
    interfaces: &[ElementId],
    problems: &mut Vec<String>,
) {
    for &interface_id in interfaces {
        let SchemaElement::Interface(interface) = &arena[interface_id] else {
            problems.push(format!(
                "'{owner}' can only implement interface types, but implements {}",
                arena[interface_id]
            ));
            continue;
        };

        for expected in fields_of(arena, &interface.fields) {
            let Some(actual) = fields_of(arena, fields).find(|f| f.name == expected.name) else {
                problems.push(format!(
                    "Interface field '{}.{}' expected but '{owner}' does not provide it",
                    interface.name, expected.name
                ));
                continue;
            };

            if !is_covariant(arena, actual.ty, expected.ty) {
                problems.push(format!(
                    "Interface field '{}.{}' expects type '{}' but '{owner}.{}' is type '{}'",
                    interface.name,
                    expected.name,
                    type_display(arena, expected.ty),
                    actual.name,
                    type_display(arena, actual.ty)
                ));
            }

            for expected_argument in arguments_of(arena, &expected.arguments) {
                let actual_argument = arguments_of(arena, &actual.arguments)
                    .find(|a| a.name == expected_argument.name);
                match actual_argument {
                    None => problems.push(format!(
                        "Interface field argument '{}.{}({}:)' expected but '{owner}.{}' does not provide it",
                        interface.name, expected.name, expected_argument.name, actual.name
                    )),
                    Some(actual_argument)
                        if TypeShape::from_element(arena, actual_argument.ty)
                            != TypeShape::from_element(arena, expected_argument.ty) =>
                    {
                        problems.push(format!(
                            "Interface field argument '{}.{}({}:)' expects type '{}' but '{owner}.{}({}:)' is type '{}'",
                            interface.name,
                            expected.name,
                            expected_argument.name,
                            type_display(arena, expected_argument.ty),
                            actual.name,
                            actual_argument.name,
                            type_display(arena, actual_argument.ty)
                        ));
                    }
                    Some(_) => {}
                }
            }

            for extra in arguments_of(arena, &actual.arguments) {
                let declared =
                    arguments_of(arena, &expected.arguments).any(|a| a.name == extra.name);
                if !declared
                    && matches!(arena[extra.ty], SchemaElement::NonNull(_))
                    && extra.default_value.is_none()
                {
                    problems.push(format!(
                        "'{owner}.{}({}:)' is required, but it is not declared by interface field '{}.{}'",
                        actual.name,
                        extra.name(),
                        interface.name,
                        expected.name
                    ));
                }
            }
        }
    }
}

/// Whether a field of type `sub` satisfies an interface field of type `sup`.
fn is_covariant(arena: &GraphArena, sub: ElementId, sup: ElementId) -> bool {
    if sub == sup {
        return true;
    }

    match (&arena[sub], &arena[sup]) {
        (SchemaElement::NonNull(a), SchemaElement::NonNull(b)) => {
            is_covariant(arena, a.wrapped, b.wrapped)
        }
        (_, SchemaElement::NonNull(_)) => false,
        (SchemaElement::NonNull(a), _) => is_covariant(arena, a.wrapped, sup),
        (SchemaElement::List(a), SchemaElement::List(b)) => {
            is_covariant(arena, a.wrapped, b.wrapped)
        }
        (SchemaElement::List(_), _) | (_, SchemaElement::List(_)) => false,
        (SchemaElement::Object(object), SchemaElement::Interface(_)) => {
            object.interfaces.contains(&sup)
        }
        (SchemaElement::Interface(interface), SchemaElement::Interface(_)) => {
            interface.interfaces.contains(&sup)
        }
        (SchemaElement::Object(_), SchemaElement::Union(union)) => union.types.contains(&sub),
        _ => false,
    }
}

/// The input object directly referenced by a `T!` field, if any.
fn non_null_input_object(arena: &GraphArena, ty: ElementId) -> Option<ElementId> {
    match &arena[ty] {
        SchemaElement::NonNull(non_null)
            if matches!(arena[non_null.wrapped], SchemaElement::InputObject(_)) =>
        {
            Some(non_null.wrapped)
        }
        _ => None,
    }
}

/// Reports an input object that cannot be instantiated because it requires itself through a
/// chain of non-null fields.
fn check_non_null_input_cycle(arena: &GraphArena, start: ElementId, problems: &mut Vec<String>) {
    let mut visited = HashSet::new();
    // (input object, field path leading to it)
    let mut stack: Vec<(ElementId, Vec<String>)> = vec![(start, vec![])];

    while let Some((id, path)) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        let SchemaElement::InputObject(input) = &arena[id] else {
            continue;
        };

        for &field in &input.fields {
            let SchemaElement::InputField(field) = &arena[field] else {
                continue;
            };
            let Some(target) = non_null_input_object(arena, field.ty) else {
                continue;
            };

            let mut field_path = path.clone();
            field_path.push(field.name.clone());

            if target == start {
                problems.push(format!(
                    "Cannot reference input object '{}' within itself through a series of non-null fields: '{}'",
                    input_name(arena, start),
                    field_path.join(".")
                ));
                return;
            }
            stack.push((target, field_path));
        }
    }
}

fn input_name(arena: &GraphArena, id: ElementId) -> &str {
    arena[id].name().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        builder::{
            ArgumentBuilder, EnumTypeBuilder, FieldBuilder, InputFieldBuilder,
            InputObjectTypeBuilder, InterfaceTypeBuilder, ObjectTypeBuilder, SchemaBuilder,
            TypeExpr, UnionTypeBuilder,
        },
        code_registry::{CodeRegistry, TypenameTypeResolver},
    };

    fn problems(builder: Result<SchemaBuilder, SchemaError>) -> Vec<String> {
        let result = builder
            .map(|b| {
                b.code_registry(
                    CodeRegistry::new().with_default_type_resolver(Arc::new(TypenameTypeResolver)),
                )
            })
            .and_then(|b| b.build());

        match result {
            Err(SchemaError::InvalidSchema { problems }) => problems,
            other => panic!("expected an invalid schema, got {other:?}"),
        }
    }

    fn with_query(field: FieldBuilder) -> Result<SchemaBuilder, SchemaError> {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(ObjectTypeBuilder::new("Query").field(field))
    }

    #[test]
    fn union_members_must_be_objects() {
        let problems = problems(
            with_query(FieldBuilder::new("search", TypeExpr::named("Result")))
                .and_then(|b| b.add_type(UnionTypeBuilder::new("Result").member("String"))),
        );

        assert_eq!(
            problems,
            vec!["Union 'Result' can only include object types, but includes scalar type 'String'"]
        );
    }

    #[test]
    fn implementations_must_match() {
        let problems = problems(
            with_query(FieldBuilder::new("node", TypeExpr::named("Node")))
                .and_then(|b| {
                    b.add_type(
                        InterfaceTypeBuilder::new("Node")
                            .field(FieldBuilder::new("id", TypeExpr::named("ID").non_null()))
                            .field(
                                FieldBuilder::new("label", TypeExpr::named("String")).argument(
                                    ArgumentBuilder::new("lang", TypeExpr::named("String")),
                                ),
                            ),
                    )
                })
                .and_then(|b| {
                    b.add_type(
                        ObjectTypeBuilder::new("User")
                            .interface("Node")
                            .field(FieldBuilder::new("id", TypeExpr::named("ID")))
                            .field(FieldBuilder::new("label", TypeExpr::named("String"))),
                    )
                }),
        );

        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("expects type 'ID!' but 'User.id' is type 'ID'"));
        assert!(problems[1].contains("'Node.label(lang:)' expected"));
    }

    #[test]
    fn covariant_fields_are_accepted() {
        let schema = with_query(FieldBuilder::new("node", TypeExpr::named("Node")))
            .and_then(|b| {
                b.add_type(
                    InterfaceTypeBuilder::new("Node")
                        .field(FieldBuilder::new("parent", TypeExpr::named("Node"))),
                )
            })
            .and_then(|b| {
                b.add_type(
                    ObjectTypeBuilder::new("Folder")
                        .interface("Node")
                        .field(FieldBuilder::new("parent", TypeExpr::named("Folder").non_null())),
                )
            })
            .map(|b| {
                b.code_registry(
                    CodeRegistry::new().with_default_type_resolver(Arc::new(TypenameTypeResolver)),
                )
            })
            .and_then(|b| b.build());

        assert!(schema.is_ok());
    }

    #[test]
    fn input_and_output_positions() {
        let problems = problems(
            with_query(
                FieldBuilder::new("find", TypeExpr::named("Filter"))
                    .argument(ArgumentBuilder::new("by", TypeExpr::named("Query"))),
            )
            .and_then(|b| {
                b.add_type(
                    InputObjectTypeBuilder::new("Filter")
                        .field(InputFieldBuilder::new("name", TypeExpr::named("String"))),
                )
            })
            .and_then(|b| b.add_type(EnumTypeBuilder::new("Empty"))),
        );

        assert_eq!(problems.len(), 3);
        assert!(problems.contains(&"Enum 'Empty' must define one or more values".to_string()));
        assert!(problems.iter().any(|p| p.contains("'Query.find' must be an output type")));
        assert!(problems.iter().any(|p| p.contains("'Query.find(by:)' must be an input type")));
    }

    #[test]
    fn non_null_input_cycles() {
        let problems = problems(
            with_query(
                FieldBuilder::new("search", TypeExpr::named("String"))
                    .argument(ArgumentBuilder::new("filter", TypeExpr::named("Filter"))),
            )
            .and_then(|b| {
                b.add_type(
                    InputObjectTypeBuilder::new("Filter")
                        .field(InputFieldBuilder::new("and", TypeExpr::named("Filter").non_null())),
                )
            }),
        );

        assert_eq!(
            problems,
            vec![
                "Cannot reference input object 'Filter' within itself through a series of non-null fields: 'and'"
            ]
        );
    }
}
