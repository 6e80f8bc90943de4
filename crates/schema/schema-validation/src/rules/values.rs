// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Checks a literal against the type expected at its position.

use async_graphql_value::Value;
use schema_graph::{
    Schema,
    element::{NamedElement, SchemaElement},
    type_util::TypeShape,
};

/// Why `value` cannot be used where `expected` is required, or `None` if it can. Variables are
/// accepted here and checked against their definitions elsewhere.
pub(crate) fn literal_problem(
    schema: &Schema,
    value: &Value,
    expected: &TypeShape,
) -> Option<String> {
    match (value, expected) {
        (Value::Variable(_), _) => None,
        (Value::Null, TypeShape::NonNull(_)) => {
            Some(format!("null is not allowed for non-null type '{expected}'"))
        }
        (_, TypeShape::NonNull(inner)) => literal_problem(schema, value, inner),
        (Value::Null, _) => None,
        (Value::List(items), TypeShape::List(item_type)) => {
            items.iter().enumerate().find_map(|(index, item)| {
                literal_problem(schema, item, item_type)
                    .map(|problem| format!("list item {index}: {problem}"))
            })
        }
        (_, TypeShape::List(item_type)) => literal_problem(schema, value, item_type),
        (_, TypeShape::Named(name)) => match schema.type_by_name(name)? {
            SchemaElement::Scalar(scalar) => scalar_problem(schema, value, &scalar.name),
            SchemaElement::Enum(enum_type) => match value {
                Value::Enum(variant) => {
                    let known = enum_type.values.iter().any(|&id| {
                        schema.element(id).name() == Some(variant.as_str())
                    });
                    (!known).then(|| {
                        format!("'{variant}' is not a value of enum '{}'", enum_type.name)
                    })
                }
                _ => Some(format!("expected an enum value of '{}'", enum_type.name)),
            },
            SchemaElement::InputObject(input_object) => {
                let Value::Object(fields) = value else {
                    return Some(format!("expected an input object of '{}'", input_object.name));
                };

                let definitions: Vec<_> = input_object
                    .fields
                    .iter()
                    .filter_map(|&id| match schema.element(id) {
                        SchemaElement::InputField(field) => Some(field),
                        _ => None,
                    })
                    .collect();

                if let Some(unknown) = fields
                    .keys()
                    .find(|key| definitions.iter().all(|field| field.name() != key.as_str()))
                {
                    return Some(format!(
                        "'{unknown}' is not a field of input object '{}'",
                        input_object.name
                    ));
                }

                definitions.iter().find_map(|field| {
                    let field_type = TypeShape::from_element(schema.arena(), field.ty)?;
                    match fields.iter().find(|(key, _)| key.as_str() == field.name) {
                        Some((_, field_value)) => literal_problem(schema, field_value, &field_type)
                            .map(|problem| format!("field '{}': {problem}", field.name)),
                        None if field_type.is_non_null() && field.default_value.is_none() => {
                            Some(format!("missing required field '{}'", field.name))
                        }
                        None => None,
                    }
                })
            }
            _ => None,
        },
    }
}

fn scalar_problem(schema: &Schema, value: &Value, scalar_name: &str) -> Option<String> {
    // Coercions only see constant literals.
    value.clone().into_const()?;

    schema
        .code_registry()
        .coercing(scalar_name)
        .parse_literal(value)
        .err()
        .map(|error| error.to_string())
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::{parse_query, types::Selection};
    use schema_sdl::{RuntimeWiring, SchemaGenerator};

    use super::*;

    fn schema() -> Schema {
        SchemaGenerator::from_sdl(
            r#"
            type Query { concerts(filter: ConcertFilter): [String] }
            enum Genre { JAZZ ROCK }
            input ConcertFilter { genre: Genre, limit: Int!, title: String = "any" }
            "#,
            RuntimeWiring::new(),
        )
        .unwrap()
    }

    fn literal(text: &str) -> Value {
        let document = parse_query(format!("{{ f(value: {text}) }}")).unwrap();
        let (_, operation) = document.operations.iter().next().unwrap();
        match &operation.node.selection_set.node.items[0].node {
            Selection::Field(field) => field.node.arguments[0].1.node.clone(),
            _ => unreachable!(),
        }
    }

    fn shape(text: &str) -> TypeShape {
        TypeShape::from_type(&async_graphql_parser::types::Type::new(text).unwrap())
    }

    fn problem(text: &str, expected: &str) -> Option<String> {
        literal_problem(&schema(), &literal(text), &shape(expected))
    }

    #[test]
    fn accepts_valid_literals() {
        assert_eq!(problem("{ limit: 10, genre: JAZZ }", "ConcertFilter"), None);
        assert_eq!(problem("[1, 2]", "[Int]"), None);
        assert_eq!(problem("3", "[Int!]!"), None);
        assert_eq!(problem("null", "Int"), None);
        assert_eq!(problem("$limit", "Int!"), None);
    }

    #[test]
    fn explains_the_first_problem() {
        assert_eq!(
            problem("{ genre: JAZZ }", "ConcertFilter").as_deref(),
            Some("missing required field 'limit'")
        );
        assert_eq!(
            problem("{ limit: 1, venue: \"Hall\" }", "ConcertFilter").as_deref(),
            Some("'venue' is not a field of input object 'ConcertFilter'")
        );
        assert_eq!(
            problem("{ limit: \"ten\" }", "ConcertFilter").as_deref(),
            Some("field 'limit': Expected an integer literal but was a string")
        );
        assert_eq!(
            problem("POLKA", "Genre").as_deref(),
            Some("'POLKA' is not a value of enum 'Genre'")
        );
        assert_eq!(
            problem("[1, null]", "[Int!]").as_deref(),
            Some("list item 1: null is not allowed for non-null type 'Int!'")
        );
    }
}
