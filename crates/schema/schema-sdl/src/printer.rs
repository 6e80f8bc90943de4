// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Prints a [`Schema`] back to SDL.
//!
//! Directive definitions come first, then the types, each group sorted by name. Built-in scalars
//! and directives are left out unless asked for.

use async_graphql_value::ConstValue;
use common::config::EngineConfig;
use schema_env::{EnvError, Environment};
use schema_graph::{
    ElementId, Schema,
    builtins::{DEFAULT_DEPRECATION_REASON, is_builtin_directive, is_builtin_scalar},
    element::{AppliedDirectives, DirectiveDefinition, NamedElement, SchemaElement},
    type_util::type_display,
};
use tracing::instrument;

const INDENT: &str = "  ";

#[derive(Debug, Clone, Default)]
pub struct SchemaPrinter {
    include_builtins: bool,
}

impl SchemaPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new().include_builtins(config.print_builtins)
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self::from_config(&EngineConfig::from_env(env)?))
    }

    pub fn include_builtins(mut self, include_builtins: bool) -> Self {
        self.include_builtins = include_builtins;
        self
    }

    #[instrument(name = "SchemaPrinter::print", skip_all)]
    pub fn print(&self, schema: &Schema) -> String {
        let mut blocks = vec![];

        if let Some(block) = schema_block(schema) {
            blocks.push(block);
        }

        blocks.extend(
            schema
                .directives()
                .into_iter()
                .filter(|directive| self.include_builtins || !is_builtin_directive(&directive.name))
                .map(|directive| print_directive_definition(schema, directive)),
        );

        blocks.extend(
            schema
                .all_types_as_list()
                .into_iter()
                .filter(|element| self.include_builtins || !is_builtin(element))
                .map(|element| print_type(schema, element)),
        );

        let mut sdl = blocks.join("\n\n");
        sdl.push('\n');
        sdl
    }
}

fn is_builtin(element: &SchemaElement) -> bool {
    matches!(element, SchemaElement::Scalar(scalar) if is_builtin_scalar(&scalar.name))
}

/// The `schema { ... }` block, needed only when a root type has an unconventional name.
fn schema_block(schema: &Schema) -> Option<String> {
    let root = schema.root_element();
    let roots = [
        ("query", root.query, "Query"),
        ("mutation", root.mutation, "Mutation"),
        ("subscription", root.subscription, "Subscription"),
    ];

    let conventional = roots.iter().all(|(_, id, conventional)| {
        id.is_none_or(|id| schema.element(id).name() == Some(*conventional))
    });
    if conventional && schema.description().is_none() {
        return None;
    }

    let mut block = description(schema.description(), "");
    block.push_str("schema {\n");
    for (operation, id, _) in roots {
        if let Some(name) = id.and_then(|id| schema.element(id).name()) {
            block.push_str(&format!("{INDENT}{operation}: {name}\n"));
        }
    }
    block.push('}');
    Some(block)
}

fn print_directive_definition(schema: &Schema, directive: &DirectiveDefinition) -> String {
    let locations: Vec<&str> = directive.locations.iter().map(|l| l.as_str()).collect();

    format!(
        "{}directive @{}{}{} on {}",
        description(directive.description.as_deref(), ""),
        directive.name,
        print_arguments(schema, &directive.arguments, ""),
        if directive.repeatable { " repeatable" } else { "" },
        locations.join(" | ")
    )
}

fn print_type(schema: &Schema, element: &SchemaElement) -> String {
    match element {
        SchemaElement::Scalar(scalar) => {
            let specified_by = scalar
                .specified_by_url
                .as_ref()
                .map(|url| format!(" @specifiedBy(url: {})", quoted(url)))
                .unwrap_or_default();
            format!(
                "{}scalar {}{}{}",
                description(scalar.description.as_deref(), ""),
                scalar.name,
                specified_by,
                print_applied(&scalar.directives)
            )
        }
        SchemaElement::Object(object) => format!(
            "{}type {}{}{}{}",
            description(object.description.as_deref(), ""),
            object.name,
            print_implements(schema, &object.interfaces),
            print_applied(&object.directives),
            print_members(schema, &object.fields)
        ),
        SchemaElement::Interface(interface) => format!(
            "{}interface {}{}{}{}",
            description(interface.description.as_deref(), ""),
            interface.name,
            print_implements(schema, &interface.interfaces),
            print_applied(&interface.directives),
            print_members(schema, &interface.fields)
        ),
        SchemaElement::Union(union) => {
            let members: Vec<&str> = union
                .types
                .iter()
                .filter_map(|&id| schema.element(id).name())
                .collect();
            let members = if members.is_empty() {
                String::new()
            } else {
                format!(" = {}", members.join(" | "))
            };
            format!(
                "{}union {}{}{}",
                description(union.description.as_deref(), ""),
                union.name,
                print_applied(&union.directives),
                members
            )
        }
        SchemaElement::Enum(enum_type) => format!(
            "{}enum {}{}{}",
            description(enum_type.description.as_deref(), ""),
            enum_type.name,
            print_applied(&enum_type.directives),
            print_members(schema, &enum_type.values)
        ),
        SchemaElement::InputObject(input) => format!(
            "{}input {}{}{}",
            description(input.description.as_deref(), ""),
            input.name,
            print_applied(&input.directives),
            print_members(schema, &input.fields)
        ),
        other => other.to_string(),
    }
}

fn print_implements(schema: &Schema, interfaces: &[ElementId]) -> String {
    let names: Vec<&str> = interfaces
        .iter()
        .filter_map(|&id| schema.element(id).name())
        .collect();

    if names.is_empty() {
        String::new()
    } else {
        format!(" implements {}", names.join(" & "))
    }
}

/// The `{ ... }` body of a type: fields, input fields or enum values.
fn print_members(schema: &Schema, members: &[ElementId]) -> String {
    if members.is_empty() {
        return String::new();
    }

    let mut body = String::from(" {\n");
    for &id in members {
        body.push_str(&print_member(schema, schema.element(id), INDENT));
        body.push('\n');
    }
    body.push('}');
    body
}

fn print_member(schema: &Schema, element: &SchemaElement, indent: &str) -> String {
    match element {
        SchemaElement::Field(field) => format!(
            "{}{indent}{}{}: {}{}{}",
            description(field.description.as_deref(), indent),
            field.name,
            print_arguments(schema, &field.arguments, indent),
            type_display(schema.arena(), field.ty),
            print_deprecation(field.deprecation_reason.as_deref()),
            print_applied(&field.directives)
        ),
        SchemaElement::Argument(argument) => format!(
            "{}{indent}{}: {}{}{}{}",
            description(argument.description.as_deref(), indent),
            argument.name,
            type_display(schema.arena(), argument.ty),
            print_default(argument.default_value.as_ref()),
            print_deprecation(argument.deprecation_reason.as_deref()),
            print_applied(&argument.directives)
        ),
        SchemaElement::InputField(field) => format!(
            "{}{indent}{}: {}{}{}{}",
            description(field.description.as_deref(), indent),
            field.name,
            type_display(schema.arena(), field.ty),
            print_default(field.default_value.as_ref()),
            print_deprecation(field.deprecation_reason.as_deref()),
            print_applied(&field.directives)
        ),
        SchemaElement::EnumValue(value) => format!(
            "{}{indent}{}{}{}",
            description(value.description.as_deref(), indent),
            value.name,
            print_deprecation(value.deprecation_reason.as_deref()),
            print_applied(&value.directives)
        ),
        other => format!("{indent}{other}"),
    }
}

/// Arguments go on one line unless one of them has a description.
fn print_arguments(schema: &Schema, arguments: &[ElementId], indent: &str) -> String {
    if arguments.is_empty() {
        return String::new();
    }

    let described = arguments
        .iter()
        .any(|&id| schema.element(id).as_named().and_then(|n| n.description()).is_some());

    if described {
        let inner = format!("{indent}{INDENT}");
        let lines: Vec<String> = arguments
            .iter()
            .map(|&id| print_member(schema, schema.element(id), &inner))
            .collect();
        format!("(\n{}\n{indent})", lines.join("\n"))
    } else {
        let arguments: Vec<String> = arguments
            .iter()
            .map(|&id| print_member(schema, schema.element(id), ""))
            .collect();
        format!("({})", arguments.join(", "))
    }
}

fn print_default(value: Option<&ConstValue>) -> String {
    value
        .map(|value| format!(" = {value}"))
        .unwrap_or_default()
}

fn print_deprecation(reason: Option<&str>) -> String {
    match reason {
        None => String::new(),
        Some(DEFAULT_DEPRECATION_REASON) => " @deprecated".to_string(),
        Some(reason) => format!(" @deprecated(reason: {})", quoted(reason)),
    }
}

fn print_applied(directives: &AppliedDirectives) -> String {
    directives
        .iter()
        .map(|directive| {
            if directive.arguments.is_empty() {
                format!(" @{}", directive.name)
            } else {
                let arguments: Vec<String> = directive
                    .arguments
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect();
                format!(" @{}({})", directive.name, arguments.join(", "))
            }
        })
        .collect()
}

/// A description line (or block, for multi-line text) followed by a newline.
fn description(text: Option<&str>, indent: &str) -> String {
    match text {
        None => String::new(),
        Some(text) if text.contains('\n') => {
            let lines: Vec<String> = text.lines().map(|line| format!("{indent}{line}")).collect();
            format!("{indent}\"\"\"\n{}\n{indent}\"\"\"\n", lines.join("\n"))
        }
        Some(text) => format!("{indent}{}\n", quoted(text)),
    }
}

fn quoted(text: &str) -> String {
    ConstValue::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use common::env_const::TYPEGRAPH_PRINT_BUILTINS;
    use schema_env::MapEnvironment;

    use super::*;
    use crate::{generator::SchemaGenerator, wiring::RuntimeWiring};

    fn print(sdl: &str) -> String {
        let schema = SchemaGenerator::from_sdl(sdl, RuntimeWiring::mocked()).unwrap();
        SchemaPrinter::new().print(&schema)
    }

    #[test]
    fn prints_types_sorted_by_name() {
        let printed = print(
            r#"
            type Query { venues: [Venue!]! concert(id: ID!): Concert }
            "A live performance"
            type Concert implements Node { id: ID! title(upper: Boolean = false): String }
            interface Node { id: ID! }
            type Venue { name: String @deprecated(reason: "Use `title`") title: String }
            enum Genre { JAZZ ROCK @deprecated }
            input ConcertFilter { title: String = "x" genre: Genre }
            union Searchable = Concert | Venue
            "#,
        );

        insta::assert_snapshot!(printed, @r#"
        "A live performance"
        type Concert implements Node {
          id: ID!
          title(upper: Boolean = false): String
        }

        input ConcertFilter {
          title: String = "x"
          genre: Genre
        }

        enum Genre {
          JAZZ
          ROCK @deprecated
        }

        interface Node {
          id: ID!
        }

        type Query {
          venues: [Venue!]!
          concert(id: ID!): Concert
        }

        union Searchable = Concert | Venue

        type Venue {
          name: String @deprecated(reason: "Use `title`")
          title: String
        }
        "#);
    }

    #[test]
    fn prints_directives_and_unconventional_roots() {
        let printed = print(
            r#"
            schema { query: Root }
            directive @auth(role: String!) on OBJECT | FIELD_DEFINITION
            type Root @auth(role: "admin") {
                "Whether the service is up"
                ok(
                    "Include details"
                    verbose: Boolean
                ): Boolean
            }
            "#,
        );

        insta::assert_snapshot!(printed, @r#"
        schema {
          query: Root
        }

        directive @auth(role: String!) on OBJECT | FIELD_DEFINITION

        type Root @auth(role: "admin") {
          "Whether the service is up"
          ok(
            "Include details"
            verbose: Boolean
          ): Boolean
        }
        "#);
    }

    #[test]
    fn builtins_on_request() {
        let schema = SchemaGenerator::from_sdl(
            "type Query { ok: Boolean }",
            RuntimeWiring::mocked(),
        )
        .unwrap();

        let env: MapEnvironment = [(TYPEGRAPH_PRINT_BUILTINS, "true")].into();
        let printed = SchemaPrinter::from_env(&env).unwrap().print(&schema);

        assert!(printed.contains("scalar Boolean"));
        assert!(printed.contains(
            "directive @skip(if: Boolean!) on FIELD | FRAGMENT_SPREAD | INLINE_FRAGMENT"
        ));
        assert!(!SchemaPrinter::new().print(&schema).contains("scalar Boolean"));
    }
}
