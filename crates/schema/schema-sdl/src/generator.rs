// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Turns registered SDL definitions into a [`Schema`].
//!
//! Every type is built with its field, argument and member types written by name, so the
//! definitions can be processed in any order. Names are resolved once the whole schema is
//! assembled.

use async_graphql_parser::{
    Positioned,
    types::{
        ConstDirective, DirectiveDefinition, FieldDefinition, InputValueDefinition,
        TypeDefinition, TypeKind,
    },
};
use async_graphql_value::ConstValue;
use heck::ToShoutySnakeCase;
use schema_graph::{
    Schema,
    builder::{
        ArgumentBuilder, DefinitionBuilder, DirectiveBuilder, EnumTypeBuilder, EnumValueBuilder,
        FieldBuilder, InputFieldBuilder, InputObjectTypeBuilder, InterfaceTypeBuilder,
        ObjectTypeBuilder, ScalarTypeBuilder, SchemaBuilder, TypeExpr, UnionTypeBuilder,
    },
    builtins::DEFAULT_DEPRECATION_REASON,
    element::{AppliedDirective, DirectiveLocation},
};
use tracing::{debug, instrument};

use crate::{error::SdlError, registry::TypeDefinitionRegistry, wiring::RuntimeWiring};

const DEPRECATED: &str = "deprecated";
const SPECIFIED_BY: &str = "specifiedBy";

pub struct SchemaGenerator;

impl SchemaGenerator {
    #[instrument(
        name = "SchemaGenerator::make_executable",
        skip_all,
        fields(types = registry.len())
    )]
    pub fn make_executable(
        registry: &TypeDefinitionRegistry,
        wiring: RuntimeWiring,
    ) -> Result<Schema, SdlError> {
        let roots = registry.root_type_names();

        let mut builder = SchemaBuilder::new().code_registry(wiring.into_code_registry());
        if let Some(query) = roots.query {
            builder = builder.query_type(query);
        }
        if let Some(mutation) = roots.mutation {
            builder = builder.mutation_type(mutation);
        }
        if let Some(subscription) = roots.subscription {
            builder = builder.subscription_type(subscription);
        }

        for definition in registry.type_definitions() {
            let extensions: Vec<_> = registry
                .extensions(definition.name.node.as_str())
                .collect();
            builder = add_type(builder, registry, definition, &extensions)?;
        }

        for directive in registry.directive_definitions() {
            builder = builder.add_directive(directive_builder(registry, directive)?)?;
        }

        let schema = builder.build()?;
        debug!(types = schema.type_ids().count(), "Generated schema");
        Ok(schema)
    }

    /// Parses, registers and generates in one go.
    pub fn from_sdl(sdl: &str, wiring: RuntimeWiring) -> Result<Schema, SdlError> {
        Self::make_executable(&TypeDefinitionRegistry::parse(sdl)?, wiring)
    }
}

fn add_type(
    builder: SchemaBuilder,
    registry: &TypeDefinitionRegistry,
    definition: &TypeDefinition,
    extensions: &[&TypeDefinition],
) -> Result<SchemaBuilder, SdlError> {
    let name = definition.name.node.as_str();
    let parts: Vec<&TypeDefinition> = std::iter::once(definition)
        .chain(extensions.iter().copied())
        .collect();
    let directives: Vec<&Positioned<ConstDirective>> = parts
        .iter()
        .flat_map(|part| part.directives.iter())
        .collect();
    let description = definition.description.as_ref();

    let builder = match &definition.kind {
        TypeKind::Scalar => {
            let mut scalar = ScalarTypeBuilder::new(name);
            if let Some(url) = specified_by(&directives) {
                scalar = scalar.specified_by_url(url);
            }
            let scalar = with_meta(scalar, description, directives.iter().copied(), registry);
            builder.add_type(scalar)?
        }
        TypeKind::Object(_) => {
            let mut object = ObjectTypeBuilder::new(name);
            for part in &parts {
                if let TypeKind::Object(part) = &part.kind {
                    for interface in &part.implements {
                        object = object.interface(interface.node.as_str());
                    }
                    for field in &part.fields {
                        object = object.field(field_builder(registry, &field.node));
                    }
                }
            }
            let object = with_meta(object, description, directives.iter().copied(), registry);
            builder.add_type(object)?
        }
        TypeKind::Interface(_) => {
            let mut interface = InterfaceTypeBuilder::new(name);
            for part in &parts {
                if let TypeKind::Interface(part) = &part.kind {
                    for implemented in &part.implements {
                        interface = interface.interface(implemented.node.as_str());
                    }
                    for field in &part.fields {
                        interface = interface.field(field_builder(registry, &field.node));
                    }
                }
            }
            let interface = with_meta(interface, description, directives.iter().copied(), registry);
            builder.add_type(interface)?
        }
        TypeKind::Union(_) => {
            let mut union = UnionTypeBuilder::new(name);
            for part in &parts {
                if let TypeKind::Union(part) = &part.kind {
                    for member in &part.members {
                        union = union.member(member.node.as_str());
                    }
                }
            }
            let union = with_meta(union, description, directives.iter().copied(), registry);
            builder.add_type(union)?
        }
        TypeKind::Enum(_) => {
            let mut enum_type = EnumTypeBuilder::new(name);
            for part in &parts {
                if let TypeKind::Enum(part) = &part.kind {
                    for value in &part.values {
                        let value = &value.node;
                        let mut builder = EnumValueBuilder::new(value.value.node.as_str());
                        if let Some(reason) = deprecation(&value.directives) {
                            builder = builder.deprecated(reason);
                        }
                        enum_type = enum_type.enum_value(with_meta(
                            builder,
                            value.description.as_ref(),
                            &value.directives,
                            registry,
                        ));
                    }
                }
            }
            let enum_type = with_meta(enum_type, description, directives.iter().copied(), registry);
            builder.add_type(enum_type)?
        }
        TypeKind::InputObject(_) => {
            let mut input = InputObjectTypeBuilder::new(name);
            for part in &parts {
                if let TypeKind::InputObject(part) = &part.kind {
                    for field in &part.fields {
                        input = input.field(input_field_builder(registry, &field.node));
                    }
                }
            }
            let input = with_meta(input, description, directives.iter().copied(), registry);
            builder.add_type(input)?
        }
    };

    Ok(builder)
}

fn field_builder(registry: &TypeDefinitionRegistry, field: &FieldDefinition) -> FieldBuilder {
    let mut builder = FieldBuilder::new(field.name.node.as_str(), TypeExpr::from(&field.ty.node));
    for argument in &field.arguments {
        builder = builder.argument(argument_builder(registry, &argument.node));
    }
    if let Some(reason) = deprecation(&field.directives) {
        builder = builder.deprecated(reason);
    }
    with_meta(
        builder,
        field.description.as_ref(),
        &field.directives,
        registry,
    )
}

fn argument_builder(
    registry: &TypeDefinitionRegistry,
    argument: &InputValueDefinition,
) -> ArgumentBuilder {
    let mut builder = ArgumentBuilder::new(
        argument.name.node.as_str(),
        TypeExpr::from(&argument.ty.node),
    );
    if let Some(default_value) = &argument.default_value {
        builder = builder.default_value(default_value.node.clone());
    }
    if let Some(reason) = deprecation(&argument.directives) {
        builder = builder.deprecated(reason);
    }
    with_meta(
        builder,
        argument.description.as_ref(),
        &argument.directives,
        registry,
    )
}

fn input_field_builder(
    registry: &TypeDefinitionRegistry,
    field: &InputValueDefinition,
) -> InputFieldBuilder {
    let mut builder =
        InputFieldBuilder::new(field.name.node.as_str(), TypeExpr::from(&field.ty.node));
    if let Some(default_value) = &field.default_value {
        builder = builder.default_value(default_value.node.clone());
    }
    if let Some(reason) = deprecation(&field.directives) {
        builder = builder.deprecated(reason);
    }
    with_meta(
        builder,
        field.description.as_ref(),
        &field.directives,
        registry,
    )
}

fn directive_builder(
    registry: &TypeDefinitionRegistry,
    directive: &DirectiveDefinition,
) -> Result<DirectiveBuilder, SdlError> {
    let locations = directive
        .locations
        .iter()
        .map(|location| {
            format!("{:?}", location.node)
                .to_shouty_snake_case()
                .parse::<DirectiveLocation>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut builder = DirectiveBuilder::new(directive.name.node.as_str())
        .locations(locations)
        .repeatable(directive.is_repeatable);
    for argument in &directive.arguments {
        builder = builder.argument(argument_builder(registry, &argument.node));
    }
    if let Some(description) = &directive.description {
        builder = builder.description(description.node.clone());
    }

    Ok(builder)
}

/// Sets the description and applies every directive that is not mapped onto the element itself.
fn with_meta<'a, B: DefinitionBuilder>(
    mut builder: B,
    description: Option<&Positioned<String>>,
    directives: impl IntoIterator<Item = &'a Positioned<ConstDirective>>,
    registry: &TypeDefinitionRegistry,
) -> B {
    if let Some(description) = description {
        builder = builder.description(description.node.clone());
    }

    for directive in directives {
        let name = directive.node.name.node.as_str();
        if name == DEPRECATED || name == SPECIFIED_BY {
            continue;
        }

        let applied = directive.node.arguments.iter().fold(
            AppliedDirective::new(name),
            |applied, (argument, value)| {
                applied.argument(argument.node.as_str(), value.node.clone())
            },
        );

        let repeatable = registry
            .directive_definition(name)
            .is_some_and(|definition| definition.is_repeatable);
        builder = if repeatable {
            builder.repeatable_directive(applied)
        } else {
            builder.directive(applied)
        };
    }

    builder
}

fn deprecation<'a>(
    directives: impl IntoIterator<Item = &'a Positioned<ConstDirective>>,
) -> Option<String> {
    directives
        .into_iter()
        .find(|directive| directive.node.name.node.as_str() == DEPRECATED)
        .map(|directive| match directive.node.get_argument("reason") {
            Some(Positioned {
                node: ConstValue::String(reason),
                ..
            }) => reason.clone(),
            _ => DEFAULT_DEPRECATION_REASON.to_string(),
        })
}

fn specified_by(directives: &[&Positioned<ConstDirective>]) -> Option<String> {
    directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == SPECIFIED_BY)
        .and_then(|directive| match directive.node.get_argument("url") {
            Some(Positioned {
                node: ConstValue::String(url),
                ..
            }) => Some(url.clone()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use schema_graph::element::SchemaElement;

    use super::*;

    #[test]
    fn maps_deprecation_and_directives() {
        let schema = SchemaGenerator::from_sdl(
            r#"
            directive @auth(role: String!) on OBJECT | FIELD_DEFINITION
            directive @tag(name: String!) repeatable on FIELD_DEFINITION

            scalar Instant @specifiedBy(url: "https://example.com/instant")

            type Query @auth(role: "viewer") {
                "Upcoming concerts"
                concerts(first: Int = 10): [String!]! @tag(name: "a") @tag(name: "b")
                venues: [String] @deprecated(reason: "Use `places`")
                oldest: Instant @deprecated
            }
            "#,
            RuntimeWiring::mocked(),
        )
        .unwrap();

        let Some(SchemaElement::Object(query)) = schema.type_by_name("Query") else {
            panic!("Query is not an object type");
        };
        assert_eq!(
            query.directives.get("auth").unwrap().arguments["role"],
            ConstValue::String("viewer".to_string())
        );

        let concerts = schema.field_definition("Query", "concerts").unwrap();
        assert_eq!(concerts.description.as_deref(), Some("Upcoming concerts"));
        assert_eq!(concerts.directives.get_all("tag").count(), 2);
        assert_eq!(concerts.deprecation_reason, None);

        let venues = schema.field_definition("Query", "venues").unwrap();
        assert_eq!(venues.deprecation_reason.as_deref(), Some("Use `places`"));
        assert!(venues.directives.get(DEPRECATED).is_none());

        let oldest = schema.field_definition("Query", "oldest").unwrap();
        assert_eq!(
            oldest.deprecation_reason.as_deref(),
            Some(DEFAULT_DEPRECATION_REASON)
        );

        let Some(SchemaElement::Scalar(instant)) = schema.type_by_name("Instant") else {
            panic!("Instant is not a scalar");
        };
        assert_eq!(
            instant.specified_by_url.as_deref(),
            Some("https://example.com/instant")
        );

        let auth = schema.directive("auth").unwrap();
        assert_eq!(
            auth.locations,
            vec![DirectiveLocation::Object, DirectiveLocation::FieldDefinition]
        );
        assert!(schema.directive("tag").unwrap().repeatable);
    }

    #[test]
    fn directives_without_the_keyword_are_not_repeatable() {
        let schema = SchemaGenerator::from_sdl(
            r#"
            directive @auth on OBJECT
            directive @tag repeatable on OBJECT
            type Query @auth @tag @tag { ok: Boolean }
            "#,
            RuntimeWiring::mocked(),
        )
        .unwrap();

        assert!(!schema.directive("auth").unwrap().repeatable);
        assert!(schema.directive("tag").unwrap().repeatable);

        let result = SchemaGenerator::from_sdl(
            r#"
            directive @auth on OBJECT
            type Query @auth @auth { ok: Boolean }
            "#,
            RuntimeWiring::mocked(),
        );
        assert!(matches!(
            result,
            Err(SdlError::Schema(schema_graph::SchemaError::NonRepeatableDirective { name }))
                if name == "auth"
        ));
    }

    #[test]
    fn merges_extensions() {
        let schema = SchemaGenerator::from_sdl(
            r#"
            type Query { concert: Concert }
            type Concert { title: String }
            extend type Concert { venue: String }
            enum Genre { JAZZ }
            extend enum Genre { ROCK }
            "#,
            RuntimeWiring::mocked(),
        )
        .unwrap();

        assert!(schema.field_definition("Concert", "title").is_some());
        assert!(schema.field_definition("Concert", "venue").is_some());

        let Some(SchemaElement::Enum(genre)) = schema.type_by_name("Genre") else {
            panic!("Genre is not an enum");
        };
        assert_eq!(genre.values.len(), 2);
    }

    #[test]
    fn abstract_types_need_wiring() {
        let sdl = r#"
            type Query { pet: Pet }
            interface Pet { name: String }
            type Dog implements Pet { name: String }
        "#;

        assert!(matches!(
            SchemaGenerator::from_sdl(sdl, RuntimeWiring::new()),
            Err(SdlError::Schema(
                schema_graph::SchemaError::MissingTypeResolver { .. }
            ))
        ));
        assert!(SchemaGenerator::from_sdl(sdl, RuntimeWiring::mocked()).is_ok());
    }
}
