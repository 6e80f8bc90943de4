// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Scalars and directives every schema has.

use std::collections::{BTreeMap, BTreeSet};

use async_graphql_value::ConstValue;

use crate::{
    arena::{ElementId, GraphArena},
    builder::{
        ArgumentBuilder, DefinitionBuilder, DirectiveBuilder, ScalarTypeBuilder, TypeBuilder,
        TypeExpr,
    },
    coercion::{BooleanCoercing, Coercing, FloatCoercing, IdCoercing, IntCoercing, StringCoercing},
    element::{DirectiveLocation, SchemaElement},
    error::SchemaError,
    resolution::reachable_elements,
};

pub const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];
pub const BUILTIN_DIRECTIVES: [&str; 4] = ["include", "skip", "deprecated", "specifiedBy"];

pub const DEFAULT_DEPRECATION_REASON: &str = "No longer supported";

pub fn is_builtin_scalar(name: &str) -> bool {
    BUILTIN_SCALARS.contains(&name)
}

pub fn is_builtin_directive(name: &str) -> bool {
    BUILTIN_DIRECTIVES.contains(&name)
}

pub(crate) fn builtin_coercing(name: &str) -> Option<&'static dyn Coercing> {
    match name {
        "Int" => Some(&IntCoercing),
        "Float" => Some(&FloatCoercing),
        "String" => Some(&StringCoercing),
        "Boolean" => Some(&BooleanCoercing),
        "ID" => Some(&IdCoercing),
        _ => None,
    }
}

pub(crate) fn builtin_scalar(name: &str) -> Option<ScalarTypeBuilder> {
    let description = match name {
        "Int" => "The `Int` scalar type represents non-fractional signed whole numeric values.",
        "Float" => "The `Float` scalar type represents signed double-precision fractional values.",
        "String" => "The `String` scalar type represents textual data.",
        "Boolean" => "The `Boolean` scalar type represents `true` or `false`.",
        "ID" => "The `ID` scalar type represents a unique identifier.",
        _ => return None,
    };
    Some(ScalarTypeBuilder::new(name).description(description))
}

pub(crate) fn builtin_directives() -> Vec<DirectiveBuilder> {
    let conditional = [
        DirectiveLocation::Field,
        DirectiveLocation::FragmentSpread,
        DirectiveLocation::InlineFragment,
    ];

    vec![
        DirectiveBuilder::new("include")
            .description("Directs the executor to include this field or fragment only when the `if` argument is true.")
            .argument(ArgumentBuilder::new(
                "if",
                TypeExpr::named("Boolean").non_null(),
            ))
            .locations(conditional),
        DirectiveBuilder::new("skip")
            .description("Directs the executor to skip this field or fragment when the `if` argument is true.")
            .argument(ArgumentBuilder::new(
                "if",
                TypeExpr::named("Boolean").non_null(),
            ))
            .locations(conditional),
        DirectiveBuilder::new("deprecated")
            .description("Marks the field, argument, input field or enum value as deprecated")
            .argument(
                ArgumentBuilder::new("reason", TypeExpr::named("String"))
                    .default_value(ConstValue::String(DEFAULT_DEPRECATION_REASON.to_string())),
            )
            .locations([
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::ArgumentDefinition,
                DirectiveLocation::InputFieldDefinition,
                DirectiveLocation::EnumValue,
            ]),
        DirectiveBuilder::new("specifiedBy")
            .description("Exposes a URL that specifies the behaviour of this scalar.")
            .argument(ArgumentBuilder::new("url", TypeExpr::named("String").non_null()))
            .locations([DirectiveLocation::Scalar]),
    ]
}

/// Defines the built-in scalars referenced under `root` but missing from `types`.
///
/// Returns the schema root to use: `root` itself, or a copy listing the added scalars among its
/// additional types.
pub(crate) fn add_referenced_scalars(
    arena: &mut GraphArena,
    root: ElementId,
    types: &mut BTreeMap<String, ElementId>,
) -> Result<ElementId, SchemaError> {
    let missing: BTreeSet<String> = reachable_elements(arena, &[root])
        .into_iter()
        .filter_map(|id| match &arena[id] {
            SchemaElement::TypeReference(reference)
                if is_builtin_scalar(&reference.name) && !types.contains_key(&reference.name) =>
            {
                Some(reference.name.clone())
            }
            _ => None,
        })
        .collect();

    let SchemaElement::Schema(schema_root) = &arena[root] else {
        return Ok(root);
    };
    if missing.is_empty() {
        return Ok(root);
    }

    let mut schema_root = schema_root.clone();
    for name in missing {
        if let Some(scalar) = builtin_scalar(&name) {
            let id = scalar.build(arena)?;
            schema_root.additional_types.push(id);
            types.insert(name, id);
        }
    }

    Ok(arena.alloc(SchemaElement::Schema(schema_root)))
}
