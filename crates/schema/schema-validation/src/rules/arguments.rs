// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use async_graphql_parser::{
    Pos, Positioned,
    types::{Directive, Field},
};
use async_graphql_value::{Name, Value};
use schema_graph::{ElementId, element::DirectiveLocation, type_util::TypeShape};

use super::values::literal_problem;
use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Arguments are defined by the field or directive they are passed to.
pub struct KnownArgumentNames;

impl ValidationRule for KnownArgumentNames {
    fn enter_argument<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a Positioned<Name>,
        _value: &'a Positioned<Value>,
    ) {
        if ctx.argument_definition().is_some() {
            return;
        }

        if ctx.in_directive() {
            if let Some(directive) = ctx.directive() {
                let description = format!(
                    "Unknown directive argument '{}' on directive '{}'",
                    name.node, directive.name
                );
                ctx.report(ValidationErrorType::UnknownDirective, description, [name.pos]);
            }
        } else if let Some(field) = ctx.field_definition() {
            let description = format!(
                "Unknown field argument '{}' on field '{}'",
                name.node, field.name
            );
            ctx.report(ValidationErrorType::UnknownArgument, description, [name.pos]);
        }
    }
}

/// An argument is passed at most once.
pub struct UniqueArgumentNames;

impl UniqueArgumentNames {
    fn check(ctx: &mut ValidationContext<'_>, arguments: &[(Positioned<Name>, Positioned<Value>)]) {
        let mut seen = HashSet::new();

        for (name, _) in arguments {
            if !seen.insert(name.node.as_str()) {
                ctx.report(
                    ValidationErrorType::DuplicateArgumentNames,
                    format!("There can be only one argument named '{}'", name.node),
                    [name.pos],
                );
            }
        }
    }
}

impl ValidationRule for UniqueArgumentNames {
    fn enter_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {
        Self::check(ctx, &field.node.arguments);
    }

    fn enter_directive<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directive: &'a Positioned<Directive>,
        _location: DirectiveLocation,
    ) {
        Self::check(ctx, &directive.node.arguments);
    }
}

/// Literal argument values are valid for the argument's type.
pub struct ArgumentsOfCorrectType;

impl ValidationRule for ArgumentsOfCorrectType {
    fn enter_argument<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a Positioned<Name>,
        value: &'a Positioned<Value>,
    ) {
        let Some(expected) = ctx.input_type() else {
            return;
        };

        if let Some(problem) = literal_problem(ctx.schema(), &value.node, &expected.shape) {
            let description = format!(
                "Argument '{}' with value '{}' is not a valid '{}': {problem}",
                name.node, value.node, expected.shape
            );
            ctx.report(ValidationErrorType::WrongType, description, [value.pos]);
        }
    }
}

/// Non-null arguments without a default value are provided.
pub struct ProvidedNonNullArguments;

impl ProvidedNonNullArguments {
    /// Names of required arguments missing from `provided`.
    fn missing<'a>(
        ctx: &ValidationContext<'a>,
        definitions: &'a [ElementId],
        provided: &[(Positioned<Name>, Positioned<Value>)],
    ) -> Vec<&'a str> {
        let schema = ctx.schema();

        schema
            .argument_definitions(definitions)
            .filter(|argument| argument.default_value.is_none())
            .filter(|argument| {
                TypeShape::from_element(schema.arena(), argument.ty)
                    .is_some_and(|shape| shape.is_non_null())
            })
            .filter(|argument| {
                provided
                    .iter()
                    .all(|(name, _)| name.node.as_str() != argument.name)
            })
            .map(|argument| argument.name.as_str())
            .collect()
    }

    fn report(
        ctx: &mut ValidationContext<'_>,
        error_type: ValidationErrorType,
        kind: &str,
        missing: Vec<&str>,
        pos: Pos,
    ) {
        for name in missing {
            ctx.report(error_type, format!("Missing {kind} argument '{name}'"), [pos]);
        }
    }
}

impl ValidationRule for ProvidedNonNullArguments {
    fn enter_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {
        if let Some(definition) = ctx.field_definition() {
            let missing = Self::missing(ctx, &definition.arguments, &field.node.arguments);
            Self::report(
                ctx,
                ValidationErrorType::MissingFieldArgument,
                "field",
                missing,
                field.pos,
            );
        }
    }

    fn enter_directive<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directive: &'a Positioned<Directive>,
        _location: DirectiveLocation,
    ) {
        if let Some(definition) = ctx.directive() {
            let missing = Self::missing(ctx, &definition.arguments, &directive.node.arguments);
            Self::report(
                ctx,
                ValidationErrorType::MissingDirectiveArgument,
                "directive",
                missing,
                directive.pos,
            );
        }
    }
}
