// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use async_graphql_parser::{Positioned, types::Directive};
use schema_graph::element::DirectiveLocation;

use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Directives are defined by the schema and applied where their definition allows.
pub struct KnownDirectives;

impl ValidationRule for KnownDirectives {
    fn enter_directive<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directive: &'a Positioned<Directive>,
        location: DirectiveLocation,
    ) {
        let name = &directive.node.name.node;

        match ctx.directive() {
            None => ctx.report(
                ValidationErrorType::UnknownDirective,
                format!("Unknown directive '{name}'"),
                [directive.pos],
            ),
            Some(definition) if !definition.locations.contains(&location) => ctx.report(
                ValidationErrorType::MisplacedDirective,
                format!("Directive '{name}' not allowed on {location}"),
                [directive.pos],
            ),
            Some(_) => {}
        }
    }
}

/// A non-repeatable directive is applied at most once per location.
pub struct UniqueDirectivesPerLocation;

impl ValidationRule for UniqueDirectivesPerLocation {
    fn enter_directives<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directives: &'a [Positioned<Directive>],
        location: DirectiveLocation,
    ) {
        let mut seen = HashSet::new();

        for directive in directives {
            let name = directive.node.name.node.as_str();
            let repeatable = ctx
                .schema()
                .directive(name)
                .is_none_or(|definition| definition.repeatable);

            if !repeatable && !seen.insert(name) {
                ctx.report(
                    ValidationErrorType::DuplicateDirectiveName,
                    format!(
                        "Non repeatable directive '{name}' must be unique within a location, \
                         but is used more than once on {location}"
                    ),
                    [directive.pos],
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_graphql_parser::parse_query;
    use schema_graph::schema::Schema;
    use schema_sdl::{RuntimeWiring, SchemaGenerator};

    use super::*;
    use crate::{error::SourceLocation, validator::DocumentValidator};

    fn schema() -> Schema {
        SchemaGenerator::from_sdl(
            r#"
            directive @cached on FIELD
            directive @tag(name: String) repeatable on FIELD
            type Query { ok: Boolean }
            "#,
            RuntimeWiring::new(),
        )
        .unwrap()
    }

    fn unique_directives() -> Vec<Box<dyn ValidationRule>> {
        vec![Box::new(UniqueDirectivesPerLocation)]
    }

    fn validate(query: &str) -> Vec<crate::ValidationError> {
        let schema = schema();
        let document = parse_query(query).unwrap();
        DocumentValidator::with_rules(&schema, unique_directives).validate(&document)
    }

    #[test]
    fn user_directive_applied_twice() {
        let errors = validate("{ ok @cached @cached }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ValidationErrorType::DuplicateDirectiveName);
        assert_eq!(errors[0].locations, vec![SourceLocation { line: 1, column: 14 }]);
    }

    #[test]
    fn repeatable_and_distinct_directives() {
        assert!(validate(r#"{ ok @tag(name: "a") @tag(name: "b") @cached }"#).is_empty());
        assert!(validate("{ a: ok @cached b: ok @cached }").is_empty());
    }

    #[test]
    fn builtin_directive_applied_twice() {
        let errors = validate("{ ok @skip(if: true) @skip(if: false) }");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].error_type, ValidationErrorType::DuplicateDirectiveName);
    }
}
