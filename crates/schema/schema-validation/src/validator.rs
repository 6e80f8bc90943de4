// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{Error as ParserError, parse_query, types::ExecutableDocument};
use common::cancellation::{CancellationCheck, Cancelled, NeverCancelled};
use schema_graph::Schema;
use tracing::{debug, instrument, warn};

use crate::{
    error::{ValidationError, ValidationErrorType},
    rule::ValidationRule,
    rules::standard_rules,
    walker::Walker,
};

/// Validates query documents against a schema.
///
/// Rules keep per-document state, so each validation asks `rule_set` for fresh instances.
pub struct DocumentValidator<'a> {
    schema: &'a Schema,
    rule_set: fn() -> Vec<Box<dyn ValidationRule>>,
}

impl<'a> DocumentValidator<'a> {
    /// A validator running the standard rules.
    pub fn new(schema: &'a Schema) -> Self {
        Self::with_rules(schema, standard_rules)
    }

    pub fn with_rules(schema: &'a Schema, rule_set: fn() -> Vec<Box<dyn ValidationRule>>) -> Self {
        Self { schema, rule_set }
    }

    /// All problems found in `document`, ordered by their first location.
    pub fn validate(&self, document: &ExecutableDocument) -> Vec<ValidationError> {
        self.validate_cancellable(document, NeverCancelled)
            .unwrap_or_default()
    }

    #[instrument(name = "DocumentValidator::validate", skip_all)]
    pub fn validate_cancellable(
        &self,
        document: &ExecutableDocument,
        cancellation: impl CancellationCheck,
    ) -> Result<Vec<ValidationError>, Cancelled> {
        let (mut operation_rules, mut spread_rules): (Vec<_>, Vec<_>) = (self.rule_set)()
            .into_iter()
            .partition(|rule| !rule.visit_fragment_spreads());

        let mut errors = vec![];
        for (rules, follow_spreads) in [(&mut operation_rules, false), (&mut spread_rules, true)] {
            if rules.is_empty() {
                continue;
            }

            let outcome =
                Walker::new(self.schema, document, rules, follow_spreads, &cancellation).walk();
            if outcome.cancelled {
                warn!("Validation cancelled");
                return Err(Cancelled);
            }
            errors.extend(outcome.ctx.into_errors());
        }

        errors.sort_by_key(ValidationError::first_location);
        debug!(errors = errors.len(), "Validated document");

        Ok(errors)
    }
}

/// Parses `source` and validates it with the standard rules.
///
/// Duplicate operation or fragment names and a mix of anonymous and named operations are found
/// by the parser; they are reported as validation errors like any other problem.
pub fn parse_and_validate(schema: &Schema, source: &str) -> Vec<ValidationError> {
    match parse_query(source) {
        Ok(document) => DocumentValidator::new(schema).validate(&document),
        Err(error) => vec![parser_error(error)],
    }
}

fn parser_error(error: ParserError) -> ValidationError {
    let error_type = match &error {
        ParserError::OperationDuplicated { .. } => ValidationErrorType::DuplicateOperationName,
        ParserError::FragmentDuplicated { .. } => ValidationErrorType::DuplicateFragmentName,
        ParserError::MultipleOperations { .. } => {
            ValidationErrorType::LoneAnonymousOperationViolation
        }
        _ => ValidationErrorType::InvalidSyntax,
    };

    ValidationError::new(error_type, &error, error.positions(), vec![])
}
