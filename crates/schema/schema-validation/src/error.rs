// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt;

use async_graphql_parser::Pos;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ValidationErrorType {
    InvalidSyntax,
    UnknownOperation,
    LoneAnonymousOperationViolation,
    DuplicateOperationName,
    DuplicateFragmentName,
    SubscriptionMultipleRootFields,
    UnknownType,
    InlineFragmentTypeConditionInvalid,
    FragmentTypeConditionInvalid,
    NonInputTypeOnVariable,
    SubselectionNotAllowed,
    SubselectionRequired,
    FieldUndefined,
    UndefinedFragment,
    UnusedFragment,
    InvalidFragmentType,
    FragmentCycle,
    DuplicateVariableName,
    UndefinedVariable,
    UnusedVariable,
    UnknownDirective,
    MisplacedDirective,
    DuplicateDirectiveName,
    UnknownArgument,
    DuplicateArgumentNames,
    WrongType,
    MissingFieldArgument,
    MissingDirectiveArgument,
    BadValueForDefaultArg,
    VariableTypeMismatch,
}

impl fmt::Display for ValidationErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A 1-based position in the validated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl From<Pos> for SourceLocation {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line,
            column: pos.column,
        }
    }
}

/// A problem found in a query document.
///
/// Serializes to the shape of a GraphQL response error, with the error type in
/// `extensions.validationErrorType`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("{message}")]
pub struct ValidationError {
    #[serde(skip)]
    pub error_type: ValidationErrorType,
    pub message: String,
    pub locations: Vec<SourceLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
    pub extensions: Map<String, Value>,
}

impl ValidationError {
    pub fn new(
        error_type: ValidationErrorType,
        description: impl fmt::Display,
        positions: impl IntoIterator<Item = Pos>,
        path: Vec<String>,
    ) -> Self {
        let message = if path.is_empty() {
            format!("Validation error ({error_type}) : {description}")
        } else {
            format!(
                "Validation error ({error_type}@[{}]) : {description}",
                path.join("/")
            )
        };

        let mut extensions = Map::new();
        extensions.insert(
            "classification".to_string(),
            Value::String("ValidationError".to_string()),
        );
        extensions.insert(
            "validationErrorType".to_string(),
            Value::String(error_type.to_string()),
        );

        Self {
            error_type,
            message,
            locations: positions.into_iter().map(SourceLocation::from).collect(),
            path,
            extensions,
        }
    }

    pub(crate) fn first_location(&self) -> Option<SourceLocation> {
        self.locations.first().copied()
    }
}
