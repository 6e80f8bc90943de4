// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Pos, Positioned,
    types::{ExecutableDocument, FragmentDefinition},
};
use schema_graph::{
    Schema,
    element::{ArgumentDefinition, DirectiveDefinition, FieldDefinition, SchemaElement},
    type_util::TypeShape,
};

use crate::error::{ValidationError, ValidationErrorType};

/// The type an input value is checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedInput {
    pub shape: TypeShape,
    /// The location (argument or input field) declares a default value.
    pub has_default: bool,
}

/// State shared by all rules during one validation run.
///
/// The walker keeps the type information current: when a rule callback runs, the stacks describe
/// the node being visited.
pub struct ValidationContext<'a> {
    schema: &'a Schema,
    document: &'a ExecutableDocument,
    fragments: HashMap<&'a str, &'a Positioned<FragmentDefinition>>,

    pub(crate) parent_types: Vec<Option<&'a SchemaElement>>,
    pub(crate) output_types: Vec<Option<TypeShape>>,
    pub(crate) field_definitions: Vec<Option<&'a FieldDefinition>>,
    pub(crate) input_types: Vec<Option<ExpectedInput>>,
    pub(crate) argument_definition: Option<&'a ArgumentDefinition>,
    pub(crate) directive: Option<Option<&'a DirectiveDefinition>>,
    pub(crate) path: Vec<String>,

    errors: Vec<ValidationError>,
}

impl<'a> ValidationContext<'a> {
    pub(crate) fn new(schema: &'a Schema, document: &'a ExecutableDocument) -> Self {
        let fragments = document
            .fragments
            .iter()
            .map(|(name, fragment)| (name.as_str(), fragment))
            .collect();

        Self {
            schema,
            document,
            fragments,
            parent_types: vec![],
            output_types: vec![],
            field_definitions: vec![],
            input_types: vec![],
            argument_definition: None,
            directive: None,
            path: vec![],
            errors: vec![],
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn document(&self) -> &'a ExecutableDocument {
        self.document
    }

    pub fn fragment(&self, name: &str) -> Option<&'a Positioned<FragmentDefinition>> {
        self.fragments.get(name).copied()
    }

    /// The fragment definitions, in document order.
    pub fn fragments(&self) -> Vec<(&'a str, &'a Positioned<FragmentDefinition>)> {
        let mut fragments: Vec<_> = self
            .fragments
            .iter()
            .map(|(name, fragment)| (*name, *fragment))
            .collect();
        fragments.sort_by_key(|(_, fragment)| (fragment.pos.line, fragment.pos.column));
        fragments
    }

    /// The composite type whose selection set is being visited. `None` if it is unknown.
    pub fn parent_type(&self) -> Option<&'a SchemaElement> {
        self.parent_types.last().copied().flatten()
    }

    /// The type of the current field.
    pub fn output_type(&self) -> Option<&TypeShape> {
        self.output_types.last().and_then(Option::as_ref)
    }

    pub fn field_definition(&self) -> Option<&'a FieldDefinition> {
        self.field_definitions.last().copied().flatten()
    }

    /// The type the value being visited must conform to.
    pub fn input_type(&self) -> Option<&ExpectedInput> {
        self.input_types.last().and_then(Option::as_ref)
    }

    pub fn argument_definition(&self) -> Option<&'a ArgumentDefinition> {
        self.argument_definition
    }

    /// The definition of the directive being visited. `None` outside of a directive or for an
    /// unknown directive; see [`Self::in_directive`].
    pub fn directive(&self) -> Option<&'a DirectiveDefinition> {
        self.directive.flatten()
    }

    pub fn in_directive(&self) -> bool {
        self.directive.is_some()
    }

    /// Response keys from the operation root to the current field.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn report(
        &mut self,
        error_type: ValidationErrorType,
        description: impl std::fmt::Display,
        positions: impl IntoIterator<Item = Pos>,
    ) {
        let error = ValidationError::new(error_type, description, positions, self.path.clone());
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub(crate) fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}
