// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};

use async_graphql_parser::{
    Pos, Positioned,
    types::{OperationDefinition, VariableDefinition},
};
use async_graphql_value::ConstValue;
use schema_graph::{
    element::SchemaElement,
    type_util::{TypeShape, is_type_sub_type_of},
};

use super::values::literal_problem;
use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Variable names are unique within an operation.
pub struct UniqueVariableNames;

impl ValidationRule for UniqueVariableNames {
    fn enter_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        let mut seen = HashSet::new();

        for definition in &operation.node.variable_definitions {
            let name = definition.node.name.node.as_str();
            if !seen.insert(name) {
                ctx.report(
                    ValidationErrorType::DuplicateVariableName,
                    format!("There can be only one variable named '{name}'"),
                    [definition.pos],
                );
            }
        }
    }
}

/// Every variable used in an operation, including inside the fragments it spreads, is defined
/// by that operation.
#[derive(Default)]
pub struct NoUndefinedVariables {
    defined: HashSet<String>,
    operation_name: Option<String>,
}

impl ValidationRule for NoUndefinedVariables {
    fn visit_fragment_spreads(&self) -> bool {
        true
    }

    fn enter_operation_definition<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        self.operation_name = name.map(str::to_string);
        self.defined = operation
            .node
            .variable_definitions
            .iter()
            .map(|definition| definition.node.name.node.to_string())
            .collect();
    }

    fn enter_variable_reference<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        pos: Pos,
    ) {
        if self.defined.contains(name) {
            return;
        }

        let description = match &self.operation_name {
            Some(operation) => format!("Undefined variable '{name}' in operation '{operation}'"),
            None => format!("Undefined variable '{name}'"),
        };
        ctx.report(ValidationErrorType::UndefinedVariable, description, [pos]);
    }
}

/// Every variable an operation defines is used, directly or inside the fragments it spreads.
#[derive(Default)]
pub struct NoUnusedVariables {
    used: HashSet<String>,
}

impl ValidationRule for NoUnusedVariables {
    fn visit_fragment_spreads(&self) -> bool {
        true
    }

    fn enter_operation_definition<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        _operation: &'a Positioned<OperationDefinition>,
    ) {
        self.used.clear();
    }

    fn enter_variable_reference<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        name: &'a str,
        _pos: Pos,
    ) {
        self.used.insert(name.to_string());
    }

    fn leave_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        for definition in &operation.node.variable_definitions {
            let name = definition.node.name.node.as_str();
            if !self.used.contains(name) {
                ctx.report(
                    ValidationErrorType::UnusedVariable,
                    format!("Unused variable '{name}'"),
                    [definition.pos],
                );
            }
        }
    }
}

/// Variables have scalar, enum or input object types.
pub struct VariablesAreInputTypes;

impl ValidationRule for VariablesAreInputTypes {
    fn enter_variable_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        definition: &'a Positioned<VariableDefinition>,
    ) {
        let shape = TypeShape::from_type(&definition.node.var_type.node);
        let is_input = match ctx.schema().type_by_name(shape.named_type()) {
            Some(
                SchemaElement::Scalar(_) | SchemaElement::Enum(_) | SchemaElement::InputObject(_),
            )
            | None => true,
            Some(_) => false,
        };

        if !is_input {
            ctx.report(
                ValidationErrorType::NonInputTypeOnVariable,
                format!(
                    "Input variable '{}' type '{shape}' is not an input type",
                    definition.node.name.node
                ),
                [definition.node.var_type.pos],
            );
        }
    }
}

/// Variable default values are valid for the variable's type.
pub struct VariableDefaultValuesOfCorrectType;

impl ValidationRule for VariableDefaultValuesOfCorrectType {
    fn enter_variable_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        definition: &'a Positioned<VariableDefinition>,
    ) {
        let Some(default) = &definition.node.default_value else {
            return;
        };
        let shape = TypeShape::from_type(&definition.node.var_type.node);
        let value = default.node.clone().into_value();

        if let Some(problem) = literal_problem(ctx.schema(), &value, &shape) {
            ctx.report(
                ValidationErrorType::BadValueForDefaultArg,
                format!("Bad default value '{value}' for type '{shape}': {problem}"),
                [default.pos],
            );
        }
    }
}

struct DefinedVariable {
    shape: TypeShape,
    has_non_null_default: bool,
}

/// Variables are only used where their type is accepted.
///
/// A nullable variable may be used in a non-null position when either the variable or the
/// position provides a default value.
#[derive(Default)]
pub struct VariableTypesMatch {
    variables: HashMap<String, DefinedVariable>,
}

impl ValidationRule for VariableTypesMatch {
    fn visit_fragment_spreads(&self) -> bool {
        true
    }

    fn enter_operation_definition<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        self.variables = operation
            .node
            .variable_definitions
            .iter()
            .map(|definition| {
                let has_non_null_default = definition
                    .node
                    .default_value
                    .as_ref()
                    .is_some_and(|default| default.node != ConstValue::Null);
                (
                    definition.node.name.node.to_string(),
                    DefinedVariable {
                        shape: TypeShape::from_type(&definition.node.var_type.node),
                        has_non_null_default,
                    },
                )
            })
            .collect();
    }

    fn enter_variable_reference<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        pos: Pos,
    ) {
        let schema = ctx.schema();
        let (Some(variable), Some(expected)) = (self.variables.get(name), ctx.input_type()) else {
            return;
        };
        if !schema.contains_type(variable.shape.named_type())
            || !schema.contains_type(expected.shape.named_type())
        {
            return;
        }

        let location_type = if expected.shape.is_non_null()
            && !variable.shape.is_non_null()
            && (variable.has_non_null_default || expected.has_default)
        {
            expected.shape.nullable()
        } else {
            &expected.shape
        };

        if !is_type_sub_type_of(schema, &variable.shape, location_type) {
            let description = format!(
                "Variable '{name}' of type '{}' used in position expecting type '{}'",
                variable.shape, expected.shape
            );
            ctx.report(ValidationErrorType::VariableTypeMismatch, description, [pos]);
        }
    }
}
