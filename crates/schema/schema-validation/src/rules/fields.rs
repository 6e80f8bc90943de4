// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{Positioned, types::Field};
use schema_graph::type_util::{is_composite_type, is_leaf_type};

use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Selected fields exist on the enclosing type.
pub struct FieldsOnCorrectType;

impl ValidationRule for FieldsOnCorrectType {
    fn enter_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {
        let Some(parent) = ctx.parent_type().filter(|parent| is_composite_type(parent)) else {
            return;
        };
        if ctx.field_definition().is_some() || ctx.output_type().is_some() {
            return;
        }

        ctx.report(
            ValidationErrorType::FieldUndefined,
            format!(
                "Field '{}' in type '{}' is undefined",
                field.node.name.node,
                parent.name().unwrap_or_default()
            ),
            [field.pos],
        );
    }
}

/// Leaf fields have no selection set, composite fields must have one.
pub struct ScalarLeaves;

impl ValidationRule for ScalarLeaves {
    fn enter_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {
        let Some(output_type) = ctx.output_type() else {
            return;
        };
        let type_name = output_type.named_type().to_string();
        let Some(ty) = ctx.schema().type_by_name(&type_name) else {
            return;
        };
        let has_selections = !field.node.selection_set.node.items.is_empty();
        let name = &field.node.name.node;

        if is_leaf_type(ty) && has_selections {
            ctx.report(
                ValidationErrorType::SubselectionNotAllowed,
                format!("Subselection not allowed on leaf type '{type_name}' of field '{name}'"),
                [field.node.selection_set.pos],
            );
        } else if is_composite_type(ty) && !has_selections {
            ctx.report(
                ValidationErrorType::SubselectionRequired,
                format!("Subselection required for type '{type_name}' of field '{name}'"),
                [field.pos],
            );
        }
    }
}
