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
    types::{OperationDefinition, OperationType, Selection, SelectionSet},
};

use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// The schema must define a root type for each operation kind the document uses.
pub struct KnownOperationTypes;

impl ValidationRule for KnownOperationTypes {
    fn enter_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        let root = ctx.schema().root_element();
        let supported = match operation.node.ty {
            OperationType::Query => root.query.is_some(),
            OperationType::Mutation => root.mutation.is_some(),
            OperationType::Subscription => root.subscription.is_some(),
        };

        if !supported {
            ctx.report(
                ValidationErrorType::UnknownOperation,
                format!(
                    "The '{}' operation is not supported by the schema",
                    operation.node.ty
                ),
                [operation.pos],
            );
        }
    }
}

/// A subscription selects exactly one root field.
pub struct SubscriptionUniqueRootField;

impl ValidationRule for SubscriptionUniqueRootField {
    fn enter_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        if operation.node.ty != OperationType::Subscription {
            return;
        }

        let mut response_keys = HashSet::new();
        let mut positions = vec![];
        let mut spread = HashSet::new();
        collect_root_fields(
            ctx,
            &operation.node.selection_set,
            &mut response_keys,
            &mut positions,
            &mut spread,
        );

        if response_keys.len() > 1 {
            let description = match name {
                Some(name) => {
                    format!("Subscription operation '{name}' must select only one root field")
                }
                None => "Anonymous subscription must select only one root field".to_string(),
            };
            ctx.report(
                ValidationErrorType::SubscriptionMultipleRootFields,
                description,
                positions.into_iter().skip(1),
            );
        }
    }
}

fn collect_root_fields<'a>(
    ctx: &ValidationContext<'a>,
    selection_set: &'a Positioned<SelectionSet>,
    response_keys: &mut HashSet<&'a str>,
    positions: &mut Vec<Pos>,
    spread: &mut HashSet<&'a str>,
) {
    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => {
                if response_keys.insert(field.node.response_key().node.as_str()) {
                    positions.push(field.pos);
                }
            }
            Selection::InlineFragment(fragment) => collect_root_fields(
                ctx,
                &fragment.node.selection_set,
                response_keys,
                positions,
                spread,
            ),
            Selection::FragmentSpread(fragment_spread) => {
                let name = fragment_spread.node.fragment_name.node.as_str();
                let Some(fragment) = ctx.fragment(name) else {
                    continue;
                };
                if spread.insert(name) {
                    collect_root_fields(
                        ctx,
                        &fragment.node.selection_set,
                        response_keys,
                        positions,
                        spread,
                    );
                }
            }
        }
    }
}
