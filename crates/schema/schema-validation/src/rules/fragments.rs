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
    types::{
        ExecutableDocument, FragmentDefinition, FragmentSpread, InlineFragment,
        OperationDefinition, Selection, SelectionSet,
    },
};
use schema_graph::{
    element::SchemaElement,
    type_util::{do_types_overlap, is_composite_type},
};

use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Type conditions name object, interface or union types.
pub struct FragmentsOnCompositeType;

impl ValidationRule for FragmentsOnCompositeType {
    fn enter_inline_fragment<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment: &'a Positioned<InlineFragment>,
    ) {
        let Some(condition) = &fragment.node.type_condition else {
            return;
        };
        let type_name = condition.node.on.node.as_str();

        if ctx
            .schema()
            .type_by_name(type_name)
            .is_some_and(|ty| !is_composite_type(ty))
        {
            ctx.report(
                ValidationErrorType::InlineFragmentTypeConditionInvalid,
                format!(
                    "Inline fragment type condition '{type_name}' is invalid, must be on \
                     Object/Interface/Union"
                ),
                [condition.pos],
            );
        }
    }

    fn enter_fragment_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
        let condition = &fragment.node.type_condition;
        let type_name = condition.node.on.node.as_str();

        if ctx
            .schema()
            .type_by_name(type_name)
            .is_some_and(|ty| !is_composite_type(ty))
        {
            ctx.report(
                ValidationErrorType::FragmentTypeConditionInvalid,
                format!(
                    "Fragment '{name}' type condition '{type_name}' is invalid, must be on \
                     Object/Interface/Union"
                ),
                [condition.pos],
            );
        }
    }
}

/// Spreads name defined fragments.
pub struct KnownFragmentNames;

impl ValidationRule for KnownFragmentNames {
    fn enter_fragment_spread<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        spread: &'a Positioned<FragmentSpread>,
    ) {
        let name = spread.node.fragment_name.node.as_str();
        if ctx.fragment(name).is_none() {
            ctx.report(
                ValidationErrorType::UndefinedFragment,
                format!("Undefined fragment '{name}'"),
                [spread.node.fragment_name.pos],
            );
        }
    }
}

/// Every fragment is reachable from some operation.
#[derive(Default)]
pub struct NoUnusedFragments {
    current: Option<String>,
    used_by_operations: HashSet<String>,
    spreads_by_fragment: HashMap<String, Vec<String>>,
}

impl ValidationRule for NoUnusedFragments {
    fn enter_operation_definition<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        _name: Option<&'a str>,
        _operation: &'a Positioned<OperationDefinition>,
    ) {
        self.current = None;
    }

    fn enter_fragment_definition<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        name: &'a str,
        _fragment: &'a Positioned<FragmentDefinition>,
    ) {
        self.current = Some(name.to_string());
    }

    fn enter_fragment_spread<'a>(
        &mut self,
        _ctx: &mut ValidationContext<'a>,
        spread: &'a Positioned<FragmentSpread>,
    ) {
        let name = spread.node.fragment_name.node.to_string();
        match &self.current {
            Some(fragment) => self
                .spreads_by_fragment
                .entry(fragment.clone())
                .or_default()
                .push(name),
            None => {
                self.used_by_operations.insert(name);
            }
        }
    }

    fn leave_document<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _doc: &'a ExecutableDocument,
    ) {
        let mut reachable: HashSet<&str> = HashSet::new();
        let mut pending: Vec<&str> = self.used_by_operations.iter().map(String::as_str).collect();

        while let Some(name) = pending.pop() {
            if !reachable.insert(name) {
                continue;
            }
            if let Some(spreads) = self.spreads_by_fragment.get(name) {
                pending.extend(spreads.iter().map(String::as_str));
            }
        }

        for (name, fragment) in ctx.fragments() {
            if !reachable.contains(name) {
                ctx.report(
                    ValidationErrorType::UnusedFragment,
                    format!("Unused fragment '{name}'"),
                    [fragment.pos],
                );
            }
        }
    }
}

/// A fragment can only be spread where some object could match both its type condition and the
/// enclosing type.
pub struct PossibleFragmentSpreads;

impl PossibleFragmentSpreads {
    fn check(
        ctx: &mut ValidationContext<'_>,
        condition: &str,
        fragment_name: Option<&str>,
        pos: Pos,
    ) {
        let schema = ctx.schema();
        let (Some(parent), Some(fragment_type)) =
            (ctx.parent_type(), schema.type_by_name(condition))
        else {
            return;
        };
        if !is_composite_type(parent) || !is_composite_type(fragment_type) {
            return;
        }
        let Some(parent_name) = parent.type_name() else {
            return;
        };

        if !do_types_overlap(schema, parent_name, condition) {
            let subject = match fragment_name {
                Some(name) => format!("Fragment '{name}'"),
                None => "Fragment".to_string(),
            };
            ctx.report(
                ValidationErrorType::InvalidFragmentType,
                format!(
                    "{subject} cannot be spread here as objects of type '{parent_name}' can never \
                     be of type '{condition}'"
                ),
                [pos],
            );
        }
    }
}

impl ValidationRule for PossibleFragmentSpreads {
    fn enter_inline_fragment<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment: &'a Positioned<InlineFragment>,
    ) {
        if let Some(condition) = &fragment.node.type_condition {
            Self::check(ctx, &condition.node.on.node, None, fragment.pos);
        }
    }

    fn enter_fragment_spread<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        spread: &'a Positioned<FragmentSpread>,
    ) {
        let name = spread.node.fragment_name.node.as_str();
        if let Some(fragment) = ctx.fragment(name) {
            let condition = &fragment.node.type_condition.node.on.node;
            Self::check(ctx, condition, Some(name), spread.pos);
        }
    }
}

/// No fragment spreads itself, directly or through other fragments.
pub struct NoFragmentCycles;

struct SpreadEdge<'a> {
    target: &'a str,
    pos: Pos,
}

fn collect_spreads<'a>(
    selection_set: &'a Positioned<SelectionSet>,
    spreads: &mut Vec<SpreadEdge<'a>>,
) {
    for selection in &selection_set.node.items {
        match &selection.node {
            Selection::Field(field) => collect_spreads(&field.node.selection_set, spreads),
            Selection::InlineFragment(fragment) => {
                collect_spreads(&fragment.node.selection_set, spreads)
            }
            Selection::FragmentSpread(spread) => spreads.push(SpreadEdge {
                target: spread.node.fragment_name.node.as_str(),
                pos: spread.pos,
            }),
        }
    }
}

impl ValidationRule for NoFragmentCycles {
    fn enter_document<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _doc: &'a ExecutableDocument,
    ) {
        let fragments = ctx.fragments();
        let spreads: HashMap<&str, Vec<SpreadEdge<'_>>> = fragments
            .iter()
            .map(|(name, fragment)| {
                let mut spreads = vec![];
                collect_spreads(&fragment.node.selection_set, &mut spreads);
                (*name, spreads)
            })
            .collect();

        let mut visited: HashSet<&str> = HashSet::new();

        for &(start, _) in &fragments {
            if !visited.insert(start) {
                continue;
            }

            // Each frame is a fragment on the current path and the index of its next spread.
            let mut stack: Vec<(&str, usize)> = vec![(start, 0)];
            // The spread taken out of each frame but the last.
            let mut path: Vec<&SpreadEdge<'_>> = vec![];

            while let Some((fragment, next)) = stack.last_mut() {
                let Some(edge) = spreads.get(*fragment).and_then(|edges| edges.get(*next)) else {
                    stack.pop();
                    path.pop();
                    continue;
                };
                *next += 1;

                let on_path = stack.iter().position(|(name, _)| *name == edge.target);
                if let Some(cycle_start) = on_path {
                    let via: Vec<&str> = stack[cycle_start + 1..]
                        .iter()
                        .map(|(name, _)| *name)
                        .collect();
                    let description = if via.is_empty() {
                        format!("Fragment '{}' spreads itself", edge.target)
                    } else {
                        format!(
                            "Fragment '{}' spreads itself via '{}'",
                            edge.target,
                            via.join("', '")
                        )
                    };
                    let positions: Vec<Pos> = path[cycle_start..]
                        .iter()
                        .map(|edge| edge.pos)
                        .chain([edge.pos])
                        .collect();
                    ctx.report(ValidationErrorType::FragmentCycle, description, positions);
                } else if spreads.contains_key(edge.target) && visited.insert(edge.target) {
                    path.push(edge);
                    stack.push((edge.target, 0));
                }
            }
        }
    }
}
