// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{
    Pos, Positioned,
    types::{FragmentDefinition, InlineFragment, VariableDefinition},
};
use schema_graph::type_util::TypeShape;

use crate::{context::ValidationContext, error::ValidationErrorType, rule::ValidationRule};

/// Variable types and type conditions name types of the schema.
pub struct KnownTypeNames;

impl KnownTypeNames {
    fn check(ctx: &mut ValidationContext<'_>, type_name: &str, pos: Pos) {
        if !ctx.schema().contains_type(type_name) {
            ctx.report(
                ValidationErrorType::UnknownType,
                format!("Unknown type '{type_name}'"),
                [pos],
            );
        }
    }
}

impl ValidationRule for KnownTypeNames {
    fn enter_variable_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        definition: &'a Positioned<VariableDefinition>,
    ) {
        let shape = TypeShape::from_type(&definition.node.var_type.node);
        Self::check(ctx, shape.named_type(), definition.node.var_type.pos);
    }

    fn enter_inline_fragment<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment: &'a Positioned<InlineFragment>,
    ) {
        if let Some(condition) = &fragment.node.type_condition {
            Self::check(ctx, &condition.node.on.node, condition.pos);
        }
    }

    fn enter_fragment_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        _name: &'a str,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
        let condition = &fragment.node.type_condition;
        Self::check(ctx, &condition.node.on.node, condition.pos);
    }
}
