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
    types::{
        Directive, ExecutableDocument, Field, FragmentDefinition, FragmentSpread, InlineFragment,
        OperationDefinition, SelectionSet, VariableDefinition,
    },
};
use async_graphql_value::{Name, Value};
use schema_graph::element::DirectiveLocation;

use crate::context::ValidationContext;

/// A single validation rule.
///
/// Every callback defaults to doing nothing, so a rule implements only the nodes it cares about.
/// Rules report problems through [`ValidationContext::report`] and never stop other rules from
/// running.
#[allow(unused_variables)]
pub trait ValidationRule {
    /// Walk fragments where they are spread (once per operation) instead of visiting fragment
    /// definitions on their own.
    fn visit_fragment_spreads(&self) -> bool {
        false
    }

    fn enter_document<'a>(&mut self, ctx: &mut ValidationContext<'a>, doc: &'a ExecutableDocument) {
    }

    /// Called after the whole document has been walked.
    fn leave_document<'a>(&mut self, ctx: &mut ValidationContext<'a>, doc: &'a ExecutableDocument) {
    }

    fn enter_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
    }

    fn leave_operation_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
    }

    fn enter_selection_set<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        selection_set: &'a Positioned<SelectionSet>,
    ) {
    }

    fn leave_selection_set<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        selection_set: &'a Positioned<SelectionSet>,
    ) {
    }

    fn enter_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {}

    fn leave_field<'a>(&mut self, ctx: &mut ValidationContext<'a>, field: &'a Positioned<Field>) {}

    fn enter_fragment_spread<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        spread: &'a Positioned<FragmentSpread>,
    ) {
    }

    fn enter_inline_fragment<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment: &'a Positioned<InlineFragment>,
    ) {
    }

    fn leave_inline_fragment<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        fragment: &'a Positioned<InlineFragment>,
    ) {
    }

    fn enter_fragment_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
    }

    fn leave_fragment_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
    }

    /// All directives applied at one location, before each of them is visited.
    fn enter_directives<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directives: &'a [Positioned<Directive>],
        location: DirectiveLocation,
    ) {
    }

    fn enter_directive<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directive: &'a Positioned<Directive>,
        location: DirectiveLocation,
    ) {
    }

    fn leave_directive<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        directive: &'a Positioned<Directive>,
        location: DirectiveLocation,
    ) {
    }

    /// An argument of a field or of a directive.
    fn enter_argument<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a Positioned<Name>,
        value: &'a Positioned<Value>,
    ) {
    }

    fn leave_argument<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a Positioned<Name>,
        value: &'a Positioned<Value>,
    ) {
    }

    fn enter_variable_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        definition: &'a Positioned<VariableDefinition>,
    ) {
    }

    fn leave_variable_definition<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        definition: &'a Positioned<VariableDefinition>,
    ) {
    }

    /// A `$name` inside an argument value. `pos` is the position of the enclosing argument
    /// value.
    fn enter_variable_reference<'a>(
        &mut self,
        ctx: &mut ValidationContext<'a>,
        name: &'a str,
        pos: Pos,
    ) {
    }
}
