// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Walks a query document and dispatches to the rules.
//!
//! Operations are walked in document order. In the default mode the fragment definitions are then
//! walked on their own; in spread-following mode each fragment is walked where it is first spread
//! inside an operation, with the type information of the spread site.

use std::collections::HashSet;

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        Directive, ExecutableDocument, Field, FragmentDefinition, FragmentSpread, InlineFragment,
        OperationDefinition, OperationType, Selection, SelectionSet, TypeCondition,
        VariableDefinition,
    },
};
use async_graphql_value::{Name, Value};
use common::cancellation::CancellationCheck;
use schema_graph::{
    ElementId, Schema,
    element::{DirectiveLocation, SchemaElement},
    type_util::TypeShape,
};

use crate::{
    context::{ExpectedInput, ValidationContext},
    rule::ValidationRule,
};

const TYPENAME_FIELD: &str = "__typename";

pub(crate) struct Walker<'a, 'r> {
    ctx: ValidationContext<'a>,
    rules: &'r mut [Box<dyn ValidationRule>],
    follow_spreads: bool,
    spread_fragments: HashSet<&'a str>,
    cancellation: &'r dyn CancellationCheck,
    cancelled: bool,
}

pub(crate) struct WalkOutcome<'a> {
    pub ctx: ValidationContext<'a>,
    pub cancelled: bool,
}

macro_rules! dispatch {
    ($walker:expr, $callback:ident $(, $arg:expr)*) => {
        for rule in $walker.rules.iter_mut() {
            rule.$callback(&mut $walker.ctx $(, $arg)*);
        }
    };
}

impl<'a, 'r> Walker<'a, 'r> {
    pub fn new(
        schema: &'a Schema,
        document: &'a ExecutableDocument,
        rules: &'r mut [Box<dyn ValidationRule>],
        follow_spreads: bool,
        cancellation: &'r dyn CancellationCheck,
    ) -> Self {
        Self {
            ctx: ValidationContext::new(schema, document),
            rules,
            follow_spreads,
            spread_fragments: HashSet::new(),
            cancellation,
            cancelled: false,
        }
    }

    pub fn walk(mut self) -> WalkOutcome<'a> {
        let document = self.ctx.document();
        dispatch!(self, enter_document, document);

        let mut operations: Vec<_> = document.operations.iter().collect();
        operations.sort_by_key(|(_, operation)| (operation.pos.line, operation.pos.column));

        for (name, operation) in operations {
            self.spread_fragments.clear();
            self.walk_operation(name.map(Name::as_str), operation);
        }

        if !self.follow_spreads {
            for (name, fragment) in self.ctx.fragments() {
                self.walk_fragment_definition(name, fragment);
            }
        }

        if !self.cancelled {
            dispatch!(self, leave_document, document);
        }

        WalkOutcome {
            ctx: self.ctx,
            cancelled: self.cancelled,
        }
    }

    fn should_stop(&mut self) -> bool {
        if !self.cancelled && self.cancellation.is_cancelled() {
            self.cancelled = true;
        }
        self.cancelled
    }

    fn walk_operation(
        &mut self,
        name: Option<&'a str>,
        operation: &'a Positioned<OperationDefinition>,
    ) {
        dispatch!(self, enter_operation_definition, name, operation);

        for definition in &operation.node.variable_definitions {
            self.walk_variable_definition(definition);
        }

        let location = match operation.node.ty {
            OperationType::Query => DirectiveLocation::Query,
            OperationType::Mutation => DirectiveLocation::Mutation,
            OperationType::Subscription => DirectiveLocation::Subscription,
        };
        self.walk_directives(&operation.node.directives, location);

        let root = root_type(self.ctx.schema(), operation.node.ty);
        self.ctx.parent_types.push(root);
        self.walk_selection_set(&operation.node.selection_set);
        self.ctx.parent_types.pop();

        dispatch!(self, leave_operation_definition, name, operation);
    }

    fn walk_variable_definition(&mut self, definition: &'a Positioned<VariableDefinition>) {
        dispatch!(self, enter_variable_definition, definition);
        self.walk_directives(
            &definition.node.directives,
            DirectiveLocation::VariableDefinition,
        );
        dispatch!(self, leave_variable_definition, definition);
    }

    fn walk_fragment_definition(
        &mut self,
        name: &'a str,
        fragment: &'a Positioned<FragmentDefinition>,
    ) {
        if self.should_stop() {
            return;
        }

        dispatch!(self, enter_fragment_definition, name, fragment);

        self.walk_directives(
            &fragment.node.directives,
            DirectiveLocation::FragmentDefinition,
        );

        let condition = self.condition_type(&fragment.node.type_condition);
        self.ctx.parent_types.push(condition);
        self.walk_selection_set(&fragment.node.selection_set);
        self.ctx.parent_types.pop();

        dispatch!(self, leave_fragment_definition, name, fragment);
    }

    fn walk_selection_set(&mut self, selection_set: &'a Positioned<SelectionSet>) {
        if self.should_stop() {
            return;
        }

        dispatch!(self, enter_selection_set, selection_set);

        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => self.walk_field(field),
                Selection::FragmentSpread(spread) => self.walk_fragment_spread(spread),
                Selection::InlineFragment(fragment) => self.walk_inline_fragment(fragment),
            }
        }

        dispatch!(self, leave_selection_set, selection_set);
    }

    fn walk_field(&mut self, field: &'a Positioned<Field>) {
        if self.should_stop() {
            return;
        }

        let schema = self.ctx.schema();
        let field_name = field.node.name.node.as_str();

        let definition = self
            .ctx
            .parent_type()
            .and_then(SchemaElement::type_name)
            .and_then(|parent| schema.field_definition(parent, field_name));
        let output_type = match definition {
            Some(definition) => TypeShape::from_element(schema.arena(), definition.ty),
            None if field_name == TYPENAME_FIELD && self.ctx.parent_type().is_some() => Some(
                TypeShape::NonNull(Box::new(TypeShape::Named("String".to_string()))),
            ),
            None => None,
        };
        let selection_parent = output_type
            .as_ref()
            .and_then(|shape| schema.type_by_name(shape.named_type()));

        self.ctx.field_definitions.push(definition);
        self.ctx.output_types.push(output_type);
        self.ctx
            .path
            .push(field.node.response_key().node.to_string());

        dispatch!(self, enter_field, field);

        let argument_definitions = definition.map(|definition| definition.arguments.as_slice());
        self.walk_arguments(&field.node.arguments, argument_definitions);
        self.walk_directives(&field.node.directives, DirectiveLocation::Field);

        self.ctx.parent_types.push(selection_parent);
        self.walk_selection_set(&field.node.selection_set);
        self.ctx.parent_types.pop();

        dispatch!(self, leave_field, field);

        self.ctx.path.pop();
        self.ctx.output_types.pop();
        self.ctx.field_definitions.pop();
    }

    fn walk_fragment_spread(&mut self, spread: &'a Positioned<FragmentSpread>) {
        dispatch!(self, enter_fragment_spread, spread);
        self.walk_directives(&spread.node.directives, DirectiveLocation::FragmentSpread);

        if !self.follow_spreads {
            return;
        }

        let name = spread.node.fragment_name.node.as_str();
        let Some(fragment) = self.ctx.fragment(name) else {
            return;
        };
        if !self.spread_fragments.insert(name) {
            return;
        }

        self.walk_directives(
            &fragment.node.directives,
            DirectiveLocation::FragmentDefinition,
        );

        let condition = self.condition_type(&fragment.node.type_condition);
        self.ctx.parent_types.push(condition);
        self.walk_selection_set(&fragment.node.selection_set);
        self.ctx.parent_types.pop();
    }

    fn walk_inline_fragment(&mut self, fragment: &'a Positioned<InlineFragment>) {
        dispatch!(self, enter_inline_fragment, fragment);
        self.walk_directives(&fragment.node.directives, DirectiveLocation::InlineFragment);

        let parent = match &fragment.node.type_condition {
            Some(condition) => self.condition_type(condition),
            None => self.ctx.parent_type(),
        };
        self.ctx.parent_types.push(parent);
        self.walk_selection_set(&fragment.node.selection_set);
        self.ctx.parent_types.pop();

        dispatch!(self, leave_inline_fragment, fragment);
    }

    fn walk_directives(
        &mut self,
        directives: &'a [Positioned<Directive>],
        location: DirectiveLocation,
    ) {
        dispatch!(self, enter_directives, directives, location);

        for directive in directives {
            let definition = self.ctx.schema().directive(&directive.node.name.node);
            self.ctx.directive = Some(definition);

            dispatch!(self, enter_directive, directive, location);
            self.walk_arguments(
                &directive.node.arguments,
                definition.map(|definition| definition.arguments.as_slice()),
            );
            dispatch!(self, leave_directive, directive, location);

            self.ctx.directive = None;
        }
    }

    fn walk_arguments(
        &mut self,
        arguments: &'a [(Positioned<Name>, Positioned<Value>)],
        definitions: Option<&'a [ElementId]>,
    ) {
        let schema = self.ctx.schema();

        for (name, value) in arguments {
            let definition = definitions.and_then(|definitions| {
                schema
                    .argument_definitions(definitions)
                    .find(|argument| argument.name == name.node.as_str())
            });
            let expected = definition.and_then(|definition| {
                Some(ExpectedInput {
                    shape: TypeShape::from_element(schema.arena(), definition.ty)?,
                    has_default: definition.default_value.is_some(),
                })
            });

            self.ctx.argument_definition = definition;
            self.ctx.input_types.push(expected);

            dispatch!(self, enter_argument, name, value);
            self.walk_value(&value.node, value.pos);
            dispatch!(self, leave_argument, name, value);

            self.ctx.input_types.pop();
            self.ctx.argument_definition = None;
        }
    }

    fn walk_value(&mut self, value: &'a Value, pos: Pos) {
        match value {
            Value::Variable(name) => {
                dispatch!(self, enter_variable_reference, name.as_str(), pos);
            }
            Value::List(items) => {
                let item_type = self.ctx.input_type().and_then(|expected| {
                    Some(ExpectedInput {
                        shape: expected.shape.list_item()?.clone(),
                        has_default: false,
                    })
                });

                for item in items {
                    self.ctx.input_types.push(item_type.clone());
                    self.walk_value(item, pos);
                    self.ctx.input_types.pop();
                }
            }
            Value::Object(fields) => {
                let schema = self.ctx.schema();
                let input_object = self
                    .ctx
                    .input_type()
                    .and_then(|expected| schema.type_by_name(expected.shape.named_type()));

                for (name, field_value) in fields {
                    let expected = match input_object {
                        Some(SchemaElement::InputObject(input_object)) => {
                            expected_input_field(schema, &input_object.fields, name.as_str())
                        }
                        _ => None,
                    };

                    self.ctx.input_types.push(expected);
                    self.walk_value(field_value, pos);
                    self.ctx.input_types.pop();
                }
            }
            _ => {}
        }
    }

    fn condition_type(&self, condition: &Positioned<TypeCondition>) -> Option<&'a SchemaElement> {
        self.ctx.schema().type_by_name(&condition.node.on.node)
    }
}

fn root_type(schema: &Schema, operation_type: OperationType) -> Option<&SchemaElement> {
    let root = schema.root_element();
    let id = match operation_type {
        OperationType::Query => root.query,
        OperationType::Mutation => root.mutation,
        OperationType::Subscription => root.subscription,
    }?;
    Some(schema.element(id))
}

fn expected_input_field(
    schema: &Schema,
    fields: &[ElementId],
    name: &str,
) -> Option<ExpectedInput> {
    fields.iter().find_map(|&id| match schema.element(id) {
        SchemaElement::InputField(field) if field.name == name => Some(ExpectedInput {
            shape: TypeShape::from_element(schema.arena(), field.ty)?,
            has_default: field.default_value.is_some(),
        }),
        _ => None,
    })
}
