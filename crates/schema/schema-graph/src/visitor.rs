// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The visitor protocol: one callback per element kind, each able to continue, quit, abort or
//! request a structural edit.
//!
//! Edits are only honoured by [`crate::transform::SchemaTransformer`]. A read-only walk with
//! [`SchemaTraverser`] fails with [`TraversalError::EditOutsideTransform`] if a visitor asks for
//! one.

use std::sync::Arc;

use common::cancellation::{CancellationCheck, NeverCancelled};

use crate::{
    arena::{ElementId, GraphArena},
    element::{
        ArgumentDefinition, DirectiveDefinition, EnumType, EnumValueDefinition, FieldDefinition,
        InputFieldDefinition, InputObjectType, InterfaceType, ListType, NonNullType, ObjectType,
        ScalarType, SchemaElement, SchemaRoot, TypeReference, UnionType,
    },
    error::TraversalError,
    schema::Schema,
    traversal::{
        Breadcrumb, TraversalControl, TraversalStatus, Traverser, TraverserContext,
        TraverserResult, TraverserVisitor,
    },
};

/// A structural edit requested for the node being visited.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEdit {
    Change(SchemaElement),
    Delete,
    InsertBefore(SchemaElement),
    InsertAfter(SchemaElement),
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisitResult {
    Control(TraversalControl),
    Edit(NodeEdit),
}

impl VisitResult {
    pub const CONTINUE: VisitResult = VisitResult::Control(TraversalControl::Continue);
    pub const QUIT: VisitResult = VisitResult::Control(TraversalControl::Quit);
    pub const ABORT: VisitResult = VisitResult::Control(TraversalControl::Abort);

    /// Replace the current node. The traversal continues into the replacement's children.
    pub fn change_node(replacement: SchemaElement) -> Self {
        Self::Edit(NodeEdit::Change(replacement))
    }

    /// Remove the current node from its parent. Its children are not visited.
    pub fn delete_node() -> Self {
        Self::Edit(NodeEdit::Delete)
    }

    /// Insert a sibling before the current node. The inserted node is not visited.
    pub fn insert_before(node: SchemaElement) -> Self {
        Self::Edit(NodeEdit::InsertBefore(node))
    }

    /// Insert a sibling after the current node. The inserted node is not visited.
    pub fn insert_after(node: SchemaElement) -> Self {
        Self::Edit(NodeEdit::InsertAfter(node))
    }
}

impl From<TraversalControl> for VisitResult {
    fn from(control: TraversalControl) -> Self {
        Self::Control(control)
    }
}

enum ArenaAccess<'v> {
    Shared(&'v GraphArena),
    Exclusive(&'v mut GraphArena),
}

/// What a [`SchemaVisitor`] callback sees: the element, its position and the arena.
pub struct VisitContext<'v, 'p> {
    traversal: &'v mut TraverserContext<'p>,
    element: Arc<SchemaElement>,
    arena: ArenaAccess<'v>,
}

impl<'v, 'p> VisitContext<'v, 'p> {
    pub(crate) fn shared(
        traversal: &'v mut TraverserContext<'p>,
        element: Arc<SchemaElement>,
        arena: &'v GraphArena,
    ) -> Self {
        Self {
            traversal,
            element,
            arena: ArenaAccess::Shared(arena),
        }
    }

    pub(crate) fn exclusive(
        traversal: &'v mut TraverserContext<'p>,
        element: Arc<SchemaElement>,
        arena: &'v mut GraphArena,
    ) -> Self {
        Self {
            traversal,
            element,
            arena: ArenaAccess::Exclusive(arena),
        }
    }

    pub fn node(&self) -> ElementId {
        self.traversal.this_node()
    }

    pub fn element(&self) -> &SchemaElement {
        &self.element
    }

    pub fn element_arc(&self) -> Arc<SchemaElement> {
        self.element.clone()
    }

    pub fn traverser_context(&self) -> &TraverserContext<'p> {
        self.traversal
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.traversal.breadcrumbs()
    }

    pub fn is_cycle(&self) -> bool {
        self.traversal.is_cycle()
    }

    pub fn arena(&self) -> &GraphArena {
        match &self.arena {
            ArenaAccess::Shared(arena) => *arena,
            ArenaAccess::Exclusive(arena) => &**arena,
        }
    }

    /// Available while transforming, to allocate children of replacement or inserted nodes.
    pub fn arena_mut(&mut self) -> Option<&mut GraphArena> {
        match &mut self.arena {
            ArenaAccess::Shared(_) => None,
            ArenaAccess::Exclusive(arena) => Some(&mut **arena),
        }
    }

    pub fn parent_element(&self) -> Option<&SchemaElement> {
        self.traversal
            .parent_node()
            .and_then(|parent| self.arena().get(parent))
    }

    /// Follows an id held by the current element.
    pub fn resolve(&self, id: ElementId) -> &SchemaElement {
        &self.arena()[id]
    }
}

/// Per-kind callbacks. Each defaults to [`SchemaVisitor::visit_schema_element`], so a visitor
/// only overrides the kinds it cares about.
pub trait SchemaVisitor {
    fn visit_schema_element(
        &mut self,
        _element: &SchemaElement,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        VisitResult::CONTINUE
    }

    fn visit_schema(
        &mut self,
        _schema: &SchemaRoot,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_scalar(
        &mut self,
        _scalar: &ScalarType,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_object(
        &mut self,
        _object: &ObjectType,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_interface(
        &mut self,
        _interface: &InterfaceType,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_union(&mut self, _union: &UnionType, ctx: &mut VisitContext<'_, '_>) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_enum(&mut self, _enum_type: &EnumType, ctx: &mut VisitContext<'_, '_>) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_enum_value(
        &mut self,
        _value: &EnumValueDefinition,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_input_object(
        &mut self,
        _input: &InputObjectType,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_input_object_field(
        &mut self,
        _field: &InputFieldDefinition,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_field_definition(
        &mut self,
        _field: &FieldDefinition,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_argument(
        &mut self,
        _argument: &ArgumentDefinition,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_directive(
        &mut self,
        _directive: &DirectiveDefinition,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_list(&mut self, _list: &ListType, ctx: &mut VisitContext<'_, '_>) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_non_null(
        &mut self,
        _non_null: &NonNullType,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    fn visit_type_reference(
        &mut self,
        _reference: &TypeReference,
        ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        self.visit_schema_element(&ctx.element_arc(), ctx)
    }

    /// A node reached again, either through a cycle or as a shared child.
    fn visit_back_ref(
        &mut self,
        _element: &SchemaElement,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> TraversalControl {
        TraversalControl::Continue
    }

    fn leave_element(
        &mut self,
        _element: &SchemaElement,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> TraversalControl {
        TraversalControl::Continue
    }
}

pub(crate) fn dispatch_visit<V: SchemaVisitor + ?Sized>(
    visitor: &mut V,
    element: &SchemaElement,
    ctx: &mut VisitContext<'_, '_>,
) -> VisitResult {
    match element {
        SchemaElement::Root(_) => VisitResult::CONTINUE,
        SchemaElement::Schema(schema) => visitor.visit_schema(schema, ctx),
        SchemaElement::Scalar(scalar) => visitor.visit_scalar(scalar, ctx),
        SchemaElement::Object(object) => visitor.visit_object(object, ctx),
        SchemaElement::Interface(interface) => visitor.visit_interface(interface, ctx),
        SchemaElement::Union(union) => visitor.visit_union(union, ctx),
        SchemaElement::Enum(enum_type) => visitor.visit_enum(enum_type, ctx),
        SchemaElement::EnumValue(value) => visitor.visit_enum_value(value, ctx),
        SchemaElement::InputObject(input) => visitor.visit_input_object(input, ctx),
        SchemaElement::InputField(field) => visitor.visit_input_object_field(field, ctx),
        SchemaElement::Field(field) => visitor.visit_field_definition(field, ctx),
        SchemaElement::Argument(argument) => visitor.visit_argument(argument, ctx),
        SchemaElement::Directive(directive) => visitor.visit_directive(directive, ctx),
        SchemaElement::List(list) => visitor.visit_list(list, ctx),
        SchemaElement::NonNull(non_null) => visitor.visit_non_null(non_null, ctx),
        SchemaElement::TypeReference(reference) => visitor.visit_type_reference(reference, ctx),
    }
}

/// Read-only walk of a schema with a [`SchemaVisitor`].
pub struct SchemaTraverser<C = NeverCancelled> {
    traverser: Traverser<C>,
}

impl SchemaTraverser<NeverCancelled> {
    pub fn new() -> Self {
        Self {
            traverser: Traverser::new(),
        }
    }
}

impl Default for SchemaTraverser<NeverCancelled> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CancellationCheck> SchemaTraverser<C> {
    pub fn with_cancellation(cancellation: C) -> Self {
        Self {
            traverser: Traverser::with_cancellation(cancellation),
        }
    }

    pub fn visit<V: SchemaVisitor>(
        &self,
        schema: &Schema,
        visitor: &mut V,
    ) -> Result<TraverserResult, TraversalError> {
        self.visit_elements(schema.arena(), &[schema.root()], visitor)
    }

    pub fn visit_elements<V: SchemaVisitor>(
        &self,
        arena: &GraphArena,
        roots: &[ElementId],
        visitor: &mut V,
    ) -> Result<TraverserResult, TraversalError> {
        let mut adapter = ReadOnlyVisitor {
            visitor,
            error: None,
        };
        let result = self.traverser.traverse(&mut &*arena, roots, &mut adapter);

        if let Some(error) = adapter.error {
            return Err(error);
        }
        match result.status {
            TraversalStatus::Cancelled => Err(common::cancellation::Cancelled.into()),
            _ => Ok(result),
        }
    }
}

struct ReadOnlyVisitor<'a, V> {
    visitor: &'a mut V,
    error: Option<TraversalError>,
}

impl<'g, V: SchemaVisitor> TraverserVisitor<&'g GraphArena> for ReadOnlyVisitor<'_, V> {
    fn enter(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut &'g GraphArena,
    ) -> TraversalControl {
        let element = arena.get_arc(ctx.this_node()).clone();
        let mut visit_ctx = VisitContext::shared(ctx, element.clone(), *arena);

        match dispatch_visit(&mut *self.visitor, &element, &mut visit_ctx) {
            VisitResult::Control(control) => control,
            VisitResult::Edit(_) => {
                self.error = Some(TraversalError::EditOutsideTransform {
                    element: element.to_string(),
                });
                TraversalControl::Abort
            }
        }
    }

    fn leave(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut &'g GraphArena,
    ) -> TraversalControl {
        let element = arena.get_arc(ctx.this_node()).clone();
        let mut visit_ctx = VisitContext::shared(ctx, element.clone(), *arena);
        self.visitor.leave_element(&element, &mut visit_ctx)
    }

    fn back_ref(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut &'g GraphArena,
    ) -> TraversalControl {
        let element = arena.get_arc(ctx.this_node()).clone();
        let mut visit_ctx = VisitContext::shared(ctx, element.clone(), *arena);
        self.visitor.visit_back_ref(&element, &mut visit_ctx)
    }
}

#[cfg(test)]
mod tests {
    use common::cancellation::TraversalBudget;
    use test_log::test;

    use super::*;
    use crate::{
        builder::{FieldBuilder, ObjectTypeBuilder, SchemaBuilder, TypeExpr},
        element::Edge,
        traversal::NodeLocation,
    };

    fn tree_schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("node", TypeExpr::named("Node"))),
            )
            .and_then(|b| {
                b.add_type(
                    ObjectTypeBuilder::new("Node")
                        .field(FieldBuilder::new("parent", TypeExpr::named("Node")))
                        .field(FieldBuilder::new("name", TypeExpr::named("String"))),
                )
            })
            .and_then(|b| b.build())
            .unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        objects: Vec<String>,
        cycles: Vec<String>,
        shared: usize,
        name_breadcrumbs: Option<Vec<Breadcrumb>>,
    }

    impl SchemaVisitor for Recorder {
        fn visit_object(
            &mut self,
            object: &ObjectType,
            _ctx: &mut VisitContext<'_, '_>,
        ) -> VisitResult {
            self.objects.push(object.name.clone());
            VisitResult::CONTINUE
        }

        fn visit_field_definition(
            &mut self,
            field: &FieldDefinition,
            ctx: &mut VisitContext<'_, '_>,
        ) -> VisitResult {
            if field.name == "name" && ctx.parent_element().and_then(|p| p.name()) == Some("Node")
            {
                self.name_breadcrumbs = Some(ctx.breadcrumbs());
            }
            VisitResult::CONTINUE
        }

        fn visit_back_ref(
            &mut self,
            element: &SchemaElement,
            ctx: &mut VisitContext<'_, '_>,
        ) -> TraversalControl {
            match element.name() {
                Some(name) if ctx.is_cycle() => self.cycles.push(name.to_string()),
                _ => self.shared += 1,
            }
            TraversalControl::Continue
        }
    }

    #[test]
    fn visits_each_type_once() {
        let schema = tree_schema();
        let mut recorder = Recorder::default();

        let result = SchemaTraverser::new()
            .visit(&schema, &mut recorder)
            .unwrap();

        assert!(result.is_completed());
        assert_eq!(recorder.objects, vec!["Query", "Node"]);
        assert_eq!(recorder.cycles, vec!["Node"]);
        // `Node` is listed again among the additional types
        assert!(recorder.shared >= 1);
    }

    #[test]
    fn breadcrumbs_lead_back_to_the_root() {
        let schema = tree_schema();
        let node = schema.type_id("Node").unwrap();
        let mut recorder = Recorder::default();

        SchemaTraverser::new()
            .visit(&schema, &mut recorder)
            .unwrap();

        let breadcrumbs = recorder.name_breadcrumbs.unwrap();
        assert_eq!(breadcrumbs[0].parent, node);
        assert_eq!(breadcrumbs[0].location, NodeLocation::new(Edge::Fields, 1));
        assert_eq!(breadcrumbs.last().unwrap().parent, schema.root());
    }

    struct QuitAtQuery {
        fields: Vec<String>,
    }

    impl SchemaVisitor for QuitAtQuery {
        fn visit_object(
            &mut self,
            object: &ObjectType,
            _ctx: &mut VisitContext<'_, '_>,
        ) -> VisitResult {
            if object.name == "Query" {
                VisitResult::QUIT
            } else {
                VisitResult::CONTINUE
            }
        }

        fn visit_field_definition(
            &mut self,
            field: &FieldDefinition,
            _ctx: &mut VisitContext<'_, '_>,
        ) -> VisitResult {
            self.fields.push(field.name.clone());
            VisitResult::CONTINUE
        }
    }

    #[test]
    fn quit_skips_the_children() {
        let mut visitor = QuitAtQuery { fields: vec![] };

        SchemaTraverser::new()
            .visit(&tree_schema(), &mut visitor)
            .unwrap();

        assert!(!visitor.fields.contains(&"node".to_string()));
        assert!(visitor.fields.contains(&"parent".to_string()));
    }

    struct DeleteEverything;

    impl SchemaVisitor for DeleteEverything {
        fn visit_object(
            &mut self,
            _object: &ObjectType,
            _ctx: &mut VisitContext<'_, '_>,
        ) -> VisitResult {
            VisitResult::delete_node()
        }
    }

    #[test]
    fn edits_need_a_transformation() {
        let result = SchemaTraverser::new().visit(&tree_schema(), &mut DeleteEverything);

        assert_eq!(
            result,
            Err(TraversalError::EditOutsideTransform {
                element: "object type 'Query'".to_string()
            })
        );
    }

    #[test]
    fn cancellation_is_reported() {
        let budget = TraversalBudget::unlimited().with_max_steps(2);
        let result = SchemaTraverser::with_cancellation(budget)
            .visit(&tree_schema(), &mut Recorder::default());

        assert!(matches!(result, Err(TraversalError::Cancelled(_))));
    }
}
