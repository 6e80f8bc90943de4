// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{borrow::Borrow, collections::HashSet};

use common::cancellation::{CancellationCheck, NeverCancelled};
use tracing::debug;

use super::context::{NodeLocation, PathEntry, TraverserContext};
use crate::arena::{ElementId, GraphArena};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalControl {
    Continue,
    /// Skip the children of the current node. `leave` is still called for it.
    Quit,
    /// Stop the whole traversal.
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalStatus {
    Completed,
    Aborted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraverserResult {
    pub status: TraversalStatus,
    /// Nodes entered for the first time.
    pub entered: usize,
    pub back_refs: usize,
}

impl TraverserResult {
    pub fn is_completed(&self) -> bool {
        self.status == TraversalStatus::Completed
    }
}

/// Callbacks of a traversal. `A` is the arena access handed through to the callbacks: a shared
/// `&GraphArena` for read-only walks, an owned `GraphArena` when callbacks allocate.
pub trait TraverserVisitor<A> {
    fn enter(&mut self, ctx: &mut TraverserContext<'_>, arena: &mut A) -> TraversalControl;

    fn leave(&mut self, _ctx: &mut TraverserContext<'_>, _arena: &mut A) -> TraversalControl {
        TraversalControl::Continue
    }

    /// Called instead of `enter` for a node already on the current path (a cycle) or already
    /// visited through another parent (a shared node). Its children are not walked again.
    fn back_ref(&mut self, _ctx: &mut TraverserContext<'_>, _arena: &mut A) -> TraversalControl {
        TraversalControl::Continue
    }
}

enum Frame {
    Enter {
        node: ElementId,
        location: Option<NodeLocation>,
    },
    Leave,
}

/// Depth-first walker with an explicit stack, so depth is bounded by memory rather than the
/// call stack. The cancellation check is polled before every node.
#[derive(Debug, Clone, Default)]
pub struct Traverser<C = NeverCancelled> {
    cancellation: C,
}

impl Traverser<NeverCancelled> {
    pub fn new() -> Self {
        Self {
            cancellation: NeverCancelled,
        }
    }
}

impl<C: CancellationCheck> Traverser<C> {
    pub fn with_cancellation(cancellation: C) -> Self {
        Self { cancellation }
    }

    pub fn traverse<A, V>(
        &self,
        arena: &mut A,
        roots: &[ElementId],
        visitor: &mut V,
    ) -> TraverserResult
    where
        A: Borrow<GraphArena>,
        V: TraverserVisitor<A>,
    {
        let mut stack: Vec<Frame> = roots
            .iter()
            .rev()
            .map(|&node| Frame::Enter {
                node,
                location: None,
            })
            .collect();
        let mut path: Vec<PathEntry> = vec![];
        let mut on_path: HashSet<ElementId> = HashSet::new();
        let mut visited: HashSet<ElementId> = HashSet::new();

        let mut result = TraverserResult {
            status: TraversalStatus::Completed,
            entered: 0,
            back_refs: 0,
        };

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter { node, location } => {
                    if self.cancellation.is_cancelled() {
                        debug!(entered = result.entered, "traversal cancelled");
                        result.status = TraversalStatus::Cancelled;
                        return result;
                    }

                    let entry = PathEntry {
                        node,
                        original_node: node,
                        location,
                    };

                    let cycle = on_path.contains(&node);
                    if cycle || visited.contains(&node) {
                        result.back_refs += 1;
                        path.push(entry);
                        let control = {
                            let mut ctx = TraverserContext::new(&path, true, cycle);
                            visitor.back_ref(&mut ctx, arena)
                        };
                        path.pop();

                        if control == TraversalControl::Abort {
                            result.status = TraversalStatus::Aborted;
                            return result;
                        }
                        continue;
                    }

                    result.entered += 1;
                    visited.insert(node);
                    on_path.insert(node);
                    path.push(entry);

                    let (control, replacement) = {
                        let mut ctx = TraverserContext::new(&path, false, false);
                        let control = visitor.enter(&mut ctx, arena);
                        (control, ctx.replacement())
                    };

                    let mut current = node;
                    if let Some(replacement) = replacement {
                        if let Some(entry) = path.last_mut() {
                            entry.node = replacement;
                        }
                        visited.insert(replacement);
                        on_path.insert(replacement);
                        current = replacement;
                    }

                    match control {
                        TraversalControl::Abort => {
                            result.status = TraversalStatus::Aborted;
                            return result;
                        }
                        TraversalControl::Quit => stack.push(Frame::Leave),
                        TraversalControl::Continue => {
                            stack.push(Frame::Leave);

                            let graph = <A as Borrow<GraphArena>>::borrow(&*arena);
                            let children: Vec<Frame> = graph[current]
                                .edges()
                                .into_iter()
                                .flat_map(|(edge, children)| {
                                    children.iter().enumerate().map(move |(index, &child)| {
                                        Frame::Enter {
                                            node: child,
                                            location: Some(NodeLocation::new(edge, index)),
                                        }
                                    })
                                })
                                .collect();
                            stack.extend(children.into_iter().rev());
                        }
                    }
                }
                Frame::Leave => {
                    let control = {
                        let mut ctx = TraverserContext::new(&path, false, false);
                        visitor.leave(&mut ctx, arena)
                    };

                    if let Some(entry) = path.pop() {
                        on_path.remove(&entry.node);
                        on_path.remove(&entry.original_node);
                    }

                    if control == TraversalControl::Abort {
                        result.status = TraversalStatus::Aborted;
                        return result;
                    }
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use common::cancellation::TraversalBudget;

    use super::*;
    use crate::element::{
        AppliedDirectives, Edge, FieldDefinition, NonNullType, ObjectType, ScalarType,
        SchemaElement, TypeReference,
    };

    struct Graph {
        arena: GraphArena,
        node: ElementId,
        next_field: ElementId,
    }

    // type Node { id: ID!, next: Node }
    fn self_referencing_graph() -> Graph {
        let mut arena = GraphArena::new();
        let id_scalar = arena.alloc(SchemaElement::Scalar(ScalarType {
            name: "ID".to_string(),
            description: None,
            specified_by_url: None,
            directives: AppliedDirectives::empty(),
        }));
        let non_null_id = arena.alloc(SchemaElement::NonNull(NonNullType {
            wrapped: id_scalar,
        }));
        let id_field = arena.alloc(field("id", non_null_id));
        let placeholder = arena.alloc(SchemaElement::TypeReference(TypeReference::new("Node")));
        let next_field = arena.alloc(field("next", placeholder));
        let node = arena.alloc(SchemaElement::Object(ObjectType {
            name: "Node".to_string(),
            description: None,
            fields: vec![id_field, next_field],
            interfaces: vec![],
            directives: AppliedDirectives::empty(),
        }));
        arena.replace(next_field, field("next", node));

        Graph {
            arena,
            node,
            next_field,
        }
    }

    fn field(name: &str, ty: ElementId) -> SchemaElement {
        SchemaElement::Field(FieldDefinition {
            name: name.to_string(),
            description: None,
            ty,
            arguments: vec![],
            deprecation_reason: None,
            directives: AppliedDirectives::empty(),
        })
    }

    #[derive(Default)]
    struct Recorder {
        entered: Vec<ElementId>,
        left: Vec<ElementId>,
        back_refs: Vec<(ElementId, Option<ElementId>, bool)>,
        quit_at: Option<ElementId>,
        abort_at: Option<ElementId>,
    }

    impl<'g> TraverserVisitor<&'g GraphArena> for Recorder {
        fn enter(
            &mut self,
            ctx: &mut TraverserContext<'_>,
            _arena: &mut &'g GraphArena,
        ) -> TraversalControl {
            self.entered.push(ctx.this_node());
            if Some(ctx.this_node()) == self.abort_at {
                TraversalControl::Abort
            } else if Some(ctx.this_node()) == self.quit_at {
                TraversalControl::Quit
            } else {
                TraversalControl::Continue
            }
        }

        fn leave(
            &mut self,
            ctx: &mut TraverserContext<'_>,
            _arena: &mut &'g GraphArena,
        ) -> TraversalControl {
            self.left.push(ctx.this_node());
            TraversalControl::Continue
        }

        fn back_ref(
            &mut self,
            ctx: &mut TraverserContext<'_>,
            _arena: &mut &'g GraphArena,
        ) -> TraversalControl {
            self.back_refs
                .push((ctx.this_node(), ctx.parent_node(), ctx.is_cycle()));
            TraversalControl::Continue
        }
    }

    #[test]
    fn self_reference_is_a_back_ref() {
        let graph = self_referencing_graph();
        let mut recorder = Recorder::default();

        let result =
            Traverser::new().traverse(&mut &graph.arena, &[graph.node], &mut recorder);

        assert!(result.is_completed());
        assert_eq!(
            recorder.entered.iter().filter(|&&n| n == graph.node).count(),
            1
        );
        assert_eq!(
            recorder.back_refs,
            vec![(graph.node, Some(graph.next_field), true)]
        );
        // Node, id, ID!, ID, next
        assert_eq!(result.entered, 5);
        assert_eq!(recorder.left.len(), 5);
        assert_eq!(recorder.left.last(), Some(&graph.node));
    }

    #[test]
    fn shared_nodes_are_entered_once() {
        let graph = self_referencing_graph();
        let mut recorder = Recorder::default();

        Traverser::new().traverse(
            &mut &graph.arena,
            &[graph.node, graph.next_field],
            &mut recorder,
        );

        let (node, parent, cycle) = recorder.back_refs[1];
        assert_eq!(node, graph.next_field);
        assert_eq!(parent, None);
        assert!(!cycle);
    }

    #[test]
    fn quit_skips_children_but_leaves() {
        let graph = self_referencing_graph();
        let mut recorder = Recorder {
            quit_at: Some(graph.next_field),
            ..Default::default()
        };

        let result =
            Traverser::new().traverse(&mut &graph.arena, &[graph.node], &mut recorder);

        assert!(result.is_completed());
        assert!(recorder.back_refs.is_empty());
        assert!(recorder.left.contains(&graph.next_field));
    }

    #[test]
    fn abort_stops_everything() {
        let graph = self_referencing_graph();
        let mut recorder = Recorder {
            abort_at: Some(graph.next_field),
            ..Default::default()
        };

        let result =
            Traverser::new().traverse(&mut &graph.arena, &[graph.node], &mut recorder);

        assert_eq!(result.status, TraversalStatus::Aborted);
        assert_eq!(recorder.entered.last(), Some(&graph.next_field));
        assert!(!recorder.left.contains(&graph.node));
    }

    #[test]
    fn cancellation_is_polled_per_node() {
        let graph = self_referencing_graph();
        let mut recorder = Recorder::default();

        let result = Traverser::with_cancellation(TraversalBudget::unlimited().with_max_steps(2))
            .traverse(&mut &graph.arena, &[graph.node], &mut recorder);

        assert_eq!(result.status, TraversalStatus::Cancelled);
        assert_eq!(result.entered, 2);
    }

    struct BreadcrumbProbe {
        target: ElementId,
        breadcrumbs: Vec<(ElementId, Edge, usize)>,
    }

    impl<'g> TraverserVisitor<&'g GraphArena> for BreadcrumbProbe {
        fn enter(
            &mut self,
            ctx: &mut TraverserContext<'_>,
            _arena: &mut &'g GraphArena,
        ) -> TraversalControl {
            if ctx.this_node() == self.target {
                self.breadcrumbs = ctx
                    .breadcrumbs()
                    .into_iter()
                    .map(|b| (b.parent, b.location.edge, b.location.index))
                    .collect();
            }
            TraversalControl::Continue
        }
    }

    #[test]
    fn breadcrumbs_lead_back_to_the_root() {
        let graph = self_referencing_graph();
        let id_field = graph.arena[graph.node].edge_children(Edge::Fields).unwrap()[0];
        let non_null_id = graph.arena[id_field].children_with_type_references()[0];
        let mut probe = BreadcrumbProbe {
            target: graph.arena[non_null_id].children_with_type_references()[0],
            breadcrumbs: vec![],
        };

        Traverser::new().traverse(&mut &graph.arena, &[graph.node], &mut probe);

        assert_eq!(
            probe.breadcrumbs,
            vec![
                (non_null_id, Edge::WrappedType, 0),
                (id_field, Edge::Type, 0),
                (graph.node, Edge::Fields, 0),
            ]
        );
    }
}
