// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Immutable transformation of the type graph.
//!
//! A transformation walks the graph with a [`SchemaVisitor`] and records each requested edit as a
//! [`NodeZipper`] instead of applying it. Once the walk is done, the touched nodes are rebuilt
//! children first, in the order given by the reverse dependencies collected along the way. Each
//! node is rebuilt once, with all edits to its children applied together.
//!
//! The input is never modified. The output arena is a clone of the input (sharing every `Arc`),
//! in which only rebuilt nodes differ:
//! - a named type keeps its slot, so every reference to it (including its own fields'
//!   references) sees the new version without rebuilding the referrers;
//! - any other rebuilt node gets a new slot, and its parents are rebuilt in turn.

mod dependency;
mod zipper;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use common::cancellation::{CancellationCheck, Cancelled, NeverCancelled};
use tracing::{debug, instrument, warn};

use dependency::DependencyGraph;
use zipper::{ChildEdit, ChildEditKind, NodeZipper, ZipperKind, apply_child_edits};

use crate::{
    arena::{ElementId, GraphArena},
    element::{SchemaElement, TraversalRoot, TypeReference},
    error::TransformError,
    resolution::reachable_elements,
    schema::Schema,
    traversal::{
        NodeLocation, TraversalControl, TraversalStatus, Traverser, TraverserContext,
        TraverserVisitor,
    },
    visitor::{NodeEdit, SchemaVisitor, VisitContext, VisitResult, dispatch_visit},
};

#[derive(Debug, Clone, Default)]
pub struct SchemaTransformer<C = NeverCancelled> {
    cancellation: C,
}

impl SchemaTransformer<NeverCancelled> {
    pub fn new() -> Self {
        Self {
            cancellation: NeverCancelled,
        }
    }
}

struct Outcome {
    arena: GraphArena,
    root: ElementId,
    renames: HashMap<String, String>,
}

impl<C: CancellationCheck> SchemaTransformer<C> {
    pub fn with_cancellation(cancellation: C) -> Self {
        Self { cancellation }
    }

    /// Applies the edits `visitor` requests while walking `schema`, producing a new schema.
    #[instrument(name = "SchemaTransformer::transform", skip_all)]
    pub fn transform<V: SchemaVisitor>(
        &self,
        schema: &Schema,
        visitor: &mut V,
    ) -> Result<Schema, TransformError> {
        let Outcome {
            arena,
            root,
            renames,
        } = self.run(schema.arena(), schema.root(), visitor)?;
        let (arena, root) = self.rename_references(arena, root, &renames)?;

        if !matches!(arena[root], SchemaElement::Schema(_)) {
            return Err(TransformError::InvalidEdit {
                message: format!("the schema root was replaced by a {}", arena[root].kind()),
            });
        }

        let code_registry = if renames.is_empty() {
            schema.code_registry_arc().clone()
        } else {
            Arc::new(schema.code_registry().renamed(&renames))
        };

        Ok(Schema::assemble(arena, root, code_registry)?)
    }

    /// Transforms the sub-graph under `element`. Returns the new arena and the id of the
    /// (possibly rebuilt) element in it.
    pub fn transform_element<V: SchemaVisitor>(
        &self,
        arena: &GraphArena,
        element: ElementId,
        visitor: &mut V,
    ) -> Result<(GraphArena, ElementId), TransformError> {
        let Outcome {
            arena,
            root,
            renames,
        } = self.run(arena, element, visitor)?;
        self.rename_references(arena, root, &renames)
    }

    fn run<V: SchemaVisitor>(
        &self,
        arena: &GraphArena,
        root: ElementId,
        visitor: &mut V,
    ) -> Result<Outcome, TransformError> {
        let mut work = arena.clone();
        // The artificial parent lets the element under transformation be replaced like any other
        let wrapper = work.alloc(SchemaElement::Root(TraversalRoot { root }));

        let mut recorder = EditRecorder {
            visitor,
            recording: Recording::default(),
            error: None,
        };
        let result = Traverser::with_cancellation(&self.cancellation).traverse(
            &mut work,
            &[wrapper],
            &mut recorder,
        );

        let EditRecorder {
            recording, error, ..
        } = recorder;
        if let Some(error) = error {
            return Err(error);
        }
        if result.status == TraversalStatus::Cancelled {
            warn!(entered = result.entered, "transformation cancelled");
            return Err(Cancelled.into());
        }

        let renames = recording.renames(&work);
        let zippers = recording.zippers.len();
        let (root, rebuilt) = recording.zip(&mut work, wrapper)?;

        debug!(
            entered = result.entered,
            back_refs = result.back_refs,
            zippers,
            rebuilt,
            "transformation applied"
        );

        Ok(Outcome {
            arena: work,
            root,
            renames,
        })
    }

    /// Rewrites type references still using a renamed type's old name, when no type of that
    /// name remains.
    fn rename_references(
        &self,
        arena: GraphArena,
        root: ElementId,
        renames: &HashMap<String, String>,
    ) -> Result<(GraphArena, ElementId), TransformError> {
        if renames.is_empty() {
            return Ok((arena, root));
        }

        let stale: HashMap<String, String> = {
            let reachable = reachable_elements(&arena, &[root]);
            let defined: HashSet<&str> = reachable
                .iter()
                .filter_map(|&id| arena[id].type_name())
                .collect();
            let referenced: HashSet<&str> = reachable
                .iter()
                .filter_map(|&id| match &arena[id] {
                    SchemaElement::TypeReference(reference) => Some(reference.name.as_str()),
                    _ => None,
                })
                .collect();

            renames
                .iter()
                .filter(|(old, _)| {
                    referenced.contains(old.as_str()) && !defined.contains(old.as_str())
                })
                .map(|(old, new)| (old.clone(), new.clone()))
                .collect()
        };

        if stale.is_empty() {
            return Ok((arena, root));
        }

        debug!(renamed = stale.len(), "rewriting references to renamed types");
        let mut renamer = TypeReferenceRenamer { renames: &stale };
        let outcome = self.run(&arena, root, &mut renamer)?;
        Ok((outcome.arena, outcome.root))
    }
}

struct TypeReferenceRenamer<'a> {
    renames: &'a HashMap<String, String>,
}

impl SchemaVisitor for TypeReferenceRenamer<'_> {
    fn visit_type_reference(
        &mut self,
        reference: &TypeReference,
        _ctx: &mut VisitContext<'_, '_>,
    ) -> VisitResult {
        match self.renames.get(&reference.name) {
            Some(new_name) => {
                VisitResult::change_node(SchemaElement::TypeReference(TypeReference::new(new_name)))
            }
            None => VisitResult::CONTINUE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ParentLink {
    parent: ElementId,
    location: NodeLocation,
}

/// An entered node, keyed by the id its parent holds.
#[derive(Debug)]
struct NodeRecord {
    /// The replacement, if the node was changed.
    current: ElementId,
    /// The parent it was entered from, then parents reaching it again as a shared child.
    parents: Vec<ParentLink>,
}

#[derive(Debug, Default)]
struct Recording {
    records: HashMap<ElementId, NodeRecord>,
    zippers: Vec<NodeZipper>,
    dependencies: DependencyGraph,
}

impl Recording {
    fn enter(
        &mut self,
        node: ElementId,
        parent: Option<ElementId>,
        location: Option<NodeLocation>,
        named: bool,
    ) {
        self.dependencies.add_node(node);

        let mut parents = vec![];
        if let (Some(parent), Some(location)) = (parent, location) {
            parents.push(ParentLink { parent, location });
            // A rebuilt named type stays in its slot, so its parent never needs rebuilding
            if !named {
                self.dependencies.add_link(node, parent);
            }
        }

        self.records.insert(
            node,
            NodeRecord {
                current: node,
                parents,
            },
        );
    }

    fn link(&mut self, node: ElementId, parent: ElementId, location: NodeLocation) {
        if let Some(record) = self.records.get_mut(&node) {
            record.parents.push(ParentLink { parent, location });
            self.dependencies.add_link(node, parent);
        }
    }

    fn replace(&mut self, node: ElementId, replacement: ElementId) {
        if let Some(record) = self.records.get_mut(&node) {
            record.current = replacement;
        }
    }

    /// Old and new names of named types replaced under a different name.
    fn renames(&self, arena: &GraphArena) -> HashMap<String, String> {
        self.zippers
            .iter()
            .filter(|zipper| zipper.kind == ZipperKind::Replace)
            .filter_map(|zipper| {
                let old = arena[zipper.original].type_name()?;
                let new = arena[zipper.current].type_name()?;
                (old != new).then(|| (old.to_string(), new.to_string()))
            })
            .collect()
    }

    /// Rebuilds every touched node, children first. Returns the new id of the traversal root's
    /// child and the number of rebuilt nodes.
    fn zip(
        self,
        arena: &mut GraphArena,
        wrapper: ElementId,
    ) -> Result<(ElementId, usize), TransformError> {
        let order = self.dependencies.rebuild_order()?;

        let mut pending: HashMap<ElementId, Vec<ChildEdit>> = HashMap::new();
        let mut deleted: HashSet<ElementId> = HashSet::new();
        for zipper in &self.zippers {
            if zipper.kind == ZipperKind::Delete {
                deleted.insert(zipper.original);
            }
            if let Some((parent, edit)) = zipper.child_edit() {
                pending.entry(parent).or_default().push(edit);
            }
        }

        let mut new_wrapper = wrapper;
        let mut rebuilt = 0;

        for node in order {
            let edits = pending.remove(&node);
            if deleted.contains(&node) {
                continue;
            }
            let Some(record) = self.records.get(&node) else {
                if edits.is_some() {
                    return Err(TransformError::MissingZipper { node });
                }
                continue;
            };

            let replaced = record.current != node;
            if edits.is_none() && !replaced {
                continue;
            }

            let has_edits = edits.is_some();
            let base = arena.get_arc(record.current).clone();
            let element = match edits {
                Some(edits) => apply_child_edits(&base, edits)?,
                None => base.as_ref().clone(),
            };
            assert_single_non_null(arena, &element)?;

            let final_id = if arena[node].is_named_type() {
                arena.replace(node, element);
                node
            } else if has_edits {
                arena.alloc(element)
            } else {
                record.current
            };
            rebuilt += 1;

            if node == wrapper {
                new_wrapper = final_id;
            }
            if final_id != node {
                for link in &record.parents {
                    pending.entry(link.parent).or_default().push(ChildEdit {
                        location: link.location,
                        kind: ChildEditKind::Replace(final_id),
                    });
                }
            }
        }

        if let Some(&node) = pending.keys().find(|node| !deleted.contains(*node)) {
            return Err(TransformError::MissingZipper { node });
        }

        match &arena[new_wrapper] {
            SchemaElement::Root(root) => Ok((root.root, rebuilt)),
            other => Err(TransformError::InvalidEdit {
                message: format!("the traversal root became a {}", other.kind()),
            }),
        }
    }
}

fn assert_single_non_null(
    arena: &GraphArena,
    element: &SchemaElement,
) -> Result<(), TransformError> {
    match element {
        SchemaElement::NonNull(non_null)
            if matches!(arena[non_null.wrapped], SchemaElement::NonNull(_)) =>
        {
            Err(TransformError::InvalidEdit {
                message: "a non-null type cannot wrap an existing non-null type".to_string(),
            })
        }
        _ => Ok(()),
    }
}

struct EditRecorder<'a, V> {
    visitor: &'a mut V,
    recording: Recording,
    error: Option<TransformError>,
}

impl<V: SchemaVisitor> EditRecorder<'_, V> {
    fn record_edit(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut GraphArena,
        element: &SchemaElement,
        edit: NodeEdit,
    ) -> Result<TraversalControl, TransformError> {
        let node = ctx.this_node();

        let (kind, current, control) = match edit {
            NodeEdit::Change(replacement) => {
                if element.is_named_type() && !replacement.is_named_type() {
                    return Err(TransformError::InvalidEdit {
                        message: format!(
                            "{element} can only be replaced by a named type, not a {}",
                            replacement.kind()
                        ),
                    });
                }
                let replacement = arena.alloc(replacement);
                ctx.change_node(replacement);
                self.recording.replace(node, replacement);
                (ZipperKind::Replace, replacement, TraversalControl::Continue)
            }
            NodeEdit::Delete => (ZipperKind::Delete, node, TraversalControl::Quit),
            NodeEdit::InsertBefore(sibling) => (
                ZipperKind::InsertBefore,
                arena.alloc(sibling),
                TraversalControl::Continue,
            ),
            NodeEdit::InsertAfter(sibling) => (
                ZipperKind::InsertAfter,
                arena.alloc(sibling),
                TraversalControl::Continue,
            ),
        };

        self.recording.zippers.push(NodeZipper {
            original: node,
            current,
            kind,
            parent: ctx.parent_context().map(|parent| parent.original_node()),
            location: ctx.location(),
        });

        Ok(control)
    }
}

impl<V: SchemaVisitor> TraverserVisitor<GraphArena> for EditRecorder<'_, V> {
    fn enter(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut GraphArena,
    ) -> TraversalControl {
        let node = ctx.this_node();
        let element = arena.get_arc(node).clone();
        self.recording.enter(
            node,
            ctx.parent_context().map(|parent| parent.original_node()),
            ctx.location(),
            element.is_named_type(),
        );

        let result = {
            let mut visit_ctx = VisitContext::exclusive(ctx, element.clone(), arena);
            dispatch_visit(&mut *self.visitor, &element, &mut visit_ctx)
        };

        match result {
            VisitResult::Control(control) => control,
            VisitResult::Edit(edit) => match self.record_edit(ctx, arena, &element, edit) {
                Ok(control) => control,
                Err(error) => {
                    self.error = Some(error);
                    TraversalControl::Abort
                }
            },
        }
    }

    fn leave(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut GraphArena,
    ) -> TraversalControl {
        let element = arena.get_arc(ctx.this_node()).clone();
        let mut visit_ctx = VisitContext::exclusive(ctx, element.clone(), arena);
        self.visitor.leave_element(&element, &mut visit_ctx)
    }

    fn back_ref(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        arena: &mut GraphArena,
    ) -> TraversalControl {
        let node = ctx.this_node();
        let element = arena.get_arc(node).clone();

        if !element.is_named_type() {
            let parent = ctx.parent_context().map(|parent| parent.original_node());
            if let (Some(parent), Some(location)) = (parent, ctx.location()) {
                self.recording.link(node, parent, location);
            }
        }

        let mut visit_ctx = VisitContext::exclusive(ctx, element.clone(), arena);
        self.visitor.visit_back_ref(&element, &mut visit_ctx)
    }
}
