// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{arena::ElementId, element::Edge};

/// Where a node sits in its parent: the edge and the index within that edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeLocation {
    pub edge: Edge,
    pub index: usize,
}

impl NodeLocation {
    pub fn new(edge: Edge, index: usize) -> Self {
        Self { edge, index }
    }
}

/// One step of the path from a node up to the traversal root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breadcrumb {
    pub parent: ElementId,
    pub location: NodeLocation,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PathEntry {
    pub node: ElementId,
    pub original_node: ElementId,
    pub location: Option<NodeLocation>,
}

/// The state handed to traversal callbacks.
///
/// A context is a view of the current path (root first, current node last).
pub struct TraverserContext<'a> {
    path: &'a [PathEntry],
    back_ref: bool,
    cycle: bool,
    replacement: Option<ElementId>,
}

impl<'a> TraverserContext<'a> {
    pub(crate) fn new(path: &'a [PathEntry], back_ref: bool, cycle: bool) -> Self {
        Self {
            path,
            back_ref,
            cycle,
            replacement: None,
        }
    }

    fn current(&self) -> &PathEntry {
        // Contexts are only created for non-empty paths
        &self.path[self.path.len() - 1]
    }

    /// The node being visited, after any replacement made through [`Self::change_node`].
    pub fn this_node(&self) -> ElementId {
        self.replacement.unwrap_or(self.current().node)
    }

    /// The node as it was reached from its parent.
    pub fn original_node(&self) -> ElementId {
        self.current().original_node
    }

    pub fn location(&self) -> Option<NodeLocation> {
        self.current().location
    }

    pub fn parent_node(&self) -> Option<ElementId> {
        self.parent_context().map(|parent| parent.this_node())
    }

    pub fn parent_context(&self) -> Option<TraverserContext<'a>> {
        match self.path.len() {
            0 | 1 => None,
            len => Some(TraverserContext::new(&self.path[..len - 1], false, false)),
        }
    }

    /// Path from the immediate parent up to the traversal root.
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.path
            .windows(2)
            .rev()
            .filter_map(|pair| {
                pair[1].location.map(|location| Breadcrumb {
                    parent: pair[0].node,
                    location,
                })
            })
            .collect()
    }

    /// Number of ancestors of the current node.
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Whether this node was reached again (on the current path or after being fully visited).
    pub fn is_back_ref(&self) -> bool {
        self.back_ref
    }

    /// Whether this back reference closes a cycle (the node is one of its own ancestors).
    pub fn is_cycle(&self) -> bool {
        self.cycle
    }

    /// Replaces the current node for the rest of the traversal. Children of the replacement are
    /// visited instead of the original's. Only meaningful during `enter`.
    pub fn change_node(&mut self, replacement: ElementId) {
        self.replacement = Some(replacement);
    }

    pub(crate) fn replacement(&self) -> Option<ElementId> {
        self.replacement
    }
}
