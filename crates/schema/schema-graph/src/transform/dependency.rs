// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Rebuild order of the nodes touched by a transformation.

use petgraph::{algo::toposort, graphmap::DiGraphMap};

use crate::{arena::ElementId, error::TransformError};

/// Reverse dependencies: an edge runs from a child to each parent that must be rebuilt when the
/// child changes.
#[derive(Debug, Default)]
pub(crate) struct DependencyGraph {
    graph: DiGraphMap<ElementId, ()>,
}

impl DependencyGraph {
    pub fn add_node(&mut self, node: ElementId) {
        self.graph.add_node(node);
    }

    pub fn add_link(&mut self, child: ElementId, parent: ElementId) {
        self.graph.add_edge(child, parent, ());
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Children before parents.
    pub fn rebuild_order(&self) -> Result<Vec<ElementId>, TransformError> {
        toposort(&self.graph, None).map_err(|cycle| TransformError::DependencyCycle {
            node: cycle.node_id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arena::GraphArena,
        element::{SchemaElement, TypeReference},
    };

    fn ids(count: usize) -> Vec<ElementId> {
        let mut arena = GraphArena::new();
        (0..count)
            .map(|_| arena.alloc(SchemaElement::TypeReference(TypeReference::new("T"))))
            .collect()
    }

    #[test]
    fn children_come_first() {
        let all = ids(4);
        let (root, object, field, shared) = (all[0], all[1], all[2], all[3]);

        let mut graph = DependencyGraph::default();
        for &id in &all {
            graph.add_node(id);
        }
        graph.add_link(object, root);
        graph.add_link(field, object);
        graph.add_link(shared, field);
        graph.add_link(shared, root);

        let order = graph.rebuild_order().unwrap();
        let position = |id| order.iter().position(|&n| n == id).unwrap();
        assert!(position(shared) < position(field));
        assert!(position(field) < position(object));
        assert!(position(object) < position(root));
    }

    #[test]
    fn cycles_are_reported() {
        let all = ids(2);
        let mut graph = DependencyGraph::default();
        graph.add_link(all[0], all[1]);
        graph.add_link(all[1], all[0]);

        assert!(matches!(
            graph.rebuild_order(),
            Err(TransformError::DependencyCycle { .. })
        ));
    }
}
