// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Reference resolution.
//!
//! Elements are built with [`TypeReference`] placeholders wherever a type is named before (or
//! without) having its element at hand. Once every type exists, [`resolve_references`] points
//! each placeholder's parent at the real named type.

use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    arena::{ElementId, GraphArena},
    element::SchemaElement,
    error::SchemaError,
    traversal::{TraversalControl, Traverser, TraverserContext, TraverserVisitor},
};

struct ReachableCollector {
    nodes: Vec<ElementId>,
}

impl<'g> TraverserVisitor<&'g GraphArena> for ReachableCollector {
    fn enter(
        &mut self,
        ctx: &mut TraverserContext<'_>,
        _arena: &mut &'g GraphArena,
    ) -> TraversalControl {
        self.nodes.push(ctx.this_node());
        TraversalControl::Continue
    }
}

/// Every element reachable from `roots`, in depth-first pre-order, each once.
pub fn reachable_elements(arena: &GraphArena, roots: &[ElementId]) -> Vec<ElementId> {
    let mut collector = ReachableCollector { nodes: vec![] };
    Traverser::new().traverse(&mut &*arena, roots, &mut collector);
    collector.nodes
}

/// Name index of the named types reachable from `root`.
pub fn build_type_index(
    arena: &GraphArena,
    root: ElementId,
) -> Result<BTreeMap<String, ElementId>, SchemaError> {
    let mut index: BTreeMap<String, ElementId> = BTreeMap::new();

    for id in reachable_elements(arena, &[root]) {
        let element = &arena[id];
        let Some(name) = element.type_name() else {
            continue;
        };

        match index.get(name) {
            Some(&existing) if existing != id => {
                return Err(SchemaError::DuplicateTypeName {
                    name: name.to_string(),
                    first: arena[existing].kind(),
                    second: element.kind(),
                });
            }
            Some(_) => {}
            None => {
                index.insert(name.to_string(), id);
            }
        }
    }

    Ok(index)
}

/// Produces a copy of `arena` in which no element reachable from `root` has a type reference
/// child. Slots of rewritten parents are replaced in the copy; `arena` itself is untouched.
pub fn resolve_references(
    arena: &GraphArena,
    root: ElementId,
    index: &BTreeMap<String, ElementId>,
) -> Result<GraphArena, SchemaError> {
    let mut resolved = arena.clone();
    let mut rewritten = 0;

    for id in reachable_elements(arena, &[root]) {
        let element = &arena[id];
        let mut rebuilt: Option<SchemaElement> = None;

        for (edge, children) in element.edges() {
            if !children
                .iter()
                .any(|&child| matches!(arena[child], SchemaElement::TypeReference(_)))
            {
                continue;
            }

            let targets = children
                .iter()
                .map(|&child| match &arena[child] {
                    SchemaElement::TypeReference(reference) => index
                        .get(&reference.name)
                        .copied()
                        .ok_or_else(|| SchemaError::DanglingTypeReference {
                            name: reference.name.clone(),
                        }),
                    _ => Ok(child),
                })
                .collect::<Result<Vec<_>, _>>()?;

            let base = rebuilt.as_ref().unwrap_or(element);
            rebuilt = Some(base.with_edge_children(edge, targets)?);
        }

        if let Some(rebuilt) = rebuilt {
            resolved.replace(id, rebuilt);
            rewritten += 1;
        }
    }

    debug!(rewritten, "resolved type references");
    Ok(resolved)
}
