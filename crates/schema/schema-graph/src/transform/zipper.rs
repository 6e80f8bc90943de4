// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Edits recorded during a transformation and their application to a parent's child lists.

use std::collections::BTreeMap;

use crate::{
    arena::ElementId,
    element::{Edge, SchemaElement},
    error::{SchemaError, TransformError},
    traversal::NodeLocation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ZipperKind {
    Replace,
    Delete,
    InsertBefore,
    InsertAfter,
}

/// One edit requested by a visitor.
///
/// `original` is the node as reached from its parent, `current` what the parent should point at
/// afterwards (the replacement, or the inserted sibling for inserts).
#[derive(Debug, Clone)]
pub(crate) struct NodeZipper {
    pub original: ElementId,
    pub current: ElementId,
    pub kind: ZipperKind,
    pub parent: Option<ElementId>,
    pub location: Option<NodeLocation>,
}

impl NodeZipper {
    /// The edit this zipper makes to its parent's children, if any. A replacement is reported
    /// once the replaced node has been rebuilt.
    pub fn child_edit(&self) -> Option<(ElementId, ChildEdit)> {
        let parent = self.parent?;
        let location = self.location?;
        let kind = match self.kind {
            ZipperKind::Replace => return None,
            ZipperKind::Delete => ChildEditKind::Delete,
            ZipperKind::InsertBefore => ChildEditKind::InsertBefore(self.current),
            ZipperKind::InsertAfter => ChildEditKind::InsertAfter(self.current),
        };
        Some((parent, ChildEdit { location, kind }))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChildEditKind {
    Replace(ElementId),
    Delete,
    InsertBefore(ElementId),
    InsertAfter(ElementId),
}

impl ChildEditKind {
    /// At one index, a replacement or deletion applies first, then inserts before, then
    /// inserts after.
    fn order(&self) -> u8 {
        match self {
            Self::Replace(_) | Self::Delete => 0,
            Self::InsertBefore(_) => 1,
            Self::InsertAfter(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChildEdit {
    pub location: NodeLocation,
    pub kind: ChildEditKind,
}

/// Applies edits made at the original indices of `children`.
fn apply_to_children(
    children: &mut Vec<ElementId>,
    mut edits: Vec<(usize, ChildEditKind)>,
) -> Result<(), TransformError> {
    edits.sort_by_key(|(index, kind)| (*index, kind.order()));

    let mut shift: isize = 0;
    let mut rewritten: Option<usize> = None;
    let mut deleted: Option<usize> = None;

    for (index, kind) in edits {
        // Inserts next to a deleted child take its place
        let anchor_deleted = deleted == Some(index);
        let at = index as isize + shift + isize::from(anchor_deleted);
        let at = usize::try_from(at).ok().filter(|at| *at <= children.len()).ok_or_else(|| {
            TransformError::InvalidEdit {
                message: format!("child index {index} is out of range"),
            }
        })?;

        match kind {
            ChildEditKind::Replace(_) | ChildEditKind::Delete if rewritten == Some(index) => {
                return Err(TransformError::InvalidEdit {
                    message: format!("conflicting edits to the child at index {index}"),
                });
            }
            ChildEditKind::Replace(id) => match children.get_mut(at) {
                Some(slot) => {
                    *slot = id;
                    rewritten = Some(index);
                }
                None => {
                    return Err(TransformError::InvalidEdit {
                        message: format!("no child to replace at index {index}"),
                    });
                }
            },
            ChildEditKind::Delete => {
                if at >= children.len() {
                    return Err(TransformError::InvalidEdit {
                        message: format!("no child to delete at index {index}"),
                    });
                }
                children.remove(at);
                shift -= 1;
                rewritten = Some(index);
                deleted = Some(index);
            }
            ChildEditKind::InsertBefore(id) => {
                children.insert(at, id);
                shift += 1;
            }
            ChildEditKind::InsertAfter(id) => {
                let at = if anchor_deleted { at } else { at + 1 };
                children.insert(at.min(children.len()), id);
                shift += 1;
            }
        }
    }

    Ok(())
}

/// Rebuilds `element` with all edits to its children, edge by edge.
pub(crate) fn apply_child_edits(
    element: &SchemaElement,
    edits: Vec<ChildEdit>,
) -> Result<SchemaElement, TransformError> {
    let mut by_edge: BTreeMap<Edge, Vec<(usize, ChildEditKind)>> = BTreeMap::new();
    for edit in edits {
        by_edge
            .entry(edit.location.edge)
            .or_default()
            .push((edit.location.index, edit.kind));
    }

    let mut rebuilt = element.clone();
    for (edge, edits) in by_edge {
        let mut children = rebuilt
            .edge_children(edge)
            .ok_or(SchemaError::UnknownEdge {
                kind: rebuilt.kind(),
                edge,
            })?
            .to_vec();

        apply_to_children(&mut children, edits)?;

        rebuilt = rebuilt
            .with_edge_children(edge, children)
            .map_err(|error| match error {
                SchemaError::InvalidChildCount { kind, edge, count } => {
                    TransformError::InvalidEdit {
                        message: format!("a {kind} cannot have {count} children on its '{edge}' edge"),
                    }
                }
                other => other.into(),
            })?;
    }

    Ok(rebuilt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{arena::GraphArena, element::TypeReference};

    fn ids(count: usize) -> Vec<ElementId> {
        let mut arena = GraphArena::new();
        (0..count)
            .map(|i| arena.alloc(SchemaElement::TypeReference(TypeReference::new(format!("T{i}")))))
            .collect()
    }

    #[test]
    fn delete_then_inserts_at_one_index() {
        let all = ids(6);
        let (a, b, c, x, y, z) = (all[0], all[1], all[2], all[3], all[4], all[5]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![
                (1, ChildEditKind::InsertAfter(y)),
                (1, ChildEditKind::InsertBefore(x)),
                (1, ChildEditKind::Delete),
                (2, ChildEditKind::Replace(z)),
            ],
        )
        .unwrap();

        assert_eq!(children, vec![a, x, y, z]);
    }

    #[test]
    fn inserts_around_a_kept_child() {
        let all = ids(5);
        let (a, b, c, x, y) = (all[0], all[1], all[2], all[3], all[4]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![
                (1, ChildEditKind::InsertBefore(x)),
                (1, ChildEditKind::InsertAfter(y)),
            ],
        )
        .unwrap();
        assert_eq!(children, vec![a, x, b, y, c]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![(0, ChildEditKind::Delete), (2, ChildEditKind::InsertBefore(x))],
        )
        .unwrap();
        assert_eq!(children, vec![b, x, c]);
    }

    #[test]
    fn inserts_take_the_place_of_a_deleted_first_or_last_child() {
        let all = ids(5);
        let (a, b, c, x, y) = (all[0], all[1], all[2], all[3], all[4]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![
                (0, ChildEditKind::InsertAfter(y)),
                (0, ChildEditKind::Delete),
                (0, ChildEditKind::InsertBefore(x)),
            ],
        )
        .unwrap();
        assert_eq!(children, vec![x, y, b, c]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![
                (2, ChildEditKind::InsertAfter(y)),
                (2, ChildEditKind::InsertBefore(x)),
                (2, ChildEditKind::Delete),
            ],
        )
        .unwrap();
        assert_eq!(children, vec![a, b, x, y]);
    }

    #[test]
    fn replacement_and_inserts_at_neighbouring_indices() {
        let all = ids(7);
        let (a, b, c, x, y, z, w) = (all[0], all[1], all[2], all[3], all[4], all[5], all[6]);

        let mut children = vec![a, b, c];
        apply_to_children(
            &mut children,
            vec![
                (2, ChildEditKind::InsertBefore(w)),
                (1, ChildEditKind::InsertAfter(y)),
                (1, ChildEditKind::Replace(z)),
                (1, ChildEditKind::InsertBefore(x)),
            ],
        )
        .unwrap();
        assert_eq!(children, vec![a, x, z, y, w, c]);
    }

    #[test]
    fn one_child_is_replaced_or_deleted_once() {
        let all = ids(3);
        let (a, b, z) = (all[0], all[1], all[2]);

        let mut children = vec![a, b];
        let result = apply_to_children(
            &mut children,
            vec![(1, ChildEditKind::Delete), (1, ChildEditKind::Replace(z))],
        );
        assert!(matches!(result, Err(TransformError::InvalidEdit { .. })));
    }

    #[test]
    fn single_child_edges_reject_removal() {
        let all = ids(2);
        let list = SchemaElement::List(crate::element::ListType { wrapped: all[0] });

        let result = apply_child_edits(
            &list,
            vec![ChildEdit {
                location: NodeLocation::new(Edge::WrappedType, 0),
                kind: ChildEditKind::Delete,
            }],
        );
        assert!(matches!(result, Err(TransformError::InvalidEdit { .. })));

        let replaced = apply_child_edits(
            &list,
            vec![ChildEdit {
                location: NodeLocation::new(Edge::WrappedType, 0),
                kind: ChildEditKind::Replace(all[1]),
            }],
        )
        .unwrap();
        assert_eq!(
            replaced,
            SchemaElement::List(crate::element::ListType { wrapped: all[1] })
        );
    }
}
