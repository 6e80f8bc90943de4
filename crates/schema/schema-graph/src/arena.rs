// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Storage for the type graph.
//!
//! The type graph is cyclic (a field may refer to its own containing type), so elements refer to
//! each other by [`ElementId`] instead of owning pointers. Node identity is id identity: two
//! structurally equal elements in different slots are different nodes.
//!
//! Slots hold `Arc`s, so cloning an arena is cheap and the clone shares every element with the
//! original. Builders, the reference resolution pass and the transformer work on such a private
//! clone and may rewrite its slots; a built [`crate::schema::Schema`] never does.

use std::{fmt, ops, sync::Arc};

use typed_generational_arena::{Arena, IgnoreGeneration, Index};

use crate::element::SchemaElement;

pub type ElementSlab = Arena<Arc<SchemaElement>, usize, IgnoreGeneration>;
pub type ElementSlabIndex = Index<Arc<SchemaElement>, usize, IgnoreGeneration>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(ElementSlabIndex);

impl ElementId {
    pub fn index(self) -> usize {
        self.0.to_idx()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

#[derive(Debug, Clone, Default)]
pub struct GraphArena {
    elements: ElementSlab,
}

impl GraphArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, element: SchemaElement) -> ElementId {
        ElementId(self.elements.insert(Arc::new(element)))
    }

    pub fn get(&self, id: ElementId) -> Option<&SchemaElement> {
        self.elements.get(id.0).map(|element| element.as_ref())
    }

    pub fn get_arc(&self, id: ElementId) -> &Arc<SchemaElement> {
        &self.elements[id.0]
    }

    /// Points `id` at a new element. Other arenas sharing the old element are unaffected.
    pub(crate) fn replace(&mut self, id: ElementId, element: SchemaElement) {
        self.elements[id.0] = Arc::new(element);
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Ids in allocation order. Slots are never freed, so this is every id handed out.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|(index, _)| ElementId(index))
    }
}

impl ops::Index<ElementId> for GraphArena {
    type Output = SchemaElement;

    #[inline]
    fn index(&self, id: ElementId) -> &SchemaElement {
        &self.elements[id.0]
    }
}
