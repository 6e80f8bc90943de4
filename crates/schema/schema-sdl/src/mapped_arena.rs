// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A `typed_generational_arena::Arena` with a name index on the side.
//!
//! Definitions are looked up by name while generating a schema, and iterated in declaration order
//! so that generated schemas (and their error messages) do not depend on hashing.

use std::{collections::HashMap, ops};

use typed_generational_arena::{Arena, IgnoreGeneration, Index};

pub type DefinitionSlab<T> = Arena<T, usize, IgnoreGeneration>;
pub type DefinitionIndex<T> = Index<T, usize, IgnoreGeneration>;

#[derive(Debug, Clone)]
pub struct MappedArena<V> {
    values: DefinitionSlab<V>,
    map: HashMap<String, DefinitionIndex<V>>,
}

impl<V> MappedArena<V> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn get_id(&self, key: &str) -> Option<DefinitionIndex<V>> {
        self.map.get(key).copied()
    }

    pub fn get_by_key(&self, key: &str) -> Option<&V> {
        self.get_id(key).map(|id| &self[id])
    }

    pub fn get_by_key_mut(&mut self, key: &str) -> Option<&mut V> {
        self.get_id(key).map(|id| &mut self.values[id])
    }

    /// Adds a value under a new key. If the key is taken, nothing is added and the id of the value
    /// already there is returned as the error.
    pub fn add(&mut self, key: &str, value: V) -> Result<DefinitionIndex<V>, DefinitionIndex<V>> {
        if let Some(existing) = self.get_id(key) {
            return Err(existing);
        }

        let id = self.values.insert(value);
        self.map.insert(key.to_string(), id);
        Ok(id)
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter().map(|(_, value)| value)
    }
}

impl<V> Default for MappedArena<V> {
    fn default() -> Self {
        MappedArena {
            values: DefinitionSlab::new(),
            map: HashMap::default(),
        }
    }
}

impl<V> ops::Index<DefinitionIndex<V>> for MappedArena<V> {
    type Output = V;

    #[inline]
    fn index(&self, id: DefinitionIndex<V>) -> &V {
        &self.values[id]
    }
}

impl<V> ops::IndexMut<DefinitionIndex<V>> for MappedArena<V> {
    #[inline]
    fn index_mut(&mut self, id: DefinitionIndex<V>) -> &mut V {
        &mut self.values[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_first_value_for_a_key() {
        let mut arena = MappedArena::default();

        let concert = arena.add("Concert", 1).unwrap();
        assert_eq!(arena.add("Concert", 2), Err(concert));
        arena.add("Venue", 3).unwrap();

        assert_eq!(arena.get_by_key("Concert"), Some(&1));
        assert_eq!(arena.values().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(arena.len(), 2);
    }
}
