// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Configuration values held in memory, for tests and for embedders that assemble settings
//! themselves.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::Environment;

/// Values set in memory, looked up before those of an optional base environment.
#[derive(Clone, Default)]
pub struct MapEnvironment {
    overrides: BTreeMap<String, String>,
    base: Option<Arc<dyn Environment>>,
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from `base` (typically [`crate::SystemEnvironment`]) and overrides some of its keys.
    pub fn over(base: Arc<dyn Environment>) -> Self {
        Self {
            overrides: BTreeMap::new(),
            base: Some(base),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        match self.overrides.get(key) {
            Some(value) => Some(value.clone()),
            None => self.base.as_ref()?.get(key),
        }
    }
}

impl fmt::Debug for MapEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEnvironment")
            .field("overrides", &self.overrides)
            .field("has_base", &self.base.is_some())
            .finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnvironment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(pairs: I) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |env, (key, value)| env.with(key, value))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(pairs: [(&str, &str); N]) -> Self {
        pairs.into_iter().collect()
    }
}
