// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use schema_env::{EnvError, Environment};

use crate::{
    cancellation::TraversalBudget,
    env_const::{get_print_builtins, get_traversal_max_steps, get_traversal_timeout},
};

/// Engine-wide settings read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_traversal_steps: Option<usize>,
    pub traversal_timeout: Option<Duration>,
    pub print_builtins: bool,
}

impl EngineConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self {
            max_traversal_steps: get_traversal_max_steps(env)?,
            traversal_timeout: get_traversal_timeout(env)?,
            print_builtins: get_print_builtins(env)?,
        })
    }

    /// A fresh budget for one pass. The timeout (if any) starts now.
    pub fn cancellation(&self) -> TraversalBudget {
        let budget = TraversalBudget::unlimited();
        let budget = match self.max_traversal_steps {
            Some(steps) => budget.with_max_steps(steps),
            None => budget,
        };
        match self.traversal_timeout {
            Some(timeout) => budget.with_timeout(timeout),
            None => budget,
        }
    }
}

#[cfg(test)]
mod tests {
    use schema_env::MapEnvironment;

    use crate::{
        cancellation::CancellationCheck,
        env_const::{TYPEGRAPH_PRINT_BUILTINS, TYPEGRAPH_TRAVERSAL_MAX_STEPS},
    };

    use super::*;

    #[test]
    fn budget_from_env() {
        let env: MapEnvironment = [
            (TYPEGRAPH_TRAVERSAL_MAX_STEPS, "1"),
            (TYPEGRAPH_PRINT_BUILTINS, "true"),
        ]
        .into();
        let config = EngineConfig::from_env(&env).unwrap();

        assert!(config.print_builtins);

        let budget = config.cancellation();
        assert!(!budget.is_cancelled());
        assert!(budget.is_cancelled());
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::from_env(&MapEnvironment::new()).unwrap();

        assert_eq!(config, EngineConfig::default());
    }
}
