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

/// Upper bound on the number of nodes a single traversal may visit.
pub const TYPEGRAPH_TRAVERSAL_MAX_STEPS: &str = "TYPEGRAPH_TRAVERSAL_MAX_STEPS";
/// Wall-clock budget (in milliseconds) for a single traversal, transformation or validation pass.
pub const TYPEGRAPH_TRAVERSAL_TIMEOUT_MS: &str = "TYPEGRAPH_TRAVERSAL_TIMEOUT_MS";

/// Comma separated `+pattern`/`-pattern` list selecting which additional types survive pruning.
pub const TYPEGRAPH_SCHEMA_TYPES: &str = "TYPEGRAPH_SCHEMA_TYPES";

/// Whether printed SDL includes built-in scalars and directives.
pub const TYPEGRAPH_PRINT_BUILTINS: &str = "TYPEGRAPH_PRINT_BUILTINS";

pub fn get_traversal_max_steps(env: &dyn Environment) -> Result<Option<usize>, EnvError> {
    env.get_number(TYPEGRAPH_TRAVERSAL_MAX_STEPS)?
        .map(|steps| {
            usize::try_from(steps).map_err(|_| EnvError::InvalidEnum {
                env_key: TYPEGRAPH_TRAVERSAL_MAX_STEPS,
                env_value: steps.to_string(),
                message: "Must fit in the platform's address size".to_string(),
            })
        })
        .transpose()
}

pub fn get_traversal_timeout(env: &dyn Environment) -> Result<Option<Duration>, EnvError> {
    Ok(env
        .get_number(TYPEGRAPH_TRAVERSAL_TIMEOUT_MS)?
        .map(Duration::from_millis))
}

pub fn get_print_builtins(env: &dyn Environment) -> Result<bool, EnvError> {
    env.enabled(TYPEGRAPH_PRINT_BUILTINS, false)
}

#[cfg(test)]
mod tests {
    use schema_env::MapEnvironment;

    use super::*;

    #[test]
    fn unset_values_have_no_limit() {
        let env = MapEnvironment::new();

        assert_eq!(get_traversal_max_steps(&env).unwrap(), None);
        assert_eq!(get_traversal_timeout(&env).unwrap(), None);
        assert!(!get_print_builtins(&env).unwrap());
    }

    #[test]
    fn parses_limits() {
        let env: MapEnvironment = [
            (TYPEGRAPH_TRAVERSAL_MAX_STEPS, "10000"),
            (TYPEGRAPH_TRAVERSAL_TIMEOUT_MS, "250"),
        ]
        .into();

        assert_eq!(get_traversal_max_steps(&env).unwrap(), Some(10000));
        assert_eq!(
            get_traversal_timeout(&env).unwrap(),
            Some(Duration::from_millis(250))
        );
    }

    #[test]
    fn rejects_garbage() {
        let env: MapEnvironment = [(TYPEGRAPH_TRAVERSAL_TIMEOUT_MS, "soon")].into();

        assert!(get_traversal_timeout(&env).is_err());
    }
}
