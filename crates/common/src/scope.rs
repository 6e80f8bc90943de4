// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Name filters used to carve a sub-schema out of a larger one.

use schema_env::Environment;
use wildmatch::WildMatch;

#[derive(Debug, Clone)]
pub enum SchemaScopeFilter {
    All,
    None,
    List(Vec<ScopeMatch>),
}

#[derive(Debug, Clone)]
pub enum ScopeMatch {
    Include(WildMatch),
    Exclude(WildMatch),
}

impl SchemaScopeFilter {
    pub fn new(matches: Vec<ScopeMatch>) -> Self {
        Self::List(matches)
    }

    /// Reads patterns such as `Foo*, -FooInternal` (a `+` prefix is optional for includes).
    pub fn new_from_env(env: &dyn Environment, key: &str, default: impl FnOnce() -> Self) -> Self {
        let patterns = env.get_list(key, vec![]);

        if patterns.is_empty() {
            return default();
        }

        Self::new(
            patterns
                .iter()
                .map(|pattern| match pattern.strip_prefix('-') {
                    Some(pattern) => ScopeMatch::Exclude(WildMatch::new(pattern)),
                    None => ScopeMatch::Include(WildMatch::new(
                        pattern.strip_prefix('+').unwrap_or(pattern),
                    )),
                })
                .collect(),
        )
    }

    pub fn all() -> Self {
        Self::All
    }

    pub fn none() -> Self {
        Self::None
    }

    /// A name matches when it matches some include (or there are no includes) and no exclude.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::List(patterns) => {
                let mut has_include = false;
                let mut included = false;
                let mut excluded = false;

                for pattern in patterns {
                    match pattern {
                        ScopeMatch::Include(p) => {
                            has_include = true;
                            included |= p.matches(name);
                        }
                        ScopeMatch::Exclude(p) => excluded |= p.matches(name),
                    }
                }

                (!has_include || included) && !excluded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use schema_env::MapEnvironment;

    use super::*;

    fn from_patterns(pattern: &str) -> SchemaScopeFilter {
        let env: MapEnvironment = [("TYPES", pattern)].into();
        SchemaScopeFilter::new_from_env(&env, "TYPES", SchemaScopeFilter::all)
    }

    #[test]
    fn all_and_none() {
        assert!(SchemaScopeFilter::all().matches("Query"));
        assert!(!SchemaScopeFilter::none().matches("Query"));
    }

    #[test]
    fn missing_key_uses_default() {
        let scope =
            SchemaScopeFilter::new_from_env(&MapEnvironment::new(), "TYPES", SchemaScopeFilter::none);
        assert!(!scope.matches("Query"));
    }

    #[test]
    fn include() {
        for pattern in ["Concert,Venue", "+Concert,+Venue", "Concert, Venue"] {
            let scope = from_patterns(pattern);
            assert!(scope.matches("Concert"));
            assert!(scope.matches("Venue"));
            assert!(!scope.matches("Artist"));
        }
    }

    #[test]
    fn exclude_only() {
        let scope = from_patterns("-Internal*");
        assert!(!scope.matches("InternalAudit"));
        assert!(scope.matches("Concert"));
    }

    #[test]
    fn exclude_wins_over_include() {
        let scope = from_patterns("Concert*,-ConcertSecret");
        assert!(scope.matches("ConcertInput"));
        assert!(!scope.matches("ConcertSecret"));
        assert!(!scope.matches("Venue"));
    }
}
