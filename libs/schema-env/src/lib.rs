// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Read-only access to configuration values keyed by name.
//!
//! The engine never reads `std::env` directly. Callers hand it an [`Environment`], which is the
//! process environment in production ([`SystemEnvironment`]) and a [`MapEnvironment`] in tests.

use std::str::FromStr;

mod map;

pub use map::MapEnvironment;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(EnvError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value.to_string())
    }

    /// Comma separated values, trimmed. Empty entries are dropped.
    fn get_list(&self, key: &str, default_value: Vec<String>) -> Vec<String> {
        self.get(key)
            .map(|value| {
                value
                    .split(',')
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or(default_value)
    }

    /// A non-negative number, or `None` if the key is unset.
    fn get_number(&self, key: &str) -> Result<Option<u64>, EnvError> {
        self.get(key)
            .map(|value| {
                u64::from_str(value.trim()).map_err(|e| EnvError::InvalidNumber {
                    key: key.to_string(),
                    value: value.clone(),
                    message: e.to_string(),
                })
            })
            .transpose()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid value for {key}: {value}. Expected a non-negative number ({message})")]
    InvalidNumber {
        key: String,
        value: String,
        message: String,
    },

    #[error("Invalid env value {env_value} for {env_key}: {message}")]
    InvalidEnum {
        env_key: &'static str,
        env_value: String,
        message: String,
    },
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans() {
        let env: MapEnvironment = [("ON", "Yes"), ("OFF", "disabled"), ("BAD", "maybe")].into();

        assert!(env.enabled("ON", false).unwrap());
        assert!(!env.enabled("OFF", true).unwrap());
        assert!(env.enabled("MISSING", true).unwrap());
        assert!(matches!(
            env.enabled("BAD", true),
            Err(EnvError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn lists_skip_empty_entries() {
        let env: MapEnvironment = [("LIST", "a, b,,c ,")].into();

        assert_eq!(env.get_list("LIST", vec![]), vec!["a", "b", "c"]);
        assert_eq!(
            env.get_list("MISSING", vec!["x".to_string()]),
            vec!["x".to_string()]
        );
    }

    #[test]
    fn numbers() {
        let env: MapEnvironment = [("STEPS", " 500 "), ("NEGATIVE", "-1")].into();

        assert_eq!(env.get_number("STEPS").unwrap(), Some(500));
        assert_eq!(env.get_number("MISSING").unwrap(), None);
        assert!(matches!(
            env.get_number("NEGATIVE"),
            Err(EnvError::InvalidNumber { .. })
        ));
    }
}
