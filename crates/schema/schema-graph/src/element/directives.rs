// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::BTreeMap, fmt, str::FromStr};

use async_graphql_value::ConstValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// A directive applied to a schema element, such as `@deprecated(reason: "...")`.
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedDirective {
    pub name: String,
    pub arguments: IndexMap<String, ConstValue>,
}

impl AppliedDirective {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: IndexMap::new(),
        }
    }

    pub fn argument(mut self, name: impl Into<String>, value: ConstValue) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

/// Applied directives in declaration order.
///
/// Non-repeatable directives are also indexed by name, and at most one of each may be present.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppliedDirectives {
    directives: Vec<AppliedDirective>,
    non_repeatable: BTreeMap<String, usize>,
}

impl AppliedDirectives {
    pub const fn empty() -> Self {
        Self {
            directives: Vec::new(),
            non_repeatable: BTreeMap::new(),
        }
    }

    pub fn add(
        &mut self,
        directive: AppliedDirective,
        repeatable: bool,
    ) -> Result<(), SchemaError> {
        if !repeatable {
            if self.non_repeatable.contains_key(&directive.name) {
                return Err(SchemaError::NonRepeatableDirective {
                    name: directive.name,
                });
            }
            self.non_repeatable
                .insert(directive.name.clone(), self.directives.len());
        }
        self.directives.push(directive);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AppliedDirective> {
        match self.non_repeatable.get(name) {
            Some(index) => Some(&self.directives[*index]),
            None => self.directives.iter().find(|d| d.name == name),
        }
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AppliedDirective> {
        self.directives.iter().filter(move |d| d.name == name)
    }

    pub fn is_repeatable(&self, name: &str) -> bool {
        !self.non_repeatable.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AppliedDirective> {
        self.directives.iter()
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectiveLocation {
    Query,
    Mutation,
    Subscription,
    Field,
    FragmentDefinition,
    FragmentSpread,
    InlineFragment,
    VariableDefinition,
    Schema,
    Scalar,
    Object,
    FieldDefinition,
    ArgumentDefinition,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputFieldDefinition,
}

impl DirectiveLocation {
    pub const ALL: [DirectiveLocation; 19] = [
        Self::Query,
        Self::Mutation,
        Self::Subscription,
        Self::Field,
        Self::FragmentDefinition,
        Self::FragmentSpread,
        Self::InlineFragment,
        Self::VariableDefinition,
        Self::Schema,
        Self::Scalar,
        Self::Object,
        Self::FieldDefinition,
        Self::ArgumentDefinition,
        Self::Interface,
        Self::Union,
        Self::Enum,
        Self::EnumValue,
        Self::InputObject,
        Self::InputFieldDefinition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
            Self::Subscription => "SUBSCRIPTION",
            Self::Field => "FIELD",
            Self::FragmentDefinition => "FRAGMENT_DEFINITION",
            Self::FragmentSpread => "FRAGMENT_SPREAD",
            Self::InlineFragment => "INLINE_FRAGMENT",
            Self::VariableDefinition => "VARIABLE_DEFINITION",
            Self::Schema => "SCHEMA",
            Self::Scalar => "SCALAR",
            Self::Object => "OBJECT",
            Self::FieldDefinition => "FIELD_DEFINITION",
            Self::ArgumentDefinition => "ARGUMENT_DEFINITION",
            Self::Interface => "INTERFACE",
            Self::Union => "UNION",
            Self::Enum => "ENUM",
            Self::EnumValue => "ENUM_VALUE",
            Self::InputObject => "INPUT_OBJECT",
            Self::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
        }
    }

    /// Locations inside query documents (as opposed to type system definitions).
    pub fn is_executable(&self) -> bool {
        matches!(
            self,
            Self::Query
                | Self::Mutation
                | Self::Subscription
                | Self::Field
                | Self::FragmentDefinition
                | Self::FragmentSpread
                | Self::InlineFragment
                | Self::VariableDefinition
        )
    }
}

impl fmt::Display for DirectiveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectiveLocation {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|location| location.as_str() == s)
            .ok_or_else(|| SchemaError::UnknownDirectiveLocation {
                location: s.to_string(),
            })
    }
}
