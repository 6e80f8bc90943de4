// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Builders for schema elements.
//!
//! Each element kind has its own builder. They share name, description and applied directive
//! handling through [`DefinitionMeta`] and the [`DefinitionBuilder`] trait. Type positions are
//! written as [`TypeExpr`]s: a named type becomes a [`TypeReference`] placeholder, resolved once
//! the whole schema is assembled.

mod schema_builder;
mod types;

use std::{collections::HashSet, sync::LazyLock};

use async_graphql_parser::types::{BaseType, Type};
use regex::Regex;

pub use schema_builder::SchemaBuilder;
pub use types::{
    ArgumentBuilder, DirectiveBuilder, EnumTypeBuilder, EnumValueBuilder, FieldBuilder,
    InputFieldBuilder, InputObjectTypeBuilder, InterfaceTypeBuilder, ObjectTypeBuilder,
    ScalarTypeBuilder, UnionTypeBuilder,
};

use crate::{
    arena::{ElementId, GraphArena},
    element::{
        AppliedDirective, AppliedDirectives, ElementKind, ListType, NamedElement, NonNullType,
        SchemaElement, TypeReference,
    },
    error::SchemaError,
};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[_A-Za-z][_0-9A-Za-z]*$").expect("Invalid name pattern"));

pub fn assert_valid_name(name: &str) -> Result<(), SchemaError> {
    if NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            name: name.to_string(),
        })
    }
}

/// A type in a field, argument or input field position.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A named type, resolved by name after the schema is assembled.
    Named(String),
    /// An element already in the arena.
    Element(ElementId),
    List(Box<TypeExpr>),
    NonNull(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn element(id: ElementId) -> Self {
        Self::Element(id)
    }

    pub fn list(self) -> Self {
        Self::List(Box::new(self))
    }

    pub fn non_null(self) -> Self {
        Self::NonNull(Box::new(self))
    }

    /// Parses GraphQL type syntax such as `[Int!]!`.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        Type::new(text)
            .map(|ty| Self::from(&ty))
            .ok_or_else(|| SchemaError::InvalidTypeSyntax {
                text: text.to_string(),
            })
    }

    /// The innermost type name, if this expression is written by name.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Element(_) => None,
            Self::List(inner) | Self::NonNull(inner) => inner.base_name(),
        }
    }

    pub fn alloc(&self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        match self {
            Self::Named(name) => {
                assert_valid_name(name)?;
                Ok(arena.alloc(SchemaElement::TypeReference(TypeReference::new(name))))
            }
            Self::Element(id) => Ok(*id),
            Self::List(inner) => {
                let wrapped = inner.alloc(arena)?;
                Ok(arena.alloc(SchemaElement::List(ListType { wrapped })))
            }
            Self::NonNull(inner) => {
                let wrapped = inner.alloc(arena)?;
                if matches!(arena[wrapped], SchemaElement::NonNull(_)) {
                    return Err(SchemaError::DoubleNonNull);
                }
                Ok(arena.alloc(SchemaElement::NonNull(NonNullType { wrapped })))
            }
        }
    }
}

impl From<&Type> for TypeExpr {
    fn from(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => Self::Named(name.to_string()),
            BaseType::List(inner) => Self::List(Box::new(Self::from(inner.as_ref()))),
        };
        if ty.nullable {
            base
        } else {
            base.non_null()
        }
    }
}

/// Name, description and applied directives of an element under construction.
#[derive(Debug, Clone, Default)]
pub struct DefinitionMeta {
    name: String,
    description: Option<String>,
    directives: Vec<(AppliedDirective, bool)>,
}

impl DefinitionMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub(crate) fn from_existing(element: &dyn NamedElement) -> Self {
        let directives = element.directives();
        Self {
            name: element.name().to_string(),
            description: element.description().map(|d| d.to_string()),
            directives: directives
                .iter()
                .map(|d| (d.clone(), directives.is_repeatable(&d.name)))
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn finish(self) -> Result<(String, Option<String>, AppliedDirectives), SchemaError> {
        assert_valid_name(&self.name)?;

        let mut directives = AppliedDirectives::empty();
        for (directive, repeatable) in self.directives {
            directives.add(directive, repeatable)?;
        }

        Ok((self.name, self.description, directives))
    }
}

pub trait DefinitionBuilder: Sized {
    fn meta_mut(&mut self) -> &mut DefinitionMeta;

    fn name(mut self, name: impl Into<String>) -> Self {
        self.meta_mut().name = name.into();
        self
    }

    fn description(mut self, description: impl Into<String>) -> Self {
        self.meta_mut().description = Some(description.into());
        self
    }

    /// Applies a directive that may appear at most once on this element.
    fn directive(mut self, directive: AppliedDirective) -> Self {
        self.meta_mut().directives.push((directive, false));
        self
    }

    fn repeatable_directive(mut self, directive: AppliedDirective) -> Self {
        self.meta_mut().directives.push((directive, true));
        self
    }
}

/// Builders of named types, which can be added to a [`SchemaBuilder`].
pub trait TypeBuilder {
    fn type_name(&self) -> &str;

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError>;

    fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError>
    where
        Self: Sized,
    {
        let element = self.build_element(arena)?;
        Ok(arena.alloc(element))
    }
}

fn assert_unique_members<'a>(
    owner: &str,
    member_kind: ElementKind,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateMember {
                owner: owner.to_string(),
                member_kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert!(assert_valid_name("_Concert2").is_ok());
        assert!(assert_valid_name("concert_venue").is_ok());
        assert!(matches!(
            assert_valid_name("2Concert"),
            Err(SchemaError::InvalidName { .. })
        ));
        assert!(assert_valid_name("Concert-Venue").is_err());
        assert!(assert_valid_name("").is_err());
    }

    #[test]
    fn parses_wrapped_types() {
        assert_eq!(
            TypeExpr::parse("[Int!]!").unwrap(),
            TypeExpr::named("Int").non_null().list().non_null()
        );
        assert_eq!(TypeExpr::parse("Venue").unwrap(), TypeExpr::named("Venue"));
        assert!(TypeExpr::parse("[Int").is_err());
    }

    #[test]
    fn non_null_cannot_wrap_non_null() {
        let mut arena = GraphArena::new();

        assert_eq!(
            TypeExpr::named("Int").non_null().non_null().alloc(&mut arena),
            Err(SchemaError::DoubleNonNull)
        );

        let non_null = TypeExpr::named("Int").non_null().alloc(&mut arena).unwrap();
        assert_eq!(
            TypeExpr::element(non_null).non_null().alloc(&mut arena),
            Err(SchemaError::DoubleNonNull)
        );
        assert!(TypeExpr::element(non_null).list().non_null().alloc(&mut arena).is_ok());
    }
}
