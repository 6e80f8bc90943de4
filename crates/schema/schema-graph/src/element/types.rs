// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Element payloads. Children are [`ElementId`]s into the owning [`crate::arena::GraphArena`].

use async_graphql_value::ConstValue;

use super::directives::{AppliedDirectives, DirectiveLocation};
use crate::arena::ElementId;

/// The schema definition itself: root operation types, additional types and directive
/// definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaRoot {
    pub description: Option<String>,
    pub query: Option<ElementId>,
    pub mutation: Option<ElementId>,
    pub subscription: Option<ElementId>,
    pub additional_types: Vec<ElementId>,
    pub directives: Vec<ElementId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScalarType {
    pub name: String,
    pub description: Option<String>,
    pub specified_by_url: Option<String>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ElementId>,
    pub interfaces: Vec<ElementId>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ElementId>,
    pub interfaces: Vec<ElementId>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    pub name: String,
    pub description: Option<String>,
    pub types: Vec<ElementId>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub description: Option<String>,
    pub values: Vec<ElementId>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumValueDefinition {
    pub name: String,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputObjectType {
    pub name: String,
    pub description: Option<String>,
    pub fields: Vec<ElementId>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputFieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: ElementId,
    pub default_value: Option<ConstValue>,
    pub deprecation_reason: Option<String>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: ElementId,
    pub arguments: Vec<ElementId>,
    pub deprecation_reason: Option<String>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDefinition {
    pub name: String,
    pub description: Option<String>,
    pub ty: ElementId,
    pub default_value: Option<ConstValue>,
    pub deprecation_reason: Option<String>,
    pub directives: AppliedDirectives,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub arguments: Vec<ElementId>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListType {
    pub wrapped: ElementId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NonNullType {
    pub wrapped: ElementId,
}

/// A named type that has not been resolved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeReference {
    pub name: String,
}

impl TypeReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Artificial single entry point used when transforming an arbitrary element.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalRoot {
    pub root: ElementId,
}
