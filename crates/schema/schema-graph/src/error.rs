// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use common::cancellation::Cancelled;
use thiserror::Error;

use crate::{
    arena::ElementId,
    element::{Edge, ElementKind},
};

/// Errors building a schema or one of its elements. No partial schema is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Name '{name}' must match /^[_a-zA-Z][_a-zA-Z0-9]*$/")]
    InvalidName { name: String },

    #[error("'{text}' is not a valid type expression")]
    InvalidTypeSyntax { text: String },

    #[error("A non-null type cannot wrap an existing non-null type")]
    DoubleNonNull,

    #[error("{kind} '{type_name}' needs a type resolver in the code registry")]
    MissingTypeResolver {
        type_name: String,
        kind: ElementKind,
    },

    #[error(
        "All types within a GraphQL schema must have unique names. You have redefined the type '{name}' from being a {first} to a {second}"
    )]
    DuplicateTypeName {
        name: String,
        first: ElementKind,
        second: ElementKind,
    },

    #[error("Type '{name}' is referenced but never defined")]
    DanglingTypeReference { name: String },

    #[error("Type reference '{name}' has not been resolved")]
    UnresolvedTypeReference { name: String },

    #[error("{owner} defines {member_kind} '{name}' more than once")]
    DuplicateMember {
        owner: String,
        member_kind: ElementKind,
        name: String,
    },

    #[error("Directive '@{name}' is not repeatable but is applied more than once")]
    NonRepeatableDirective { name: String },

    #[error("Directive '@{name}' is defined more than once")]
    DuplicateDirectiveDefinition { name: String },

    #[error("Unknown directive location '{location}'")]
    UnknownDirectiveLocation { location: String },

    #[error("The {operation} root type must be an object type, but '{type_name}' is a {kind}")]
    InvalidRootType {
        operation: &'static str,
        type_name: String,
        kind: ElementKind,
    },

    #[error("A {kind} has no '{edge}' edge")]
    UnknownEdge { kind: ElementKind, edge: Edge },

    #[error("A {kind} cannot have {count} children on its '{edge}' edge")]
    InvalidChildCount {
        kind: ElementKind,
        edge: Edge,
        count: usize,
    },

    #[error("Invalid schema: {}", .problems.join("; "))]
    InvalidSchema { problems: Vec<String> },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    #[error("Visitor requested an edit of {element} outside of a transformation")]
    EditOutsideTransform { element: String },

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Errors of the transformation engine.
///
/// `DependencyCycle` and `MissingZipper` report a broken engine invariant: they cannot be caused
/// by a well-formed single-pass visitor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Internal error: the rebuild order contains a cycle through {node}")]
    DependencyCycle { node: ElementId },

    #[error("Internal error: no rebuilt version recorded for {node}")]
    MissingZipper { node: ElementId },

    #[error("Invalid edit: {message}")]
    InvalidEdit { message: String },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}
