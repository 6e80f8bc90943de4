// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Queries over type positions: wrapper unwrapping, kind classification and type comparison.

use std::fmt;

use async_graphql_parser::types::{BaseType, Type};

use crate::{
    arena::{ElementId, GraphArena},
    element::SchemaElement,
    schema::Schema,
};

/// Strips one list or non-null wrapper.
pub fn unwrap_one(arena: &GraphArena, id: ElementId) -> ElementId {
    match &arena[id] {
        SchemaElement::List(list) => list.wrapped,
        SchemaElement::NonNull(non_null) => non_null.wrapped,
        _ => id,
    }
}

/// Strips every wrapper, reaching the named type (or an unresolved reference).
pub fn unwrap_all(arena: &GraphArena, mut id: ElementId) -> ElementId {
    while arena[id].is_wrapper() {
        id = unwrap_one(arena, id);
    }
    id
}

pub fn is_input_type(arena: &GraphArena, id: ElementId) -> bool {
    matches!(
        arena[unwrap_all(arena, id)],
        SchemaElement::Scalar(_) | SchemaElement::Enum(_) | SchemaElement::InputObject(_)
    )
}

pub fn is_output_type(arena: &GraphArena, id: ElementId) -> bool {
    matches!(
        arena[unwrap_all(arena, id)],
        SchemaElement::Scalar(_)
            | SchemaElement::Object(_)
            | SchemaElement::Interface(_)
            | SchemaElement::Union(_)
            | SchemaElement::Enum(_)
    )
}

pub fn is_leaf_type(element: &SchemaElement) -> bool {
    matches!(element, SchemaElement::Scalar(_) | SchemaElement::Enum(_))
}

pub fn is_composite_type(element: &SchemaElement) -> bool {
    matches!(
        element,
        SchemaElement::Object(_) | SchemaElement::Interface(_) | SchemaElement::Union(_)
    )
}

pub fn is_abstract_type(element: &SchemaElement) -> bool {
    matches!(element, SchemaElement::Interface(_) | SchemaElement::Union(_))
}

/// GraphQL notation of a type position, such as `[Int!]!`.
pub fn type_display(arena: &GraphArena, id: ElementId) -> String {
    TypeShape::from_element(arena, id)
        .map(|shape| shape.to_string())
        .unwrap_or_else(|| arena[id].to_string())
}

/// The wrapping structure of a type position, with the named type held by name.
///
/// Built either from arena ids or from a type written in a query document, so the two can be
/// compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeShape {
    Named(String),
    List(Box<TypeShape>),
    NonNull(Box<TypeShape>),
}

impl TypeShape {
    /// `None` if `id` is not a type position (a field, an argument, the schema root, ...).
    pub fn from_element(arena: &GraphArena, id: ElementId) -> Option<Self> {
        match &arena[id] {
            SchemaElement::List(list) => {
                Some(Self::List(Box::new(Self::from_element(arena, list.wrapped)?)))
            }
            SchemaElement::NonNull(non_null) => Some(Self::NonNull(Box::new(Self::from_element(
                arena,
                non_null.wrapped,
            )?))),
            SchemaElement::TypeReference(reference) => Some(Self::Named(reference.name.clone())),
            element => element.type_name().map(|name| Self::Named(name.to_string())),
        }
    }

    pub fn from_type(ty: &Type) -> Self {
        let base = match &ty.base {
            BaseType::Named(name) => Self::Named(name.to_string()),
            BaseType::List(inner) => Self::List(Box::new(Self::from_type(inner))),
        };
        if ty.nullable {
            base
        } else {
            Self::NonNull(Box::new(base))
        }
    }

    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, Self::NonNull(_))
    }

    /// The shape without its outer non-null wrapper.
    pub fn nullable(&self) -> &TypeShape {
        match self {
            Self::NonNull(inner) => inner,
            _ => self,
        }
    }

    /// The element type of a (possibly non-null) list.
    pub fn list_item(&self) -> Option<&TypeShape> {
        match self.nullable() {
            Self::List(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for TypeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Whether a value of type `maybe_subtype` can be used where `super_type` is expected.
pub fn is_type_sub_type_of(
    schema: &Schema,
    maybe_subtype: &TypeShape,
    super_type: &TypeShape,
) -> bool {
    if maybe_subtype == super_type {
        return true;
    }

    match (maybe_subtype, super_type) {
        (TypeShape::NonNull(sub), TypeShape::NonNull(sup)) => {
            is_type_sub_type_of(schema, sub, sup)
        }
        (_, TypeShape::NonNull(_)) => false,
        (TypeShape::NonNull(sub), _) => is_type_sub_type_of(schema, sub, super_type),
        (TypeShape::List(sub), TypeShape::List(sup)) => is_type_sub_type_of(schema, sub, sup),
        (_, TypeShape::List(_)) | (TypeShape::List(_), _) => false,
        (TypeShape::Named(sub), TypeShape::Named(sup)) => {
            schema.type_by_name(sup).is_some_and(is_abstract_type)
                && schema.is_possible_type(sup, sub)
        }
    }
}

/// Whether some object type could be both `a` and `b`.
pub fn do_types_overlap(schema: &Schema, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }

    let a_abstract = schema.type_by_name(a).is_some_and(is_abstract_type);
    let b_abstract = schema.type_by_name(b).is_some_and(is_abstract_type);

    match (a_abstract, b_abstract) {
        (true, true) => {
            let b_possible = schema.possible_types(b);
            schema
                .possible_types(a)
                .iter()
                .any(|id| b_possible.contains(id))
        }
        (true, false) => schema.is_possible_type(a, b),
        (false, true) => schema.is_possible_type(b, a),
        (false, false) => false,
    }
}
