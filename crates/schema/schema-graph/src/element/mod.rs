// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The type graph model.
//!
//! Every node of the type graph is a [`SchemaElement`]. The element kinds form a closed set, so
//! walkers and visitors match on it exhaustively. Children are reached through named edges
//! ([`Edge`]), which together with the child's index form a node's location in its parent.

mod directives;
mod types;

use std::fmt;

pub use directives::{AppliedDirective, AppliedDirectives, DirectiveLocation};
pub use types::*;

use crate::{
    arena::{ElementId, GraphArena},
    error::SchemaError,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaElement {
    Root(TraversalRoot),
    Schema(SchemaRoot),
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    EnumValue(EnumValueDefinition),
    InputObject(InputObjectType),
    InputField(InputFieldDefinition),
    Field(FieldDefinition),
    Argument(ArgumentDefinition),
    Directive(DirectiveDefinition),
    List(ListType),
    NonNull(NonNullType),
    TypeReference(TypeReference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Root,
    Schema,
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    EnumValue,
    InputObject,
    InputField,
    Field,
    Argument,
    Directive,
    List,
    NonNull,
    TypeReference,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Root => "traversal root",
            Self::Schema => "schema",
            Self::Scalar => "scalar type",
            Self::Object => "object type",
            Self::Interface => "interface type",
            Self::Union => "union type",
            Self::Enum => "enum type",
            Self::EnumValue => "enum value",
            Self::InputObject => "input object type",
            Self::InputField => "input field",
            Self::Field => "field",
            Self::Argument => "argument",
            Self::Directive => "directive",
            Self::List => "list type",
            Self::NonNull => "non-null type",
            Self::TypeReference => "type reference",
        })
    }
}

impl fmt::Display for SchemaElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} '{}'", self.kind(), name),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// A named child slot of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Edge {
    Root,
    Query,
    Mutation,
    Subscription,
    AdditionalTypes,
    Directives,
    Fields,
    Interfaces,
    PossibleTypes,
    EnumValues,
    InputFields,
    Arguments,
    Type,
    WrappedType,
}

impl Edge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::AdditionalTypes => "additionalTypes",
            Self::Directives => "directives",
            Self::Fields => "fields",
            Self::Interfaces => "interfaces",
            Self::PossibleTypes => "types",
            Self::EnumValues => "enumValues",
            Self::InputFields => "inputFields",
            Self::Arguments => "arguments",
            Self::Type => "type",
            Self::WrappedType => "wrappedType",
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared read access to anything that has a name in the schema.
pub trait NamedElement {
    fn name(&self) -> &str;
    fn description(&self) -> Option<&str>;
    fn directives(&self) -> &AppliedDirectives;

    fn deprecation_reason(&self) -> Option<&str> {
        None
    }
}

static NO_DIRECTIVES: AppliedDirectives = AppliedDirectives::empty();

macro_rules! named_element {
    ($ty:ty) => {
        impl NamedElement for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }

            fn directives(&self) -> &AppliedDirectives {
                &self.directives
            }
        }
    };
    ($ty:ty, deprecatable) => {
        impl NamedElement for $ty {
            fn name(&self) -> &str {
                &self.name
            }

            fn description(&self) -> Option<&str> {
                self.description.as_deref()
            }

            fn directives(&self) -> &AppliedDirectives {
                &self.directives
            }

            fn deprecation_reason(&self) -> Option<&str> {
                self.deprecation_reason.as_deref()
            }
        }
    };
}

named_element!(ScalarType);
named_element!(ObjectType);
named_element!(InterfaceType);
named_element!(UnionType);
named_element!(EnumType);
named_element!(InputObjectType);
named_element!(EnumValueDefinition, deprecatable);
named_element!(InputFieldDefinition, deprecatable);
named_element!(FieldDefinition, deprecatable);
named_element!(ArgumentDefinition, deprecatable);

impl NamedElement for DirectiveDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn directives(&self) -> &AppliedDirectives {
        &NO_DIRECTIVES
    }
}

impl SchemaElement {
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Root(_) => ElementKind::Root,
            Self::Schema(_) => ElementKind::Schema,
            Self::Scalar(_) => ElementKind::Scalar,
            Self::Object(_) => ElementKind::Object,
            Self::Interface(_) => ElementKind::Interface,
            Self::Union(_) => ElementKind::Union,
            Self::Enum(_) => ElementKind::Enum,
            Self::EnumValue(_) => ElementKind::EnumValue,
            Self::InputObject(_) => ElementKind::InputObject,
            Self::InputField(_) => ElementKind::InputField,
            Self::Field(_) => ElementKind::Field,
            Self::Argument(_) => ElementKind::Argument,
            Self::Directive(_) => ElementKind::Directive,
            Self::List(_) => ElementKind::List,
            Self::NonNull(_) => ElementKind::NonNull,
            Self::TypeReference(_) => ElementKind::TypeReference,
        }
    }

    pub fn as_named(&self) -> Option<&dyn NamedElement> {
        match self {
            Self::Scalar(e) => Some(e),
            Self::Object(e) => Some(e),
            Self::Interface(e) => Some(e),
            Self::Union(e) => Some(e),
            Self::Enum(e) => Some(e),
            Self::EnumValue(e) => Some(e),
            Self::InputObject(e) => Some(e),
            Self::InputField(e) => Some(e),
            Self::Field(e) => Some(e),
            Self::Argument(e) => Some(e),
            Self::Directive(e) => Some(e),
            Self::Root(_)
            | Self::Schema(_)
            | Self::List(_)
            | Self::NonNull(_)
            | Self::TypeReference(_) => None,
        }
    }

    /// The element's name, including the name carried by an unresolved type reference.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::TypeReference(reference) => Some(&reference.name),
            _ => self.as_named().map(|named| named.name()),
        }
    }

    /// Scalars, objects, interfaces, unions, enums and input objects.
    pub fn is_named_type(&self) -> bool {
        matches!(
            self,
            Self::Scalar(_)
                | Self::Object(_)
                | Self::Interface(_)
                | Self::Union(_)
                | Self::Enum(_)
                | Self::InputObject(_)
        )
    }

    pub fn type_name(&self) -> Option<&str> {
        if self.is_named_type() {
            self.name()
        } else {
            None
        }
    }

    pub fn is_wrapper(&self) -> bool {
        matches!(self, Self::List(_) | Self::NonNull(_))
    }

    /// Child ids grouped by edge, in a fixed per-kind order. Unresolved type references are
    /// included.
    pub fn edges(&self) -> Vec<(Edge, &[ElementId])> {
        use std::slice::from_ref;

        match self {
            Self::Root(root) => vec![(Edge::Root, from_ref(&root.root))],
            Self::Schema(schema) => vec![
                (Edge::Query, schema.query.as_slice()),
                (Edge::Mutation, schema.mutation.as_slice()),
                (Edge::Subscription, schema.subscription.as_slice()),
                (Edge::AdditionalTypes, schema.additional_types.as_slice()),
                (Edge::Directives, schema.directives.as_slice()),
            ],
            Self::Object(object) => vec![
                (Edge::Fields, object.fields.as_slice()),
                (Edge::Interfaces, object.interfaces.as_slice()),
            ],
            Self::Interface(interface) => vec![
                (Edge::Fields, interface.fields.as_slice()),
                (Edge::Interfaces, interface.interfaces.as_slice()),
            ],
            Self::Union(union) => vec![(Edge::PossibleTypes, union.types.as_slice())],
            Self::Enum(enum_type) => vec![(Edge::EnumValues, enum_type.values.as_slice())],
            Self::InputObject(input) => vec![(Edge::InputFields, input.fields.as_slice())],
            Self::InputField(field) => vec![(Edge::Type, from_ref(&field.ty))],
            Self::Field(field) => vec![
                (Edge::Type, from_ref(&field.ty)),
                (Edge::Arguments, field.arguments.as_slice()),
            ],
            Self::Argument(argument) => vec![(Edge::Type, from_ref(&argument.ty))],
            Self::Directive(directive) => vec![(Edge::Arguments, directive.arguments.as_slice())],
            Self::List(list) => vec![(Edge::WrappedType, from_ref(&list.wrapped))],
            Self::NonNull(non_null) => vec![(Edge::WrappedType, from_ref(&non_null.wrapped))],
            Self::Scalar(_) | Self::EnumValue(_) | Self::TypeReference(_) => vec![],
        }
    }

    pub fn edge_children(&self, edge: Edge) -> Option<&[ElementId]> {
        self.edges()
            .into_iter()
            .find_map(|(e, children)| (e == edge).then_some(children))
    }

    pub fn children_with_type_references(&self) -> Vec<ElementId> {
        self.edges()
            .into_iter()
            .flat_map(|(_, children)| children.iter().copied())
            .collect()
    }

    /// Children of a fully resolved element. Meeting a type reference is an error.
    pub fn children(&self, arena: &GraphArena) -> Result<Vec<ElementId>, SchemaError> {
        self.children_with_type_references()
            .into_iter()
            .map(|child| match &arena[child] {
                Self::TypeReference(reference) => Err(SchemaError::UnresolvedTypeReference {
                    name: reference.name.clone(),
                }),
                _ => Ok(child),
            })
            .collect()
    }

    /// A copy of this element with the children on `edge` replaced.
    pub fn with_edge_children(
        &self,
        edge: Edge,
        children: Vec<ElementId>,
    ) -> Result<SchemaElement, SchemaError> {
        let kind = self.kind();
        let count = children.len();

        let exactly_one = |children: Vec<ElementId>| match children.as_slice() {
            [child] => Ok(*child),
            _ => Err(SchemaError::InvalidChildCount { kind, edge, count }),
        };
        let at_most_one = |children: Vec<ElementId>| match children.as_slice() {
            [] => Ok(None),
            [child] => Ok(Some(*child)),
            _ => Err(SchemaError::InvalidChildCount { kind, edge, count }),
        };

        let mut element = self.clone();
        match (&mut element, edge) {
            (Self::Root(root), Edge::Root) => root.root = exactly_one(children)?,
            (Self::Schema(schema), Edge::Query) => schema.query = at_most_one(children)?,
            (Self::Schema(schema), Edge::Mutation) => schema.mutation = at_most_one(children)?,
            (Self::Schema(schema), Edge::Subscription) => {
                schema.subscription = at_most_one(children)?
            }
            (Self::Schema(schema), Edge::AdditionalTypes) => schema.additional_types = children,
            (Self::Schema(schema), Edge::Directives) => schema.directives = children,
            (Self::Object(object), Edge::Fields) => object.fields = children,
            (Self::Object(object), Edge::Interfaces) => object.interfaces = children,
            (Self::Interface(interface), Edge::Fields) => interface.fields = children,
            (Self::Interface(interface), Edge::Interfaces) => interface.interfaces = children,
            (Self::Union(union), Edge::PossibleTypes) => union.types = children,
            (Self::Enum(enum_type), Edge::EnumValues) => enum_type.values = children,
            (Self::InputObject(input), Edge::InputFields) => input.fields = children,
            (Self::InputField(field), Edge::Type) => field.ty = exactly_one(children)?,
            (Self::Field(field), Edge::Type) => field.ty = exactly_one(children)?,
            (Self::Field(field), Edge::Arguments) => field.arguments = children,
            (Self::Argument(argument), Edge::Type) => argument.ty = exactly_one(children)?,
            (Self::Directive(directive), Edge::Arguments) => directive.arguments = children,
            (Self::List(list), Edge::WrappedType) => list.wrapped = exactly_one(children)?,
            (Self::NonNull(non_null), Edge::WrappedType) => {
                non_null.wrapped = exactly_one(children)?
            }
            _ => return Err(SchemaError::UnknownEdge { kind, edge }),
        }

        Ok(element)
    }

    /// A copy of this element with the child at `edge[index]` replaced by `child`.
    pub fn with_child(
        &self,
        edge: Edge,
        index: usize,
        child: ElementId,
    ) -> Result<SchemaElement, SchemaError> {
        let mut children = self
            .edge_children(edge)
            .ok_or(SchemaError::UnknownEdge {
                kind: self.kind(),
                edge,
            })?
            .to_vec();

        match children.get_mut(index) {
            Some(slot) => *slot = child,
            None => {
                return Err(SchemaError::InvalidChildCount {
                    kind: self.kind(),
                    edge,
                    count: index + 1,
                });
            }
        }

        self.with_edge_children(edge, children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(arena: &mut GraphArena, name: &str, type_name: &str) -> ElementId {
        let ty = arena.alloc(SchemaElement::TypeReference(TypeReference::new(type_name)));
        arena.alloc(SchemaElement::Field(FieldDefinition {
            name: name.to_string(),
            description: None,
            ty,
            arguments: vec![],
            deprecation_reason: None,
            directives: AppliedDirectives::empty(),
        }))
    }

    fn object(fields: Vec<ElementId>) -> SchemaElement {
        SchemaElement::Object(ObjectType {
            name: "Concert".to_string(),
            description: None,
            fields,
            interfaces: vec![],
            directives: AppliedDirectives::empty(),
        })
    }

    #[test]
    fn children_require_resolution() {
        let mut arena = GraphArena::new();
        let title = field(&mut arena, "title", "String");
        let title_type = arena[title].children_with_type_references()[0];

        assert_eq!(arena[title].children_with_type_references(), vec![title_type]);
        assert!(matches!(
            arena[title].children(&arena),
            Err(SchemaError::UnresolvedTypeReference { name }) if name == "String"
        ));

        let concert = object(vec![title]);
        assert_eq!(concert.children(&arena).unwrap(), vec![title]);
    }

    #[test]
    fn rebuild_is_pure() {
        let mut arena = GraphArena::new();
        let title = field(&mut arena, "title", "String");
        let venue = field(&mut arena, "venue", "Venue");
        let concert = object(vec![title]);

        let rebuilt = concert.with_child(Edge::Fields, 0, venue).unwrap();

        assert_eq!(rebuilt.edge_children(Edge::Fields), Some(&[venue][..]));
        assert_eq!(concert.edge_children(Edge::Fields), Some(&[title][..]));
    }

    #[test]
    fn rebuild_rejects_bad_edges() {
        let mut arena = GraphArena::new();
        let title = field(&mut arena, "title", "String");
        let venue = field(&mut arena, "venue", "Venue");

        assert!(matches!(
            arena[title].with_edge_children(Edge::Type, vec![]),
            Err(SchemaError::InvalidChildCount { count: 0, .. })
        ));
        assert!(matches!(
            object(vec![]).with_edge_children(Edge::Type, vec![venue]),
            Err(SchemaError::UnknownEdge { .. })
        ));
        assert!(object(vec![]).with_child(Edge::Fields, 0, venue).is_err());
    }

    #[test]
    fn names() {
        let mut arena = GraphArena::new();
        let title = field(&mut arena, "title", "String");

        assert_eq!(arena[title].name(), Some("title"));
        assert_eq!(arena[title].type_name(), None);
        assert_eq!(object(vec![]).type_name(), Some("Concert"));
        assert!(object(vec![]).is_named_type());
        assert_eq!(ElementKind::Object.to_string(), "object type");
    }
}
