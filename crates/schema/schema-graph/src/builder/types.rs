// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_value::ConstValue;

use super::{
    DefinitionBuilder, DefinitionMeta, TypeBuilder, TypeExpr, assert_unique_members,
};
use crate::{
    arena::{ElementId, GraphArena},
    element::{
        ArgumentDefinition, DirectiveDefinition, DirectiveLocation, ElementKind, EnumType,
        EnumValueDefinition, FieldDefinition, InputFieldDefinition, InputObjectType,
        InterfaceType, ObjectType, ScalarType, SchemaElement, UnionType,
    },
    error::SchemaError,
};

macro_rules! definition_builder {
    ($($builder:ty),* $(,)?) => {
        $(
            impl DefinitionBuilder for $builder {
                fn meta_mut(&mut self) -> &mut DefinitionMeta {
                    &mut self.meta
                }
            }
        )*
    };
}

definition_builder!(
    ScalarTypeBuilder,
    ObjectTypeBuilder,
    InterfaceTypeBuilder,
    UnionTypeBuilder,
    EnumTypeBuilder,
    EnumValueBuilder,
    InputObjectTypeBuilder,
    InputFieldBuilder,
    FieldBuilder,
    ArgumentBuilder,
    DirectiveBuilder,
);

fn existing_ids(ids: &[ElementId]) -> Vec<TypeExpr> {
    ids.iter().copied().map(TypeExpr::element).collect()
}

fn alloc_all(types: Vec<TypeExpr>, arena: &mut GraphArena) -> Result<Vec<ElementId>, SchemaError> {
    types.iter().map(|ty| ty.alloc(arena)).collect()
}

#[derive(Debug, Clone)]
pub struct ArgumentBuilder {
    meta: DefinitionMeta,
    ty: TypeExpr,
    default_value: Option<ConstValue>,
    deprecation_reason: Option<String>,
}

impl ArgumentBuilder {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            ty,
            default_value: None,
            deprecation_reason: None,
        }
    }

    pub fn from_existing(argument: &ArgumentDefinition) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(argument),
            ty: TypeExpr::element(argument.ty),
            default_value: argument.default_value.clone(),
            deprecation_reason: argument.deprecation_reason.clone(),
        }
    }

    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        Ok(SchemaElement::Argument(ArgumentDefinition {
            name,
            description,
            ty: self.ty.alloc(arena)?,
            default_value: self.default_value,
            deprecation_reason: self.deprecation_reason,
            directives,
        }))
    }

    pub fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        let element = self.build_element(arena)?;
        Ok(arena.alloc(element))
    }
}

fn build_arguments(
    owner: &str,
    arguments: Vec<ArgumentBuilder>,
    arena: &mut GraphArena,
) -> Result<Vec<ElementId>, SchemaError> {
    assert_unique_members(
        owner,
        ElementKind::Argument,
        arguments.iter().map(|a| a.meta.name()),
    )?;
    arguments.into_iter().map(|a| a.build(arena)).collect()
}

#[derive(Debug, Clone)]
pub struct FieldBuilder {
    meta: DefinitionMeta,
    ty: TypeExpr,
    arguments: Vec<ArgumentBuilder>,
    deprecation_reason: Option<String>,
}

impl FieldBuilder {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            ty,
            arguments: vec![],
            deprecation_reason: None,
        }
    }

    /// Seeds a builder from an existing field. Arguments are copied into new elements when built.
    pub fn from_existing(arena: &GraphArena, field: &FieldDefinition) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(field),
            ty: TypeExpr::element(field.ty),
            arguments: field
                .arguments
                .iter()
                .filter_map(|&id| match &arena[id] {
                    SchemaElement::Argument(argument) => {
                        Some(ArgumentBuilder::from_existing(argument))
                    }
                    _ => None,
                })
                .collect(),
            deprecation_reason: field.deprecation_reason.clone(),
        }
    }

    pub fn field_type(mut self, ty: TypeExpr) -> Self {
        self.ty = ty;
        self
    }

    pub fn argument(mut self, argument: ArgumentBuilder) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        let arguments = build_arguments(&name, self.arguments, arena)?;
        Ok(SchemaElement::Field(FieldDefinition {
            ty: self.ty.alloc(arena)?,
            name,
            description,
            arguments,
            deprecation_reason: self.deprecation_reason,
            directives,
        }))
    }

    pub fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        let element = self.build_element(arena)?;
        Ok(arena.alloc(element))
    }
}

fn build_fields(
    owner: &str,
    fields: Vec<FieldBuilder>,
    arena: &mut GraphArena,
) -> Result<Vec<ElementId>, SchemaError> {
    assert_unique_members(owner, ElementKind::Field, fields.iter().map(|f| f.meta.name()))?;
    fields.into_iter().map(|f| f.build(arena)).collect()
}

fn existing_fields(arena: &GraphArena, ids: &[ElementId]) -> Vec<FieldBuilder> {
    ids.iter()
        .filter_map(|&id| match &arena[id] {
            SchemaElement::Field(field) => Some(FieldBuilder::from_existing(arena, field)),
            _ => None,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct ScalarTypeBuilder {
    meta: DefinitionMeta,
    specified_by_url: Option<String>,
}

impl ScalarTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            specified_by_url: None,
        }
    }

    pub fn from_existing(scalar: &ScalarType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(scalar),
            specified_by_url: scalar.specified_by_url.clone(),
        }
    }

    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }
}

impl TypeBuilder for ScalarTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, _arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        Ok(SchemaElement::Scalar(ScalarType {
            name,
            description,
            specified_by_url: self.specified_by_url,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct ObjectTypeBuilder {
    meta: DefinitionMeta,
    fields: Vec<FieldBuilder>,
    interfaces: Vec<TypeExpr>,
}

impl ObjectTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            fields: vec![],
            interfaces: vec![],
        }
    }

    /// Seeds a builder from an existing object type, for building a transformed variant.
    pub fn from_existing(arena: &GraphArena, object: &ObjectType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(object),
            fields: existing_fields(arena, &object.fields),
            interfaces: existing_ids(&object.interfaces),
        }
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(TypeExpr::named(name));
        self
    }

    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.retain(|field| field.meta.name() != name);
        self
    }
}

impl TypeBuilder for ObjectTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        Ok(SchemaElement::Object(ObjectType {
            fields: build_fields(&name, self.fields, arena)?,
            interfaces: alloc_all(self.interfaces, arena)?,
            name,
            description,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceTypeBuilder {
    meta: DefinitionMeta,
    fields: Vec<FieldBuilder>,
    interfaces: Vec<TypeExpr>,
}

impl InterfaceTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            fields: vec![],
            interfaces: vec![],
        }
    }

    pub fn from_existing(arena: &GraphArena, interface: &InterfaceType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(interface),
            fields: existing_fields(arena, &interface.fields),
            interfaces: existing_ids(&interface.interfaces),
        }
    }

    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(TypeExpr::named(name));
        self
    }
}

impl TypeBuilder for InterfaceTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        Ok(SchemaElement::Interface(InterfaceType {
            fields: build_fields(&name, self.fields, arena)?,
            interfaces: alloc_all(self.interfaces, arena)?,
            name,
            description,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct UnionTypeBuilder {
    meta: DefinitionMeta,
    members: Vec<TypeExpr>,
}

impl UnionTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            members: vec![],
        }
    }

    pub fn from_existing(union: &UnionType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(union),
            members: existing_ids(&union.types),
        }
    }

    pub fn member(mut self, name: impl Into<String>) -> Self {
        self.members.push(TypeExpr::named(name));
        self
    }
}

impl TypeBuilder for UnionTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        assert_unique_members(
            &name,
            ElementKind::Object,
            self.members.iter().filter_map(|m| m.base_name()),
        )?;
        Ok(SchemaElement::Union(UnionType {
            types: alloc_all(self.members, arena)?,
            name,
            description,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct EnumValueBuilder {
    meta: DefinitionMeta,
    deprecation_reason: Option<String>,
}

impl EnumValueBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            deprecation_reason: None,
        }
    }

    pub fn from_existing(value: &EnumValueDefinition) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(value),
            deprecation_reason: value.deprecation_reason.clone(),
        }
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        Ok(arena.alloc(SchemaElement::EnumValue(EnumValueDefinition {
            name,
            description,
            deprecation_reason: self.deprecation_reason,
            directives,
        })))
    }
}

#[derive(Debug, Clone)]
pub struct EnumTypeBuilder {
    meta: DefinitionMeta,
    values: Vec<EnumValueBuilder>,
}

impl EnumTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            values: vec![],
        }
    }

    pub fn from_existing(arena: &GraphArena, enum_type: &EnumType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(enum_type),
            values: enum_type
                .values
                .iter()
                .filter_map(|&id| match &arena[id] {
                    SchemaElement::EnumValue(value) => Some(EnumValueBuilder::from_existing(value)),
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn value(self, name: impl Into<String>) -> Self {
        self.enum_value(EnumValueBuilder::new(name))
    }

    pub fn enum_value(mut self, value: EnumValueBuilder) -> Self {
        self.values.push(value);
        self
    }
}

impl TypeBuilder for EnumTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        assert_unique_members(
            &name,
            ElementKind::EnumValue,
            self.values.iter().map(|v| v.meta.name()),
        )?;
        let values = self
            .values
            .into_iter()
            .map(|value| value.build(arena))
            .collect::<Result<_, _>>()?;
        Ok(SchemaElement::Enum(EnumType {
            name,
            description,
            values,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct InputFieldBuilder {
    meta: DefinitionMeta,
    ty: TypeExpr,
    default_value: Option<ConstValue>,
    deprecation_reason: Option<String>,
}

impl InputFieldBuilder {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            ty,
            default_value: None,
            deprecation_reason: None,
        }
    }

    pub fn from_existing(field: &InputFieldDefinition) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(field),
            ty: TypeExpr::element(field.ty),
            default_value: field.default_value.clone(),
            deprecation_reason: field.deprecation_reason.clone(),
        }
    }

    pub fn default_value(mut self, value: ConstValue) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    pub fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        let ty = self.ty.alloc(arena)?;
        Ok(arena.alloc(SchemaElement::InputField(InputFieldDefinition {
            name,
            description,
            ty,
            default_value: self.default_value,
            deprecation_reason: self.deprecation_reason,
            directives,
        })))
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectTypeBuilder {
    meta: DefinitionMeta,
    fields: Vec<InputFieldBuilder>,
}

impl InputObjectTypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            fields: vec![],
        }
    }

    pub fn from_existing(arena: &GraphArena, input: &InputObjectType) -> Self {
        Self {
            meta: DefinitionMeta::from_existing(input),
            fields: input
                .fields
                .iter()
                .filter_map(|&id| match &arena[id] {
                    SchemaElement::InputField(field) => {
                        Some(InputFieldBuilder::from_existing(field))
                    }
                    _ => None,
                })
                .collect(),
        }
    }

    pub fn field(mut self, field: InputFieldBuilder) -> Self {
        self.fields.push(field);
        self
    }
}

impl TypeBuilder for InputObjectTypeBuilder {
    fn type_name(&self) -> &str {
        self.meta.name()
    }

    fn build_element(self, arena: &mut GraphArena) -> Result<SchemaElement, SchemaError> {
        let (name, description, directives) = self.meta.finish()?;
        assert_unique_members(
            &name,
            ElementKind::InputField,
            self.fields.iter().map(|f| f.meta.name()),
        )?;
        let fields = self
            .fields
            .into_iter()
            .map(|field| field.build(arena))
            .collect::<Result<_, _>>()?;
        Ok(SchemaElement::InputObject(InputObjectType {
            name,
            description,
            fields,
            directives,
        }))
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveBuilder {
    meta: DefinitionMeta,
    arguments: Vec<ArgumentBuilder>,
    locations: Vec<DirectiveLocation>,
    repeatable: bool,
}

impl DirectiveBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: DefinitionMeta::new(name),
            arguments: vec![],
            locations: vec![],
            repeatable: false,
        }
    }

    pub fn directive_name(&self) -> &str {
        self.meta.name()
    }

    pub fn argument(mut self, argument: ArgumentBuilder) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn locations(mut self, locations: impl IntoIterator<Item = DirectiveLocation>) -> Self {
        self.locations.extend(locations);
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    pub fn build(self, arena: &mut GraphArena) -> Result<ElementId, SchemaError> {
        let (name, description, _) = self.meta.finish()?;
        let arguments = build_arguments(&name, self.arguments, arena)?;
        Ok(arena.alloc(SchemaElement::Directive(DirectiveDefinition {
            name,
            description,
            arguments,
            locations: self.locations,
            repeatable: self.repeatable,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{AppliedDirective, NamedElement};

    #[test]
    fn object_with_arguments() {
        let mut arena = GraphArena::new();
        let id = ObjectTypeBuilder::new("Query")
            .description("Entry points")
            .field(
                FieldBuilder::new("concerts", TypeExpr::parse("[Concert!]!").unwrap())
                    .argument(ArgumentBuilder::new("first", TypeExpr::named("Int")))
                    .deprecated("Use concertsPage"),
            )
            .build(&mut arena)
            .unwrap();

        let SchemaElement::Object(query) = &arena[id] else {
            panic!("expected an object type");
        };
        assert_eq!(query.description(), Some("Entry points"));

        let SchemaElement::Field(concerts) = &arena[query.fields[0]] else {
            panic!("expected a field");
        };
        assert_eq!(concerts.deprecation_reason(), Some("Use concertsPage"));
        assert_eq!(concerts.arguments.len(), 1);
        assert!(matches!(arena[concerts.ty], SchemaElement::NonNull(_)));
    }

    #[test]
    fn duplicate_members_are_rejected() {
        let mut arena = GraphArena::new();
        let result = ObjectTypeBuilder::new("Concert")
            .field(FieldBuilder::new("id", TypeExpr::named("ID")))
            .field(FieldBuilder::new("id", TypeExpr::named("Int")))
            .build(&mut arena);

        assert!(matches!(
            result,
            Err(SchemaError::DuplicateMember { member_kind: ElementKind::Field, name, .. }) if name == "id"
        ));

        let result = EnumTypeBuilder::new("Status")
            .value("OPEN")
            .value("OPEN")
            .build(&mut arena);
        assert!(matches!(result, Err(SchemaError::DuplicateMember { .. })));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let mut arena = GraphArena::new();
        let result = ObjectTypeBuilder::new("Concert")
            .field(FieldBuilder::new("start-time", TypeExpr::named("String")))
            .build(&mut arena);

        assert!(matches!(result, Err(SchemaError::InvalidName { name }) if name == "start-time"));
    }

    #[test]
    fn non_repeatable_directive_twice() {
        let mut arena = GraphArena::new();
        let result = ScalarTypeBuilder::new("DateTime")
            .directive(AppliedDirective::new("format"))
            .directive(AppliedDirective::new("format"))
            .build(&mut arena);

        assert!(matches!(result, Err(SchemaError::NonRepeatableDirective { .. })));

        let result = ScalarTypeBuilder::new("DateTime")
            .repeatable_directive(AppliedDirective::new("tag"))
            .repeatable_directive(AppliedDirective::new("tag"))
            .build(&mut arena);
        assert!(result.is_ok());
    }

    #[test]
    fn from_existing_copies_fields() {
        let mut arena = GraphArena::new();
        let id = ObjectTypeBuilder::new("Venue")
            .field(FieldBuilder::new("name", TypeExpr::named("String")))
            .field(FieldBuilder::new("capacity", TypeExpr::named("Int")))
            .build(&mut arena)
            .unwrap();
        let SchemaElement::Object(venue) = arena[id].clone() else {
            panic!("expected an object type");
        };

        let copy = ObjectTypeBuilder::from_existing(&arena, &venue)
            .without_field("capacity")
            .field(FieldBuilder::new("city", TypeExpr::named("String")))
            .build(&mut arena)
            .unwrap();

        let names: Vec<_> = arena[copy]
            .children_with_type_references()
            .into_iter()
            .filter_map(|field| arena[field].name().map(|n| n.to_string()))
            .collect();
        assert_eq!(names, vec!["name", "city"]);
    }
}
