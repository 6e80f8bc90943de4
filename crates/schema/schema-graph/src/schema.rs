// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::{collections::BTreeMap, sync::Arc};

use async_graphql_value::ConstValue;
use common::cancellation::{CancellationCheck, Cancelled};
use tracing::{debug, instrument};

use crate::{
    arena::{ElementId, GraphArena},
    builtins,
    code_registry::CodeRegistry,
    element::{
        ArgumentDefinition, DirectiveDefinition, ElementKind, FieldDefinition, NamedElement,
        ObjectType, SchemaElement, SchemaRoot,
    },
    error::SchemaError,
    resolution, schema_validation,
};

/// An immutable, fully resolved type graph with a name index over its named types.
///
/// Cloning is cheap: the arena and the code registry are shared.
#[derive(Debug, Clone)]
pub struct Schema {
    arena: Arc<GraphArena>,
    root: ElementId,
    types: BTreeMap<String, ElementId>,
    directives: BTreeMap<String, ElementId>,
    code_registry: Arc<CodeRegistry>,
}

impl Schema {
    /// Resolves references, indexes and validates a schema root held in `arena`. Built-in
    /// scalars referenced by name but not defined are added.
    #[instrument(name = "Schema::assemble", skip_all)]
    pub(crate) fn assemble(
        mut arena: GraphArena,
        root: ElementId,
        code_registry: Arc<CodeRegistry>,
    ) -> Result<Schema, SchemaError> {
        let mut types = resolution::build_type_index(&arena, root)?;
        let root = builtins::add_referenced_scalars(&mut arena, root, &mut types)?;
        let arena = resolution::resolve_references(&arena, root, &types)?;

        let SchemaElement::Schema(schema_root) = &arena[root] else {
            return Err(SchemaError::InvalidSchema {
                problems: vec![format!("{} is not a schema root", arena[root])],
            });
        };

        let mut directives = BTreeMap::new();
        for &id in &schema_root.directives {
            if let SchemaElement::Directive(directive) = &arena[id] {
                if directives.insert(directive.name.clone(), id).is_some() {
                    return Err(SchemaError::DuplicateDirectiveDefinition {
                        name: directive.name.clone(),
                    });
                }
            }
        }

        for (operation, id) in [
            ("query", schema_root.query),
            ("mutation", schema_root.mutation),
            ("subscription", schema_root.subscription),
        ] {
            let Some(id) = id else { continue };
            let element = &arena[id];
            if !matches!(element, SchemaElement::Object(_)) {
                return Err(SchemaError::InvalidRootType {
                    operation,
                    type_name: element.name().unwrap_or_default().to_string(),
                    kind: element.kind(),
                });
            }
        }

        for (name, &id) in &types {
            let kind = arena[id].kind();
            if matches!(kind, ElementKind::Interface | ElementKind::Union)
                && !code_registry.has_type_resolver(name)
            {
                return Err(SchemaError::MissingTypeResolver {
                    type_name: name.clone(),
                    kind,
                });
            }
        }

        schema_validation::validate(&arena, &types)?;

        debug!(
            types = types.len(),
            directives = directives.len(),
            elements = arena.len(),
            "schema assembled"
        );

        Ok(Schema {
            arena: Arc::new(arena),
            root,
            types,
            directives,
            code_registry,
        })
    }

    pub fn arena(&self) -> &GraphArena {
        &self.arena
    }

    /// The id of the [`SchemaRoot`] element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn root_element(&self) -> &SchemaRoot {
        match &self.arena[self.root] {
            SchemaElement::Schema(root) => root,
            _ => unreachable!("Schema::assemble only accepts schema roots"),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.root_element().description.as_deref()
    }

    pub fn element(&self, id: ElementId) -> &SchemaElement {
        &self.arena[id]
    }

    /// The shared element in slot `id`. Two schemas sharing an element return pointer-equal
    /// `Arc`s.
    pub fn element_arc(&self, id: ElementId) -> &Arc<SchemaElement> {
        self.arena.get_arc(id)
    }

    pub fn code_registry(&self) -> &CodeRegistry {
        &self.code_registry
    }

    pub(crate) fn code_registry_arc(&self) -> &Arc<CodeRegistry> {
        &self.code_registry
    }

    pub fn type_id(&self, name: &str) -> Option<ElementId> {
        self.types.get(name).copied()
    }

    pub fn type_by_name(&self, name: &str) -> Option<&SchemaElement> {
        self.type_id(name).map(|id| &self.arena[id])
    }

    pub fn contains_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    fn root_object(&self, id: Option<ElementId>) -> Option<&ObjectType> {
        match id.map(|id| &self.arena[id]) {
            Some(SchemaElement::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn query_type(&self) -> Option<&ObjectType> {
        self.root_object(self.root_element().query)
    }

    pub fn mutation_type(&self) -> Option<&ObjectType> {
        self.root_object(self.root_element().mutation)
    }

    pub fn subscription_type(&self) -> Option<&ObjectType> {
        self.root_object(self.root_element().subscription)
    }

    /// Type names and ids, sorted by name.
    pub fn type_ids(&self) -> impl Iterator<Item = (&str, ElementId)> + '_ {
        self.types.iter().map(|(name, &id)| (name.as_str(), id))
    }

    /// All named types, sorted by name.
    pub fn all_types_as_list(&self) -> Vec<&SchemaElement> {
        self.types.values().map(|&id| &self.arena[id]).collect()
    }

    pub fn all_types_as_list_cancellable(
        &self,
        cancellation: impl CancellationCheck,
    ) -> Result<Vec<&SchemaElement>, Cancelled> {
        self.types
            .values()
            .map(|&id| {
                if cancellation.is_cancelled() {
                    Err(Cancelled)
                } else {
                    Ok(&self.arena[id])
                }
            })
            .collect()
    }

    /// Object types that declare `interface_name` among their interfaces, sorted by name.
    pub fn implementations(&self, interface_name: &str) -> Vec<ElementId> {
        let Some(interface) = self.type_id(interface_name) else {
            return vec![];
        };

        self.types
            .values()
            .copied()
            .filter(|&id| self.implements(id, interface))
            .collect()
    }

    pub fn implementations_cancellable(
        &self,
        interface_name: &str,
        cancellation: impl CancellationCheck,
    ) -> Result<Vec<ElementId>, Cancelled> {
        let Some(interface) = self.type_id(interface_name) else {
            return Ok(vec![]);
        };

        let mut implementations = vec![];
        for &id in self.types.values() {
            if cancellation.is_cancelled() {
                return Err(Cancelled);
            }
            if self.implements(id, interface) {
                implementations.push(id);
            }
        }
        Ok(implementations)
    }

    fn implements(&self, id: ElementId, interface: ElementId) -> bool {
        matches!(
            &self.arena[id],
            SchemaElement::Object(object) if object.interfaces.contains(&interface)
        )
    }

    /// The object types a value of an abstract type may have at runtime. Empty for any other
    /// kind of type.
    pub fn possible_types(&self, abstract_name: &str) -> Vec<ElementId> {
        match self.type_by_name(abstract_name) {
            Some(SchemaElement::Union(union)) => union.types.clone(),
            Some(SchemaElement::Interface(_)) => self.implementations(abstract_name),
            _ => vec![],
        }
    }

    pub fn possible_types_cancellable(
        &self,
        abstract_name: &str,
        cancellation: impl CancellationCheck,
    ) -> Result<Vec<ElementId>, Cancelled> {
        match self.type_by_name(abstract_name) {
            Some(SchemaElement::Union(union)) => {
                if cancellation.is_cancelled() {
                    return Err(Cancelled);
                }
                Ok(union.types.clone())
            }
            Some(SchemaElement::Interface(_)) => {
                self.implementations_cancellable(abstract_name, cancellation)
            }
            _ => Ok(vec![]),
        }
    }

    pub fn is_possible_type(&self, abstract_name: &str, concrete_name: &str) -> bool {
        match self.type_id(concrete_name) {
            Some(concrete) => self.possible_types(abstract_name).contains(&concrete),
            None => false,
        }
    }

    /// Picks the concrete object type of `value` through the code registry.
    pub fn resolve_type(&self, abstract_name: &str, value: &ConstValue) -> Option<&ObjectType> {
        let resolver = self.code_registry.type_resolver(abstract_name)?;
        let concrete = resolver.resolve_type(value, self)?;
        if !self.is_possible_type(abstract_name, &concrete) {
            return None;
        }
        match self.type_by_name(&concrete) {
            Some(SchemaElement::Object(object)) => Some(object),
            _ => None,
        }
    }

    pub fn directive(&self, name: &str) -> Option<&DirectiveDefinition> {
        match self.directives.get(name).map(|&id| &self.arena[id]) {
            Some(SchemaElement::Directive(directive)) => Some(directive),
            _ => None,
        }
    }

    /// Directive definitions, sorted by name.
    pub fn directives(&self) -> Vec<&DirectiveDefinition> {
        self.directives
            .keys()
            .filter_map(|name| self.directive(name))
            .collect()
    }

    /// Field `field_name` of an object or interface type.
    pub fn field_definition(&self, type_name: &str, field_name: &str) -> Option<&FieldDefinition> {
        let fields = match self.type_by_name(type_name)? {
            SchemaElement::Object(object) => &object.fields,
            SchemaElement::Interface(interface) => &interface.fields,
            _ => return None,
        };

        fields.iter().find_map(|&id| match &self.arena[id] {
            SchemaElement::Field(field) if field.name() == field_name => Some(field),
            _ => None,
        })
    }

    /// Arguments of a field or directive definition, by name.
    pub fn argument_definitions<'a>(
        &'a self,
        arguments: &'a [ElementId],
    ) -> impl Iterator<Item = &'a ArgumentDefinition> + 'a {
        arguments.iter().filter_map(|&id| match &self.arena[id] {
            SchemaElement::Argument(argument) => Some(argument),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use common::cancellation::{CancelWhen, TraversalBudget};

    use super::*;
    use crate::{
        builder::{
            DefinitionBuilder, FieldBuilder, InterfaceTypeBuilder, ObjectTypeBuilder,
            SchemaBuilder, TypeExpr, UnionTypeBuilder,
        },
        code_registry::TypenameTypeResolver,
    };

    fn pets_schema() -> Schema {
        SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("pets", TypeExpr::parse("[Pet!]!").unwrap()))
                    .field(FieldBuilder::new("search", TypeExpr::named("SearchResult"))),
            )
            .unwrap()
            .add_type(
                InterfaceTypeBuilder::new("Pet")
                    .field(FieldBuilder::new("name", TypeExpr::named("String").non_null())),
            )
            .unwrap()
            .add_type(
                ObjectTypeBuilder::new("Dog")
                    .description("A good boy")
                    .interface("Pet")
                    .field(FieldBuilder::new("name", TypeExpr::named("String").non_null())),
            )
            .unwrap()
            .add_type(
                ObjectTypeBuilder::new("Cat")
                    .interface("Pet")
                    .field(FieldBuilder::new("name", TypeExpr::named("String").non_null())),
            )
            .unwrap()
            .add_type(UnionTypeBuilder::new("SearchResult").member("Dog").member("Cat"))
            .unwrap()
            .code_registry(
                CodeRegistry::new().with_default_type_resolver(Arc::new(TypenameTypeResolver)),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn read_api() {
        let schema = pets_schema();

        assert_eq!(schema.query_type().map(|q| q.name.as_str()), Some("Query"));
        assert!(schema.mutation_type().is_none());

        let names: Vec<_> = schema
            .all_types_as_list()
            .into_iter()
            .filter_map(|t| t.name())
            .collect();
        assert_eq!(names, vec!["Boolean", "Cat", "Dog", "Pet", "Query", "SearchResult", "String"]);

        assert_eq!(
            schema.implementations("Pet"),
            vec![schema.type_id("Cat").unwrap(), schema.type_id("Dog").unwrap()]
        );
        assert!(schema.is_possible_type("SearchResult", "Dog"));
        assert!(schema.is_possible_type("Pet", "Cat"));
        assert!(!schema.is_possible_type("Pet", "Query"));

        let field = schema.field_definition("Dog", "name").unwrap();
        assert!(matches!(schema.element(field.ty), SchemaElement::NonNull(_)));
        assert!(schema.field_definition("Dog", "bark").is_none());

        assert!(schema.directive("deprecated").is_some());
        assert_eq!(schema.directives().len(), 4);
    }

    #[test]
    fn resolves_abstract_types() {
        let schema = pets_schema();
        let value = ConstValue::Object(
            [(
                async_graphql_value::Name::new("__typename"),
                ConstValue::String("Dog".to_string()),
            )]
            .into_iter()
            .collect(),
        );

        assert_eq!(
            schema.resolve_type("Pet", &value).map(|o| o.name.as_str()),
            Some("Dog")
        );
        assert!(schema.resolve_type("Pet", &ConstValue::Null).is_none());
    }

    #[test]
    fn cancellable_accessors() {
        let schema = pets_schema();

        let calls = Cell::new(0);
        let cancel_after_two = CancelWhen(|| {
            calls.set(calls.get() + 1);
            calls.get() > 2
        });
        assert_eq!(
            schema.all_types_as_list_cancellable(&cancel_after_two),
            Err(Cancelled)
        );

        let budget = TraversalBudget::unlimited().with_max_steps(100);
        assert_eq!(
            schema.possible_types_cancellable("Pet", &budget).unwrap().len(),
            2
        );
        assert!(budget.steps_taken() > 0);
    }

    #[test]
    fn abstract_types_need_resolvers() {
        let result = SchemaBuilder::new()
            .query_type("Query")
            .add_type(
                ObjectTypeBuilder::new("Query")
                    .field(FieldBuilder::new("pet", TypeExpr::named("Pet"))),
            )
            .unwrap()
            .add_type(
                InterfaceTypeBuilder::new("Pet")
                    .field(FieldBuilder::new("name", TypeExpr::named("String"))),
            )
            .unwrap()
            .build();

        assert_eq!(
            result.unwrap_err(),
            SchemaError::MissingTypeResolver {
                type_name: "Pet".to_string(),
                kind: ElementKind::Interface,
            }
        );
    }
}
