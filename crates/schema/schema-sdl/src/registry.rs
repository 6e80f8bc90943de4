// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Name-indexed type system definitions from parsed SDL.

use std::{collections::HashMap, iter::Peekable, str::Chars};

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        DirectiveDefinition, SchemaDefinition, ServiceDocument, TypeDefinition, TypeKind,
        TypeSystemDefinition,
    },
};
use tracing::instrument;

use crate::{error::SdlError, mapped_arena::MappedArena};

#[derive(Debug, Default)]
pub struct TypeDefinitionRegistry {
    types: MappedArena<Positioned<TypeDefinition>>,
    extensions: HashMap<String, Vec<Positioned<TypeDefinition>>>,
    directives: MappedArena<Positioned<DirectiveDefinition>>,
    schema_definition: Option<Positioned<SchemaDefinition>>,
    schema_extensions: Vec<Positioned<SchemaDefinition>>,
}

impl TypeDefinitionRegistry {
    /// Parses and registers an SDL document.
    pub fn parse(sdl: &str) -> Result<Self, SdlError> {
        let mut document = async_graphql_parser::parse_schema(sdl)?;
        for definition in &mut document.definitions {
            if let TypeSystemDefinition::Directive(directive) = definition {
                directive.node.is_repeatable = declares_repeatable(sdl, &directive.node);
            }
        }
        Self::from_document(document)
    }

    /// Registers an already parsed document. `is_repeatable` of directive definitions is taken
    /// as given: `async_graphql_parser::parse_schema` sets it on every definition, and
    /// [`Self::parse`] recomputes it from the source text.
    #[instrument(name = "TypeDefinitionRegistry::from_document", skip_all)]
    pub fn from_document(document: ServiceDocument) -> Result<Self, SdlError> {
        let mut registry = Self::default();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Type(definition) if definition.node.extend => {
                    registry
                        .extensions
                        .entry(definition.node.name.node.to_string())
                        .or_default()
                        .push(definition);
                }
                TypeSystemDefinition::Type(definition) => {
                    let name = definition.node.name.node.to_string();
                    let pos = definition.pos;
                    registry.types.add(&name, definition).map_err(|_| {
                        SdlError::DuplicateDefinition {
                            kind: "Type",
                            name,
                            pos,
                        }
                    })?;
                }
                TypeSystemDefinition::Directive(definition) => {
                    let name = definition.node.name.node.to_string();
                    let pos = definition.pos;
                    registry.directives.add(&name, definition).map_err(|_| {
                        SdlError::DuplicateDefinition {
                            kind: "Directive",
                            name,
                            pos,
                        }
                    })?;
                }
                TypeSystemDefinition::Schema(definition) if definition.node.extend => {
                    registry.schema_extensions.push(definition);
                }
                TypeSystemDefinition::Schema(definition) => {
                    if registry.schema_definition.is_some() {
                        return Err(SdlError::DuplicateDefinition {
                            kind: "Schema",
                            name: "schema".to_string(),
                            pos: definition.pos,
                        });
                    }
                    registry.schema_definition = Some(definition);
                }
            }
        }

        registry.check_extensions()?;
        Ok(registry)
    }

    fn check_extensions(&self) -> Result<(), SdlError> {
        for (name, extensions) in &self.extensions {
            for extension in extensions {
                let Some(definition) = self.types.get_by_key(name) else {
                    return Err(SdlError::ExtensionWithoutDefinition {
                        name: name.clone(),
                        pos: extension.pos,
                    });
                };

                if !same_kind(&definition.node.kind, &extension.node.kind) {
                    return Err(SdlError::ExtensionKindMismatch {
                        name: name.clone(),
                        pos: extension.pos,
                    });
                }
            }
        }
        Ok(())
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get_by_key(name).map(|definition| &definition.node)
    }

    /// Type definitions in declaration order (extensions excluded).
    pub fn type_definitions(&self) -> impl Iterator<Item = &TypeDefinition> {
        self.types.values().map(|definition| &definition.node)
    }

    pub fn extensions(&self, name: &str) -> impl Iterator<Item = &TypeDefinition> {
        self.extensions
            .get(name)
            .into_iter()
            .flatten()
            .map(|extension| &extension.node)
    }

    pub fn directive_definition(&self, name: &str) -> Option<&DirectiveDefinition> {
        self.directives
            .get_by_key(name)
            .map(|definition| &definition.node)
    }

    pub fn directive_definitions(&self) -> impl Iterator<Item = &DirectiveDefinition> {
        self.directives.values().map(|definition| &definition.node)
    }

    pub fn schema_definition(&self) -> Option<&SchemaDefinition> {
        self.schema_definition
            .as_ref()
            .map(|definition| &definition.node)
    }

    /// Root operation type names: from the schema definition and its extensions when there is
    /// one, otherwise the conventional names of the types that exist.
    pub fn root_type_names(&self) -> RootTypeNames {
        let definitions = self
            .schema_definition
            .iter()
            .chain(self.schema_extensions.iter())
            .map(|definition| &definition.node);

        let mut roots = RootTypeNames::default();
        let mut explicit = false;
        for definition in definitions {
            explicit = true;
            let name = |root: &Option<Positioned<async_graphql_value::Name>>| {
                root.as_ref().map(|name| name.node.to_string())
            };
            roots.query = roots.query.or(name(&definition.query));
            roots.mutation = roots.mutation.or(name(&definition.mutation));
            roots.subscription = roots.subscription.or(name(&definition.subscription));
        }

        if !explicit {
            let conventional = |name: &str| self.types.contains_key(name).then(|| name.to_string());
            roots.query = conventional("Query");
            roots.mutation = conventional("Mutation");
            roots.subscription = conventional("Subscription");
        }

        roots
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RootTypeNames {
    pub query: Option<String>,
    pub mutation: Option<String>,
    pub subscription: Option<String>,
}

fn same_kind(a: &TypeKind, b: &TypeKind) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

/// Whether `repeatable` appears between a directive definition's name and its first location,
/// outside of the argument definitions.
fn declares_repeatable(sdl: &str, definition: &DirectiveDefinition) -> bool {
    let Some(first_location) = definition.locations.first() else {
        return false;
    };
    let (Some(start), Some(end)) = (
        byte_offset(sdl, definition.name.pos),
        byte_offset(sdl, first_location.pos),
    ) else {
        return false;
    };
    let Some(header) = sdl.get(start + definition.name.node.len()..end) else {
        return false;
    };

    let mut chars = header.chars().peekable();
    let mut depth = 0usize;
    let mut word = String::new();
    while let Some(c) = chars.next() {
        if c.is_ascii_alphanumeric() || c == '_' {
            word.push(c);
            continue;
        }
        if depth == 0 && word == "repeatable" {
            return true;
        }
        word.clear();

        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                }
            }
            '"' => skip_string(&mut chars),
            _ => {}
        }
    }

    depth == 0 && word == "repeatable"
}

/// Consumes the rest of a string or block string whose opening quote was just read.
fn skip_string(chars: &mut Peekable<Chars<'_>>) {
    if chars.next_if_eq(&'"').is_some() {
        if chars.next_if_eq(&'"').is_none() {
            // ""
            return;
        }

        let mut quotes = 0;
        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    quotes += 1;
                    if quotes == 3 {
                        return;
                    }
                }
                '\\' => {
                    quotes = 0;
                    while chars.next_if_eq(&'"').is_some() {}
                }
                _ => quotes = 0,
            }
        }
        return;
    }

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '"' => return,
            _ => {}
        }
    }
}

/// Byte offset of a 1-based line/column position, columns counted in characters.
fn byte_offset(sdl: &str, pos: Pos) -> Option<usize> {
    let line_start = match pos.line {
        0 | 1 => 0,
        line => sdl.match_indices('\n').nth(line - 2)?.0 + 1,
    };
    sdl[line_start..]
        .char_indices()
        .nth(pos.column.checked_sub(1)?)
        .map(|(offset, _)| line_start + offset)
}
