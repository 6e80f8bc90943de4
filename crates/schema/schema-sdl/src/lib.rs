// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! GraphQL SDL front end for the type graph: registering parsed definitions, generating a
//! [`schema_graph::Schema`] from them and printing a schema back to SDL.

mod error;
mod generator;
mod mapped_arena;
mod printer;
mod registry;
mod wiring;

pub use error::SdlError;
pub use generator::SchemaGenerator;
pub use mapped_arena::MappedArena;
pub use printer::SchemaPrinter;
pub use registry::{RootTypeNames, TypeDefinitionRegistry};
pub use wiring::RuntimeWiring;
