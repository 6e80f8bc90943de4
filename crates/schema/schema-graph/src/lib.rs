// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! An immutable GraphQL schema type graph, with cycle-aware traversal, visitors and
//! structure-sharing transformations.

pub mod arena;
pub mod builder;
pub mod builtins;
pub mod code_registry;
pub mod coercion;
pub mod element;
pub mod error;
pub mod prune;
pub mod resolution;
pub mod schema;
pub mod transform;
pub mod traversal;
pub mod type_util;
pub mod visitor;

mod schema_validation;

pub use arena::{ElementId, GraphArena};
pub use error::{SchemaError, TransformError, TraversalError};
pub use schema::Schema;
