// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Pos;
use schema_graph::SchemaError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SdlError {
    #[error("Failed to parse the schema: {message}")]
    Parse { message: String, pos: Option<Pos> },

    #[error("{kind} '{name}' is defined more than once (at {pos})")]
    DuplicateDefinition {
        kind: &'static str,
        name: String,
        pos: Pos,
    },

    #[error("Type extension '{name}' (at {pos}) has no matching definition")]
    ExtensionWithoutDefinition { name: String, pos: Pos },

    #[error("Type extension '{name}' (at {pos}) does not match the kind of its definition")]
    ExtensionKindMismatch { name: String, pos: Pos },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl From<async_graphql_parser::Error> for SdlError {
    fn from(error: async_graphql_parser::Error) -> Self {
        SdlError::Parse {
            message: error.to_string(),
            pos: error.positions().next(),
        }
    }
}
