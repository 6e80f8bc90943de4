// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Validation of GraphQL query documents against a [`schema_graph::Schema`].
//!
//! A [`DocumentValidator`] walks the document once for the rules that look at each definition on
//! its own, and once more for the rules that follow fragment spreads from each operation. Each
//! rule reports problems into the shared [`ValidationContext`].

mod context;
mod error;
mod rule;
pub mod rules;
mod validator;
mod walker;

pub use context::{ExpectedInput, ValidationContext};
pub use error::{SourceLocation, ValidationError, ValidationErrorType};
pub use rule::ValidationRule;
pub use validator::{DocumentValidator, parse_and_validate};
