// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The standard GraphQL validation rules.

mod arguments;
mod directives;
mod fields;
mod fragments;
mod operations;
mod types;
mod values;
mod variables;

pub use arguments::{
    ArgumentsOfCorrectType, KnownArgumentNames, ProvidedNonNullArguments, UniqueArgumentNames,
};
pub use directives::{KnownDirectives, UniqueDirectivesPerLocation};
pub use fields::{FieldsOnCorrectType, ScalarLeaves};
pub use fragments::{
    FragmentsOnCompositeType, KnownFragmentNames, NoFragmentCycles, NoUnusedFragments,
    PossibleFragmentSpreads,
};
pub use operations::{KnownOperationTypes, SubscriptionUniqueRootField};
pub use types::KnownTypeNames;
pub use variables::{
    NoUndefinedVariables, NoUnusedVariables, UniqueVariableNames,
    VariableDefaultValuesOfCorrectType, VariableTypesMatch, VariablesAreInputTypes,
};

use crate::rule::ValidationRule;

/// A fresh instance of every standard rule.
pub fn standard_rules() -> Vec<Box<dyn ValidationRule>> {
    vec![
        Box::new(KnownOperationTypes),
        Box::new(SubscriptionUniqueRootField),
        Box::new(KnownTypeNames),
        Box::new(FragmentsOnCompositeType),
        Box::new(VariablesAreInputTypes),
        Box::new(ScalarLeaves),
        Box::new(FieldsOnCorrectType),
        Box::new(KnownFragmentNames),
        Box::new(NoUnusedFragments::default()),
        Box::new(PossibleFragmentSpreads),
        Box::new(NoFragmentCycles),
        Box::new(UniqueVariableNames),
        Box::new(NoUndefinedVariables::default()),
        Box::new(NoUnusedVariables::default()),
        Box::new(KnownDirectives),
        Box::new(UniqueDirectivesPerLocation),
        Box::new(KnownArgumentNames),
        Box::new(UniqueArgumentNames),
        Box::new(ArgumentsOfCorrectType),
        Box::new(ProvidedNonNullArguments),
        Box::new(VariableDefaultValuesOfCorrectType),
        Box::new(VariableTypesMatch::default()),
    ]
}
