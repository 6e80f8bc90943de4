// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Cycle-aware depth-first traversal of the type graph.

mod context;
mod traverser;

pub use context::{Breadcrumb, NodeLocation, TraverserContext};
pub use traverser::{
    TraversalControl, TraversalStatus, Traverser, TraverserResult, TraverserVisitor,
};

pub(crate) use context::PathEntry;
