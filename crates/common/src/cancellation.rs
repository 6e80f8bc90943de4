// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Cooperative cancellation.
//!
//! Long running passes (traversal, transformation, validation, and accessors that re-derive data
//! from the type graph) poll a [`CancellationCheck`] once per visited node and return early when
//! it fires. Nothing blocks: a check is a cheap predicate supplied by the caller.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::{Duration, Instant},
};

use thiserror::Error;

pub trait CancellationCheck {
    /// Polled once per unit of work. Returning `true` asks the caller to stop.
    fn is_cancelled(&self) -> bool;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation cancelled before completion")]
pub struct Cancelled;

/// A check that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationCheck for NeverCancelled {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Adapts a predicate (for example, one reading an editor's "request superseded" flag).
pub struct CancelWhen<F>(pub F);

impl<F: Fn() -> bool> CancellationCheck for CancelWhen<F> {
    fn is_cancelled(&self) -> bool {
        (self.0)()
    }
}

/// Fires after a number of polls, a deadline, or both.
///
/// Each poll counts as one step, so the same budget can be shared by consecutive passes.
#[derive(Debug)]
pub struct TraversalBudget {
    max_steps: Option<usize>,
    deadline: Option<Instant>,
    steps: AtomicUsize,
}

impl TraversalBudget {
    pub fn unlimited() -> Self {
        Self {
            max_steps: None,
            deadline: None,
            steps: AtomicUsize::new(0),
        }
    }

    pub fn with_max_steps(self, max_steps: usize) -> Self {
        Self {
            max_steps: Some(max_steps),
            ..self
        }
    }

    /// The deadline starts counting at the time of this call. A timeout too large to represent
    /// as an instant means no deadline.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            ..self
        }
    }

    pub fn steps_taken(&self) -> usize {
        self.steps.load(Ordering::Relaxed)
    }
}

impl CancellationCheck for TraversalBudget {
    fn is_cancelled(&self) -> bool {
        let steps = self.steps.fetch_add(1, Ordering::Relaxed) + 1;

        if self.max_steps.is_some_and(|max| steps > max) {
            return true;
        }

        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl<T: CancellationCheck + ?Sized> CancellationCheck for &T {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

impl<T: CancellationCheck + ?Sized> CancellationCheck for Box<T> {
    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn step_budget_fires_after_limit() {
        let budget = TraversalBudget::unlimited().with_max_steps(3);

        assert!(!budget.is_cancelled());
        assert!(!budget.is_cancelled());
        assert!(!budget.is_cancelled());
        assert!(budget.is_cancelled());
        assert_eq!(budget.steps_taken(), 4);
    }

    #[test]
    fn expired_deadline_fires() {
        let budget = TraversalBudget::unlimited().with_timeout(Duration::ZERO);

        assert!(budget.is_cancelled());
    }

    #[test]
    fn huge_timeout_has_no_deadline() {
        let budget = TraversalBudget::unlimited().with_timeout(Duration::MAX);

        assert!(!budget.is_cancelled());
    }

    #[test]
    fn unlimited_never_fires() {
        let budget = TraversalBudget::unlimited();

        assert!((0..1000).all(|_| !budget.is_cancelled()));
    }

    #[test]
    fn predicate() {
        let flag = Cell::new(false);
        let check = CancelWhen(|| flag.get());

        assert!(!check.is_cancelled());
        flag.set(true);
        assert!(check.is_cancelled());
    }
}
