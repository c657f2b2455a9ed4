//! Reversible actions and their composition.
//!
//! A [`Reversible`] is the undo of exactly one mutation that already
//! happened. It is plain data: a tree of command steps `S`, each of which
//! knows how to invert itself against a context `C` (see [`Revert`]).
//! Composite undos run their children in the reverse of the order in which
//! the forward mutations were applied.
//!
//! ```
//! use rust_ccg_rules::undo::{Revert, Reversible};
//!
//! #[derive(Debug)]
//! struct Pop;
//!
//! impl Revert<Vec<i32>> for Pop {
//!     fn revert(self, log: &mut Vec<i32>) {
//!         log.pop();
//!     }
//! }
//!
//! let mut log = vec![];
//! log.push(1);
//! let first = Reversible::step(Pop);
//! log.push(2);
//! let second = Reversible::step(Pop);
//!
//! let both = Reversible::compose([first, second]);
//! both.undo(&mut log);
//! assert!(log.is_empty());
//! ```

use serde::{Deserialize, Serialize};

/// A command step that can invert one primitive mutation against `C`.
pub trait Revert<C: ?Sized> {
    /// Apply the inverse mutation. Must not trigger any side effects beyond
    /// restoring the captured state.
    fn revert(self, ctx: &mut C);
}

/// The undo of a completed mutation.
#[must_use = "dropping an undo action makes the mutation irreversible"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reversible<S> {
    /// Nothing to undo. Returned by every mutation that changed nothing.
    NoOp,
    /// A single primitive inverse.
    Step(S),
    /// Children in application order; undone last-first.
    Chain(Vec<Reversible<S>>),
}

impl<S> Default for Reversible<S> {
    fn default() -> Self {
        Reversible::NoOp
    }
}

impl<S> Reversible<S> {
    /// Wrap a single inverse step.
    pub fn step(step: S) -> Self {
        Reversible::Step(step)
    }

    /// Compose undos given in application order.
    ///
    /// No-op members are dropped. An empty result is [`Reversible::NoOp`];
    /// a single survivor is returned unchanged, without a wrapper.
    pub fn compose(actions: impl IntoIterator<Item = Reversible<S>>) -> Self {
        let mut kept: Vec<Reversible<S>> = actions
            .into_iter()
            .filter(|action| !action.is_noop())
            .collect();
        match kept.len() {
            0 => Reversible::NoOp,
            1 => kept.pop().unwrap_or_default(),
            _ => Reversible::Chain(kept),
        }
    }

    /// Compose `self` followed by `next` (so `next` is undone first).
    pub fn then(self, next: Reversible<S>) -> Self {
        match (self, next) {
            (Reversible::NoOp, other) | (other, Reversible::NoOp) => other,
            (Reversible::Chain(mut children), next) => {
                children.push(next);
                Reversible::Chain(children)
            }
            (first, next) => Reversible::Chain(vec![first, next]),
        }
    }

    /// Whether undoing this would do nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        match self {
            Reversible::NoOp => true,
            Reversible::Step(_) => false,
            Reversible::Chain(children) => children.iter().all(Reversible::is_noop),
        }
    }

    /// Number of primitive steps contained.
    #[must_use]
    pub fn step_count(&self) -> usize {
        match self {
            Reversible::NoOp => 0,
            Reversible::Step(_) => 1,
            Reversible::Chain(children) => children.iter().map(Reversible::step_count).sum(),
        }
    }

    /// Re-tag every step, keeping the tree shape.
    ///
    /// Used to lift a subsystem-local undo (a property edit, say) into the
    /// step type of the context that owns the subsystem.
    pub fn map<U, F: FnMut(S) -> U>(self, f: &mut F) -> Reversible<U> {
        match self {
            Reversible::NoOp => Reversible::NoOp,
            Reversible::Step(step) => Reversible::Step(f(step)),
            Reversible::Chain(children) => {
                Reversible::Chain(children.into_iter().map(|child| child.map(f)).collect())
            }
        }
    }

    /// Run the inverse: every step, last applied first.
    pub fn undo<C: ?Sized>(self, ctx: &mut C)
    where
        S: Revert<C>,
    {
        match self {
            Reversible::NoOp => {}
            Reversible::Step(step) => step.revert(ctx),
            Reversible::Chain(children) => {
                for child in children.into_iter().rev() {
                    child.undo(ctx);
                }
            }
        }
    }
}

/// Collects undos of a multi-step mutation in application order.
#[derive(Debug)]
pub struct UndoBuilder<S> {
    actions: Vec<Reversible<S>>,
}

impl<S> Default for UndoBuilder<S> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
        }
    }
}

impl<S> UndoBuilder<S> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the undo of the mutation just applied.
    pub fn push(&mut self, action: Reversible<S>) {
        if !action.is_noop() {
            self.actions.push(action);
        }
    }

    /// Record a single inverse step.
    pub fn push_step(&mut self, step: S) {
        self.actions.push(Reversible::Step(step));
    }

    /// Whether anything was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Compose everything recorded.
    pub fn finish(self) -> Reversible<S> {
        Reversible::compose(self.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Record(i32);

    impl Revert<Vec<i32>> for Record {
        fn revert(self, log: &mut Vec<i32>) {
            log.push(self.0);
        }
    }

    fn step(n: i32) -> Reversible<Record> {
        Reversible::step(Record(n))
    }

    #[test]
    fn test_compose_empty_is_noop() {
        let composed: Reversible<Record> = Reversible::compose([]);
        assert_eq!(composed, Reversible::NoOp);
    }

    #[test]
    fn test_compose_single_is_unwrapped() {
        assert_eq!(Reversible::compose([step(1)]), step(1));
        assert_eq!(
            Reversible::compose([Reversible::NoOp, step(1), Reversible::NoOp]),
            step(1)
        );
    }

    #[test]
    fn test_chain_undoes_in_reverse() {
        let mut log = Vec::new();
        Reversible::compose([step(1), step(2), step(3)]).undo(&mut log);
        assert_eq!(log, vec![3, 2, 1]);
    }

    #[test]
    fn test_nested_chain_order() {
        let mut log = Vec::new();
        let inner = Reversible::compose([step(2), step(3)]);
        Reversible::compose([step(1), inner, step(4)]).undo(&mut log);
        assert_eq!(log, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_then_appends() {
        let mut log = Vec::new();
        let action = step(1).then(step(2)).then(Reversible::NoOp).then(step(3));
        assert_eq!(action.step_count(), 3);
        action.undo(&mut log);
        assert_eq!(log, vec![3, 2, 1]);
    }

    #[test]
    fn test_builder() {
        let mut builder = UndoBuilder::new();
        assert!(builder.is_empty());
        builder.push(Reversible::NoOp);
        assert!(builder.is_empty());
        builder.push_step(Record(1));
        builder.push(step(2));

        let mut log = Vec::new();
        builder.finish().undo(&mut log);
        assert_eq!(log, vec![2, 1]);
    }

    #[test]
    fn test_map_keeps_order() {
        let mapped = Reversible::compose([step(1), step(2)]).map(&mut |Record(n)| Record(n * 10));
        let mut log = Vec::new();
        mapped.undo(&mut log);
        assert_eq!(log, vec![20, 10]);
    }

    #[test]
    fn test_is_noop_sees_through_chains() {
        let chain: Reversible<Record> = Reversible::Chain(vec![Reversible::NoOp, Reversible::NoOp]);
        assert!(chain.is_noop());
        assert!(!step(1).is_noop());
    }
}
