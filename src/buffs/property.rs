//! Buffable properties.
//!
//! A [`BuffStack`] is the modifier half of a property: the fast-path
//! accumulator plus the ordered chain of removable buffs. A
//! [`BuffableProperty`] pairs a stack with its base value.
//!
//! Reads always recompute: base, then the fast path folded into it, then
//! every removable buff in insertion order. Nothing is cached, so removing
//! a buff anywhere in the chain is visible on the next read.
//!
//! Every mutation returns the undo of exactly that mutation as a
//! [`Reversible<PropertyEdit<T>>`](PropertyEdit).
//!
//! ```
//! use rust_ccg_rules::buffs::{BuffableProperty, IntBuff};
//!
//! let mut attack = BuffableProperty::new(4);
//! let _fast = attack.add_fast(1);
//! let (doubled, _undo) = attack.add_buff(IntBuff::Multiply(2));
//! assert_eq!(attack.value(), 10);
//!
//! let _removed = attack.remove_buff(doubled);
//! assert_eq!(attack.value(), 5);
//!
//! let _silenced = attack.silence();
//! assert_eq!(attack.value(), 4);
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};

use super::value::{BuffFn, PropertyValue};
use crate::undo::{Reversible, Revert};

/// Identifier of a removable buff within one stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuffId(u64);

impl BuffId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// A buff taken out of a chain, with the slot it occupied.
#[derive(Clone, Debug, PartialEq)]
pub struct RemovedBuff<T: PropertyValue> {
    index: usize,
    id: BuffId,
    buff: T::Buff,
}

/// Everything a silence cleared.
#[derive(Clone, Debug, PartialEq)]
pub struct Silenced<T: PropertyValue> {
    fast: T::Fast,
    chain: Vector<(BuffId, T::Buff)>,
}

impl<T: PropertyValue> Silenced<T> {
    /// Whether the silence cleared nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fast == T::Fast::default() && self.chain.is_empty()
    }
}

/// Inverse of one property mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyEdit<T: PropertyValue> {
    /// Put the fast-path accumulator back to this value.
    RestoreFast(T::Fast),
    /// Take out a buff that was added.
    Remove(BuffId),
    /// Put back a buff that was removed, at its old slot.
    Reinsert(RemovedBuff<T>),
    /// Put back everything a silence cleared.
    Restore(Silenced<T>),
}

impl<T: PropertyValue> PropertyEdit<T> {
    /// Apply this inverse to a stack.
    pub fn apply_to(self, stack: &mut BuffStack<T>) {
        match self {
            PropertyEdit::RestoreFast(fast) => stack.fast = fast,
            PropertyEdit::Remove(id) => {
                stack.take(id);
            }
            PropertyEdit::Reinsert(removed) => {
                let index = removed.index.min(stack.chain.len());
                stack.chain.insert(index, (removed.id, removed.buff));
            }
            PropertyEdit::Restore(silenced) => {
                stack.fast = silenced.fast;
                stack.chain = silenced.chain;
            }
        }
    }
}

/// Fast-path accumulator plus removable buff chain.
#[derive(Clone, Debug)]
pub struct BuffStack<T: PropertyValue> {
    fast: T::Fast,
    chain: Vector<(BuffId, T::Buff)>,
    next_id: u64,
}

impl<T: PropertyValue> Default for BuffStack<T> {
    fn default() -> Self {
        Self {
            fast: T::Fast::default(),
            chain: Vector::new(),
            next_id: 0,
        }
    }
}

impl<T: PropertyValue> BuffStack<T> {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the stack to an input value.
    #[must_use]
    pub fn apply(&self, input: T) -> T {
        self.chain
            .iter()
            .fold(input.fold_fast(self.fast), |value, (_, buff)| buff.apply(value))
    }

    /// Current fast-path accumulator.
    #[must_use]
    pub fn fast(&self) -> T::Fast {
        self.fast
    }

    /// Number of removable buffs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Whether the stack modifies nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fast == T::Fast::default() && self.chain.is_empty()
    }

    /// Ids of the removable buffs in application order.
    pub fn buff_ids(&self) -> impl Iterator<Item = BuffId> + '_ {
        self.chain.iter().map(|(id, _)| *id)
    }

    /// Accumulate a non-removable modification.
    pub fn add_fast(&mut self, incoming: T::Fast) -> Reversible<PropertyEdit<T>> {
        if incoming == T::Fast::default() {
            return Reversible::NoOp;
        }
        let previous = self.fast;
        self.fast = T::combine_fast(previous, incoming);
        tracing::trace!(?previous, current = ?self.fast, "fast buff applied");
        Reversible::step(PropertyEdit::RestoreFast(previous))
    }

    /// Append a removable buff.
    pub fn add_buff(&mut self, buff: T::Buff) -> (BuffId, Reversible<PropertyEdit<T>>) {
        let id = BuffId(self.next_id);
        self.next_id += 1;
        tracing::trace!(?buff, id = id.raw(), "buff added");
        self.chain.push_back((id, buff));
        (id, Reversible::step(PropertyEdit::Remove(id)))
    }

    /// Remove a buff by id; no-op if it is not in the chain.
    pub fn remove_buff(&mut self, id: BuffId) -> Reversible<PropertyEdit<T>> {
        match self.take(id) {
            Some(removed) => Reversible::step(PropertyEdit::Reinsert(removed)),
            None => Reversible::NoOp,
        }
    }

    /// Clear the fast path and the whole chain.
    pub fn silence(&mut self) -> Reversible<PropertyEdit<T>> {
        let silenced = Silenced {
            fast: std::mem::take(&mut self.fast),
            chain: std::mem::take(&mut self.chain),
        };
        if silenced.is_empty() {
            return Reversible::NoOp;
        }
        Reversible::step(PropertyEdit::Restore(silenced))
    }

    // Most removals target the most recent buff, so search from the tail.
    fn take(&mut self, id: BuffId) -> Option<RemovedBuff<T>> {
        let index = (0..self.chain.len())
            .rev()
            .find(|&i| self.chain[i].0 == id)?;
        let (id, buff) = self.chain.remove(index);
        Some(RemovedBuff { index, id, buff })
    }
}

impl<T: PropertyValue> Revert<BuffStack<T>> for PropertyEdit<T> {
    fn revert(self, stack: &mut BuffStack<T>) {
        self.apply_to(stack);
    }
}

/// A base value with a modifier stack.
#[derive(Clone, Debug)]
pub struct BuffableProperty<T: PropertyValue> {
    base: T,
    stack: BuffStack<T>,
}

impl<T: PropertyValue> BuffableProperty<T> {
    /// Unmodified property.
    pub fn new(base: T) -> Self {
        Self {
            base,
            stack: BuffStack::new(),
        }
    }

    /// Base value before any modifier.
    #[must_use]
    pub fn base(&self) -> T {
        self.base
    }

    /// Current value: base, fast path, then the chain.
    #[must_use]
    pub fn value(&self) -> T {
        self.stack.apply(self.base)
    }

    /// Modifier stack.
    #[must_use]
    pub fn stack(&self) -> &BuffStack<T> {
        &self.stack
    }

    /// Non-removable modification.
    pub fn add_fast(&mut self, incoming: T::Fast) -> Reversible<PropertyEdit<T>> {
        self.stack.add_fast(incoming)
    }

    /// Removable buff.
    pub fn add_buff(&mut self, buff: T::Buff) -> (BuffId, Reversible<PropertyEdit<T>>) {
        self.stack.add_buff(buff)
    }

    /// Remove one removable buff.
    pub fn remove_buff(&mut self, id: BuffId) -> Reversible<PropertyEdit<T>> {
        self.stack.remove_buff(id)
    }

    /// Clear every modifier.
    pub fn silence(&mut self) -> Reversible<PropertyEdit<T>> {
        self.stack.silence()
    }

    /// Force the value: silence, then append a fixed buff, so a later
    /// silence falls back to the base value.
    pub fn set_value_to(&mut self, value: T) -> Reversible<PropertyEdit<T>> {
        let silenced = self.silence();
        let (_, added) = self.add_buff(T::fixed(value));
        silenced.then(added)
    }

    /// Independent duplicate of the modifiers over a new base.
    #[must_use]
    pub fn copy_with_base(&self, base: T) -> Self {
        Self {
            base,
            stack: self.stack.clone(),
        }
    }
}

impl<T: PropertyValue> Revert<BuffableProperty<T>> for PropertyEdit<T> {
    fn revert(self, property: &mut BuffableProperty<T>) {
        self.apply_to(&mut property.stack);
    }
}
