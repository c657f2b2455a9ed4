//! Value types a property can hold and the buffs that modify them.
//!
//! Two kinds of modifier exist for each value type:
//!
//! - the fast-path accumulator (`Fast`): additive for integers, overwrite
//!   for flags; O(1) to apply and to undo, never removed individually
//! - removable buffs (`Buff`): a tagged union applied in insertion order

use serde::{Deserialize, Serialize};
use std::fmt;

/// A modifier function applied to a property value.
pub trait BuffFn<T> {
    fn apply(&self, value: T) -> T;
}

/// A value type usable in a buffable property.
pub trait PropertyValue: Copy + fmt::Debug + PartialEq + 'static {
    /// Fast-path accumulator. `Default` means "no modification".
    type Fast: Copy + fmt::Debug + Default + PartialEq;

    /// Removable buff.
    type Buff: BuffFn<Self> + Clone + fmt::Debug + PartialEq;

    /// Fold the accumulator into a base value.
    fn fold_fast(self, fast: Self::Fast) -> Self;

    /// Accumulate a new fast-path modification on top of `current`.
    fn combine_fast(current: Self::Fast, incoming: Self::Fast) -> Self::Fast;

    /// A buff that overwrites the value with `value`.
    fn fixed(value: Self) -> Self::Buff;
}

/// Removable modifier of an integer property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntBuff {
    Add(i32),
    Multiply(i32),
    Set(i32),
    /// Raise to at least this value.
    AtLeast(i32),
    /// Lower to at most this value.
    AtMost(i32),
}

impl BuffFn<i32> for IntBuff {
    fn apply(&self, value: i32) -> i32 {
        match *self {
            IntBuff::Add(delta) => value.saturating_add(delta),
            IntBuff::Multiply(factor) => value.saturating_mul(factor),
            IntBuff::Set(fixed) => fixed,
            IntBuff::AtLeast(min) => value.max(min),
            IntBuff::AtMost(max) => value.min(max),
        }
    }
}

/// Removable modifier of a flag property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlagBuff {
    Grant,
    Remove,
}

impl BuffFn<bool> for FlagBuff {
    fn apply(&self, _value: bool) -> bool {
        matches!(self, FlagBuff::Grant)
    }
}

impl PropertyValue for i32 {
    type Fast = i32;
    type Buff = IntBuff;

    fn fold_fast(self, fast: i32) -> i32 {
        self.saturating_add(fast)
    }

    fn combine_fast(current: i32, incoming: i32) -> i32 {
        current.saturating_add(incoming)
    }

    fn fixed(value: i32) -> IntBuff {
        IntBuff::Set(value)
    }
}

impl PropertyValue for bool {
    /// `None` leaves the base untouched; the latest `Some` wins.
    type Fast = Option<bool>;
    type Buff = FlagBuff;

    fn fold_fast(self, fast: Option<bool>) -> bool {
        fast.unwrap_or(self)
    }

    fn combine_fast(current: Option<bool>, incoming: Option<bool>) -> Option<bool> {
        incoming.or(current)
    }

    fn fixed(value: bool) -> FlagBuff {
        if value {
            FlagBuff::Grant
        } else {
            FlagBuff::Remove
        }
    }
}
