//! Buffable properties and auras.
//!
//! - [`BuffableProperty`]: base value, fast-path accumulator and removable
//!   buff chain, recomputed on every read
//! - [`LayeredProperty`]: the same, split into pre-aura, own and aura
//!   layers; what every entity attribute is stored as
//! - [`AuraRegistry`]: auras in effect and the targets they currently reach
//!
//! Mutations return the undo of exactly that mutation. Property-local undo
//! steps ([`PropertyEdit`], [`LayerEdit`]) are lifted into world steps by
//! the world that owns the property.

mod aura;
mod layered;
mod property;
mod value;

pub use aura::{ActiveAura, AuraCondition, AuraDef, AuraEffect, AuraId, AuraRegistry, AuraTargets};
pub use layered::{Layer, LayerEdit, LayeredProperty};
pub use property::{BuffId, BuffStack, BuffableProperty, PropertyEdit, RemovedBuff, Silenced};
pub use value::{BuffFn, FlagBuff, IntBuff, PropertyValue};
