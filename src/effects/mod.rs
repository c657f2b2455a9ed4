//! Effect system for card abilities.
//!
//! Effects are the building blocks of card abilities:
//! - `Effect`: tagged union of everything a card can do
//! - `Target` / `TargetSelector`: how effects pick the entities they touch
//! - `EffectResolver`: executes effects on the world and returns the undo
//!
//! Effects are data so that card definitions stay serializable; behavior
//! lives entirely in the resolver and the world primitives it calls.

mod effect;
mod resolver;
mod targeting;

pub use effect::Effect;
pub use resolver::EffectResolver;
pub use targeting::{EffectContext, Target, TargetSelector, Targets};
