//! Abilities: lifecycle-bound effect registrations.
//!
//! ## Key Components
//!
//! - [`Ability`]: activate for an owner, get back one [`UnregisterRef`]
//! - [`TriggeredAbility`], [`OnceAbility`], [`AfterSummonAbility`]: event
//!   listeners that resolve an [`Effect`]
//! - [`AuraAbility`]: registers an aura sourced at the owner
//! - [`merge`]: several abilities behind one handle
//! - [`AbilityDef`]: the serializable form used by card data
//! - [`AbilityHolder`]: what an entity owns and which activations are live
//!
//! [`UnregisterRef`]: crate::undo::UnregisterRef
//! [`Effect`]: crate::effects::Effect

mod ability;
mod aura;
mod def;
mod holder;
mod triggered;

pub use ability::{merge, Ability, AbilityRef, InactiveAbility, MergedAbility};
pub use aura::AuraAbility;
pub use def::AbilityDef;
pub use holder::AbilityHolder;
pub use triggered::{AfterSummonAbility, OnceAbility, TriggeredAbility};
