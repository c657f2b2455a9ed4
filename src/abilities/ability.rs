//! The ability contract and its combinators.
//!
//! An ability is anything that can be activated for an owner entity and
//! hands back the [`UnregisterRef`] of what it registered. Unregistering
//! the handle deactivates it; undoing the handle reverses the activation.
//! Activating the same ability again creates an independent registration.

use std::fmt;
use std::rc::Rc;

use crate::core::EntityId;
use crate::undo::UnregisterRef;
use crate::world::World;

/// Lifecycle-bound effect registration.
pub trait Ability: fmt::Debug {
    /// Register this ability's effects for `owner`.
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef;
}

/// Shared handle to an ability.
pub type AbilityRef = Rc<dyn Ability>;

/// Ability that registers nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct InactiveAbility;

impl Ability for InactiveAbility {
    fn activate(&self, world: &mut World, _owner: EntityId) -> UnregisterRef {
        world.register_inert()
    }
}

/// Several abilities activated together, in order.
#[derive(Debug)]
pub struct MergedAbility {
    parts: Vec<AbilityRef>,
}

impl MergedAbility {
    #[must_use]
    pub fn parts(&self) -> &[AbilityRef] {
        &self.parts
    }
}

impl Ability for MergedAbility {
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef {
        let children = self
            .parts
            .iter()
            .map(|part| part.activate(world, owner))
            .collect();
        world.register_group(children)
    }
}

/// Combine abilities into one.
///
/// No abilities give an [`InactiveAbility`]; a single ability is returned
/// as is; more are wrapped in a [`MergedAbility`] whose handle unregisters
/// the parts in reverse order.
pub fn merge(abilities: impl IntoIterator<Item = AbilityRef>) -> AbilityRef {
    let mut parts: Vec<AbilityRef> = abilities.into_iter().collect();
    match parts.len() {
        0 => Rc::new(InactiveAbility),
        1 => parts.remove(0),
        _ => Rc::new(MergedAbility { parts }),
    }
}
