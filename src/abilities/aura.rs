//! Aura abilities.

use crate::buffs::AuraDef;
use crate::core::EntityId;
use crate::undo::UnregisterRef;
use crate::world::World;

use super::ability::Ability;

/// Registers an aura sourced at the owner.
///
/// The aura does nothing until the next world refresh reconciles its
/// target set.
#[derive(Clone, Debug)]
pub struct AuraAbility {
    pub def: AuraDef,
}

impl AuraAbility {
    pub fn new(def: AuraDef) -> Self {
        Self { def }
    }
}

impl Ability for AuraAbility {
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef {
        world.register_aura(owner, self.def.clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::buffs::{AuraEffect, AuraTargets, IntBuff};
    use crate::cards::{CardId, Stat};
    use crate::core::PlayerId;
    use crate::world::testing::{minion_card, world_with_minion};

    use super::*;

    #[test]
    fn test_aura_applies_on_refresh_and_unregisters() {
        let (mut world, source) = world_with_minion(minion_card(1, 1, 1));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, CardId::new(1), None);
        let neighbour = world.board(p0)[1];

        let aura = AuraAbility::new(AuraDef::new(
            AuraTargets::AdjacentMinions,
            AuraEffect::Stat {
                stat: Stat::Attack,
                buff: IntBuff::Add(2),
            },
        ));
        let handle = aura.activate(&mut world, source);
        assert_eq!(world.auras().len(), 1);
        assert_eq!(world.minion_attack(neighbour), Some(1));

        let _ = world.refresh_auras();
        assert_eq!(world.minion_attack(neighbour), Some(3));
        assert_eq!(world.minion_attack(source), Some(1));

        let before = world.view();
        let undo = world.unregister(handle);
        assert!(world.auras().is_empty());
        assert_eq!(world.minion_attack(neighbour), Some(1));

        undo.undo(&mut world);
        assert_eq!(world.view(), before);
    }
}
