//! Aura reconciliation.
//!
//! After every settled change the world recomputes, for each active aura,
//! which entities should carry its modifier, then removes the modifier
//! from entities that dropped out and adds it to new ones. Entities that
//! stay in the set keep their existing registration. A target that used up
//! a granted keyword is left out until it drops out of the aura's reach.

use std::collections::BTreeSet;

use crate::buffs::{ActiveAura, AuraCondition, AuraEffect, AuraTargets, Layer};
use crate::core::{EntityId, PlayerId};
use crate::undo::{UndoBuilder, UnregisterRef};

use super::step::{FlagKey, StatKey, UndoAction, WorldStep};
use super::World;

impl World {
    /// Bring every aura's target set up to date.
    pub fn refresh_auras(&mut self) -> UndoAction {
        let mut undo = UndoBuilder::new();
        for id in self.auras.ids() {
            let Some(aura) = self.auras.get(id) else {
                continue;
            };
            let reach = self.aura_wanted(aura);
            let lapsed: Vec<EntityId> = aura.spent.difference(&reach).copied().collect();
            let wanted: BTreeSet<EntityId> = reach.difference(&aura.spent).copied().collect();
            let stale: Vec<(EntityId, UnregisterRef)> = aura
                .applied
                .iter()
                .filter(|(target, _)| !wanted.contains(target))
                .map(|(&target, &handle)| (target, handle))
                .collect();
            let fresh: Vec<EntityId> = wanted
                .into_iter()
                .filter(|target| !aura.applied.contains_key(target))
                .collect();
            let effect = aura.def.effect;

            for target in lapsed {
                if let Some(active) = self.auras.get_mut(id) {
                    active.spent.remove(&target);
                }
                undo.push_step(WorldStep::AuraSpentLapsed { aura: id, target });
            }
            if stale.is_empty() && fresh.is_empty() {
                continue;
            }
            tracing::debug!(aura = %id, removed = stale.len(), added = fresh.len(), "aura targets changed");

            for (target, handle) in stale {
                if let Some(active) = self.auras.get_mut(id) {
                    active.applied.remove(&target);
                }
                undo.push_step(WorldStep::AuraTargetRemoved {
                    aura: id,
                    target,
                    handle,
                });
                undo.push(self.unregister(handle));
            }

            for target in fresh {
                let handle = match effect {
                    AuraEffect::Stat { stat, buff } => {
                        self.add_stat_buff(StatKey::new(target, stat), Layer::Aura, buff)
                    }
                    AuraEffect::Keyword { keyword, buff } => {
                        self.add_flag_buff(FlagKey::new(target, keyword), Layer::Aura, buff)
                    }
                };
                let Some(handle) = handle else {
                    continue;
                };
                undo.push(self.registration_undo(handle));
                if let Some(active) = self.auras.get_mut(id) {
                    active.applied.insert(target, handle);
                }
                undo.push_step(WorldStep::AuraTargetAdded { aura: id, target });
            }
        }
        undo.finish()
    }

    fn aura_wanted(&self, aura: &ActiveAura) -> BTreeSet<EntityId> {
        if !self.exists(aura.source) || !self.aura_condition(&aura.def.condition, aura.source, aura.owner) {
            return BTreeSet::new();
        }
        self.aura_targets(aura.def.targets, aura.source, aura.owner)
    }

    fn aura_condition(&self, condition: &AuraCondition, source: EntityId, owner: PlayerId) -> bool {
        match condition {
            AuraCondition::Always => true,
            AuraCondition::SourceDamaged => self.is_damaged(source),
            AuraCondition::OwnerHasWeapon => self.weapon_of(owner).is_some(),
            AuraCondition::OwnersTurn => self.turn.started && self.turn.active == owner,
            AuraCondition::HandSizeAtLeast(size) => self.hand(owner).len() >= *size,
            AuraCondition::All(conditions) => conditions
                .iter()
                .all(|c| self.aura_condition(c, source, owner)),
        }
    }

    fn aura_targets(&self, targets: AuraTargets, source: EntityId, owner: PlayerId) -> BTreeSet<EntityId> {
        match targets {
            AuraTargets::SelfOnly => std::iter::once(source).collect(),
            AuraTargets::FriendlyMinions { exclude_self } => self
                .board(owner)
                .iter()
                .copied()
                .filter(|&m| !exclude_self || m != source)
                .collect(),
            AuraTargets::EnemyMinions => self
                .living_opponents(owner)
                .flat_map(|p| self.board(p).iter().copied())
                .collect(),
            AuraTargets::AllMinions => self.all_minions().collect(),
            AuraTargets::AdjacentMinions => self.adjacent_minions(source).into_iter().collect(),
            AuraTargets::FriendlyHero => std::iter::once(EntityId::hero(owner)).collect(),
            AuraTargets::FriendlyHand => self.hand(owner).iter().copied().collect(),
            AuraTargets::FriendlyWeapon => self.weapon_of(owner).into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::buffs::{AuraDef, IntBuff};
    use crate::cards::Stat;
    use crate::core::PlayerId;
    use crate::world::testing::{minion_card, world_with_minion};

    use super::*;

    fn adjacent_attack() -> AuraDef {
        AuraDef::new(
            AuraTargets::AdjacentMinions,
            AuraEffect::Stat {
                stat: Stat::Attack,
                buff: IntBuff::Add(1),
            },
        )
    }

    #[test]
    fn test_aura_follows_board_changes() {
        let (mut world, leader) = world_with_minion(minion_card(1, 2, 2));
        let handle = world.register_aura(leader, adjacent_attack());
        let _ = world.refresh_auras();
        assert_eq!(world.auras().iter().next().map(|a| a.applied.len()), Some(0));

        let undo = world.summon_minion(PlayerId::new(0), minion_card(1, 2, 2).id, None);
        let neighbour = world.board(PlayerId::new(0))[1];
        let refresh = world.refresh_auras();
        assert_eq!(world.stat(neighbour, Stat::Attack), Some(3));
        assert_eq!(world.stat(leader, Stat::Attack), Some(2));

        refresh.undo(&mut world);
        undo.undo(&mut world);
        assert_eq!(world.board(PlayerId::new(0)).len(), 1);
        assert!(world.registrations().is_registered(handle));
        assert!(world.auras().iter().all(|a| a.applied.is_empty()));
    }

    #[test]
    fn test_unregistered_aura_strips_targets() {
        let (mut world, leader) = world_with_minion(minion_card(1, 1, 1));
        let _ = world.summon_minion(PlayerId::new(0), minion_card(1, 1, 1).id, None);
        let neighbour = world.board(PlayerId::new(0))[1];
        let handle = world.register_aura(leader, adjacent_attack());
        let _ = world.refresh_auras();
        assert_eq!(world.stat(neighbour, Stat::Attack), Some(2));

        let undo = world.unregister(handle);
        assert_eq!(world.stat(neighbour, Stat::Attack), Some(1));
        assert!(world.auras().is_empty());

        undo.undo(&mut world);
        assert_eq!(world.stat(neighbour, Stat::Attack), Some(2));
        assert!(world.refresh_auras().is_noop());
    }
}
