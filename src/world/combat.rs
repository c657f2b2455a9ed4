//! Damage, healing and the other character-level mutations effects use.
//!
//! None of these process deaths. A minion at zero health stays on the
//! board, and a hero at zero health stays in the game, until the acting
//! player action settles.

use crate::buffs::{AuraId, Layer};
use crate::cards::{Keyword, Stat};
use crate::core::{EntityId, PlayerId};
use crate::events::{trigger_event, EntityLookup, EventKind, GameEvent};
use crate::undo::{UndoBuilder, UnregisterRef};

use super::step::{lift_flag, lift_stat, FlagKey, StatKey, UndoAction, WorldStep};
use super::World;

impl World {
    /// Take away a keyword the character has used up: a popped divine
    /// shield, stealth broken by attacking, a thawed freeze.
    ///
    /// Auras granting the keyword let go of the character and skip it
    /// until it leaves their reach.
    pub fn consume_keyword(&mut self, entity: EntityId, keyword: Keyword) -> UndoAction {
        let mut undo = UndoBuilder::new();
        undo.push(self.add_flag_fast(FlagKey::new(entity, keyword), Layer::Own, Some(false)));
        let granting: Vec<(AuraId, UnregisterRef)> = self
            .auras
            .iter()
            .filter(|aura| aura.grants(keyword))
            .filter_map(|aura| aura.applied.get(&entity).map(|&handle| (aura.id, handle)))
            .collect();
        for (aura, handle) in granting {
            if let Some(active) = self.auras.get_mut(aura) {
                active.applied.remove(&entity);
                active.spent.insert(entity);
            }
            undo.push_step(WorldStep::AuraTargetRemoved {
                aura,
                target: entity,
                handle,
            });
            undo.push_step(WorldStep::AuraTargetSpent { aura, target: entity });
            undo.push(self.unregister(handle));
        }
        tracing::trace!(%entity, %keyword, "keyword consumed");
        undo.finish()
    }

    /// Deal `amount` damage to a character.
    ///
    /// Armor absorbs damage to heroes first. Divine shield absorbs the
    /// whole hit on a minion and is lost. Raises `DamageDealt` for the
    /// damage actually taken.
    pub fn deal_damage(&mut self, source: Option<EntityId>, target: EntityId, amount: i32) -> UndoAction {
        if amount <= 0 {
            return UndoAction::NoOp;
        }
        let mut undo = UndoBuilder::new();
        let dealt = if let Some(player) = target.as_hero(self.player_count()) {
            if !self.hero_alive(target) {
                return UndoAction::NoOp;
            }
            let vitals = &mut self.players[player].hero.vitals;
            let previous = *vitals;
            let absorbed = vitals.armor.min(amount);
            vitals.armor -= absorbed;
            vitals.health -= amount - absorbed;
            undo.push_step(WorldStep::HeroVitals { player, previous });
            amount - absorbed
        } else if self.minions.contains_key(&target) {
            if self.has_keyword(target, Keyword::DivineShield) {
                tracing::trace!(%target, "divine shield popped");
                return self.consume_keyword(target, Keyword::DivineShield);
            }
            let Some(minion) = self.minions.get_mut(&target) else {
                return UndoAction::NoOp;
            };
            let previous = minion.damage;
            minion.damage += amount;
            undo.push_step(WorldStep::MinionDamage {
                minion: target,
                previous,
            });
            amount
        } else {
            return UndoAction::NoOp;
        };

        tracing::trace!(?source, %target, dealt, "damage dealt");
        if dealt > 0 {
            undo.push(trigger_event(
                self,
                true,
                GameEvent::damage(EventKind::DamageDealt, source, target, dealt),
            ));
        }
        undo.finish()
    }

    /// Restore up to `amount` health, never above the maximum. Raises
    /// `Healed` when anything was restored.
    pub fn heal(&mut self, source: Option<EntityId>, target: EntityId, amount: i32) -> UndoAction {
        if amount <= 0 {
            return UndoAction::NoOp;
        }
        let mut undo = UndoBuilder::new();
        let healed = if let Some(player) = target.as_hero(self.player_count()) {
            if !self.hero_alive(target) {
                return UndoAction::NoOp;
            }
            let hero = &mut self.players[player].hero;
            let previous = hero.vitals;
            let healed = amount.min(hero.max_health - hero.vitals.health).max(0);
            hero.vitals.health += healed;
            if healed > 0 {
                undo.push_step(WorldStep::HeroVitals { player, previous });
            }
            healed
        } else if let Some(minion) = self.minions.get_mut(&target) {
            let previous = minion.damage;
            let healed = amount.min(minion.damage);
            minion.damage -= healed;
            if healed > 0 {
                undo.push_step(WorldStep::MinionDamage {
                    minion: target,
                    previous,
                });
            }
            healed
        } else {
            return UndoAction::NoOp;
        };

        if healed > 0 {
            undo.push(trigger_event(
                self,
                true,
                GameEvent::damage(EventKind::Healed, source, target, healed),
            ));
        }
        undo.finish()
    }

    /// Mark an entity for destruction. Minions are removed and weapons
    /// broken when the action settles; heroes drop to zero health.
    pub fn destroy(&mut self, target: EntityId) -> UndoAction {
        if let Some(player) = target.as_hero(self.player_count()) {
            let vitals = &mut self.players[player].hero.vitals;
            let previous = *vitals;
            vitals.health = 0;
            return UndoAction::step(WorldStep::HeroVitals { player, previous });
        }
        if let Some(minion) = self.minions.get_mut(&target) {
            if minion.doomed {
                return UndoAction::NoOp;
            }
            minion.doomed = true;
            tracing::trace!(%target, "minion doomed");
            return UndoAction::step(WorldStep::Doomed(target));
        }
        if let Some(player) = self.owner_of(target) {
            if let Some(weapon) = self.players[player].weapon.as_mut().filter(|w| w.id == target) {
                let previous = weapon.durability;
                weapon.durability = 0;
                return UndoAction::step(WorldStep::WeaponDurability { player, previous });
            }
        }
        UndoAction::NoOp
    }

    /// Freeze a character: it cannot attack until its owner's turn ends.
    pub fn freeze(&mut self, target: EntityId) -> UndoAction {
        self.add_flag_fast(FlagKey::new(target, Keyword::Frozen), Layer::Own, Some(true))
    }

    /// Remove own buffs, printed keywords, abilities and the deathrattle of
    /// a minion. Pre-aura adjustments and aura output are kept.
    pub fn silence(&mut self, target: EntityId) -> UndoAction {
        if !self.minions.contains_key(&target) {
            return UndoAction::NoOp;
        }
        let mut undo = UndoBuilder::new();
        undo.push(self.silence_abilities(target));

        let Some(minion) = self.minions.get_mut(&target) else {
            return undo.finish();
        };
        for (keyword, silenced) in minion.keywords.silence() {
            undo.push(lift_flag(FlagKey::new(target, keyword), silenced));
        }
        for keyword in minion.keywords.printed() {
            let previous = minion.keywords.get_mut(keyword).set_base(false);
            undo.push_step(WorldStep::FlagBase {
                key: FlagKey::new(target, keyword),
                previous,
            });
        }

        let current = minion.current_health();
        undo.push(lift_stat(StatKey::new(target, Stat::Attack), minion.attack.silence()));
        undo.push(lift_stat(StatKey::new(target, Stat::Health), minion.health.silence()));
        let capped = current.min(minion.health.value());
        let damage = minion.health.value() - capped;
        if damage != minion.damage {
            undo.push_step(WorldStep::MinionDamage {
                minion: target,
                previous: minion.damage,
            });
            minion.damage = damage;
        }

        if let Some(effect) = minion.deathrattle.take() {
            undo.push_step(WorldStep::DeathrattleCleared {
                minion: target,
                effect,
            });
        }
        tracing::debug!(%target, "minion silenced");
        undo.finish()
    }

    /// Give a player's hero armor. Raises `ArmorGained`.
    pub fn gain_armor(&mut self, player: PlayerId, amount: i32) -> UndoAction {
        if amount <= 0 || self.players[player].eliminated {
            return UndoAction::NoOp;
        }
        let vitals = &mut self.players[player].hero.vitals;
        let previous = *vitals;
        vitals.armor += amount;
        UndoAction::step(WorldStep::HeroVitals { player, previous }).then(trigger_event(
            self,
            true,
            GameEvent::for_player(EventKind::ArmorGained, player)
                .with_target(EntityId::hero(player))
                .with_amount(amount),
        ))
    }
}

#[cfg(test)]
mod tests {
    use crate::buffs::{AuraCondition, AuraDef, AuraEffect, AuraTargets, FlagBuff};
    use crate::world::testing::{minion_card, world_with_minion};

    use super::*;

    #[test]
    fn test_armor_absorbs_first() {
        let (mut world, _) = world_with_minion(minion_card(1, 1, 1));
        let p1 = PlayerId::new(1);
        let hero = EntityId::hero(p1);
        let armor = world.gain_armor(p1, 3);
        let hit = world.deal_damage(None, hero, 5);
        assert_eq!(world.player(p1).hero.vitals.armor, 0);
        assert_eq!(world.health_of(hero), Some(28));

        hit.undo(&mut world);
        armor.undo(&mut world);
        assert_eq!(world.health_of(hero), Some(30));
        assert_eq!(world.player(p1).hero.vitals.armor, 0);
    }

    #[test]
    fn test_divine_shield_absorbs_a_hit() {
        let (mut world, minion) =
            world_with_minion(minion_card(1, 2, 2).with_keyword(Keyword::DivineShield));
        let popped = world.deal_damage(None, minion, 5);
        assert_eq!(world.health_of(minion), Some(2));
        assert!(!world.has_keyword(minion, Keyword::DivineShield));

        let _ = world.deal_damage(None, minion, 1);
        assert_eq!(world.health_of(minion), Some(1));
        assert!(world.is_damaged(minion));

        popped.undo(&mut world);
        assert!(world.has_keyword(minion, Keyword::DivineShield));
    }

    #[test]
    fn test_heal_caps_at_maximum() {
        let (mut world, minion) = world_with_minion(minion_card(1, 1, 4));
        let _ = world.deal_damage(None, minion, 3);
        let _ = world.heal(None, minion, 10);
        assert_eq!(world.health_of(minion), Some(4));
        assert!(world.heal(None, minion, 1).is_noop());
    }

    #[test]
    fn test_silence_clears_own_layer_and_printed_keywords() {
        let (mut world, minion) = world_with_minion(minion_card(1, 2, 2).with_keyword(Keyword::Taunt));
        let _ = world.add_stat_fast(StatKey::new(minion, Stat::Health), Layer::Own, 2);
        let _ = world.deal_damage(None, minion, 3);
        assert_eq!(world.health_of(minion), Some(1));

        let undo = world.silence(minion);
        assert!(!world.has_keyword(minion, Keyword::Taunt));
        assert_eq!(world.stat(minion, Stat::Health), Some(2));
        assert_eq!(world.health_of(minion), Some(1));

        undo.undo(&mut world);
        assert!(world.has_keyword(minion, Keyword::Taunt));
        assert_eq!(world.stat(minion, Stat::Health), Some(4));
        assert_eq!(world.health_of(minion), Some(1));
    }

    #[test]
    fn test_destroy_marks_minion() {
        let (mut world, minion) = world_with_minion(minion_card(1, 1, 1));
        let undo = world.destroy(minion);
        assert!(world.minion(minion).unwrap().is_dead());
        assert!(world.destroy(minion).is_noop());
        undo.undo(&mut world);
        assert!(!world.minion(minion).unwrap().is_dead());
    }

    fn shield_others() -> AuraDef {
        AuraDef::new(
            AuraTargets::FriendlyMinions { exclude_self: true },
            AuraEffect::Keyword {
                keyword: Keyword::DivineShield,
                buff: FlagBuff::Grant,
            },
        )
    }

    #[test]
    fn test_aura_granted_shield_pops_for_good() {
        let (mut world, shielder) = world_with_minion(minion_card(1, 1, 3));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, minion_card(1, 1, 3).id, None);
        let ward = world.board(p0)[1];
        let _ = world.register_aura(shielder, shield_others());
        let _ = world.refresh_auras();
        assert!(world.has_keyword(ward, Keyword::DivineShield));
        let before = world.view();

        let popped = world.deal_damage(None, ward, 2);
        assert_eq!(world.health_of(ward), Some(3));
        assert!(!world.has_keyword(ward, Keyword::DivineShield));
        assert!(world.refresh_auras().is_noop());
        assert!(!world.has_keyword(ward, Keyword::DivineShield));

        let hit = world.deal_damage(None, ward, 2);
        assert_eq!(world.health_of(ward), Some(1));

        hit.undo(&mut world);
        popped.undo(&mut world);
        assert_eq!(world.view(), before);
        assert!(world.has_keyword(ward, Keyword::DivineShield));
    }

    #[test]
    fn test_spent_keyword_returns_after_leaving_reach() {
        let (mut world, shielder) = world_with_minion(minion_card(1, 1, 3));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, minion_card(1, 1, 3).id, None);
        let ward = world.board(p0)[1];
        let _ = world.register_aura(shielder, shield_others().with_condition(AuraCondition::SourceDamaged));
        let _ = world.deal_damage(None, shielder, 1);
        let _ = world.refresh_auras();
        assert!(world.has_keyword(ward, Keyword::DivineShield));

        let _ = world.deal_damage(None, ward, 1);
        let _ = world.refresh_auras();
        assert!(!world.has_keyword(ward, Keyword::DivineShield));

        // Healing the source takes the ward out of reach; the spent mark lapses.
        let _ = world.heal(None, shielder, 1);
        let lapse = world.refresh_auras();
        assert!(!lapse.is_noop());
        assert!(world.view().auras[0].spent.is_empty());

        let _ = world.deal_damage(None, shielder, 1);
        let _ = world.refresh_auras();
        assert!(world.has_keyword(ward, Keyword::DivineShield));
    }

    #[test]
    fn test_own_shield_still_pops_under_granting_aura() {
        let (mut world, shielder) = world_with_minion(minion_card(1, 1, 3));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, minion_card(1, 1, 3).id, None);
        let ward = world.board(p0)[1];
        let _ = world.add_flag_fast(FlagKey::new(ward, Keyword::DivineShield), Layer::Own, Some(true));
        let _ = world.register_aura(shielder, shield_others());
        let _ = world.refresh_auras();

        let _ = world.deal_damage(None, ward, 2);
        let _ = world.refresh_auras();
        assert!(!world.has_keyword(ward, Keyword::DivineShield));
        let _ = world.deal_damage(None, ward, 2);
        assert_eq!(world.health_of(ward), Some(1));
    }
}
