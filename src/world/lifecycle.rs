//! Entities entering and leaving play.
//!
//! Summoning is a completable event: `MinionSummoned` listeners see the
//! minion in its start phase, the summoning action (a battlecry, say)
//! resolves, and only then do the held-back done phases run.

use std::rc::Rc;

use crate::cards::{CardDefinition, CardId};
use crate::core::{EntityId, PlayerId};
use crate::events::{complete, start_event, trigger_event, EventKind, GameEvent};
use crate::undo::UndoBuilder;

use super::entities::{Card, Minion, Weapon};
use super::step::{UndoAction, WorldStep};
use super::World;

impl World {
    /// Summon a fresh copy of `card` for `player` at `position` (the right
    /// end when `None`). Does nothing on a full board or for a card that is
    /// not a minion.
    pub fn summon_minion(&mut self, player: PlayerId, card: CardId, position: Option<usize>) -> UndoAction {
        let cards = Rc::clone(&self.cards);
        let Some(def) = cards.get(card).filter(|def| def.is_minion()) else {
            return UndoAction::NoOp;
        };
        if !self.has_board_space(player) {
            return UndoAction::NoOp;
        }
        let (id, allocated) = self.alloc_entity();
        allocated.then(self.summon_minion_with(player, id, def, position, |_, _| UndoAction::NoOp))
    }

    /// Put a minion with a known id into play.
    ///
    /// `resolve` runs between the start and the done phase of the summon
    /// event. Nothing happens on a full board.
    pub(crate) fn summon_minion_with<F>(
        &mut self,
        player: PlayerId,
        id: EntityId,
        def: &CardDefinition,
        position: Option<usize>,
        resolve: F,
    ) -> UndoAction
    where
        F: FnOnce(&mut World, EntityId) -> UndoAction,
    {
        if !self.has_board_space(player) {
            return UndoAction::NoOp;
        }
        let Some(minion) = Minion::from_definition(id, player, def) else {
            return UndoAction::NoOp;
        };
        let board = &mut self.players[player].board;
        let index = position.unwrap_or(board.len()).min(board.len());
        board.insert(index, id);
        self.minions.insert(id, minion);
        tracing::debug!(%id, card = %def.id, %player, index, "minion summoned");

        let mut undo = UndoBuilder::new();
        undo.push_step(WorldStep::MinionSpawned(id));
        undo.push(self.activate_passives(id));

        let (started, pending) = start_event(self, GameEvent::for_card(EventKind::MinionSummoned, id, player));
        undo.push(started);
        undo.push(resolve(self, id));
        undo.push(complete(self, pending));
        undo.finish()
    }

    #[must_use]
    pub fn has_board_space(&self, player: PlayerId) -> bool {
        self.players[player].board.len() < self.config.max_board_size
    }

    /// Draw the top card of `player`'s deck.
    ///
    /// An empty deck deals increasing fatigue damage to the hero instead.
    /// A card drawn into a full hand is burned.
    pub fn draw_card(&mut self, player: PlayerId) -> UndoAction {
        if self.players[player].eliminated {
            return UndoAction::NoOp;
        }
        let mut undo = UndoBuilder::new();
        let Some(card) = self.players[player].deck.pop() else {
            let previous = self.players[player].fatigue;
            self.players[player].fatigue += 1;
            undo.push_step(WorldStep::Fatigue { player, previous });
            tracing::debug!(%player, damage = previous + 1, "fatigue");
            undo.push(self.deal_damage(None, EntityId::hero(player), previous + 1));
            return undo.finish();
        };
        undo.push_step(WorldStep::DeckPopped { player, card });

        if self.players[player].hand.len() >= self.config.max_hand_size {
            self.players[player].graveyard.push(card);
            undo.push_step(WorldStep::GraveyardPushed(player));
            tracing::debug!(%player, %card, "card burned");
            return undo.finish();
        }

        let cards = Rc::clone(&self.cards);
        let Some(def) = cards.get(card) else {
            return undo.finish();
        };
        let (id, allocated) = self.alloc_entity();
        undo.push(allocated);
        self.players[player].hand.push(id);
        self.hand_cards.insert(id, Card::new(id, player, def));
        undo.push_step(WorldStep::HandPushed(player));
        tracing::trace!(%player, %card, %id, "card drawn");

        undo.push(trigger_event(
            self,
            true,
            GameEvent::for_card(EventKind::CardDrawn, id, player),
        ));
        undo.finish()
    }

    /// Take a card out of a hand, returning it with its undo.
    pub(crate) fn take_from_hand(&mut self, player: PlayerId, card: EntityId) -> Option<(Card, UndoAction)> {
        let index = self.players[player].hand.iter().position(|&c| c == card)?;
        let taken = self.hand_cards.remove(&card)?;
        self.players[player].hand.remove(index);
        let undo = UndoAction::step(WorldStep::HandRemoved {
            player,
            index,
            card: Box::new(taken.clone()),
        });
        Some((taken, undo))
    }

    /// Equip a weapon with a known id, destroying the current one.
    pub(crate) fn equip_weapon(&mut self, player: PlayerId, id: EntityId, def: &CardDefinition) -> UndoAction {
        let Some(weapon) = Weapon::from_definition(id, def) else {
            return UndoAction::NoOp;
        };
        let mut undo = UndoBuilder::new();
        undo.push(self.destroy_weapon(player));
        self.players[player].weapon = Some(weapon);
        undo.push_step(WorldStep::WeaponSet {
            player,
            previous: None,
        });
        undo.push(self.activate_passives(id));
        tracing::debug!(%player, %id, card = %def.id, "weapon equipped");
        undo.finish()
    }

    /// Remove `player`'s weapon into the graveyard. Raises
    /// `WeaponDestroyed`.
    pub(crate) fn destroy_weapon(&mut self, player: PlayerId) -> UndoAction {
        let Some(id) = self.weapon_of(player) else {
            return UndoAction::NoOp;
        };
        let mut undo = UndoBuilder::new();
        undo.push(self.deactivate_all(id));
        let Some(weapon) = self.players[player].weapon.take() else {
            return undo.finish();
        };
        self.players[player].graveyard.push(weapon.card);
        undo.push_step(WorldStep::WeaponSet {
            player,
            previous: Some(Box::new(weapon)),
        });
        undo.push_step(WorldStep::GraveyardPushed(player));
        tracing::debug!(%player, %id, "weapon destroyed");
        undo.push(trigger_event(
            self,
            true,
            GameEvent::for_card(EventKind::WeaponDestroyed, id, player),
        ));
        undo.finish()
    }

    /// Take a minion out of play into its owner's graveyard.
    pub(crate) fn remove_minion(&mut self, id: EntityId) -> UndoAction {
        let Some(index) = self.board_position(id) else {
            return UndoAction::NoOp;
        };
        let mut undo = UndoBuilder::new();
        undo.push(self.deactivate_all(id));
        let Some(minion) = self.minions.remove(&id) else {
            return undo.finish();
        };
        let owner = minion.owner;
        self.players[owner].board.remove(index);
        self.players[owner].graveyard.push(minion.card);
        undo.push_step(WorldStep::MinionRemoved {
            minion: Box::new(minion),
            index,
        });
        undo.push_step(WorldStep::GraveyardPushed(owner));
        undo.finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::abilities::AbilityDef;
    use crate::cards::Stat;
    use crate::effects::{Effect, Target};
    use crate::events::{EventFilter, EventKind};
    use crate::world::testing::{minion_card, world_with_cards, world_with_minion};

    use super::*;

    #[test]
    fn test_summon_respects_board_limit() {
        let (mut world, _) = world_with_minion(minion_card(1, 1, 1));
        let p0 = PlayerId::new(0);
        for _ in 1..world.config().max_board_size {
            let _ = world.summon_minion(p0, CardId::new(1), None);
        }
        assert!(!world.has_board_space(p0));
        assert!(world.summon_minion(p0, CardId::new(1), None).is_noop());
    }

    #[test]
    fn test_summon_undo_rewinds_ids() {
        let (mut world, _) = world_with_minion(minion_card(1, 1, 1));
        let next = world.allocator.peek();
        let undo = world.summon_minion(PlayerId::new(0), CardId::new(1), Some(0));
        assert_eq!(world.board(PlayerId::new(0))[0], next);

        undo.undo(&mut world);
        assert_eq!(world.allocator.peek(), next);
        assert!(world.minion(next).is_none());
    }

    #[test]
    fn test_draw_fatigue_and_burn() {
        let mut world = world_with_cards(vec![minion_card(1, 1, 1)], vec![vec![CardId::new(1)], vec![]]);
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);

        let drawn = world.draw_card(p0);
        assert_eq!(world.hand(p0).len(), 1);
        assert_eq!(world.card_cost(world.hand(p0)[0]), Some(1));

        let _ = world.draw_card(p1);
        let _ = world.draw_card(p1);
        assert_eq!(world.health_of(EntityId::hero(p1)), Some(27));
        assert_eq!(world.player(p1).fatigue, 2);

        drawn.undo(&mut world);
        assert!(world.hand(p0).is_empty());
        assert_eq!(world.player(p0).deck, vec![CardId::new(1)]);
    }

    #[test]
    fn test_removed_minion_stops_listening() {
        let card = minion_card(1, 1, 1).with_ability(AbilityDef::triggered(
            EventKind::TurnEnded,
            EventFilter::Always,
            Effect::add_stat(Target::Source, Stat::Attack, 1),
        ));
        let (mut world, minion) = world_with_minion(card);
        assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 1);

        let undo = world.remove_minion(minion);
        assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 0);
        assert_eq!(world.player(PlayerId::new(0)).graveyard, vec![CardId::new(1)]);

        undo.undo(&mut world);
        assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 1);
        assert!(world.minion(minion).unwrap().abilities.is_active());
    }
}
