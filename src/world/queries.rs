//! Read-only queries over the world.

use crate::cards::{ChosenTarget, Keyword, Stat};
use crate::core::{EntityId, PlayerId};
use crate::effects::{EffectContext, TargetSelector, Targets};
use crate::events::{EntityLookup, GameEvent};

use super::entities::Minion;
use super::step::FlagKey;
use super::World;

impl World {
    /// Whether `entity` is a living hero, a minion in play, a card in a
    /// hand or an equipped weapon.
    #[must_use]
    pub fn exists(&self, entity: EntityId) -> bool {
        if self.is_hero(entity) {
            return self.hero_alive(entity);
        }
        self.minions.contains_key(&entity)
            || self.hand_cards.contains_key(&entity)
            || self.owner_of(entity).is_some()
    }

    #[must_use]
    pub fn hero_alive(&self, hero: EntityId) -> bool {
        hero.as_hero(self.player_count())
            .is_some_and(|p| !self.players[p].eliminated && self.players[p].hero.vitals.health > 0)
    }

    /// A living hero or a minion in play.
    #[must_use]
    pub fn is_character(&self, entity: EntityId) -> bool {
        self.minions.contains_key(&entity) || self.hero_alive(entity)
    }

    #[must_use]
    pub fn has_keyword(&self, entity: EntityId, keyword: Keyword) -> bool {
        self.flag_ref(FlagKey::new(entity, keyword))
            .is_some_and(|flag| flag.value())
    }

    /// Minions of `player`, left to right.
    #[must_use]
    pub fn board(&self, player: PlayerId) -> &[EntityId] {
        &self.players[player].board
    }

    /// Cards in the hand of `player`, left to right.
    #[must_use]
    pub fn hand(&self, player: PlayerId) -> &[EntityId] {
        &self.players[player].hand
    }

    /// Every minion in play, by seat and then board position.
    pub fn all_minions(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.players
            .iter()
            .flat_map(|(_, player)| player.board.iter().copied())
    }

    /// Position of a minion on its owner's board.
    #[must_use]
    pub fn board_position(&self, minion: EntityId) -> Option<usize> {
        let owner = self.minions.get(&minion)?.owner;
        self.players[owner].board.iter().position(|&m| m == minion)
    }

    /// Minions directly left and right of `minion`.
    #[must_use]
    pub fn adjacent_minions(&self, minion: EntityId) -> Targets {
        let mut adjacent = Targets::new();
        let (Some(index), Some(owner)) = (self.board_position(minion), self.owner_of(minion)) else {
            return adjacent;
        };
        let board = self.board(owner);
        if index > 0 {
            adjacent.push(board[index - 1]);
        }
        if let Some(&right) = board.get(index + 1) {
            adjacent.push(right);
        }
        adjacent
    }

    #[must_use]
    pub fn weapon_of(&self, player: PlayerId) -> Option<EntityId> {
        self.players[player].weapon.as_ref().map(|w| w.id)
    }

    /// Seats still in the game, in seat order.
    pub fn living_players(&self) -> impl Iterator<Item = PlayerId> + '_ {
        PlayerId::all(self.player_count()).filter(|&p| !self.players[p].eliminated)
    }

    /// Opponents of `player` still in the game.
    pub fn living_opponents(&self, player: PlayerId) -> impl Iterator<Item = PlayerId> + '_ {
        player
            .opponents(self.player_count())
            .filter(|&p| !self.players[p].eliminated)
    }

    /// The winner, once a single seat remains.
    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        let mut living = self.living_players();
        match (living.next(), living.next()) {
            (Some(winner), None) if self.player_count() > 1 => Some(winner),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.living_players().count() <= 1 && self.player_count() > 1
    }

    /// Attack a character strikes with. Heroes add their weapon's attack.
    #[must_use]
    pub fn attack_of(&self, character: EntityId) -> i32 {
        if let Some(player) = character.as_hero(self.player_count()) {
            let state = &self.players[player];
            let weapon = state.weapon.as_ref().map_or(0, |w| w.attack.value());
            return (state.hero.attack.value() + weapon).max(0);
        }
        self.stat(character, Stat::Attack).unwrap_or(0).max(0)
    }

    /// Current health of a character.
    #[must_use]
    pub fn health_of(&self, character: EntityId) -> Option<i32> {
        if let Some(player) = character.as_hero(self.player_count()) {
            return Some(self.players[player].hero.vitals.health);
        }
        self.minions.get(&character).map(|m| m.current_health())
    }

    #[must_use]
    pub fn minion_attack(&self, minion: EntityId) -> Option<i32> {
        self.minions.get(&minion).map(|m| m.attack.value().max(0))
    }

    #[must_use]
    pub fn minion_health(&self, minion: EntityId) -> Option<i32> {
        self.minions.get(&minion).map(Minion::current_health)
    }

    #[must_use]
    pub fn hero_health(&self, player: PlayerId) -> i32 {
        self.players[player].hero.vitals.health
    }

    /// Whether a character has taken damage it has not healed.
    #[must_use]
    pub fn is_damaged(&self, character: EntityId) -> bool {
        if let Some(player) = character.as_hero(self.player_count()) {
            let hero = &self.players[player].hero;
            return hero.vitals.health < hero.max_health;
        }
        self.minions.get(&character).is_some_and(|m| m.damage > 0)
    }

    /// Mana cost of a card in hand after every modifier, never negative.
    #[must_use]
    pub fn card_cost(&self, card: EntityId) -> Option<i32> {
        self.hand_cards.get(&card).map(|c| c.cost.value().max(0))
    }

    /// Characters `chooser` may aim a card requiring `requirement` at.
    #[must_use]
    pub fn valid_targets(&self, chooser: PlayerId, requirement: ChosenTarget) -> Vec<EntityId> {
        self.living_players()
            .map(EntityId::hero)
            .chain(self.all_minions())
            .filter(|&c| TargetSelector::is_valid_choice(self, chooser, requirement, c))
            .collect()
    }

    /// Context for resolving an effect on behalf of `owner` in response to
    /// `event`. `None` once the owner has left play.
    #[must_use]
    pub fn effect_context(&self, owner: EntityId, event: &GameEvent) -> Option<EffectContext> {
        let controller = self.owner_of(owner)?;
        Some(EffectContext::new(owner, controller).with_event(event.clone()))
    }
}

#[cfg(test)]
mod tests {
    use crate::core::PlayerId;
    use crate::events::EventKind;
    use crate::world::testing::{minion_card, world_with_minion};

    use super::*;

    #[test]
    fn test_adjacency_and_positions() {
        let (mut world, first) = world_with_minion(minion_card(1, 1, 1));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, minion_card(1, 1, 1).id, None);
        let _ = world.summon_minion(p0, minion_card(1, 1, 1).id, None);
        let board = world.board(p0).to_vec();

        assert_eq!(world.board_position(board[2]), Some(2));
        assert_eq!(world.adjacent_minions(board[1]).to_vec(), vec![first, board[2]]);
        assert_eq!(world.adjacent_minions(first).to_vec(), vec![board[1]]);
        assert_eq!(world.all_minions().count(), 3);
        assert_eq!(world.minion_attack(first), Some(1));
        assert_eq!(world.minion_health(board[2]), Some(1));
    }

    #[test]
    fn test_effect_context_needs_live_owner() {
        let (world, minion) = world_with_minion(minion_card(1, 1, 1));
        let event = GameEvent::for_player(EventKind::TurnEnded, PlayerId::new(0));
        let ctx = world.effect_context(minion, &event).unwrap();
        assert_eq!(ctx.owner, PlayerId::new(0));
        assert_eq!(ctx.source, minion);
        assert!(world.effect_context(EntityId(999), &event).is_none());
    }

    #[test]
    fn test_heroes_exist_until_eliminated() {
        let (world, _) = world_with_minion(minion_card(1, 1, 1));
        let hero = EntityId::hero(PlayerId::new(1));
        assert!(world.exists(hero));
        assert!(world.hero_alive(hero));
        assert_eq!(world.living_opponents(PlayerId::new(0)).count(), 1);
        assert_eq!(world.winner(), None);
    }

    #[test]
    fn test_valid_targets_by_requirement() {
        let (world, minion) = world_with_minion(minion_card(1, 1, 1));
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        assert_eq!(world.valid_targets(p0, ChosenTarget::FriendlyMinion), vec![minion]);
        assert_eq!(world.valid_targets(p1, ChosenTarget::EnemyCharacter), vec![EntityId::hero(p0), minion]);
        assert!(world.valid_targets(p1, ChosenTarget::FriendlyMinion).is_empty());
        assert!(world.is_character(minion));
        assert!(!world.is_character(EntityId(999)));
    }
}
