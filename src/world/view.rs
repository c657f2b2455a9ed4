//! Observable snapshots of the world.
//!
//! A [`WorldView`] captures everything a player or a test can observe:
//! every entity's effective values, zone contents in order, listener order
//! per event kind, aura reach, the RNG position and the next entity id.
//! Two worlds with equal views behave identically from then on.
//!
//! Internal counters that undo deliberately leaves alone (listener
//! sequence numbers, registration handles, aura ids) are not part of the
//! view.

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, Keyword};
use crate::core::{EntityId, GameRngState, PlayerId};
use crate::events::EventKind;

use super::entities::{CombatState, ManaState, TurnState};
use super::World;

/// Snapshot of a whole world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldView {
    pub turn: TurnState,
    pub players: Vec<PlayerView>,
    /// Listeners of every kind that has any, in dispatch order.
    pub listeners: Vec<ChannelView>,
    /// Registration handles currently registered.
    pub registrations: usize,
    pub auras: Vec<AuraView>,
    pub rng: GameRngState,
    pub next_entity: EntityId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub player: PlayerId,
    pub hero: HeroView,
    pub mana: ManaState,
    pub hand: Vec<CardView>,
    /// Top card last.
    pub deck: Vec<CardId>,
    pub board: Vec<MinionView>,
    pub graveyard: Vec<CardId>,
    pub weapon: Option<WeaponView>,
    pub fatigue: i32,
    pub eliminated: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroView {
    pub health: i32,
    pub armor: i32,
    /// Attack including the weapon.
    pub attack: i32,
    pub keywords: Vec<Keyword>,
    pub combat: CombatState,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: EntityId,
    pub card: CardId,
    pub cost: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinionView {
    pub id: EntityId,
    pub card: CardId,
    pub attack: i32,
    pub health: i32,
    pub max_health: i32,
    pub keywords: Vec<Keyword>,
    pub combat: CombatState,
    pub doomed: bool,
    pub has_deathrattle: bool,
    pub active_abilities: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeaponView {
    pub id: EntityId,
    pub card: CardId,
    pub attack: i32,
    pub durability: i32,
    pub active_abilities: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelView {
    pub kind: EventKind,
    /// `(priority, owner)` per listener, in dispatch order.
    pub order: Vec<(i32, EntityId)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraView {
    pub source: EntityId,
    pub owner: PlayerId,
    /// Entities carrying the aura's modifier.
    pub targets: Vec<EntityId>,
    /// Entities in reach that used up the keyword it grants.
    pub spent: Vec<EntityId>,
}

impl World {
    /// Snapshot everything observable.
    #[must_use]
    pub fn view(&self) -> WorldView {
        WorldView {
            turn: self.turn,
            players: self
                .players
                .iter()
                .map(|(player, _)| self.player_view(player))
                .collect(),
            listeners: EventKind::ALL
                .into_iter()
                .filter_map(|kind| {
                    let order: Vec<(i32, EntityId)> = self
                        .bus
                        .snapshot(kind)
                        .iter()
                        .map(|(key, entry)| (key.priority(), entry.owner))
                        .collect();
                    (!order.is_empty()).then_some(ChannelView { kind, order })
                })
                .collect(),
            registrations: self.registrations.registered_count(),
            auras: self
                .auras
                .iter()
                .map(|aura| AuraView {
                    source: aura.source,
                    owner: aura.owner,
                    targets: aura.applied.keys().copied().collect(),
                    spent: aura.spent.iter().copied().collect(),
                })
                .collect(),
            rng: self.rng.state(),
            next_entity: self.allocator.peek(),
        }
    }

    fn player_view(&self, player: PlayerId) -> PlayerView {
        let state = &self.players[player];
        let hero = EntityId::hero(player);
        PlayerView {
            player,
            hero: HeroView {
                health: state.hero.vitals.health,
                armor: state.hero.vitals.armor,
                attack: self.attack_of(hero),
                keywords: state.hero.keywords.active(),
                combat: state.hero.combat,
            },
            mana: state.mana,
            hand: state
                .hand
                .iter()
                .filter_map(|id| self.hand_cards.get(id))
                .map(|card| CardView {
                    id: card.id,
                    card: card.card,
                    cost: card.cost.value().max(0),
                })
                .collect(),
            deck: state.deck.clone(),
            board: state
                .board
                .iter()
                .filter_map(|id| self.minions.get(id))
                .map(|minion| MinionView {
                    id: minion.id,
                    card: minion.card,
                    attack: minion.attack.value().max(0),
                    health: minion.current_health(),
                    max_health: minion.health.value(),
                    keywords: minion.keywords.active(),
                    combat: minion.combat,
                    doomed: minion.doomed,
                    has_deathrattle: minion.deathrattle.is_some(),
                    active_abilities: minion.abilities.active_count(),
                })
                .collect(),
            graveyard: state.graveyard.clone(),
            weapon: state.weapon.as_ref().map(|weapon| WeaponView {
                id: weapon.id,
                card: weapon.card,
                attack: weapon.attack.value(),
                durability: weapon.durability,
                active_abilities: weapon.abilities.active_count(),
            }),
            fatigue: state.fatigue,
            eliminated: state.eliminated,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::buffs::{IntBuff, Layer};
    use crate::cards::Stat;
    use crate::world::testing::{minion_card, world_with_minion};
    use crate::world::StatKey;

    use super::*;

    #[test]
    fn test_view_reflects_buffs_and_undo() {
        let (mut world, minion) = world_with_minion(minion_card(1, 2, 3));
        let before = world.view();
        assert_eq!(before.players[0].board[0].attack, 2);
        assert_eq!(before.players[1].hero.health, 30);

        let handle = world
            .add_stat_buff(StatKey::new(minion, Stat::Attack), Layer::Own, IntBuff::Add(2))
            .unwrap();
        assert_eq!(world.view().players[0].board[0].attack, 4);
        assert_eq!(world.view().registrations, before.registrations + 1);

        world.registration_undo(handle).undo(&mut world);
        assert_eq!(world.view(), before);
    }

    #[test]
    fn test_view_serializes() {
        let (world, _) = world_with_minion(minion_card(1, 1, 1).with_keyword(Keyword::Taunt));
        let json = serde_json::to_string(&world.view()).unwrap();
        let back: WorldView = serde_json::from_str(&json).unwrap();
        assert_eq!(back, world.view());
        assert_eq!(back.players[0].board[0].keywords, vec![Keyword::Taunt]);
    }
}
