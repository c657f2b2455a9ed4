//! World undo steps.
//!
//! Every primitive world mutation records one [`WorldStep`] holding what
//! is needed to put the previous state back. Steps never trigger events,
//! refresh auras or allocate; they only restore captured state.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityRef;
use crate::buffs::{ActiveAura, AuraId, BuffId, Layer, LayerEdit};
use crate::cards::{CardId, Keyword, Stat};
use crate::core::{EntityId, GameRngState, PlayerId};
use crate::effects::Effect;
use crate::events::{EventKind, ListenerEntry, ListenerKey};
use crate::undo::{Reversible, Revert, UnregisterRef};

use super::entities::{Card, CombatState, ManaState, Minion, TurnState, Vitals, Weapon};
use super::World;

/// Undo of a world mutation.
pub type UndoAction = Reversible<WorldStep>;

/// Address of an integer attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StatKey {
    pub entity: EntityId,
    pub stat: Stat,
}

impl StatKey {
    pub const fn new(entity: EntityId, stat: Stat) -> Self {
        Self { entity, stat }
    }
}

/// Address of a keyword flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlagKey {
    pub entity: EntityId,
    pub keyword: Keyword,
}

impl FlagKey {
    pub const fn new(entity: EntityId, keyword: Keyword) -> Self {
        Self { entity, keyword }
    }
}

/// What a registration handle points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    Listener { kind: EventKind, key: ListenerKey },
    Stat { key: StatKey, layer: Layer, id: BuffId },
    Flag { key: FlagKey, layer: Layer, id: BuffId },
    Aura(AuraId),
    /// Children registered together, unregistered newest first.
    Group(Vec<UnregisterRef>),
    /// Registers nothing.
    Inert,
}

/// Inverse of one primitive world mutation.
#[derive(Clone, Debug)]
pub enum WorldStep {
    // Registrations
    Revoke(UnregisterRef),
    MarkRegistered(UnregisterRef),
    ReattachListener {
        kind: EventKind,
        key: ListenerKey,
        entry: ListenerEntry<World>,
    },
    ReattachAura(Box<ActiveAura>),
    AuraTargetAdded {
        aura: AuraId,
        target: EntityId,
    },
    AuraTargetRemoved {
        aura: AuraId,
        target: EntityId,
        handle: UnregisterRef,
    },
    AuraTargetSpent {
        aura: AuraId,
        target: EntityId,
    },
    AuraSpentLapsed {
        aura: AuraId,
        target: EntityId,
    },

    // Properties
    Stat(StatKey, LayerEdit<i32>),
    Flag(FlagKey, LayerEdit<bool>),
    FlagBase {
        key: FlagKey,
        previous: bool,
    },

    // Abilities
    PassivesActivated(EntityId),
    PassivesDeactivated {
        entity: EntityId,
        refs: Vec<UnregisterRef>,
    },
    AbilityGranted(EntityId),
    ActiveRefPushed(EntityId),
    AbilitiesCleared {
        entity: EntityId,
        abilities: Vec<AbilityRef>,
    },

    // Minions
    Allocated(u32),
    MinionSpawned(EntityId),
    MinionRemoved {
        minion: Box<Minion>,
        index: usize,
    },
    MinionDamage {
        minion: EntityId,
        previous: i32,
    },
    MinionCombat {
        minion: EntityId,
        previous: CombatState,
    },
    Doomed(EntityId),
    DeathrattleCleared {
        minion: EntityId,
        effect: Effect,
    },

    // Heroes and players
    HeroVitals {
        player: PlayerId,
        previous: Vitals,
    },
    HeroCombat {
        player: PlayerId,
        previous: CombatState,
    },
    Mana {
        player: PlayerId,
        previous: ManaState,
    },
    Fatigue {
        player: PlayerId,
        previous: i32,
    },
    Eliminated(PlayerId),

    // Zones
    DeckPopped {
        player: PlayerId,
        card: CardId,
    },
    DeckShuffled {
        player: PlayerId,
        previous: Vec<CardId>,
    },
    HandPushed(PlayerId),
    HandRemoved {
        player: PlayerId,
        index: usize,
        card: Box<Card>,
    },
    GraveyardPushed(PlayerId),
    WeaponSet {
        player: PlayerId,
        previous: Option<Box<Weapon>>,
    },
    WeaponDurability {
        player: PlayerId,
        previous: i32,
    },

    // Global
    Turn(TurnState),
    Rng(GameRngState),
    Veto(bool),
}

impl Revert<World> for WorldStep {
    fn revert(self, world: &mut World) {
        match self {
            WorldStep::Revoke(handle) => world.revoke(handle),
            WorldStep::MarkRegistered(handle) => world.registrations.mark_registered(handle),
            WorldStep::ReattachListener { kind, key, entry } => world.bus.insert(kind, key, entry),
            WorldStep::ReattachAura(aura) => world.auras.restore(*aura),
            WorldStep::AuraTargetAdded { aura, target } => {
                if let Some(active) = world.auras.get_mut(aura) {
                    active.applied.remove(&target);
                }
            }
            WorldStep::AuraTargetRemoved {
                aura,
                target,
                handle,
            } => {
                if let Some(active) = world.auras.get_mut(aura) {
                    active.applied.insert(target, handle);
                }
            }
            WorldStep::AuraTargetSpent { aura, target } => {
                if let Some(active) = world.auras.get_mut(aura) {
                    active.spent.remove(&target);
                }
            }
            WorldStep::AuraSpentLapsed { aura, target } => {
                if let Some(active) = world.auras.get_mut(aura) {
                    active.spent.insert(target);
                }
            }

            WorldStep::Stat(key, edit) => {
                if let Some(property) = world.stat_mut(key) {
                    edit.revert(property);
                }
            }
            WorldStep::Flag(key, edit) => {
                if let Some(property) = world.flag_mut(key) {
                    edit.revert(property);
                }
            }
            WorldStep::FlagBase { key, previous } => {
                if let Some(property) = world.flag_mut(key) {
                    property.set_base(previous);
                }
            }

            WorldStep::PassivesActivated(entity) => {
                if let Some(holder) = world.holder_mut(entity) {
                    holder.active = None;
                }
            }
            WorldStep::PassivesDeactivated { entity, refs } => {
                if let Some(holder) = world.holder_mut(entity) {
                    holder.active = Some(refs);
                }
            }
            WorldStep::AbilityGranted(entity) => {
                if let Some(holder) = world.holder_mut(entity) {
                    holder.abilities.pop();
                }
            }
            WorldStep::ActiveRefPushed(entity) => {
                if let Some(refs) = world.holder_mut(entity).and_then(|h| h.active.as_mut()) {
                    refs.pop();
                }
            }
            WorldStep::AbilitiesCleared { entity, abilities } => {
                if let Some(holder) = world.holder_mut(entity) {
                    holder.abilities = abilities;
                }
            }

            WorldStep::Allocated(previous) => world.allocator.rewind(previous),
            WorldStep::MinionSpawned(id) => {
                if let Some(minion) = world.minions.remove(&id) {
                    world.players[minion.owner].board.retain(|&m| m != id);
                }
            }
            WorldStep::MinionRemoved { minion, index } => {
                world.players[minion.owner].board.insert(index, minion.id);
                world.minions.insert(minion.id, *minion);
            }
            WorldStep::MinionDamage { minion, previous } => {
                if let Some(m) = world.minions.get_mut(&minion) {
                    m.damage = previous;
                }
            }
            WorldStep::MinionCombat { minion, previous } => {
                if let Some(m) = world.minions.get_mut(&minion) {
                    m.combat = previous;
                }
            }
            WorldStep::Doomed(minion) => {
                if let Some(m) = world.minions.get_mut(&minion) {
                    m.doomed = false;
                }
            }
            WorldStep::DeathrattleCleared { minion, effect } => {
                if let Some(m) = world.minions.get_mut(&minion) {
                    m.deathrattle = Some(effect);
                }
            }

            WorldStep::HeroVitals { player, previous } => world.players[player].hero.vitals = previous,
            WorldStep::HeroCombat { player, previous } => world.players[player].hero.combat = previous,
            WorldStep::Mana { player, previous } => world.players[player].mana = previous,
            WorldStep::Fatigue { player, previous } => world.players[player].fatigue = previous,
            WorldStep::Eliminated(player) => world.players[player].eliminated = false,

            WorldStep::DeckPopped { player, card } => world.players[player].deck.push(card),
            WorldStep::DeckShuffled { player, previous } => world.players[player].deck = previous,
            WorldStep::HandPushed(player) => {
                if let Some(id) = world.players[player].hand.pop() {
                    world.hand_cards.remove(&id);
                }
            }
            WorldStep::HandRemoved {
                player,
                index,
                card,
            } => {
                world.players[player].hand.insert(index, card.id);
                world.hand_cards.insert(card.id, *card);
            }
            WorldStep::GraveyardPushed(player) => {
                world.players[player].graveyard.pop();
            }
            WorldStep::WeaponSet { player, previous } => {
                world.players[player].weapon = previous.map(|weapon| *weapon);
            }
            WorldStep::WeaponDurability { player, previous } => {
                if let Some(weapon) = world.players[player].weapon.as_mut() {
                    weapon.durability = previous;
                }
            }

            WorldStep::Turn(previous) => world.turn = previous,
            WorldStep::Rng(state) => world.rng.restore(&state),
            WorldStep::Veto(previous) => world.attack_vetoed = previous,
        }
    }
}

/// Lift a property-local undo into world steps.
pub(crate) fn lift_stat(key: StatKey, undo: Reversible<LayerEdit<i32>>) -> UndoAction {
    undo.map(&mut |edit| WorldStep::Stat(key, edit))
}

pub(crate) fn lift_flag(key: FlagKey, undo: Reversible<LayerEdit<bool>>) -> UndoAction {
    undo.map(&mut |edit| WorldStep::Flag(key, edit))
}
