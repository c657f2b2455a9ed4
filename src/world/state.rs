//! The world: every entity, the event bus and the registration table.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::abilities::AbilityHolder;
use crate::buffs::{AuraRegistry, FlagBuff, IntBuff, Layer, LayeredProperty};
use crate::cards::{CardId, CardRegistry, Stat};
use crate::core::{EntityAllocator, EntityId, GameRng, PlayerId, PlayerMap, WorldConfig};
use crate::error::{Result, RulesError};
use crate::events::{EntityLookup, EventBus, EventHost};
use crate::undo::{RegistrationTable, UnregisterRef};

use super::entities::{Card, Minion, PlayerState, TurnState};
use super::step::{lift_flag, lift_stat, FlagKey, Registration, StatKey, UndoAction, WorldStep};

/// Complete rules state of one game.
///
/// Every public mutation returns the [`UndoAction`] that reverses it.
/// Undoing the actions of a game in reverse order restores the world
/// exactly, including listener order, aura targets and the RNG position.
pub struct World {
    pub(crate) config: WorldConfig,
    pub(crate) cards: Rc<CardRegistry>,
    pub(crate) players: PlayerMap<PlayerState>,
    pub(crate) minions: FxHashMap<EntityId, Minion>,
    pub(crate) hand_cards: FxHashMap<EntityId, Card>,
    pub(crate) allocator: EntityAllocator,
    pub(crate) turn: TurnState,
    pub(crate) bus: EventBus<World>,
    pub(crate) auras: AuraRegistry,
    pub(crate) registrations: RegistrationTable<Registration>,
    pub(crate) rng: GameRng,
    /// Set by listeners of a declared attack to cancel it.
    pub(crate) attack_vetoed: bool,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("turn", &self.turn)
            .field("minions", &self.minions.len())
            .field("listeners", &self.bus.total_listeners())
            .field("registrations", &self.registrations.registered_count())
            .field("auras", &self.auras.len())
            .finish_non_exhaustive()
    }
}

impl World {
    /// Create a world with one deck per seat.
    ///
    /// Each deck lists its cards top first. Nothing happens until
    /// [`World::start_game`].
    pub fn new(config: WorldConfig, cards: Rc<CardRegistry>, decks: Vec<Vec<CardId>>) -> Result<Self> {
        config.validate()?;
        if decks.len() != config.player_count {
            return Err(RulesError::InvalidConfig(format!(
                "expected {} decks, got {}",
                config.player_count,
                decks.len()
            )));
        }
        for deck in &decks {
            cards.check_deck(deck)?;
        }

        let decks: Vec<_> = decks
            .into_iter()
            .map(|mut deck| {
                deck.reverse();
                deck
            })
            .collect();
        let health = config.starting_health;
        let players = PlayerMap::new(config.player_count, |p| {
            PlayerState::new(health, decks[p.index()].clone())
        });

        tracing::debug!(players = config.player_count, seed = config.seed, "world created");
        Ok(Self {
            allocator: EntityAllocator::new(config.player_count),
            rng: GameRng::new(config.seed),
            cards,
            players,
            minions: FxHashMap::default(),
            hand_cards: FxHashMap::default(),
            turn: TurnState {
                active: PlayerId::new(0),
                number: 0,
                started: false,
            },
            bus: EventBus::new(),
            auras: AuraRegistry::new(),
            registrations: RegistrationTable::new(),
            attack_vetoed: false,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn cards(&self) -> &CardRegistry {
        &self.cards
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.config.player_count
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    #[must_use]
    pub fn turn(&self) -> TurnState {
        self.turn
    }

    #[must_use]
    pub fn minion(&self, id: EntityId) -> Option<&Minion> {
        self.minions.get(&id)
    }

    #[must_use]
    pub fn hand_card(&self, id: EntityId) -> Option<&Card> {
        self.hand_cards.get(&id)
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus<World> {
        &self.bus
    }

    #[must_use]
    pub fn auras(&self) -> &AuraRegistry {
        &self.auras
    }

    #[must_use]
    pub fn registrations(&self) -> &RegistrationTable<Registration> {
        &self.registrations
    }

    // ---- property access ----

    pub(crate) fn stat_ref(&self, key: StatKey) -> Option<&LayeredProperty<i32>> {
        if let Some(player) = key.entity.as_hero(self.player_count()) {
            return match key.stat {
                Stat::Attack => Some(&self.players[player].hero.attack),
                Stat::Health | Stat::Cost => None,
            };
        }
        if let Some(minion) = self.minions.get(&key.entity) {
            return match key.stat {
                Stat::Attack => Some(&minion.attack),
                Stat::Health => Some(&minion.health),
                Stat::Cost => None,
            };
        }
        if let Some(card) = self.hand_cards.get(&key.entity) {
            return match key.stat {
                Stat::Cost => Some(&card.cost),
                Stat::Attack | Stat::Health => None,
            };
        }
        match key.stat {
            Stat::Attack => self
                .players
                .iter()
                .find_map(|(_, p)| p.weapon.as_ref().filter(|w| w.id == key.entity))
                .map(|w| &w.attack),
            Stat::Health | Stat::Cost => None,
        }
    }

    pub(crate) fn stat_mut(&mut self, key: StatKey) -> Option<&mut LayeredProperty<i32>> {
        if let Some(player) = key.entity.as_hero(self.player_count()) {
            return match key.stat {
                Stat::Attack => Some(&mut self.players[player].hero.attack),
                Stat::Health | Stat::Cost => None,
            };
        }
        if self.minions.contains_key(&key.entity) {
            let minion = self.minions.get_mut(&key.entity)?;
            return match key.stat {
                Stat::Attack => Some(&mut minion.attack),
                Stat::Health => Some(&mut minion.health),
                Stat::Cost => None,
            };
        }
        if self.hand_cards.contains_key(&key.entity) {
            let card = self.hand_cards.get_mut(&key.entity)?;
            return match key.stat {
                Stat::Cost => Some(&mut card.cost),
                Stat::Attack | Stat::Health => None,
            };
        }
        match key.stat {
            Stat::Attack => self
                .players
                .iter_mut()
                .find_map(|(_, p)| p.weapon.as_mut().filter(|w| w.id == key.entity))
                .map(|w| &mut w.attack),
            Stat::Health | Stat::Cost => None,
        }
    }

    pub(crate) fn flag_ref(&self, key: FlagKey) -> Option<&LayeredProperty<bool>> {
        if let Some(player) = key.entity.as_hero(self.player_count()) {
            return Some(self.players[player].hero.keywords.get(key.keyword));
        }
        self.minions
            .get(&key.entity)
            .map(|m| m.keywords.get(key.keyword))
    }

    pub(crate) fn flag_mut(&mut self, key: FlagKey) -> Option<&mut LayeredProperty<bool>> {
        if let Some(player) = key.entity.as_hero(self.player_count()) {
            return Some(self.players[player].hero.keywords.get_mut(key.keyword));
        }
        self.minions
            .get_mut(&key.entity)
            .map(|m| m.keywords.get_mut(key.keyword))
    }

    pub(crate) fn holder(&self, entity: EntityId) -> Option<&AbilityHolder> {
        if let Some(minion) = self.minions.get(&entity) {
            return Some(&minion.abilities);
        }
        self.players
            .iter()
            .find_map(|(_, p)| p.weapon.as_ref().filter(|w| w.id == entity))
            .map(|w| &w.abilities)
    }

    pub(crate) fn holder_mut(&mut self, entity: EntityId) -> Option<&mut AbilityHolder> {
        if self.minions.contains_key(&entity) {
            return self.minions.get_mut(&entity).map(|m| &mut m.abilities);
        }
        self.players
            .iter_mut()
            .find_map(|(_, p)| p.weapon.as_mut().filter(|w| w.id == entity))
            .map(|w| &mut w.abilities)
    }

    /// Current value of an integer attribute.
    #[must_use]
    pub fn stat(&self, entity: EntityId, stat: Stat) -> Option<i32> {
        self.stat_ref(StatKey::new(entity, stat))
            .map(LayeredProperty::value)
    }

    /// Add to the fast-path accumulator of one layer.
    pub fn add_stat_fast(&mut self, key: StatKey, layer: Layer, delta: i32) -> UndoAction {
        let Some(property) = self.stat_mut(key) else {
            return UndoAction::NoOp;
        };
        let undo = property.add_fast(layer, delta);
        tracing::trace!(entity = %key.entity, stat = ?key.stat, ?layer, delta, "stat adjusted");
        lift_stat(key, undo)
    }

    /// Add a removable buff. The returned handle unregisters the buff;
    /// `None` if the entity has no such attribute.
    pub fn add_stat_buff(&mut self, key: StatKey, layer: Layer, buff: IntBuff) -> Option<UnregisterRef> {
        let property = self.stat_mut(key)?;
        let (id, _) = property.add_buff(layer, buff);
        tracing::trace!(entity = %key.entity, stat = ?key.stat, ?layer, ?buff, "stat buff added");
        Some(self.registrations.insert(Registration::Stat { key, layer, id }))
    }

    /// Silence the attribute and force it to `value`.
    ///
    /// Setting the health of a minion also heals it fully.
    pub fn set_stat(&mut self, key: StatKey, value: i32) -> UndoAction {
        let Some(property) = self.stat_mut(key) else {
            return UndoAction::NoOp;
        };
        let mut undo = lift_stat(key, property.set_value_to(value));
        if key.stat == Stat::Health {
            if let Some(minion) = self.minions.get_mut(&key.entity) {
                let previous = std::mem::take(&mut minion.damage);
                undo = undo.then(UndoAction::step(WorldStep::MinionDamage {
                    minion: key.entity,
                    previous,
                }));
            }
        }
        undo
    }

    /// Overwrite the fast-path flag of one layer.
    pub fn add_flag_fast(&mut self, key: FlagKey, layer: Layer, value: Option<bool>) -> UndoAction {
        let Some(property) = self.flag_mut(key) else {
            return UndoAction::NoOp;
        };
        let undo = property.add_fast(layer, value);
        tracing::trace!(entity = %key.entity, keyword = %key.keyword, ?layer, ?value, "flag set");
        lift_flag(key, undo)
    }

    /// Add a removable flag buff; see [`World::add_stat_buff`].
    pub fn add_flag_buff(&mut self, key: FlagKey, layer: Layer, buff: FlagBuff) -> Option<UnregisterRef> {
        let property = self.flag_mut(key)?;
        let (id, _) = property.add_buff(layer, buff);
        tracing::trace!(entity = %key.entity, keyword = %key.keyword, ?layer, ?buff, "flag buff added");
        Some(self.registrations.insert(Registration::Flag { key, layer, id }))
    }

    // ---- randomness ----

    /// Draw a random index in `0..len` with the undo that rewinds the RNG.
    /// An empty range draws nothing and leaves the stream untouched.
    pub fn random_index(&mut self, len: usize) -> Option<(usize, UndoAction)> {
        let checkpoint = self.rng.state();
        let index = self.rng.gen_index(len)?;
        Some((index, UndoAction::step(WorldStep::Rng(checkpoint))))
    }

    /// Allocate a fresh entity id.
    pub(crate) fn alloc_entity(&mut self) -> (EntityId, UndoAction) {
        let (id, previous) = self.allocator.alloc();
        (id, UndoAction::step(WorldStep::Allocated(previous)))
    }
}

impl EntityLookup for World {
    fn owner_of(&self, entity: EntityId) -> Option<PlayerId> {
        if let Some(player) = entity.as_hero(self.player_count()) {
            return Some(player);
        }
        if let Some(minion) = self.minions.get(&entity) {
            return Some(minion.owner);
        }
        if let Some(card) = self.hand_cards.get(&entity) {
            return Some(card.owner);
        }
        self.players
            .iter()
            .find(|(_, p)| p.weapon.as_ref().is_some_and(|w| w.id == entity))
            .map(|(player, _)| player)
    }

    fn is_minion(&self, entity: EntityId) -> bool {
        self.minions.contains_key(&entity)
    }

    fn is_hero(&self, entity: EntityId) -> bool {
        entity.is_hero(self.player_count())
    }
}

impl EventHost for World {
    type Step = WorldStep;

    fn event_bus(&self) -> &EventBus<Self> {
        &self.bus
    }

    fn event_bus_mut(&mut self) -> &mut EventBus<Self> {
        &mut self.bus
    }
}
