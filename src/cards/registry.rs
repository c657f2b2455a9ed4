//! The card pool a world plays with.
//!
//! A `CardRegistry` maps [`CardId`] to [`CardDefinition`]. The world keeps
//! it behind an `Rc` and only ever reads it, so one pool can back many
//! simulated games.

use rustc_hash::FxHashMap;

use super::definition::{CardDefinition, CardId};
use crate::error::{Result, RulesError};

/// Card definitions keyed by id.
///
/// ```
/// use rust_ccg_rules::cards::{CardDefinition, CardId, CardRegistry};
///
/// let pool = CardRegistry::new().with_cards([
///     CardDefinition::minion(CardId::new(1), "Wisp", 0, 1, 1),
/// ]);
/// assert_eq!(pool.lookup(CardId::new(1)).unwrap().name, "Wisp");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardRegistry {
    by_id: FxHashMap<CardId, CardDefinition>,
}

impl CardRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition. Ids are unique within a pool; registering one
    /// twice is a programming error and panics.
    pub fn register(&mut self, card: CardDefinition) {
        let id = card.id;
        if self.by_id.insert(id, card).is_some() {
            panic!("{id} already registered");
        }
    }

    #[must_use]
    pub fn with_cards(mut self, cards: impl IntoIterator<Item = CardDefinition>) -> Self {
        cards.into_iter().for_each(|card| self.register(card));
        self
    }

    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&CardDefinition> {
        self.by_id.get(&id)
    }

    /// Like [`CardRegistry::get`], with a missing id as [`RulesError::UnknownCard`].
    pub fn lookup(&self, id: CardId) -> Result<&CardDefinition> {
        self.get(id).ok_or(RulesError::UnknownCard(id))
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.by_id.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Check that every card in `deck` exists and that every card the pool
    /// can summon from it exists too.
    ///
    /// Summons are followed transitively, so a deathrattle that summons a
    /// minion whose battlecry summons a missing card is caught here rather
    /// than mid-game.
    pub fn check_deck(&self, deck: &[CardId]) -> Result<()> {
        let mut pending: Vec<CardId> = deck.to_vec();
        let mut seen = rustc_hash::FxHashSet::default();
        while let Some(id) = pending.pop() {
            if !seen.insert(id) {
                continue;
            }
            pending.extend(self.lookup(id)?.summoned_cards());
        }
        Ok(())
    }
}
