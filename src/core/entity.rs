//! Entity identification.
//!
//! Every object the rules core can address (hero, card, minion, weapon) has a
//! unique `EntityId`. Ids are plain indices into the world's arenas; nothing
//! outside the world ever holds a reference into entity storage.
//!
//! Heroes come first:
//!
//! - `0..player_count`: heroes, one per player
//! - `player_count..`: cards, minions and weapons, allocated on demand
//!
//! Allocation is reversible: undoing the action that created an entity also
//! rewinds the allocator, so a replay hands out the same ids again.
//!
//! ```
//! use rust_ccg_rules::core::{EntityId, PlayerId};
//!
//! let hero = EntityId::hero(PlayerId::new(1));
//! assert!(hero.is_hero(2));
//! assert_eq!(hero.as_hero(2), Some(PlayerId::new(1)));
//!
//! let minion = EntityId(7);
//! assert!(!minion.is_hero(2));
//! ```

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// Unique identifier for any addressable game object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// The hero entity of a player.
    #[must_use]
    pub const fn hero(player: PlayerId) -> Self {
        Self(player.0 as u32)
    }

    /// First id available for non-hero entities.
    #[must_use]
    pub const fn first_non_hero(player_count: usize) -> u32 {
        player_count as u32
    }

    /// Check if this id names a hero in a game with `player_count` players.
    #[must_use]
    pub const fn is_hero(self, player_count: usize) -> bool {
        self.0 < player_count as u32
    }

    /// The player whose hero this is, if it is a hero.
    #[must_use]
    pub fn as_hero(self, player_count: usize) -> Option<PlayerId> {
        if self.is_hero(player_count) {
            Some(PlayerId::new(self.0 as u8))
        } else {
            None
        }
    }

}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Reversible id allocator.
///
/// `alloc` returns the new id together with the counter value to restore
/// when the allocation is undone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAllocator {
    next: u32,
}

impl EntityAllocator {
    /// Allocator for a game with `player_count` heroes.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            next: EntityId::first_non_hero(player_count),
        }
    }

    /// Allocate a fresh id. Returns `(id, previous_counter)`.
    pub fn alloc(&mut self) -> (EntityId, u32) {
        let previous = self.next;
        self.next += 1;
        (EntityId(previous), previous)
    }

    /// Rewind the counter (undo of `alloc`).
    pub fn rewind(&mut self, previous: u32) {
        self.next = previous;
    }

    /// The id the next call to `alloc` will return.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_ids() {
        assert_eq!(EntityId::hero(PlayerId::new(0)), EntityId(0));
        assert_eq!(EntityId::hero(PlayerId::new(1)), EntityId(1));
        assert!(EntityId(1).is_hero(2));
        assert!(!EntityId(2).is_hero(2));
        assert_eq!(EntityId(3).as_hero(4), Some(PlayerId::new(3)));
        assert_eq!(EntityId(4).as_hero(4), None);
    }

    #[test]
    fn test_allocator_rewind() {
        let mut alloc = EntityAllocator::new(2);
        let (first, prev) = alloc.alloc();
        assert_eq!(first, EntityId(2));
        let (second, _) = alloc.alloc();
        assert_eq!(second, EntityId(3));

        alloc.rewind(prev);
        assert_eq!(alloc.peek(), EntityId(2));
        assert_eq!(alloc.alloc().0, EntityId(2));
    }

    #[test]
    fn test_ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&EntityId(12)).unwrap(), "12");
        assert_eq!(format!("{}", EntityId(12)), "Entity(12)");
    }
}
