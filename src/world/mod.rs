//! The world: all rules state of one game and every mutation on it.
//!
//! ## Layout
//!
//! - `state`: the [`World`] struct, property lookups and raw mutations
//! - `step`: [`WorldStep`], the undo data of every primitive mutation
//! - `registry`: registration handles (listeners, buffs, auras, groups)
//! - `auras`: aura reconciliation
//! - `combat`, `lifecycle`: damage, healing, summoning, drawing, removal
//! - `actions`: player actions, turn flow and settling
//! - `queries`, `view`: read-only access
//!
//! Mutations never process deaths on their own. Player actions settle
//! after their atomic block: auras are refreshed and dead minions removed,
//! repeatedly, until nothing changes.

mod actions;
mod auras;
mod combat;
mod entities;
mod lifecycle;
mod queries;
mod registry;
mod state;
mod step;
mod view;

pub use actions::PlayerActionResult;
pub use entities::{Card, CombatState, Hero, Keywords, ManaState, Minion, PlayerState, TurnState, Vitals, Weapon};
pub use state::World;
pub use step::{FlagKey, Registration, StatKey, UndoAction, WorldStep};
pub use view::{AuraView, CardView, ChannelView, HeroView, MinionView, PlayerView, WeaponView, WorldView};

#[cfg(test)]
pub(crate) mod testing {
    use std::rc::Rc;

    use crate::cards::{CardDefinition, CardId, CardRegistry};
    use crate::core::{EntityId, PlayerId, WorldConfig};

    use super::World;

    /// A vanilla minion costing one mana.
    pub(crate) fn minion_card(id: u32, attack: i32, health: i32) -> CardDefinition {
        CardDefinition::minion(CardId::new(id), "Minion", 1, attack, health)
    }

    /// Two-player world with unshuffled decks, not started.
    pub(crate) fn world_with_cards(defs: Vec<CardDefinition>, decks: Vec<Vec<CardId>>) -> World {
        let cards = CardRegistry::new().with_cards(defs);
        World::new(WorldConfig::new(2).without_shuffle(), Rc::new(cards), decks).unwrap()
    }

    /// Empty two-player world with one copy of `def` on player 0's board.
    pub(crate) fn world_with_minion(def: CardDefinition) -> (World, EntityId) {
        let id = def.id;
        let mut world = world_with_cards(vec![def], vec![Vec::new(), Vec::new()]);
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, id, None);
        let minion = world.board(p0)[0];
        (world, minion)
    }
}
