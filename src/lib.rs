//! # rust-ccg-rules
//!
//! A transactional, undoable rules core for a turn-based collectible card
//! game in the style of Hearthstone.
//!
//! ## Design Principles
//!
//! 1. **Every mutation returns its undo.** Undo is data ([`WorldStep`]
//!    chains), never a closure, so it can be inspected, composed and run
//!    once. Undoing in reverse order restores the world exactly, including
//!    listener order, aura reach, entity ids and the RNG position.
//!
//! 2. **Explicit state.** The event bus, aura registry and registration
//!    table are fields of the [`World`] passed to every operation. Nothing
//!    is global.
//!
//! 3. **Arena ownership.** Entities are addressed by [`EntityId`];
//!    registrations by [`UnregisterRef`]. Nothing holds a reference into
//!    the world.
//!
//! ## Modules
//!
//! - `undo`: reversible actions and registration handles
//! - `buffs`: layered buffable properties and auras
//! - `events`: event bus with priorities, atomic batching and two-phase
//!   events
//! - `abilities`: lifecycle-bound effect registrations
//! - `core`: ids, players, RNG and configuration
//! - `cards`, `effects`: card data and what cards do
//! - `world`: game state, player actions and queries
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use rust_ccg_rules::{CardDefinition, CardId, CardRegistry, PlayerId, World, WorldConfig};
//!
//! let cards = CardRegistry::new()
//!     .with_cards([CardDefinition::minion(CardId::new(1), "Wisp", 0, 1, 1)]);
//! let decks = vec![vec![CardId::new(1); 5], vec![CardId::new(1); 5]];
//! let mut world = World::new(WorldConfig::new(2).with_seed(3), Rc::new(cards), decks).unwrap();
//!
//! let start = world.start_game().unwrap();
//! let p0 = PlayerId::new(0);
//! let wisp = world.hand(p0)[0];
//! let before = world.view();
//!
//! let played = world.play_card(p0, wisp, None).unwrap();
//! assert_eq!(world.board(p0), &[wisp]);
//!
//! played.undo.undo(&mut world);
//! assert_eq!(world.view(), before);
//! # drop(start);
//! ```

pub mod abilities;
pub mod buffs;
pub mod cards;
pub mod core;
pub mod effects;
pub mod error;
pub mod events;
pub mod undo;
pub mod world;

// Re-export commonly used types
pub use crate::core::{EntityId, GameRng, GameRngState, PlayerId, PlayerMap, WorldConfig};

pub use crate::undo::{RegistrationTable, Reversible, Revert, UndoBuilder, UnregisterRef};

pub use crate::buffs::{
    AuraCondition, AuraDef, AuraEffect, AuraTargets, FlagBuff, IntBuff, Layer, LayeredProperty,
};

pub use crate::events::{
    complete, do_atomic, do_atomic_with, start_event, trigger_event, EventBus, EventFilter,
    EventHost, EventKind, GameEvent,
};

pub use crate::abilities::{merge, Ability, AbilityDef, AbilityRef};

pub use crate::cards::{CardDefinition, CardId, CardKind, CardRegistry, ChosenTarget, Keyword, Stat};

pub use crate::effects::{Effect, EffectContext, EffectResolver, Target};

pub use crate::error::{Result, RulesError};

pub use crate::world::{PlayerActionResult, UndoAction, World, WorldStep, WorldView};
