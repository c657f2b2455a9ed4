//! Core identifiers and configuration: entities, players, RNG, world config.

pub mod config;
pub mod entity;
pub mod player;
pub mod rng;

pub use config::WorldConfig;
pub use entity::{EntityAllocator, EntityId};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
