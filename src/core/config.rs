//! World configuration.
//!
//! Rule constants the core needs to enforce limits (board size, hand size,
//! mana cap) are supplied here rather than hardcoded, so variants of the
//! game can be simulated with the same engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RulesError};

/// Complete world configuration.
///
/// ```
/// use rust_ccg_rules::core::WorldConfig;
///
/// let config = WorldConfig::new(2).with_seed(7).with_max_board_size(5);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_board_size, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Seats at the table, 1 to 255.
    pub player_count: usize,

    /// Hero health at the start of the game.
    pub starting_health: i32,

    /// Upper bound for mana crystals.
    pub max_mana: i32,

    /// Cards drawn past this are burned.
    pub max_hand_size: usize,

    /// Minions per board.
    pub max_board_size: usize,

    /// Opening hand size per seat; seats past the end use the last entry.
    pub opening_hand: Vec<usize>,

    /// Seed for shuffles and random targets.
    pub seed: u64,

    /// Shuffle every deck when the game starts.
    pub shuffle_decks: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            player_count: 2,
            starting_health: 30,
            max_mana: 10,
            max_hand_size: 10,
            max_board_size: 7,
            opening_hand: vec![3, 4],
            seed: 0,
            shuffle_decks: true,
        }
    }
}

impl WorldConfig {
    /// Standard rules for `player_count` seats. The count is checked by
    /// [`WorldConfig::validate`], not here.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        Self {
            player_count,
            ..Self::default()
        }
    }

    /// Set the RNG seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Keep decks in the order given instead of shuffling them.
    #[must_use]
    pub fn without_shuffle(mut self) -> Self {
        self.shuffle_decks = false;
        self
    }

    /// Set the starting hero health.
    #[must_use]
    pub fn with_starting_health(mut self, health: i32) -> Self {
        self.starting_health = health;
        self
    }

    /// Set the board limit.
    #[must_use]
    pub fn with_max_board_size(mut self, size: usize) -> Self {
        self.max_board_size = size;
        self
    }

    /// Set the hand limit.
    #[must_use]
    pub fn with_max_hand_size(mut self, size: usize) -> Self {
        self.max_hand_size = size;
        self
    }

    /// Set the opening hand sizes.
    #[must_use]
    pub fn with_opening_hand(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.opening_hand = sizes.into_iter().collect();
        self
    }

    /// Opening hand size for a seat.
    #[must_use]
    pub fn opening_hand_for(&self, seat: usize) -> usize {
        self.opening_hand
            .get(seat)
            .or_else(|| self.opening_hand.last())
            .copied()
            .unwrap_or(0)
    }

    /// Check that every limit is usable.
    pub fn validate(&self) -> Result<()> {
        if self.player_count == 0 || self.player_count > 255 {
            return Err(RulesError::InvalidConfig(format!(
                "player_count must be 1-255, got {}",
                self.player_count
            )));
        }
        if self.starting_health <= 0 {
            return Err(RulesError::InvalidConfig(
                "starting_health must be positive".to_string(),
            ));
        }
        if self.max_mana < 0 {
            return Err(RulesError::InvalidConfig(
                "max_mana must not be negative".to_string(),
            ));
        }
        if self.max_board_size == 0 || self.max_hand_size == 0 {
            return Err(RulesError::InvalidConfig(
                "board and hand limits must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorldConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_board_size, 7);
        assert_eq!(config.max_hand_size, 10);
    }

    #[test]
    fn test_opening_hand_falls_back_to_last() {
        let config = WorldConfig::new(4).with_opening_hand([3, 4]);
        assert_eq!(config.opening_hand_for(0), 3);
        assert_eq!(config.opening_hand_for(1), 4);
        assert_eq!(config.opening_hand_for(3), 4);

        let empty = WorldConfig::new(2).with_opening_hand([]);
        assert_eq!(empty.opening_hand_for(0), 0);
    }

    #[test]
    fn test_validate_rejects_bad_limits() {
        let config = WorldConfig::new(2).with_max_board_size(0);
        assert!(matches!(config.validate(), Err(RulesError::InvalidConfig(_))));

        let config = WorldConfig::new(2).with_starting_health(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serde_fills_defaults() {
        let config: WorldConfig = serde_json::from_str(r#"{"player_count": 3, "seed": 9}"#).unwrap();
        assert_eq!(config.player_count, 3);
        assert_eq!(config.seed, 9);
        assert_eq!(config.starting_health, 30);
    }

    #[test]
    fn test_seat_count_is_checked_by_validate() {
        assert!(matches!(WorldConfig::new(0).validate(), Err(RulesError::InvalidConfig(_))));
        assert!(WorldConfig::new(256).validate().is_err());
        assert!(WorldConfig::new(255).validate().is_ok());
    }
}
