//! Buffable attributes of entities.
//!
//! - `Stat`: integer attributes (attack, health, cost)
//! - `Keyword`: boolean attributes (taunt, charge, ...)
//!
//! Every attribute of every entity is a layered property, so each one can
//! carry buffs and aura modifiers independently.

use serde::{Deserialize, Serialize};

/// Integer attribute of an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Attack of a minion, weapon or hero.
    Attack,
    /// Maximum health of a minion.
    Health,
    /// Mana cost of a card in hand.
    Cost,
}

/// Boolean attribute of a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Taunt,
    Charge,
    Stealth,
    DivineShield,
    Windfury,
    Frozen,
}

impl Keyword {
    /// Every keyword, in storage order.
    pub const ALL: [Keyword; 6] = [
        Keyword::Taunt,
        Keyword::Charge,
        Keyword::Stealth,
        Keyword::DivineShield,
        Keyword::Windfury,
        Keyword::Frozen,
    ];

    /// Index into per-keyword storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Keyword::Taunt => "taunt",
            Keyword::Charge => "charge",
            Keyword::Stealth => "stealth",
            Keyword::DivineShield => "divine shield",
            Keyword::Windfury => "windfury",
            Keyword::Frozen => "frozen",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_indices_match_order() {
        for (i, keyword) in Keyword::ALL.iter().enumerate() {
            assert_eq!(keyword.index(), i);
        }
    }

    #[test]
    fn test_keyword_serde() {
        let json = serde_json::to_string(&Keyword::DivineShield).unwrap();
        assert_eq!(json, "\"DivineShield\"");
        let back: Keyword = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Keyword::DivineShield);
    }
}
