//! Effect definitions.
//!
//! Effects are the building blocks of battlecries, spells, deathrattles
//! and triggered abilities. They are plain data; the resolver turns them
//! into world mutations and returns the undo of what it did.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityDef;
use crate::buffs::IntBuff;
use crate::cards::{CardId, Keyword, Stat};

use super::targeting::Target;

/// An effect a card or ability can produce.
///
/// ## Character Effects
///
/// - `DealDamage`, `Heal`, `Destroy`, `Freeze`, `Silence`
///
/// ## Modifier Effects
///
/// - `AddStat`: non-removable fast-path change
/// - `ApplyBuff`: removable buff in the own layer
/// - `SetStat`: silence the stat, then force it
/// - `GrantKeyword`, `AdjustCost`, `GrantAbility`
///
/// ## Player Effects
///
/// - `Draw`, `GainArmor`, `Summon`
///
/// ## Composite Effects
///
/// - `Batch`: Execute multiple effects in sequence
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    // === Characters ===

    DealDamage { target: Target, amount: i32 },

    Heal { target: Target, amount: i32 },

    Destroy { target: Target },

    Freeze { target: Target },

    Silence { target: Target },

    // === Modifiers ===

    AddStat { target: Target, stat: Stat, delta: i32 },

    ApplyBuff { target: Target, stat: Stat, buff: IntBuff },

    SetStat { target: Target, stat: Stat, value: i32 },

    GrantKeyword { target: Target, keyword: Keyword },

    /// Change the cost of cards in hand, ahead of auras.
    AdjustCost { target: Target, delta: i32 },

    GrantAbility { target: Target, ability: Box<AbilityDef> },

    // === Player ===

    /// The effect owner draws.
    Draw { count: usize },

    /// The effect owner's hero gains armor.
    GainArmor { amount: i32 },

    /// Summon copies for the effect owner, right of the source when the
    /// source is on the board.
    Summon { card: CardId, count: usize },

    // === Composite ===

    /// Execute multiple effects in sequence.
    Batch(Vec<Effect>),
}

impl Effect {
    /// Create a damage effect.
    pub fn damage(target: Target, amount: i32) -> Self {
        Self::DealDamage { target, amount }
    }

    /// Create a heal effect.
    pub fn heal(target: Target, amount: i32) -> Self {
        Self::Heal { target, amount }
    }

    /// Create a draw cards effect.
    pub fn draw(count: usize) -> Self {
        Self::Draw { count }
    }

    /// Create a fast-path stat change.
    pub fn add_stat(target: Target, stat: Stat, delta: i32) -> Self {
        Self::AddStat { target, stat, delta }
    }

    /// Create a removable buff effect.
    pub fn buff(target: Target, stat: Stat, buff: IntBuff) -> Self {
        Self::ApplyBuff { target, stat, buff }
    }

    /// Create a summon effect.
    pub fn summon(card: CardId, count: usize) -> Self {
        Self::Summon { card, count }
    }

    /// Give the targets another ability.
    pub fn grant_ability(target: Target, ability: AbilityDef) -> Self {
        Self::GrantAbility {
            target,
            ability: Box::new(ability),
        }
    }

    /// Create a batch of effects.
    pub fn batch(effects: impl IntoIterator<Item = Effect>) -> Self {
        Self::Batch(effects.into_iter().collect())
    }

    /// Push every card this effect can summon, including through batches
    /// and granted abilities.
    pub fn summoned_cards(&self, out: &mut Vec<CardId>) {
        match self {
            Effect::Summon { card, .. } => out.push(*card),
            Effect::Batch(effects) => effects.iter().for_each(|e| e.summoned_cards(out)),
            Effect::GrantAbility { ability, .. } => ability.summoned_cards(out),
            _ => {}
        }
    }
}
