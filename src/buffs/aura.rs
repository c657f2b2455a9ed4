//! Auras: continuously re-evaluated modifiers.
//!
//! An aura reads "while the condition holds, apply the effect to every
//! member of the target set". The registry only stores active auras and
//! which targets currently carry their modifier; the world reconciles the
//! target sets on every refresh and owns the per-target registrations.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value::{FlagBuff, IntBuff};
use crate::cards::{Keyword, Stat};
use crate::core::{EntityId, PlayerId};
use crate::undo::UnregisterRef;

/// Identifier of an active aura.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuraId(u64);

impl AuraId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AuraId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Aura({})", self.0)
    }
}

/// Which entities an aura reaches, relative to its source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraTargets {
    /// The source itself.
    SelfOnly,
    /// Minions on the owner's board.
    FriendlyMinions { exclude_self: bool },
    /// Minions on every opposing board.
    EnemyMinions,
    /// Every minion in play.
    AllMinions,
    /// Minions next to the source on its board.
    AdjacentMinions,
    /// The owner's hero.
    FriendlyHero,
    /// Cards in the owner's hand.
    FriendlyHand,
    /// The owner's equipped weapon.
    FriendlyWeapon,
}

/// When an aura applies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraCondition {
    Always,
    /// The source minion has taken damage.
    SourceDamaged,
    /// The owner has a weapon equipped.
    OwnerHasWeapon,
    /// It is the owner's turn.
    OwnersTurn,
    /// The owner holds at least this many cards.
    HandSizeAtLeast(usize),
    /// Every sub-condition holds.
    All(Vec<AuraCondition>),
}

/// What an aura does to each target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuraEffect {
    Stat { stat: Stat, buff: IntBuff },
    Keyword { keyword: Keyword, buff: FlagBuff },
}

/// Full description of an aura.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuraDef {
    pub targets: AuraTargets,
    pub condition: AuraCondition,
    pub effect: AuraEffect,
}

impl AuraDef {
    /// Unconditional aura.
    pub fn new(targets: AuraTargets, effect: AuraEffect) -> Self {
        Self {
            targets,
            condition: AuraCondition::Always,
            effect,
        }
    }

    /// Set the condition (builder pattern).
    #[must_use]
    pub fn with_condition(mut self, condition: AuraCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// An aura currently in effect.
#[derive(Clone, Debug)]
pub struct ActiveAura {
    pub id: AuraId,
    pub source: EntityId,
    pub owner: PlayerId,
    pub def: AuraDef,
    /// Targets currently carrying the modifier, with the registration of
    /// each applied buff.
    pub applied: BTreeMap<EntityId, UnregisterRef>,
    /// Targets that used up the granted keyword. They stay out of the
    /// target set until they leave the aura's reach.
    pub spent: BTreeSet<EntityId>,
}

impl ActiveAura {
    /// Whether this aura hands out `keyword`.
    #[must_use]
    pub fn grants(&self, keyword: Keyword) -> bool {
        matches!(
            self.def.effect,
            AuraEffect::Keyword { keyword: granted, buff: FlagBuff::Grant } if granted == keyword
        )
    }
}

/// Active auras in creation order.
#[derive(Clone, Debug, Default)]
pub struct AuraRegistry {
    auras: BTreeMap<AuraId, ActiveAura>,
    next_id: u64,
}

impl AuraRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new aura with no applied targets.
    pub fn insert(&mut self, source: EntityId, owner: PlayerId, def: AuraDef) -> AuraId {
        let id = AuraId(self.next_id);
        self.next_id += 1;
        self.auras.insert(
            id,
            ActiveAura {
                id,
                source,
                owner,
                def,
                applied: BTreeMap::new(),
                spent: BTreeSet::new(),
            },
        );
        id
    }

    /// Put back an aura taken out by [`AuraRegistry::remove`].
    pub fn restore(&mut self, aura: ActiveAura) {
        self.auras.insert(aura.id, aura);
    }

    pub fn remove(&mut self, id: AuraId) -> Option<ActiveAura> {
        self.auras.remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: AuraId) -> Option<&ActiveAura> {
        self.auras.get(&id)
    }

    pub fn get_mut(&mut self, id: AuraId) -> Option<&mut ActiveAura> {
        self.auras.get_mut(&id)
    }

    /// Ids in creation order.
    #[must_use]
    pub fn ids(&self) -> Vec<AuraId> {
        self.auras.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveAura> {
        self.auras.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.auras.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.auras.is_empty()
    }
}
