//! What the bus carries.
//!
//! Every observable state change is announced as a [`GameEvent`].
//! Listeners subscribe per [`EventKind`].

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

/// What happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    TurnStarted,
    TurnEnded,
    CardDrawn,
    CardPlayed,
    /// Two-phase: listeners run when the minion enters play and may hold
    /// back a finisher that runs once the summon has fully resolved.
    MinionSummoned,
    DamageDealt,
    Healed,
    MinionKilled,
    WeaponDestroyed,
    AttackDeclared,
    ArmorGained,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [EventKind; 11] = [
        EventKind::TurnStarted,
        EventKind::TurnEnded,
        EventKind::CardDrawn,
        EventKind::CardPlayed,
        EventKind::MinionSummoned,
        EventKind::DamageDealt,
        EventKind::Healed,
        EventKind::MinionKilled,
        EventKind::WeaponDestroyed,
        EventKind::AttackDeclared,
        EventKind::ArmorGained,
    ];

    /// Whether the kind is dispatched through a completable channel.
    #[must_use]
    pub const fn is_completable(self) -> bool {
        matches!(self, EventKind::MinionSummoned)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// One occurrence of an [`EventKind`] and who it concerns.
///
/// Fields that mean nothing for a kind stay `None` / zero. Filters read
/// `source`, `target` and `player` to decide whether a listener cares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub kind: EventKind,
    /// Whatever caused it: the attacker, the spell, the summoned minion.
    pub source: Option<EntityId>,
    /// Whatever it happened to.
    pub target: Option<EntityId>,
    /// The seat it belongs to, for turn and card events.
    pub player: Option<PlayerId>,
    /// Damage, healing or armor; zero otherwise.
    pub amount: i32,
}

impl GameEvent {
    #[must_use]
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            source: None,
            target: None,
            player: None,
            amount: 0,
        }
    }

    #[must_use]
    pub fn with_source(self, source: EntityId) -> Self {
        Self { source: Some(source), ..self }
    }

    #[must_use]
    pub fn with_target(self, target: EntityId) -> Self {
        Self { target: Some(target), ..self }
    }

    #[must_use]
    pub fn with_player(self, player: PlayerId) -> Self {
        Self { player: Some(player), ..self }
    }

    #[must_use]
    pub fn with_amount(self, amount: i32) -> Self {
        Self { amount, ..self }
    }

    /// `amount` of damage or healing landing on `target`.
    #[must_use]
    pub fn damage(kind: EventKind, source: Option<EntityId>, target: EntityId, amount: i32) -> Self {
        Self {
            source,
            ..Self::new(kind).with_target(target).with_amount(amount)
        }
    }

    /// Turn boundaries and other events owned by a seat.
    #[must_use]
    pub fn for_player(kind: EventKind, player: PlayerId) -> Self {
        Self::new(kind).with_player(player)
    }

    /// Draws, plays and summons: `card` is the source, `controller` the seat.
    #[must_use]
    pub fn for_card(kind: EventKind, card: EntityId, controller: PlayerId) -> Self {
        Self::new(kind).with_source(card).with_player(controller)
    }
}
