//! Rule-level errors.
//!
//! Only player-action preconditions and configuration problems are reported
//! through [`RulesError`]. Programming-contract violations (undoing an
//! unregistered reference, an unknown registration handle, unbalanced atomic
//! blocks) panic at the call site instead.

use thiserror::Error;

use crate::cards::CardId;
use crate::core::{EntityId, PlayerId};

/// Why a player action or configuration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0} is not the active player")]
    NotYourTurn(PlayerId),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown card {0}")]
    UnknownCard(CardId),

    #[error("the game has not started")]
    NotStarted,

    #[error("the game has already started")]
    AlreadyStarted,

    #[error("{card} is not in the hand of {player}")]
    NotInHand { player: PlayerId, card: EntityId },

    #[error("not enough mana: need {needed}, have {available}")]
    NotEnoughMana { needed: i32, available: i32 },

    #[error("board is full")]
    BoardFull,

    #[error("{0} needs a target")]
    TargetRequired(EntityId),

    #[error("{0} is not a valid target")]
    InvalidTarget(EntityId),

    #[error("{0} cannot attack right now")]
    CannotAttack(EntityId),

    #[error("a minion with taunt must be attacked first")]
    TauntInTheWay,

    #[error("the game is over")]
    GameOver,
}

/// Result alias for rule-checked operations.
pub type Result<T> = std::result::Result<T, RulesError>;
