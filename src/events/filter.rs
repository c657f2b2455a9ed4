//! Event filters.
//!
//! A filter decides whether a listener reacts to an event, relative to the
//! entity that owns the listener ("friendly" means "same controller as the
//! owner"). A rejected event is not an error: the listener simply does
//! nothing and contributes no undo.

use serde::{Deserialize, Serialize};

use crate::core::{EntityId, PlayerId};

use super::event::GameEvent;

/// Read-only entity queries a filter needs.
pub trait EntityLookup {
    /// Controller of an entity, if it exists.
    fn owner_of(&self, entity: EntityId) -> Option<PlayerId>;

    /// Whether the entity is a minion in play.
    fn is_minion(&self, entity: EntityId) -> bool;

    /// Whether the entity is a hero.
    fn is_hero(&self, entity: EntityId) -> bool;
}

/// A condition on an event, seen from the listener's owner.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventFilter {
    // === Entity Filters ===

    /// The owner caused the event.
    SourceIsSelf,

    /// The owner was affected by the event.
    TargetIsSelf,

    /// The owner did not cause the event.
    SourceIsNotSelf,

    /// Source controlled by the owner's controller.
    SourceFriendly,

    /// Source controlled by someone else.
    SourceEnemy,

    /// Target controlled by the owner's controller.
    TargetFriendly,

    /// Target controlled by someone else.
    TargetEnemy,

    /// Target is a minion in play.
    TargetIsMinion,

    /// Target is a hero.
    TargetIsHero,

    /// Source is a minion in play.
    SourceIsMinion,

    // === Player Filters ===

    /// Event belongs to the owner's controller.
    ForOwner,

    /// Event belongs to another player.
    ForOpponent,

    // === Value Filters ===

    /// Amount is at least N.
    AmountAtLeast(i32),

    // === Combinators ===

    /// All filters must match.
    All(Vec<EventFilter>),

    /// At least one filter must match.
    Any(Vec<EventFilter>),

    /// Filter must not match.
    Not(Box<EventFilter>),

    // === Special ===

    /// Always matches (no filter).
    #[default]
    Always,

    /// Never matches.
    Never,
}

impl EventFilter {
    /// Create an AND filter.
    pub fn all(filters: impl IntoIterator<Item = EventFilter>) -> Self {
        Self::All(filters.into_iter().collect())
    }

    /// Create an OR filter.
    pub fn any(filters: impl IntoIterator<Item = EventFilter>) -> Self {
        Self::Any(filters.into_iter().collect())
    }

    /// Negate this filter.
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another filter with AND.
    pub fn and(self, other: EventFilter) -> Self {
        match self {
            Self::Always => other,
            Self::All(mut filters) => {
                filters.push(other);
                Self::All(filters)
            }
            _ => Self::All(vec![self, other]),
        }
    }
}

/// Context for evaluating a filter.
pub struct FilterContext<'a, L: EntityLookup + ?Sized> {
    /// The event being checked.
    pub event: &'a GameEvent,
    /// The entity owning the listener.
    pub owner: EntityId,
    /// Entity queries.
    pub lookup: &'a L,
}

impl<'a, L: EntityLookup + ?Sized> FilterContext<'a, L> {
    /// Create a new context.
    pub fn new(event: &'a GameEvent, owner: EntityId, lookup: &'a L) -> Self {
        Self {
            event,
            owner,
            lookup,
        }
    }

    fn controller(&self) -> Option<PlayerId> {
        self.lookup.owner_of(self.owner)
    }

    fn friendly(&self, entity: Option<EntityId>) -> Option<bool> {
        let entity_owner = self.lookup.owner_of(entity?)?;
        Some(Some(entity_owner) == self.controller())
    }
}

/// Evaluator for event filters.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Check if a filter is satisfied.
    pub fn evaluate<L: EntityLookup + ?Sized>(filter: &EventFilter, ctx: &FilterContext<'_, L>) -> bool {
        let event = ctx.event;
        match filter {
            EventFilter::SourceIsSelf => event.source == Some(ctx.owner),

            EventFilter::TargetIsSelf => event.target == Some(ctx.owner),

            EventFilter::SourceIsNotSelf => event.source != Some(ctx.owner),

            EventFilter::SourceFriendly => ctx.friendly(event.source) == Some(true),

            EventFilter::SourceEnemy => ctx.friendly(event.source) == Some(false),

            EventFilter::TargetFriendly => ctx.friendly(event.target) == Some(true),

            EventFilter::TargetEnemy => ctx.friendly(event.target) == Some(false),

            EventFilter::TargetIsMinion => event.target.is_some_and(|t| ctx.lookup.is_minion(t)),

            EventFilter::TargetIsHero => event.target.is_some_and(|t| ctx.lookup.is_hero(t)),

            EventFilter::SourceIsMinion => event.source.is_some_and(|s| ctx.lookup.is_minion(s)),

            EventFilter::ForOwner => event.player.is_some() && event.player == ctx.controller(),

            EventFilter::ForOpponent => {
                event.player.is_some() && ctx.controller().is_some() && event.player != ctx.controller()
            }

            EventFilter::AmountAtLeast(min) => event.amount >= *min,

            EventFilter::All(filters) => filters.iter().all(|f| Self::evaluate(f, ctx)),

            EventFilter::Any(filters) => filters.iter().any(|f| Self::evaluate(f, ctx)),

            EventFilter::Not(inner) => !Self::evaluate(inner, ctx),

            EventFilter::Always => true,

            EventFilter::Never => false,
        }
    }
}
