//! Event-driven abilities.
//!
//! - [`TriggeredAbility`]: resolve an effect every time a matching event
//!   is raised
//! - [`OnceAbility`]: the same, but only for the first matching event
//! - [`AfterSummonAbility`]: resolve an effect once a summon has fully
//!   resolved (the done phase of the completable summon event)

use std::rc::Rc;

use crate::core::EntityId;
use crate::effects::{Effect, EffectResolver};
use crate::events::{Callback, EventFilter, EventKind, GameEvent, ListenerContext, StartOutcome};
use crate::undo::UnregisterRef;
use crate::world::{UndoAction, World};

use super::ability::Ability;

fn resolve_for(world: &mut World, effect: &Effect, ctx: &ListenerContext, event: &GameEvent) -> UndoAction {
    match world.effect_context(ctx.owner, event) {
        Some(effect_ctx) => EffectResolver::resolve(world, effect, &effect_ctx),
        None => UndoAction::NoOp,
    }
}

/// "Whenever X happens, do Y."
#[derive(Clone, Debug)]
pub struct TriggeredAbility {
    pub kind: EventKind,
    pub priority: i32,
    pub filter: EventFilter,
    pub effect: Rc<Effect>,
}

impl TriggeredAbility {
    pub fn new(kind: EventKind, effect: Effect) -> Self {
        Self {
            kind,
            priority: 0,
            filter: EventFilter::Always,
            effect: Rc::new(effect),
        }
    }

    /// Set the filter (builder pattern).
    #[must_use]
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set priority (builder pattern).
    /// Higher priority listeners run first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Ability for TriggeredAbility {
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef {
        let effect = Rc::clone(&self.effect);
        let callback = Callback::Plain(Rc::new(
            move |world: &mut World, ctx: &ListenerContext, event: &GameEvent| {
                resolve_for(world, &effect, ctx, event)
            },
        ));
        world.add_listener(self.kind, self.priority, owner, self.filter.clone(), callback)
    }
}

/// "The next time X happens, do Y."
///
/// The listener unregisters itself before resolving the effect, so the
/// effect cannot re-trigger it.
#[derive(Clone, Debug)]
pub struct OnceAbility(pub TriggeredAbility);

impl Ability for OnceAbility {
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef {
        let effect = Rc::clone(&self.0.effect);
        let callback = Callback::Plain(Rc::new(
            move |world: &mut World, ctx: &ListenerContext, event: &GameEvent| {
                let unregistered = world.unregister(ctx.handle);
                if unregistered.is_noop() {
                    // Already used by an earlier event in the same snapshot.
                    return UndoAction::NoOp;
                }
                unregistered.then(resolve_for(world, &effect, ctx, event))
            },
        ));
        world.add_listener(self.0.kind, self.0.priority, owner, self.0.filter.clone(), callback)
    }
}

/// "After you summon a minion, do Y."
#[derive(Clone, Debug)]
pub struct AfterSummonAbility {
    pub filter: EventFilter,
    pub effect: Rc<Effect>,
}

impl AfterSummonAbility {
    pub fn new(filter: EventFilter, effect: Effect) -> Self {
        Self {
            filter,
            effect: Rc::new(effect),
        }
    }
}

impl Ability for AfterSummonAbility {
    fn activate(&self, world: &mut World, owner: EntityId) -> UnregisterRef {
        let effect = Rc::clone(&self.effect);
        let callback = Callback::Completable(Rc::new(
            move |_: &mut World, ctx: &ListenerContext, event: &GameEvent| {
                let effect = Rc::clone(&effect);
                let ctx = *ctx;
                let event = event.clone();
                StartOutcome::deferred(
                    UndoAction::NoOp,
                    Box::new(move |world: &mut World| resolve_for(world, &effect, &ctx, &event)),
                )
            },
        ));
        world.add_listener(EventKind::MinionSummoned, 0, owner, self.filter.clone(), callback)
    }
}
