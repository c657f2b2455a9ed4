//! Event bus with priorities, atomic batching and two-phase events.
//!
//! ## Key Components
//!
//! - [`EventKind`] / [`GameEvent`]: what happened and its context
//! - [`EventFilter`]: when a listener reacts, relative to its owner
//! - [`EventBus`]: listener lists per kind, ordered by descending priority
//!   and then insertion order
//! - [`trigger_event`], [`do_atomic`], [`start_event`] / [`complete`]:
//!   dispatch against the host that owns the bus
//!
//! ## Hosts
//!
//! Listeners mutate the state the bus lives in, so the bus never calls
//! them itself. A host type implements [`EventHost`] to expose its bus and
//! name the undo step type its listeners return; the dispatch functions
//! borrow the host mutably for the duration of each callback.

mod bus;
mod dispatch;
mod event;
mod filter;
mod listener;

pub use bus::{Deferred, EventBus};
pub use dispatch::{complete, do_atomic, do_atomic_with, start_event, trigger_event, PendingCompletion};
pub use event::{EventKind, GameEvent};
pub use filter::{EntityLookup, EventFilter, FilterContext, FilterEvaluator};
pub use listener::{
    Callback, Finisher, ListenerContext, ListenerEntry, ListenerFn, ListenerKey, ListenerList,
    ListenerSnapshot, StartFn, StartOutcome,
};

/// State that owns an [`EventBus`] and is passed to its listeners.
pub trait EventHost: EntityLookup + Sized + 'static {
    /// Undo step type returned by listeners.
    type Step: 'static;

    fn event_bus(&self) -> &EventBus<Self>;

    fn event_bus_mut(&mut self) -> &mut EventBus<Self>;
}
