//! Event dispatch: immediate, deferred and two-phase.
//!
//! Every dispatch snapshots the listener list first. Listeners added or
//! removed while an event is being delivered do not change who receives
//! that event.
//!
//! Inside an atomic block ([`do_atomic`]) delayable events and the done
//! phase of completable events are queued. The outermost block drains the
//! queue in raise order after its action returns; anything raised while
//! draining is appended and drained in the same pass. The block's undo
//! reverses the drained work (last first) and then the action.

use crate::undo::{Reversible, UndoBuilder};

use super::bus::Deferred;
use super::event::GameEvent;
use super::filter::{FilterContext, FilterEvaluator};
use super::listener::{Callback, Finisher, ListenerContext};
use super::EventHost;

/// The start phase of a completable event that has not been completed yet.
///
/// Must be handed to [`complete`] exactly once. Dropping it uncompleted
/// is a bug; debug builds panic on it, release builds let it pass and the
/// done phase never runs.
#[must_use = "a started completable event must be completed"]
pub struct PendingCompletion<H: EventHost> {
    event: GameEvent,
    finishers: Vec<Finisher<H>>,
    done: bool,
}

impl<H: EventHost> PendingCompletion<H> {
    fn new(event: GameEvent, finishers: Vec<Finisher<H>>) -> Self {
        Self {
            event,
            finishers,
            done: false,
        }
    }

    #[must_use]
    pub fn event(&self) -> &GameEvent {
        &self.event
    }

    /// Number of listeners waiting for the done phase.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.finishers.len()
    }

    fn take(&mut self) -> (GameEvent, Vec<Finisher<H>>) {
        self.done = true;
        (self.event.clone(), std::mem::take(&mut self.finishers))
    }
}

impl<H: EventHost> Drop for PendingCompletion<H> {
    fn drop(&mut self) {
        if !std::thread::panicking() {
            debug_assert!(
                self.done,
                "completable {} event dropped without being completed",
                self.event.kind
            );
        }
    }
}

/// Raise an event.
///
/// Inside an atomic block a `delayable` event is queued and `NoOp` is
/// returned; the block's own undo covers it. Otherwise listeners run now
/// and the composition of their undos is returned.
pub fn trigger_event<H: EventHost>(host: &mut H, delayable: bool, event: GameEvent) -> Reversible<H::Step> {
    if delayable && host.event_bus().in_atomic() {
        host.event_bus_mut().defer(Deferred::Event(event));
        return Reversible::NoOp;
    }
    dispatch_now(host, &event)
}

/// Run the start phase of a completable event now.
///
/// The returned [`PendingCompletion`] carries the finishers listeners held
/// back; pass it to [`complete`] once the triggering action has resolved.
pub fn start_event<H: EventHost>(host: &mut H, event: GameEvent) -> (Reversible<H::Step>, PendingCompletion<H>) {
    let (undo, finishers) = run_listeners(host, &event);
    (undo, PendingCompletion::new(event, finishers))
}

/// Run the done phase of a completable event, or queue it when inside an
/// atomic block.
pub fn complete<H: EventHost>(host: &mut H, mut pending: PendingCompletion<H>) -> Reversible<H::Step> {
    let (event, finishers) = pending.take();
    if finishers.is_empty() {
        return Reversible::NoOp;
    }
    if host.event_bus().in_atomic() {
        host.event_bus_mut().defer(Deferred::Completion { event, finishers });
        return Reversible::NoOp;
    }
    run_finishers(host, &event, finishers)
}

/// Run `action` as one atomic block.
pub fn do_atomic<H, F>(host: &mut H, action: F) -> Reversible<H::Step>
where
    H: EventHost,
    F: FnOnce(&mut H) -> Reversible<H::Step>,
{
    let ((), undo) = do_atomic_with(host, |host| ((), action(host)));
    undo
}

/// [`do_atomic`] for actions that also produce a value.
pub fn do_atomic_with<H, T, F>(host: &mut H, action: F) -> (T, Reversible<H::Step>)
where
    H: EventHost,
    F: FnOnce(&mut H) -> (T, Reversible<H::Step>),
{
    let outermost = host.event_bus_mut().enter_atomic();
    let (value, action_undo) = action(host);
    if !outermost {
        host.event_bus_mut().exit_atomic();
        return (value, action_undo);
    }

    let drained = drain(host);
    host.event_bus_mut().exit_atomic();
    (value, action_undo.then(drained))
}

fn drain<H: EventHost>(host: &mut H) -> Reversible<H::Step> {
    let mut undo = UndoBuilder::new();
    loop {
        let batch = host.event_bus_mut().take_pending();
        if batch.is_empty() {
            break;
        }
        tracing::debug!(count = batch.len(), "draining deferred events");
        for item in batch {
            match item {
                Deferred::Event(event) => undo.push(dispatch_now(host, &event)),
                Deferred::Completion { event, finishers } => {
                    undo.push(run_finishers(host, &event, finishers));
                }
            }
        }
    }
    undo.finish()
}

fn dispatch_now<H: EventHost>(host: &mut H, event: &GameEvent) -> Reversible<H::Step> {
    let (started, pending) = start_event(host, event.clone());
    started.then(complete(host, pending))
}

fn run_listeners<H: EventHost>(host: &mut H, event: &GameEvent) -> (Reversible<H::Step>, Vec<Finisher<H>>) {
    let snapshot = host.event_bus().snapshot(event.kind);
    let mut undo = UndoBuilder::new();
    let mut finishers = Vec::new();

    for (key, entry) in snapshot {
        let accepted = FilterEvaluator::evaluate(
            &entry.filter,
            &FilterContext::new(event, entry.owner, &*host),
        );
        if !accepted {
            continue;
        }

        tracing::trace!(
            kind = %event.kind,
            priority = key.priority(),
            owner = %entry.owner,
            "dispatching to listener"
        );
        let ctx = ListenerContext {
            owner: entry.owner,
            handle: entry.handle,
            priority: key.priority(),
        };
        match entry.callback {
            Callback::Plain(callback) => undo.push(callback(host, &ctx, event)),
            Callback::Completable(callback) => {
                let outcome = callback(host, &ctx, event);
                undo.push(outcome.undo);
                if let Some(finish) = outcome.finish {
                    finishers.push(finish);
                }
            }
        }
    }

    (undo.finish(), finishers)
}

fn run_finishers<H: EventHost>(host: &mut H, event: &GameEvent, finishers: Vec<Finisher<H>>) -> Reversible<H::Step> {
    tracing::trace!(kind = %event.kind, count = finishers.len(), "completing event");
    let mut undo = UndoBuilder::new();
    for finish in finishers {
        undo.push(finish(host));
    }
    undo.finish()
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::core::{EntityId, PlayerId};
    use crate::events::{
        EntityLookup, EventBus, EventFilter, EventKind, ListenerEntry, ListenerKey, StartOutcome,
    };
    use crate::undo::{RegistrationTable, Revert};

    #[derive(Clone, Debug, PartialEq)]
    struct Pop;

    #[derive(Default)]
    struct Recorder {
        bus: EventBus<Recorder>,
        handles: RegistrationTable<()>,
        log: Vec<u32>,
    }

    impl Revert<Recorder> for Pop {
        fn revert(self, host: &mut Recorder) {
            host.log.pop();
        }
    }

    impl EntityLookup for Recorder {
        fn owner_of(&self, entity: EntityId) -> Option<PlayerId> {
            Some(PlayerId::new((entity.0 % 2) as u8))
        }

        fn is_minion(&self, _entity: EntityId) -> bool {
            false
        }

        fn is_hero(&self, entity: EntityId) -> bool {
            entity.0 < 2
        }
    }

    impl EventHost for Recorder {
        type Step = Pop;

        fn event_bus(&self) -> &EventBus<Self> {
            &self.bus
        }

        fn event_bus_mut(&mut self) -> &mut EventBus<Self> {
            &mut self.bus
        }
    }

    fn attach(host: &mut Recorder, kind: EventKind, priority: i32, filter: EventFilter, callback: Callback<Recorder>) -> ListenerKey {
        let key = host.bus.allocate_key(priority);
        let handle = host.handles.insert(());
        host.bus.insert(
            kind,
            key,
            ListenerEntry {
                owner: EntityId(0),
                handle,
                filter,
                callback,
            },
        );
        key
    }

    fn recording(tag: u32) -> Callback<Recorder> {
        Callback::Plain(Rc::new(move |host: &mut Recorder, _: &ListenerContext, _: &GameEvent| {
            host.log.push(tag);
            Reversible::step(Pop)
        }))
    }

    fn listen(host: &mut Recorder, kind: EventKind, priority: i32, tag: u32) -> ListenerKey {
        attach(host, kind, priority, EventFilter::Always, recording(tag))
    }

    fn damage() -> GameEvent {
        GameEvent::new(EventKind::DamageDealt)
    }

    #[test]
    fn test_priority_then_fifo() {
        let mut host = Recorder::default();
        for (tag, priority) in [5, 1, 5, 3].into_iter().enumerate() {
            listen(&mut host, EventKind::DamageDealt, priority, tag as u32);
        }

        let undo = trigger_event(&mut host, false, damage());
        assert_eq!(host.log, vec![0, 2, 3, 1]);

        undo.undo(&mut host);
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let mut host = Recorder::default();
        listen(&mut host, EventKind::DamageDealt, 0, 0);
        let middle = listen(&mut host, EventKind::DamageDealt, 0, 1);
        listen(&mut host, EventKind::DamageDealt, 0, 2);

        let entry = host.bus.remove(EventKind::DamageDealt, middle).unwrap();
        let _ = trigger_event(&mut host, false, damage());
        assert_eq!(host.log, vec![0, 2]);

        host.log.clear();
        host.bus.insert(EventKind::DamageDealt, middle, entry);
        let _ = trigger_event(&mut host, false, damage());
        assert_eq!(host.log, vec![0, 1, 2]);
    }

    #[test]
    fn test_snapshot_ignores_listeners_added_during_dispatch() {
        let mut host = Recorder::default();
        let spawner = Callback::Plain(Rc::new(|host: &mut Recorder, _: &ListenerContext, _: &GameEvent| {
            host.log.push(100);
            listen(host, EventKind::DamageDealt, 10, 200);
            Reversible::step(Pop)
        }));
        attach(&mut host, EventKind::DamageDealt, 0, EventFilter::Always, spawner);

        let _ = trigger_event(&mut host, false, damage());
        assert_eq!(host.log, vec![100]);

        host.log.clear();
        let _ = trigger_event(&mut host, false, damage());
        assert_eq!(host.log, vec![200, 100]);
    }

    #[test]
    fn test_filter_rejection_is_noop() {
        let mut host = Recorder::default();
        attach(
            &mut host,
            EventKind::TurnStarted,
            0,
            EventFilter::ForOwner,
            recording(1),
        );
        let undo = trigger_event(
            &mut host,
            false,
            GameEvent::for_player(EventKind::TurnStarted, PlayerId::new(1)),
        );
        assert!(undo.is_noop());
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_atomic_defers_and_undoes_drained_first() {
        let mut host = Recorder::default();
        listen(&mut host, EventKind::DamageDealt, 0, 7);

        let undo = do_atomic(&mut host, |host| {
            host.log.push(1);
            let first = trigger_event(host, true, damage());
            let second = trigger_event(host, true, damage());
            assert!(first.is_noop() && second.is_noop());
            // Nothing delivered yet.
            assert_eq!(host.log, vec![1]);
            Reversible::step(Pop)
        });
        assert_eq!(host.log, vec![1, 7, 7]);
        assert_eq!(undo.step_count(), 3);

        undo.undo(&mut host);
        assert!(host.log.is_empty());
        assert!(!host.bus.in_atomic());
    }

    #[test]
    fn test_non_delayable_runs_inside_atomic() {
        let mut host = Recorder::default();
        listen(&mut host, EventKind::DamageDealt, 0, 7);

        let _ = do_atomic(&mut host, |host| {
            let undo = trigger_event(host, false, damage());
            assert_eq!(host.log, vec![7]);
            undo
        });
        assert_eq!(host.log, vec![7]);
    }

    #[test]
    fn test_nested_atomic_drains_once_at_outermost() {
        let mut host = Recorder::default();
        listen(&mut host, EventKind::DamageDealt, 0, 7);

        let undo = do_atomic(&mut host, |host| {
            let inner = do_atomic(host, |host| trigger_event(host, true, damage()));
            assert!(host.log.is_empty());
            assert_eq!(host.bus.pending_len(), 1);
            inner
        });
        assert_eq!(host.log, vec![7]);
        undo.undo(&mut host);
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_events_raised_while_draining_are_drained_in_order() {
        let mut host = Recorder::default();
        let chain = Callback::Plain(Rc::new(|host: &mut Recorder, _: &ListenerContext, _: &GameEvent| {
            host.log.push(1);
            let nested = trigger_event(host, true, GameEvent::new(EventKind::Healed));
            Reversible::step(Pop).then(nested)
        }));
        attach(&mut host, EventKind::DamageDealt, 0, EventFilter::Always, chain);
        listen(&mut host, EventKind::Healed, 0, 2);
        listen(&mut host, EventKind::ArmorGained, 0, 3);

        let undo = do_atomic(&mut host, |host| {
            let a = trigger_event(host, true, damage());
            let b = trigger_event(host, true, GameEvent::new(EventKind::ArmorGained));
            a.then(b)
        });
        assert_eq!(host.log, vec![1, 3, 2]);
        undo.undo(&mut host);
        assert!(host.log.is_empty());
    }

    fn two_phase(start_tag: u32, done_tag: u32) -> Callback<Recorder> {
        Callback::Completable(Rc::new(move |host: &mut Recorder, _: &ListenerContext, _: &GameEvent| {
            host.log.push(start_tag);
            StartOutcome::deferred(
                Reversible::step(Pop),
                Box::new(move |host: &mut Recorder| {
                    host.log.push(done_tag);
                    Reversible::step(Pop)
                }),
            )
        }))
    }

    #[test]
    fn test_completable_two_phases() {
        let mut host = Recorder::default();
        attach(&mut host, EventKind::MinionSummoned, 0, EventFilter::Always, two_phase(1, 2));

        let (started, pending) = start_event(&mut host, GameEvent::new(EventKind::MinionSummoned));
        assert_eq!(host.log, vec![1]);
        assert_eq!(pending.waiting(), 1);

        let done = complete(&mut host, pending);
        assert_eq!(host.log, vec![1, 2]);

        started.then(done).undo(&mut host);
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_completion_deferred_inside_atomic() {
        let mut host = Recorder::default();
        attach(&mut host, EventKind::MinionSummoned, 0, EventFilter::Always, two_phase(1, 2));
        listen(&mut host, EventKind::DamageDealt, 0, 3);

        let undo = do_atomic(&mut host, |host| {
            let (started, pending) = start_event(host, GameEvent::new(EventKind::MinionSummoned));
            let raised = trigger_event(host, true, damage());
            let done = complete(host, pending);
            assert_eq!(host.log, vec![1]);
            Reversible::compose([started, raised, done])
        });
        assert_eq!(host.log, vec![1, 3, 2]);
        undo.undo(&mut host);
        assert!(host.log.is_empty());
    }

    #[test]
    fn test_trigger_completes_completable_listeners() {
        let mut host = Recorder::default();
        attach(&mut host, EventKind::MinionSummoned, 0, EventFilter::Always, two_phase(1, 2));
        let undo = trigger_event(&mut host, false, GameEvent::new(EventKind::MinionSummoned));
        assert_eq!(host.log, vec![1, 2]);
        undo.undo(&mut host);
        assert!(host.log.is_empty());
    }

    #[test]
    #[should_panic(expected = "without matching enter_atomic")]
    fn test_exit_underflow_panics() {
        let mut bus: EventBus<Recorder> = EventBus::new();
        bus.exit_atomic();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "dropped without being completed")]
    fn test_dropped_completion_panics_in_debug() {
        let mut host = Recorder::default();
        attach(&mut host, EventKind::MinionSummoned, 0, EventFilter::Always, two_phase(1, 2));
        let (_started, pending) = start_event(&mut host, GameEvent::new(EventKind::MinionSummoned));
        drop(pending);
    }
}
