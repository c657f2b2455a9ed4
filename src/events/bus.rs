//! The event bus: per-kind listener lists plus atomic batching state.
//!
//! The bus is plain storage. Dispatch itself needs the host it lives in
//! (listeners mutate the host), so the dispatch functions in
//! [`super::dispatch`] take the host and reach the bus through
//! [`EventHost::event_bus`].

use rustc_hash::FxHashMap;

use super::event::{EventKind, GameEvent};
use super::listener::{Finisher, ListenerEntry, ListenerKey, ListenerList, ListenerSnapshot};
use super::EventHost;

/// Work postponed until the outermost atomic block finishes.
pub enum Deferred<H: EventHost> {
    /// A delayable event raised inside the block.
    Event(GameEvent),
    /// The done phase of a completable event completed inside the block.
    Completion { event: GameEvent, finishers: Vec<Finisher<H>> },
}

impl<H: EventHost> std::fmt::Debug for Deferred<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deferred::Event(event) => f.debug_tuple("Event").field(event).finish(),
            Deferred::Completion { event, finishers } => f
                .debug_struct("Completion")
                .field("event", event)
                .field("finishers", &finishers.len())
                .finish(),
        }
    }
}

/// Listener storage and batching state.
pub struct EventBus<H: EventHost> {
    channels: FxHashMap<EventKind, ListenerList<H>>,
    next_seq: u64,
    atomic_depth: usize,
    pending: Vec<Deferred<H>>,
}

impl<H: EventHost> Default for EventBus<H> {
    fn default() -> Self {
        Self {
            channels: FxHashMap::default(),
            next_seq: 0,
            atomic_depth: 0,
            pending: Vec::new(),
        }
    }
}

impl<H: EventHost> EventBus<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the slot a new listener with `priority` will occupy: after
    /// every listener already registered with the same priority.
    pub fn allocate_key(&mut self, priority: i32) -> ListenerKey {
        let key = ListenerKey::new(priority, self.next_seq);
        self.next_seq += 1;
        key
    }

    /// Put a listener at `key`. Used both for new listeners and to restore
    /// one removed earlier.
    pub fn insert(&mut self, kind: EventKind, key: ListenerKey, entry: ListenerEntry<H>) {
        tracing::trace!(%kind, priority = key.priority(), owner = %entry.owner, "listener attached");
        self.channels.entry(kind).or_default().insert(key, entry);
    }

    /// Detach a listener, returning it so it can be re-inserted.
    pub fn remove(&mut self, kind: EventKind, key: ListenerKey) -> Option<ListenerEntry<H>> {
        let list = self.channels.get_mut(&kind)?;
        let removed = list.remove(key);
        if list.is_empty() {
            self.channels.remove(&kind);
        }
        removed
    }

    /// Listeners of `kind` as they are right now, in dispatch order.
    #[must_use]
    pub fn snapshot(&self, kind: EventKind) -> ListenerSnapshot<H> {
        self.channels
            .get(&kind)
            .map(ListenerList::snapshot)
            .unwrap_or_default()
    }

    /// Keys of `kind` in dispatch order.
    #[must_use]
    pub fn keys(&self, kind: EventKind) -> Vec<ListenerKey> {
        self.channels
            .get(&kind)
            .map(|list| list.keys().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.channels.get(&kind).map_or(0, ListenerList::len)
    }

    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.channels.values().map(ListenerList::len).sum()
    }

    /// Whether an atomic block is running.
    #[must_use]
    pub fn in_atomic(&self) -> bool {
        self.atomic_depth > 0
    }

    #[must_use]
    pub fn atomic_depth(&self) -> usize {
        self.atomic_depth
    }

    /// Enter a block; returns `true` for the outermost one.
    pub fn enter_atomic(&mut self) -> bool {
        self.atomic_depth += 1;
        self.atomic_depth == 1
    }

    /// Leave a block.
    ///
    /// # Panics
    ///
    /// On underflow, or when leaving the outermost block with work still
    /// queued.
    pub fn exit_atomic(&mut self) {
        assert!(self.atomic_depth > 0, "exit_atomic without matching enter_atomic");
        if self.atomic_depth == 1 {
            assert!(
                self.pending.is_empty(),
                "outermost atomic block left with {} deferred items",
                self.pending.len()
            );
        }
        self.atomic_depth -= 1;
    }

    /// Queue work for the end of the outermost block.
    pub fn defer(&mut self, item: Deferred<H>) {
        tracing::trace!(?item, depth = self.atomic_depth, "deferred");
        self.pending.push(item);
    }

    /// Take everything queued so far, in raise order.
    pub fn take_pending(&mut self) -> Vec<Deferred<H>> {
        std::mem::take(&mut self.pending)
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
