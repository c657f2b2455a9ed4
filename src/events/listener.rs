//! Listener storage.
//!
//! Listeners of one event kind live in a [`ListenerList`], ordered by
//! [`ListenerKey`]: descending priority, then insertion sequence. The key
//! is allocated once and kept by the registration, so a removed listener
//! can be put back exactly where it was.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::core::EntityId;
use crate::undo::{Reversible, UnregisterRef};

use super::event::GameEvent;
use super::filter::EventFilter;
use super::EventHost;

/// What a listener callback receives besides the event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ListenerContext {
    /// Entity the listener belongs to.
    pub owner: EntityId,
    /// Registration of the listener itself.
    pub handle: UnregisterRef,
    pub priority: i32,
}

/// Plain listener: reacts and returns the undo of its reaction.
pub type ListenerFn<H> =
    Rc<dyn Fn(&mut H, &ListenerContext, &GameEvent) -> Reversible<<H as EventHost>::Step>>;

/// Deferred second half of a completable listener.
pub type Finisher<H> = Box<dyn FnOnce(&mut H) -> Reversible<<H as EventHost>::Step>>;

/// Start phase of a completable listener.
pub type StartFn<H> = Rc<dyn Fn(&mut H, &ListenerContext, &GameEvent) -> StartOutcome<H>>;

/// Result of a completable listener's start phase.
pub struct StartOutcome<H: EventHost> {
    pub undo: Reversible<H::Step>,
    /// Runs once the event is completed.
    pub finish: Option<Finisher<H>>,
}

impl<H: EventHost> StartOutcome<H> {
    /// Start phase with nothing held back.
    pub fn immediate(undo: Reversible<H::Step>) -> Self {
        Self { undo, finish: None }
    }

    /// Start phase that holds back `finish` until completion.
    pub fn deferred(undo: Reversible<H::Step>, finish: Finisher<H>) -> Self {
        Self {
            undo,
            finish: Some(finish),
        }
    }
}

/// A listener callback of either phase model.
pub enum Callback<H: EventHost> {
    Plain(ListenerFn<H>),
    Completable(StartFn<H>),
}

impl<H: EventHost> Clone for Callback<H> {
    fn clone(&self) -> Self {
        match self {
            Callback::Plain(f) => Callback::Plain(Rc::clone(f)),
            Callback::Completable(f) => Callback::Completable(Rc::clone(f)),
        }
    }
}

/// Ordering key of a listener within its kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerKey {
    rank: Reverse<i32>,
    seq: u64,
}

impl ListenerKey {
    pub(crate) fn new(priority: i32, seq: u64) -> Self {
        Self {
            rank: Reverse(priority),
            seq,
        }
    }

    #[must_use]
    pub fn priority(self) -> i32 {
        self.rank.0
    }

    /// Insertion sequence, unique per bus.
    #[must_use]
    pub fn seq(self) -> u64 {
        self.seq
    }
}

/// One registered listener.
pub struct ListenerEntry<H: EventHost> {
    pub owner: EntityId,
    pub handle: UnregisterRef,
    pub filter: EventFilter,
    pub callback: Callback<H>,
}

impl<H: EventHost> Clone for ListenerEntry<H> {
    fn clone(&self) -> Self {
        Self {
            owner: self.owner,
            handle: self.handle,
            filter: self.filter.clone(),
            callback: self.callback.clone(),
        }
    }
}

impl<H: EventHost> fmt::Debug for ListenerEntry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phases = match self.callback {
            Callback::Plain(_) => "plain",
            Callback::Completable(_) => "completable",
        };
        f.debug_struct("ListenerEntry")
            .field("owner", &self.owner)
            .field("handle", &self.handle)
            .field("filter", &self.filter)
            .field("callback", &phases)
            .finish()
    }
}

/// Snapshot of a list taken before dispatch.
pub type ListenerSnapshot<H> = SmallVec<[(ListenerKey, ListenerEntry<H>); 8]>;

/// Listeners of one event kind in dispatch order.
pub struct ListenerList<H: EventHost> {
    entries: BTreeMap<ListenerKey, ListenerEntry<H>>,
}

impl<H: EventHost> Default for ListenerList<H> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<H: EventHost> ListenerList<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at `key`.
    ///
    /// # Panics
    ///
    /// If the key is already occupied.
    pub fn insert(&mut self, key: ListenerKey, entry: ListenerEntry<H>) {
        let previous = self.entries.insert(key, entry);
        assert!(previous.is_none(), "listener slot {key:?} is already taken");
    }

    pub fn remove(&mut self, key: ListenerKey) -> Option<ListenerEntry<H>> {
        self.entries.remove(&key)
    }

    /// Copy of the current listeners in dispatch order.
    #[must_use]
    pub fn snapshot(&self) -> ListenerSnapshot<H> {
        self.entries
            .iter()
            .map(|(key, entry)| (*key, entry.clone()))
            .collect()
    }

    /// Keys in dispatch order.
    pub fn keys(&self) -> impl Iterator<Item = ListenerKey> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
