//! Registration handles and their state machine.
//!
//! Every listener, buff, aura or ability activation the world records is
//! addressed by an [`UnregisterRef`]. The table here only tracks *whether*
//! a handle is registered and *what* it points at; the owning subsystem
//! performs the actual removal and re-insertion.
//!
//! A handle is always in exactly one of two states:
//!
//! - `Registered`: `unregister` detaches it, `revoke` (the undo of the
//!   registration act) deletes it.
//! - `Unregistered`: `unregister` is a no-op, `revoke` is a contract
//!   violation. Undoing the unregistration returns it to `Registered`.
//!
//! The state flips *before* the owning subsystem runs its removal, so a
//! re-entrant `unregister` of the same handle (a listener removing itself
//! while being dispatched) already sees `Unregistered` and does nothing.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Handle of one registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnregisterRef(u64);

impl UnregisterRef {
    /// Get the raw handle value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UnregisterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Registration({})", self.0)
    }
}

/// Whether a handle is currently in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    Registered,
    Unregistered,
}

#[derive(Clone, Debug)]
struct Entry<T> {
    target: T,
    state: RegistrationState,
}

/// Table of live registration handles.
#[derive(Clone, Debug)]
pub struct RegistrationTable<T> {
    entries: FxHashMap<UnregisterRef, Entry<T>>,
    next: u64,
}

impl<T> Default for RegistrationTable<T> {
    fn default() -> Self {
        Self {
            entries: FxHashMap::default(),
            next: 0,
        }
    }
}

impl<T: Clone> RegistrationTable<T> {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new registration in the `Registered` state.
    pub fn insert(&mut self, target: T) -> UnregisterRef {
        let handle = UnregisterRef(self.next);
        self.next += 1;
        self.entries.insert(
            handle,
            Entry {
                target,
                state: RegistrationState::Registered,
            },
        );
        handle
    }

    /// Current state, or `None` if the handle was revoked or never existed.
    #[must_use]
    pub fn state(&self, handle: UnregisterRef) -> Option<RegistrationState> {
        self.entries.get(&handle).map(|e| e.state)
    }

    /// Whether the handle is registered right now.
    #[must_use]
    pub fn is_registered(&self, handle: UnregisterRef) -> bool {
        self.state(handle) == Some(RegistrationState::Registered)
    }

    /// What the handle points at.
    ///
    /// # Panics
    ///
    /// If the handle is unknown.
    #[must_use]
    pub fn target(&self, handle: UnregisterRef) -> &T {
        match self.entries.get(&handle) {
            Some(entry) => &entry.target,
            None => panic!("unknown registration {handle}"),
        }
    }

    /// Flip `Registered` to `Unregistered`.
    ///
    /// Returns the target when the flip happened, `None` when the handle was
    /// already unregistered (idempotent path).
    ///
    /// # Panics
    ///
    /// If the handle is unknown.
    pub fn begin_unregister(&mut self, handle: UnregisterRef) -> Option<T> {
        let Some(entry) = self.entries.get_mut(&handle) else {
            panic!("unregister of unknown registration {handle}");
        };
        match entry.state {
            RegistrationState::Registered => {
                entry.state = RegistrationState::Unregistered;
                Some(entry.target.clone())
            }
            RegistrationState::Unregistered => None,
        }
    }

    /// Flip `Unregistered` back to `Registered` (undo of an unregistration).
    ///
    /// # Panics
    ///
    /// If the handle is unknown or not unregistered.
    pub fn mark_registered(&mut self, handle: UnregisterRef) {
        let Some(entry) = self.entries.get_mut(&handle) else {
            panic!("re-registration of unknown registration {handle}");
        };
        assert_eq!(
            entry.state,
            RegistrationState::Unregistered,
            "{handle} is already registered"
        );
        entry.state = RegistrationState::Registered;
    }

    /// Delete a registered handle (undo of the registration act).
    ///
    /// # Panics
    ///
    /// If the handle is unknown or currently unregistered: reversing a
    /// registration whose unregistration has not been undone is illegal.
    pub fn revoke(&mut self, handle: UnregisterRef) -> T {
        let Some(entry) = self.entries.remove(&handle) else {
            panic!("undo of unknown registration {handle}");
        };
        assert_eq!(
            entry.state,
            RegistrationState::Registered,
            "undo of {handle} while it is unregistered"
        );
        entry.target
    }

    /// Number of handles currently registered.
    #[must_use]
    pub fn registered_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| e.state == RegistrationState::Registered)
            .count()
    }

    /// Number of known handles in either state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_unregister_is_idempotent() {
        let mut table = RegistrationTable::new();
        let handle = table.insert("listener");

        assert!(table.is_registered(handle));
        assert_eq!(table.begin_unregister(handle), Some("listener"));
        assert_eq!(table.begin_unregister(handle), None);
        assert_eq!(table.state(handle), Some(RegistrationState::Unregistered));
        assert_eq!(table.registered_count(), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_mark_registered_restores() {
        let mut table = RegistrationTable::new();
        let handle = table.insert(1u8);
        table.begin_unregister(handle);
        table.mark_registered(handle);
        assert!(table.is_registered(handle));
        assert_eq!(*table.target(handle), 1);
    }

    #[test]
    fn test_revoke_removes() {
        let mut table = RegistrationTable::new();
        let handle = table.insert(5u8);
        assert_eq!(table.revoke(handle), 5);
        assert_eq!(table.state(handle), None);
        assert!(table.is_empty());
    }

    #[test]
    #[should_panic(expected = "while it is unregistered")]
    fn test_revoke_after_unregister_panics() {
        let mut table = RegistrationTable::new();
        let handle = table.insert(());
        table.begin_unregister(handle);
        table.revoke(handle);
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn test_double_mark_registered_panics() {
        let mut table = RegistrationTable::new();
        let handle = table.insert(());
        table.mark_registered(handle);
    }

    #[test]
    fn test_handles_are_unique() {
        let mut table = RegistrationTable::new();
        let a = table.insert(());
        table.revoke(a);
        let b = table.insert(());
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
