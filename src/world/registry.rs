//! Registration, unregistration and revocation of world handles.
//!
//! Unregistering detaches what a handle points at and returns the undo
//! that re-attaches it in the same slot. Revoking is the undo of the
//! registration itself: the handle and everything it points at are
//! deleted without recording anything.

use crate::buffs::AuraDef;
use crate::core::EntityId;
use crate::events::{Callback, EntityLookup, EventFilter, EventKind, ListenerEntry};
use crate::undo::{UndoBuilder, UnregisterRef};

use super::step::{lift_flag, lift_stat, Registration, UndoAction, WorldStep};
use super::World;

impl World {
    /// The undo of registering `handle`.
    pub fn registration_undo(&self, handle: UnregisterRef) -> UndoAction {
        UndoAction::step(WorldStep::Revoke(handle))
    }

    /// A handle that points at nothing.
    pub fn register_inert(&mut self) -> UnregisterRef {
        self.registrations.insert(Registration::Inert)
    }

    /// One handle for several registrations.
    pub fn register_group(&mut self, children: Vec<UnregisterRef>) -> UnregisterRef {
        self.registrations.insert(Registration::Group(children))
    }

    /// Register an aura sourced at `source`. Its targets are reconciled on
    /// the next [`World::refresh_auras`].
    pub fn register_aura(&mut self, source: EntityId, def: AuraDef) -> UnregisterRef {
        let owner = self.owner_of(source).unwrap_or(self.turn.active);
        let id = self.auras.insert(source, owner, def);
        tracing::debug!(%source, aura = %id, "aura registered");
        self.registrations.insert(Registration::Aura(id))
    }

    /// Attach a listener for `kind` owned by `owner`.
    ///
    /// The listener runs after every listener of higher priority and after
    /// every listener of equal priority registered before it.
    pub fn add_listener(
        &mut self,
        kind: EventKind,
        priority: i32,
        owner: EntityId,
        filter: EventFilter,
        callback: Callback<World>,
    ) -> UnregisterRef {
        let key = self.bus.allocate_key(priority);
        let handle = self.registrations.insert(Registration::Listener { kind, key });
        self.bus.insert(
            kind,
            key,
            ListenerEntry {
                owner,
                handle,
                filter,
                callback,
            },
        );
        handle
    }

    /// Detach whatever `handle` points at.
    ///
    /// Unregistering a handle that is already unregistered is a no-op.
    pub fn unregister(&mut self, handle: UnregisterRef) -> UndoAction {
        let Some(target) = self.registrations.begin_unregister(handle) else {
            return UndoAction::NoOp;
        };
        let detached = match target {
            Registration::Listener { kind, key } => match self.bus.remove(kind, key) {
                Some(entry) => UndoAction::step(WorldStep::ReattachListener { kind, key, entry }),
                None => UndoAction::NoOp,
            },
            Registration::Stat { key, layer, id } => match self.stat_mut(key) {
                Some(property) => lift_stat(key, property.remove_buff(layer, id)),
                None => UndoAction::NoOp,
            },
            Registration::Flag { key, layer, id } => match self.flag_mut(key) {
                Some(property) => lift_flag(key, property.remove_buff(layer, id)),
                None => UndoAction::NoOp,
            },
            Registration::Aura(id) => match self.auras.remove(id) {
                Some(aura) => {
                    let mut undo = UndoBuilder::new();
                    let applied: Vec<UnregisterRef> = aura.applied.values().copied().collect();
                    undo.push_step(WorldStep::ReattachAura(Box::new(aura)));
                    for child in applied.into_iter().rev() {
                        undo.push(self.unregister(child));
                    }
                    undo.finish()
                }
                None => UndoAction::NoOp,
            },
            Registration::Group(children) => {
                let mut undo = UndoBuilder::new();
                for child in children.into_iter().rev() {
                    undo.push(self.unregister(child));
                }
                undo.finish()
            }
            Registration::Inert => UndoAction::NoOp,
        };
        tracing::debug!(%handle, "unregistered");
        UndoAction::step(WorldStep::MarkRegistered(handle)).then(detached)
    }

    /// Delete a registered handle and what it points at.
    ///
    /// # Panics
    ///
    /// If the handle is unknown or unregistered.
    pub(crate) fn revoke(&mut self, handle: UnregisterRef) {
        match self.registrations.revoke(handle) {
            Registration::Listener { kind, key } => {
                self.bus.remove(kind, key);
            }
            Registration::Stat { key, layer, id } => {
                if let Some(property) = self.stat_mut(key) {
                    let _ = property.remove_buff(layer, id);
                }
            }
            Registration::Flag { key, layer, id } => {
                if let Some(property) = self.flag_mut(key) {
                    let _ = property.remove_buff(layer, id);
                }
            }
            Registration::Aura(id) => {
                if let Some(aura) = self.auras.remove(id) {
                    for child in aura.applied.into_values().rev() {
                        self.revoke(child);
                    }
                }
            }
            Registration::Group(children) => {
                for child in children.into_iter().rev() {
                    self.revoke(child);
                }
            }
            Registration::Inert => {}
        }
        tracing::trace!(%handle, "registration revoked");
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::buffs::{IntBuff, Layer};
    use crate::cards::Stat;
    use crate::core::{EntityId, PlayerId};
    use crate::events::{trigger_event, GameEvent, ListenerContext};
    use crate::world::testing::{minion_card, world_with_minion};
    use crate::world::StatKey;

    use super::*;

    #[test]
    fn test_unregister_is_idempotent() {
        let (mut world, minion) = world_with_minion(minion_card(1, 2, 2));
        let handle = world
            .add_stat_buff(StatKey::new(minion, Stat::Attack), Layer::Own, IntBuff::Add(3))
            .unwrap();
        assert_eq!(world.stat(minion, Stat::Attack), Some(5));

        let first = world.unregister(handle);
        assert_eq!(world.stat(minion, Stat::Attack), Some(2));
        assert!(world.unregister(handle).is_noop());

        first.undo(&mut world);
        assert_eq!(world.stat(minion, Stat::Attack), Some(5));
        assert!(world.registrations().is_registered(handle));
    }

    #[test]
    fn test_revoke_removes_buff_and_handle() {
        let (mut world, minion) = world_with_minion(minion_card(1, 2, 2));
        let handle = world
            .add_stat_buff(StatKey::new(minion, Stat::Health), Layer::Own, IntBuff::Add(1))
            .unwrap();
        world.registration_undo(handle).undo(&mut world);
        assert_eq!(world.stat(minion, Stat::Health), Some(2));
        assert_eq!(world.registrations().state(handle), None);
    }

    #[test]
    #[should_panic(expected = "while it is unregistered")]
    fn test_revoke_after_unregister_panics() {
        let (mut world, _) = world_with_minion(minion_card(1, 1, 1));
        let handle = world.register_inert();
        let _ = world.unregister(handle);
        world.registration_undo(handle).undo(&mut world);
    }

    #[test]
    fn test_group_unregisters_children_in_reverse() {
        let (mut world, minion) = world_with_minion(minion_card(1, 1, 1));
        let key = StatKey::new(minion, Stat::Attack);
        let double = world.add_stat_buff(key, Layer::Own, IntBuff::Multiply(2)).unwrap();
        let plus = world.add_stat_buff(key, Layer::Own, IntBuff::Add(1)).unwrap();
        let group = world.register_group(vec![double, plus]);
        assert_eq!(world.stat(minion, Stat::Attack), Some(3));

        let undo = world.unregister(group);
        assert_eq!(world.stat(minion, Stat::Attack), Some(1));
        assert!(!world.registrations().is_registered(double));

        undo.undo(&mut world);
        assert_eq!(world.stat(minion, Stat::Attack), Some(3));
        assert!(world.registrations().is_registered(plus));
    }

    #[test]
    fn test_listener_reattaches_in_place() {
        let (mut world, minion) = world_with_minion(minion_card(1, 1, 1));
        let calls = Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut handles = Vec::new();
        for tag in 0..3 {
            let calls = Rc::clone(&calls);
            handles.push(world.add_listener(
                EventKind::TurnEnded,
                0,
                minion,
                EventFilter::Always,
                Callback::Plain(Rc::new(move |_: &mut World, _: &ListenerContext, _: &GameEvent| {
                    calls.borrow_mut().push(tag);
                    UndoAction::NoOp
                })),
            ));
        }

        let undo = world.unregister(handles[1]);
        undo.undo(&mut world);

        let _ = trigger_event(
            &mut world,
            false,
            GameEvent::for_player(EventKind::TurnEnded, PlayerId::new(0)),
        );
        assert_eq!(*calls.borrow(), vec![0, 1, 2]);
        assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 3);
        assert!(world.owner_of(EntityId::hero(PlayerId::new(1))).is_some());
    }
}
