//! Ability ownership and passive activation.
//!
//! An entity's abilities are activated together when it enters play and
//! deactivated together when it leaves or is silenced. Abilities granted
//! while the entity is active are activated immediately and tracked with
//! the rest.

use crate::core::EntityId;
use crate::undo::{UndoBuilder, UnregisterRef};
use crate::world::{UndoAction, World, WorldStep};

use super::ability::{merge, AbilityRef};
use super::def::AbilityDef;

/// The abilities an entity owns and the registrations of the active ones.
#[derive(Clone, Debug, Default)]
pub struct AbilityHolder {
    pub(crate) abilities: Vec<AbilityRef>,
    pub(crate) active: Option<Vec<UnregisterRef>>,
}

impl AbilityHolder {
    pub fn new(abilities: Vec<AbilityRef>) -> Self {
        Self {
            abilities,
            active: None,
        }
    }

    /// Build every ability of a card.
    pub fn from_defs(defs: &[AbilityDef]) -> Self {
        Self::new(defs.iter().map(AbilityDef::build).collect())
    }

    #[must_use]
    pub fn abilities(&self) -> &[AbilityRef] {
        &self.abilities
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Number of live activations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.as_ref().map_or(0, Vec::len)
    }
}

impl World {
    /// Activate every ability of `entity` as one merged registration.
    ///
    /// Does nothing if the passives are already active or the entity holds
    /// no abilities container.
    pub fn activate_passives(&mut self, entity: EntityId) -> UndoAction {
        let ability = match self.holder(entity) {
            Some(holder) if !holder.is_active() => merge(holder.abilities.iter().cloned()),
            _ => return UndoAction::NoOp,
        };
        let handle = ability.activate(self, entity);
        if let Some(holder) = self.holder_mut(entity) {
            holder.active = Some(vec![handle]);
        }
        tracing::debug!(%entity, %handle, "passives activated");
        self.registration_undo(handle)
            .then(UndoAction::step(WorldStep::PassivesActivated(entity)))
    }

    /// Unregister every active registration of `entity`, newest first.
    pub fn deactivate_all(&mut self, entity: EntityId) -> UndoAction {
        let Some(refs) = self.holder_mut(entity).and_then(|holder| holder.active.take()) else {
            return UndoAction::NoOp;
        };
        let mut undo = UndoBuilder::new();
        undo.push_step(WorldStep::PassivesDeactivated {
            entity,
            refs: refs.clone(),
        });
        for handle in refs.into_iter().rev() {
            undo.push(self.unregister(handle));
        }
        tracing::debug!(%entity, "passives deactivated");
        undo.finish()
    }

    /// Give `entity` another ability, activating it right away when the
    /// entity's passives are active.
    pub fn grant_ability(&mut self, entity: EntityId, ability: AbilityRef) -> UndoAction {
        let active = match self.holder_mut(entity) {
            Some(holder) => {
                holder.abilities.push(ability.clone());
                holder.is_active()
            }
            None => return UndoAction::NoOp,
        };
        let mut undo = UndoBuilder::new();
        undo.push_step(WorldStep::AbilityGranted(entity));
        if active {
            let handle = ability.activate(self, entity);
            undo.push(self.registration_undo(handle));
            if let Some(refs) = self.holder_mut(entity).and_then(|holder| holder.active.as_mut()) {
                refs.push(handle);
            }
            undo.push_step(WorldStep::ActiveRefPushed(entity));
        }
        undo.finish()
    }

    /// Remove every ability of `entity`. The entity stays active, so
    /// abilities granted afterwards still take effect.
    pub fn silence_abilities(&mut self, entity: EntityId) -> UndoAction {
        let was_active = self.holder(entity).is_some_and(AbilityHolder::is_active);
        let mut undo = UndoBuilder::new();
        undo.push(self.deactivate_all(entity));
        if let Some(holder) = self.holder_mut(entity) {
            let abilities = std::mem::take(&mut holder.abilities);
            undo.push_step(WorldStep::AbilitiesCleared { entity, abilities });
        }
        if was_active {
            undo.push(self.activate_passives(entity));
        }
        undo.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::{AbilityDef, InactiveAbility};
    use crate::effects::Effect;
    use crate::events::{EventFilter, EventKind};
    use std::rc::Rc;

    #[test]
    fn test_holder_from_defs() {
        let holder = AbilityHolder::from_defs(&[
            AbilityDef::triggered(EventKind::TurnEnded, EventFilter::ForOwner, Effect::draw(1)),
            AbilityDef::once(EventKind::CardDrawn, EventFilter::Always, Effect::draw(1)),
        ]);
        assert_eq!(holder.abilities().len(), 2);
        assert!(!holder.is_active());
        assert_eq!(holder.active_count(), 0);
    }

    #[test]
    fn test_default_holder_accepts_abilities() {
        let mut holder = AbilityHolder::default();
        holder.abilities.push(Rc::new(InactiveAbility));
        assert_eq!(holder.abilities().len(), 1);
    }
}
