//! Serializable ability definitions.
//!
//! Card data describes abilities with [`AbilityDef`]; [`AbilityDef::build`]
//! is the factory that turns a definition into a live [`AbilityRef`].

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::buffs::AuraDef;
use crate::cards::CardId;
use crate::effects::Effect;
use crate::events::{EventFilter, EventKind};

use super::ability::{merge, AbilityRef};
use super::aura::AuraAbility;
use super::triggered::{AfterSummonAbility, OnceAbility, TriggeredAbility};

/// Definition of an ability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityDef {
    /// Resolve `effect` whenever an `on` event passes `filter`.
    Triggered {
        on: EventKind,
        #[serde(default)]
        priority: i32,
        #[serde(default)]
        filter: EventFilter,
        effect: Effect,
    },

    /// Resolve `effect` for the first `on` event passing `filter`.
    Once {
        on: EventKind,
        #[serde(default)]
        priority: i32,
        #[serde(default)]
        filter: EventFilter,
        effect: Effect,
    },

    /// Resolve `effect` after a summon passing `filter` has resolved.
    AfterSummon {
        #[serde(default)]
        filter: EventFilter,
        effect: Effect,
    },

    Aura(AuraDef),

    /// Several abilities activated and deactivated together.
    Merged(Vec<AbilityDef>),
}

impl AbilityDef {
    /// Create a triggered ability definition.
    pub fn triggered(on: EventKind, filter: EventFilter, effect: Effect) -> Self {
        Self::Triggered {
            on,
            priority: 0,
            filter,
            effect,
        }
    }

    /// Create a trigger-once ability definition.
    pub fn once(on: EventKind, filter: EventFilter, effect: Effect) -> Self {
        Self::Once {
            on,
            priority: 0,
            filter,
            effect,
        }
    }

    /// Push every card this ability can summon.
    pub fn summoned_cards(&self, out: &mut Vec<CardId>) {
        match self {
            AbilityDef::Triggered { effect, .. }
            | AbilityDef::Once { effect, .. }
            | AbilityDef::AfterSummon { effect, .. } => effect.summoned_cards(out),
            AbilityDef::Aura(_) => {}
            AbilityDef::Merged(defs) => defs.iter().for_each(|d| d.summoned_cards(out)),
        }
    }

    /// Build the live ability.
    #[must_use]
    pub fn build(&self) -> AbilityRef {
        match self {
            AbilityDef::Triggered {
                on,
                priority,
                filter,
                effect,
            } => Rc::new(
                TriggeredAbility::new(*on, effect.clone())
                    .with_filter(filter.clone())
                    .with_priority(*priority),
            ),
            AbilityDef::Once {
                on,
                priority,
                filter,
                effect,
            } => Rc::new(OnceAbility(
                TriggeredAbility::new(*on, effect.clone())
                    .with_filter(filter.clone())
                    .with_priority(*priority),
            )),
            AbilityDef::AfterSummon { filter, effect } => {
                Rc::new(AfterSummonAbility::new(filter.clone(), effect.clone()))
            }
            AbilityDef::Aura(def) => Rc::new(AuraAbility::new(def.clone())),
            AbilityDef::Merged(defs) => merge(defs.iter().map(AbilityDef::build)),
        }
    }
}
