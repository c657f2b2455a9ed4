//! Entity storage types.
//!
//! Every buffable attribute is a [`LayeredProperty`]. Plain counters
//! (damage, armor, mana, durability) are undone by restoring the previous
//! value through a world step.

use serde::{Deserialize, Serialize};

use crate::abilities::AbilityHolder;
use crate::buffs::{LayerEdit, LayeredProperty};
use crate::cards::{CardDefinition, CardId, CardKind, Keyword};
use crate::core::{EntityId, PlayerId};
use crate::effects::Effect;
use crate::undo::Reversible;

/// Per-turn combat bookkeeping of a character.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    pub attacks_this_turn: u32,
    /// Summoning sickness.
    pub sleeping: bool,
}

/// Keyword flags of a character, one layered property per keyword.
#[derive(Clone, Debug)]
pub struct Keywords {
    flags: [LayeredProperty<bool>; 6],
}

impl Keywords {
    /// Flags with the printed keywords set in the base value.
    pub fn new(printed: &[Keyword]) -> Self {
        Self {
            flags: Keyword::ALL.map(|kw| LayeredProperty::new(printed.contains(&kw))),
        }
    }

    #[must_use]
    pub fn get(&self, keyword: Keyword) -> &LayeredProperty<bool> {
        &self.flags[keyword.index()]
    }

    pub fn get_mut(&mut self, keyword: Keyword) -> &mut LayeredProperty<bool> {
        &mut self.flags[keyword.index()]
    }

    #[must_use]
    pub fn has(&self, keyword: Keyword) -> bool {
        self.get(keyword).value()
    }

    /// Keywords currently in effect.
    #[must_use]
    pub fn active(&self) -> Vec<Keyword> {
        Keyword::ALL.into_iter().filter(|&kw| self.has(kw)).collect()
    }

    /// Silence every keyword; returns the per-keyword undos.
    pub fn silence(&mut self) -> Vec<(Keyword, Reversible<LayerEdit<bool>>)> {
        Keyword::ALL
            .into_iter()
            .map(|kw| (kw, self.flags[kw.index()].silence()))
            .filter(|(_, undo)| !undo.is_noop())
            .collect()
    }

    /// Keywords whose base value is set.
    #[must_use]
    pub fn printed(&self) -> Vec<Keyword> {
        Keyword::ALL
            .into_iter()
            .filter(|&kw| self.get(kw).base())
            .collect()
    }
}

/// Health and armor of a hero.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: i32,
    pub armor: i32,
}

/// A player's hero.
#[derive(Clone, Debug)]
pub struct Hero {
    pub vitals: Vitals,
    pub max_health: i32,
    pub attack: LayeredProperty<i32>,
    pub keywords: Keywords,
    pub combat: CombatState,
}

impl Hero {
    pub fn new(health: i32) -> Self {
        Self {
            vitals: Vitals { health, armor: 0 },
            max_health: health,
            attack: LayeredProperty::new(0),
            keywords: Keywords::new(&[]),
            combat: CombatState::default(),
        }
    }
}

/// A minion in play.
#[derive(Clone, Debug)]
pub struct Minion {
    pub id: EntityId,
    pub owner: PlayerId,
    pub card: CardId,
    pub attack: LayeredProperty<i32>,
    /// Maximum health; current health is this minus `damage`.
    pub health: LayeredProperty<i32>,
    pub damage: i32,
    pub keywords: Keywords,
    pub abilities: AbilityHolder,
    pub combat: CombatState,
    /// Destroyed, awaiting death processing.
    pub doomed: bool,
    pub deathrattle: Option<Effect>,
}

impl Minion {
    /// Fresh minion from its card. Returns `None` for non-minion cards.
    pub fn from_definition(id: EntityId, owner: PlayerId, def: &CardDefinition) -> Option<Self> {
        let CardKind::Minion { attack, health } = def.kind else {
            return None;
        };
        Some(Self {
            id,
            owner,
            card: def.id,
            attack: LayeredProperty::new(attack),
            health: LayeredProperty::new(health),
            damage: 0,
            keywords: Keywords::new(&def.keywords),
            abilities: AbilityHolder::from_defs(&def.abilities),
            combat: CombatState {
                attacks_this_turn: 0,
                sleeping: true,
            },
            doomed: false,
            deathrattle: def.deathrattle.clone(),
        })
    }

    #[must_use]
    pub fn current_health(&self) -> i32 {
        self.health.value() - self.damage
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.doomed || self.current_health() <= 0
    }
}

/// A card in a hand.
#[derive(Clone, Debug)]
pub struct Card {
    pub id: EntityId,
    pub owner: PlayerId,
    pub card: CardId,
    pub cost: LayeredProperty<i32>,
}

impl Card {
    pub fn new(id: EntityId, owner: PlayerId, def: &CardDefinition) -> Self {
        Self {
            id,
            owner,
            card: def.id,
            cost: LayeredProperty::new(def.cost),
        }
    }
}

/// An equipped weapon.
#[derive(Clone, Debug)]
pub struct Weapon {
    pub id: EntityId,
    pub card: CardId,
    pub attack: LayeredProperty<i32>,
    pub durability: i32,
    pub abilities: AbilityHolder,
}

impl Weapon {
    /// Fresh weapon from its card. Returns `None` for non-weapon cards.
    pub fn from_definition(id: EntityId, def: &CardDefinition) -> Option<Self> {
        let CardKind::Weapon { attack, durability } = def.kind else {
            return None;
        };
        Some(Self {
            id,
            card: def.id,
            attack: LayeredProperty::new(attack),
            durability,
            abilities: AbilityHolder::from_defs(&def.abilities),
        })
    }
}

/// Mana crystals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManaState {
    pub current: i32,
    pub max: i32,
}

/// Everything one seat owns.
#[derive(Clone, Debug)]
pub struct PlayerState {
    pub hero: Hero,
    pub mana: ManaState,
    /// Card entities, left to right.
    pub hand: Vec<EntityId>,
    /// Top of the deck is the end of the vector.
    pub deck: Vec<CardId>,
    /// Minion entities, left to right.
    pub board: Vec<EntityId>,
    pub graveyard: Vec<CardId>,
    pub weapon: Option<Weapon>,
    /// Damage the next empty-deck draw deals.
    pub fatigue: i32,
    pub eliminated: bool,
}

impl PlayerState {
    pub fn new(health: i32, deck: Vec<CardId>) -> Self {
        Self {
            hero: Hero::new(health),
            mana: ManaState::default(),
            hand: Vec::new(),
            deck,
            board: Vec::new(),
            graveyard: Vec::new(),
            weapon: None,
            fatigue: 0,
            eliminated: false,
        }
    }
}

/// Whose turn it is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub active: PlayerId,
    pub number: u32,
    pub started: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minion_from_definition() {
        let def = CardDefinition::minion(CardId::new(1), "Guard", 2, 1, 3).with_keyword(Keyword::Taunt);
        let minion = Minion::from_definition(EntityId(5), PlayerId::new(0), &def).unwrap();
        assert_eq!(minion.attack.value(), 1);
        assert_eq!(minion.current_health(), 3);
        assert!(minion.keywords.has(Keyword::Taunt));
        assert!(minion.combat.sleeping);
        assert!(!minion.is_dead());

        let spell = CardDefinition::spell(CardId::new(2), "Nothing", 0, Effect::draw(0));
        assert!(Minion::from_definition(EntityId(6), PlayerId::new(0), &spell).is_none());
    }

    #[test]
    fn test_keywords_silence_keeps_printed() {
        let mut keywords = Keywords::new(&[Keyword::Taunt]);
        let _ = keywords.get_mut(Keyword::Stealth).add_fast(crate::buffs::Layer::Own, Some(true));
        assert_eq!(keywords.active(), vec![Keyword::Taunt, Keyword::Stealth]);

        let undos = keywords.silence();
        assert_eq!(undos.len(), 1);
        assert_eq!(keywords.active(), vec![Keyword::Taunt]);
        assert_eq!(keywords.printed(), vec![Keyword::Taunt]);
    }
}
