//! Printed card data.
//!
//! `CardDefinition` holds the immutable properties of a card type: its
//! cost, what kind of card it is, its printed stats and keywords, and the
//! abilities and effects it carries. Everything that can change during a
//! game lives on the entity created from the definition.

use serde::{Deserialize, Serialize};

use super::attributes::Keyword;
use crate::abilities::AbilityDef;
use crate::effects::Effect;

/// Names a card in the pool. Every copy shares it; a copy gets its own
/// [`EntityId`](crate::core::EntityId) once it is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// What a card becomes when played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    Minion { attack: i32, health: i32 },
    Spell,
    Weapon { attack: i32, durability: i32 },
}

/// Which characters a card may be aimed at when played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChosenTarget {
    AnyCharacter,
    AnyMinion,
    EnemyCharacter,
    EnemyMinion,
    FriendlyCharacter,
    FriendlyMinion,
}

/// A card as printed.
///
/// ```
/// use rust_ccg_rules::cards::{CardDefinition, CardId, Keyword};
///
/// let guard = CardDefinition::minion(CardId::new(1), "Shieldbearer", 1, 0, 4)
///     .with_keyword(Keyword::Taunt);
///
/// assert!(guard.has_keyword(Keyword::Taunt));
/// assert!(guard.is_minion());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,

    /// Shown in logs only.
    pub name: String,

    /// Printed mana cost.
    pub cost: i32,

    pub kind: CardKind,

    /// Printed keywords (minions only).
    #[serde(default)]
    pub keywords: Vec<Keyword>,

    /// Passive abilities active while the minion or weapon is in play.
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,

    /// Battlecry for minions and weapons, the whole effect for spells.
    #[serde(default)]
    pub on_play: Option<Effect>,

    /// Effect resolved after the minion dies.
    #[serde(default)]
    pub deathrattle: Option<Effect>,

    /// Target the player must choose when playing the card.
    #[serde(default)]
    pub target: Option<ChosenTarget>,
}

impl CardDefinition {
    fn new(id: CardId, name: impl Into<String>, cost: i32, kind: CardKind) -> Self {
        Self {
            id,
            name: name.into(),
            cost,
            kind,
            keywords: Vec::new(),
            abilities: Vec::new(),
            on_play: None,
            deathrattle: None,
            target: None,
        }
    }

    /// Create a minion card.
    #[must_use]
    pub fn minion(id: CardId, name: impl Into<String>, cost: i32, attack: i32, health: i32) -> Self {
        Self::new(id, name, cost, CardKind::Minion { attack, health })
    }

    /// Create a spell card.
    #[must_use]
    pub fn spell(id: CardId, name: impl Into<String>, cost: i32, effect: Effect) -> Self {
        Self::new(id, name, cost, CardKind::Spell).with_on_play(effect)
    }

    /// Create a weapon card.
    #[must_use]
    pub fn weapon(id: CardId, name: impl Into<String>, cost: i32, attack: i32, durability: i32) -> Self {
        Self::new(id, name, cost, CardKind::Weapon { attack, durability })
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        if !self.keywords.contains(&keyword) {
            self.keywords.push(keyword);
        }
        self
    }

    /// Add a passive ability (builder pattern).
    #[must_use]
    pub fn with_ability(mut self, ability: AbilityDef) -> Self {
        self.abilities.push(ability);
        self
    }

    /// Set the battlecry / spell effect (builder pattern).
    #[must_use]
    pub fn with_on_play(mut self, effect: Effect) -> Self {
        self.on_play = Some(effect);
        self
    }

    /// Set the deathrattle (builder pattern).
    #[must_use]
    pub fn with_deathrattle(mut self, effect: Effect) -> Self {
        self.deathrattle = Some(effect);
        self
    }

    /// Require a chosen target (builder pattern).
    #[must_use]
    pub fn with_target(mut self, target: ChosenTarget) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
    }

    #[must_use]
    pub fn is_minion(&self) -> bool {
        matches!(self.kind, CardKind::Minion { .. })
    }

    /// Cards this definition can put on the board through its effects.
    #[must_use]
    pub fn summoned_cards(&self) -> Vec<CardId> {
        let mut out = Vec::new();
        for effect in self.on_play.iter().chain(&self.deathrattle) {
            effect.summoned_cards(&mut out);
        }
        for ability in &self.abilities {
            ability.summoned_cards(&mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::Target;

    #[test]
    fn test_summoned_cards_cover_every_slot() {
        let card = CardDefinition::minion(CardId::new(1), "Broodmother", 4, 2, 4)
            .with_on_play(Effect::summon(CardId::new(2), 1))
            .with_deathrattle(Effect::summon(CardId::new(3), 2))
            .with_ability(AbilityDef::once(
                crate::events::EventKind::TurnEnded,
                crate::events::EventFilter::ForOwner,
                Effect::summon(CardId::new(4), 1),
            ));
        assert_eq!(
            card.summoned_cards(),
            vec![CardId::new(2), CardId::new(3), CardId::new(4)]
        );
        assert_eq!(format!("{}", CardId::new(42)), "Card(42)");
    }

    #[test]
    fn test_minion_builder() {
        let card = CardDefinition::minion(CardId::new(1), "Test Minion", 3, 2, 2)
            .with_keyword(Keyword::Charge)
            .with_keyword(Keyword::Charge)
            .with_deathrattle(Effect::draw(1));

        assert_eq!(card.name, "Test Minion");
        assert_eq!(card.kind, CardKind::Minion { attack: 2, health: 2 });
        assert_eq!(card.keywords, vec![Keyword::Charge]);
        assert!(card.deathrattle.is_some());
        assert!(card.is_minion());
    }

    #[test]
    fn test_spell_builder() {
        let bolt = CardDefinition::spell(CardId::new(2), "Bolt", 1, Effect::damage(Target::Chosen, 3))
            .with_target(ChosenTarget::AnyCharacter);
        assert!(!bolt.is_minion());
        assert_eq!(bolt.on_play, Some(Effect::damage(Target::Chosen, 3)));
        assert_eq!(bolt.target, Some(ChosenTarget::AnyCharacter));
    }

    #[test]
    fn test_card_definition_serialization() {
        let card = CardDefinition::weapon(CardId::new(3), "Axe", 2, 3, 2)
            .with_on_play(Effect::GainArmor { amount: 2 });

        let json = serde_json::to_string(&card).unwrap();
        let deserialized: CardDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(card, deserialized);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{"id":7,"name":"Wisp","cost":0,"kind":{"Minion":{"attack":1,"health":1}}}"#;
        let card: CardDefinition = serde_json::from_str(json).unwrap();
        assert!(card.abilities.is_empty());
        assert!(card.on_play.is_none());
    }
}
