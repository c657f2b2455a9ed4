//! Effect targeting.
//!
//! - `Target`: which entities an effect reaches, relative to its source
//! - `EffectContext`: who is resolving the effect and why
//! - `TargetSelector`: turns a `Target` into entity ids against the world

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::cards::{ChosenTarget, Keyword};
use crate::core::{EntityId, PlayerId};
use crate::events::{EntityLookup, GameEvent};
use crate::world::{UndoAction, World};

/// Target of an effect, relative to its source and owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// The entity producing the effect.
    Source,
    /// Source of the triggering event.
    EventSource,
    /// Target of the triggering event.
    EventTarget,
    /// The target chosen when the card was played.
    Chosen,
    OwnHero,
    EnemyHeroes,
    FriendlyMinions,
    /// Friendly minions except the source.
    OtherFriendlyMinions,
    EnemyMinions,
    AllMinions,
    /// Every hero and minion.
    AllCharacters,
    EnemyCharacters,
    /// Minions next to the source.
    AdjacentMinions,
    RandomEnemyMinion,
    RandomEnemyCharacter,
    /// Cards in the owner's hand.
    FriendlyHand,
    FriendlyWeapon,
}

/// Who resolves an effect and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectContext {
    /// Entity producing the effect (card, minion, weapon or hero).
    pub source: EntityId,
    /// Player the effect acts for.
    pub owner: PlayerId,
    /// Target chosen on play.
    pub chosen: Option<EntityId>,
    /// Event that triggered the effect.
    pub event: Option<GameEvent>,
}

impl EffectContext {
    pub fn new(source: EntityId, owner: PlayerId) -> Self {
        Self {
            source,
            owner,
            chosen: None,
            event: None,
        }
    }

    /// Set the chosen target (builder pattern).
    #[must_use]
    pub fn with_chosen(mut self, chosen: Option<EntityId>) -> Self {
        self.chosen = chosen;
        self
    }

    /// Set the triggering event (builder pattern).
    #[must_use]
    pub fn with_event(mut self, event: GameEvent) -> Self {
        self.event = Some(event);
        self
    }
}

/// Resolved target list.
pub type Targets = SmallVec<[EntityId; 8]>;

/// Resolves targets against the world.
pub struct TargetSelector;

impl TargetSelector {
    /// Entities `target` reaches right now.
    ///
    /// Random targets consume the world RNG; the returned undo restores it.
    /// Entities that no longer exist are dropped.
    pub fn select(world: &mut World, target: Target, ctx: &EffectContext) -> (Targets, UndoAction) {
        let owner = ctx.owner;
        let targets: Targets = match target {
            Target::Source => single(world, Some(ctx.source)),
            Target::EventSource => single(world, ctx.event.as_ref().and_then(|e| e.source)),
            Target::EventTarget => single(world, ctx.event.as_ref().and_then(|e| e.target)),
            Target::Chosen => single(world, ctx.chosen),
            Target::OwnHero => single(world, Some(EntityId::hero(owner))),
            Target::EnemyHeroes => world
                .living_opponents(owner)
                .map(EntityId::hero)
                .collect(),
            Target::FriendlyMinions => world.board(owner).iter().copied().collect(),
            Target::OtherFriendlyMinions => world
                .board(owner)
                .iter()
                .copied()
                .filter(|&m| m != ctx.source)
                .collect(),
            Target::EnemyMinions => Self::enemy_minions(world, owner),
            Target::AllMinions => world.all_minions().collect(),
            Target::AllCharacters => {
                let mut all: Targets = world.living_players().map(EntityId::hero).collect();
                all.extend(world.all_minions());
                all
            }
            Target::EnemyCharacters => Self::enemy_characters(world, owner),
            Target::AdjacentMinions => world.adjacent_minions(ctx.source),
            Target::FriendlyHand => world.hand(owner).iter().copied().collect(),
            Target::FriendlyWeapon => world.weapon_of(owner).into_iter().collect(),
            Target::RandomEnemyMinion => {
                let pool = Self::enemy_minions(world, owner);
                return Self::pick_random(world, &pool);
            }
            Target::RandomEnemyCharacter => {
                let pool = Self::enemy_characters(world, owner);
                return Self::pick_random(world, &pool);
            }
        };
        (targets, UndoAction::NoOp)
    }

    /// Whether `choice` may be picked by `chooser` for a card requiring
    /// `requirement`. Stealthed enemies cannot be chosen.
    #[must_use]
    pub fn is_valid_choice(world: &World, chooser: PlayerId, requirement: ChosenTarget, choice: EntityId) -> bool {
        let is_minion = world.is_minion(choice);
        let is_character = is_minion || (world.is_hero(choice) && world.hero_alive(choice));
        let Some(controller) = world.owner_of(choice) else {
            return false;
        };
        let friendly = controller == chooser;
        if !friendly && world.has_keyword(choice, Keyword::Stealth) {
            return false;
        }
        match requirement {
            ChosenTarget::AnyCharacter => is_character,
            ChosenTarget::AnyMinion => is_minion,
            ChosenTarget::EnemyCharacter => is_character && !friendly,
            ChosenTarget::EnemyMinion => is_minion && !friendly,
            ChosenTarget::FriendlyCharacter => is_character && friendly,
            ChosenTarget::FriendlyMinion => is_minion && friendly,
        }
    }

    fn enemy_minions(world: &World, owner: PlayerId) -> Targets {
        world
            .living_opponents(owner)
            .flat_map(|p| world.board(p).iter().copied())
            .collect()
    }

    fn enemy_characters(world: &World, owner: PlayerId) -> Targets {
        let mut all: Targets = world.living_opponents(owner).map(EntityId::hero).collect();
        all.extend(Self::enemy_minions(world, owner));
        all
    }

    fn pick_random(world: &mut World, pool: &[EntityId]) -> (Targets, UndoAction) {
        match world.random_index(pool.len()) {
            Some((index, undo)) => (std::iter::once(pool[index]).collect(), undo),
            None => (Targets::new(), UndoAction::NoOp),
        }
    }
}

fn single(world: &World, entity: Option<EntityId>) -> Targets {
    entity.filter(|&e| world.exists(e)).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use crate::cards::CardId;
    use crate::world::testing::{minion_card, world_with_minion};

    use super::*;

    #[test]
    fn test_random_pick_rewinds_rng() {
        let (mut world, _) = world_with_minion(minion_card(1, 1, 1));
        let p1 = PlayerId::new(1);
        let _ = world.summon_minion(p1, CardId::new(1), None);
        let _ = world.summon_minion(p1, CardId::new(1), None);
        let before = world.view();

        let ctx = EffectContext::new(EntityId::hero(PlayerId::new(0)), PlayerId::new(0));
        let (picked, undo) = TargetSelector::select(&mut world, Target::RandomEnemyMinion, &ctx);
        assert_eq!(picked.len(), 1);
        assert!(world.board(p1).contains(&picked[0]));
        assert_ne!(world.view().rng, before.rng);

        undo.undo(&mut world);
        assert_eq!(world.view(), before);
    }

    #[test]
    fn test_stealth_hides_from_enemies_only() {
        let (world, minion) = world_with_minion(minion_card(1, 1, 1).with_keyword(Keyword::Stealth));
        let p0 = PlayerId::new(0);
        let p1 = PlayerId::new(1);
        assert!(TargetSelector::is_valid_choice(&world, p0, ChosenTarget::FriendlyMinion, minion));
        assert!(!TargetSelector::is_valid_choice(&world, p1, ChosenTarget::AnyMinion, minion));
        assert!(TargetSelector::is_valid_choice(&world, p1, ChosenTarget::EnemyCharacter, EntityId::hero(p0)));
    }

    #[test]
    fn test_relative_targets() {
        let (mut world, first) = world_with_minion(minion_card(1, 1, 1));
        let p0 = PlayerId::new(0);
        let _ = world.summon_minion(p0, CardId::new(1), None);
        let ctx = EffectContext::new(first, p0);

        let (others, _) = TargetSelector::select(&mut world, Target::OtherFriendlyMinions, &ctx);
        assert_eq!(others.to_vec(), vec![world.board(p0)[1]]);

        let (enemies, _) = TargetSelector::select(&mut world, Target::EnemyCharacters, &ctx);
        assert_eq!(enemies.to_vec(), vec![EntityId::hero(PlayerId::new(1))]);

        let (nothing, _) = TargetSelector::select(&mut world, Target::FriendlyWeapon, &ctx);
        assert!(nothing.is_empty());
    }
}
