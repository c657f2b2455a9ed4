//! Integration tests for ability activation, trigger-once semantics and
//! the summon completion phase.

use std::rc::Rc;

use rust_ccg_rules::abilities::{OnceAbility, TriggeredAbility};
use rust_ccg_rules::effects::Target;
use rust_ccg_rules::{
    merge, trigger_event, Ability, AbilityDef, AbilityRef, CardDefinition, CardId, CardRegistry,
    Effect, EntityId, EventFilter, EventKind, GameEvent, PlayerId, Stat, World, WorldConfig,
};

const WATCHER: CardId = CardId::new(1);
const SENTRY: CardId = CardId::new(2);
const HERALD: CardId = CardId::new(3);
const WISP: CardId = CardId::new(4);

fn grow_when_hit() -> AbilityDef {
    AbilityDef::triggered(
        EventKind::DamageDealt,
        EventFilter::TargetIsSelf,
        Effect::add_stat(Target::Source, Stat::Attack, 1),
    )
}

fn world() -> World {
    let cards = CardRegistry::new().with_cards([
        CardDefinition::minion(WATCHER, "Watcher", 2, 1, 5).with_ability(grow_when_hit()),
        CardDefinition::minion(SENTRY, "Sentry", 2, 1, 1).with_ability(AbilityDef::once(
            EventKind::TurnEnded,
            EventFilter::ForOwner,
            Effect::GainArmor { amount: 2 },
        )),
        CardDefinition::minion(HERALD, "Herald", 2, 1, 1).with_ability(AbilityDef::AfterSummon {
            filter: EventFilter::all([EventFilter::SourceFriendly, EventFilter::SourceIsNotSelf]),
            effect: Effect::add_stat(Target::EventSource, Stat::Health, 1),
        }),
        CardDefinition::minion(WISP, "Wisp", 0, 1, 1),
    ]);
    World::new(
        WorldConfig::new(2).without_shuffle(),
        Rc::new(cards),
        vec![Vec::new(), Vec::new()],
    )
    .unwrap()
}

fn summon(world: &mut World, card: CardId) -> EntityId {
    let p0 = PlayerId::new(0);
    let _ = world.summon_minion(p0, card, None);
    *world.board(p0).last().unwrap()
}

fn own_turn_ended() -> GameEvent {
    GameEvent::for_player(EventKind::TurnEnded, PlayerId::new(0))
}

/// A triggered ability fires on every matching event and its effects undo.
#[test]
fn test_triggered_ability_fires_every_time() {
    let mut world = world();
    let watcher = summon(&mut world, WATCHER);

    let _ = world.deal_damage(None, watcher, 1);
    let before = world.view();
    let second = world.deal_damage(None, watcher, 1);
    assert_eq!(world.minion_attack(watcher), Some(3));
    assert_eq!(world.minion_health(watcher), Some(3));

    second.undo(&mut world);
    assert_eq!(world.view(), before);
    assert_eq!(world.minion_attack(watcher), Some(2));
}

/// A trigger-once ability removes its listener when it fires; undo puts it
/// back.
#[test]
fn test_once_ability_fires_once() {
    let mut world = world();
    let _ = summon(&mut world, SENTRY);
    let listeners = world.bus().listener_count(EventKind::TurnEnded);
    assert_eq!(listeners, 1);

    let first = trigger_event(&mut world, false, own_turn_ended());
    let _ = trigger_event(&mut world, false, own_turn_ended());
    assert_eq!(world.view().players[0].hero.armor, 2);
    assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 0);

    first.undo(&mut world);
    assert_eq!(world.view().players[0].hero.armor, 0);
    assert_eq!(world.bus().listener_count(EventKind::TurnEnded), 1);
}

/// After-summon effects see the summoned minion once it is in play.
#[test]
fn test_after_summon_buffs_later_minions() {
    let mut world = world();
    let p0 = PlayerId::new(0);
    let p1 = PlayerId::new(1);
    let herald = summon(&mut world, HERALD);
    assert_eq!(world.minion_health(herald), Some(1));

    // An enemy summon does not pass the filter.
    let _ = world.summon_minion(p1, WISP, None);
    let enemy = world.board(p1)[0];
    assert_eq!(world.minion_health(enemy), Some(1));

    let before = world.view();
    let undo = world.summon_minion(p0, WISP, None);
    let wisp = *world.board(p0).last().unwrap();
    assert_eq!(world.minion_health(wisp), Some(2));

    undo.undo(&mut world);
    assert_eq!(world.view(), before);
}

/// A merged ability registers its parts under one handle and unregisters
/// them together.
#[test]
fn test_merged_ability_unregisters_together() {
    let mut world = world();
    let hero = EntityId::hero(PlayerId::new(0));
    let merged: AbilityRef = merge([
        Rc::new(TriggeredAbility::new(EventKind::TurnEnded, Effect::GainArmor { amount: 1 })) as AbilityRef,
        Rc::new(OnceAbility(TriggeredAbility::new(EventKind::TurnStarted, Effect::GainArmor { amount: 1 }))) as AbilityRef,
    ]);
    let registered = world.view().registrations;

    let handle = merged.activate(&mut world, hero);
    assert_eq!(world.bus().total_listeners(), 2);
    assert_eq!(world.view().registrations, registered + 3);

    let undo = world.unregister(handle);
    assert_eq!(world.bus().total_listeners(), 0);
    assert!(world.unregister(handle).is_noop());

    undo.undo(&mut world);
    assert_eq!(world.bus().total_listeners(), 2);

    // Undoing the activation deletes everything it registered.
    world.registration_undo(handle).undo(&mut world);
    assert_eq!(world.bus().total_listeners(), 0);
    assert_eq!(world.view().registrations, registered);
}

/// Activating passives twice registers them once.
#[test]
fn test_activate_passives_is_idempotent() {
    let mut world = world();
    let watcher = summon(&mut world, WATCHER);
    let before = world.view();

    assert!(world.activate_passives(watcher).is_noop());
    assert_eq!(world.view(), before);
    assert_eq!(before.players[0].board[0].active_abilities, 1);
}

/// Silence removes abilities; abilities granted afterwards still work, and
/// undoing the grant removes them again.
#[test]
fn test_silence_then_grant() {
    let mut world = world();
    let watcher = summon(&mut world, WATCHER);

    let _ = world.silence(watcher);
    let _ = world.deal_damage(None, watcher, 1);
    assert_eq!(world.minion_attack(watcher), Some(1));
    assert_eq!(world.bus().listener_count(EventKind::DamageDealt), 0);

    let granted = world.grant_ability(watcher, grow_when_hit().build());
    let hit = world.deal_damage(None, watcher, 1);
    assert_eq!(world.minion_attack(watcher), Some(2));

    hit.undo(&mut world);
    granted.undo(&mut world);
    assert_eq!(world.minion_attack(watcher), Some(1));
    assert_eq!(world.bus().listener_count(EventKind::DamageDealt), 0);
}
