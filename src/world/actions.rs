//! Player actions and turn flow.
//!
//! Every player action is checked first and rejected with a [`RulesError`]
//! before anything changes. An accepted action runs as one atomic block and
//! then settles: auras are reconciled and deaths processed, round after
//! round, until a round changes nothing.

use std::rc::Rc;

use crate::cards::{CardKind, Keyword};
use crate::core::{EntityId, PlayerId};
use crate::effects::{Effect, EffectContext, EffectResolver, TargetSelector};
use crate::error::{Result, RulesError};
use crate::events::{do_atomic, do_atomic_with, trigger_event, EntityLookup, EventKind, GameEvent};
use crate::undo::UndoBuilder;

use super::entities::{CombatState, TurnState};
use super::step::{UndoAction, WorldStep};
use super::World;

/// Rounds of death processing before settling gives up.
const SETTLE_LIMIT: usize = 64;

/// Outcome of an accepted player action.
#[derive(Debug)]
#[must_use = "the undo of a player action should be kept or dropped explicitly"]
pub struct PlayerActionResult {
    /// Reverses the action and everything it caused.
    pub undo: UndoAction,
    /// Whether any minion died.
    pub deaths: bool,
    /// Players knocked out by the action, in seat order.
    pub eliminated: Vec<PlayerId>,
}

#[derive(Debug, Default)]
struct SettleReport {
    deaths: usize,
    eliminated: Vec<PlayerId>,
}

impl SettleReport {
    fn merge(&mut self, other: SettleReport) {
        self.deaths += other.deaths;
        self.eliminated.extend(other.eliminated);
    }
}

impl World {
    /// Shuffle the decks, deal opening hands and start the first turn.
    pub fn start_game(&mut self) -> Result<PlayerActionResult> {
        if self.turn.started {
            return Err(RulesError::AlreadyStarted);
        }
        let undo = do_atomic(self, |world| {
            let mut undo = UndoBuilder::new();
            let seats: Vec<PlayerId> = PlayerId::all(world.player_count()).collect();
            if world.config.shuffle_decks {
                for &player in &seats {
                    undo.push(world.shuffle_deck(player));
                }
            }
            for &player in &seats {
                for _ in 0..world.config.opening_hand_for(player.index()) {
                    undo.push(world.draw_card(player));
                }
            }
            let first = PlayerId::new(0);
            undo.push(world.set_turn(TurnState {
                active: first,
                number: 1,
                started: true,
            }));
            tracing::info!(players = seats.len(), "game started");
            undo.push(world.begin_turn(first));
            undo.finish()
        });
        Ok(self.settle(undo))
    }

    /// Play `card` from `player`'s hand, aimed at `target` when the card
    /// asks for one.
    pub fn play_card(&mut self, player: PlayerId, card: EntityId, target: Option<EntityId>) -> Result<PlayerActionResult> {
        self.check_in_progress()?;
        if player != self.turn.active || self.players[player].eliminated {
            return Err(RulesError::NotYourTurn(player));
        }
        let Some(in_hand) = self.hand_cards.get(&card).filter(|c| c.owner == player) else {
            return Err(RulesError::NotInHand { player, card });
        };
        let cards = Rc::clone(&self.cards);
        let def = cards.lookup(in_hand.card)?;

        let cost = self.card_cost(card).unwrap_or(0);
        let available = self.players[player].mana.current;
        if cost > available {
            return Err(RulesError::NotEnoughMana {
                needed: cost,
                available,
            });
        }
        if def.is_minion() && !self.has_board_space(player) {
            return Err(RulesError::BoardFull);
        }
        match (def.target, target) {
            (Some(requirement), Some(choice)) => {
                if !TargetSelector::is_valid_choice(self, player, requirement, choice) {
                    return Err(RulesError::InvalidTarget(choice));
                }
            }
            // A battlecry with nothing to aim at is played without a target.
            (Some(requirement), None) => {
                if !def.is_minion() || !self.valid_targets(player, requirement).is_empty() {
                    return Err(RulesError::TargetRequired(card));
                }
            }
            (None, Some(choice)) => return Err(RulesError::InvalidTarget(choice)),
            (None, None) => {}
        }

        tracing::info!(%player, %card, name = %def.name, ?target, "card played");
        let undo = do_atomic(self, |world| {
            let mut undo = UndoBuilder::new();
            let Some((_, taken)) = world.take_from_hand(player, card) else {
                return UndoAction::NoOp;
            };
            undo.push(taken);
            undo.push(world.spend_mana(player, cost));

            let mut played = GameEvent::for_card(EventKind::CardPlayed, card, player);
            if let Some(choice) = target {
                played = played.with_target(choice);
            }
            undo.push(trigger_event(world, false, played));

            let ctx = EffectContext::new(card, player).with_chosen(target);
            match def.kind {
                // Listeners of `CardPlayed` may have filled the board.
                CardKind::Minion { .. } if !world.has_board_space(player) => {
                    tracing::debug!(%player, %card, "no room left, card discarded");
                    world.players[player].graveyard.push(def.id);
                    undo.push_step(WorldStep::GraveyardPushed(player));
                }
                CardKind::Minion { .. } => {
                    let battlecry = def.on_play.as_ref();
                    undo.push(world.summon_minion_with(player, card, def, None, |world, _| {
                        resolve_optional(world, battlecry, &ctx)
                    }));
                }
                CardKind::Spell => {
                    undo.push(resolve_optional(world, def.on_play.as_ref(), &ctx));
                    world.players[player].graveyard.push(def.id);
                    undo.push_step(WorldStep::GraveyardPushed(player));
                }
                CardKind::Weapon { .. } => {
                    undo.push(world.equip_weapon(player, card, def));
                    undo.push(resolve_optional(world, def.on_play.as_ref(), &ctx));
                }
            }
            undo.finish()
        });
        Ok(self.settle(undo))
    }

    /// Attack `defender` with `attacker`.
    ///
    /// Listeners of `AttackDeclared` may call [`World::veto_attack`] to
    /// cancel the attack; it still counts as made.
    pub fn attack(&mut self, attacker: EntityId, defender: EntityId) -> Result<PlayerActionResult> {
        self.check_in_progress()?;
        let Some(owner) = self.owner_of(attacker).filter(|_| self.is_character(attacker)) else {
            return Err(RulesError::UnknownEntity(attacker));
        };
        if owner != self.turn.active {
            return Err(RulesError::NotYourTurn(owner));
        }
        if !self.can_attack(attacker) {
            return Err(RulesError::CannotAttack(attacker));
        }
        let Some(defending) = self.owner_of(defender).filter(|_| self.is_character(defender)) else {
            return Err(RulesError::InvalidTarget(defender));
        };
        if defending == owner || self.has_keyword(defender, Keyword::Stealth) {
            return Err(RulesError::InvalidTarget(defender));
        }
        let guarded = self.board(defending).iter().any(|&m| {
            self.has_keyword(m, Keyword::Taunt) && !self.has_keyword(m, Keyword::Stealth)
        });
        if guarded && !self.has_keyword(defender, Keyword::Taunt) {
            return Err(RulesError::TauntInTheWay);
        }

        tracing::info!(%attacker, %defender, "attack declared");
        let undo = do_atomic(self, |world| {
            let mut undo = UndoBuilder::new();
            undo.push(world.record_attack(attacker));
            if world.has_keyword(attacker, Keyword::Stealth) {
                undo.push(world.consume_keyword(attacker, Keyword::Stealth));
            }
            undo.push(world.set_veto(false));
            undo.push(trigger_event(
                world,
                false,
                GameEvent::new(EventKind::AttackDeclared)
                    .with_source(attacker)
                    .with_target(defender)
                    .with_player(owner),
            ));

            let vetoed = world.attack_vetoed;
            undo.push(world.set_veto(false));
            if vetoed {
                tracing::debug!(%attacker, %defender, "attack vetoed");
                return undo.finish();
            }
            if !world.is_character(attacker) || !world.is_character(defender) {
                return undo.finish();
            }

            let dealt = world.attack_of(attacker);
            let returned = if world.is_minion(defender) {
                world.attack_of(defender)
            } else {
                0
            };
            undo.push(world.deal_damage(Some(attacker), defender, dealt));
            undo.push(world.deal_damage(Some(defender), attacker, returned));
            if let Some(player) = attacker.as_hero(world.player_count()) {
                undo.push(world.wear_weapon(player));
            }
            undo.finish()
        });
        Ok(self.settle(undo))
    }

    /// End the active player's turn and start the next living player's.
    pub fn end_turn(&mut self) -> Result<PlayerActionResult> {
        self.check_in_progress()?;
        let undo = do_atomic(self, |world| {
            let active = world.turn.active;
            let mut undo = UndoBuilder::new();
            undo.push(trigger_event(
                world,
                false,
                GameEvent::for_player(EventKind::TurnEnded, active),
            ));
            undo.push(world.thaw(active));

            let next = world.next_living_after(active);
            let number = world.turn.number + 1;
            undo.push(world.set_turn(TurnState {
                active: next,
                number,
                started: true,
            }));
            tracing::info!(from = %active, to = %next, turn = number, "turn passed");
            undo.push(world.begin_turn(next));
            undo.finish()
        });
        Ok(self.settle(undo))
    }

    /// Whether `character` could attack right now.
    #[must_use]
    pub fn can_attack(&self, character: EntityId) -> bool {
        if !self.turn.started || self.is_over() {
            return false;
        }
        if self.owner_of(character) != Some(self.turn.active) {
            return false;
        }
        let combat = if let Some(player) = character.as_hero(self.player_count()) {
            if !self.hero_alive(character) {
                return false;
            }
            self.players[player].hero.combat
        } else if let Some(minion) = self.minions.get(&character) {
            if minion.is_dead() {
                return false;
            }
            minion.combat
        } else {
            return false;
        };

        if self.has_keyword(character, Keyword::Frozen) || self.attack_of(character) <= 0 {
            return false;
        }
        if combat.sleeping && !self.has_keyword(character, Keyword::Charge) {
            return false;
        }
        let allowed = if self.has_keyword(character, Keyword::Windfury) { 2 } else { 1 };
        combat.attacks_this_turn < allowed
    }

    /// Cancel the attack currently being declared.
    pub fn veto_attack(&mut self) -> UndoAction {
        self.set_veto(true)
    }

    fn check_in_progress(&self) -> Result<()> {
        if !self.turn.started {
            return Err(RulesError::NotStarted);
        }
        if self.is_over() {
            return Err(RulesError::GameOver);
        }
        Ok(())
    }

    // ---- turn flow ----

    fn begin_turn(&mut self, player: PlayerId) -> UndoAction {
        let mut undo = UndoBuilder::new();
        let mana = &mut self.players[player].mana;
        let previous = *mana;
        mana.max = (mana.max + 1).min(self.config.max_mana);
        mana.current = mana.max;
        undo.push_step(WorldStep::Mana { player, previous });
        undo.push(self.refresh_combat(player));

        undo.push(trigger_event(
            self,
            false,
            GameEvent::for_player(EventKind::TurnStarted, player),
        ));
        undo.push(self.draw_card(player));
        undo.finish()
    }

    fn set_turn(&mut self, next: TurnState) -> UndoAction {
        let previous = std::mem::replace(&mut self.turn, next);
        UndoAction::step(WorldStep::Turn(previous))
    }

    fn next_living_after(&self, player: PlayerId) -> PlayerId {
        player
            .opponents(self.player_count())
            .find(|&p| !self.players[p].eliminated)
            .unwrap_or(player)
    }

    /// Reset attack counters and summoning sickness of `player`'s
    /// characters.
    fn refresh_combat(&mut self, player: PlayerId) -> UndoAction {
        let mut undo = UndoBuilder::new();
        let rested = CombatState::default();
        let hero = &mut self.players[player].hero;
        if hero.combat != rested {
            undo.push_step(WorldStep::HeroCombat {
                player,
                previous: std::mem::replace(&mut hero.combat, rested),
            });
        }
        for id in self.players[player].board.clone() {
            if let Some(minion) = self.minions.get_mut(&id).filter(|m| m.combat != rested) {
                undo.push_step(WorldStep::MinionCombat {
                    minion: id,
                    previous: std::mem::replace(&mut minion.combat, rested),
                });
            }
        }
        undo.finish()
    }

    /// Frozen characters of `player` thaw at the end of their turn.
    fn thaw(&mut self, player: PlayerId) -> UndoAction {
        let characters: Vec<EntityId> = std::iter::once(EntityId::hero(player))
            .chain(self.board(player).iter().copied())
            .filter(|&c| self.has_keyword(c, Keyword::Frozen))
            .collect();
        let mut undo = UndoBuilder::new();
        for character in characters {
            undo.push(self.consume_keyword(character, Keyword::Frozen));
        }
        undo.finish()
    }

    fn shuffle_deck(&mut self, player: PlayerId) -> UndoAction {
        let checkpoint = self.rng.state();
        let previous = self.players[player].deck.clone();
        self.rng.shuffle(&mut self.players[player].deck);
        UndoAction::compose([
            UndoAction::step(WorldStep::Rng(checkpoint)),
            UndoAction::step(WorldStep::DeckShuffled { player, previous }),
        ])
    }

    // ---- action pieces ----

    fn spend_mana(&mut self, player: PlayerId, cost: i32) -> UndoAction {
        if cost <= 0 {
            return UndoAction::NoOp;
        }
        let mana = &mut self.players[player].mana;
        let previous = *mana;
        mana.current -= cost;
        UndoAction::step(WorldStep::Mana { player, previous })
    }

    fn record_attack(&mut self, attacker: EntityId) -> UndoAction {
        if let Some(player) = attacker.as_hero(self.player_count()) {
            let combat = &mut self.players[player].hero.combat;
            let previous = *combat;
            combat.attacks_this_turn += 1;
            return UndoAction::step(WorldStep::HeroCombat { player, previous });
        }
        match self.minions.get_mut(&attacker) {
            Some(minion) => {
                let previous = minion.combat;
                minion.combat.attacks_this_turn += 1;
                UndoAction::step(WorldStep::MinionCombat {
                    minion: attacker,
                    previous,
                })
            }
            None => UndoAction::NoOp,
        }
    }

    fn wear_weapon(&mut self, player: PlayerId) -> UndoAction {
        match self.players[player].weapon.as_mut() {
            Some(weapon) => {
                let previous = weapon.durability;
                weapon.durability -= 1;
                UndoAction::step(WorldStep::WeaponDurability { player, previous })
            }
            None => UndoAction::NoOp,
        }
    }

    fn set_veto(&mut self, vetoed: bool) -> UndoAction {
        if self.attack_vetoed == vetoed {
            return UndoAction::NoOp;
        }
        let previous = std::mem::replace(&mut self.attack_vetoed, vetoed);
        UndoAction::step(WorldStep::Veto(previous))
    }

    // ---- settling ----

    fn settle(&mut self, action: UndoAction) -> PlayerActionResult {
        let mut undo = UndoBuilder::new();
        undo.push(action);
        let mut report = SettleReport::default();
        let mut settled = false;

        for _ in 0..SETTLE_LIMIT {
            let (round, changed) = do_atomic_with(self, World::settle_round);
            if changed.is_noop() {
                settled = true;
                break;
            }
            undo.push(changed);
            report.merge(round);
        }
        if !settled {
            tracing::warn!(limit = SETTLE_LIMIT, "death processing did not settle");
        }

        PlayerActionResult {
            undo: undo.finish(),
            deaths: report.deaths > 0,
            eliminated: report.eliminated,
        }
    }

    /// One round of settling: reconcile auras, remove dead minions, then
    /// resolve their deathrattles in board order, knock out heroes at zero
    /// health and break spent weapons.
    fn settle_round(&mut self) -> (SettleReport, UndoAction) {
        let mut undo = UndoBuilder::new();
        let mut report = SettleReport::default();
        undo.push(self.refresh_auras());

        let dead: Vec<(EntityId, PlayerId, Option<Effect>)> = self
            .all_minions()
            .filter_map(|id| self.minions.get(&id))
            .filter(|m| m.is_dead())
            .map(|m| (m.id, m.owner, m.deathrattle.clone()))
            .collect();
        for &(id, owner, _) in &dead {
            tracing::info!(minion = %id, %owner, "minion died");
            undo.push(self.remove_minion(id));
        }
        for (id, owner, deathrattle) in dead {
            report.deaths += 1;
            undo.push(trigger_event(
                self,
                true,
                GameEvent::new(EventKind::MinionKilled)
                    .with_target(id)
                    .with_player(owner),
            ));
            undo.push(resolve_optional(self, deathrattle.as_ref(), &EffectContext::new(id, owner)));
        }

        let fallen: Vec<PlayerId> = self
            .living_players()
            .filter(|&p| self.players[p].hero.vitals.health <= 0)
            .collect();
        for player in fallen {
            self.players[player].eliminated = true;
            undo.push_step(WorldStep::Eliminated(player));
            tracing::info!(%player, "player eliminated");
            for minion in self.players[player].board.clone() {
                undo.push(self.destroy(minion));
            }
            report.eliminated.push(player);
        }

        let broken: Vec<PlayerId> = PlayerId::all(self.player_count())
            .filter(|&p| self.players[p].weapon.as_ref().is_some_and(|w| w.durability <= 0))
            .collect();
        for player in broken {
            undo.push(self.destroy_weapon(player));
        }

        (report, undo.finish())
    }
}

fn resolve_optional(world: &mut World, effect: Option<&Effect>, ctx: &EffectContext) -> UndoAction {
    match effect {
        Some(effect) => EffectResolver::resolve(world, effect, ctx),
        None => UndoAction::NoOp,
    }
}
