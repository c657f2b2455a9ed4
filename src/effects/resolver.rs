//! Effect resolution - executing effects on the world.
//!
//! The resolver is a thin dispatcher: each effect maps onto one world
//! primitive per target, and the undo of the whole effect is the
//! composition of the primitives' undos in resolution order. Missing or
//! dead targets resolve to no-ops.

use crate::buffs::Layer;
use crate::cards::Stat;
use crate::core::EntityId;
use crate::undo::UndoBuilder;
use crate::world::{FlagKey, StatKey, UndoAction, World};

use super::targeting::{EffectContext, Target, TargetSelector};
use super::Effect;

/// Resolves effects on the world.
pub struct EffectResolver;

impl EffectResolver {
    /// Resolve one effect and return its undo.
    pub fn resolve(world: &mut World, effect: &Effect, ctx: &EffectContext) -> UndoAction {
        tracing::trace!(?effect, source = %ctx.source, owner = %ctx.owner, "resolving effect");
        let source = ctx.source;

        match effect {
            Effect::DealDamage { target, amount } => {
                Self::for_each(world, *target, ctx, |w, e| w.deal_damage(Some(source), e, *amount))
            }

            Effect::Heal { target, amount } => {
                Self::for_each(world, *target, ctx, |w, e| w.heal(Some(source), e, *amount))
            }

            Effect::Destroy { target } => Self::for_each(world, *target, ctx, World::destroy),

            Effect::Freeze { target } => Self::for_each(world, *target, ctx, World::freeze),

            Effect::Silence { target } => Self::for_each(world, *target, ctx, World::silence),

            Effect::AddStat { target, stat, delta } => Self::for_each(world, *target, ctx, |w, e| {
                w.add_stat_fast(StatKey::new(e, *stat), Layer::Own, *delta)
            }),

            Effect::ApplyBuff { target, stat, buff } => Self::for_each(world, *target, ctx, |w, e| {
                match w.add_stat_buff(StatKey::new(e, *stat), Layer::Own, *buff) {
                    Some(handle) => w.registration_undo(handle),
                    None => UndoAction::NoOp,
                }
            }),

            Effect::SetStat { target, stat, value } => {
                Self::for_each(world, *target, ctx, |w, e| w.set_stat(StatKey::new(e, *stat), *value))
            }

            Effect::GrantKeyword { target, keyword } => Self::for_each(world, *target, ctx, |w, e| {
                w.add_flag_fast(FlagKey::new(e, *keyword), Layer::Own, Some(true))
            }),

            Effect::AdjustCost { target, delta } => Self::for_each(world, *target, ctx, |w, e| {
                w.add_stat_fast(StatKey::new(e, Stat::Cost), Layer::PreAura, *delta)
            }),

            Effect::GrantAbility { target, ability } => {
                Self::for_each(world, *target, ctx, |w, e| w.grant_ability(e, ability.build()))
            }

            Effect::Draw { count } => {
                let mut undo = UndoBuilder::new();
                for _ in 0..*count {
                    undo.push(world.draw_card(ctx.owner));
                }
                undo.finish()
            }

            Effect::GainArmor { amount } => world.gain_armor(ctx.owner, *amount),

            Effect::Summon { card, count } => {
                let after_source = world.board_position(source).map(|i| i + 1);
                let mut undo = UndoBuilder::new();
                for i in 0..*count {
                    undo.push(world.summon_minion(ctx.owner, *card, after_source.map(|p| p + i)));
                }
                undo.finish()
            }

            Effect::Batch(effects) => {
                let mut undo = UndoBuilder::new();
                for effect in effects {
                    undo.push(Self::resolve(world, effect, ctx));
                }
                undo.finish()
            }
        }
    }

    fn for_each<F>(world: &mut World, target: Target, ctx: &EffectContext, mut apply: F) -> UndoAction
    where
        F: FnMut(&mut World, EntityId) -> UndoAction,
    {
        let (targets, picked) = TargetSelector::select(world, target, ctx);
        let mut undo = UndoBuilder::new();
        undo.push(picked);
        for entity in targets {
            undo.push(apply(world, entity));
        }
        undo.finish()
    }
}
