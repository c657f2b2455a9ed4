//! Reversible-action primitives.
//!
//! - [`Reversible`]: the undo of one completed mutation, composable into
//!   chains that undo last-first
//! - [`UndoBuilder`]: collector for multi-step mutations
//! - [`RegistrationTable`] / [`UnregisterRef`]: registration handles with
//!   idempotent unregistration
//!
//! This module depends on nothing else in the crate. The world plugs in its
//! own step type through the [`Revert`] trait.

mod action;
mod registration;

pub use action::{Reversible, Revert, UndoBuilder};
pub use registration::{RegistrationState, RegistrationTable, UnregisterRef};
