//! Properties with ordered modifier layers.
//!
//! Each entity attribute is a [`LayeredProperty`]: a base value followed
//! by three independent [`BuffStack`]s, evaluated in [`Layer`] order.
//! Keeping aura output in its own layer means an aura applies after every
//! own buff regardless of when either was added.

use serde::{Deserialize, Serialize};

use super::property::{BuffId, BuffStack, PropertyEdit};
use super::value::PropertyValue;
use crate::undo::{Reversible, Revert};

/// Evaluation layer of a modifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Applied right after the base value (cost adjustments from cards).
    PreAura,
    /// Buffs the entity owns. Cleared by silence.
    Own,
    /// Output of auras. Managed only by the aura that applied it.
    Aura,
}

impl Layer {
    /// Layers in evaluation order.
    pub const ALL: [Layer; 3] = [Layer::PreAura, Layer::Own, Layer::Aura];

    const fn index(self) -> usize {
        self as usize
    }
}

/// Inverse of a mutation to one layer.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerEdit<T: PropertyValue> {
    pub layer: Layer,
    pub edit: PropertyEdit<T>,
}

/// A base value with one modifier stack per [`Layer`].
#[derive(Clone, Debug)]
pub struct LayeredProperty<T: PropertyValue> {
    base: T,
    layers: [BuffStack<T>; 3],
}

impl<T: PropertyValue> LayeredProperty<T> {
    pub fn new(base: T) -> Self {
        Self {
            base,
            layers: [BuffStack::new(), BuffStack::new(), BuffStack::new()],
        }
    }

    #[must_use]
    pub fn base(&self) -> T {
        self.base
    }

    /// Replace the base value, keeping every layer. Returns the old base.
    pub fn set_base(&mut self, base: T) -> T {
        std::mem::replace(&mut self.base, base)
    }

    /// Current value with every layer applied.
    #[must_use]
    pub fn value(&self) -> T {
        self.layers
            .iter()
            .fold(self.base, |value, stack| stack.apply(value))
    }

    /// Value with only the layers before `layer` applied.
    #[must_use]
    pub fn value_before(&self, layer: Layer) -> T {
        self.layers[..layer.index()]
            .iter()
            .fold(self.base, |value, stack| stack.apply(value))
    }

    #[must_use]
    pub fn layer(&self, layer: Layer) -> &BuffStack<T> {
        &self.layers[layer.index()]
    }

    /// Whether no layer modifies the base.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.layers.iter().all(BuffStack::is_empty)
    }

    pub fn add_fast(&mut self, layer: Layer, incoming: T::Fast) -> Reversible<LayerEdit<T>> {
        lift(layer, self.layers[layer.index()].add_fast(incoming))
    }

    pub fn add_buff(&mut self, layer: Layer, buff: T::Buff) -> (BuffId, Reversible<LayerEdit<T>>) {
        let (id, undo) = self.layers[layer.index()].add_buff(buff);
        (id, lift(layer, undo))
    }

    pub fn remove_buff(&mut self, layer: Layer, id: BuffId) -> Reversible<LayerEdit<T>> {
        lift(layer, self.layers[layer.index()].remove_buff(id))
    }

    /// Clear the [`Layer::Own`] stack. Pre-aura adjustments and aura output
    /// survive.
    pub fn silence(&mut self) -> Reversible<LayerEdit<T>> {
        lift(Layer::Own, self.layers[Layer::Own.index()].silence())
    }

    /// Silence, then force the value with a fixed own buff.
    pub fn set_value_to(&mut self, value: T) -> Reversible<LayerEdit<T>> {
        let silenced = self.silence();
        let (_, added) = self.add_buff(Layer::Own, T::fixed(value));
        silenced.then(added)
    }

    /// Copy of the pre-aura and own layers over a new base. Aura output
    /// belongs to the aura and is not copied.
    #[must_use]
    pub fn copy_with_base(&self, base: T) -> Self {
        Self {
            base,
            layers: [
                self.layers[Layer::PreAura.index()].clone(),
                self.layers[Layer::Own.index()].clone(),
                BuffStack::new(),
            ],
        }
    }
}

impl<T: PropertyValue> Revert<LayeredProperty<T>> for LayerEdit<T> {
    fn revert(self, property: &mut LayeredProperty<T>) {
        self.edit.apply_to(&mut property.layers[self.layer.index()]);
    }
}

fn lift<T: PropertyValue>(layer: Layer, undo: Reversible<PropertyEdit<T>>) -> Reversible<LayerEdit<T>> {
    undo.map(&mut |edit| LayerEdit { layer, edit })
}
