// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use super::{Primitive, PrimitiveBase, Slot, SlotKey};
use crate::context::{Context, Operator};
use crate::geom::Transform;

/// An `feMerge` primitive.
///
/// Paints inputs over each other, first one at the bottom.
#[derive(Clone, Debug)]
pub struct Merge {
    /// Shared parameters. `base.input` is unused.
    pub base: PrimitiveBase,
    inputs: Vec<SlotKey>,
}

impl Default for Merge {
    fn default() -> Self {
        Merge { base: PrimitiveBase::default(), inputs: vec![SlotKey::NotSet] }
    }
}

impl Merge {
    /// Creates a merge of the last output.
    pub fn new() -> Self {
        Merge::default()
    }

    /// Sets an input by index.
    ///
    /// Missing inputs before `index` are filled with `NotSet`.
    pub fn set_input(&mut self, index: usize, key: SlotKey) {
        if index >= self.inputs.len() {
            self.inputs.resize(index + 1, SlotKey::NotSet);
        }

        self.inputs[index] = key;
    }

    /// Returns inputs.
    pub fn inputs(&self) -> &[SlotKey] {
        &self.inputs
    }
}

impl Primitive for Merge {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let first = match self.inputs.first() {
            Some(v) => *v,
            None => return,
        };

        slot.set_primitive_area(self.base.output, self.base.filter_primitive_area(slot.units()));

        let mut out = match self.base.input_copy(slot, first) {
            Some(v) => v,
            None => return,
        };

        {
            let mut ctx = Context::new(&mut out);
            for key in &self.inputs[1..] {
                if let Some(input) = self.base.input(slot, *key) {
                    ctx.paint_surface(&input, 0.0, 0.0, Operator::Over);
                }
            }
        }

        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        1.02
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }

    fn uses_input(&self, key: SlotKey) -> bool {
        self.inputs.contains(&key)
    }
}
