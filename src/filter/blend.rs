// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use super::{Primitive, PrimitiveBase, Slot, SlotKey};
use crate::context::{Context, Operator};
use crate::geom::Transform;

/// A blend mode.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Darken,
    Lighten,
    Overlay,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl BlendMode {
    fn operator(self) -> Operator {
        match self {
            BlendMode::Normal => Operator::Over,
            BlendMode::Multiply => Operator::Multiply,
            BlendMode::Screen => Operator::Screen,
            BlendMode::Darken => Operator::Darken,
            BlendMode::Lighten => Operator::Lighten,
            BlendMode::Overlay => Operator::Overlay,
            BlendMode::ColorDodge => Operator::ColorDodge,
            BlendMode::ColorBurn => Operator::ColorBurn,
            BlendMode::HardLight => Operator::HardLight,
            BlendMode::SoftLight => Operator::SoftLight,
            BlendMode::Difference => Operator::Difference,
            BlendMode::Exclusion => Operator::Exclusion,
            BlendMode::Hue => Operator::Hue,
            BlendMode::Saturation => Operator::Saturation,
            BlendMode::Color => Operator::Color,
            BlendMode::Luminosity => Operator::Luminosity,
        }
    }
}


/// An `feBlend` primitive.
///
/// Paints `in` over `in2` with a blend mode.
#[derive(Clone, Debug, Default)]
pub struct Blend {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The backdrop input.
    pub input2: SlotKey,
    /// The blend mode.
    pub mode: BlendMode,
}

impl Blend {
    /// Creates a new blend.
    pub fn new(mode: BlendMode) -> Self {
        Blend { mode, ..Blend::default() }
    }
}

impl Primitive for Blend {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input1 = self.base.input(slot, self.base.input);
        let mut input2 = match self.base.input_copy(slot, self.input2) {
            Some(v) => v,
            None => return,
        };

        if let Some(input1) = input1 {
            Context::new(&mut input2).paint_surface(&input1, 0.0, 0.0, self.mode.operator());
        }

        slot.set(self.base.output, Rc::new(input2));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        1.1
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }

    fn uses_input(&self, key: SlotKey) -> bool {
        self.base.input == key || self.input2 == key
    }
}
