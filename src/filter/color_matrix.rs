// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{color_matrix, ColorSpace, EdgeMode};

use super::{Primitive, PrimitiveBase, Slot};
use crate::geom::Transform;

/// A color matrix kind.
#[derive(Clone, PartialEq, Debug)]
pub enum ColorMatrixKind {
    /// Row by row values. Missing ones are taken from the identity matrix.
    Matrix(Vec<f64>),
    /// Saturation in `0..=1`.
    Saturate(f64),
    /// Hue rotation in degrees.
    HueRotate(f64),
    /// Converts luminance into an alpha-only result.
    LuminanceToAlpha,
}

impl Default for ColorMatrixKind {
    fn default() -> Self {
        ColorMatrixKind::Matrix(Vec::new())
    }
}

/// An `feColorMatrix` primitive.
#[derive(Clone, Debug, Default)]
pub struct ColorMatrix {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The matrix.
    pub kind: ColorMatrixKind,
}

impl ColorMatrix {
    /// Creates a new color matrix.
    pub fn new(kind: ColorMatrixKind) -> Self {
        ColorMatrix { base: PrimitiveBase::default(), kind }
    }
}

impl Primitive for ColorMatrix {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        let matrix = match self.kind {
            ColorMatrixKind::Matrix(ref m) => pixelfx::ColorMatrix::Matrix(m),
            ColorMatrixKind::Saturate(v) => pixelfx::ColorMatrix::Saturate(v),
            ColorMatrixKind::HueRotate(v) => pixelfx::ColorMatrix::HueRotate(v),
            ColorMatrixKind::LuminanceToAlpha => pixelfx::ColorMatrix::LuminanceToAlpha,
        };

        let mut out = if self.kind == ColorMatrixKind::LuminanceToAlpha {
            input.similar_in(Some(ColorSpace::Alpha))
        } else {
            input.similar()
        };

        color_matrix(matrix, &input.access(EdgeMode::NoCheck), &mut out.access_mut(EdgeMode::NoCheck));
        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        2.0
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }
}
