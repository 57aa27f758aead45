// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{EdgeMode, FuzzyZero};

use super::{Primitive, PrimitiveBase, Slot};
use crate::geom::{IntRect, Transform};

/// An edge mode of `feConvolveMatrix`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ConvolveEdgeMode {
    #[default]
    Duplicate,
    Wrap,
    None,
}

impl ConvolveEdgeMode {
    fn to_edge_mode(self) -> EdgeMode {
        match self {
            ConvolveEdgeMode::Duplicate => EdgeMode::Extend,
            ConvolveEdgeMode::Wrap => EdgeMode::Wrap,
            ConvolveEdgeMode::None => EdgeMode::Zero,
        }
    }
}

/// An `feConvolveMatrix` primitive.
#[derive(Clone, Debug, Default)]
pub struct ConvolveMatrix {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// Number of kernel columns.
    pub order_x: u32,
    /// Number of kernel rows.
    pub order_y: u32,
    /// The target column. The kernel center when `None`.
    pub target_x: Option<u32>,
    /// The target row. The kernel center when `None`.
    pub target_y: Option<u32>,
    /// Kernel values, row by row.
    pub kernel: Vec<f64>,
    /// The kernel sum, or 1 for a zero sum, when `None`.
    pub divisor: Option<f64>,
    /// Added to every convolved value.
    pub bias: f64,
    /// Out-of-bounds pixels handling.
    pub edge_mode: ConvolveEdgeMode,
    /// Keeps the alpha channel as is.
    pub preserve_alpha: bool,
}

impl ConvolveMatrix {
    /// Creates a new matrix with a default target and divisor.
    pub fn new(order_x: u32, order_y: u32, kernel: Vec<f64>) -> Self {
        ConvolveMatrix { order_x, order_y, kernel, ..ConvolveMatrix::default() }
    }

    fn target(&self) -> (u32, u32) {
        (
            self.target_x.unwrap_or(self.order_x / 2),
            self.target_y.unwrap_or(self.order_y / 2),
        )
    }

    fn divisor(&self) -> f64 {
        match self.divisor {
            Some(v) => v,
            None => {
                let sum: f64 = self.kernel.iter().sum();
                if sum.is_fuzzy_zero() { 1.0 } else { sum }
            }
        }
    }
}

impl Primitive for ConvolveMatrix {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        if self.order_x == 0 || self.order_y == 0 {
            log::warn!("Convolve matrix has an empty kernel.");
            return;
        }

        let (tx, ty) = self.target();
        if tx >= self.order_x || ty >= self.order_y {
            log::warn!("Convolve matrix has an invalid target.");
            return;
        }

        if self.kernel.len() != (self.order_x * self.order_y) as usize {
            log::warn!(
                "Convolve matrix kernel must have {} values, got {}.",
                self.order_x * self.order_y,
                self.kernel.len()
            );
            return;
        }

        let matrix = match pixelfx::ConvolveMatrix::new(
            tx,
            ty,
            self.order_x,
            self.order_y,
            &self.kernel,
            self.divisor(),
            self.bias,
            self.preserve_alpha,
        ) {
            Some(v) => v,
            None => {
                log::warn!("Convolve matrix has an invalid divisor.");
                return;
            }
        };

        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        let mut out = input.similar();
        matrix.filter(
            &input.access(self.edge_mode.to_edge_mode()),
            &mut out.access_mut(EdgeMode::NoCheck),
        );
        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, _: &Transform) {
        let (tx, ty) = self.target();
        let (tx, ty) = (tx as i32, ty as i32);
        let (ox, oy) = (self.order_x as i32, self.order_y as i32);
        *area = IntRect::new(
            area.left() - tx,
            area.top() - ty,
            area.right() + ox - tx - 1,
            area.bottom() + oy - ty - 1,
        );
    }

    fn complexity(&self, _: &Transform) -> f64 {
        self.kernel.len() as f64
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::{RenderOptions, SlotKey};
    use crate::geom::Rect;
    use pixelfx::{Color, ColorSpace, Surface};

    fn source() -> Rc<Surface> {
        Rc::new(filled(
            8,
            8,
            Some(ColorSpace::LinearRgb),
            Rect::from_xywh(2.0, 2.0, 4.0, 4.0),
            Color::rgba(0.2, 0.4, 0.6, 1.0),
        ))
    }

    fn run(fe: ConvolveMatrix) -> Option<Rc<Surface>> {
        let options = RenderOptions::default();
        let units = units(8, 8);
        let mut slot = Slot::new(&options, &units);
        slot.set(SlotKey::SourceImage, source());

        let mut fe = fe;
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);
        slot.get(SlotKey::Named(0))
    }

    #[test]
    fn identity_kernel() {
        let fe = ConvolveMatrix::new(3, 3, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let out = run(fe).unwrap();
        let src = source();
        for y in 0..8 {
            for x in 0..8 {
                let a = color(&out, x, y);
                let b = color(&src, x, y);
                assert!((a.alpha() - b.alpha()).abs() < 1e-6);
                if b.alpha() > 0.0 {
                    assert!((a.component(1) - b.component(1)).abs() < 1e-6);
                }
            }
        }
    }

    #[test]
    fn shift_with_target() {
        let mut fe = ConvolveMatrix::new(3, 1, vec![1.0, 0.0, 0.0]);
        fe.target_x = Some(0);
        let out = run(fe).unwrap();
        // The kernel is rotated, so pixels are read from the right.
        assert!((alpha(&out, 0, 3) - 1.0).abs() < 1e-6);
        assert!((alpha(&out, 3, 3) - 1.0).abs() < 1e-6);
        assert_eq!(alpha(&out, 4, 3), 0.0);
        assert_eq!(alpha(&out, 7, 3), 0.0);
    }

    #[test]
    fn invalid_kernels() {
        assert!(run(ConvolveMatrix::new(0, 3, vec![])).is_none());
        assert!(run(ConvolveMatrix::new(3, 3, vec![1.0; 8])).is_none());

        let mut fe = ConvolveMatrix::new(3, 3, vec![1.0; 9]);
        fe.target_y = Some(3);
        assert!(run(fe).is_none());

        let mut fe = ConvolveMatrix::new(1, 1, vec![1.0]);
        fe.divisor = Some(0.0);
        assert!(run(fe).is_none());
    }

    #[test]
    fn default_divisor() {
        assert_eq!(ConvolveMatrix::new(1, 3, vec![1.0, 2.0, 3.0]).divisor(), 6.0);
        assert_eq!(ConvolveMatrix::new(1, 2, vec![1.0, -1.0]).divisor(), 1.0);
    }

    #[test]
    fn enlarge() {
        let mut fe = ConvolveMatrix::new(3, 3, vec![1.0; 9]);
        fe.target_x = Some(0);
        let mut area = IntRect::new(0, 0, 10, 10);
        fe.area_enlarge(&mut area, &Transform::default());
        assert_eq!(area, IntRect::new(0, -1, 12, 11));
        assert_eq!(fe.complexity(&Transform::default()), 9.0);
    }
}
