// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{EdgeMode, MorphologyOperator};

use super::{Primitive, PrimitiveBase, Slot};
use crate::geom::{IntRect, Transform};

/// An `feMorphology` primitive.
#[derive(Clone, Debug)]
pub struct Morphology {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The operation.
    pub operator: MorphologyOperator,
    radius_x: f64,
    radius_y: f64,
}

impl Default for Morphology {
    fn default() -> Self {
        Morphology {
            base: PrimitiveBase::default(),
            operator: MorphologyOperator::Erode,
            radius_x: 0.0,
            radius_y: 0.0,
        }
    }
}

impl Morphology {
    /// Creates a new morphology with the same radius along both axes.
    pub fn new(operator: MorphologyOperator, radius: f64) -> Self {
        let mut fe = Morphology { operator, ..Morphology::default() };
        fe.set_radius(radius, radius);
        fe
    }

    /// Sets radii in primitive units.
    ///
    /// Ignored when any value is negative or not finite.
    pub fn set_radius(&mut self, x: f64, y: f64) {
        if x.is_finite() && x >= 0.0 && y.is_finite() && y >= 0.0 {
            self.radius_x = x;
            self.radius_y = y;
        }
    }

    /// Returns radii in primitive units.
    pub fn radius(&self) -> (f64, f64) {
        (self.radius_x, self.radius_y)
    }

    fn enlarge_by(&self, ts: &Transform) -> (i32, i32) {
        (
            (self.radius_x * ts.expansion_x()).ceil() as i32,
            (self.radius_y * ts.expansion_y()).ceil() as i32,
        )
    }
}

impl Primitive for Morphology {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        if self.radius_x == 0.0 || self.radius_y == 0.0 {
            // Transparent black.
            slot.set(self.base.output, Rc::new(input.similar()));
            return;
        }

        let ts = slot.units().primitiveunits2pb();
        let ds = slot.device_scale() as f64;
        let rx = self.radius_x * ts.expansion_x() * ds;
        let ry = self.radius_y * ts.expansion_y() * ds;

        let mut out = input.similar();
        pixelfx::Morphology::new(self.operator, rx, ry)
            .filter(&input.access(EdgeMode::Zero), &mut out.access_mut(EdgeMode::NoCheck));
        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        let (x, y) = self.enlarge_by(ts);
        area.expand_by(x, y);
    }

    fn complexity(&self, ts: &Transform) -> f64 {
        let (x, y) = self.enlarge_by(ts);
        x as f64 * y as f64
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::{RenderOptions, SlotKey};
    use crate::geom::Rect;
    use pixelfx::{Color, ColorSpace};

    fn run(operator: MorphologyOperator, radius: f64) -> Rc<pixelfx::Surface> {
        let options = RenderOptions::default();
        let units = units(21, 21);
        let mut slot = Slot::new(&options, &units);
        let src = filled(
            21,
            21,
            Some(ColorSpace::LinearRgb),
            Rect::from_xywh(5.0, 5.0, 11.0, 11.0),
            Color::rgba(0.0, 1.0, 0.0, 1.0),
        );
        slot.set(SlotKey::SourceImage, Rc::new(src));

        let mut fe = Morphology::new(operator, radius);
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);
        slot.get(SlotKey::Named(0)).unwrap()
    }

    #[test]
    fn dilate() {
        let out = run(MorphologyOperator::Dilate, 2.0);
        assert_eq!(alpha(&out, 3, 10), 1.0);
        assert_eq!(alpha(&out, 2, 10), 0.0);
        assert_eq!(alpha(&out, 17, 17), 1.0);
        assert_eq!(alpha(&out, 18, 10), 0.0);
    }

    #[test]
    fn erode() {
        let out = run(MorphologyOperator::Erode, 2.0);
        assert_eq!(alpha(&out, 6, 10), 0.0);
        assert_eq!(alpha(&out, 7, 10), 1.0);
        assert_eq!(alpha(&out, 13, 13), 1.0);
        assert_eq!(alpha(&out, 14, 10), 0.0);
    }

    #[test]
    fn zero_radius_is_transparent() {
        let out = run(MorphologyOperator::Dilate, 0.0);
        assert_eq!(alpha(&out, 10, 10), 0.0);
    }

    #[test]
    fn rejects_negative_radius() {
        let mut fe = Morphology::new(MorphologyOperator::Erode, 1.0);
        fe.set_radius(-1.0, 2.0);
        assert_eq!(fe.radius(), (1.0, 1.0));
    }

    #[test]
    fn enlarge() {
        let mut fe = Morphology::new(MorphologyOperator::Dilate, 1.5);
        fe.set_radius(1.5, 0.5);
        let mut area = IntRect::new(0, 0, 10, 10);
        fe.area_enlarge(&mut area, &Transform::new_scale(2.0, 2.0));
        assert_eq!(area, IntRect::new(-3, -1, 13, 11));
        assert_eq!(fe.complexity(&Transform::new_scale(2.0, 2.0)), 3.0);
    }
}
