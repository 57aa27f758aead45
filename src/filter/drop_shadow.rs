// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::Color;

use super::{color_in, GaussianBlur, Primitive, PrimitiveBase, Slot};
use crate::context::{Context, Operator};
use crate::geom::{IntRect, Transform};

/// An `feDropShadow` primitive.
#[derive(Clone, Debug)]
pub struct DropShadow {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// Horizontal shadow offset in primitive units.
    pub dx: f64,
    /// Vertical shadow offset in primitive units.
    pub dy: f64,
    /// An unpremultiplied sRGB shadow color.
    pub color: Color,
    blur: GaussianBlur,
}

impl Default for DropShadow {
    fn default() -> Self {
        DropShadow {
            base: PrimitiveBase::default(),
            dx: 2.0,
            dy: 2.0,
            color: Color::rgba(0.0, 0.0, 0.0, 1.0),
            blur: GaussianBlur::new(2.0),
        }
    }
}

impl DropShadow {
    /// Creates a new black shadow.
    pub fn new(deviation: f64, dx: f64, dy: f64) -> Self {
        let mut fe = DropShadow { dx, dy, ..DropShadow::default() };
        fe.set_deviation(deviation);
        fe
    }

    /// Sets the same blur deviation along both axes.
    ///
    /// Negative and non-finite values are ignored.
    pub fn set_deviation(&mut self, deviation: f64) {
        self.blur.set_deviation(deviation);
    }

    /// Sets blur deviations along each axis.
    ///
    /// Ignored when any value is negative or not finite.
    pub fn set_deviation_xy(&mut self, x: f64, y: f64) {
        self.blur.set_deviation_xy(x, y);
    }

    /// Returns blur deviations in primitive units.
    pub fn deviation(&self) -> (f64, f64) {
        self.blur.deviation()
    }
}

impl Primitive for DropShadow {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => {
                log::warn!("Drop shadow has no input.");
                return;
            }
        };

        let ts = slot.units().primitiveunits2pb();
        let (x, y) = (self.dx * ts.expansion_x(), self.dy * ts.expansion_y());

        let mut shadow = input.similar();
        let color = color_in(self.color, shadow.color_space());
        Context::new(&mut shadow).mask(color, &input, x, y);

        let (dev_x, dev_y) = self.blur.deviation();
        let mut out = if dev_x > 0.0 && dev_y > 0.0 {
            self.blur.blur(slot, &shadow)
        } else {
            shadow
        };

        Context::new(&mut out).paint_surface(&input, 0.0, 0.0, Operator::Over);
        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        let old = *area;
        let (x, y) = (self.dx * ts.expansion_x(), self.dy * ts.expansion_y());

        // The shadow at a pixel comes from the input shifted back by the offset.
        *area = area.to_rect().transform(&Transform::new_translate(-x, -y)).round_out();
        self.blur.enlarge(area, ts);
        area.union_with(&old);
    }

    fn complexity(&self, ts: &Transform) -> f64 {
        self.blur.complexity(ts) + 1.0
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::{RenderOptions, SlotKey};
    use crate::geom::Rect;

    #[test]
    fn sharp_shadow() {
        let options = RenderOptions::default();
        let units = units(16, 16);
        let mut slot = Slot::new(&options, &units);
        let src = filled(16, 16, None, Rect::from_xywh(2.0, 2.0, 4.0, 4.0), Color::rgba(1.0, 1.0, 1.0, 1.0));
        slot.set(SlotKey::SourceImage, Rc::new(src));

        let mut fe = DropShadow::new(0.0, 3.0, 3.0);
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);

        let out = slot.get(SlotKey::Named(0)).unwrap();
        // The input on top.
        assert_eq!(color(&out, 3, 3).channels(), &[1.0, 1.0, 1.0]);
        // The shadow.
        let c = color(&out, 7, 7);
        assert_eq!(c.alpha(), 1.0);
        assert_eq!(c.channels(), &[0.0, 0.0, 0.0]);
        assert_eq!(alpha(&out, 10, 10), 0.0);
    }

    #[test]
    fn blurred_shadow() {
        let options = RenderOptions::default();
        let units = units(32, 32);
        let mut slot = Slot::new(&options, &units);
        let src = filled(32, 32, None, Rect::from_xywh(8.0, 8.0, 8.0, 8.0), Color::rgba(1.0, 1.0, 1.0, 1.0));
        slot.set(SlotKey::SourceImage, Rc::new(src));

        let mut fe = DropShadow::new(1.5, 4.0, 4.0);
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);

        let out = slot.get(SlotKey::Named(0)).unwrap();
        let a = alpha(&out, 20, 20);
        assert!(a > 0.0 && a < 1.0);
        assert_eq!(alpha(&out, 10, 10), 1.0);
    }

    #[test]
    fn enlarge() {
        let fe = DropShadow::new(0.0, 4.0, -2.0);
        let mut area = IntRect::new(0, 0, 10, 10);
        fe.area_enlarge(&mut area, &Transform::default());
        assert_eq!(area, IntRect::new(-4, 0, 10, 12));
    }
}
