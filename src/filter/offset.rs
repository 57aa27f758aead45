// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use super::{Primitive, PrimitiveBase, Slot};
use crate::context::{Context, Operator};
use crate::geom::{IntRect, Transform};

/// An `feOffset` primitive.
#[derive(Clone, Debug, Default)]
pub struct Offset {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// Horizontal shift in primitive units.
    pub dx: f64,
    /// Vertical shift in primitive units.
    pub dy: f64,
}

impl Offset {
    /// Creates a new offset.
    pub fn new(dx: f64, dy: f64) -> Self {
        Offset { base: PrimitiveBase::default(), dx, dy }
    }
}

impl Primitive for Offset {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        let units = slot.units();
        slot.set_primitive_area(self.base.output, self.base.filter_primitive_area(units));

        let ts = units.primitiveunits2pb();
        let x = self.dx * ts.expansion_x();
        let y = self.dy * ts.expansion_y();

        let mut out = input.similar();
        Context::new(&mut out).paint_surface(&input, x, y, Operator::Over);
        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        let (x, y) = ts.apply_vector(self.dx, self.dy);

        // The area must cover the pixels that will be shifted into it.
        let (mut x0, mut y0, mut x1, mut y1) = (area.left(), area.top(), area.right(), area.bottom());
        if x > 0.0 {
            x0 -= x.ceil() as i32;
        } else {
            x1 -= x.floor() as i32;
        }

        if y > 0.0 {
            y0 -= y.ceil() as i32;
        } else {
            y1 -= y.floor() as i32;
        }

        *area = IntRect::new(x0, y0, x1, y1);
    }

    fn complexity(&self, _: &Transform) -> f64 {
        1.02
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
    use pixelfx::{Color, Surface};

    #[test]
    fn shifts_pixels() {
        let options = RenderOptions::default();
        let units = units(16, 16);
        let mut slot = Slot::new(&options, &units);
        let src = filled(16, 16, None, Rect::from_xywh(0.0, 0.0, 4.0, 4.0), Color::rgba(0.0, 0.0, 1.0, 1.0));
        slot.set(SlotKey::SourceImage, Rc::new(src));

        let mut fe = Offset::new(5.0, 3.0);
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);
        let out: Rc<Surface> = slot.get(SlotKey::NotSet).unwrap();
        assert_eq!(alpha(&out, 0, 0), 0.0);
        assert_eq!(alpha(&out, 5, 3), 1.0);
        assert_eq!(alpha(&out, 8, 6), 1.0);
        assert_eq!(alpha(&out, 9, 7), 0.0);
    }

    #[test]
    fn enlarge() {
        let fe = Offset::new(2.5, -3.5);
        let mut area = IntRect::new(0, 0, 10, 10);
        fe.area_enlarge(&mut area, &Transform::default());
        assert_eq!(area, IntRect::new(-3, 0, 10, 14));
    }
}
