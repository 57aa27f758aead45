// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::Color;

use super::{color_in, Primitive, PrimitiveBase, Slot};
use crate::context::{Context, Operator};
use crate::geom::{Rect, Transform};

/// An `feFlood` primitive.
#[derive(Clone, Debug)]
pub struct Flood {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// An unpremultiplied sRGB color.
    pub color: Color,
}

impl Default for Flood {
    fn default() -> Self {
        Flood { base: PrimitiveBase::default(), color: Color::rgba(0.0, 0.0, 0.0, 0.0) }
    }
}

impl Flood {
    /// Creates a new flood with an unpremultiplied sRGB color.
    pub fn new(color: Color) -> Self {
        Flood { base: PrimitiveBase::default(), color }
    }
}

impl Primitive for Flood {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        // The input defines the surface size only.
        let input = match slot.get(self.base.input) {
            Some(v) => v,
            None => return,
        };

        let space = match self.base.color_space {
            Some(ref space) => Some(space.clone()),
            None => input.color_space().cloned(),
        };
        let mut out = input.similar_in(space);

        let units = slot.units();
        let fp = self.base.filter_primitive_area(units);
        slot.set_primitive_area(self.base.output, fp);

        let fp = fp.transform(&units.user2pb());
        if let Some(sa) = units.slot_box() {
            if let Some(overlap) = fp.intersect(&sa) {
                let dx = (fp.left() - sa.left()).max(0.0);
                let dy = (fp.top() - sa.top()).max(0.0);
                let color = color_in(self.color, out.color_space());
                Context::new(&mut out).fill_rect(
                    Rect::from_xywh(dx, dy, overlap.width(), overlap.height()),
                    color,
                    Operator::Source,
                );
            }
        }

        slot.set(self.base.output, Rc::new(out));
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }
}
