// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use super::{Primitive, PrimitiveBase, Slot};
use crate::context::{Context, Operator};
use crate::geom::{IntRect, Transform};

/// An `feTile` primitive.
///
/// Repeats the primitive subregion of the input.
#[derive(Clone, Debug, Default)]
pub struct Tile {
    /// Shared parameters.
    pub base: PrimitiveBase,
}

impl Tile {
    /// Creates a new tile.
    pub fn new() -> Self {
        Tile::default()
    }
}

impl Primitive for Tile {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        let tile_area = slot.get_primitive_area(self.base.input);
        if tile_area.width() <= 0.0 || tile_area.height() <= 0.0 {
            log::warn!("Tile has zero width or height.");
            slot.set(self.base.output, input);
            return;
        }

        let units = slot.units();
        let sa = match units.slot_box() {
            Some(v) => v,
            None => return,
        };
        let ts = units.user2pb();

        let tt = tile_area.transform(&ts);
        let pr = self.base.filter_primitive_area(units);
        slot.set_primitive_area(self.base.output, pr);

        // Only tiles that cover the slot box are painted.
        let visible = ts.invert().and_then(|inv| pr.intersect(&sa.transform(&inv)));
        let (pr, tw, th) = match visible {
            Some(v) if tt.width().round() >= 1.0 && tt.height().round() >= 1.0 => {
                (v, tile_area.width(), tile_area.height())
            }
            _ => {
                log::warn!("Tile is smaller than a pixel or outside of the filter area.");
                slot.set(self.base.output, Rc::new(input.similar()));
                return;
            }
        };

        // Copy the tile out of the input.
        let mut tile = input.similar_sized(tt.width().round() as u32, tt.height().round() as u32);
        Context::new(&mut tile).paint_surface(
            &input,
            sa.left() - tt.left(),
            sa.top() - tt.top(),
            Operator::Source,
        );

        let col0 = ((pr.left() - tile_area.left()) / tw).floor() as i32;
        let col1 = ((pr.right() - tile_area.left()) / tw).ceil() as i32;
        let row0 = ((pr.top() - tile_area.top()) / th).floor() as i32;
        let row1 = ((pr.bottom() - tile_area.top()) / th).ceil() as i32;

        let mut out = input.similar();
        let mut ctx = Context::new(&mut out);
        for row in row0..row1 {
            for col in col0..col1 {
                let (x, y) = ts.apply(
                    tile_area.left() + col as f64 * tw,
                    tile_area.top() + row as f64 * th,
                );
                ctx.paint_surface(&tile, x - sa.left(), y - sa.top(), Operator::Over);
            }
        }

        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, _: &Transform) {
        // The tile source can be anywhere. The area is clipped later.
        let max = i32::MAX / 4;
        *area = IntRect::new(-max, -max, max, max);
    }
}
