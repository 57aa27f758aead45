// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{displacement_map, ColorChannel, EdgeMode};

use super::{Primitive, PrimitiveBase, Slot, SlotKey};
use crate::geom::{IntRect, Transform};

/// An `feDisplacementMap` primitive.
///
/// Moves `in` pixels by the channels of `in2`.
#[derive(Clone, Debug)]
pub struct DisplacementMap {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The displacement map.
    pub input2: SlotKey,
    /// The displacement scale in primitive units.
    pub scale: f64,
    /// A map channel for the horizontal displacement.
    pub x_channel_selector: ColorChannel,
    /// A map channel for the vertical displacement.
    pub y_channel_selector: ColorChannel,
}

impl Default for DisplacementMap {
    fn default() -> Self {
        DisplacementMap {
            base: PrimitiveBase::default(),
            input2: SlotKey::NotSet,
            scale: 0.0,
            x_channel_selector: ColorChannel::A,
            y_channel_selector: ColorChannel::A,
        }
    }
}

impl DisplacementMap {
    /// Creates a new displacement map.
    pub fn new(scale: f64, x: ColorChannel, y: ColorChannel) -> Self {
        DisplacementMap {
            scale,
            x_channel_selector: x,
            y_channel_selector: y,
            ..DisplacementMap::default()
        }
    }
}

impl Primitive for DisplacementMap {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let (texture, map) = match (
            self.base.input(slot, self.base.input),
            self.base.input(slot, self.input2),
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                log::warn!("Displacement map requires two inputs.");
                return;
            }
        };

        let ts = slot.units().primitiveunits2pb();
        let ds = slot.device_scale() as f64;
        let sx = self.scale * ts.expansion_x() * ds;
        let sy = self.scale * ts.expansion_y() * ds;

        let mut out = texture.similar();
        displacement_map(
            self.x_channel_selector,
            self.y_channel_selector,
            sx,
            sy,
            &texture.access(EdgeMode::Zero),
            &map.access(EdgeMode::Zero),
            &mut out.access_mut(EdgeMode::NoCheck),
        );
        slot.set(self.base.output, Rc::new(out));
    }

    fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        let x = self.scale / 2.0 * (ts.a.abs() + ts.b.abs());
        let y = self.scale / 2.0 * (ts.c.abs() + ts.d.abs());
        area.expand_by((x + 2.0) as i32, (y + 2.0) as i32);
    }

    fn complexity(&self, _: &Transform) -> f64 {
        3.0
    }

    fn uses_input(&self, key: SlotKey) -> bool {
        self.base.input == key || self.input2 == key
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::RenderOptions;
    use crate::geom::Rect;
    use pixelfx::{Color, ColorSpace};

    #[test]
    fn shifts_by_map() {
        let options = RenderOptions::default();
        let units = units(16, 16);
        let mut slot = Slot::new(&options, &units);
        let space = Some(ColorSpace::LinearRgb);
        let full = Rect::from_xywh(0.0, 0.0, 16.0, 16.0);
        let texture = filled(16, 16, space.clone(), Rect::from_xywh(8.0, 0.0, 8.0, 16.0), Color::rgba(1.0, 0.0, 0.0, 1.0));
        // Red 1.0 moves by +scale/2, green 0.5 keeps the row.
        let map = filled(16, 16, space, full, Color::rgba(1.0, 0.5, 0.0, 1.0));
        slot.set(SlotKey::SourceImage, Rc::new(texture));
        slot.set(SlotKey::Named(0), Rc::new(map));

        let mut fe = DisplacementMap::new(8.0, ColorChannel::R, ColorChannel::G);
        fe.base.input = SlotKey::SourceImage;
        fe.input2 = SlotKey::Named(0);
        fe.base.output = SlotKey::Named(1);
        fe.render(&mut slot);

        let out = slot.get(SlotKey::Named(1)).unwrap();
        // Every pixel is read 4 pixels to the right.
        assert_eq!(alpha(&out, 3, 5), 0.0);
        assert_eq!(alpha(&out, 4, 5), 1.0);
        assert_eq!(alpha(&out, 11, 5), 1.0);
        assert_eq!(alpha(&out, 12, 5), 0.0);
    }

    #[test]
    fn missing_map() {
        let options = RenderOptions::default();
        let units = units(4, 4);
        let mut slot = Slot::new(&options, &units);
        slot.set(SlotKey::SourceImage, Rc::new(pixelfx::Surface::new(4, 4, 1, None)));

        let mut fe = DisplacementMap::new(8.0, ColorChannel::R, ColorChannel::G);
        fe.input2 = SlotKey::Named(3);
        fe.base.output = SlotKey::Named(1);
        fe.render(&mut slot);
        assert!(slot.get(SlotKey::Named(1)).is_none());
        assert!(fe.uses_input(SlotKey::Named(3)));
    }

    #[test]
    fn enlarge() {
        let fe = DisplacementMap::new(10.0, ColorChannel::R, ColorChannel::G);
        let mut area = IntRect::new(0, 0, 10, 10);
        fe.area_enlarge(&mut area, &Transform::new_scale(2.0, 1.0));
        assert_eq!(area, IntRect::new(-12, -7, 22, 17));
    }
}
