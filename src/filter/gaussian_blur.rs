// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{downsample_for_quality, effect_radius, resample, EdgeMode, Surface};

use super::{Primitive, PrimitiveBase, Slot, Units};
use crate::geom::{IntRect, Transform};

/// A `feGaussianBlur` primitive.
#[derive(Clone, Debug, Default)]
pub struct GaussianBlur {
    /// Shared parameters.
    pub base: PrimitiveBase,
    deviation_x: f64,
    deviation_y: f64,
}

impl GaussianBlur {
    /// Creates a new blur with the same deviation along both axes.
    pub fn new(deviation: f64) -> Self {
        let mut fe = GaussianBlur::default();
        fe.set_deviation(deviation);
        fe
    }

    /// Sets the same deviation along both axes.
    ///
    /// Negative and non-finite values are ignored.
    pub fn set_deviation(&mut self, deviation: f64) {
        self.set_deviation_xy(deviation, deviation);
    }

    /// Sets deviations along each axis.
    ///
    /// Ignored when any value is negative or not finite.
    pub fn set_deviation_xy(&mut self, x: f64, y: f64) {
        if x.is_finite() && x >= 0.0 && y.is_finite() && y >= 0.0 {
            self.deviation_x = x;
            self.deviation_y = y;
        }
    }

    /// Returns deviations in primitive units.
    pub fn deviation(&self) -> (f64, f64) {
        (self.deviation_x, self.deviation_y)
    }

    /// Returns a blurred copy of `src`.
    pub(crate) fn blur(&self, slot: &Slot, src: &Surface) -> Surface {
        let units = slot.units();
        let (mut dx, mut dy) = (self.deviation_x, self.deviation_y);
        if units.primitive_units() == Units::ObjectBoundingBox {
            if let Some(bbox) = units.item_bbox() {
                dx *= bbox.width();
                dy *= bbox.height();
            }
        }

        let ts = units.user2pb();
        let ds = slot.device_scale() as f64;
        let deviation = (dx * ts.expansion_x() * ds, dy * ts.expansion_y() * ds);

        let size = (src.pixel_width(), src.pixel_height());
        let (small_size, deviation) = downsample_for_quality(slot.options().blur_quality, size, deviation);

        if small_size == size {
            let mut dest = src.clone();
            pixelfx::GaussianBlur::new(deviation.0, deviation.1)
                .filter(&mut dest.access_mut(EdgeMode::Zero));
            return dest;
        }

        let mut small = Surface::new(small_size.0, small_size.1, 1, src.color_space().cloned());
        resample::downsample(&src.access(EdgeMode::Zero), &mut small.access_mut(EdgeMode::NoCheck));
        pixelfx::GaussianBlur::new(deviation.0, deviation.1)
            .filter(&mut small.access_mut(EdgeMode::Zero));

        let mut dest = src.similar();
        resample::upsample(&small.access(EdgeMode::Extend), &mut dest.access_mut(EdgeMode::NoCheck));
        dest
    }

    /// Grows `area` by the blur radius.
    pub(crate) fn enlarge(&self, area: &mut IntRect, ts: &Transform) {
        let area_x = effect_radius(self.deviation_x * ts.expansion_x());
        let area_y = effect_radius(self.deviation_y * ts.expansion_y());
        // Rotations can mix up the axes.
        let area_max = area_x.max(area_y);
        area.expand_by(area_max, area_max);
    }
}

impl Primitive for GaussianBlur {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        if self.deviation_x > 0.0 && self.deviation_y > 0.0 {
            let out = self.blur(slot, &input);
            slot.set(self.base.output, Rc::new(out));
        } else {
            slot.set(self.base.output, input);
        }
    }

    fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        self.enlarge(area, ts);
    }

    fn complexity(&self, ts: &Transform) -> f64 {
        let area_x = effect_radius(self.deviation_x * ts.expansion_x());
        let area_y = effect_radius(self.deviation_y * ts.expansion_y());
        2.0 * area_x as f64 * area_y as f64
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        // The transform here is not the full user to screen one.
        false
    }
}
