// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{f64_bound, Color, EdgeMode, FuzzyZero, PixelAccess, PixelAccessMut};

/// Performs an arithmetic composition.
///
/// `k1 * i1 * i2 + k2 * i1 + k3 * i2 + k4` is computed for every component
/// of **unpremultiplied** colors and clamped to `0..=1`.
///
/// Both sources are read with wrapping, so they may be smaller than `dest`.
pub fn arithmetic_composite(
    k1: f64,
    k2: f64,
    k3: f64,
    k4: f64,
    src1: &PixelAccess,
    src2: &PixelAccess,
    dest: &mut PixelAccessMut,
) {
    let channels = dest.channels();
    let src1 = src1.with_edge(EdgeMode::Wrap);
    let src2 = src2.with_edge(EdgeMode::Wrap);
    let calc = |i1: f64, i2: f64| f64_bound(0.0, k1 * i1 * i2 + k2 * i1 + k3 * i2 + k4, 1.0);

    dest.for_each_pixel(true, |x, y| {
        let c1 = src1.color_at(x as i32, y as i32, true).resized(channels);
        let c2 = src2.color_at(x as i32, y as i32, true).resized(channels);

        let a = calc(c1.alpha(), c2.alpha());
        if a.is_fuzzy_zero() {
            return Color::transparent(channels);
        }

        let mut c = c1;
        for (v, v2) in c.channels_mut().iter_mut().zip(c2.channels()) {
            *v = calc(*v, *v2);
        }
        c.set_alpha(a);
        c
    });
}
