// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Surface resampling used by the reduced quality blur.

use crate::{Color, EdgeMode, PixelAccess, PixelAccessMut, MAX_CHANNELS};

/// Shrinks `src` into `dst` using a box filter.
///
/// Both images should have a **premultiplied alpha** and the same channel count.
/// Pixels outside of `src` are treated as transparent.
pub fn downsample(src: &PixelAccess, dst: &mut PixelAccessMut) {
    if dst.width() == 0 || dst.height() == 0 {
        return;
    }

    let sx = src.width() as f64 / dst.width() as f64;
    let sy = src.height() as f64 / dst.height() as f64;
    let src = src.with_edge(EdgeMode::Zero);
    let channels = dst.channels();

    dst.for_each_pixel(false, |x, y| {
        let (x0, x1) = (x as f64 * sx, (x + 1) as f64 * sx);
        let (y0, y1) = (y as f64 * sy, (y + 1) as f64 * sy);

        let mut values = [0.0; MAX_CHANNELS];
        let mut alpha = 0.0;
        for iy in y0.floor() as i32..y1.ceil() as i32 {
            let wy = coverage(iy, y0, y1);
            for ix in x0.floor() as i32..x1.ceil() as i32 {
                let w = coverage(ix, x0, x1) * wy;
                if w <= 0.0 {
                    continue;
                }

                let c = src.color_at(ix, iy, false);
                for (v, c) in values.iter_mut().zip(c.channels()) {
                    *v += c * w;
                }
                alpha += c.alpha() * w;
            }
        }

        let area = (x1 - x0) * (y1 - y0);
        for v in &mut values {
            *v /= area;
        }
        Color::new(&values[..channels], alpha / area)
    });
}

/// Enlarges `src` into `dst` using bilinear interpolation.
///
/// Both images should have a **premultiplied alpha** and the same channel count.
pub fn upsample(src: &PixelAccess, dst: &mut PixelAccessMut) {
    if src.width() == 0 || src.height() == 0 {
        return;
    }

    let sx = src.width() as f64 / dst.width().max(1) as f64;
    let sy = src.height() as f64 / dst.height().max(1) as f64;
    let src = src.with_edge(EdgeMode::Extend);
    dst.for_each_pixel(false, |x, y| {
        src.sample((x as f64 + 0.5) * sx - 0.5, (y as f64 + 0.5) * sy - 0.5, false)
    });
}

#[inline]
fn coverage(i: i32, lo: f64, hi: f64) -> f64 {
    let i = i as f64;
    ((i + 1.0).min(hi) - i.max(lo)).max(0.0)
}
