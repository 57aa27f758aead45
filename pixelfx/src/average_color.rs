// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, FuzzyZero, PixelAccess, MAX_CHANNELS};

/// Returns the mean **unpremultiplied** color of `src`.
///
/// When `mask` is set, each pixel is weighted by the mask alpha,
/// or by `1 - alpha` when `invert` is set.
/// Returns `None` when the total weight is zero.
///
/// # Panics
///
/// When `mask` is smaller than `src`.
pub fn average_color(src: &PixelAccess, mask: Option<&PixelAccess>, invert: bool) -> Option<Color> {
    let channels = src.channels();
    let mut sum = [0.0; MAX_CHANNELS + 1];
    let mut count = 0.0;

    for y in 0..src.height() as i32 {
        for x in 0..src.width() as i32 {
            let mut amount = mask.map(|m| m.alpha_at(x, y)).unwrap_or(1.0);
            if invert {
                amount = 1.0 - amount;
            }

            let c = src.color_at(x, y, true);
            for (i, v) in sum[..=channels].iter_mut().enumerate() {
                *v += c.component(i) * amount;
            }
            count += amount;
        }
    }

    if count.is_fuzzy_zero() {
        return None;
    }

    for v in sum.iter_mut() {
        *v /= count;
    }

    Some(Color::new(&sum[..channels], sum[channels]))
}
