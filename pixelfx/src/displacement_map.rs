// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{EdgeMode, PixelAccess, PixelAccessMut};

/// A color channel.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum ColorChannel { R, G, B, A }

impl ColorChannel {
    /// Returns a component index inside a color with `channels` channels.
    ///
    /// Indices past the last channel select the alpha.
    pub fn index(self, channels: usize) -> usize {
        match self {
            ColorChannel::R => 0,
            ColorChannel::G => 1usize.min(channels),
            ColorChannel::B => 2usize.min(channels),
            ColorChannel::A => channels,
        }
    }
}

/// Applies a displacement map.
///
/// Every `dest` pixel is sampled from `src` at
/// `(x + sx * (cx - 0.5), y + sy * (cy - 0.5))`, where `cx` and `cy` are
/// the selected **unpremultiplied** `map` components.
///
/// `src` is sampled bilinearly; pixels outside of it are transparent.
pub fn displacement_map(
    x_channel_selector: ColorChannel,
    y_channel_selector: ColorChannel,
    sx: f64,
    sy: f64,
    src: &PixelAccess,
    map: &PixelAccess,
    dest: &mut PixelAccessMut,
) {
    let src = src.with_edge(EdgeMode::Zero);
    let map = map.with_edge(EdgeMode::Zero);
    let xi = x_channel_selector.index(map.channels());
    let yi = y_channel_selector.index(map.channels());
    let channels = dest.channels();

    dest.for_each_pixel(false, |x, y| {
        let m = map.color_at(x as i32, y as i32, true);
        let dx = sx * (m.component(xi) - 0.5);
        let dy = sy * (m.component(yi) - 0.5);
        src.sample(x as f64 + dx, y as f64 + dy, false).resized(channels)
    });
}
