// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pixelfx::{Color, ColorSpace, EdgeMode, Surface};

use super::FilterUnits;
use crate::context::{Context, Operator};
use crate::geom::{IntRect, Rect, Transform};

/// Units of a `width` x `height` render area with an identity transform.
pub fn units(width: u32, height: u32) -> FilterUnits {
    let mut u = FilterUnits::default();
    u.set_ctm(Transform::default());
    u.set_filter_area(Rect::from_xywh(0.0, 0.0, width as f64, height as f64));
    u.set_render_area(IntRect::from_xywh(0, 0, width, height));
    u.set_resolution(width as f64, height as f64);
    u
}

/// A surface with `rect` filled by an unpremultiplied `color`.
pub fn filled(width: u32, height: u32, space: Option<ColorSpace>, rect: Rect, color: Color) -> Surface {
    let mut s = Surface::new(width, height, 1, space);
    Context::new(&mut s).fill_rect(rect, color, Operator::Source);
    s
}

pub fn alpha(s: &Surface, x: i32, y: i32) -> f64 {
    s.access(EdgeMode::NoCheck).alpha_at(x, y)
}

pub fn color(s: &Surface, x: i32, y: i32) -> Color {
    s.access(EdgeMode::NoCheck).color_at(x, y, true)
}
