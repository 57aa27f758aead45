// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::borrow::Cow;

use pixelfx::{f64_bound, Color, EdgeMode, FuzzyZero, PixelFormat, Surface};

use crate::geom::{Rect, Transform};

/// A compositing operator.
///
/// Porter-Duff operators plus the blend modes from Compositing and Blending Level 1.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operator {
    Source,
    Over,
    In,
    Out,
    Atop,
    Xor,
    Lighter,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
}

impl Operator {
    /// Checks that the operator affects pixels not covered by the source.
    #[inline]
    pub fn is_unbounded(self) -> bool {
        matches!(self, Operator::Source | Operator::In | Operator::Out)
    }

    fn to_blend_mode(self) -> tiny_skia::BlendMode {
        use tiny_skia::BlendMode;
        match self {
            Operator::Source => BlendMode::Source,
            Operator::Over => BlendMode::SourceOver,
            Operator::In => BlendMode::SourceIn,
            Operator::Out => BlendMode::SourceOut,
            Operator::Atop => BlendMode::SourceAtop,
            Operator::Xor => BlendMode::Xor,
            Operator::Lighter => BlendMode::Plus,
            Operator::Multiply => BlendMode::Multiply,
            Operator::Screen => BlendMode::Screen,
            Operator::Overlay => BlendMode::Overlay,
            Operator::Darken => BlendMode::Darken,
            Operator::Lighten => BlendMode::Lighten,
            Operator::ColorDodge => BlendMode::ColorDodge,
            Operator::ColorBurn => BlendMode::ColorBurn,
            Operator::HardLight => BlendMode::HardLight,
            Operator::SoftLight => BlendMode::SoftLight,
            Operator::Difference => BlendMode::Difference,
            Operator::Exclusion => BlendMode::Exclusion,
            Operator::Hue => BlendMode::Hue,
            Operator::Saturation => BlendMode::Saturation,
            Operator::Color => BlendMode::Color,
            Operator::Luminosity => BlendMode::Luminosity,
        }
    }
}


/// A drawing context over a surface.
///
/// The transform maps source coordinates to target coordinates,
/// both in logical units. Device scales of both surfaces are applied on top.
pub struct Context<'a> {
    target: &'a mut Surface,
    transform: Transform,
}

impl<'a> Context<'a> {
    /// Creates a new context with an identity transform.
    pub fn new(target: &'a mut Surface) -> Self {
        Context { target, transform: Transform::default() }
    }

    /// Returns the current transform.
    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Sets the current transform.
    #[inline]
    pub fn set_transform(&mut self, ts: Transform) {
        self.transform = ts;
    }

    /// Prepends a translation, like `cairo_translate`.
    pub fn translate(&mut self, x: f64, y: f64) {
        self.transform = Transform::new_translate(x, y).then(&self.transform);
    }

    /// Prepends a scale, like `cairo_scale`.
    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.transform = Transform::new_scale(sx, sy).then(&self.transform);
    }

    /// Paints `src` with its origin at `(x, y)`.
    pub fn paint_surface(&mut self, src: &Surface, x: f64, y: f64, op: Operator) {
        let ts = Transform::new_scale(1.0 / src.device_scale() as f64, 1.0 / src.device_scale() as f64)
            .then(&Transform::new_translate(x, y))
            .then(&self.transform)
            .then(&self.device_scale());

        let both_legacy = src.format() == PixelFormat::Rgba8 && self.target.format() == PixelFormat::Rgba8;
        if both_legacy {
            self.paint_rgba8(src, &ts, op);
        } else {
            self.paint_generic(src, &ts, op);
        }
    }

    /// Fills a rectangle with a **unpremultiplied** color.
    ///
    /// Pixels outside of the rectangle are left untouched, for any operator.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, op: Operator) {
        let ts = self.transform.then(&self.device_scale());
        if self.target.format() == PixelFormat::Rgba8 {
            let r = match tiny_skia::Rect::from_ltrb(
                rect.left() as f32,
                rect.top() as f32,
                rect.right() as f32,
                rect.bottom() as f32,
            ) {
                Some(r) => r,
                None => return,
            };

            let c = color.resized(3).clamped();
            let ch = c.channels();
            let mut paint = tiny_skia::Paint::default();
            paint.set_color_rgba8(
                to_u8(ch[0]),
                to_u8(ch[1]),
                to_u8(ch[2]),
                to_u8(c.alpha()),
            );
            paint.blend_mode = op.to_blend_mode();
            paint.anti_alias = false;

            let (w, h) = (self.target.pixel_width(), self.target.pixel_height());
            let data = match self.target.rgba8_data_mut() {
                Some(d) => d,
                None => return,
            };
            if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(data, w, h) {
                pixmap.fill_rect(r, &paint, ts.to_tiny_skia(), None);
            }

            return;
        }

        let inv = match ts.invert() {
            Some(v) => v,
            None => return,
        };

        let channels = self.target.format().channels();
        let src = color.resized(channels).clamped().premultiplied();
        self.composite_with(op, |x, y| {
            let (ux, uy) = inv.apply(x as f64 + 0.5, y as f64 + 0.5);
            let inside = ux >= rect.left() && ux < rect.right() && uy >= rect.top() && uy < rect.bottom();
            if inside { Some(src) } else { None }
        });
    }

    /// Paints an **unpremultiplied** color through the alpha of `mask`,
    /// placed at `(x, y)`, with the `Over` operator.
    pub fn mask(&mut self, color: Color, mask: &Surface, x: f64, y: f64) {
        let ts = Transform::new_scale(1.0 / mask.device_scale() as f64, 1.0 / mask.device_scale() as f64)
            .then(&Transform::new_translate(x, y))
            .then(&self.transform)
            .then(&self.device_scale());
        let inv = match ts.invert() {
            Some(v) => v,
            None => return,
        };

        let channels = self.target.format().channels();
        let color = color.resized(channels).clamped();
        let mask = mask.access(EdgeMode::Zero);
        self.composite_with(Operator::Over, |x, y| {
            let (sx, sy) = inv.apply(x as f64 + 0.5, y as f64 + 0.5);
            let m = mask.sample(sx - 0.5, sy - 0.5, false).alpha();
            let mut c = color;
            c.set_alpha(color.alpha() * m);
            Some(c.premultiplied())
        });
    }

    /// Fills the target with transparent pixels.
    pub fn clear(&mut self) {
        self.target.clear();
    }

    fn device_scale(&self) -> Transform {
        let ds = self.target.device_scale() as f64;
        Transform::new_scale(ds, ds)
    }

    fn paint_rgba8(&mut self, src: &Surface, ts: &Transform, op: Operator) {
        let (sw, sh) = (src.pixel_width(), src.pixel_height());
        let (w, h) = (self.target.pixel_width(), self.target.pixel_height());
        let src_data: Cow<[u8]> = match src.rgba8_data() {
            Some(d) => Cow::Borrowed(d),
            None => Cow::Owned(vec![0; sw as usize * sh as usize * 4]),
        };
        let src_pixmap = match tiny_skia::PixmapRef::from_bytes(&src_data, sw, sh) {
            Some(p) => p,
            None => {
                if op.is_unbounded() {
                    self.target.clear();
                }
                return;
            }
        };

        let quality = if ts.is_translation() && is_integer(ts.e) && is_integer(ts.f) {
            tiny_skia::FilterQuality::Nearest
        } else {
            tiny_skia::FilterQuality::Bilinear
        };

        if op.is_unbounded() {
            // Render into a full-size layer first, so uncovered pixels take part too.
            let mut layer = vec![0; w as usize * h as usize * 4];
            if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(&mut layer, w, h) {
                let paint = tiny_skia::PixmapPaint { quality, ..tiny_skia::PixmapPaint::default() };
                pixmap.draw_pixmap(0, 0, src_pixmap, &paint, ts.to_tiny_skia(), None);
            }

            let data = match self.target.rgba8_data_mut() {
                Some(d) => d,
                None => return,
            };
            if op == Operator::Source {
                data.copy_from_slice(&layer);
                return;
            }

            let layer = match tiny_skia::PixmapRef::from_bytes(&layer, w, h) {
                Some(p) => p,
                None => return,
            };
            if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(data, w, h) {
                let paint = tiny_skia::PixmapPaint {
                    blend_mode: op.to_blend_mode(),
                    ..tiny_skia::PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, layer, &paint, tiny_skia::Transform::identity(), None);
            }

            return;
        }

        let data = match self.target.rgba8_data_mut() {
            Some(d) => d,
            None => return,
        };
        if let Some(mut pixmap) = tiny_skia::PixmapMut::from_bytes(data, w, h) {
            let paint = tiny_skia::PixmapPaint {
                opacity: 1.0,
                blend_mode: op.to_blend_mode(),
                quality,
            };
            pixmap.draw_pixmap(0, 0, src_pixmap, &paint, ts.to_tiny_skia(), None);
        }
    }

    fn paint_generic(&mut self, src: &Surface, ts: &Transform, op: Operator) {
        let inv = match ts.invert() {
            Some(v) => v,
            None => {
                if op.is_unbounded() {
                    self.target.clear();
                }
                return;
            }
        };

        let channels = self.target.format().channels();
        let src = src.access(EdgeMode::Zero);
        self.composite_with(op, |x, y| {
            let (sx, sy) = inv.apply(x as f64 + 0.5, y as f64 + 0.5);
            Some(src.sample(sx - 0.5, sy - 0.5, false).resized(channels))
        });
    }

    /// Composites a **premultiplied** source color onto every target pixel.
    ///
    /// `None` leaves the pixel as is.
    fn composite_with<F>(&mut self, op: Operator, source: F)
    where
        F: Fn(u32, u32) -> Option<Color> + Sync + Send,
    {
        let mut dest = self.target.access_mut(EdgeMode::NoCheck);
        dest.update_each_pixel(|x, y, d| match source(x, y) {
            Some(s) => composite(op, s, d),
            None => d,
        });
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (f64_bound(0.0, v, 1.0) * 255.0 + 0.5) as u8
}

#[inline]
fn is_integer(v: f64) -> bool {
    (v - v.round()).is_fuzzy_zero()
}

/// Composites two **premultiplied** colors with the same channel count.
pub(crate) fn composite(op: Operator, s: Color, d: Color) -> Color {
    let sa = s.alpha();
    let da = d.alpha();
    let porter_duff = |fa: f64, fb: f64| {
        let mut c = s;
        for (v, dv) in c.channels_mut().iter_mut().zip(d.channels()) {
            *v = *v * fa + dv * fb;
        }
        c.set_alpha(sa * fa + da * fb);
        c
    };

    match op {
        Operator::Source => s,
        Operator::Over => porter_duff(1.0, 1.0 - sa),
        Operator::In => porter_duff(da, 0.0),
        Operator::Out => porter_duff(1.0 - da, 0.0),
        Operator::Atop => porter_duff(da, 1.0 - sa),
        Operator::Xor => porter_duff(1.0 - da, 1.0 - sa),
        Operator::Lighter => porter_duff(1.0, 1.0).clamped(),
        Operator::Hue | Operator::Saturation | Operator::Color | Operator::Luminosity => {
            if s.len() != 3 {
                return composite(Operator::Over, s, d);
            }

            let cs = s.unpremultiplied();
            let cb = d.unpremultiplied();
            let cs = [cs.component(0), cs.component(1), cs.component(2)];
            let cb = [cb.component(0), cb.component(1), cb.component(2)];
            let mixed = match op {
                Operator::Hue => set_lum(set_sat(cs, sat(cb)), lum(cb)),
                Operator::Saturation => set_lum(set_sat(cb, sat(cs)), lum(cb)),
                Operator::Color => set_lum(cs, lum(cb)),
                _ => set_lum(cb, lum(cs)),
            };

            blended(s, d, |i, _, _| mixed[i])
        }
        _ => blended(s, d, |_, cb, cs| blend_channel(op, cb, cs)),
    }
}

/// Applies a blend function to **unpremultiplied** channels and composites
/// the result with source-over.
fn blended<F>(s: Color, d: Color, f: F) -> Color
where
    F: Fn(usize, f64, f64) -> f64,
{
    let sa = s.alpha();
    let da = d.alpha();
    let us = s.unpremultiplied();
    let ud = d.unpremultiplied();

    let mut c = s;
    for (i, v) in c.channels_mut().iter_mut().enumerate() {
        let cs = us.component(i);
        let cb = ud.component(i);
        let b = f64_bound(0.0, f(i, cb, cs), 1.0);
        *v = (1.0 - da) * s.component(i) + (1.0 - sa) * d.component(i) + sa * da * b;
    }
    c.set_alpha(sa + da - sa * da);
    c
}

fn blend_channel(op: Operator, cb: f64, cs: f64) -> f64 {
    match op {
        Operator::Multiply => cb * cs,
        Operator::Screen => cb + cs - cb * cs,
        Operator::Overlay => blend_channel(Operator::HardLight, cs, cb),
        Operator::Darken => cb.min(cs),
        Operator::Lighten => cb.max(cs),
        Operator::ColorDodge => {
            if cb.is_fuzzy_zero() {
                0.0
            } else if cs >= 1.0 {
                1.0
            } else {
                (cb / (1.0 - cs)).min(1.0)
            }
        }
        Operator::ColorBurn => {
            if cb >= 1.0 {
                1.0
            } else if cs.is_fuzzy_zero() {
                0.0
            } else {
                1.0 - ((1.0 - cb) / cs).min(1.0)
            }
        }
        Operator::HardLight => {
            if cs <= 0.5 {
                cb * 2.0 * cs
            } else {
                let s = 2.0 * cs - 1.0;
                cb + s - cb * s
            }
        }
        Operator::SoftLight => {
            if cs <= 0.5 {
                cb - (1.0 - 2.0 * cs) * cb * (1.0 - cb)
            } else {
                let d = if cb <= 0.25 {
                    ((16.0 * cb - 12.0) * cb + 4.0) * cb
                } else {
                    cb.sqrt()
                };
                cb + (2.0 * cs - 1.0) * (d - cb)
            }
        }
        Operator::Difference => (cb - cs).abs(),
        Operator::Exclusion => cb + cs - 2.0 * cb * cs,
        _ => cs,
    }
}

fn lum(c: [f64; 3]) -> f64 {
    0.3 * c[0] + 0.59 * c[1] + 0.11 * c[2]
}

fn clip_color(c: [f64; 3]) -> [f64; 3] {
    let l = lum(c);
    let n = c[0].min(c[1]).min(c[2]);
    let x = c[0].max(c[1]).max(c[2]);
    let mut c = c;
    if n < 0.0 {
        for v in &mut c {
            *v = l + (*v - l) * l / (l - n);
        }
    }
    if x > 1.0 {
        for v in &mut c {
            *v = l + (*v - l) * (1.0 - l) / (x - l);
        }
    }
    c
}

fn set_lum(c: [f64; 3], l: f64) -> [f64; 3] {
    let d = l - lum(c);
    clip_color([c[0] + d, c[1] + d, c[2] + d])
}

fn sat(c: [f64; 3]) -> f64 {
    c[0].max(c[1]).max(c[2]) - c[0].min(c[1]).min(c[2])
}

fn set_sat(c: [f64; 3], s: f64) -> [f64; 3] {
    let max = c[0].max(c[1]).max(c[2]);
    let min = c[0].min(c[1]).min(c[2]);
    let range = max - min;
    let mut out = [0.0; 3];
    if range > 0.0 {
        for (o, v) in out.iter_mut().zip(&c) {
            *o = (v - min) * s / range;
        }
    }
    out
}


#[cfg(test)]
mod tests {
    use super::*;
    use pixelfx::ColorSpace;

    fn filled(space: Option<ColorSpace>, color: Color) -> Surface {
        let mut s = Surface::new(4, 4, 1, space);
        Context::new(&mut s).fill_rect(Rect::from_xywh(0.0, 0.0, 4.0, 4.0), color, Operator::Source);
        s
    }

    #[test]
    fn porter_duff() {
        let s = Color::rgba(0.5, 0.0, 0.0, 0.5);
        let d = Color::rgba(0.0, 1.0, 0.0, 1.0);
        let over = composite(Operator::Over, s, d);
        assert!((over.alpha() - 1.0).abs() < 1e-9);
        assert!((over.component(1) - 0.5).abs() < 1e-9);

        let xor = composite(Operator::Xor, s, d);
        assert!((xor.alpha() - 0.5).abs() < 1e-9);
        assert!(composite(Operator::Out, s, d).alpha().is_fuzzy_zero());
    }

    #[test]
    fn multiply_opaque() {
        let s = Color::rgba(0.5, 0.5, 0.5, 1.0);
        let d = Color::rgba(0.5, 1.0, 0.0, 1.0);
        let c = composite(Operator::Multiply, s, d);
        assert!((c.component(0) - 0.25).abs() < 1e-9);
        assert!((c.component(1) - 0.5).abs() < 1e-9);
        assert!(c.component(2).is_fuzzy_zero());
    }

    #[test]
    fn fill_float() {
        let s = filled(Some(ColorSpace::LinearRgb), Color::rgba(0.25, 0.5, 1.0, 0.5));
        let c = s.access(EdgeMode::NoCheck).color_at(3, 3, true);
        assert!((c.component(0) - 0.25).abs() < 1e-6);
        assert!((c.alpha() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn paint_offset_rgba8() {
        let src = filled(None, Color::rgba(1.0, 0.0, 0.0, 1.0));
        let mut dst = Surface::new(8, 8, 1, None);
        Context::new(&mut dst).paint_surface(&src, 2.0, 3.0, Operator::Over);
        let a = dst.access(EdgeMode::NoCheck);
        assert_eq!(a.alpha_at(1, 3), 0.0);
        assert_eq!(a.alpha_at(2, 3), 1.0);
        assert_eq!(a.alpha_at(5, 6), 1.0);
        assert_eq!(a.alpha_at(6, 6), 0.0);
    }

    #[test]
    fn paint_offset_float() {
        let src = filled(Some(ColorSpace::Srgb), Color::rgba(1.0, 0.0, 0.0, 1.0));
        let mut dst = Surface::new(8, 8, 1, Some(ColorSpace::Srgb));
        Context::new(&mut dst).paint_surface(&src, 2.0, 3.0, Operator::Over);
        let a = dst.access(EdgeMode::NoCheck);
        assert!(a.alpha_at(1, 3).is_fuzzy_zero());
        assert!((a.alpha_at(2, 3) - 1.0).abs() < 1e-6);
        assert!((a.alpha_at(5, 6) - 1.0).abs() < 1e-6);
        assert!(a.alpha_at(6, 6).is_fuzzy_zero());
    }

    #[test]
    fn over_keeps_backdrop() {
        let src = filled(Some(ColorSpace::Srgb), Color::rgba(1.0, 0.0, 0.0, 0.5));
        let mut dst = Surface::new(8, 8, 1, Some(ColorSpace::Srgb));
        Context::new(&mut dst).fill_rect(
            Rect::from_xywh(0.0, 0.0, 8.0, 8.0),
            Color::rgba(0.0, 0.0, 1.0, 1.0),
            Operator::Source,
        );
        for _ in 0..3 {
            Context::new(&mut dst).paint_surface(&src, 4.0, 4.0, Operator::Over);
        }
        let a = dst.access(EdgeMode::NoCheck);
        let c = a.color_at(1, 1, false);
        assert!((c.component(2) - 1.0).abs() < 1e-6);
        // Three half-transparent layers leave 1/8 of the backdrop.
        let c = a.color_at(6, 6, false);
        assert!((c.component(0) - 0.875).abs() < 1e-6);
        assert!((c.component(2) - 0.125).abs() < 1e-6);
        assert!((c.alpha() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn in_clears_uncovered() {
        let src = filled(None, Color::rgba(1.0, 0.0, 0.0, 1.0));
        let mut dst = filled(None, Color::rgba(0.0, 1.0, 0.0, 1.0));
        let mut small = Surface::new(2, 2, 1, None);
        Context::new(&mut small).paint_surface(&src, 0.0, 0.0, Operator::Source);
        Context::new(&mut dst).paint_surface(&small, 0.0, 0.0, Operator::In);
        let a = dst.access(EdgeMode::NoCheck);
        assert_eq!(a.alpha_at(0, 0), 1.0);
        assert_eq!(a.alpha_at(3, 3), 0.0);
    }

    #[test]
    fn mask_alpha() {
        let mask = filled(Some(ColorSpace::Alpha), Color::new(&[], 0.5));
        let mut dst = Surface::new(4, 4, 1, Some(ColorSpace::Srgb));
        Context::new(&mut dst).mask(Color::rgba(0.0, 0.0, 1.0, 1.0), &mask, 0.0, 0.0);
        let c = dst.access(EdgeMode::NoCheck).color_at(1, 1, true);
        assert!((c.alpha() - 0.5).abs() < 0.01);
        assert!((c.component(2) - 1.0).abs() < 0.01);
    }

    #[test]
    fn device_scale() {
        let src = Surface::new(2, 2, 2, Some(ColorSpace::Srgb));
        let mut src = src;
        Context::new(&mut src).fill_rect(
            Rect::from_xywh(0.0, 0.0, 2.0, 2.0),
            Color::rgba(1.0, 1.0, 1.0, 1.0),
            Operator::Source,
        );
        assert_eq!(src.pixel_width(), 4);
        assert!((src.access(EdgeMode::NoCheck).alpha_at(3, 3) - 1.0).abs() < 1e-6);

        let mut dst = Surface::new(4, 4, 2, Some(ColorSpace::Srgb));
        Context::new(&mut dst).paint_surface(&src, 1.0, 1.0, Operator::Over);
        let a = dst.access(EdgeMode::NoCheck);
        assert!(a.alpha_at(1, 1).is_fuzzy_zero());
        assert!((a.alpha_at(2, 2) - 1.0).abs() < 1e-6);
        assert!((a.alpha_at(5, 5) - 1.0).abs() < 1e-6);
        assert!(a.alpha_at(6, 6).is_fuzzy_zero());
    }
}
