// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, ColorContext, ColorSpace, IccFormat, PixelAccess, PixelAccessMut};

/// Converts pixels between two color spaces.
///
/// No color space means legacy sRGB.
///
/// ICC to ICC conversions go through the context's color management service
/// when one is set. Any failure there is logged and the internal,
/// per-pixel path is used instead.
pub struct ColorSpaceTransform<'a> {
    from: Option<&'a ColorSpace>,
    to: Option<&'a ColorSpace>,
    ctx: &'a ColorContext,
}

impl<'a> ColorSpaceTransform<'a> {
    /// Creates a new transform.
    pub fn new(from: Option<&'a ColorSpace>, to: Option<&'a ColorSpace>, ctx: &'a ColorContext) -> Self {
        ColorSpaceTransform { from, to, ctx }
    }

    /// Converts `src` into `dst`.
    ///
    /// Both accessors must have the same size.
    pub fn filter(&self, dst: &mut PixelAccessMut, src: &PixelAccess) {
        let srgb = ColorSpace::Srgb;
        let from = self.from.unwrap_or(&srgb);
        let to = self.to.unwrap_or(&srgb);

        if from == to {
            dst.for_each_pixel(false, |x, y| src.color_at(x as i32, y as i32, false));
            return;
        }

        if from.is_direct() && to.is_direct() && self.transform_icc(dst, src, from, to) {
            return;
        }

        dst.for_each_pixel(true, |x, y| {
            let c = src.color_at(x as i32, y as i32, true);
            to.from_srgb(from.to_srgb(c))
        });
    }

    fn transform_icc(
        &self,
        dst: &mut PixelAccessMut,
        src: &PixelAccess,
        from: &ColorSpace,
        to: &ColorSpace,
    ) -> bool {
        let cms = match self.ctx.cms {
            Some(ref cms) => cms,
            None => return false,
        };

        let (from_profile, to_profile) = match (from, to) {
            (ColorSpace::Icc(a), ColorSpace::Icc(b)) => (a, b),
            _ => return false,
        };

        if src.channels() != from.components() || dst.channels() != to.components() {
            log::warn!(
                "Surface format doesn't match the color space ({} != {} || {} != {}).",
                src.channels(), from.components(), dst.channels(), to.components()
            );
            return false;
        }

        let in_format = IccFormat { channels: src.channels(), alpha: true };
        let out_format = IccFormat { channels: dst.channels(), alpha: true };
        let transform = match cms.create_transform(
            from_profile, in_format, to_profile, out_format, self.ctx.intent,
        ) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("ICC transform failed: {}. Falling back to internal conversion.", e);
                return false;
            }
        };

        let (width, height) = (src.width(), src.height());
        let in_len = in_format.pixel_len();
        let out_len = out_format.pixel_len();

        // ICC transforms work on unpremultiplied colors.
        let mut input = Vec::with_capacity(width as usize * height as usize * in_len);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let c = src.color_at(x, y, true);
                input.extend(c.channels().iter().map(|v| *v as f32));
                input.push(c.alpha() as f32);
            }
        }

        let mut output = vec![0.0f32; width as usize * height as usize * out_len];
        transform.apply(
            &input, width as usize * in_len,
            &mut output, width as usize * out_len,
            width, height,
        );

        let channels = dst.channels();
        dst.for_each_pixel(true, |x, y| {
            let idx = (y as usize * width as usize + x as usize) * out_len;
            let mut values = [0.0; crate::MAX_CHANNELS];
            for (v, o) in values.iter_mut().zip(&output[idx..idx + channels]) {
                *v = *o as f64;
            }
            Color::new(&values[..channels], src.alpha_at(x as i32, y as i32))
        });

        true
    }
}

/// Copies only the alpha channel.
///
/// Used to produce alpha-space surfaces.
pub struct AlphaSpaceExtraction;

impl AlphaSpaceExtraction {
    /// Copies alphas of `src` into `dst`.
    pub fn filter(&self, dst: &mut PixelAccessMut, src: &PixelAccess) {
        dst.for_each_pixel(false, |x, y| Color::new(&[], src.alpha_at(x as i32, y as i32)));
    }
}
