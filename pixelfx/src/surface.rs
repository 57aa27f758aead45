// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::FromSlice;

use crate::access::{Data, DataMut};
use crate::convert::{AlphaSpaceExtraction, ColorSpaceTransform};
use crate::{ColorContext, ColorSpace, EdgeMode, PixelAccess, PixelAccessMut};

/// A pixel encoding, fixed by the color space component count.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PixelFormat {
    /// 8-bit alpha only.
    A8,
    /// 8-bit premultiplied RGBA.
    Rgba8,
    /// 32-bit float, three channels and an alpha per buffer.
    Float {
        /// The number of color channels.
        channels: usize,
    },
}

impl PixelFormat {
    /// Returns a format used by surfaces in the specified space.
    ///
    /// No color space means legacy 8-bit sRGB.
    pub fn for_space(space: Option<&ColorSpace>) -> Self {
        match space.map(|s| s.components()) {
            None => PixelFormat::Rgba8,
            Some(0) => PixelFormat::A8,
            Some(n) => PixelFormat::Float { channels: n.min(crate::MAX_CHANNELS) },
        }
    }

    /// Returns the number of color channels, excluding alpha.
    pub fn channels(&self) -> usize {
        match self {
            PixelFormat::A8 => 0,
            PixelFormat::Rgba8 => 3,
            PixelFormat::Float { channels } => *channels,
        }
    }

    /// Returns the number of buffers used by this format.
    pub fn buffers(&self) -> usize {
        match self {
            PixelFormat::A8 | PixelFormat::Rgba8 => 1,
            PixelFormat::Float { channels } => ((channels + 2) / 3).max(1),
        }
    }

    /// Checks that the format is 8-bit.
    pub fn is_integer(&self) -> bool {
        !matches!(self, PixelFormat::Float { .. })
    }
}


/// A surface error.
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum SurfaceError {
    /// The surface is already allocated in a different pixel format.
    #[error("surface is already realized as {0:?}")]
    Realized(PixelFormat),
    /// In-place conversion into the alpha space.
    #[error("refusing to convert to alpha in-place")]
    AlphaTarget,
    /// In-place conversion of a legacy surface.
    #[error("refusing to convert a surface without a color space in-place")]
    NoColorSpace,
}


#[derive(Clone, Debug)]
enum Buffers {
    Unrealized,
    A8(Vec<u8>),
    Rgba8(Vec<u8>),
    Float(Vec<f32>, Option<Vec<f32>>),
}

/// A raster surface.
///
/// Buffers are allocated on first mutable access.
/// Unrealized surfaces read as transparent.
///
/// Dimensions are logical; buffers are `dimensions * device_scale` pixels.
#[derive(Clone, Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    device_scale: u32,
    space: Option<ColorSpace>,
    buffers: Buffers,
}

impl Surface {
    /// Creates a new, unrealized surface.
    ///
    /// A zero `device_scale` is treated as 1.
    pub fn new(width: u32, height: u32, device_scale: u32, space: Option<ColorSpace>) -> Self {
        Surface {
            width,
            height,
            device_scale: device_scale.max(1),
            space,
            buffers: Buffers::Unrealized,
        }
    }

    /// Creates a legacy sRGB surface from **premultiplied** RGBA bytes.
    ///
    /// Returns `None` when `data` size doesn't match.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() != width as usize * height as usize * 4 {
            return None;
        }

        Some(Surface {
            width,
            height,
            device_scale: 1,
            space: None,
            buffers: Buffers::Rgba8(data),
        })
    }

    /// Returns the logical width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the logical height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the buffer width.
    #[inline]
    pub fn pixel_width(&self) -> u32 {
        self.width * self.device_scale
    }

    /// Returns the buffer height.
    #[inline]
    pub fn pixel_height(&self) -> u32 {
        self.height * self.device_scale
    }

    /// Returns the device scale.
    #[inline]
    pub fn device_scale(&self) -> u32 {
        self.device_scale
    }

    /// Returns the color space.
    #[inline]
    pub fn color_space(&self) -> Option<&ColorSpace> {
        self.space.as_ref()
    }

    /// Returns the pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        PixelFormat::for_space(self.space.as_ref())
    }

    /// Checks that buffers are allocated.
    #[inline]
    pub fn is_realized(&self) -> bool {
        !matches!(self.buffers, Buffers::Unrealized)
    }

    /// Checks that the surface is in the specified space.
    pub fn is_in(&self, space: Option<&ColorSpace>) -> bool {
        match (self.space.as_ref(), space) {
            (Some(a), Some(b)) => a == b,
            (None, None) => true,
            _ => false,
        }
    }

    /// Retags the surface.
    ///
    /// Pixels are not converted.
    /// A realized surface can't change its pixel format.
    pub fn set_color_space(&mut self, space: Option<ColorSpace>) -> Result<(), SurfaceError> {
        let format = self.format();
        if self.is_realized() && PixelFormat::for_space(space.as_ref()) != format {
            return Err(SurfaceError::Realized(format));
        }

        self.space = space;
        Ok(())
    }

    /// Creates an unrealized surface with the same size, scale and space.
    pub fn similar(&self) -> Surface {
        Surface::new(self.width, self.height, self.device_scale, self.space.clone())
    }

    /// Creates an unrealized surface with the same scale and space.
    pub fn similar_sized(&self, width: u32, height: u32) -> Surface {
        Surface::new(width, height, self.device_scale, self.space.clone())
    }

    /// Creates an unrealized surface with the same size and scale.
    pub fn similar_in(&self, space: Option<ColorSpace>) -> Surface {
        Surface::new(self.width, self.height, self.device_scale, space)
    }

    fn realize(&mut self) {
        if self.is_realized() {
            return;
        }

        let len = self.pixel_width() as usize * self.pixel_height() as usize;
        self.buffers = match self.format() {
            PixelFormat::A8 => Buffers::A8(vec![0; len]),
            PixelFormat::Rgba8 => Buffers::Rgba8(vec![0; len * 4]),
            PixelFormat::Float { channels } => {
                let secondary = if channels > 3 { Some(vec![0.0; len * 4]) } else { None };
                Buffers::Float(vec![0.0; len * 4], secondary)
            }
        };
    }

    /// Returns a read-only accessor.
    pub fn access(&self, edge: EdgeMode) -> PixelAccess<'_> {
        let data = match &self.buffers {
            Buffers::Unrealized => Data::Empty,
            Buffers::A8(d) => Data::A8(d),
            Buffers::Rgba8(d) => Data::Rgba8(d.as_rgba()),
            Buffers::Float(p, s) => Data::Float(p, s.as_deref()),
        };

        PixelAccess::new(data, self.pixel_width(), self.pixel_height(), self.format().channels(), edge)
    }

    /// Returns a mutable accessor, allocating buffers first.
    pub fn access_mut(&mut self, edge: EdgeMode) -> PixelAccessMut<'_> {
        self.realize();
        let (width, height) = (self.pixel_width(), self.pixel_height());
        let channels = self.format().channels();
        let data = match &mut self.buffers {
            Buffers::A8(d) => DataMut::A8(d),
            Buffers::Rgba8(d) => DataMut::Rgba8(d.as_rgba_mut()),
            Buffers::Float(p, s) => DataMut::Float(p, s.as_deref_mut()),
            // `realize` never leaves the surface unrealized.
            Buffers::Unrealized => DataMut::A8(&mut []),
        };

        PixelAccessMut::new(data, width, height, channels, edge)
    }

    /// Returns premultiplied RGBA bytes of a realized legacy surface.
    pub fn rgba8_data(&self) -> Option<&[u8]> {
        match &self.buffers {
            Buffers::Rgba8(d) => Some(d.as_slice()),
            _ => None,
        }
    }

    /// Returns mutable premultiplied RGBA bytes of a legacy surface.
    ///
    /// Allocates buffers first.
    pub fn rgba8_data_mut(&mut self) -> Option<&mut [u8]> {
        self.realize();
        match &mut self.buffers {
            Buffers::Rgba8(d) => Some(d.as_mut_slice()),
            _ => None,
        }
    }

    /// Fills the surface with transparent pixels.
    pub fn clear(&mut self) {
        match &mut self.buffers {
            Buffers::Unrealized => {}
            Buffers::A8(d) | Buffers::Rgba8(d) => d.iter_mut().for_each(|v| *v = 0),
            Buffers::Float(p, s) => {
                p.iter_mut().for_each(|v| *v = 0.0);
                if let Some(s) = s {
                    s.iter_mut().for_each(|v| *v = 0.0);
                }
            }
        }
    }

    /// Converts pixels into another space in place.
    ///
    /// Alpha targets and legacy surfaces are refused; use
    /// [`converted_to_color_space`](Self::converted_to_color_space) instead.
    pub fn convert_to_color_space(
        &mut self,
        space: &ColorSpace,
        ctx: &ColorContext,
    ) -> Result<(), SurfaceError> {
        if space.is_alpha() {
            return Err(SurfaceError::AlphaTarget);
        }

        if self.space.is_none() {
            return Err(SurfaceError::NoColorSpace);
        }

        if self.is_realized() && !self.is_in(Some(space)) {
            *self = self.converted_to_color_space(Some(space), ctx);
        } else {
            self.space = Some(space.clone());
            if self.is_realized() && self.format() != PixelFormat::for_space(Some(space)) {
                self.buffers = Buffers::Unrealized;
            }
        }

        Ok(())
    }

    /// Returns a converted copy.
    ///
    /// Converting into the alpha space extracts the alpha channel.
    pub fn converted_to_color_space(&self, space: Option<&ColorSpace>, ctx: &ColorContext) -> Surface {
        let mut dest = self.similar_in(space.cloned());
        if self.is_realized() {
            let src = self.access(EdgeMode::NoCheck);
            let mut dst = dest.access_mut(EdgeMode::NoCheck);
            if space.map_or(false, |s| s.is_alpha()) {
                AlphaSpaceExtraction.filter(&mut dst, &src);
            } else {
                ColorSpaceTransform::new(self.space.as_ref(), space, ctx).filter(&mut dst, &src);
            }
        }

        dest
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::Color;

    #[test]
    fn formats() {
        let alpha = Surface::new(10, 10, 1, Some(ColorSpace::Alpha));
        assert_eq!(alpha.format(), PixelFormat::A8);
        assert_eq!(alpha.format().buffers(), 1);

        let legacy = Surface::new(10, 10, 1, None);
        assert_eq!(legacy.format(), PixelFormat::Rgba8);
        assert!(legacy.format().is_integer());

        let rgb = Surface::new(10, 10, 1, Some(ColorSpace::LinearRgb));
        assert_eq!(rgb.format(), PixelFormat::Float { channels: 3 });
        assert_eq!(rgb.format().buffers(), 1);

        let cmyk = Surface::new(10, 10, 1, Some(ColorSpace::Cmyk));
        assert_eq!(cmyk.format().buffers(), 2);

        let similar = cmyk.similar_sized(20, 20);
        assert_eq!(similar.format(), cmyk.format());
        assert!(similar.is_in(cmyk.color_space()));
    }

    #[test]
    fn lazy_realization() {
        let mut s = Surface::new(10, 10, 2, None);
        assert!(!s.is_realized());
        assert_eq!(s.access(EdgeMode::Error).color_at(19, 19, false).alpha(), 0.0);
        let a = s.access_mut(EdgeMode::Error);
        assert_eq!((a.width(), a.height()), (20, 20));
        assert!(s.is_realized());
    }

    #[test]
    fn retag_after_realization() {
        let mut s = Surface::new(2, 2, 1, Some(ColorSpace::Srgb));
        s.access_mut(EdgeMode::Error);
        assert!(s.set_color_space(Some(ColorSpace::LinearRgb)).is_ok());
        assert_eq!(
            s.set_color_space(Some(ColorSpace::Cmyk)),
            Err(SurfaceError::Realized(PixelFormat::Float { channels: 3 }))
        );
    }

    #[test]
    fn refuse_alpha_in_place() {
        let mut s = Surface::new(2, 2, 1, Some(ColorSpace::Srgb));
        let ctx = ColorContext::default();
        assert_eq!(s.convert_to_color_space(&ColorSpace::Alpha, &ctx), Err(SurfaceError::AlphaTarget));
        let mut legacy = Surface::new(2, 2, 1, None);
        assert_eq!(legacy.convert_to_color_space(&ColorSpace::Srgb, &ctx), Err(SurfaceError::NoColorSpace));
    }

    #[test]
    fn alpha_extraction() {
        let mut s = Surface::new(2, 1, 1, None);
        s.access_mut(EdgeMode::Error).color_to(1, 0, Color::rgba(1.0, 0.0, 0.0, 0.6), true);
        let alpha = s.converted_to_color_space(Some(&ColorSpace::Alpha), &ColorContext::default());
        let a = alpha.access(EdgeMode::Error);
        assert_eq!(a.channels(), 0);
        assert_eq!(a.alpha_at(0, 0), 0.0);
        assert!((a.alpha_at(1, 0) - 0.6).abs() <= 1.0 / 255.0);
    }

    #[test]
    fn in_place_round_trip() {
        let ctx = ColorContext::default();
        let mut s = Surface::new(1, 1, 1, Some(ColorSpace::Srgb));
        s.access_mut(EdgeMode::Error).color_to(0, 0, Color::rgba(0.2, 0.5, 0.8, 0.5), true);
        s.convert_to_color_space(&ColorSpace::Cmyk, &ctx).unwrap();
        assert_eq!(s.format().buffers(), 2);
        s.convert_to_color_space(&ColorSpace::Srgb, &ctx).unwrap();
        let c = s.access(EdgeMode::Error).color_at(0, 0, true);
        for (a, b) in c.channels().iter().zip(&[0.2, 0.5, 0.8]) {
            assert!((a - b).abs() < 1e-3);
        }
    }
}
