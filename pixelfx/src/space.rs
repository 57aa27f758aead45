// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;
use std::sync::Arc;

use crate::Color;

/// A color space tag.
///
/// Internal conversions pivot through gamma-encoded sRGB.
/// ICC spaces are converted through a [`ColorManagement`] service when one
/// is available in the [`ColorContext`].
#[derive(Clone, Debug)]
pub enum ColorSpace {
    /// Alpha only. No color channels.
    Alpha,
    /// Gamma-encoded sRGB.
    Srgb,
    /// Linear-light sRGB primaries.
    LinearRgb,
    /// Single gray channel.
    Gray,
    /// Naive device CMYK.
    Cmyk,
    /// A space described by an ICC profile.
    Icc(Arc<IccProfile>),
}

impl ColorSpace {
    /// Returns the number of color components, excluding alpha.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::Alpha => 0,
            ColorSpace::Gray => 1,
            ColorSpace::Srgb | ColorSpace::LinearRgb => 3,
            ColorSpace::Cmyk => 4,
            ColorSpace::Icc(profile) => profile.components,
        }
    }

    /// Checks that this is the alpha-only space.
    #[inline]
    pub fn is_alpha(&self) -> bool {
        matches!(self, ColorSpace::Alpha)
    }

    /// Checks that conversions should go through an ICC transform.
    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self, ColorSpace::Icc(_))
    }

    /// Converts unpremultiplied channels of this space into sRGB.
    ///
    /// Alpha is kept as is.
    pub fn to_srgb(&self, color: Color) -> Color {
        let a = color.alpha();
        match self {
            ColorSpace::Alpha => Color::rgba(0.0, 0.0, 0.0, a),
            ColorSpace::Srgb => color.resized(3),
            ColorSpace::LinearRgb => {
                let mut c = color.resized(3);
                for v in c.channels_mut() {
                    *v = linear_to_srgb(*v);
                }
                c
            }
            ColorSpace::Gray => {
                let g = color.channels().first().copied().unwrap_or(0.0);
                Color::rgba(g, g, g, a)
            }
            ColorSpace::Cmyk => {
                let c = color.resized(4);
                let ch = c.channels();
                let k = 1.0 - ch[3];
                Color::rgba((1.0 - ch[0]) * k, (1.0 - ch[1]) * k, (1.0 - ch[2]) * k, a)
            }
            // Without a CMS an ICC space can only be treated as sRGB.
            ColorSpace::Icc(_) => color.resized(3),
        }
    }

    /// Converts unpremultiplied sRGB channels into this space.
    ///
    /// Alpha is kept as is.
    pub fn from_srgb(&self, color: Color) -> Color {
        let a = color.alpha();
        let rgb = color.resized(3);
        let ch = rgb.channels();
        match self {
            ColorSpace::Alpha => Color::new(&[], a),
            ColorSpace::Srgb => rgb,
            ColorSpace::LinearRgb => {
                let mut c = rgb;
                for v in c.channels_mut() {
                    *v = srgb_to_linear(*v);
                }
                c
            }
            ColorSpace::Gray => {
                Color::new(&[0.2126 * ch[0] + 0.7152 * ch[1] + 0.0722 * ch[2]], a)
            }
            ColorSpace::Cmyk => {
                let max = ch[0].max(ch[1]).max(ch[2]);
                let k = 1.0 - max;
                if max > 0.0 {
                    Color::new(&[
                        (max - ch[0]) / max,
                        (max - ch[1]) / max,
                        (max - ch[2]) / max,
                        k,
                    ], a)
                } else {
                    Color::new(&[0.0, 0.0, 0.0, 1.0], a)
                }
            }
            ColorSpace::Icc(profile) => rgb.resized(profile.components),
        }
    }

    /// Checks that two spaces share the same identity.
    ///
    /// ICC spaces are compared by profile identity first and then by name.
    pub fn same_as(&self, other: &ColorSpace) -> bool {
        match (self, other) {
            (ColorSpace::Icc(a), ColorSpace::Icc(b)) => Arc::ptr_eq(a, b) || a.name == b.name,
            (ColorSpace::Alpha, ColorSpace::Alpha) => true,
            (ColorSpace::Srgb, ColorSpace::Srgb) => true,
            (ColorSpace::LinearRgb, ColorSpace::LinearRgb) => true,
            (ColorSpace::Gray, ColorSpace::Gray) => true,
            (ColorSpace::Cmyk, ColorSpace::Cmyk) => true,
            _ => false,
        }
    }
}

impl PartialEq for ColorSpace {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

#[inline]
fn srgb_to_linear(v: f64) -> f64 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

#[inline]
fn linear_to_srgb(v: f64) -> f64 {
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}


/// An ICC profile handle.
///
/// The profile bytes are opaque here and interpreted only by a
/// [`ColorManagement`] implementation.
#[derive(Clone, Debug)]
pub struct IccProfile {
    /// A profile name, used for identity checks.
    pub name: String,
    /// The number of color components, excluding alpha.
    pub components: usize,
    /// Raw profile data.
    pub data: Vec<u8>,
}

impl IccProfile {
    /// Creates a new profile handle.
    pub fn new(name: impl Into<String>, components: usize, data: Vec<u8>) -> Self {
        IccProfile { name: name.into(), components, data }
    }
}

/// An ICC rendering intent.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RenderingIntent {
    #[default]
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

/// An interleaved f32 pixel layout passed to an ICC transform.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IccFormat {
    /// The number of color channels.
    pub channels: usize,
    /// Whether an alpha value follows the channels.
    pub alpha: bool,
}

impl IccFormat {
    /// Returns the number of floats per pixel.
    #[inline]
    pub fn pixel_len(&self) -> usize {
        self.channels + usize::from(self.alpha)
    }
}

/// An ICC service error.
#[derive(Debug, thiserror::Error)]
pub enum IccError {
    /// The service can't build a transform between those profiles.
    #[error("cannot build a transform from '{from}' to '{to}'")]
    Unsupported {
        /// The source profile name.
        from: String,
        /// The target profile name.
        to: String,
    },
    /// The profile data is not understood.
    #[error("invalid profile '{0}'")]
    InvalidProfile(String),
    /// Any other service failure.
    #[error("{0}")]
    Other(String),
}

/// A prepared ICC transform.
pub trait IccTransform: Send + Sync {
    /// Transforms a rectangular block of interleaved f32 pixels.
    ///
    /// Strides are in floats.
    fn apply(
        &self,
        src: &[f32],
        src_stride: usize,
        dst: &mut [f32],
        dst_stride: usize,
        width: u32,
        height: u32,
    );
}

/// An ICC color management service.
pub trait ColorManagement: Send + Sync {
    /// Builds a transform between two profiles.
    fn create_transform(
        &self,
        from: &IccProfile,
        from_format: IccFormat,
        to: &IccProfile,
        to_format: IccFormat,
        intent: RenderingIntent,
    ) -> Result<Box<dyn IccTransform>, IccError>;
}

/// Color conversion settings, passed explicitly to every conversion.
#[derive(Clone, Default)]
pub struct ColorContext {
    /// An optional ICC service.
    pub cms: Option<Arc<dyn ColorManagement>>,
    /// A rendering intent for ICC transforms.
    pub intent: RenderingIntent,
}

impl ColorContext {
    /// Creates a context with a color management service.
    pub fn with_cms(cms: Arc<dyn ColorManagement>) -> Self {
        ColorContext { cms: Some(cms), intent: RenderingIntent::default() }
    }
}

impl fmt::Debug for ColorContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ColorContext")
            .field("cms", &self.cms.is_some())
            .field("intent", &self.intent)
            .finish()
    }
}
