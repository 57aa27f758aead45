// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`pixelfx` provides the pixel layer of the `filterfx` SVG filter effects engine.

It doesn't implement the filters workflow, just surfaces and operations on them.
Filter regions, primitive order, transformations and compositing
are implemented by the caller.

## Surfaces

A [`Surface`] is a lazily allocated pixel buffer tagged with an optional
[`ColorSpace`]. The storage depends on the color space:

- no color space: 8-bit **premultiplied** RGBA in sRGB, the legacy format
- alpha space: 8-bit alpha
- anything else: 32-bit floats, 4 per pixel per buffer, with a second buffer
  for spaces with more than 3 channels

Pixels are read and written through [`PixelAccess`] and [`PixelAccessMut`],
which hide the storage behind [`Color`] values and handle out-of-bounds
coordinates according to an [`EdgeMode`].

## Kernels

- color matrix, component transfer and arithmetic composite
- convolve matrix, displacement map and morphology
- gaussian blur, both FIR and IIR, with resampling for lower quality
- diffuse and specular lighting
- turbulence
- average color

Large surfaces are processed in parallel with `rayon`, see [`dispatch`].
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_arguments)]

use float_cmp::ApproxEqUlps;
pub use rgb::RGBA8;

mod access;
mod average_color;
mod color;
mod color_matrix;
mod component_transfer;
mod composite;
mod convert;
mod convolve_matrix;
pub mod dispatch;
mod displacement_map;
mod gaussian_blur;
mod lighting;
mod morphology;
pub mod resample;
mod space;
mod surface;
mod turbulence;

pub use access::{AccessError, Axis, EdgeMode, LineAccess, PixelAccess, PixelAccessMut};
pub use average_color::average_color;
pub use color::{Color, MAX_CHANNELS};
pub use color_matrix::{color_matrix, ColorMatrix};
pub use component_transfer::{component_transfer, TransferFunction};
pub use composite::arithmetic_composite;
pub use convert::{AlphaSpaceExtraction, ColorSpaceTransform};
pub use convolve_matrix::ConvolveMatrix;
pub use displacement_map::{displacement_map, ColorChannel};
pub use gaussian_blur::{
    downsample_for_quality, effect_radius, subsample_step_log2, BlurQuality, GaussianBlur,
};
pub use lighting::{diffuse_lighting, specular_lighting, LightSource};
pub use morphology::{Morphology, MorphologyOperator};
pub use space::{
    ColorContext, ColorManagement, ColorSpace, IccError, IccFormat, IccProfile, IccTransform,
    RenderingIntent,
};
pub use surface::{PixelFormat, Surface, SurfaceError};
pub use turbulence::{Turbulence, TurbulenceTile};


/// Clamps `val` into `min..=max`.
///
/// NaN is mapped to `min`.
#[inline]
pub fn f64_bound(min: f64, val: f64, max: f64) -> f64 {
    debug_assert!(min.is_finite());
    debug_assert!(max.is_finite());

    if val > max {
        max
    } else if val >= min {
        val
    } else {
        min
    }
}


/// Approximate equality for floats.
pub trait FuzzyEq<Rhs: ?Sized = Self> {
    /// Returns `true` if values are approximately equal.
    fn fuzzy_eq(&self, other: &Rhs) -> bool;

    /// Returns `true` if values are not approximately equal.
    #[inline]
    fn fuzzy_ne(&self, other: &Rhs) -> bool {
        !self.fuzzy_eq(other)
    }
}

/// Approximate zero check for floats.
pub trait FuzzyZero: FuzzyEq {
    /// Returns `true` if the number is approximately zero.
    fn is_fuzzy_zero(&self) -> bool;
}

impl FuzzyEq for f64 {
    #[inline]
    fn fuzzy_eq(&self, other: &f64) -> bool {
        self.approx_eq_ulps(other, 4)
    }
}

impl FuzzyZero for f64 {
    #[inline]
    fn is_fuzzy_zero(&self) -> bool {
        self.fuzzy_eq(&0.0)
    }
}
