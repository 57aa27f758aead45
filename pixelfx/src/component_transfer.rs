// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{f64_bound, PixelAccess, PixelAccessMut};

/// A transfer function used by `component_transfer`.
///
/// <https://www.w3.org/TR/SVG11/filters.html#transferFuncElements>
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub enum TransferFunction<'a> {
    /// Keeps component as is.
    Identity,

    /// Applies a linear interpolation to a component.
    ///
    /// The number list can be empty.
    Table(&'a [f64]),

    /// Applies a step function to a component.
    ///
    /// The number list can be empty.
    Discrete(&'a [f64]),

    /// Applies a linear shift to a component.
    Linear {
        slope: f64,
        intercept: f64,
    },

    /// Applies an exponential shift to a component.
    Gamma {
        amplitude: f64,
        exponent: f64,
        offset: f64,
    },
}

impl<'a> TransferFunction<'a> {
    /// Checks that the function doesn't change anything.
    pub fn is_dummy(&self) -> bool {
        match self {
            TransferFunction::Identity => true,
            TransferFunction::Table(values) => values.is_empty(),
            TransferFunction::Discrete(values) => values.is_empty(),
            TransferFunction::Linear { .. } => false,
            TransferFunction::Gamma { .. } => false,
        }
    }

    /// Applies the function to a component in `0..=1`.
    ///
    /// The result is clamped to `0..=1`.
    pub fn apply(&self, c: f64) -> f64 {
        let c = match self {
            TransferFunction::Identity => {
                c
            }
            TransferFunction::Table(values) if values.is_empty() => {
                c
            }
            TransferFunction::Table(values) => {
                let n = values.len() - 1;
                let k = ((c * (n as f64)).floor().max(0.0) as usize).min(n);
                if k == n {
                    values[k]
                } else {
                    let vk = values[k];
                    let vk1 = values[k + 1];
                    let k = k as f64;
                    let n = n as f64;
                    vk + (c - k / n) * n * (vk1 - vk)
                }
            }
            TransferFunction::Discrete(values) if values.is_empty() => {
                c
            }
            TransferFunction::Discrete(values) => {
                let n = values.len();
                let k = (c * (n as f64)).floor().max(0.0) as usize;
                values[k.min(n - 1)]
            }
            TransferFunction::Linear { slope, intercept } => {
                slope * c + intercept
            }
            TransferFunction::Gamma { amplitude, exponent, offset } => {
                amplitude * c.powf(*exponent) + offset
            }
        };

        f64_bound(0.0, c, 1.0)
    }
}

/// Applies component transfer functions.
///
/// `channels` are applied to color channels in order; missing ones keep
/// the channel as is. `alpha` is applied to the alpha.
///
/// Colors are processed **unpremultiplied**.
pub fn component_transfer(
    channels: &[TransferFunction],
    alpha: TransferFunction,
    src: &PixelAccess,
    dest: &mut PixelAccessMut,
) {
    dest.for_each_pixel(true, |x, y| {
        let mut c = src.color_at(x as i32, y as i32, true);
        for (v, func) in c.channels_mut().iter_mut().zip(channels) {
            if !func.is_dummy() {
                *v = func.apply(*v);
            }
        }

        if !alpha.is_dummy() {
            c.set_alpha(alpha.apply(c.alpha()));
        }

        c
    });
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, ColorSpace, EdgeMode, Surface};

    #[test]
    fn linear() {
        let f = TransferFunction::Linear { slope: 0.5, intercept: 0.25 };
        assert_eq!(f.apply(1.0), 0.75);
        assert_eq!(f.apply(0.0), 0.25);
    }

    #[test]
    fn table() {
        let values = [0.0, 1.0, 0.0];
        let f = TransferFunction::Table(&values);
        assert_eq!(f.apply(0.25), 0.5);
        assert_eq!(f.apply(0.5), 1.0);
        assert_eq!(f.apply(1.0), 0.0);
    }

    #[test]
    fn discrete() {
        let values = [0.2, 0.4, 0.6, 0.8];
        let f = TransferFunction::Discrete(&values);
        assert_eq!(f.apply(0.0), 0.2);
        assert_eq!(f.apply(0.3), 0.4);
        assert_eq!(f.apply(1.0), 0.8);
    }

    #[test]
    fn gamma_is_clamped() {
        let f = TransferFunction::Gamma { amplitude: 2.0, exponent: 1.0, offset: 0.5 };
        assert_eq!(f.apply(0.5), 1.0);
    }

    #[test]
    fn applies_to_surface() {
        let mut src = Surface::new(1, 1, 1, Some(ColorSpace::LinearRgb));
        src.access_mut(EdgeMode::Error).color_to(0, 0, Color::rgba(1.0, 0.0, 0.5, 0.5), true);
        let mut dst = src.similar();
        let linear = TransferFunction::Linear { slope: 0.5, intercept: 0.25 };
        component_transfer(
            &[linear, linear],
            TransferFunction::Identity,
            &src.access(EdgeMode::Error),
            &mut dst.access_mut(EdgeMode::Error),
        );
        let c = dst.access(EdgeMode::Error).color_at(0, 0, true);
        assert!((c.channels()[0] - 0.75).abs() < 1e-6);
        assert!((c.channels()[1] - 0.25).abs() < 1e-6);
        assert!((c.channels()[2] - 0.5).abs() < 1e-6);
        assert!((c.alpha() - 0.5).abs() < 1e-6);
    }
}
