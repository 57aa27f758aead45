// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

// A Gaussian blur.
//
// Small deviations use a normalized FIR kernel, large ones a third-order
// recursive filter:
//
// Young, van Vliet, "Recursive Gaussian derivative filters", ICPR 1998.
// Triggs, Sdika, "Boundary conditions for Young-van Vliet recursive
// filtering", IEEE Trans. Signal Processing, vol. 54, 2006.
//
// Pixels outside of the surface are treated as transparent.

use crate::access::Axis;
use crate::dispatch::{dispatch, dispatch_map, use_pool};
use crate::PixelAccessMut;

/// A blur quality.
///
/// Lower qualities blur a downsampled copy of the image.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BlurQuality {
    Best,
    Better,
    #[default]
    Normal,
    Worse,
    Worst,
}

/// Returns the number of pixels affected on each side.
#[inline]
pub fn effect_radius(deviation: f64) -> i32 {
    (deviation.abs() * 3.0).ceil() as i32
}

/// Returns a base-2 logarithm of the downsampling step.
///
/// The result is in `0..=12`.
pub fn subsample_step_log2(deviation: f64, quality: BlurQuality) -> u32 {
    let factor = match quality {
        BlurQuality::Best => return 0,
        BlurQuality::Better => 3.0 / 16.0,
        BlurQuality::Normal => 3.0 / 8.0,
        BlurQuality::Worse => 3.0 / 4.0,
        BlurQuality::Worst => 3.0 / 2.0,
    };

    ((deviation * factor).log2() as i32).clamp(0, 12) as u32
}

/// Calculates a downsampled size and deviation for the specified quality.
///
/// Returns the input as is when no downsampling is needed.
pub fn downsample_for_quality(
    quality: BlurQuality,
    size: (u32, u32),
    deviation: (f64, f64),
) -> ((u32, u32), (f64, f64)) {
    let resize = |size: u32, deviation: f64| {
        let step = 1u32 << subsample_step_log2(deviation, quality);
        if step > 1 {
            ((size as f64 / step as f64).ceil() as u32 + 1, deviation / step as f64)
        } else {
            (size, deviation)
        }
    };

    let (w, dx) = resize(size.0, deviation.0);
    let (h, dy) = resize(size.1, deviation.1);
    ((w, h), (dx, dy))
}


/// A Gaussian blur kernel.
#[derive(Clone, Copy, Debug)]
pub struct GaussianBlur {
    deviation_x: f64,
    deviation_y: f64,
}

impl GaussianBlur {
    /// Creates a new blur.
    ///
    /// Deviations are in pixels. A zero deviation disables the blur along that axis.
    pub fn new(deviation_x: f64, deviation_y: f64) -> Self {
        GaussianBlur { deviation_x, deviation_y }
    }

    /// Blurs an image in place.
    ///
    /// Image pixels should have a **premultiplied alpha**.
    ///
    /// # Allocations
    ///
    /// This method will allocate a line buffer per row and a column buffer per column.
    pub fn filter(&self, surface: &mut PixelAccessMut) {
        let components = surface.channels() + 1;
        let parallel = use_pool(surface.width(), surface.height());

        if effect_radius(self.deviation_x) > 0 {
            let pass = Pass::new(self.deviation_x);
            dispatch(surface.rows(), parallel, |mut row| {
                for c in 0..components {
                    let mut line = row.line(Axis::X, 0, c);
                    let mut values = line.to_vec();
                    pass.apply(&mut values);
                    line.copy_from(&values);
                }
            });
        }

        if effect_radius(self.deviation_y) > 0 {
            let pass = Pass::new(self.deviation_y);
            let columns = {
                let src = surface.as_ref();
                dispatch_map(surface.width() as usize, parallel, |x| {
                    (0..components)
                        .map(|c| {
                            let mut values: Vec<f64> = (0..src.height() as i32)
                                .map(|y| src.color_at(x as i32, y, false).component(c))
                                .collect();
                            pass.apply(&mut values);
                            values
                        })
                        .collect::<Vec<_>>()
                })
            };

            for (x, column) in columns.iter().enumerate() {
                for (c, values) in column.iter().enumerate() {
                    surface.line(Axis::Y, x as u32, c).copy_from(values);
                }
            }
        }
    }
}


enum Pass {
    Fir(Vec<f64>),
    Iir { b: [f64; 4], m: [f64; 9] },
}

impl Pass {
    fn new(deviation: f64) -> Self {
        // The recursive filter gets unstable on small deviations.
        if deviation > 3.0 {
            let mut bf = calc_filter(deviation);
            for v in &mut bf {
                *v = -*v;
            }

            let mut b = [1.0, bf[0], bf[1], bf[2]];
            b[0] -= bf[0] + bf[1] + bf[2];
            Pass::Iir { b, m: calc_triggs_sdika_m(&bf) }
        } else {
            Pass::Fir(make_kernel(deviation))
        }
    }

    fn apply(&self, values: &mut [f64]) {
        if values.is_empty() {
            return;
        }

        match self {
            Pass::Fir(kernel) => fir(values, kernel),
            Pass::Iir { b, m } => iir(values, b, m),
        }
    }
}

fn fir(values: &mut [f64], kernel: &[f64]) {
    let src = values.to_vec();
    let len = src.len() as isize;
    let radius = kernel.len() as isize - 1;
    for (i, v) in values.iter_mut().enumerate() {
        let i = i as isize;
        let mut sum = 0.0;
        for k in -radius..=radius {
            let j = i + k;
            if j >= 0 && j < len {
                sum += src[j as usize] * kernel[k.unsigned_abs()];
            }
        }
        *v = sum;
    }
}

fn iir(values: &mut [f64], b: &[f64; 4], m: &[f64; 9]) {
    // Forward pass.
    let mut u = [0.0; 4];
    let mut forward = Vec::with_capacity(values.len());
    for v in values.iter() {
        u.copy_within(0..3, 1);
        u[0] = v * b[0] + u[1] * b[1] + u[2] * b[2] + u[3] * b[3];
        forward.push(u[0]);
    }

    // Backward pass, initialized for a zero right border.
    let mut w = [0.0; 4];
    for i in 0..3 {
        w[i] = (0..3).map(|j| u[j] * m[i * 3 + j]).sum::<f64>() * b[0];
    }

    let last = values.len() - 1;
    values[last] = w[0];
    for col in (0..last).rev() {
        w.copy_within(0..3, 1);
        w[0] = forward[col] * b[0] + w[1] * b[1] + w[2] * b[2] + w[3] * b[3];
        values[col] = w[0];
    }
}

fn make_kernel(deviation: f64) -> Vec<f64> {
    let radius = effect_radius(deviation).max(0) as usize;
    let d_sq = deviation * deviation * 2.0;
    let k: Vec<f64> = (0..=radius).map(|i| (-((i * i) as f64) / d_sq).exp()).collect();
    let sum = 2.0 * k[1..].iter().sum::<f64>() + k[0];

    // Normalize so that the full kernel sums to exactly 1.
    let mut kernel = vec![0.0; radius + 1];
    let mut ksum = 0.0;
    let mut kernel_sum = 0.0;
    for i in (1..=radius).rev() {
        ksum += k[i] / sum;
        kernel[i] = ksum - kernel_sum;
        kernel_sum += kernel[i];
    }
    kernel[0] = 1.0 - 2.0 * kernel_sum;
    kernel
}

#[derive(Clone, Copy)]
struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    fn powf(self, e: f64) -> Self {
        let r = self.re.hypot(self.im).powf(e);
        let t = self.im.atan2(self.re) * e;
        Complex { re: r * t.cos(), im: r * t.sin() }
    }

    fn norm(self) -> f64 {
        self.re * self.re + self.im * self.im
    }
}

// Real part of `d / (d - 1)^2`.
fn gain_re(d: Complex) -> f64 {
    let a = Complex { re: d.re - 1.0, im: d.im };
    let den = Complex { re: a.re * a.re - a.im * a.im, im: 2.0 * a.re * a.im };
    (d.re * den.re + d.im * den.im) / den.norm()
}

fn calc_filter(sigma: f64) -> [f64; 3] {
    let d1_org = Complex { re: 1.40098, im: 1.00236 };
    let d3_org = 1.85132;
    let sigma_sqr = sigma * sigma;

    // Binary search for the pole scale giving the requested variance.
    let mut qbeg = 1.0;
    let mut qend = 2.0 * sigma;
    loop {
        let q = (qbeg + qend) / 2.0;
        let d1 = d1_org.powf(1.0 / q);
        let d3 = f64::powf(d3_org, 1.0 / q);
        let ssqr = 2.0 * (2.0 * gain_re(d1) + d3 / ((d3 - 1.0) * (d3 - 1.0)));
        if ssqr < sigma_sqr {
            qbeg = q;
        } else {
            qend = q;
        }

        if qend - qbeg <= sigma / (1u32 << 30) as f64 {
            break;
        }
    }

    let q = (qbeg + qend) / 2.0;
    let d1 = d1_org.powf(1.0 / q);
    let d3 = f64::powf(d3_org, 1.0 / q);
    let abs_d1_sqr = d1.norm();
    let re2_d1 = 2.0 * d1.re;
    let bscale = 1.0 / (abs_d1_sqr * d3);
    [
        -bscale * (abs_d1_sqr + d3 * re2_d1),
        bscale * (d3 + re2_d1),
        -bscale,
    ]
}

fn calc_triggs_sdika_m(b: &[f64; 3]) -> [f64; 9] {
    let (a1, a2, a3) = (b[0], b[1], b[2]);
    let scale = 1.0 / ((1.0 + a1 - a2 + a3) * (1.0 - a1 - a2 - a3) * (1.0 + a2 + (a1 - a3) * a3));
    let mut m = [
        1.0 - a2 - a1 * a3 - a3 * a3,
        (a1 + a3) * (a2 + a1 * a3),
        a3 * (a1 + a2 * a3),
        a1 + a2 * a3,
        (1.0 - a2) * (a2 + a1 * a3),
        a3 * (1.0 - a2 - a1 * a3 - a3 * a3),
        a1 * (a1 + a3) + a2 * (1.0 - a2),
        a1 * (a2 - a3 * a3) + a3 * (1.0 + a2 * (a2 - 1.0) - a3 * a3),
        a3 * (a1 + a2 * a3),
    ];

    for v in &mut m {
        *v *= scale;
    }

    m
}
