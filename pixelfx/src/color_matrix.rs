// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{f64_bound, Color, PixelAccess, PixelAccessMut, MAX_CHANNELS};

/// A color matrix used by `color_matrix`.
///
/// Matrices are stored row by row. Each row holds a weight per input
/// channel, an alpha weight and an offset. The last row produces alpha.
#[derive(Clone, Copy, Debug)]
#[allow(missing_docs)]
pub enum ColorMatrix<'a> {
    /// A user matrix. Missing values are taken from the identity matrix.
    Matrix(&'a [f64]),
    /// Saturation in `0..=1`. Other values are clamped.
    Saturate(f64),
    /// Hue rotation in degrees.
    HueRotate(f64),
    LuminanceToAlpha,
}

impl ColorMatrix<'_> {
    /// Returns a full matrix for the specified channel counts.
    ///
    /// The result has `out_channels + 1` rows of `in_channels + 2` values.
    pub fn to_matrix(&self, in_channels: usize, out_channels: usize) -> Vec<f64> {
        let width = in_channels + 2;
        let height = out_channels + 1;
        match *self {
            ColorMatrix::Matrix(m) => pad_with_identity(m.to_vec(), width, height),
            ColorMatrix::Saturate(v) => {
                let v = f64_bound(0.0, v, 1.0);
                pad_rgb([
                    0.213 + 0.787 * v, 0.715 - 0.715 * v, 0.072 - 0.072 * v,
                    0.213 - 0.213 * v, 0.715 + 0.285 * v, 0.072 - 0.072 * v,
                    0.213 - 0.213 * v, 0.715 - 0.715 * v, 0.072 + 0.928 * v,
                ], width, height)
            }
            ColorMatrix::HueRotate(angle) => {
                let angle = angle.to_radians();
                let a1 = angle.cos();
                let a2 = angle.sin();
                pad_rgb([
                    0.213 + 0.787 * a1 - 0.213 * a2,
                    0.715 - 0.715 * a1 - 0.715 * a2,
                    0.072 - 0.072 * a1 + 0.928 * a2,
                    0.213 - 0.213 * a1 + 0.143 * a2,
                    0.715 + 0.285 * a1 + 0.140 * a2,
                    0.072 - 0.072 * a1 - 0.283 * a2,
                    0.213 - 0.213 * a1 - 0.787 * a2,
                    0.715 - 0.715 * a1 + 0.715 * a2,
                    0.072 + 0.928 * a1 + 0.072 * a2,
                ], width, height)
            }
            ColorMatrix::LuminanceToAlpha => {
                let mut m = vec![0.0; width * height];
                let row = &mut m[out_channels * width..];
                for (v, k) in row.iter_mut().zip(&[0.2125, 0.7154, 0.0721][..in_channels.min(3)]) {
                    *v = *k;
                }
                m
            }
        }
    }
}

fn pad_with_identity(mut matrix: Vec<f64>, width: usize, height: usize) -> Vec<f64> {
    matrix.truncate(width * height);
    for k in matrix.len()..width * height {
        let (i, j) = (k / width, k % width);
        matrix.push(if i == j || (i == height - 1 && j == width - 2) { 1.0 } else { 0.0 });
    }

    matrix
}

// Places a 3x3 RGB matrix into an identity one.
fn pad_rgb(rgb: [f64; 9], width: usize, height: usize) -> Vec<f64> {
    let mut m = pad_with_identity(Vec::new(), width, height);
    for i in 0..3.min(height - 1) {
        for j in 0..3.min(width - 2) {
            m[i * width + j] = rgb[i * 3 + j];
        }
    }

    m
}

/// Applies a color matrix filter.
///
/// Colors are processed **unpremultiplied** and clamped.
/// `dest` may have a different channel count, e.g. alpha only.
pub fn color_matrix(matrix: ColorMatrix, src: &PixelAccess, dest: &mut PixelAccessMut) {
    let in_channels = src.channels();
    let out_channels = dest.channels();
    let width = in_channels + 2;
    let m = matrix.to_matrix(in_channels, out_channels);

    dest.for_each_pixel(true, |x, y| {
        let c = src.color_at(x as i32, y as i32, true);
        let mut out = [0.0; MAX_CHANNELS + 1];
        for (i, v) in out[..=out_channels].iter_mut().enumerate() {
            let row = &m[i * width..(i + 1) * width];
            *v = row[width - 1];
            for (j, k) in row[..=in_channels].iter().enumerate() {
                *v += c.component(j) * k;
            }
        }

        Color::new(&out[..out_channels], out[out_channels]).clamped()
    });
}
