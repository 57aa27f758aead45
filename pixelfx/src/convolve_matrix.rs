// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, FuzzyZero, PixelAccess, PixelAccessMut, MAX_CHANNELS};

/// A convolve matrix filter.
#[derive(Clone, Debug)]
pub struct ConvolveMatrix {
    target_x: u32,
    target_y: u32,
    columns: u32,
    rows: u32,
    // Divided by the divisor and rotated by 180 degrees.
    kernel: Vec<f64>,
    bias: f64,
    preserve_alpha: bool,
}

impl ConvolveMatrix {
    /// Creates a new `ConvolveMatrix`.
    ///
    /// Returns `None` when:
    ///
    /// - `columns` or `rows` is zero
    /// - `columns` * `rows` != `kernel.len()`
    /// - `target_x` >= `columns`
    /// - `target_y` >= `rows`
    /// - `divisor` is zero or not finite
    pub fn new(
        target_x: u32,
        target_y: u32,
        columns: u32,
        rows: u32,
        kernel: &[f64],
        divisor: f64,
        bias: f64,
        preserve_alpha: bool,
    ) -> Option<Self> {
        if    columns == 0
           || rows == 0
           || (columns as usize).checked_mul(rows as usize) != Some(kernel.len())
           || target_x >= columns
           || target_y >= rows
           || divisor.is_fuzzy_zero()
           || !divisor.is_finite()
        {
            return None;
        }

        let kernel = kernel.iter().rev().map(|k| k / divisor).collect();
        Some(ConvolveMatrix {
            target_x,
            target_y,
            columns,
            rows,
            kernel,
            bias,
            preserve_alpha,
        })
    }

    /// Returns a matrix's X target.
    ///
    /// `targetX` in the SVG.
    #[inline]
    pub fn target_x(&self) -> u32 {
        self.target_x
    }

    /// Returns a matrix's Y target.
    ///
    /// `targetY` in the SVG.
    #[inline]
    pub fn target_y(&self) -> u32 {
        self.target_y
    }

    /// Returns a number of columns in the matrix.
    #[inline]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Returns a number of rows in the matrix.
    #[inline]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Applies the filter.
    ///
    /// Colors are convolved **unpremultiplied** and clamped.
    /// Pixels outside of `src` are resolved by its edge mode.
    pub fn filter(&self, src: &PixelAccess, dst: &mut PixelAccessMut) {
        let channels = dst.channels();
        let convolved = if self.preserve_alpha { channels } else { channels + 1 };
        let (tx, ty) = (self.target_x as i32, self.target_y as i32);

        dst.for_each_pixel(true, |x, y| {
            let (x, y) = (x as i32, y as i32);
            let mut out = [self.bias; MAX_CHANNELS + 1];
            for j in 0..self.rows as i32 {
                for i in 0..self.columns as i32 {
                    let k = self.kernel[(j * self.columns as i32 + i) as usize];
                    let c = src.color_at(x + i - tx, y + j - ty, true).resized(channels);
                    for (n, v) in out[..convolved].iter_mut().enumerate() {
                        *v += c.component(n) * k;
                    }
                }
            }

            let mut color = Color::new(&out[..channels], 0.0);
            color.set_alpha(if self.preserve_alpha {
                src.color_at(x, y, false).alpha()
            } else {
                out[channels]
            });
            color.clamped()
        });
    }
}
