// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::VecDeque;

use crate::dispatch::{dispatch_map, use_pool};
use crate::{Color, EdgeMode, PixelAccess, PixelAccessMut, MAX_CHANNELS};

/// A morphology operation.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MorphologyOperator {
    Erode,
    Dilate,
}

/// A morphology filter.
///
/// Computes a componentwise minimum (erode) or maximum (dilate) over a
/// `(2 * rx + 1) x (2 * ry + 1)` window. The window is separable, so the
/// filter runs as a row pass followed by a column pass, each using a
/// running extreme over a monotonic queue:
///
/// Dokládal, Dokládalová, "Computationally efficient, one-pass algorithm
/// for morphological filters", 2011.
///
/// Pixels outside of the image are transparent black.
#[derive(Clone, Copy, Debug)]
pub struct Morphology {
    operator: MorphologyOperator,
    radius_x: u32,
    radius_y: u32,
}

impl Morphology {
    /// Creates a new filter.
    ///
    /// Fractional radii are rounded.
    ///
    /// # Panics
    ///
    /// When `rx` or `ry` is negative.
    pub fn new(operator: MorphologyOperator, rx: f64, ry: f64) -> Self {
        assert!(!rx.is_sign_negative());
        assert!(!ry.is_sign_negative());

        Morphology {
            operator,
            radius_x: rx.round() as u32,
            radius_y: ry.round() as u32,
        }
    }

    /// Applies the filter.
    ///
    /// `src` pixels should have a **premultiplied alpha**.
    /// Both images must have the same size and channel count.
    ///
    /// # Allocations
    ///
    /// This method will allocate an intermediate copy of the image.
    pub fn filter(&self, src: &PixelAccess, dst: &mut PixelAccessMut) {
        let (w, h) = (dst.width() as usize, dst.height() as usize);
        let components = dst.channels() + 1;
        let parallel = use_pool(dst.width(), dst.height());
        let src = src.with_edge(EdgeMode::Zero);

        // Row pass: rows[y][c][x].
        let rows = dispatch_map(h, parallel, |y| {
            (0..components)
                .map(|c| {
                    let line: Vec<f64> = (0..w)
                        .map(|x| src.color_at(x as i32, y as i32, false).component(c))
                        .collect();
                    extreme_line(&line, self.radius_x as usize, self.operator)
                })
                .collect::<Vec<_>>()
        });

        // Column pass: columns[x][c][y].
        let columns = dispatch_map(w, parallel, |x| {
            (0..components)
                .map(|c| {
                    let line: Vec<f64> = rows.iter().map(|row| row[c][x]).collect();
                    extreme_line(&line, self.radius_y as usize, self.operator)
                })
                .collect::<Vec<_>>()
        });

        let channels = components - 1;
        dst.for_each_pixel(false, |x, y| {
            let column = &columns[x as usize];
            let mut values = [0.0; MAX_CHANNELS];
            for (v, line) in values.iter_mut().zip(&column[..channels]) {
                *v = line[y as usize];
            }
            Color::new(&values[..channels], column[channels][y as usize])
        });
    }
}

fn extreme_line(values: &[f64], radius: usize, operator: MorphologyOperator) -> Vec<f64> {
    let better = |a: f64, b: f64| match operator {
        MorphologyOperator::Erode => a < b,
        MorphologyOperator::Dilate => a > b,
    };

    let len = values.len() as isize;
    let r = radius as isize;
    let window = 2 * r + 1;
    let mut queue: VecDeque<(isize, f64)> = VecDeque::new();
    let mut out = Vec::with_capacity(values.len());

    // Transparent black on both sides of the line.
    for k in -r..len + r {
        let v = if k >= 0 && k < len { values[k as usize] } else { 0.0 };
        while queue.front().map_or(false, |f| f.0 + window <= k) {
            queue.pop_front();
        }

        while queue.back().map_or(false, |b| !better(b.1, v)) {
            queue.pop_back();
        }
        queue.push_back((k, v));

        if k >= r {
            out.push(queue.front().map_or(0.0, |f| f.1));
        }
    }

    out
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColorSpace, Surface};

    fn square() -> Surface {
        let mut s = Surface::new(21, 21, 1, None);
        {
            let mut a = s.access_mut(EdgeMode::Error);
            for y in 3..18 {
                for x in 3..18 {
                    a.color_to(x, y, Color::rgba(0.5, 0.0, 0.0, 1.0), false);
                }
            }
        }
        s
    }

    fn run(op: MorphologyOperator, r: f64, src: &Surface) -> Surface {
        let mut dst = src.similar();
        Morphology::new(op, r, r).filter(&src.access(EdgeMode::Zero), &mut dst.access_mut(EdgeMode::NoCheck));
        dst
    }

    #[test]
    fn dilate_then_erode() {
        let src = square();
        let dilated = run(MorphologyOperator::Dilate, 3.0, &src);
        let a = dilated.access(EdgeMode::Error);
        for y in 0..21 {
            for x in 0..21 {
                assert_eq!(a.alpha_at(x, y), 1.0, "({}, {})", x, y);
            }
        }

        let eroded = run(MorphologyOperator::Erode, 3.0, &dilated);
        let a = eroded.access(EdgeMode::Error);
        for y in 0..21 {
            for x in 0..21 {
                let inside = (3..18).contains(&x) && (3..18).contains(&y);
                assert_eq!(a.alpha_at(x, y), if inside { 1.0 } else { 0.0 }, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn erode_shrinks() {
        let src = square();
        let eroded = run(MorphologyOperator::Erode, 3.0, &src);
        let a = eroded.access(EdgeMode::Error);
        for y in 0..21 {
            for x in 0..21 {
                let inside = (6..15).contains(&x) && (6..15).contains(&y);
                assert_eq!(a.alpha_at(x, y) > 0.0, inside, "({}, {})", x, y);
            }
        }
    }

    #[test]
    fn erode_then_dilate_keeps_interior() {
        let mut src = Surface::new(16, 16, 1, Some(ColorSpace::LinearRgb));
        {
            let mut a = src.access_mut(EdgeMode::Error);
            for y in 4..12 {
                for x in 4..12 {
                    a.color_to(x, y, Color::rgba(1.0, 1.0, 1.0, 1.0), false);
                }
            }
        }
        let opened = run(MorphologyOperator::Dilate, 2.0, &run(MorphologyOperator::Erode, 2.0, &src));
        let a = opened.access(EdgeMode::Error);
        for y in 6..10 {
            for x in 6..10 {
                assert_eq!(a.alpha_at(x, y), 1.0);
            }
        }
    }

    #[test]
    fn line_extremes() {
        let v = [0.2, 0.9, 0.1, 0.5];
        assert_eq!(extreme_line(&v, 1, MorphologyOperator::Dilate), vec![0.9, 0.9, 0.9, 0.5]);
        assert_eq!(extreme_line(&v, 0, MorphologyOperator::Erode), v.to_vec());
        assert_eq!(extreme_line(&v, 1, MorphologyOperator::Erode), vec![0.0, 0.1, 0.1, 0.0]);
    }
}
