// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{f64_bound, Color, FuzzyZero, PixelAccessMut, MAX_CHANNELS};

const RAND_M: i64 = 2147483647; // 2**31 - 1
const RAND_A: i64 = 16807; // 7**5; primitive root of m
const RAND_Q: i64 = 127773; // m / a
const RAND_R: i64 = 2836; // m % a
const B_SIZE: usize = 0x100;
const B_SIZE_64: i64 = 0x100;
const B_LEN: usize = B_SIZE + B_SIZE + 2;
const BM: i32 = 0xff;
const PERLIN_N: i32 = 0x1000;

/// A stitching tile, in the noise coordinate system.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TurbulenceTile {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for TurbulenceTile {
    fn default() -> Self {
        TurbulenceTile { x: 1.0, y: 1.0, width: 10.0, height: 10.0 }
    }
}

/// Perlin turbulence and fractal noise generator.
///
/// Pixel `(x, y)` of the destination is evaluated at `(x, y) + origin`
/// mapped through `transform`, so the noise stays the same however the
/// surface is placed.
#[derive(Clone, Debug)]
pub struct Turbulence {
    base_frequency: (f64, f64),
    num_octaves: u32,
    fractal_noise: bool,
    stitch: Option<StitchInfo>,
    tile: TurbulenceTile,
    transform: [f64; 6],
    origin: (i32, i32),
    lattice_selector: Vec<usize>,
    gradient: Vec<Vec<[f64; 2]>>,
}

#[derive(Clone, Copy, Debug)]
struct StitchInfo {
    width: i32, // How much to subtract to wrap for stitching.
    height: i32,
    wrap_x: i32, // Minimum value to wrap.
    wrap_y: i32,
}

impl Turbulence {
    /// Creates a new generator.
    ///
    /// Negative base frequencies are treated as zero.
    pub fn new(
        seed: i32,
        tile: TurbulenceTile,
        base_frequency_x: f64,
        base_frequency_y: f64,
        stitch_tiles: bool,
        fractal_noise: bool,
        num_octaves: u32,
    ) -> Self {
        let (lattice_selector, gradient) = init(seed);
        let mut base_frequency = (base_frequency_x.max(0.0), base_frequency_y.max(0.0));

        let stitch = if stitch_tiles {
            // Tile borders are continuous only for integer frequencies per tile.
            base_frequency.0 = adjust_frequency(base_frequency.0, tile.width);
            base_frequency.1 = adjust_frequency(base_frequency.1, tile.height);

            let width = (tile.width * base_frequency.0 + 0.5) as i32;
            let height = (tile.height * base_frequency.1 + 0.5) as i32;
            Some(StitchInfo {
                width,
                height,
                wrap_x: (tile.x * base_frequency.0 + PERLIN_N as f64 + width as f64) as i32,
                wrap_y: (tile.y * base_frequency.1 + PERLIN_N as f64 + height as f64) as i32,
            })
        } else {
            None
        };

        Turbulence {
            base_frequency,
            num_octaves,
            fractal_noise,
            stitch,
            tile,
            transform: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            origin: (0, 0),
            lattice_selector,
            gradient,
        }
    }

    /// Sets the pixel-to-noise transform as `[a, b, c, d, e, f]`.
    pub fn set_transform(&mut self, ts: [f64; 6]) {
        self.transform = ts;
    }

    /// Sets the pixel origin of the destination surface.
    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    /// Returns the stitching tile.
    pub fn tile(&self) -> TurbulenceTile {
        self.tile
    }

    /// Fills `dest` with noise.
    ///
    /// Channels are generated **unpremultiplied** and premultiplied on write.
    pub fn filter(&self, dest: &mut PixelAccessMut) {
        let channels = dest.channels();
        dest.for_each_pixel(true, |x, y| {
            let px = (x as i32 + self.origin.0) as f64;
            let py = (y as i32 + self.origin.1) as f64;
            let [a, b, c, d, e, f] = self.transform;
            let (nx, ny) = (a * px + c * py + e, b * px + d * py + f);

            let mut out = [0.0; MAX_CHANNELS + 1];
            for (i, v) in out[..=channels].iter_mut().enumerate() {
                // Alpha always uses the last table, extra channels reuse the color ones.
                let table = if i == channels { 3 } else { i % 3 };
                let n = self.turbulence(table, nx, ny);
                let n = if self.fractal_noise { (n + 1.0) / 2.0 } else { n };
                *v = f64_bound(0.0, n, 1.0);
            }

            Color::new(&out[..channels], out[channels])
        });
    }

    fn turbulence(&self, channel: usize, x: f64, y: f64) -> f64 {
        let mut stitch = self.stitch;
        let mut sum = 0.0;
        let mut x = x * self.base_frequency.0;
        let mut y = y * self.base_frequency.1;
        let mut ratio = 1.0;
        for _ in 0..self.num_octaves {
            let n = self.noise2(channel, x, y, stitch);
            sum += if self.fractal_noise { n } else { n.abs() } / ratio;
            x *= 2.0;
            y *= 2.0;
            ratio *= 2.0;

            if let Some(ref mut stitch) = stitch {
                // Subtracting PERLIN_N before the multiplication and adding it
                // afterward simplifies to subtracting it once.
                stitch.width *= 2;
                stitch.wrap_x = 2 * stitch.wrap_x - PERLIN_N;
                stitch.height *= 2;
                stitch.wrap_y = 2 * stitch.wrap_y - PERLIN_N;
            }
        }

        sum
    }

    fn noise2(&self, channel: usize, x: f64, y: f64, stitch: Option<StitchInfo>) -> f64 {
        let t = x + PERLIN_N as f64;
        let mut bx0 = t as i32;
        let mut bx1 = bx0 + 1;
        let rx0 = t.fract();
        let rx1 = rx0 - 1.0;
        let t = y + PERLIN_N as f64;
        let mut by0 = t as i32;
        let mut by1 = by0 + 1;
        let ry0 = t.fract();
        let ry1 = ry0 - 1.0;

        if let Some(info) = stitch {
            if bx0 >= info.wrap_x {
                bx0 -= info.width;
            }

            if bx1 >= info.wrap_x {
                bx1 -= info.width;
            }

            if by0 >= info.wrap_y {
                by0 -= info.height;
            }

            if by1 >= info.wrap_y {
                by1 -= info.height;
            }
        }

        let lattice = &self.lattice_selector;
        let i = lattice[(bx0 & BM) as usize];
        let j = lattice[(bx1 & BM) as usize];
        let b00 = lattice[i + (by0 & BM) as usize];
        let b10 = lattice[j + (by0 & BM) as usize];
        let b01 = lattice[i + (by1 & BM) as usize];
        let b11 = lattice[j + (by1 & BM) as usize];

        let gradient = &self.gradient[channel];
        let dot = |q: [f64; 2], rx: f64, ry: f64| rx * q[0] + ry * q[1];
        let sx = s_curve(rx0);
        let sy = s_curve(ry0);
        let a = lerp(sx, dot(gradient[b00], rx0, ry0), dot(gradient[b10], rx1, ry0));
        let b = lerp(sx, dot(gradient[b01], rx0, ry1), dot(gradient[b11], rx1, ry1));
        lerp(sy, a, b)
    }
}

fn adjust_frequency(freq: f64, size: f64) -> f64 {
    if freq.is_fuzzy_zero() {
        return freq;
    }

    let lo = (size * freq).floor() / size;
    let hi = (size * freq).ceil() / size;
    if lo > 0.0 && freq / lo < hi / freq {
        lo
    } else {
        hi
    }
}

fn init(seed: i32) -> (Vec<usize>, Vec<Vec<[f64; 2]>>) {
    let mut seed = seed as i64;
    if seed <= 0 {
        seed = -(seed % (RAND_M - 1)) + 1;
    }

    if seed > RAND_M - 1 {
        seed = RAND_M - 1;
    }

    let mut lattice_selector = vec![0; B_LEN];
    let mut gradient = vec![vec![[0.0; 2]; B_LEN]; 4];
    for table in gradient.iter_mut() {
        for (i, g) in table.iter_mut().take(B_SIZE).enumerate() {
            lattice_selector[i] = i;
            loop {
                for v in g.iter_mut() {
                    seed = random(seed);
                    *v = ((seed % (B_SIZE_64 * 2)) - B_SIZE_64) as f64 / B_SIZE_64 as f64;
                }

                if g[0] != 0.0 || g[1] != 0.0 {
                    break;
                }
            }

            let s = g[0].hypot(g[1]);
            g[0] /= s;
            g[1] /= s;
        }
    }

    for i in (1..B_SIZE).rev() {
        seed = random(seed);
        let j = (seed % B_SIZE_64) as usize;
        lattice_selector.swap(i, j);
    }

    for i in 0..B_SIZE + 2 {
        lattice_selector[B_SIZE + i] = lattice_selector[i];
        for table in gradient.iter_mut() {
            table[B_SIZE + i] = table[i];
        }
    }

    (lattice_selector, gradient)
}

fn random(seed: i64) -> i64 {
    let mut result = RAND_A * (seed % RAND_Q) - RAND_R * (seed / RAND_Q);
    if result <= 0 {
        result += RAND_M;
    }

    result
}

#[inline]
fn s_curve(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}
