// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use rgb::RGBA8;

use crate::dispatch::{dispatch, use_pool};
use crate::{f64_bound, Color};

/// How an accessor treats coordinates outside the surface.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EdgeMode {
    /// No checks. The caller guarantees coordinates are in range.
    NoCheck,
    /// Out-of-range access is an error.
    Error,
    /// Coordinates are clamped to the nearest edge.
    Extend,
    /// Coordinates wrap around.
    Wrap,
    /// Reads outside are transparent, writes outside are dropped.
    Zero,
}

/// An out-of-range access in [`EdgeMode::Error`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, thiserror::Error)]
pub enum AccessError {
    /// A coordinate is outside the surface.
    #[error("pixel ({x}, {y}) is outside of a {width}x{height} surface")]
    OutOfBounds {
        /// The requested column.
        x: i32,
        /// The requested row.
        y: i32,
        /// The surface width.
        width: u32,
        /// The surface height.
        height: u32,
    },
}

/// A line direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    /// A row.
    X,
    /// A column.
    Y,
}


#[derive(Clone, Copy)]
pub(crate) enum Data<'a> {
    Empty,
    A8(&'a [u8]),
    Rgba8(&'a [RGBA8]),
    Float(&'a [f32], Option<&'a [f32]>),
}

pub(crate) enum DataMut<'a> {
    A8(&'a mut [u8]),
    Rgba8(&'a mut [RGBA8]),
    Float(&'a mut [f32], Option<&'a mut [f32]>),
}

impl DataMut<'_> {
    fn as_data(&self) -> Data<'_> {
        match self {
            DataMut::A8(d) => Data::A8(d),
            DataMut::Rgba8(d) => Data::Rgba8(d),
            DataMut::Float(p, s) => Data::Float(p, s.as_deref()),
        }
    }
}

#[inline]
fn to_u8(v: f64) -> u8 {
    (f64_bound(0.0, v, 1.0) * 255.0 + 0.5) as u8
}

fn resolve(edge: EdgeMode, x: i32, y: i32, width: u32, height: u32) -> Result<Option<usize>, AccessError> {
    let w = width as i64;
    let h = height as i64;
    let (x, y) = (x as i64, y as i64);
    let inside = x >= 0 && y >= 0 && x < w && y < h;
    let (x, y) = match edge {
        EdgeMode::NoCheck => {
            // Negative coordinates land far past the end and fail the slice check.
            let idx = (y as usize).saturating_mul(width as usize).saturating_add(x as usize);
            return Ok(Some(idx));
        }
        _ if inside => (x, y),
        EdgeMode::Error => {
            return Err(AccessError::OutOfBounds { x: x as i32, y: y as i32, width, height });
        }
        _ if w == 0 || h == 0 => return Ok(None),
        EdgeMode::Extend => (x.clamp(0, w - 1), y.clamp(0, h - 1)),
        EdgeMode::Wrap => (x.rem_euclid(w), y.rem_euclid(h)),
        EdgeMode::Zero => return Ok(None),
    };

    Ok(Some((y * w + x) as usize))
}

fn read(data: Data, channels: usize, idx: usize) -> Color {
    match data {
        Data::Empty => Color::transparent(channels),
        Data::A8(d) => Color::new(&[], d[idx] as f64 / 255.0),
        Data::Rgba8(d) => {
            let p = d[idx];
            Color::rgba(
                p.r as f64 / 255.0,
                p.g as f64 / 255.0,
                p.b as f64 / 255.0,
                p.a as f64 / 255.0,
            )
        }
        Data::Float(primary, secondary) => {
            let p = &primary[idx * 4..idx * 4 + 4];
            let mut values = [0.0; 6];
            for (v, s) in values.iter_mut().zip(&p[..3]) {
                *v = *s as f64;
            }

            if let Some(secondary) = secondary {
                let s = &secondary[idx * 4..idx * 4 + 3];
                for (v, s) in values[3..].iter_mut().zip(s) {
                    *v = *s as f64;
                }
            }

            Color::new(&values[..channels], p[3] as f64)
        }
    }
}

fn write(data: &mut DataMut, channels: usize, idx: usize, color: Color) {
    let color = color.resized(channels);
    match data {
        DataMut::A8(d) => d[idx] = to_u8(color.alpha()),
        DataMut::Rgba8(d) => {
            let c = color.channels();
            d[idx] = RGBA8::new(to_u8(c[0]), to_u8(c[1]), to_u8(c[2]), to_u8(color.alpha()));
        }
        DataMut::Float(primary, secondary) => {
            let c = color.channels();
            let a = color.alpha() as f32;
            let p = &mut primary[idx * 4..idx * 4 + 4];
            for (i, v) in p[..3].iter_mut().enumerate() {
                *v = c.get(i).copied().unwrap_or(0.0) as f32;
            }
            p[3] = a;

            if let Some(secondary) = secondary {
                let s = &mut secondary[idx * 4..idx * 4 + 4];
                for (i, v) in s[..3].iter_mut().enumerate() {
                    *v = c.get(i + 3).copied().unwrap_or(0.0) as f32;
                }
                s[3] = a;
            }
        }
    }
}


/// A read-only pixel view over a surface.
///
/// Stored colors are **premultiplied**.
/// Reads may unmultiply on the fly.
#[derive(Clone, Copy)]
pub struct PixelAccess<'a> {
    data: Data<'a>,
    width: u32,
    height: u32,
    channels: usize,
    edge: EdgeMode,
}

impl<'a> PixelAccess<'a> {
    pub(crate) fn new(data: Data<'a>, width: u32, height: u32, channels: usize, edge: EdgeMode) -> Self {
        PixelAccess { data, width, height, channels, edge }
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of color channels, excluding alpha.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the edge mode.
    #[inline]
    pub fn edge(&self) -> EdgeMode {
        self.edge
    }

    /// Returns the same view with a different edge mode.
    #[inline]
    pub fn with_edge(mut self, edge: EdgeMode) -> Self {
        self.edge = edge;
        self
    }

    /// Returns a color at the specified position.
    ///
    /// When `unmultiply` is set, channels are divided by alpha.
    pub fn try_color_at(&self, x: i32, y: i32, unmultiply: bool) -> Result<Color, AccessError> {
        let color = match resolve(self.edge, x, y, self.width, self.height)? {
            Some(idx) => read(self.data, self.channels, idx),
            None => Color::transparent(self.channels),
        };

        Ok(if unmultiply { color.unpremultiplied() } else { color })
    }

    /// Returns a color at the specified position.
    ///
    /// # Panics
    ///
    /// When the position is out of range in [`EdgeMode::Error`] or [`EdgeMode::NoCheck`] mode.
    pub fn color_at(&self, x: i32, y: i32, unmultiply: bool) -> Color {
        match self.try_color_at(x, y, unmultiply) {
            Ok(c) => c,
            Err(e) => panic!("{}", e),
        }
    }

    /// Returns an alpha at the specified position.
    ///
    /// # Panics
    ///
    /// Same as [`color_at`](Self::color_at).
    #[inline]
    pub fn alpha_at(&self, x: i32, y: i32) -> f64 {
        self.color_at(x, y, false).alpha()
    }

    /// Samples a color at a fractional position using bilinear interpolation.
    ///
    /// Pixel centers are at integer coordinates.
    /// Only meaningful for linear data.
    ///
    /// # Panics
    ///
    /// Same as [`color_at`](Self::color_at).
    pub fn sample(&self, x: f64, y: f64, unmultiply: bool) -> Color {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i32, y0 as i32);

        let mut values = [0.0; 6];
        let mut alpha = 0.0;
        let taps = [
            (x0, y0, (1.0 - fx) * (1.0 - fy)),
            (x0 + 1, y0, fx * (1.0 - fy)),
            (x0, y0 + 1, (1.0 - fx) * fy),
            (x0 + 1, y0 + 1, fx * fy),
        ];
        for &(tx, ty, weight) in &taps {
            if weight == 0.0 {
                continue;
            }

            let c = self.color_at(tx, ty, false);
            for (v, c) in values.iter_mut().zip(c.channels()) {
                *v += c * weight;
            }
            alpha += c.alpha() * weight;
        }

        let color = Color::new(&values[..self.channels], alpha);
        if unmultiply { color.unpremultiplied() } else { color }
    }
}


/// A mutable pixel view over a surface.
///
/// Stored colors are **premultiplied**.
pub struct PixelAccessMut<'a> {
    data: DataMut<'a>,
    width: u32,
    height: u32,
    channels: usize,
    edge: EdgeMode,
}

impl<'a> PixelAccessMut<'a> {
    pub(crate) fn new(data: DataMut<'a>, width: u32, height: u32, channels: usize, edge: EdgeMode) -> Self {
        PixelAccessMut { data, width, height, channels, edge }
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of color channels, excluding alpha.
    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns the edge mode.
    #[inline]
    pub fn edge(&self) -> EdgeMode {
        self.edge
    }

    /// Returns a read-only view over the same pixels.
    pub fn as_ref(&self) -> PixelAccess<'_> {
        PixelAccess::new(self.data.as_data(), self.width, self.height, self.channels, self.edge)
    }

    /// Returns a color at the specified position.
    ///
    /// # Panics
    ///
    /// Same as [`PixelAccess::color_at`].
    #[inline]
    pub fn color_at(&self, x: i32, y: i32, unmultiply: bool) -> Color {
        self.as_ref().color_at(x, y, unmultiply)
    }

    /// Writes a color at the specified position.
    ///
    /// When `multiply` is set, channels are multiplied by alpha first.
    /// Values are clamped when stored in 8 bits.
    pub fn try_color_to(&mut self, x: i32, y: i32, color: Color, multiply: bool) -> Result<(), AccessError> {
        if let Some(idx) = resolve(self.edge, x, y, self.width, self.height)? {
            let color = if multiply { color.premultiplied() } else { color };
            write(&mut self.data, self.channels, idx, color);
        }

        Ok(())
    }

    /// Writes a color at the specified position.
    ///
    /// # Panics
    ///
    /// When the position is out of range in [`EdgeMode::Error`] or [`EdgeMode::NoCheck`] mode.
    pub fn color_to(&mut self, x: i32, y: i32, color: Color, multiply: bool) {
        if let Err(e) = self.try_color_to(x, y, color, multiply) {
            panic!("{}", e);
        }
    }

    /// Splits the view into single-row views.
    ///
    /// Rows are disjoint and can be processed on different threads.
    pub fn rows(&mut self) -> Vec<PixelAccessMut<'_>> {
        let w = self.width as usize;
        if w == 0 || self.height == 0 {
            return Vec::new();
        }

        let (width, channels, edge) = (self.width, self.channels, self.edge);
        let rows: Vec<DataMut> = match &mut self.data {
            DataMut::A8(d) => d.chunks_mut(w).map(DataMut::A8).collect(),
            DataMut::Rgba8(d) => d.chunks_mut(w).map(DataMut::Rgba8).collect(),
            DataMut::Float(p, None) => {
                p.chunks_mut(w * 4).map(|p| DataMut::Float(p, None)).collect()
            }
            DataMut::Float(p, Some(s)) => {
                p.chunks_mut(w * 4)
                    .zip(s.chunks_mut(w * 4))
                    .map(|(p, s)| DataMut::Float(p, Some(s)))
                    .collect()
            }
        };

        rows.into_iter()
            .map(|data| PixelAccessMut { data, width, height: 1, channels, edge })
            .collect()
    }

    /// Writes every pixel with the result of `f(x, y)`.
    ///
    /// Rows are dispatched to the pool when the surface is large enough.
    pub fn for_each_pixel<F>(&mut self, multiply: bool, f: F)
    where
        F: Fn(u32, u32) -> Color + Sync + Send,
    {
        let parallel = use_pool(self.width, self.height);
        let width = self.width;
        let channels = self.channels;
        let rows: Vec<_> = self.rows().into_iter().enumerate().collect();
        dispatch(rows, parallel, |(y, mut row)| {
            for x in 0..width {
                let c = f(x, y as u32);
                let c = if multiply { c.premultiplied() } else { c };
                write(&mut row.data, channels, x as usize, c);
            }
        });
    }

    /// Replaces every pixel with `f(x, y, current)`.
    ///
    /// Colors are passed and returned as stored, without unmultiplying.
    pub fn update_each_pixel<F>(&mut self, f: F)
    where
        F: Fn(u32, u32, Color) -> Color + Sync + Send,
    {
        let parallel = use_pool(self.width, self.height);
        let width = self.width;
        let channels = self.channels;
        let rows: Vec<_> = self.rows().into_iter().enumerate().collect();
        dispatch(rows, parallel, |(y, mut row)| {
            for x in 0..width {
                let c = f(x, y as u32, read(row.data.as_data(), channels, x as usize));
                write(&mut row.data, channels, x as usize, c);
            }
        });
    }

    /// Returns one component of one row or column.
    ///
    /// `component == channels()` addresses the alpha.
    ///
    /// # Panics
    ///
    /// When `index` or `component` is out of range.
    pub fn line(&mut self, axis: Axis, index: u32, component: usize) -> LineAccess<'_> {
        assert!(component <= self.channels);
        let w = self.width as usize;
        let (start, step, len) = match axis {
            Axis::X => {
                assert!(index < self.height);
                (index as usize * w, 1, w)
            }
            Axis::Y => {
                assert!(index < self.width);
                (index as usize, w, self.height as usize)
            }
        };

        let is_alpha = component == self.channels;
        let (values, target) = match (&mut self.data, is_alpha) {
            (DataMut::Float(p, None), _) => {
                let slot = if is_alpha { 3 } else { component };
                return LineAccess::direct(p, start * 4 + slot, step * 4, len);
            }
            (DataMut::Float(p, Some(s)), false) => {
                return if component < 3 {
                    LineAccess::direct(p, start * 4 + component, step * 4, len)
                } else {
                    LineAccess::direct(s, start * 4 + component - 3, step * 4, len)
                };
            }
            (DataMut::Float(p, Some(s)), true) => {
                let values = (0..len).map(|i| p[(start + i * step) * 4 + 3]).collect();
                (values, Target::FloatAlpha(p, s))
            }
            (DataMut::A8(d), _) => {
                let values = (0..len).map(|i| d[start + i * step] as f32 / 255.0).collect();
                (values, Target::A8(d))
            }
            (DataMut::Rgba8(d), _) => {
                let values = (0..len)
                    .map(|i| {
                        let p = d[start + i * step];
                        let v = match component {
                            0 => p.r,
                            1 => p.g,
                            2 => p.b,
                            _ => p.a,
                        };
                        v as f32 / 255.0
                    })
                    .collect();
                (values, Target::Rgba8(d, component))
            }
        };

        LineAccess {
            values: LineValues::Scratch { values, target, start, step },
            len,
        }
    }
}


enum Target<'a> {
    A8(&'a mut [u8]),
    Rgba8(&'a mut [RGBA8], usize),
    FloatAlpha(&'a mut [f32], &'a mut [f32]),
}

enum LineValues<'a> {
    Direct {
        data: &'a mut [f32],
        offset: usize,
        stride: usize,
    },
    Scratch {
        values: Vec<f32>,
        target: Target<'a>,
        start: usize,
        step: usize,
    },
}

/// One component of a row or a column.
///
/// Float surfaces are accessed in place.
/// 8-bit surfaces are copied into a float line and written back,
/// rounded and clamped, when the line is dropped.
pub struct LineAccess<'a> {
    values: LineValues<'a>,
    len: usize,
}

impl<'a> LineAccess<'a> {
    fn direct(data: &'a mut [f32], offset: usize, stride: usize, len: usize) -> Self {
        LineAccess { values: LineValues::Direct { data, offset, stride }, len }
    }

    /// Returns the number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks that the line has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Checks that the line aliases the surface storage.
    #[inline]
    pub fn is_direct(&self) -> bool {
        matches!(self.values, LineValues::Direct { .. })
    }

    /// Returns a value.
    ///
    /// # Panics
    ///
    /// When `i >= len()`.
    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        assert!(i < self.len);
        match &self.values {
            LineValues::Direct { data, offset, stride } => data[offset + i * stride] as f64,
            LineValues::Scratch { values, .. } => values[i] as f64,
        }
    }

    /// Sets a value.
    ///
    /// # Panics
    ///
    /// When `i >= len()`.
    #[inline]
    pub fn set(&mut self, i: usize, value: f64) {
        assert!(i < self.len);
        match &mut self.values {
            LineValues::Direct { data, offset, stride } => data[*offset + i * *stride] = value as f32,
            LineValues::Scratch { values, .. } => values[i] = value as f32,
        }
    }

    /// Copies the line into a vector.
    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.get(i)).collect()
    }

    /// Overwrites the line from a slice.
    ///
    /// # Panics
    ///
    /// When `values` is shorter than the line.
    pub fn copy_from(&mut self, values: &[f64]) {
        for (i, v) in values[..self.len].iter().enumerate() {
            self.set(i, *v);
        }
    }
}

impl Drop for LineAccess<'_> {
    fn drop(&mut self) {
        if let LineValues::Scratch { values, target, start, step } = &mut self.values {
            for (i, v) in values.iter().enumerate() {
                let idx = *start + i * *step;
                match target {
                    Target::A8(d) => d[idx] = to_u8(*v as f64),
                    Target::Rgba8(d, component) => {
                        let v = to_u8(*v as f64);
                        let p = &mut d[idx];
                        match *component {
                            0 => p.r = v,
                            1 => p.g = v,
                            2 => p.b = v,
                            _ => p.a = v,
                        }
                    }
                    Target::FloatAlpha(p, s) => {
                        p[idx * 4 + 3] = *v;
                        s[idx * 4 + 3] = *v;
                    }
                }
            }
        }
    }
}
