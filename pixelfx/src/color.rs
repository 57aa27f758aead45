// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::f64_bound;

/// The maximum number of color channels, excluding alpha.
pub const MAX_CHANNELS: usize = 6;

/// A transient color value.
///
/// Holds up to [`MAX_CHANNELS`] channel values followed by an alpha.
/// Whether the channels are premultiplied depends on how the color was read.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    values: [f64; MAX_CHANNELS],
    len: usize,
    alpha: f64,
}

impl Color {
    /// Creates a new color from channel values and an alpha.
    ///
    /// Extra channels above [`MAX_CHANNELS`] are ignored.
    pub fn new(channels: &[f64], alpha: f64) -> Self {
        let len = channels.len().min(MAX_CHANNELS);
        let mut values = [0.0; MAX_CHANNELS];
        values[..len].copy_from_slice(&channels[..len]);
        Color { values, len, alpha }
    }

    /// Creates a fully transparent color with `len` zeroed channels.
    pub fn transparent(len: usize) -> Self {
        Color { values: [0.0; MAX_CHANNELS], len: len.min(MAX_CHANNELS), alpha: 0.0 }
    }

    /// Creates an RGBA color.
    #[inline]
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Color::new(&[r, g, b], a)
    }

    /// Returns the number of channels, excluding alpha.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Checks that the color is alpha-only.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the channel values, excluding alpha.
    #[inline]
    pub fn channels(&self) -> &[f64] {
        &self.values[..self.len]
    }

    /// Returns the mutable channel values, excluding alpha.
    #[inline]
    pub fn channels_mut(&mut self) -> &mut [f64] {
        &mut self.values[..self.len]
    }

    /// Returns a component by index, where `len()` addresses the alpha.
    ///
    /// # Panics
    ///
    /// When `index > len()`.
    #[inline]
    pub fn component(&self, index: usize) -> f64 {
        if index == self.len {
            self.alpha
        } else {
            self.channels()[index]
        }
    }

    /// Sets a component by index, where `len()` addresses the alpha.
    ///
    /// # Panics
    ///
    /// When `index > len()`.
    #[inline]
    pub fn set_component(&mut self, index: usize, value: f64) {
        if index == self.len {
            self.alpha = value;
        } else {
            self.channels_mut()[index] = value;
        }
    }

    /// Returns the alpha.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Sets the alpha.
    #[inline]
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = alpha;
    }

    /// Returns a copy with every channel multiplied by alpha.
    pub fn premultiplied(mut self) -> Self {
        let a = self.alpha;
        for v in self.channels_mut() {
            *v *= a;
        }

        self
    }

    /// Returns a copy with every channel divided by alpha.
    ///
    /// A zero alpha yields zeroed channels.
    pub fn unpremultiplied(mut self) -> Self {
        let mult = if self.alpha > 0.0 { 1.0 / self.alpha } else { 0.0 };
        for v in self.channels_mut() {
            *v *= mult;
        }

        self
    }

    /// Returns a copy with `len` channels, truncating or zero-padding.
    pub fn resized(mut self, len: usize) -> Self {
        let len = len.min(MAX_CHANNELS);
        for v in self.values.iter_mut().skip(len) {
            *v = 0.0;
        }

        self.len = len;
        self
    }

    /// Returns a copy with every component bound to `0..=1`.
    pub fn clamped(mut self) -> Self {
        for v in self.channels_mut() {
            *v = f64_bound(0.0, *v, 1.0);
        }

        self.alpha = f64_bound(0.0, self.alpha, 1.0);
        self
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::transparent(3)
    }
}
