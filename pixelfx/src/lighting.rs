// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use crate::{Color, FuzzyEq, FuzzyZero, PixelAccess, PixelAccessMut};

/// A light source.
///
/// Coordinates are in pixels of the destination surface.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug)]
pub enum LightSource {
    Distant {
        azimuth: f64,
        elevation: f64,
    },
    Point {
        x: f64,
        y: f64,
        z: f64,
    },
    Spot {
        x: f64,
        y: f64,
        z: f64,
        points_at_x: f64,
        points_at_y: f64,
        points_at_z: f64,
        specular_exponent: f64,
        limiting_cone_angle: Option<f64>,
    },
}

impl LightSource {
    fn light_vector(&self, x: f64, y: f64, z: f64) -> Vector3 {
        match *self {
            LightSource::Distant { azimuth, elevation } => {
                let azimuth = azimuth.to_radians();
                let elevation = elevation.to_radians();
                Vector3::new(
                    azimuth.cos() * elevation.cos(),
                    azimuth.sin() * elevation.cos(),
                    elevation.sin(),
                )
            }
            LightSource::Point { x: lx, y: ly, z: lz }
            | LightSource::Spot { x: lx, y: ly, z: lz, .. } => {
                let v = Vector3::new(lx - x, ly - y, lz - z);
                v.normalized().unwrap_or(v)
            }
        }
    }

    fn color(&self, lighting_color: &Color, light_vector: Vector3) -> Color {
        let LightSource::Spot {
            x, y, z, points_at_x, points_at_y, points_at_z, specular_exponent, limiting_cone_angle
        } = *self else {
            return *lighting_color;
        };

        let direction = Vector3::new(points_at_x, points_at_y, points_at_z) - Vector3::new(x, y, z);
        let direction = direction.normalized().unwrap_or(direction);
        let minus_l_dot_s = -light_vector.dot(&direction);
        if minus_l_dot_s <= 0.0 {
            return Color::transparent(lighting_color.len());
        }

        if let Some(angle) = limiting_cone_angle {
            if minus_l_dot_s < angle.to_radians().cos() {
                return Color::transparent(lighting_color.len());
            }
        }

        let factor = minus_l_dot_s.powf(specular_exponent);
        let mut c = *lighting_color;
        for v in c.channels_mut() {
            *v *= factor;
        }
        c
    }
}


#[derive(Clone, Copy, Debug)]
struct Vector3 {
    x: f64,
    y: f64,
    z: f64,
}

impl Vector3 {
    #[inline]
    fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3 { x, y, z }
    }

    #[inline]
    fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline]
    fn length(&self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    fn normalized(&self) -> Option<Self> {
        let length = self.length();
        if !length.is_fuzzy_zero() {
            Some(Vector3::new(self.x / length, self.y / length, self.z / length))
        } else {
            None
        }
    }
}

impl core::ops::Add for Vector3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Vector3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl core::ops::Sub for Vector3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Vector3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}


/// A surface normal without the surface scale applied.
#[derive(Clone, Copy, Debug)]
struct Normal {
    x: f64,
    y: f64,
}

impl Normal {
    fn is_fuzzy_zero(&self) -> bool {
        self.x.is_fuzzy_zero() && self.y.is_fuzzy_zero()
    }

    fn scaled(&self, surface_scale: f64) -> Vector3 {
        Vector3::new(-self.x * surface_scale, -self.y * surface_scale, 1.0)
    }
}

// Sobel normal of the alpha channel.
//
// Missing neighbors along an edge are replaced by the center pixel,
// and the factor grows accordingly.
fn normal_at(src: &PixelAccess, x: u32, y: u32) -> Normal {
    let a = |x: u32, y: u32| src.alpha_at(x as i32, y as i32);
    let (w, h) = (src.width(), src.height());

    let left = x.saturating_sub(1);
    let right = (x + 1).min(w - 1);
    let top = y.saturating_sub(1);
    let bottom = (y + 1).min(h - 1);

    let weight = |d: u32, c: u32| if d == c { 2.0 } else { 1.0 };

    let mut nx = 0.0;
    for row in top..=bottom {
        nx += weight(row, y) * (a(right, row) - a(left, row));
    }

    let mut ny = 0.0;
    for column in left..=right {
        ny += weight(column, x) * (a(column, bottom) - a(column, top));
    }

    let factor = |full_own: bool, full_other: bool| match (full_own, full_other) {
        (true, true) => 1.0 / 4.0,
        (true, false) => 1.0 / 3.0,
        (false, true) => 1.0 / 2.0,
        (false, false) => 2.0 / 3.0,
    };

    let full_x = right - left == 2;
    let full_y = bottom - top == 2;
    Normal {
        x: nx * factor(full_x, full_y),
        y: ny * factor(full_y, full_x),
    }
}


/// Renders a diffuse lighting.
///
/// - `src` can have any color space, since only the alpha channel is used.
/// - `lighting_color` must be in the `dest` color space.
/// - `dest` alpha is always 1.
///
/// # Panics
///
/// - When `LightSource::Spot::specular_exponent` is negative.
/// - When `src` and `dest` have different sizes.
pub fn diffuse_lighting(
    surface_scale: f64,
    diffuse_constant: f64,
    lighting_color: Color,
    light_source: LightSource,
    src: &PixelAccess,
    dest: &mut PixelAccessMut,
) {
    let light_factor = |normal: Normal, light_vector: Vector3| {
        let k = if normal.is_fuzzy_zero() {
            light_vector.z
        } else {
            let n = normal.scaled(surface_scale);
            n.dot(&light_vector) / n.length()
        };

        diffuse_constant * k
    };

    apply(light_source, surface_scale, lighting_color, light_factor, |_| 1.0, src, dest);
}

/// Renders a specular lighting.
///
/// - `src` can have any color space, since only the alpha channel is used.
/// - `lighting_color` must be in the `dest` color space.
/// - `dest` will have a **premultiplied alpha** equal to the largest channel.
///
/// # Panics
///
/// - When `LightSource::Spot::specular_exponent` is negative.
/// - When `src` and `dest` have different sizes.
pub fn specular_lighting(
    surface_scale: f64,
    specular_constant: f64,
    specular_exponent: f64,
    lighting_color: Color,
    light_source: LightSource,
    src: &PixelAccess,
    dest: &mut PixelAccessMut,
) {
    let light_factor = |normal: Normal, light_vector: Vector3| {
        let h = light_vector + Vector3::new(0.0, 0.0, 1.0);
        let h_length = h.length();
        if h_length.is_fuzzy_zero() {
            return 0.0;
        }

        let n_dot_h = if normal.is_fuzzy_zero() {
            h.z / h_length
        } else {
            let n = normal.scaled(surface_scale);
            n.dot(&h) / n.length() / h_length
        };

        let k = if specular_exponent.fuzzy_eq(&1.0) {
            n_dot_h
        } else {
            n_dot_h.powf(specular_exponent)
        };

        specular_constant * k
    };

    let max_channel = |c: &Color| c.channels().iter().fold(0.0f64, |m, v| m.max(*v));
    apply(light_source, surface_scale, lighting_color, light_factor, max_channel, src, dest);
}

fn apply<L, A>(
    light_source: LightSource,
    surface_scale: f64,
    lighting_color: Color,
    light_factor: L,
    calc_alpha: A,
    src: &PixelAccess,
    dest: &mut PixelAccessMut,
) where
    L: Fn(Normal, Vector3) -> f64 + Sync + Send,
    A: Fn(&Color) -> f64 + Sync + Send,
{
    assert!(src.width() == dest.width() && src.height() == dest.height());

    if let LightSource::Spot { specular_exponent, .. } = light_source {
        assert!(!specular_exponent.is_sign_negative());
    }

    let lighting_color = lighting_color.resized(dest.channels());
    dest.for_each_pixel(false, |x, y| {
        let z = src.alpha_at(x as i32, y as i32) * surface_scale;
        let light_vector = light_source.light_vector(x as f64, y as f64, z);
        let light_color = light_source.color(&lighting_color, light_vector);
        let factor = light_factor(normal_at(src, x, y), light_vector);

        let mut c = light_color;
        for v in c.channels_mut() {
            *v *= factor;
        }
        let mut c = c.clamped();
        c.set_alpha(calc_alpha(&c));
        c
    });
}
