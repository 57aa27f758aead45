// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{diffuse_lighting, specular_lighting, Color, EdgeMode, Surface};

use super::{color_in, Primitive, PrimitiveBase, Slot};
use crate::geom::{IntRect, Transform};

/// A light source.
///
/// Coordinates are in primitive units.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug)]
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
    /// Converts into destination pixel coordinates.
    ///
    /// Returns `None` for a negative spot exponent.
    fn to_pixels(self, slot: &Slot) -> Option<pixelfx::LightSource> {
        let units = slot.units();
        let ts = units.primitiveunits2pb();
        let ds = slot.device_scale() as f64;
        let (ox, oy) = match units.slot_box() {
            Some(sa) => (sa.left(), sa.top()),
            None => (0.0, 0.0),
        };

        let point = |x: f64, y: f64, z: f64| {
            let (x, y) = ts.apply(x, y);
            ((x - ox) * ds, (y - oy) * ds, z * ts.expansion_x() * ds)
        };

        let light = match self {
            LightSource::Distant { azimuth, elevation } => {
                pixelfx::LightSource::Distant { azimuth, elevation }
            }
            LightSource::Point { x, y, z } => {
                let (x, y, z) = point(x, y, z);
                pixelfx::LightSource::Point { x, y, z }
            }
            LightSource::Spot {
                x, y, z, points_at_x, points_at_y, points_at_z, specular_exponent, limiting_cone_angle,
            } => {
                if specular_exponent < 0.0 {
                    return None;
                }

                let (x, y, z) = point(x, y, z);
                let (points_at_x, points_at_y, points_at_z) = point(points_at_x, points_at_y, points_at_z);
                pixelfx::LightSource::Spot {
                    x, y, z,
                    points_at_x, points_at_y, points_at_z,
                    specular_exponent,
                    limiting_cone_angle,
                }
            }
        };

        Some(light)
    }
}


/// Renders a lighting primitive into a new surface.
fn render_lighting<F>(
    base: &PrimitiveBase,
    light: LightSource,
    surface_scale: f64,
    color: Color,
    slot: &mut Slot,
    f: F,
) where
    F: FnOnce(f64, Color, pixelfx::LightSource, &Surface, &mut Surface),
{
    // Only the alpha of the input is used.
    let input = match base.input(slot, base.input) {
        Some(v) => v,
        None => return,
    };

    let light = match light.to_pixels(slot) {
        Some(v) => v,
        None => {
            log::warn!("Spot light has a negative specular exponent.");
            return;
        }
    };

    let space = match base.color_space {
        Some(ref space) => Some(space.clone()),
        None => input.color_space().cloned(),
    };
    let mut out = input.similar_in(space);

    let ts = slot.units().primitiveunits2pb();
    let scale = surface_scale * ts.descrim() * slot.device_scale() as f64;
    let color = color_in(color, out.color_space());
    f(scale, color, light, &input, &mut out);
    slot.set(base.output, Rc::new(out));
}


/// An `feDiffuseLighting` primitive.
#[derive(Clone, Debug)]
pub struct DiffuseLighting {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The light source.
    pub light: LightSource,
    /// The height of a fully opaque pixel.
    pub surface_scale: f64,
    /// `kd`.
    pub diffuse_constant: f64,
    /// An unpremultiplied sRGB light color.
    pub color: Color,
}

impl DiffuseLighting {
    /// Creates a new white diffuse lighting.
    pub fn new(light: LightSource) -> Self {
        DiffuseLighting {
            base: PrimitiveBase::default(),
            light,
            surface_scale: 1.0,
            diffuse_constant: 1.0,
            color: Color::rgba(1.0, 1.0, 1.0, 1.0),
        }
    }
}

impl Primitive for DiffuseLighting {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let kd = self.diffuse_constant;
        render_lighting(
            &self.base,
            self.light,
            self.surface_scale,
            self.color,
            slot,
            |scale, color, light, src, dest| {
                diffuse_lighting(
                    scale,
                    kd,
                    color,
                    light,
                    &src.access(EdgeMode::Zero),
                    &mut dest.access_mut(EdgeMode::NoCheck),
                );
            },
        );
    }

    fn area_enlarge(&self, area: &mut IntRect, _: &Transform) {
        // Edge pixels are approximate.
        area.expand_by(1, 1);
    }

    fn complexity(&self, _: &Transform) -> f64 {
        9.0
    }
}


/// An `feSpecularLighting` primitive.
#[derive(Clone, Debug)]
pub struct SpecularLighting {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The light source.
    pub light: LightSource,
    /// The height of a fully opaque pixel.
    pub surface_scale: f64,
    /// `ks`.
    pub specular_constant: f64,
    /// The shininess.
    pub specular_exponent: f64,
    /// An unpremultiplied sRGB light color.
    pub color: Color,
}

impl SpecularLighting {
    /// Creates a new white specular lighting.
    pub fn new(light: LightSource) -> Self {
        SpecularLighting {
            base: PrimitiveBase::default(),
            light,
            surface_scale: 1.0,
            specular_constant: 1.0,
            specular_exponent: 1.0,
            color: Color::rgba(1.0, 1.0, 1.0, 1.0),
        }
    }
}

impl Primitive for SpecularLighting {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let (ks, exponent) = (self.specular_constant, self.specular_exponent);
        render_lighting(
            &self.base,
            self.light,
            self.surface_scale,
            self.color,
            slot,
            |scale, color, light, src, dest| {
                specular_lighting(
                    scale,
                    ks,
                    exponent,
                    color,
                    light,
                    &src.access(EdgeMode::Zero),
                    &mut dest.access_mut(EdgeMode::NoCheck),
                );
            },
        );
    }

    fn area_enlarge(&self, area: &mut IntRect, _: &Transform) {
        area.expand_by(1, 1);
    }

    fn complexity(&self, _: &Transform) -> f64 {
        9.0
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::{RenderOptions, SlotKey};
    use crate::geom::Rect;
    use pixelfx::ColorSpace;

    fn flat() -> Rc<Surface> {
        Rc::new(filled(
            8,
            8,
            Some(ColorSpace::LinearRgb),
            Rect::from_xywh(0.0, 0.0, 8.0, 8.0),
            Color::rgba(0.0, 0.0, 0.0, 1.0),
        ))
    }

    #[test]
    fn diffuse_distant_from_above() {
        let options = RenderOptions::default();
        let units = units(8, 8);
        let mut slot = Slot::new(&options, &units);
        slot.set(SlotKey::SourceImage, flat());

        let mut fe = DiffuseLighting::new(LightSource::Distant { azimuth: 0.0, elevation: 90.0 });
        fe.color = Color::rgba(1.0, 0.5, 0.0, 1.0);
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);

        let c = color(&slot.get(SlotKey::Named(0)).unwrap(), 4, 4);
        assert_eq!(c.alpha(), 1.0);
        assert!((c.component(0) - 1.0).abs() < 1e-6);
        // sRGB 0.5 in linear light.
        assert!((c.component(1) - 0.214).abs() < 0.001);
        assert!(c.component(2).abs() < 1e-6);
    }

    #[test]
    fn specular_alpha_is_max_channel() {
        let options = RenderOptions::default();
        let units = units(8, 8);
        let mut slot = Slot::new(&options, &units);
        slot.set(SlotKey::SourceImage, flat());

        let mut fe = SpecularLighting::new(LightSource::Distant { azimuth: 0.0, elevation: 90.0 });
        fe.specular_constant = 0.5;
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);

        let out = slot.get(SlotKey::Named(0)).unwrap();
        assert!((alpha(&out, 4, 4) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn point_light_position() {
        let options = RenderOptions { device_scale: 2, ..RenderOptions::default() };
        let units = units(8, 8);
        let slot = Slot::new(&options, &units);

        let light = LightSource::Point { x: 2.0, y: 3.0, z: 4.0 }.to_pixels(&slot);
        match light {
            Some(pixelfx::LightSource::Point { x, y, z }) => {
                assert_eq!((x, y, z), (4.0, 6.0, 8.0));
            }
            _ => panic!("expected a point light"),
        }
    }

    #[test]
    fn negative_spot_exponent() {
        let options = RenderOptions::default();
        let units = units(8, 8);
        let mut slot = Slot::new(&options, &units);
        slot.set(SlotKey::SourceImage, flat());

        let mut fe = DiffuseLighting::new(LightSource::Spot {
            x: 0.0,
            y: 0.0,
            z: 10.0,
            points_at_x: 4.0,
            points_at_y: 4.0,
            points_at_z: 0.0,
            specular_exponent: -1.0,
            limiting_cone_angle: None,
        });
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);
        assert!(slot.get(SlotKey::Named(0)).is_none());
    }

    #[test]
    fn enlarge() {
        let fe = DiffuseLighting::new(LightSource::Distant { azimuth: 0.0, elevation: 45.0 });
        let mut area = IntRect::new(0, 0, 4, 4);
        fe.area_enlarge(&mut area, &Transform::default());
        assert_eq!(area, IntRect::new(-1, -1, 5, 5));
    }
}
