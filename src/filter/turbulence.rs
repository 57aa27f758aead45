// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{EdgeMode, Surface, TurbulenceTile};

use super::{Primitive, PrimitiveBase, Slot, SlotKey};
use crate::geom::Transform;

/// A noise kind.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum TurbulenceKind {
    FractalNoise,
    #[default]
    Turbulence,
}

/// An `feTurbulence` primitive.
///
/// Noise is evaluated in primitive units, so it doesn't depend on
/// the resolution or the placement of the pixblock.
#[derive(Clone, Debug)]
pub struct Turbulence {
    /// Shared parameters. `base.input` is unused.
    pub base: PrimitiveBase,
    /// The noise kind.
    pub kind: TurbulenceKind,
    /// The random seed.
    pub seed: f64,
    /// Base frequencies along both axes.
    pub base_frequency: (f64, f64),
    /// The number of octaves.
    pub num_octaves: u32,
    /// Makes the noise continuous at the tile edges.
    pub stitch_tiles: bool,
    /// The stitching tile in primitive units.
    pub tile: TurbulenceTile,
}

impl Default for Turbulence {
    fn default() -> Self {
        Turbulence {
            base: PrimitiveBase::default(),
            kind: TurbulenceKind::Turbulence,
            seed: 0.0,
            base_frequency: (0.0, 0.0),
            num_octaves: 1,
            stitch_tiles: false,
            tile: TurbulenceTile::default(),
        }
    }
}

impl Turbulence {
    /// Creates a new generator.
    pub fn new(kind: TurbulenceKind, base_frequency: f64, num_octaves: u32) -> Self {
        Turbulence {
            kind,
            base_frequency: (base_frequency, base_frequency),
            num_octaves,
            ..Turbulence::default()
        }
    }
}

impl Primitive for Turbulence {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let units = slot.units();
        let sa = match units.slot_box() {
            Some(v) => v,
            None => {
                log::warn!("Turbulence requires a render area.");
                return;
            }
        };

        let ts = match units.primitiveunits2pb().invert() {
            Some(v) => v,
            None => return,
        };

        let ds = slot.device_scale();
        let space = match self.base.color_space {
            Some(ref space) => Some(space.clone()),
            None => slot.get(SlotKey::SourceImage).and_then(|s| s.color_space().cloned()),
        };
        let mut out = Surface::new(
            sa.width().round() as u32,
            sa.height().round() as u32,
            ds,
            space,
        );

        let mut noise = pixelfx::Turbulence::new(
            self.seed.round() as i32,
            self.tile,
            self.base_frequency.0,
            self.base_frequency.1,
            self.stitch_tiles,
            self.kind == TurbulenceKind::FractalNoise,
            self.num_octaves,
        );

        let ds = ds as f64;
        let ts = Transform::new_scale(1.0 / ds, 1.0 / ds).then(&ts);
        noise.set_transform([ts.a, ts.b, ts.c, ts.d, ts.e, ts.f]);
        noise.set_origin((sa.left() * ds).round() as i32, (sa.top() * ds).round() as i32);
        noise.filter(&mut out.access_mut(EdgeMode::NoCheck));

        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        5.0
    }

    fn uses_input(&self, _: SlotKey) -> bool {
        false
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::testing::*;
    use crate::filter::RenderOptions;
    use crate::geom::IntRect;
    use pixelfx::ColorSpace;

    fn run(options: &RenderOptions, units: &crate::filter::FilterUnits) -> Rc<Surface> {
        let mut slot = Slot::new(options, units);
        slot.set(SlotKey::SourceImage, Rc::new(Surface::new(16, 16, options.device_scale, Some(ColorSpace::LinearRgb))));
        let mut fe = Turbulence::new(TurbulenceKind::FractalNoise, 0.1, 2);
        fe.seed = 3.0;
        fe.base.output = SlotKey::Named(0);
        fe.render(&mut slot);
        slot.get(SlotKey::Named(0)).unwrap()
    }

    #[test]
    fn fills_surface() {
        let options = RenderOptions::default();
        let out = run(&options, &units(16, 16));
        assert_eq!((out.pixel_width(), out.pixel_height()), (16, 16));
        assert!(out.is_in(Some(&ColorSpace::LinearRgb)));
        let visible = (0..16).any(|x| alpha(&out, x, 7) > 0.0);
        assert!(visible);
    }

    #[test]
    fn independent_of_placement() {
        let options = RenderOptions::default();
        let full = run(&options, &units(16, 16));

        // The same filter rendered only for the right half.
        let mut u = units(16, 16);
        u.set_render_area(IntRect::from_xywh(8, 0, 8, 16));
        let half = run(&options, &u);
        assert_eq!(half.pixel_width(), 8);
        for x in 0..8 {
            let (a, b) = (color(&full, x + 8, 5), color(&half, x, 5));
            assert!((a.alpha() - b.alpha()).abs() < 1e-6);
        }
    }

    #[test]
    fn ignores_inputs() {
        let fe = Turbulence::default();
        assert!(!fe.uses_input(SlotKey::SourceImage));
        assert!(!fe.uses_input(SlotKey::NotSet));
        assert_eq!(fe.complexity(&Transform::default()), 5.0);
    }
}
