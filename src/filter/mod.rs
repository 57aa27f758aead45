// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use pixelfx::{BlurQuality, Color, ColorContext, ColorSpace, Surface};

use crate::context::{Context, Operator};
use crate::geom::{IntRect, Point, Rect, Transform};

macro_rules! impl_base {
    () => {
        fn base(&self) -> &crate::filter::PrimitiveBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut crate::filter::PrimitiveBase {
            &mut self.base
        }
    };
}

mod blend;
mod color_matrix;
mod component_transfer;
mod composite;
mod convolve_matrix;
mod displacement_map;
mod drop_shadow;
mod flood;
mod gaussian_blur;
mod image;
mod lighting;
mod merge;
mod morphology;
mod offset;
mod slot;
#[cfg(test)]
mod testing;
mod tile;
mod turbulence;
mod units;

pub use blend::{Blend, BlendMode};
pub use color_matrix::{ColorMatrix, ColorMatrixKind};
pub use component_transfer::{ComponentTransfer, TransferKind};
pub use composite::{Composite, CompositeOperator};
pub use convolve_matrix::{ConvolveMatrix, ConvolveEdgeMode};
pub use displacement_map::DisplacementMap;
pub use drop_shadow::DropShadow;
pub use flood::Flood;
pub use gaussian_blur::GaussianBlur;
pub use image::{Align, AspectRatio, Image, RenderFn};
pub use lighting::{DiffuseLighting, LightSource, SpecularLighting};
pub use merge::Merge;
pub use morphology::Morphology;
pub use offset::Offset;
pub use slot::{Slot, SlotKey};
pub use tile::Tile;
pub use turbulence::{Turbulence, TurbulenceKind};
pub use units::{FilterUnits, Units};

/// A filter resolution quality.
///
/// Limits the automatic resolution of a filter.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Quality {
    Best,
    Better,
    #[default]
    Normal,
    Worse,
    Worst,
}

impl Quality {
    /// Returns the longest side of the pixblock, if limited.
    pub fn resolution_limit(self) -> Option<f64> {
        match self {
            Quality::Worst => Some(32.0),
            Quality::Worse => Some(64.0),
            Quality::Normal => Some(256.0),
            Quality::Better => Some(1024.0),
            Quality::Best => None,
        }
    }
}

/// Rendering options.
#[derive(Clone, Debug)]
pub struct RenderOptions {
    /// Filter resolution quality.
    pub quality: Quality,
    /// Gaussian blur quality.
    pub blur_quality: BlurQuality,
    /// Device pixels per logical pixel.
    pub device_scale: u32,
    /// Color conversion settings.
    pub color: Arc<ColorContext>,
    /// A thread pool for pixel loops. The global `rayon` pool is used when not set.
    pub pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            quality: Quality::default(),
            blur_quality: BlurQuality::default(),
            device_scale: 1,
            color: Arc::new(ColorContext::default()),
            pool: None,
        }
    }
}

/// A length of a filter or primitive region.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Length {
    /// A plain number. A fraction of the bounding box in bounding box units.
    Number(f64),
    /// A percentage of the bounding box.
    Percent(f64),
}

impl Length {
    /// Resolves the length against a bounding box side.
    #[inline]
    fn resolve(self, len: f64) -> f64 {
        match self {
            Length::Number(n) => n,
            Length::Percent(n) => n / 100.0 * len,
        }
    }
}

/// Converts an unpremultiplied sRGB color into `space`.
///
/// Legacy surfaces without a space store sRGB as is.
pub(crate) fn color_in(color: Color, space: Option<&ColorSpace>) -> Color {
    match space {
        Some(space) => space.from_srgb(color),
        None => color.resized(3),
    }
}


#[derive(Debug)]
pub(crate) enum Error {
    InvalidRegion,
    NoResults,
}


/// Parameters shared by every primitive.
#[derive(Clone, Debug, Default)]
pub struct PrimitiveBase {
    /// The first input.
    pub input: SlotKey,
    /// The result key.
    pub output: SlotKey,
    /// The subregion left edge. Defaults to the filter region.
    pub x: Option<Length>,
    /// The subregion top edge. Defaults to the filter region.
    pub y: Option<Length>,
    /// The subregion width. Defaults to the filter region.
    pub width: Option<Length>,
    /// The subregion height. Defaults to the filter region.
    pub height: Option<Length>,
    /// The working color space. `None` keeps the space of the inputs.
    pub color_space: Option<ColorSpace>,
}

impl PrimitiveBase {
    /// Returns an input in the working color space.
    pub fn input(&self, slot: &Slot, key: SlotKey) -> Option<Rc<Surface>> {
        match self.color_space {
            Some(ref space) => slot.get_in(key, Some(space)),
            None => slot.get(key),
        }
    }

    /// Returns an owned copy of an input in the working color space.
    pub fn input_copy(&self, slot: &Slot, key: SlotKey) -> Option<Surface> {
        match self.color_space {
            Some(ref space) => slot.get_copy_in(key, Some(space)),
            None => slot.get_copy(key),
        }
    }

    /// Returns the primitive subregion in user space.
    ///
    /// Unset values are taken from the filter region.
    pub fn filter_primitive_area(&self, units: &FilterUnits) -> Rect {
        let fa = units.filter_area().unwrap_or_else(|| Rect::from_xywh(0.0, 0.0, 0.0, 0.0));
        let bbox = units.item_bbox();

        let resolve = |v: Option<Length>, fallback: f64, origin: f64, len: f64| match v {
            None => fallback,
            Some(l) => match (units.primitive_units(), l) {
                (Units::ObjectBoundingBox, Length::Number(n)) => origin + n * len,
                (Units::ObjectBoundingBox, Length::Percent(_)) => origin + l.resolve(len),
                (Units::UserSpaceOnUse, _) => l.resolve(len),
            },
        };

        let (bx, by, bw, bh) = match bbox {
            Some(b) => (b.left(), b.top(), b.width(), b.height()),
            None => (0.0, 0.0, 0.0, 0.0),
        };

        let x = resolve(self.x, fa.left(), bx, bw);
        let y = resolve(self.y, fa.top(), by, bh);
        // Sizes are never offset by the bounding box origin.
        let w = resolve(self.width, fa.width(), 0.0, bw);
        let h = resolve(self.height, fa.height(), 0.0, bh);
        Rect::from_xywh(x, y, w, h)
    }
}


/// A filter primitive.
pub trait Primitive: fmt::Debug + Send + Sync {
    /// Returns shared parameters.
    fn base(&self) -> &PrimitiveBase;

    /// Returns mutable shared parameters.
    fn base_mut(&mut self) -> &mut PrimitiveBase;

    /// Renders the primitive, storing the result in `slot`.
    fn render(&self, slot: &mut Slot);

    /// Grows a display-space area to cover pixels the primitive reads.
    fn area_enlarge(&self, _area: &mut IntRect, _ts: &Transform) {}

    /// Returns a relative rendering cost.
    fn complexity(&self, _ts: &Transform) -> f64 {
        1.0
    }

    /// Checks that the primitive works in a rotated or skewed pixblock.
    fn can_handle_affine(&self, _ts: &Transform) -> bool {
        false
    }

    /// Checks that the primitive reads the specified slot.
    fn uses_input(&self, key: SlotKey) -> bool {
        self.base().input == key
    }
}


/// An SVG filter.
///
/// An ordered list of primitives plus the filter region.
pub struct Filter {
    primitives: Vec<Box<dyn Primitive>>,
    output: SlotKey,
    x: Length,
    y: Length,
    width: Length,
    height: Length,
    resolution_x: f64,
    resolution_y: f64,
    filter_units: Units,
    primitive_units: Units,
}

impl Default for Filter {
    fn default() -> Self {
        Filter::new()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Filter")
            .field("primitives", &self.primitives)
            .field("output", &self.output)
            .field("region", &(self.x, self.y, self.width, self.height))
            .field("resolution", &(self.resolution_x, self.resolution_y))
            .field("filter_units", &self.filter_units)
            .field("primitive_units", &self.primitive_units)
            .finish()
    }
}

impl Filter {
    /// Creates an empty filter with the default region.
    pub fn new() -> Self {
        Filter {
            primitives: Vec::new(),
            output: SlotKey::NotSet,
            x: Length::Percent(-10.0),
            y: Length::Percent(-10.0),
            width: Length::Percent(120.0),
            height: Length::Percent(120.0),
            resolution_x: -1.0,
            resolution_y: -1.0,
            filter_units: Units::ObjectBoundingBox,
            primitive_units: Units::UserSpaceOnUse,
        }
    }

    /// Appends a primitive.
    ///
    /// A primitive without an output gets a new named one,
    /// so the next primitive can read it as the last output.
    pub fn add_primitive(&mut self, mut primitive: Box<dyn Primitive>) {
        if primitive.base().output == SlotKey::NotSet {
            let next = self
                .primitives
                .iter()
                .filter_map(|p| match p.base().output {
                    SlotKey::Named(n) => Some(n + 1),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            primitive.base_mut().output = SlotKey::Named(next);
        }

        self.primitives.push(primitive);
    }

    /// Removes all primitives.
    pub fn clear_primitives(&mut self) {
        self.primitives.clear();
    }

    /// Returns primitives.
    pub fn primitives(&self) -> &[Box<dyn Primitive>] {
        &self.primitives
    }

    /// Sets the result slot. `NotSet` means the last primitive result.
    pub fn set_output(&mut self, key: SlotKey) {
        self.output = key;
    }

    /// Sets the filter region left edge.
    pub fn set_x(&mut self, length: Length) {
        self.x = length;
    }

    /// Sets the filter region top edge.
    pub fn set_y(&mut self, length: Length) {
        self.y = length;
    }

    /// Sets the filter region width.
    pub fn set_width(&mut self, length: Length) {
        self.width = length;
    }

    /// Sets the filter region height.
    pub fn set_height(&mut self, length: Length) {
        self.height = length;
    }

    /// Sets the filter region units.
    pub fn set_filter_units(&mut self, units: Units) {
        self.filter_units = units;
    }

    /// Sets the primitive subregion units.
    pub fn set_primitive_units(&mut self, units: Units) {
        self.primitive_units = units;
    }

    /// Sets the same resolution along both axes.
    ///
    /// Non-positive values are ignored.
    pub fn set_resolution(&mut self, pixels: f64) {
        if pixels > 0.0 {
            self.resolution_x = pixels;
            self.resolution_y = pixels;
        }
    }

    /// Sets the resolution along each axis.
    ///
    /// A zero `y` keeps the aspect ratio of the filter region.
    /// Negative values are ignored.
    pub fn set_resolution_xy(&mut self, x: f64, y: f64) {
        if x >= 0.0 && y >= 0.0 {
            self.resolution_x = x;
            self.resolution_y = y;
        }
    }

    /// Switches back to the automatic resolution.
    pub fn reset_resolution(&mut self) {
        self.resolution_x = -1.0;
        self.resolution_y = -1.0;
    }

    /// Returns the filter effect region in user space.
    ///
    /// Returns `None` for bounding box units without a bounding box.
    pub fn filter_effect_area(&self, bbox: Option<Rect>) -> Option<Rect> {
        match self.filter_units {
            Units::ObjectBoundingBox => {
                let bbox = bbox?;
                let (w, h) = (bbox.width(), bbox.height());
                let resolve = |l: Length, len: f64| match l {
                    Length::Number(n) => n * len,
                    Length::Percent(_) => l.resolve(len),
                };

                let x = bbox.left() + resolve(self.x, w);
                let y = bbox.top() + resolve(self.y, h);
                Some(Rect::from_xywh(x, y, resolve(self.width, w), resolve(self.height, h)))
            }
            Units::UserSpaceOnUse => {
                let (w, h) = bbox.map_or((0.0, 0.0), |b| (b.width(), b.height()));
                Some(Rect::from_xywh(
                    self.x.resolve(w),
                    self.y.resolve(h),
                    self.width.resolve(w),
                    self.height.resolve(h),
                ))
            }
        }
    }

    /// Returns the pixblock size of the filter region.
    pub fn filter_resolution(&self, area: Rect, ts: &Transform, quality: Quality) -> (f64, f64) {
        if self.resolution_x > 0.0 {
            let y = if self.resolution_y > 0.0 {
                self.resolution_y
            } else {
                self.resolution_x * area.height() / area.width()
            };

            return (self.resolution_x, y);
        }

        let origin = ts.apply_point(area.min());
        let max_i = ts.apply_point(Point::new(area.right(), area.top()));
        let max_j = ts.apply_point(Point::new(area.left(), area.bottom()));
        let mut i_len = origin.distance(max_i);
        let mut j_len = origin.distance(max_j);

        if let Some(limit) = quality.resolution_limit() {
            if i_len > limit || j_len > limit {
                let aspect_ratio = i_len / j_len;
                if i_len > j_len {
                    i_len = limit;
                    j_len = i_len / aspect_ratio;
                } else {
                    j_len = limit;
                    i_len = j_len * aspect_ratio;
                }
            }
        }

        (i_len, j_len)
    }

    /// Returns a relative rendering cost.
    pub fn complexity(&self, ts: &Transform) -> f64 {
        let mut factor = 1.0;
        for p in &self.primitives {
            factor += p.complexity(ts) - 1.0;
        }

        factor
    }

    /// Grows a display-space area to cover pixels the filter reads.
    pub fn area_enlarge(&self, area: &mut IntRect, ts: &Transform) {
        for p in &self.primitives {
            p.area_enlarge(area, ts);
        }
    }

    /// Checks that some primitive reads the specified slot.
    pub fn uses_input(&self, key: SlotKey) -> bool {
        self.primitives.iter().any(|p| p.uses_input(key))
    }

    /// Checks that some primitive reads the background image or its alpha.
    ///
    /// The background passed to `render` is ignored otherwise.
    pub fn uses_background(&self) -> bool {
        self.uses_input(SlotKey::BackgroundImage) || self.uses_input(SlotKey::BackgroundAlpha)
    }

    /// Applies the filter to `image` in place.
    ///
    /// - `render_area` is the area covered by `image`, in display space
    /// - `ts` maps user space to display space
    /// - `item_bbox` is the item bounding box in user space
    /// - `background` is the content behind the item, covering the same area
    ///
    /// Problems are logged. The image is cleared when nothing can be rendered.
    pub fn render(
        &self,
        render_area: IntRect,
        ts: Transform,
        item_bbox: Option<Rect>,
        image: &mut Surface,
        background: Option<&Surface>,
        options: &RenderOptions,
    ) {
        let result = match options.pool {
            Some(ref pool) => pool.install(|| {
                self.render_inner(render_area, ts, item_bbox, image, background, options)
            }),
            None => self.render_inner(render_area, ts, item_bbox, image, background, options),
        };

        match result {
            Ok(_) => {}
            Err(Error::InvalidRegion) => {
                log::warn!("Filter has an invalid region.");
            }
            Err(Error::NoResults) => {}
        }
    }

    fn render_inner(
        &self,
        render_area: IntRect,
        ts: Transform,
        item_bbox: Option<Rect>,
        image: &mut Surface,
        background: Option<&Surface>,
        options: &RenderOptions,
    ) -> Result<(), Error> {
        if self.primitives.is_empty() {
            image.clear();
            return Ok(());
        }

        let filter_area = self.filter_effect_area(item_bbox).ok_or(Error::InvalidRegion)?;

        let mut units = FilterUnits::new(self.filter_units, self.primitive_units);
        units.set_ctm(ts);
        units.set_item_bbox(item_bbox);
        units.set_filter_area(filter_area);
        units.set_render_area(render_area);

        let (res_x, res_y) = self.filter_resolution(filter_area, &ts, options.quality);
        if !(res_x > 0.0 && res_y > 0.0) {
            image.clear();
            return Ok(());
        }

        units.set_resolution(res_x, res_y);
        units.set_automatic_resolution(self.resolution_x <= 0.0);

        let display2pb = units.display2pb();
        let parallel = self.primitives.iter().any(|p| !p.can_handle_affine(&display2pb));
        units.set_parallel(parallel);

        let source = Rc::new(image.clone());
        let mut slot = Slot::new(options, &units);
        slot.set(SlotKey::SourceImage, source.clone());
        if self.uses_input(SlotKey::SourceAlpha) {
            slot.set_alpha(SlotKey::SourceImage, SlotKey::SourceAlpha);
        }

        if let Some(background) = background.filter(|_| self.uses_background()) {
            slot.set(SlotKey::BackgroundImage, Rc::new(background.clone()));
            if self.uses_input(SlotKey::BackgroundAlpha) {
                slot.set_alpha(SlotKey::BackgroundImage, SlotKey::BackgroundAlpha);
            }
        }

        for p in &self.primitives {
            p.render(&mut slot);
        }

        let result = slot.get_result(self.output).ok_or(Error::NoResults)?;
        if !Rc::ptr_eq(&result, &source) {
            Context::new(image).paint_surface(&result, 0.0, 0.0, Operator::Source);
        }

        Ok(())
    }
}
