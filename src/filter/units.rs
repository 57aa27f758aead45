// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pixelfx::FuzzyEq;

use crate::geom::{IntRect, Rect, Transform};

/// A coordinate system for filter and primitive regions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Units {
    /// Coordinates are fractions of the item's bounding box.
    ObjectBoundingBox,
    /// Coordinates are in the item's user space.
    UserSpaceOnUse,
}

/// Coordinate systems of a single filter evaluation.
///
/// Three spaces are involved:
///
/// - user space, where the item and the filter region are defined
/// - display space, where the item is rendered (`ctm` maps user to display)
/// - pixblock space, where the filter operates
///
/// Pixblock space usually matches display space. It becomes axis-aligned
/// with user space when some primitive can't handle a rotated or skewed
/// transform, or when the filter has an explicit resolution.
#[derive(Clone, Debug)]
pub struct FilterUnits {
    filter_units: Units,
    primitive_units: Units,
    ctm: Transform,
    item_bbox: Option<Rect>,
    filter_area: Option<Rect>,
    render_area: Option<IntRect>,
    resolution_x: f64,
    resolution_y: f64,
    parallel: bool,
    automatic_resolution: bool,
}

impl Default for FilterUnits {
    fn default() -> Self {
        FilterUnits::new(Units::ObjectBoundingBox, Units::UserSpaceOnUse)
    }
}

impl FilterUnits {
    /// Creates new units with an automatic resolution.
    pub fn new(filter_units: Units, primitive_units: Units) -> Self {
        FilterUnits {
            filter_units,
            primitive_units,
            ctm: Transform::default(),
            item_bbox: None,
            filter_area: None,
            render_area: None,
            resolution_x: -1.0,
            resolution_y: -1.0,
            parallel: false,
            automatic_resolution: true,
        }
    }

    /// Sets the user to display transform.
    pub fn set_ctm(&mut self, ctm: Transform) {
        self.ctm = ctm;
    }

    /// Sets the item bounding box in user space.
    pub fn set_item_bbox(&mut self, bbox: Option<Rect>) {
        self.item_bbox = bbox;
    }

    /// Sets the filter effect region in user space.
    pub fn set_filter_area(&mut self, area: Rect) {
        self.filter_area = Some(area);
    }

    /// Sets the rendered area in display space.
    pub fn set_render_area(&mut self, area: IntRect) {
        self.render_area = Some(area);
    }

    /// Sets the filter resolution in pixblock pixels.
    ///
    /// # Panics
    ///
    /// When either value is not positive.
    pub fn set_resolution(&mut self, x: f64, y: f64) {
        assert!(x > 0.0 && y > 0.0);
        self.resolution_x = x;
        self.resolution_y = y;
    }

    /// Makes pixblock space axis-aligned with user space.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Marks the resolution as computed rather than requested.
    pub fn set_automatic_resolution(&mut self, automatic: bool) {
        self.automatic_resolution = automatic;
    }

    /// Returns the filter region units.
    #[inline]
    pub fn filter_units(&self) -> Units {
        self.filter_units
    }

    /// Returns the primitive subregion units.
    #[inline]
    pub fn primitive_units(&self) -> Units {
        self.primitive_units
    }

    /// Returns the user to display transform.
    #[inline]
    pub fn ctm(&self) -> Transform {
        self.ctm
    }

    /// Returns the item bounding box.
    #[inline]
    pub fn item_bbox(&self) -> Option<Rect> {
        self.item_bbox
    }

    /// Returns the filter effect region.
    #[inline]
    pub fn filter_area(&self) -> Option<Rect> {
        self.filter_area
    }

    /// Returns the rendered area.
    #[inline]
    pub fn render_area(&self) -> Option<IntRect> {
        self.render_area
    }

    /// Returns the user to pixblock transform.
    pub fn user2pb(&self) -> Transform {
        let area = match self.filter_area {
            Some(v) if self.resolution_x > 0.0 && self.resolution_y > 0.0 => v,
            _ => return Transform::default(),
        };

        let mut ts = self.ctm;
        if self.parallel || !self.automatic_resolution {
            ts.a = self.resolution_x / area.width();
            ts.b = 0.0;
            ts.c = 0.0;
            ts.d = self.resolution_y / area.height();
        }

        ts
    }

    /// Returns the `units` to pixblock transform.
    pub fn units2pb(&self, units: Units) -> Transform {
        match (units, self.item_bbox) {
            (Units::ObjectBoundingBox, Some(bbox)) => {
                Transform::new(bbox.width(), 0.0, 0.0, bbox.height(), bbox.left(), bbox.top())
                    .then(&self.user2pb())
            }
            _ => self.user2pb(),
        }
    }

    /// Returns the filter units to pixblock transform.
    #[inline]
    pub fn filterunits2pb(&self) -> Transform {
        self.units2pb(self.filter_units)
    }

    /// Returns the primitive units to pixblock transform.
    #[inline]
    pub fn primitiveunits2pb(&self) -> Transform {
        self.units2pb(self.primitive_units)
    }

    /// Returns the display to pixblock transform.
    pub fn display2pb(&self) -> Transform {
        match self.ctm.invert() {
            Some(inv) => inv.then(&self.user2pb()),
            None => self.user2pb(),
        }
    }

    /// Returns the pixblock to display transform.
    pub fn pb2display(&self) -> Transform {
        match self.user2pb().invert() {
            Some(inv) => inv.then(&self.ctm),
            None => self.ctm,
        }
    }

    /// Returns the transform from the rendered item into the slot box.
    ///
    /// `None` when pixblock space is a translation of display space.
    pub fn item2filter(&self) -> Option<Transform> {
        let ts = self.display2pb();
        let render_area = self.render_area?;
        let slot_box = self.slot_box()?;
        if ts.is_translation() {
            return None;
        }

        Some(
            Transform::new_translate(render_area.left() as f64, render_area.top() as f64)
                .then(&ts)
                .then(&Transform::new_translate(-slot_box.left(), -slot_box.top())),
        )
    }

    /// Returns the user to `units` transform.
    pub fn user2units(&self, units: Units) -> Transform {
        match (units, self.item_bbox) {
            (Units::ObjectBoundingBox, Some(bbox)) => {
                let sx = 1.0 / bbox.width();
                let sy = 1.0 / bbox.height();
                Transform::new(sx, 0.0, 0.0, sy, -bbox.left() * sx, -bbox.top() * sy)
            }
            _ => Transform::default(),
        }
    }

    /// Returns the user to filter units transform.
    #[inline]
    pub fn user2filterunits(&self) -> Transform {
        self.user2units(self.filter_units)
    }

    /// Returns the user to primitive units transform.
    #[inline]
    pub fn user2primitiveunits(&self) -> Transform {
        self.user2units(self.primitive_units)
    }

    /// Returns the filter region in pixblock space, rounded outwards.
    pub fn pixblock_filter_area(&self) -> Option<IntRect> {
        let area = self.filter_area?;
        Some(area.transform(&self.user2pb()).round_out())
    }

    /// Returns the rendered area in pixblock space.
    ///
    /// This is the area covered by every slot surface.
    pub fn slot_box(&self) -> Option<Rect> {
        let area = self.render_area?.to_rect();
        let ts = self.display2pb();
        let r = area.transform(&ts);
        if ts.is_translation() {
            Some(Rect::from_xywh(r.left(), r.top(), area.width().ceil(), area.height().ceil()))
        } else {
            Some(Rect::from_xywh(r.left(), r.top(), snapped_ceil(r.width()), snapped_ceil(r.height())))
        }
    }
}

/// Rounds up, ignoring rounding noise around integers.
fn snapped_ceil(v: f64) -> f64 {
    let r = v.round();
    if v.fuzzy_eq(&r) { r } else { v.ceil() }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn units(ctm: Transform) -> FilterUnits {
        let mut u = FilterUnits::default();
        u.set_ctm(ctm);
        u.set_item_bbox(Some(Rect::from_xywh(10.0, 20.0, 100.0, 50.0)));
        u.set_filter_area(Rect::from_xywh(0.0, 10.0, 120.0, 60.0));
        u.set_render_area(IntRect::from_xywh(0, 0, 200, 100));
        u.set_resolution(240.0, 60.0);
        u
    }

    #[test]
    fn translation_ctm() {
        let u = units(Transform::new_translate(5.0, 5.0));
        assert!(u.user2pb().fuzzy_eq(&Transform::new_translate(5.0, 5.0)));
        assert!(u.display2pb().is_identity());
        assert!(u.item2filter().is_none());
        assert_eq!(u.slot_box(), Some(Rect::from_xywh(0.0, 0.0, 200.0, 100.0)));
    }

    #[test]
    fn explicit_resolution() {
        let mut u = units(Transform::new_scale(3.0, 3.0));
        u.set_automatic_resolution(false);
        let ts = u.user2pb();
        assert!(ts.fuzzy_eq(&Transform::new_scale(2.0, 1.0)));
        assert!(u.item2filter().is_some());
        assert_eq!(u.pixblock_filter_area(), Some(IntRect::new(0, 10, 240, 70)));
    }

    #[test]
    fn bbox_units() {
        let u = units(Transform::default());
        let ts = u.units2pb(Units::ObjectBoundingBox);
        assert_eq!(ts.apply(0.0, 0.0), (10.0, 20.0));
        assert_eq!(ts.apply(1.0, 1.0), (110.0, 70.0));

        let back = u.user2units(Units::ObjectBoundingBox);
        let (x, y) = back.apply(110.0, 70.0);
        assert!((x - 1.0).abs() < 1e-9 && (y - 1.0).abs() < 1e-9);
        assert!(u.user2units(Units::UserSpaceOnUse).is_identity());
    }

    #[test]
    fn no_resolution() {
        let mut u = FilterUnits::default();
        u.set_ctm(Transform::new_scale(2.0, 2.0));
        assert!(u.user2pb().is_identity());
    }

    #[test]
    fn rotated_slot_box() {
        let mut u = units(Transform::new_rotate(90.0));
        u.set_parallel(true);
        // The rotation leaves ~1e-16 residue that must not add a pixel.
        let sbox = u.slot_box().unwrap();
        assert_eq!(sbox.width(), 200.0);
        assert!(u.item2filter().is_some());
        assert!(u.pb2display().then(&u.display2pb()).is_identity());
    }
}
