// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use pixelfx::{FuzzyEq, FuzzyZero};

/// A 2D point.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Default, Debug)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// Returns the distance to another point.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}


/// An affine transform.
///
/// Maps `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`.
#[derive(Clone, Copy, PartialEq, Debug)]
#[allow(missing_docs)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    /// Constructs a new transform.
    #[inline]
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Transform { a, b, c, d, e, f }
    }

    /// Constructs a new translate transform.
    #[inline]
    pub fn new_translate(x: f64, y: f64) -> Self {
        Transform::new(1.0, 0.0, 0.0, 1.0, x, y)
    }

    /// Constructs a new scale transform.
    #[inline]
    pub fn new_scale(sx: f64, sy: f64) -> Self {
        Transform::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Constructs a new rotate transform.
    #[inline]
    pub fn new_rotate(angle: f64) -> Self {
        let v = angle.to_radians();
        Transform::new(v.cos(), v.sin(), -v.sin(), v.cos(), 0.0, 0.0)
    }

    /// Appends transform to the current transform.
    ///
    /// `other` is applied first.
    #[inline]
    pub fn append(&mut self, other: &Transform) {
        *self = multiply(self, other);
    }

    /// Prepends transform to the current transform.
    ///
    /// `other` is applied last.
    #[inline]
    pub fn prepend(&mut self, other: &Transform) {
        *self = multiply(other, self);
    }

    /// Returns a transform that applies `self` and then `other`.
    #[inline]
    pub fn then(&self, other: &Transform) -> Transform {
        multiply(other, self)
    }

    /// Returns an inverted transform.
    ///
    /// Returns `None` for a degenerate transform.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det.is_fuzzy_zero() || !det.is_finite() {
            return None;
        }

        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        let e = -(a * self.e + c * self.f);
        let f = -(b * self.e + d * self.f);
        Some(Transform::new(a, b, c, d, e, f))
    }

    /// Checks that the linear part is the identity.
    pub fn is_translation(&self) -> bool {
           are_near(self.a, 1.0)
        && are_near(self.b, 0.0)
        && are_near(self.c, 0.0)
        && are_near(self.d, 1.0)
    }

    /// Checks that the transform is the identity.
    pub fn is_identity(&self) -> bool {
        self.is_translation() && are_near(self.e, 0.0) && are_near(self.f, 0.0)
    }

    /// Returns the length of the transformed X unit vector.
    #[inline]
    pub fn expansion_x(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Returns the length of the transformed Y unit vector.
    #[inline]
    pub fn expansion_y(&self) -> f64 {
        self.c.hypot(self.d)
    }

    /// Returns the square root of the absolute determinant.
    #[inline]
    pub fn descrim(&self) -> f64 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }

    /// Applies transform to selected coordinates.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y + self.e, self.b * x + self.d * y + self.f)
    }

    /// Applies transform to a point.
    #[inline]
    pub fn apply_point(&self, p: Point) -> Point {
        let (x, y) = self.apply(p.x, p.y);
        Point::new(x, y)
    }

    /// Applies only the linear part to a vector.
    #[inline]
    pub fn apply_vector(&self, x: f64, y: f64) -> (f64, f64) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    /// Converts into a `tiny-skia` transform.
    pub fn to_tiny_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.a as f32, self.b as f32, self.c as f32,
            self.d as f32, self.e as f32, self.f as f32,
        )
    }
}

#[inline]
fn are_near(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

#[inline(never)]
fn multiply(ts1: &Transform, ts2: &Transform) -> Transform {
    Transform {
        a: ts1.a * ts2.a + ts1.c * ts2.b,
        b: ts1.b * ts2.a + ts1.d * ts2.b,
        c: ts1.a * ts2.c + ts1.c * ts2.d,
        d: ts1.b * ts2.c + ts1.d * ts2.d,
        e: ts1.a * ts2.e + ts1.c * ts2.f + ts1.e,
        f: ts1.b * ts2.e + ts1.d * ts2.f + ts1.f,
    }
}

impl Default for Transform {
    #[inline]
    fn default() -> Transform {
        Transform::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
}

impl FuzzyEq for Transform {
    fn fuzzy_eq(&self, other: &Self) -> bool {
           self.a.fuzzy_eq(&other.a)
        && self.b.fuzzy_eq(&other.b)
        && self.c.fuzzy_eq(&other.c)
        && self.d.fuzzy_eq(&other.d)
        && self.e.fuzzy_eq(&other.e)
        && self.f.fuzzy_eq(&other.f)
    }
}


/// A rect representation.
///
/// Stored as two corners. Can be empty, but never inverted.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Rect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Rect {
    /// Creates a new rect from two corners.
    ///
    /// Corners are sorted.
    #[inline]
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect { x0: x0.min(x1), y0: y0.min(y1), x1: x0.max(x1), y1: y0.max(y1) }
    }

    /// Creates a new rect from a position and a size.
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect::new(x, y, x + width, y + height)
    }

    /// Returns the left edge.
    #[inline]
    pub fn left(&self) -> f64 {
        self.x0
    }

    /// Returns the top edge.
    #[inline]
    pub fn top(&self) -> f64 {
        self.y0
    }

    /// Returns the right edge.
    #[inline]
    pub fn right(&self) -> f64 {
        self.x1
    }

    /// Returns the bottom edge.
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y1
    }

    /// Returns the top-left corner.
    #[inline]
    pub fn min(&self) -> Point {
        Point::new(self.x0, self.y0)
    }

    /// Returns the bottom-right corner.
    #[inline]
    pub fn max(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Checks that the rect has no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width().is_fuzzy_zero() || self.height().is_fuzzy_zero()
    }

    /// Returns the bounding box of the transformed rect.
    pub fn transform(&self, ts: &Transform) -> Rect {
        let corners = [
            ts.apply(self.x0, self.y0),
            ts.apply(self.x1, self.y0),
            ts.apply(self.x0, self.y1),
            ts.apply(self.x1, self.y1),
        ];

        let (mut x0, mut y0) = corners[0];
        let (mut x1, mut y1) = corners[0];
        for (x, y) in &corners[1..] {
            x0 = x0.min(*x);
            y0 = y0.min(*y);
            x1 = x1.max(*x);
            y1 = y1.max(*y);
        }

        Rect { x0, y0, x1, y1 }
    }

    /// Returns the intersection of two rects.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x0 = self.x0.max(other.x0);
        let y0 = self.y0.max(other.y0);
        let x1 = self.x1.min(other.x1);
        let y1 = self.y1.min(other.y1);
        if x0 < x1 && y0 < y1 {
            Some(Rect { x0, y0, x1, y1 })
        } else {
            None
        }
    }

    /// Returns the smallest integer rect containing this one.
    pub fn round_out(&self) -> IntRect {
        IntRect::new(
            self.x0.floor() as i32,
            self.y0.floor() as i32,
            self.x1.ceil() as i32,
            self.y1.ceil() as i32,
        )
    }
}


/// An integer rect representation.
///
/// Stored as two corners. Can be empty, but never inverted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IntRect {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl IntRect {
    /// Creates a new rect from two corners.
    ///
    /// Corners are sorted.
    #[inline]
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        IntRect { x0: x0.min(x1), y0: y0.min(y1), x1: x0.max(x1), y1: y0.max(y1) }
    }

    /// Creates a new rect from a position and a size.
    #[inline]
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        IntRect::new(x, y, x.saturating_add(width as i32), y.saturating_add(height as i32))
    }

    /// Returns the left edge.
    #[inline]
    pub fn left(&self) -> i32 {
        self.x0
    }

    /// Returns the top edge.
    #[inline]
    pub fn top(&self) -> i32 {
        self.y0
    }

    /// Returns the right edge.
    #[inline]
    pub fn right(&self) -> i32 {
        self.x1
    }

    /// Returns the bottom edge.
    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y1
    }

    /// Returns the width.
    #[inline]
    pub fn width(&self) -> u32 {
        (self.x1 as i64 - self.x0 as i64) as u32
    }

    /// Returns the height.
    #[inline]
    pub fn height(&self) -> u32 {
        (self.y1 as i64 - self.y0 as i64) as u32
    }

    /// Grows the rect by `dx` horizontally and `dy` vertically on each side.
    pub fn expand_by(&mut self, dx: i32, dy: i32) {
        *self = IntRect::new(
            self.x0.saturating_sub(dx),
            self.y0.saturating_sub(dy),
            self.x1.saturating_add(dx),
            self.y1.saturating_add(dy),
        );
    }

    /// Grows the rect to contain `other`.
    pub fn union_with(&mut self, other: &IntRect) {
        self.x0 = self.x0.min(other.x0);
        self.y0 = self.y0.min(other.y0);
        self.x1 = self.x1.max(other.x1);
        self.y1 = self.y1.max(other.y1);
    }

    /// Converts into a float rect.
    #[inline]
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x0 as f64, self.y0 as f64, self.x1 as f64, self.y1 as f64)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn then_order() {
        let ts = Transform::new_scale(2.0, 2.0).then(&Transform::new_translate(10.0, 0.0));
        assert_eq!(ts.apply(1.0, 1.0), (12.0, 2.0));

        let mut ts2 = Transform::new_scale(2.0, 2.0);
        ts2.append(&Transform::new_translate(10.0, 0.0));
        assert_eq!(ts2.apply(1.0, 1.0), (22.0, 2.0));
    }

    #[test]
    fn invert() {
        let ts = Transform::new(2.0, 1.0, -1.0, 3.0, 5.0, -7.0);
        let inv = ts.invert().unwrap();
        assert!(ts.then(&inv).is_identity());
        assert!(Transform::new_scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn expansion() {
        let ts = Transform::new_rotate(30.0).then(&Transform::new_scale(2.0, 3.0));
        assert!((Transform::new_rotate(30.0).expansion_x() - 1.0).abs() < 1e-9);
        assert!((ts.descrim() - 6.0f64.sqrt()).abs() < 1e-9);
        assert!(Transform::new_translate(3.0, 4.0).is_translation());
        assert!(!Transform::new_scale(1.0, 2.0).is_translation());
    }

    #[test]
    fn rect_transform() {
        let r = Rect::from_xywh(0.0, 0.0, 10.0, 20.0);
        let t = r.transform(&Transform::new_rotate(90.0));
        assert!((t.left() + 20.0).abs() < 1e-9);
        assert!((t.width() - 20.0).abs() < 1e-9);
        assert!((t.height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn int_rect() {
        let mut r = IntRect::from_xywh(0, 0, 10, 10);
        r.expand_by(2, 3);
        assert_eq!(r, IntRect::new(-2, -3, 12, 13));
        r.union_with(&IntRect::new(20, 0, 21, 1));
        assert_eq!(r.width(), 23);
        assert_eq!(Rect::new(0.5, 0.5, 1.2, 2.0).round_out(), IntRect::new(0, 0, 2, 2));
    }
}
