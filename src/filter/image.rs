// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use pixelfx::Surface;

use super::{Primitive, PrimitiveBase, RenderOptions, Slot, SlotKey};
use crate::context::Context;
use crate::geom::{IntRect, Point, Rect, Transform};

/// A callback that renders an external item.
///
/// The context maps item coordinates into the image. The rect is
/// the item box rounded outwards.
pub type RenderFn = Arc<dyn Fn(&mut Context, &RenderOptions, IntRect) + Send + Sync>;

/// An image alignment inside a viewport.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Align {
    None,
    XMinYMin,
    XMidYMin,
    XMaxYMin,
    XMinYMid,
    XMidYMid,
    XMaxYMid,
    XMinYMax,
    XMidYMax,
    XMaxYMax,
}

impl Align {
    /// Returns fractions of the free space placed before the image.
    fn factors(self) -> Option<(f64, f64)> {
        match self {
            Align::None => None,
            Align::XMinYMin => Some((0.0, 0.0)),
            Align::XMidYMin => Some((0.5, 0.0)),
            Align::XMaxYMin => Some((1.0, 0.0)),
            Align::XMinYMid => Some((0.0, 0.5)),
            Align::XMidYMid => Some((0.5, 0.5)),
            Align::XMaxYMid => Some((1.0, 0.5)),
            Align::XMinYMax => Some((0.0, 1.0)),
            Align::XMidYMax => Some((0.5, 1.0)),
            Align::XMaxYMax => Some((1.0, 1.0)),
        }
    }
}

/// A `preserveAspectRatio` value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AspectRatio {
    /// Image alignment.
    pub align: Align,
    /// `slice` when set, `meet` otherwise.
    pub slice: bool,
}

impl Default for AspectRatio {
    fn default() -> Self {
        AspectRatio { align: Align::XMidYMid, slice: false }
    }
}


/// An `feImage` primitive.
#[derive(Clone, Default)]
pub struct Image {
    /// Shared parameters. `base.input` is unused.
    pub base: PrimitiveBase,
    /// Aspect ratio handling for external images.
    pub aspect: AspectRatio,
    /// Renders a referenced element in user space, without aspect ratio mapping.
    pub from_element: bool,
    item_box: Option<Rect>,
    render: Option<RenderFn>,
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Image")
            .field("base", &self.base)
            .field("aspect", &self.aspect)
            .field("from_element", &self.from_element)
            .field("item_box", &self.item_box)
            .finish()
    }
}

impl Image {
    /// Creates a new image of an item with the specified box.
    pub fn new(item_box: Rect, render: RenderFn) -> Self {
        Image {
            item_box: Some(item_box),
            render: Some(render),
            ..Image::default()
        }
    }

    /// Sets the item box.
    pub fn set_item_box(&mut self, item_box: Option<Rect>) {
        self.item_box = item_box;
    }

    /// Sets the render callback.
    pub fn set_render_fn(&mut self, render: RenderFn) {
        self.render = Some(render);
    }
}

impl Primitive for Image {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let (item_box, render) = match (self.item_box, self.render.as_ref()) {
            (Some(b), Some(r)) => (b, r),
            _ => return,
        };

        let units = slot.units();
        let vp = self.base.filter_primitive_area(units);
        slot.set_primitive_area(self.base.output, vp);

        let (mut x, mut y) = (vp.left(), vp.top());
        let (mut width, mut height) = (vp.width(), vp.height());

        // A zero size means the size of the bounding box.
        if width == 0.0 || height == 0.0 {
            let m = units.user2filterunits().invert().unwrap_or_default();
            let origin = m.apply_point(Point::new(0.0, 0.0));
            if width == 0.0 {
                width = origin.distance(m.apply_point(Point::new(1.0, 0.0)));
            }
            if height == 0.0 {
                height = origin.distance(m.apply_point(Point::new(0.0, 1.0)));
            }
        }

        let sa = match units.slot_box() {
            Some(v) => v,
            None => return,
        };

        let space = match self.base.color_space {
            Some(ref space) => Some(space.clone()),
            None => slot.get(SlotKey::SourceImage).and_then(|s| s.color_space().cloned()),
        };
        let mut out = Surface::new(
            sa.width().round() as u32,
            sa.height().round() as u32,
            slot.device_scale(),
            space,
        );

        {
            let mut ctx = Context::new(&mut out);
            ctx.set_transform(units.user2pb().then(&slot.slot_origin()));

            let render_rect = item_box.round_out();
            if self.from_element {
                ctx.translate(x, y);
            } else {
                let (image_width, image_height) = (item_box.width(), item_box.height());
                if let Some((ax, ay)) = self.aspect.align.factors() {
                    let vp_aspect = height / width;
                    let aspect = image_height / image_width;
                    let taller = vp_aspect < aspect;

                    if self.aspect.slice {
                        if taller {
                            y -= ay * (width * aspect - height);
                            height = width * aspect;
                        } else {
                            x -= ax * (height / aspect - width);
                            width = height / aspect;
                        }
                    } else if taller {
                        x += ax * (width - height / aspect);
                        width = height / aspect;
                    } else {
                        y += ay * (height - width * aspect);
                        height = width * aspect;
                    }
                }

                ctx.translate(x, y);
                ctx.scale(width / image_width, height / image_height);
            }

            render(&mut ctx, slot.options(), render_rect);
        }

        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        1.1
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }

    fn uses_input(&self, _: SlotKey) -> bool {
        false
    }
}
