// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::rc::Rc;

use pixelfx::{ColorContext, ColorSpace, Surface};

use super::units::FilterUnits;
use super::RenderOptions;
use crate::context::{Context, Operator};
use crate::geom::{Rect, Transform};

/// A filter slot key.
///
/// Negative values are reserved for the built-in inputs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum SlotKey {
    /// The previous primitive result.
    NotSet,
    /// The filtered item.
    SourceImage,
    /// The alpha of the filtered item.
    SourceAlpha,
    /// The content behind the filtered item.
    BackgroundImage,
    /// The alpha of the background.
    BackgroundAlpha,
    /// The fill paint of the item.
    FillPaint,
    /// The stroke paint of the item.
    StrokePaint,
    /// The untransformed source, reused for the final result.
    Result,
    /// A result without a name.
    Unnamed,
    /// A named result.
    Named(u32),
}

impl SlotKey {
    /// Returns the integer value of the key.
    pub fn value(self) -> i64 {
        match self {
            SlotKey::NotSet => -1,
            SlotKey::SourceImage => -2,
            SlotKey::SourceAlpha => -3,
            SlotKey::BackgroundImage => -4,
            SlotKey::BackgroundAlpha => -5,
            SlotKey::FillPaint => -6,
            SlotKey::StrokePaint => -7,
            SlotKey::Result => -8,
            SlotKey::Unnamed => -9,
            SlotKey::Named(n) => n as i64,
        }
    }

    /// Creates a key from its integer value.
    pub fn from_value(value: i64) -> Option<Self> {
        let key = match value {
            -1 => SlotKey::NotSet,
            -2 => SlotKey::SourceImage,
            -3 => SlotKey::SourceAlpha,
            -4 => SlotKey::BackgroundImage,
            -5 => SlotKey::BackgroundAlpha,
            -6 => SlotKey::FillPaint,
            -7 => SlotKey::StrokePaint,
            -8 => SlotKey::Result,
            -9 => SlotKey::Unnamed,
            n if n >= 0 && n <= u32::MAX as i64 => SlotKey::Named(n as u32),
            _ => return None,
        };

        Some(key)
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        SlotKey::NotSet
    }
}


/// Intermediate results of a single filter evaluation.
///
/// Every stored surface covers the slot box.
pub struct Slot<'a> {
    slots: HashMap<SlotKey, Rc<Surface>>,
    areas: HashMap<SlotKey, Rect>,
    last_out: SlotKey,
    options: &'a RenderOptions,
    units: &'a FilterUnits,
}

impl<'a> Slot<'a> {
    /// Creates an empty slot registry.
    pub fn new(options: &'a RenderOptions, units: &'a FilterUnits) -> Self {
        Slot {
            slots: HashMap::new(),
            areas: HashMap::new(),
            last_out: SlotKey::SourceImage,
            options,
            units,
        }
    }

    /// Returns render options.
    #[inline]
    pub fn options(&self) -> &'a RenderOptions {
        self.options
    }

    /// Returns coordinate systems of this evaluation.
    #[inline]
    pub fn units(&self) -> &'a FilterUnits {
        self.units
    }

    /// Returns the color conversion context.
    #[inline]
    pub fn color_context(&self) -> &'a ColorContext {
        &self.options.color
    }

    /// Returns the number of stored surfaces.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Checks that nothing is stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns a stored surface.
    ///
    /// `NotSet` resolves to the last output.
    pub fn get(&self, key: SlotKey) -> Option<Rc<Surface>> {
        let key = if key == SlotKey::NotSet { self.last_out } else { key };
        self.slots.get(&key).cloned()
    }

    /// Returns a stored surface in the specified space.
    ///
    /// A converted copy is returned when spaces differ.
    /// The stored surface is never changed.
    pub fn get_in(&self, key: SlotKey, space: Option<&ColorSpace>) -> Option<Rc<Surface>> {
        let surface = self.get(key)?;
        if surface.is_in(space) {
            return Some(surface);
        }

        Some(Rc::new(surface.converted_to_color_space(space, self.color_context())))
    }

    /// Returns an owned copy of a stored surface.
    pub fn get_copy(&self, key: SlotKey) -> Option<Surface> {
        self.get(key).map(|s| (*s).clone())
    }

    /// Returns an owned copy of a stored surface in the specified space.
    pub fn get_copy_in(&self, key: SlotKey, space: Option<&ColorSpace>) -> Option<Surface> {
        let surface = self.get(key)?;
        if surface.is_in(space) {
            Some((*surface).clone())
        } else {
            Some(surface.converted_to_color_space(space, self.color_context()))
        }
    }

    /// Stores a surface.
    ///
    /// `NotSet` stores as `Unnamed`. Only named results become the last output.
    ///
    /// The source and background images are repainted into pixblock space
    /// when it isn't a translation of display space.
    pub fn set(&mut self, key: SlotKey, surface: Rc<Surface>) {
        let key = if key == SlotKey::NotSet { SlotKey::Unnamed } else { key };

        let mut surface = surface;
        if key == SlotKey::SourceImage || key == SlotKey::BackgroundImage {
            if let (Some(ts), Some(sbox)) = (self.units.item2filter(), self.units.slot_box()) {
                let mut tsg = surface.similar_sized(sbox.width().ceil() as u32, sbox.height().ceil() as u32);
                let mut ctx = Context::new(&mut tsg);
                ctx.set_transform(ts);
                ctx.paint_surface(&surface, 0.0, 0.0, Operator::Source);

                // The source surface has the right size and format for the result.
                if key == SlotKey::SourceImage {
                    self.slots.insert(SlotKey::Result, surface);
                }
                surface = Rc::new(tsg);
            }
        }

        self.slots.insert(key, surface);

        if key.value() > SlotKey::NotSet.value() {
            self.last_out = key;
        }
    }

    /// Returns a result in the source image space and display orientation.
    pub fn get_result(&self, key: SlotKey) -> Option<Rc<Surface>> {
        let source = self.slots.get(&SlotKey::SourceImage)?;
        let result = self.get_in(key, source.color_space())?;

        if let Some(ts) = self.units.item2filter() {
            let cached = self.slots.get(&SlotKey::Result)?;
            let inv = ts.invert()?;
            let mut output = cached.similar();
            let mut ctx = Context::new(&mut output);
            ctx.set_transform(inv);
            ctx.paint_surface(&result, 0.0, 0.0, Operator::Source);
            return Some(Rc::new(output));
        }

        Some(result)
    }

    /// Stores an alpha-only copy of `from` as `to`.
    pub fn set_alpha(&mut self, from: SlotKey, to: SlotKey) {
        match self.get(from) {
            Some(surface) => {
                let alpha = surface.converted_to_color_space(Some(&ColorSpace::Alpha), self.color_context());
                self.set(to, Rc::new(alpha));
            }
            None => {
                log::error!(
                    "Cannot extract alpha from {:?} into {:?}: source image is missing.",
                    from, to
                );
            }
        }
    }

    /// Records a primitive area in user space.
    pub fn set_primitive_area(&mut self, key: SlotKey, area: Rect) {
        let key = if key == SlotKey::NotSet { SlotKey::Unnamed } else { key };
        self.areas.insert(key, area);
    }

    /// Returns a primitive area in user space.
    ///
    /// Falls back to the filter effect region.
    pub fn get_primitive_area(&self, key: SlotKey) -> Rect {
        let key = if key == SlotKey::NotSet { self.last_out } else { key };
        match self.areas.get(&key) {
            Some(area) => *area,
            None => self.units.filter_area().unwrap_or_else(|| Rect::from_xywh(0.0, 0.0, 0.0, 0.0)),
        }
    }

    /// Returns the device scale of new surfaces.
    #[inline]
    pub fn device_scale(&self) -> u32 {
        self.options.device_scale.max(1)
    }

    /// Returns the slot box origin as a translation.
    pub(crate) fn slot_origin(&self) -> Transform {
        match self.units.slot_box() {
            Some(sbox) => Transform::new_translate(-sbox.left(), -sbox.top()),
            None => Transform::default(),
        }
    }
}
