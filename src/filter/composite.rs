// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{arithmetic_composite, EdgeMode};

use super::{Primitive, PrimitiveBase, Slot, SlotKey};
use crate::context::{Context, Operator};
use crate::geom::Transform;

/// A compositing operator of `feComposite`.
#[allow(missing_docs)]
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum CompositeOperator {
    #[default]
    Over,
    In,
    Out,
    Atop,
    Xor,
    Lighter,
    Arithmetic { k1: f64, k2: f64, k3: f64, k4: f64 },
}

/// An `feComposite` primitive.
///
/// Combines `in` with `in2`, where `in` is the source and `in2` the backdrop.
#[derive(Clone, Debug, Default)]
pub struct Composite {
    /// Shared parameters.
    pub base: PrimitiveBase,
    /// The backdrop input.
    pub input2: SlotKey,
    operator: CompositeOperator,
}

impl Composite {
    /// Creates a new composite.
    pub fn new(operator: CompositeOperator) -> Self {
        let mut fe = Composite::default();
        fe.set_operator(operator);
        fe
    }

    /// Returns the operator.
    pub fn operator(&self) -> CompositeOperator {
        self.operator
    }

    /// Sets the operator.
    ///
    /// Arithmetic coefficients are checked like in [`set_arithmetic`](Self::set_arithmetic).
    pub fn set_operator(&mut self, operator: CompositeOperator) {
        match operator {
            CompositeOperator::Arithmetic { k1, k2, k3, k4 } => self.set_arithmetic(k1, k2, k3, k4),
            _ => self.operator = operator,
        }
    }

    /// Switches to the arithmetic operator.
    ///
    /// Non-finite coefficients are ignored.
    pub fn set_arithmetic(&mut self, k1: f64, k2: f64, k3: f64, k4: f64) {
        if !(k1.is_finite() && k2.is_finite() && k3.is_finite() && k4.is_finite()) {
            log::warn!("Non-finite arithmetic composite coefficients are ignored.");
            return;
        }

        self.operator = CompositeOperator::Arithmetic { k1, k2, k3, k4 };
    }
}

impl Primitive for Composite {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let (input1, input2) = match (
            self.base.input(slot, self.base.input),
            self.base.input(slot, self.input2),
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                log::warn!("Composite has a missing input.");
                return;
            }
        };

        let op = match self.operator {
            CompositeOperator::Arithmetic { k1, k2, k3, k4 } => {
                let mut out = input1.similar();
                arithmetic_composite(
                    k1, k2, k3, k4,
                    &input1.access(EdgeMode::Wrap),
                    &input2.access(EdgeMode::Wrap),
                    &mut out.access_mut(EdgeMode::NoCheck),
                );
                slot.set(self.base.output, Rc::new(out));
                return;
            }
            CompositeOperator::Over => Operator::Over,
            CompositeOperator::In => Operator::In,
            CompositeOperator::Out => Operator::Out,
            CompositeOperator::Atop => Operator::Atop,
            CompositeOperator::Xor => Operator::Xor,
            CompositeOperator::Lighter => Operator::Lighter,
        };

        let mut out = (*input2).clone();
        Context::new(&mut out).paint_surface(&input1, 0.0, 0.0, op);
        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        1.1
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }

    fn uses_input(&self, key: SlotKey) -> bool {
        self.base.input == key || self.input2 == key
    }
}
