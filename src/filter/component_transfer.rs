// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::rc::Rc;

use pixelfx::{component_transfer, EdgeMode, TransferFunction};

use super::{Primitive, PrimitiveBase, Slot};
use crate::geom::Transform;

/// A transfer function of a single channel.
#[allow(missing_docs)]
#[derive(Clone, PartialEq, Debug, Default)]
pub enum TransferKind {
    #[default]
    Identity,
    Table(Vec<f64>),
    Discrete(Vec<f64>),
    Linear {
        slope: f64,
        intercept: f64,
    },
    Gamma {
        amplitude: f64,
        exponent: f64,
        offset: f64,
    },
}

impl TransferKind {
    fn as_function(&self) -> TransferFunction {
        match *self {
            TransferKind::Identity => TransferFunction::Identity,
            TransferKind::Table(ref values) => TransferFunction::Table(values),
            TransferKind::Discrete(ref values) => TransferFunction::Discrete(values),
            TransferKind::Linear { slope, intercept } => {
                TransferFunction::Linear { slope, intercept }
            }
            TransferKind::Gamma { amplitude, exponent, offset } => {
                TransferFunction::Gamma { amplitude, exponent, offset }
            }
        }
    }
}

/// An `feComponentTransfer` primitive.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default)]
pub struct ComponentTransfer {
    /// Shared parameters.
    pub base: PrimitiveBase,
    pub func_r: TransferKind,
    pub func_g: TransferKind,
    pub func_b: TransferKind,
    pub func_a: TransferKind,
}

impl Primitive for ComponentTransfer {
    impl_base!();

    fn render(&self, slot: &mut Slot) {
        let input = match self.base.input(slot, self.base.input) {
            Some(v) => v,
            None => return,
        };

        let channels = [
            self.func_r.as_function(),
            self.func_g.as_function(),
            self.func_b.as_function(),
        ];

        let mut out = input.similar();
        component_transfer(
            &channels,
            self.func_a.as_function(),
            &input.access(EdgeMode::NoCheck),
            &mut out.access_mut(EdgeMode::NoCheck),
        );
        slot.set(self.base.output, Rc::new(out));
    }

    fn complexity(&self, _: &Transform) -> f64 {
        2.0
    }

    fn can_handle_affine(&self, _: &Transform) -> bool {
        true
    }
}
