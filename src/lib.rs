// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
`filterfx` is an SVG filter effects engine.

A [`Filter`] is an ordered list of primitives plus a filter region.
It takes a rendered item as a [`pixelfx::Surface`], runs the primitives
in a resolution-independent pixblock space and writes the result back.

```
use filterfx::{Filter, GaussianBlur, IntRect, Offset, RenderOptions, Transform};
use filterfx::pixelfx::Surface;

let mut filter = Filter::new();
filter.add_primitive(Box::new(GaussianBlur::new(2.0)));
filter.add_primitive(Box::new(Offset::new(3.0, 3.0)));

let mut image = Surface::new(64, 64, 1, None);
filter.render(
    IntRect::from_xywh(0, 0, 64, 64),
    Transform::default(),
    Some(filterfx::Rect::from_xywh(8.0, 8.0, 48.0, 48.0)),
    &mut image,
    None,
    &RenderOptions::default(),
);
```
*/

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

pub use pixelfx;

mod context;
mod filter;
mod geom;

pub use crate::context::{Context, Operator};
pub use crate::filter::*;
pub use crate::geom::{IntRect, Point, Rect, Transform};
