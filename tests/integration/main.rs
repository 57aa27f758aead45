use std::sync::Arc;

use filterfx::pixelfx::{BlurQuality, Color, ColorSpace, EdgeMode, Surface};
use filterfx::{Context, Filter, IntRect, Length, Operator, Rect, RenderOptions, Transform, Units};
use once_cell::sync::Lazy;
use rgb::{FromSlice, RGBA8};

mod properties;
mod render;

const IMAGE_SIZE: u32 = 32;

static OPTIONS: Lazy<RenderOptions> = Lazy::new(|| RenderOptions {
    blur_quality: BlurQuality::Best,
    ..RenderOptions::default()
});

static POOL: Lazy<Arc<rayon::ThreadPool>> = Lazy::new(|| {
    Arc::new(rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap())
});

/// A filter with a user space region covering the whole image.
pub fn user_space_filter() -> Filter {
    let mut filter = Filter::new();
    filter.set_filter_units(Units::UserSpaceOnUse);
    filter.set_x(Length::Number(0.0));
    filter.set_y(Length::Number(0.0));
    filter.set_width(Length::Number(IMAGE_SIZE as f64));
    filter.set_height(Length::Number(IMAGE_SIZE as f64));
    filter
}

/// An image with a single filled square.
pub fn square(space: Option<ColorSpace>, rect: Rect, color: Color) -> Surface {
    let mut image = Surface::new(IMAGE_SIZE, IMAGE_SIZE, 1, space);
    Context::new(&mut image).fill_rect(rect, color, Operator::Source);
    image
}

pub fn red_square() -> Surface {
    square(None, Rect::from_xywh(8.0, 8.0, 8.0, 8.0), Color::rgba(1.0, 0.0, 0.0, 1.0))
}

pub fn render(filter: &Filter, image: &mut Surface, background: Option<&Surface>) {
    render_with(filter, Transform::default(), image, background, &OPTIONS);
}

pub fn render_with(
    filter: &Filter,
    ts: Transform,
    image: &mut Surface,
    background: Option<&Surface>,
    options: &RenderOptions,
) {
    let (w, h) = (image.width(), image.height());
    filter.render(
        IntRect::from_xywh(0, 0, w, h),
        ts,
        Some(Rect::from_xywh(8.0, 8.0, 8.0, 8.0)),
        image,
        background,
        options,
    );
}

/// Returns a premultiplied pixel of a legacy surface.
pub fn pixel(image: &Surface, x: u32, y: u32) -> RGBA8 {
    match image.rgba8_data() {
        Some(data) => data.as_rgba()[(y * image.pixel_width() + x) as usize],
        None => RGBA8::new(0, 0, 0, 0),
    }
}

/// Returns an unpremultiplied color of a float surface.
pub fn color(image: &Surface, x: i32, y: i32) -> Color {
    image.access(EdgeMode::Error).color_at(x, y, true)
}
