use float_cmp::approx_eq;

use filterfx::pixelfx::{Color, ColorSpace, MorphologyOperator, Surface};
use filterfx::*;

use crate::*;

const RED: RGBA8 = RGBA8 { r: 255, g: 0, b: 0, a: 255 };
const TRANSPARENT: RGBA8 = RGBA8 { r: 0, g: 0, b: 0, a: 0 };

#[test]
fn empty_filter_clears() {
    let mut image = red_square();
    render(&Filter::new(), &mut image, None);
    assert!(image.rgba8_data().unwrap().iter().all(|v| *v == 0));
}

#[test]
fn invalid_region_keeps_image() {
    // Bounding box units without a bounding box.
    let mut filter = Filter::new();
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));

    let mut image = red_square();
    filter.render(
        IntRect::from_xywh(0, 0, 32, 32),
        Transform::default(),
        None,
        &mut image,
        None,
        &RenderOptions::default(),
    );
    assert_eq!(pixel(&image, 8, 8), RED);
    assert_eq!(pixel(&image, 20, 20), TRANSPARENT);
}

#[test]
fn empty_region_clears() {
    let mut filter = user_space_filter();
    filter.set_width(Length::Number(0.0));
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 10, 10), TRANSPARENT);
}

#[test]
fn offset() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 11, 11), TRANSPARENT);
    assert_eq!(pixel(&image, 12, 12), RED);
    assert_eq!(pixel(&image, 19, 19), RED);
    assert_eq!(pixel(&image, 20, 20), TRANSPARENT);
}

#[test]
fn offset_with_device_scale() {
    let options = RenderOptions { device_scale: 2, ..RenderOptions::default() };
    let mut filter = user_space_filter();
    filter.set_width(Length::Number(16.0));
    filter.set_height(Length::Number(16.0));
    filter.add_primitive(Box::new(Offset::new(2.0, 2.0)));

    let mut image = Surface::new(16, 16, 2, None);
    Context::new(&mut image).fill_rect(
        Rect::from_xywh(4.0, 4.0, 4.0, 4.0),
        Color::rgba(1.0, 0.0, 0.0, 1.0),
        Operator::Source,
    );
    render_with(&filter, Transform::default(), &mut image, None, &options);

    // Logical pixels are 2x2 device pixels.
    assert_eq!(pixel(&image, 11, 11), TRANSPARENT);
    assert_eq!(pixel(&image, 12, 12), RED);
    assert_eq!(pixel(&image, 19, 19), RED);
    assert_eq!(pixel(&image, 20, 20), TRANSPARENT);
}

#[test]
fn offset_in_explicit_pool() {
    let options = RenderOptions { pool: Some(POOL.clone()), ..RenderOptions::default() };
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(Offset::new(-4.0, 0.0)));

    let mut image = red_square();
    render_with(&filter, Transform::default(), &mut image, None, &options);
    assert_eq!(pixel(&image, 4, 8), RED);
    assert_eq!(pixel(&image, 12, 8), TRANSPARENT);
}

#[test]
fn blur() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(GaussianBlur::new(2.0)));

    let mut image = red_square();
    let before: u32 = image.rgba8_data().unwrap().as_rgba().iter().map(|p| p.a as u32).sum();
    render(&filter, &mut image, None);

    assert!(pixel(&image, 12, 12).a > 200);
    let edge = pixel(&image, 6, 12).a;
    assert!(edge > 0 && edge < 128);
    assert_eq!(pixel(&image, 0, 0), TRANSPARENT);

    let after: u32 = image.rgba8_data().unwrap().as_rgba().iter().map(|p| p.a as u32).sum();
    let diff = (before as f64 - after as f64).abs() / before as f64;
    assert!(diff < 0.05);
}

#[test]
fn blur_then_offset() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(GaussianBlur::new(1.0)));
    filter.add_primitive(Box::new(Offset::new(8.0, 0.0)));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 8, 12).a, 0);
    assert!(pixel(&image, 20, 12).a > 200);
}

#[test]
fn rotated_pixblock_round_trip() {
    // A blur forces an axis-aligned pixblock, even without any blurring.
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(GaussianBlur::new(0.0)));

    let space = Some(ColorSpace::LinearRgb);
    let rect = Rect::from_xywh(4.0, 2.0, 10.0, 6.0);
    let color = Color::rgba(0.2, 0.4, 0.6, 1.0);
    let expected = square(space.clone(), rect, color);
    let mut image = square(space, rect, color);

    // A 90 degrees rotation within the image.
    let ts = Transform::new(0.0, 1.0, -1.0, 0.0, 32.0, 0.0);
    render_with(&filter, ts, &mut image, None, &OPTIONS);

    for y in 0..32 {
        for x in 0..32 {
            let (a, b) = (crate::color(&image, x, y), crate::color(&expected, x, y));
            assert!((a.alpha() - b.alpha()).abs() < 1e-4, "alpha at {}x{}", x, y);
        }
    }

    let c = crate::color(&image, 5, 3);
    assert!((c.channels()[1] - 0.4).abs() < 1e-4);
}

#[test]
fn explicit_output() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));
    filter.add_primitive(Box::new(Flood::new(Color::rgba(0.0, 1.0, 0.0, 1.0))));
    filter.set_output(SlotKey::Named(0));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 12, 12), RED);
    assert_eq!(pixel(&image, 2, 2), TRANSPARENT);
}

#[test]
fn last_output_by_default() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));
    filter.add_primitive(Box::new(Flood::new(Color::rgba(0.0, 1.0, 0.0, 1.0))));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 2, 2), RGBA8::new(0, 255, 0, 255));
}

#[test]
fn source_alpha() {
    let mut filter = user_space_filter();
    let mut fe = Offset::new(4.0, 4.0);
    fe.base.input = SlotKey::SourceAlpha;
    filter.add_primitive(Box::new(fe));
    assert!(filter.uses_input(SlotKey::SourceAlpha));

    let mut image = red_square();
    render(&filter, &mut image, None);
    assert_eq!(pixel(&image, 8, 8).a, 0);
    assert_eq!(pixel(&image, 14, 14).a, 255);
}

#[test]
fn background_blend() {
    let mut filter = user_space_filter();
    let mut fe = Blend::new(BlendMode::Normal);
    fe.input2 = SlotKey::BackgroundImage;
    filter.add_primitive(Box::new(fe));

    let background = square(
        None,
        Rect::from_xywh(0.0, 0.0, 32.0, 32.0),
        Color::rgba(0.0, 0.0, 1.0, 1.0),
    );
    let mut image = red_square();
    render(&filter, &mut image, Some(&background));
    assert_eq!(pixel(&image, 10, 10), RED);
    assert_eq!(pixel(&image, 2, 2), RGBA8::new(0, 0, 255, 255));
}

#[test]
fn background_only_when_used() {
    let mut filter = user_space_filter();
    filter.add_primitive(Box::new(Offset::new(4.0, 4.0)));
    assert!(!filter.uses_background());

    let mut fe = Offset::new(0.0, 0.0);
    fe.base.input = SlotKey::BackgroundAlpha;
    filter.add_primitive(Box::new(fe));
    assert!(filter.uses_background());

    let mut filter = user_space_filter();
    let mut fe = Blend::new(BlendMode::Normal);
    fe.input2 = SlotKey::BackgroundImage;
    filter.add_primitive(Box::new(fe));
    assert!(filter.uses_background());
}

#[test]
fn auto_named_outputs() {
    let mut filter = Filter::new();
    filter.add_primitive(Box::new(Offset::new(1.0, 1.0)));
    let mut fe = Offset::new(1.0, 1.0);
    fe.base.output = SlotKey::Named(5);
    filter.add_primitive(Box::new(fe));
    filter.add_primitive(Box::new(Offset::new(1.0, 1.0)));

    let outputs: Vec<_> = filter.primitives().iter().map(|p| p.base().output).collect();
    assert_eq!(outputs, vec![SlotKey::Named(0), SlotKey::Named(5), SlotKey::Named(6)]);
}

#[test]
fn complexity() {
    let mut filter = Filter::new();
    filter.add_primitive(Box::new(Offset::new(1.0, 1.0)));
    filter.add_primitive(Box::new(Composite::new(CompositeOperator::In)));
    assert!(approx_eq!(f64, filter.complexity(&Transform::default()), 1.12, epsilon = 1e-9));
}

#[test]
fn area_enlarge() {
    let mut filter = Filter::new();
    filter.add_primitive(Box::new(Offset::new(3.0, -2.0)));
    filter.add_primitive(Box::new(Morphology::new(MorphologyOperator::Dilate, 2.0)));

    let mut area = IntRect::new(0, 0, 10, 10);
    filter.area_enlarge(&mut area, &Transform::default());
    assert_eq!(area, IntRect::new(-5, -2, 12, 14));
}

#[test]
fn filter_effect_area() {
    let filter = Filter::new();
    let area = filter.filter_effect_area(Some(Rect::from_xywh(10.0, 20.0, 100.0, 50.0))).unwrap();
    assert_eq!(area, Rect::from_xywh(0.0, 15.0, 120.0, 60.0));
    assert!(filter.filter_effect_area(None).is_none());
}

#[test]
fn filter_resolution() {
    let mut filter = Filter::new();
    let area = Rect::from_xywh(0.0, 0.0, 1000.0, 500.0);
    let ts = Transform::default();
    assert_eq!(filter.filter_resolution(area, &ts, Quality::Normal), (256.0, 128.0));
    assert_eq!(filter.filter_resolution(area, &ts, Quality::Best), (1000.0, 500.0));

    filter.set_resolution_xy(100.0, 0.0);
    assert_eq!(filter.filter_resolution(area, &ts, Quality::Worst), (100.0, 50.0));

    filter.set_resolution(-1.0);
    assert_eq!(filter.filter_resolution(area, &ts, Quality::Worst), (100.0, 50.0));

    filter.reset_resolution();
    assert_eq!(filter.filter_resolution(area, &ts, Quality::Worst), (32.0, 16.0));
}
