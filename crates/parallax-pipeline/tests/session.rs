//! Integration tests: drive whole alignment sessions through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use parallax_pipeline::{
    ApplyOutcome, PipelineController, Point, PointerRelease, ProcessingOptions, ScreenPoint, Side,
    Stage, ViewportConfig, ViewportMapper,
};

/// A scene where every pixel encodes its own position.
fn scene(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            u8::try_from(x % 256).unwrap(),
            u8::try_from(y % 256).unwrap(),
            128,
            255,
        ])
    })
}

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

fn view_for(controller: &PipelineController, side: Side) -> ViewportMapper {
    ViewportMapper::new(
        ViewportConfig::default(),
        controller.working().unwrap().dimensions(side),
        240.0,
        180.0,
    )
}

/// Press and release on the screen position of `point` in `view`.
fn click_at(
    controller: &mut PipelineController,
    side: Side,
    view: &mut ViewportMapper,
    point: Point,
) {
    let at = view.viewport().image_to_screen(point);
    view.pointer_down(at);
    match view.pointer_up(at) {
        PointerRelease::Click(p) => assert!(controller.add_point(side, p)),
        other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn full_session_from_encoded_bytes() {
    let left = parallax_pipeline::decode(&png_bytes(&scene(120, 90))).unwrap();
    let right = parallax_pipeline::decode(&png_bytes(&scene(120, 90))).unwrap();

    let mut c = PipelineController::default();
    c.load(Side::Left, left).unwrap();
    c.load(Side::Right, right).unwrap();
    assert_eq!(c.start().unwrap(), Stage::Rotate);

    // Rotate: both lines level, picked through zoomed and panned views.
    let mut left_view = view_for(&c, Side::Left);
    let mut right_view = view_for(&c, Side::Right);
    left_view.zoom_in();
    right_view.zoom_out();

    // A long drag pans instead of placing a point.
    left_view.pointer_down(ScreenPoint::new(100.0, 100.0));
    left_view.pointer_move(ScreenPoint::new(120.0, 100.0));
    assert_eq!(
        left_view.pointer_up(ScreenPoint::new(130.0, 110.0)),
        PointerRelease::Pan
    );
    assert!(c.points().is_empty());

    click_at(&mut c, Side::Left, &mut left_view, Point::new(10.0, 40.0));
    click_at(&mut c, Side::Left, &mut left_view, Point::new(110.0, 40.0));
    click_at(&mut c, Side::Right, &mut right_view, Point::new(10.0, 40.0));
    click_at(&mut c, Side::Right, &mut right_view, Point::new(110.0, 40.0));
    assert_eq!(
        c.apply().unwrap(),
        ApplyOutcome::Advanced {
            from: Stage::Rotate,
            to: Stage::Scale
        }
    );
    assert_eq!(c.working().unwrap().dimensions(Side::Right).width, 120);

    // Scale: left span is twice the right span.
    assert!(c.add_point(Side::Left, Point::new(0.0, 10.0)));
    assert!(c.add_point(Side::Left, Point::new(0.0, 70.0)));
    assert!(c.add_point(Side::Right, Point::new(0.0, 10.0)));
    assert!(c.add_point(Side::Right, Point::new(0.0, 40.0)));
    c.apply().unwrap();
    assert_eq!(c.stage(), Stage::Crop);
    assert_eq!(c.working().unwrap().right.dimensions(), (240, 180));

    // Crop around the centre of each image.
    assert!(c.add_point(Side::Left, Point::new(60.0, 45.0)));
    assert!(c.add_point(Side::Right, Point::new(120.0, 90.0)));
    c.apply().unwrap();
    assert_eq!(c.stage(), Stage::Result);

    let pair = c.working().unwrap();
    assert_eq!(pair.left.dimensions(), (120, 90));
    assert_eq!(pair.right.dimensions(), (120, 90));
    assert_eq!(c.result().unwrap().dimensions(), (240, 90));

    // Originals stay untouched.
    assert_eq!(c.source(Side::Right).unwrap().dimensions(), (120, 90));
}

#[test]
fn crop_of_shifted_views_matches_scene() {
    let world = scene(100, 80);
    let left = image::imageops::crop_imm(&world, 0, 0, 80, 60).to_image();
    let right = image::imageops::crop_imm(&world, 20, 20, 80, 60).to_image();

    let opts = ProcessingOptions {
        assume_equal_tilt: true,
        assume_equal_zoom: true,
        ..ProcessingOptions::default()
    };
    let mut c = PipelineController::new(opts, parallax_pipeline::GeometryConfig::default());
    c.load(Side::Left, left).unwrap();
    c.load(Side::Right, right).unwrap();
    assert_eq!(c.start().unwrap(), Stage::Crop);

    // Scene feature (50, 40) seen from both framings.
    assert!(c.add_point(Side::Left, Point::new(50.0, 40.0)));
    assert!(c.add_point(Side::Right, Point::new(30.0, 20.0)));
    c.apply().unwrap();

    let pair = c.working().unwrap();
    assert_eq!(pair.left.dimensions(), (60, 40));
    assert_eq!(pair.left.as_raw(), pair.right.as_raw());
    assert_eq!(pair.left.get_pixel(0, 0).0, [20, 20, 128, 255]);
}

#[test]
fn undo_then_reset_restarts_cleanly() {
    let mut c = PipelineController::default();
    c.load(Side::Left, scene(50, 50)).unwrap();
    c.load(Side::Right, scene(60, 40)).unwrap();
    c.start().unwrap();

    assert!(c.add_point(Side::Right, Point::new(1.0, 1.0)));
    assert!(c.add_point(Side::Left, Point::new(2.0, 2.0)));
    assert_eq!(c.undo_last_point(), Some((Side::Left, Point::new(2.0, 2.0))));
    assert_eq!(c.undo_last_point(), Some((Side::Right, Point::new(1.0, 1.0))));
    assert_eq!(c.undo_last_point(), None);

    c.reset();
    assert_eq!(c.stage(), Stage::Upload);
    c.set_options(ProcessingOptions {
        assume_equal_framing: true,
        ..ProcessingOptions::default()
    })
    .unwrap();
    assert_eq!(c.start().unwrap(), Stage::Result);
    // 50 + 60 wide, as tall as the taller input.
    assert_eq!(c.result().unwrap().dimensions(), (110, 50));
}
