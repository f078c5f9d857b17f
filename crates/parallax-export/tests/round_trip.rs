//! Integration test: align a pair, export the result, and decode it again.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::Rgba;
use parallax_export::{OutputFormat, encode};
use parallax_pipeline::{PipelineController, ProcessingOptions, RgbaImage, Side, Stage};

fn merged() -> RgbaImage {
    let mut c = PipelineController::new(
        ProcessingOptions {
            assume_equal_framing: true,
            ..ProcessingOptions::default()
        },
        parallax_pipeline::GeometryConfig::default(),
    );
    c.load(Side::Left, RgbaImage::from_pixel(40, 30, Rgba([200, 40, 40, 255])))
        .unwrap();
    c.load(Side::Right, RgbaImage::from_pixel(40, 20, Rgba([40, 40, 200, 255])))
        .unwrap();
    assert_eq!(c.start().unwrap(), Stage::Result);
    c.result().expect("result after equal framing").clone()
}

#[test]
fn png_round_trip_is_lossless() {
    let image = merged();
    let bytes = encode(&image, OutputFormat::Png, 0).unwrap();
    let decoded = parallax_pipeline::decode(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (80, 30));
    assert_eq!(decoded.as_raw(), image.as_raw());
}

#[test]
fn jpeg_round_trip_keeps_size_and_colours() {
    let image = merged();
    let bytes = encode(&image, OutputFormat::Jpeg, 95).unwrap();
    let decoded = parallax_pipeline::decode(&bytes).unwrap();
    assert_eq!(decoded.dimensions(), (80, 30));

    // Away from block edges the flat colours survive within JPEG error.
    let left = decoded.get_pixel(10, 15).0;
    let right = decoded.get_pixel(70, 15).0;
    assert!(left[0] > 150 && left[2] < 90, "left {left:?}");
    assert!(right[2] > 150 && right[0] < 90, "right {right:?}");
}
