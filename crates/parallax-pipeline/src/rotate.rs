//! Rotation about the image centre onto an enlarged canvas.
//!
//! The output canvas is the smallest axis-aligned box that holds the
//! whole rotated source, so no content is clipped. Pixels the source
//! does not cover stay transparent black.
//!
//! Angles follow image coordinates (`y` down): a positive angle turns
//! the content clockwise on screen, which is the same sense in which
//! [`line_angle`](crate::angle::line_angle) grows. Rotating an image by
//! `b - a` therefore turns a feature line at angle `a` onto angle `b`.

use std::fmt;

use image::{Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use serde::{Deserialize, Serialize};

use crate::angle::line_angle;
use crate::types::{Point, Side, ceil_px};

/// Rotations smaller than this (in degrees) are returned as plain copies.
pub const ROTATION_EPSILON_DEGREES: f64 = 0.01;

/// Sampling used when mapping rotated pixels back onto the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationInterpolation {
    /// Nearest-neighbour: fastest, jagged edges.
    Nearest,
    /// Bilinear: smooth, the usual choice for photographs.
    #[default]
    Bilinear,
}

impl RotationInterpolation {
    const fn to_imageproc(self) -> Interpolation {
        match self {
            Self::Nearest => Interpolation::Nearest,
            Self::Bilinear => Interpolation::Bilinear,
        }
    }
}

impl fmt::Display for RotationInterpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Bilinear => f.write_str("Bilinear"),
        }
    }
}

/// Which image to rotate, and by how much, to level one pair of
/// correspondence lines against the other.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationPlan {
    /// The image that gets rotated. The other passes through unchanged.
    pub side: Side,
    /// Rotation to apply, in degrees.
    pub angle_degrees: f64,
}

impl RotationPlan {
    /// Derive the rotation from two point pairs.
    ///
    /// With `rotate_left_image` the left image turns by
    /// `angle(right) - angle(left)`; otherwise the right image turns by
    /// `angle(left) - angle(right)`. Exactly one side is rotated.
    #[must_use]
    pub fn from_points(left: [Point; 2], right: [Point; 2], rotate_left_image: bool) -> Self {
        let left_angle = line_angle(left[0], left[1]);
        let right_angle = line_angle(right[0], right[1]);
        if rotate_left_image {
            Self {
                side: Side::Left,
                angle_degrees: right_angle - left_angle,
            }
        } else {
            Self {
                side: Side::Right,
                angle_degrees: left_angle - right_angle,
            }
        }
    }
}

/// Dimensions of the canvas that holds a `width × height` image rotated
/// by `angle_degrees`.
///
/// `ceil(w·|cos θ| + h·|sin θ|) × ceil(w·|sin θ| + h·|cos θ|)`, with
/// float noise at right angles absorbed so 90° swaps the sides exactly.
#[must_use]
pub fn rotated_bounds(width: u32, height: u32, angle_degrees: f64) -> (u32, u32) {
    let theta = angle_degrees.to_radians();
    let cos = theta.cos().abs();
    let sin = theta.sin().abs();
    let w = f64::from(width);
    let h = f64::from(height);
    (
        ceil_px(w.mul_add(cos, h * sin)),
        ceil_px(w.mul_add(sin, h * cos)),
    )
}

/// Rotate an image about its own centre.
///
/// Always returns a new buffer. Below [`ROTATION_EPSILON_DEGREES`] the
/// result is a pixel-identical copy of the source.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn rotate(
    image: &RgbaImage,
    angle_degrees: f64,
    interpolation: RotationInterpolation,
) -> RgbaImage {
    if angle_degrees.abs() < ROTATION_EPSILON_DEGREES {
        return image.clone();
    }

    let (src_w, src_h) = image.dimensions();
    let (dst_w, dst_h) = rotated_bounds(src_w, src_h, angle_degrees);

    let src_cx = src_w as f32 / 2.0;
    let src_cy = src_h as f32 / 2.0;
    let dst_cx = dst_w as f32 / 2.0;
    let dst_cy = dst_h as f32 / 2.0;

    // Source centre -> origin, rotate, origin -> canvas centre.
    let projection = Projection::translate(dst_cx, dst_cy)
        * Projection::rotate(angle_degrees.to_radians() as f32)
        * Projection::translate(-src_cx, -src_cy);

    let mut output = RgbaImage::new(dst_w, dst_h);
    warp_into(
        image,
        &projection,
        interpolation.to_imageproc(),
        Rgba([0, 0, 0, 0]),
        &mut output,
    );
    output
}
