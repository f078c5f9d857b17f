//! Uniform scaling to match the magnification of the pair.
//!
//! The ratio comes from the vertical distance between two feature points
//! picked on each side. Vertical distance is used rather than full
//! Euclidean length because the rotate stage has already levelled the
//! pair, leaving horizontal disparity as the only expected difference.
//!
//! Only the right image is ever scaled.

use std::fmt;

use image::RgbaImage;
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use crate::types::{AlignError, Point, Side, ceil_px};

/// Ratios this close to 1 are returned as plain copies.
pub const SCALE_EPSILON: f64 = 0.001;

/// Resampling filter used when scaling.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResampleFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Gaussian => FilterType::Gaussian,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Ratio that brings the right image to the left image's magnification:
/// `|Δy(left)| / |Δy(right)|`.
///
/// # Errors
///
/// Returns [`AlignError::DegenerateScale`] when either side's two points
/// share the same `y` coordinate. The left side is reported first.
pub fn scale_ratio(left: [Point; 2], right: [Point; 2]) -> Result<f64, AlignError> {
    let left_distance = left[0].vertical_distance(left[1]);
    let right_distance = right[0].vertical_distance(right[1]);
    if left_distance == 0.0 {
        return Err(AlignError::DegenerateScale { side: Side::Left });
    }
    if right_distance == 0.0 {
        return Err(AlignError::DegenerateScale { side: Side::Right });
    }
    Ok(left_distance / right_distance)
}

/// Output dimensions for scaling `width × height` by `ratio`.
#[must_use]
pub fn scaled_dimensions(width: u32, height: u32, ratio: f64) -> (u32, u32) {
    (
        ceil_px(f64::from(width) * ratio),
        ceil_px(f64::from(height) * ratio),
    )
}

/// Scale an image uniformly by `ratio`.
///
/// Always returns a new buffer; within [`SCALE_EPSILON`] of 1 it is a
/// pixel-identical copy.
///
/// # Errors
///
/// Returns [`AlignError::ScaleOutOfRange`] when the output would hold
/// more than `max_pixels` pixels. Nothing is allocated in that case.
pub fn scale(
    image: &RgbaImage,
    ratio: f64,
    filter: ResampleFilter,
    max_pixels: u64,
) -> Result<RgbaImage, AlignError> {
    if (ratio - 1.0).abs() < SCALE_EPSILON {
        return Ok(image.clone());
    }
    let (width, height) = scaled_dimensions(image.width(), image.height(), ratio);
    if u64::from(width) * u64::from(height) > max_pixels {
        return Err(AlignError::ScaleOutOfRange {
            ratio,
            width,
            height,
            max_pixels,
        });
    }
    Ok(image::imageops::resize(
        image,
        width,
        height,
        filter.to_image_filter(),
    ))
}
