//! Shared types for the parallax alignment pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pipeline::Stage;
use crate::rotate::RotationInterpolation;
use crate::scale::ResampleFilter;

/// Re-export `RgbaImage` so downstream crates can hold working and
/// result buffers without depending on `image` directly.
pub use image::RgbaImage;

/// Slack subtracted before rounding a computed pixel extent up, so that
/// floating-point noise (e.g. `cos(90°) ≈ 6e-17`) does not add a column.
const CEIL_TOLERANCE: f64 = 1e-9;

/// A 2D point in image coordinates.
///
/// Always expressed in the pixel space of the image it was picked on,
/// never in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Absolute difference of the `y` coordinates.
    #[must_use]
    pub fn vertical_distance(self, other: Self) -> f64 {
        (self.y - other.y).abs()
    }
}

/// Which image of the stereo pair something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The left-eye image.
    Left,
    /// The right-eye image.
    Right,
}

impl Side {
    /// Both sides, left first.
    pub const ALL: [Self; 2] = [Self::Left, Self::Right];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions from a width and height.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an existing image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Whether `point` lies inside `[0, width] × [0, height]`.
    ///
    /// Both far edges are inclusive: a click exactly on the right or
    /// bottom border is still a valid point.
    #[must_use]
    pub fn contains(self, point: Point) -> bool {
        point.x >= 0.0
            && point.y >= 0.0
            && point.x <= f64::from(self.width)
            && point.y <= f64::from(self.height)
    }
}

/// The left/right buffers carried between stages.
///
/// Replaced wholesale at every stage transition; never edited in place.
#[derive(Debug, Clone)]
pub struct WorkingPair {
    /// Current left image.
    pub left: RgbaImage,
    /// Current right image.
    pub right: RgbaImage,
}

impl WorkingPair {
    /// The buffer for one side.
    #[must_use]
    pub const fn get(&self, side: Side) -> &RgbaImage {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Dimensions of one side's buffer.
    #[must_use]
    pub fn dimensions(&self, side: Side) -> Dimensions {
        Dimensions::of(self.get(side))
    }
}

/// Operator choices that decide which correction stages run.
///
/// Set once before [`PipelineController::start`](crate::PipelineController::start).
/// Only `rotate_left_image` may change afterwards, and only while the
/// rotate stage is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    /// Both photos were taken with the same camera roll; skip rotation.
    pub assume_equal_tilt: bool,

    /// Both photos share the same magnification; skip scaling.
    pub assume_equal_zoom: bool,

    /// The photos are already aligned; compose them straight away.
    pub assume_equal_framing: bool,

    /// Rotate the left image to match the right. When `false` the right
    /// image is the one rotated.
    pub rotate_left_image: bool,
}

/// Resampling choices and limits for the geometry stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Sampling used by the rotate stage.
    pub rotation_interpolation: RotationInterpolation,

    /// Filter used by the scale stage.
    pub resample_filter: ResampleFilter,

    /// Largest pixel count the scale stage may produce. Points picked
    /// almost on top of each other give huge ratios; anything over this
    /// is refused with [`AlignError::ScaleOutOfRange`].
    pub max_scaled_pixels: u64,
}

impl GeometryConfig {
    /// Default [`max_scaled_pixels`](Self::max_scaled_pixels): 100
    /// megapixels, about 400 MB of RGBA.
    pub const DEFAULT_MAX_SCALED_PIXELS: u64 = 100_000_000;
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            rotation_interpolation: RotationInterpolation::default(),
            resample_filter: ResampleFilter::default(),
            max_scaled_pixels: Self::DEFAULT_MAX_SCALED_PIXELS,
        }
    }
}

/// Round a non-negative pixel extent up to a whole pixel count, never
/// returning zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn ceil_px(value: f64) -> u32 {
    let rounded = (value - CEIL_TOLERANCE).ceil().max(1.0);
    if rounded >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        rounded as u32
    }
}

/// Errors that can occur while driving the alignment pipeline.
///
/// None of these are fatal: every one leaves the pipeline in the state
/// it was in before the failing call, so the operator can correct and
/// retry.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// The pipeline was started before both images were loaded.
    #[error("no {side} image has been loaded")]
    MissingSource {
        /// The side that is still missing.
        side: Side,
    },

    /// The two scale points on one side share the same `y` coordinate,
    /// so no vertical distance ratio exists.
    #[error("the two {side} points have no vertical separation; pick points further apart")]
    DegenerateScale {
        /// The side whose points coincide vertically.
        side: Side,
    },

    /// The scale ratio would produce an image over
    /// [`GeometryConfig::max_scaled_pixels`].
    #[error(
        "scaling by {ratio:.3} would produce a {width}x{height} image, over the {max_pixels} pixel limit; pick points further apart"
    )]
    ScaleOutOfRange {
        /// Requested ratio.
        ratio: f64,
        /// Width the scaled image would have.
        width: u32,
        /// Height the scaled image would have.
        height: u32,
        /// Configured pixel limit.
        max_pixels: u64,
    },

    /// The crop anchors leave no overlapping area.
    #[error("crop anchors leave an empty {width}x{height} region; pick anchors away from the image edges")]
    EmptyCrop {
        /// Resulting crop width.
        width: u32,
        /// Resulting crop height.
        height: u32,
    },

    /// The operation is not available in the current stage.
    #[error("operation requires the {expected} stage but the pipeline is in {actual}")]
    WrongStage {
        /// Stage the operation needs.
        expected: Stage,
        /// Stage the pipeline is actually in.
        actual: Stage,
    },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `AlignError`.
#[derive(Serialize, Deserialize)]
enum AlignErrorProxy {
    ImageDecode(String),
    EmptyInput,
    MissingSource { side: Side },
    DegenerateScale { side: Side },
    ScaleOutOfRange {
        ratio: f64,
        width: u32,
        height: u32,
        max_pixels: u64,
    },
    EmptyCrop { width: u32, height: u32 },
    WrongStage { expected: Stage, actual: Stage },
    InvalidConfig(String),
}

impl Serialize for AlignError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => AlignErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => AlignErrorProxy::EmptyInput,
            Self::MissingSource { side } => AlignErrorProxy::MissingSource { side: *side },
            Self::DegenerateScale { side } => AlignErrorProxy::DegenerateScale { side: *side },
            Self::ScaleOutOfRange {
                ratio,
                width,
                height,
                max_pixels,
            } => AlignErrorProxy::ScaleOutOfRange {
                ratio: *ratio,
                width: *width,
                height: *height,
                max_pixels: *max_pixels,
            },
            Self::EmptyCrop { width, height } => AlignErrorProxy::EmptyCrop {
                width: *width,
                height: *height,
            },
            Self::WrongStage { expected, actual } => AlignErrorProxy::WrongStage {
                expected: *expected,
                actual: *actual,
            },
            Self::InvalidConfig(s) => AlignErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for AlignError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = AlignErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image::ImageError cannot be rebuilt; keep the message.
            AlignErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            AlignErrorProxy::EmptyInput => Self::EmptyInput,
            AlignErrorProxy::MissingSource { side } => Self::MissingSource { side },
            AlignErrorProxy::DegenerateScale { side } => Self::DegenerateScale { side },
            AlignErrorProxy::ScaleOutOfRange {
                ratio,
                width,
                height,
                max_pixels,
            } => Self::ScaleOutOfRange {
                ratio,
                width,
                height,
                max_pixels,
            },
            AlignErrorProxy::EmptyCrop { width, height } => Self::EmptyCrop { width, height },
            AlignErrorProxy::WrongStage { expected, actual } => {
                Self::WrongStage { expected, actual }
            }
            AlignErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
