//! The alignment stage machine.
//!
//! ```text
//! Upload ──start──▶ Rotate ──apply──▶ Scale ──apply──▶ Crop ──apply──▶ Result
//!    │                 │                                 ▲
//!    │                 └──────apply (equal zoom)─────────┤
//!    ├──start (equal tilt + zoom)────────────────────────┤
//!    ├──start (equal tilt)──▶ Scale                      │
//!    └──start (equal framing)─────────────────────────────────────────▶ Result
//! ```
//!
//! Routing is decided by two pure functions, [`Stage::after_start`] and
//! [`Stage::after_apply`], over [`ProcessingOptions`]. The
//! [`PipelineController`] owns the image buffers and the collected
//! points and applies each stage's transform.
//!
//! Every transition is atomic. A stage's transform is computed in full
//! before anything is stored, so a failing apply (e.g. a degenerate scale)
//! leaves buffers, points and stage exactly as they were.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compose::side_by_side;
use crate::crop::crop_pair;
use crate::points::PointCollector;
use crate::rotate::{RotationPlan, rotate};
use crate::scale::{scale, scale_ratio};
use crate::types::{
    AlignError, Dimensions, GeometryConfig, Point, ProcessingOptions, RgbaImage, Side,
    WorkingPair,
};
use crate::viewport::{ScreenPoint, ViewportMapper};

/// One phase of the alignment wizard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Waiting for both images.
    #[default]
    Upload,
    /// Level the pair using one line per image.
    Rotate,
    /// Match magnification using one vertical span per image.
    Scale,
    /// Crop both images around a shared anchor.
    Crop,
    /// The merged side-by-side image is ready.
    Result,
}

impl Stage {
    /// All stages in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Upload,
        Self::Rotate,
        Self::Scale,
        Self::Crop,
        Self::Result,
    ];

    /// Human-readable name of the stage.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Crop => "crop",
            Self::Result => "result",
        }
    }

    /// Points needed on each side before the stage can be applied.
    #[must_use]
    pub const fn min_points(self) -> usize {
        match self {
            Self::Rotate | Self::Scale => 2,
            Self::Crop => 1,
            Self::Upload | Self::Result => 0,
        }
    }

    /// Points accepted per side while the stage is active.
    #[must_use]
    pub const fn max_points(self) -> usize {
        self.min_points()
    }

    /// Whether the stage collects points and has an apply step.
    #[must_use]
    pub const fn is_correction(self) -> bool {
        matches!(self, Self::Rotate | Self::Scale | Self::Crop)
    }

    /// First stage after leaving [`Stage::Upload`].
    #[must_use]
    pub const fn after_start(options: &ProcessingOptions) -> Self {
        if options.assume_equal_framing {
            Self::Result
        } else if options.assume_equal_tilt && options.assume_equal_zoom {
            Self::Crop
        } else if options.assume_equal_tilt {
            Self::Scale
        } else {
            Self::Rotate
        }
    }

    /// Stage that follows a successful apply of `self`.
    ///
    /// Stages without an apply step map to themselves.
    #[must_use]
    pub const fn after_apply(self, options: &ProcessingOptions) -> Self {
        match self {
            Self::Rotate if options.assume_equal_zoom => Self::Crop,
            Self::Rotate => Self::Scale,
            Self::Scale => Self::Crop,
            Self::Crop => Self::Result,
            Self::Upload | Self::Result => self,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of [`PipelineController::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum ApplyOutcome {
    /// The stage was applied and the pipeline moved on.
    Advanced {
        /// Stage that was applied.
        from: Stage,
        /// Stage now active.
        to: Stage,
    },
    /// Not enough points yet (or no apply step in this stage); nothing
    /// changed.
    NotReady,
}

/// The serializable, raster-free part of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Active stage.
    pub stage: Stage,
    /// Options in force.
    pub options: ProcessingOptions,
    /// Points collected for the active stage.
    pub points: PointCollector,
    /// Working image sizes, once started.
    pub working: Option<[Dimensions; 2]>,
    /// Merged image size, once finished.
    pub result: Option<Dimensions>,
}

/// Drives a stereo pair through the correction stages.
///
/// Owns the originally loaded images (kept untouched for provenance),
/// the current working pair, the merged result, and the points for the
/// active stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineController {
    options: ProcessingOptions,
    geometry: GeometryConfig,
    stage: Stage,
    left_source: Option<RgbaImage>,
    right_source: Option<RgbaImage>,
    working: Option<WorkingPair>,
    result: Option<RgbaImage>,
    points: PointCollector,
}

impl PipelineController {
    /// A fresh controller in [`Stage::Upload`].
    #[must_use]
    pub fn new(options: ProcessingOptions, geometry: GeometryConfig) -> Self {
        Self {
            options,
            geometry,
            ..Self::default()
        }
    }

    /// Active stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Options in force.
    #[must_use]
    pub const fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    /// Replace all options. Only allowed before starting.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::WrongStage`] outside [`Stage::Upload`].
    pub fn set_options(&mut self, options: ProcessingOptions) -> Result<(), AlignError> {
        self.require(Stage::Upload)?;
        self.options = options;
        Ok(())
    }

    /// Choose which image the rotate stage turns. Allowed before
    /// starting and during [`Stage::Rotate`]; collected points are kept.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::WrongStage`] in any other stage.
    pub fn set_rotate_left_image(&mut self, rotate_left_image: bool) -> Result<(), AlignError> {
        if self.stage != Stage::Upload {
            self.require(Stage::Rotate)?;
        }
        self.options.rotate_left_image = rotate_left_image;
        Ok(())
    }

    /// Load (or replace) the image for one side.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::WrongStage`] outside [`Stage::Upload`].
    pub fn load(&mut self, side: Side, image: RgbaImage) -> Result<(), AlignError> {
        self.require(Stage::Upload)?;
        log::debug!("loaded {side} image {}x{}", image.width(), image.height());
        match side {
            Side::Left => self.left_source = Some(image),
            Side::Right => self.right_source = Some(image),
        }
        Ok(())
    }

    /// The image originally loaded for one side.
    #[must_use]
    pub const fn source(&self, side: Side) -> Option<&RgbaImage> {
        match side {
            Side::Left => self.left_source.as_ref(),
            Side::Right => self.right_source.as_ref(),
        }
    }

    /// Leave [`Stage::Upload`], routing by the current options.
    ///
    /// With `assume_equal_framing` the pair is composed immediately and
    /// the pipeline goes straight to [`Stage::Result`].
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::WrongStage`] if already started, or
    /// [`AlignError::MissingSource`] if either image is missing. Neither
    /// changes any state.
    pub fn start(&mut self) -> Result<Stage, AlignError> {
        self.require(Stage::Upload)?;
        let left = self
            .left_source
            .clone()
            .ok_or(AlignError::MissingSource { side: Side::Left })?;
        let right = self
            .right_source
            .clone()
            .ok_or(AlignError::MissingSource { side: Side::Right })?;

        let next = Stage::after_start(&self.options);
        let pair = WorkingPair { left, right };
        self.result = (next == Stage::Result).then(|| side_by_side(&pair.left, &pair.right));
        self.working = Some(pair);
        self.points.clear();
        self.stage = next;
        log::info!("started with {:?}, entering {next}", self.options);
        Ok(next)
    }

    /// Current working pair, once started.
    #[must_use]
    pub const fn working(&self) -> Option<&WorkingPair> {
        self.working.as_ref()
    }

    /// The merged side-by-side image, once [`Stage::Result`] is reached.
    #[must_use]
    pub const fn result(&self) -> Option<&RgbaImage> {
        self.result.as_ref()
    }

    /// Points collected for the active stage.
    #[must_use]
    pub const fn points(&self) -> &PointCollector {
        &self.points
    }

    /// Whether `side` can take another point in the active stage.
    #[must_use]
    pub fn accepts_point(&self, side: Side) -> bool {
        self.points.len(side) < self.stage.max_points()
    }

    /// Store a point picked on `side`'s working image.
    ///
    /// The point is dropped (returning `false`) if it lies outside that
    /// image or the side already holds the stage's maximum.
    pub fn add_point(&mut self, side: Side, point: Point) -> bool {
        let Some(pair) = self.working.as_ref() else {
            return false;
        };
        if !self.accepts_point(side) || !pair.dimensions(side).contains(point) {
            log::debug!("dropped {side} point ({:.1}, {:.1})", point.x, point.y);
            return false;
        }
        self.points.add_point(side, point);
        log::debug!(
            "{side} point {} at ({:.1}, {:.1})",
            self.points.len(side),
            point.x,
            point.y
        );
        true
    }

    /// Convert a click on `side`'s view and store the resulting point.
    ///
    /// Off-image clicks are dropped without error.
    pub fn click(&mut self, side: Side, view: &ViewportMapper, at: ScreenPoint) -> bool {
        view.image_point(at)
            .is_some_and(|point| self.add_point(side, point))
    }

    /// Remove the most recently added point, on whichever side.
    pub fn undo_last_point(&mut self) -> Option<(Side, Point)> {
        let undone = self.points.undo_last();
        if let Some((side, point)) = undone {
            log::debug!("undid {side} point ({:.1}, {:.1})", point.x, point.y);
        }
        undone
    }

    /// Whether [`apply`](Self::apply) would run: the stage has an apply
    /// step and both sides hold at least its minimum point count.
    #[must_use]
    pub fn can_apply(&self) -> bool {
        let needed = self.stage.min_points();
        self.stage.is_correction()
            && self.working.is_some()
            && Side::ALL.iter().all(|&side| self.points.len(side) >= needed)
    }

    /// Apply the active stage's correction and advance.
    ///
    /// Refuses silently with [`ApplyOutcome::NotReady`] when
    /// [`can_apply`](Self::can_apply) is false.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::DegenerateScale`] in [`Stage::Scale`] when a
    /// side's points have no vertical separation,
    /// [`AlignError::ScaleOutOfRange`] when the ratio would produce an
    /// image over [`GeometryConfig::max_scaled_pixels`], and
    /// [`AlignError::EmptyCrop`] in [`Stage::Crop`] when the anchors leave
    /// no area. In both cases nothing changes and the operator stays in
    /// the stage to re-pick points.
    pub fn apply(&mut self) -> Result<ApplyOutcome, AlignError> {
        if !self.can_apply() {
            log::warn!("{} stage is not ready to apply", self.stage);
            return Ok(ApplyOutcome::NotReady);
        }
        let Some(pair) = self.working.as_ref() else {
            return Ok(ApplyOutcome::NotReady);
        };

        let from = self.stage;
        let (next_pair, result) = match from {
            Stage::Rotate => (self.apply_rotation(pair), None),
            Stage::Scale => (self.apply_scale(pair)?, None),
            Stage::Crop => {
                let cropped = self.apply_crop(pair)?;
                let merged = side_by_side(&cropped.left, &cropped.right);
                (cropped, Some(merged))
            }
            Stage::Upload | Stage::Result => return Ok(ApplyOutcome::NotReady),
        };

        let to = from.after_apply(&self.options);
        log::info!(
            "applied {from}: left {}x{}, right {}x{}; entering {to}",
            next_pair.left.width(),
            next_pair.left.height(),
            next_pair.right.width(),
            next_pair.right.height()
        );
        self.working = Some(next_pair);
        self.result = result;
        self.points.clear();
        self.stage = to;
        Ok(ApplyOutcome::Advanced { from, to })
    }

    /// Discard all working and result buffers and return to
    /// [`Stage::Upload`]. Loaded sources and options are kept.
    pub fn reset(&mut self) {
        self.working = None;
        self.result = None;
        self.points.clear();
        self.stage = Stage::Upload;
        log::info!("reset to {}", Stage::Upload);
    }

    /// Raster-free summary of the session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            stage: self.stage,
            options: self.options,
            points: self.points.clone(),
            working: self
                .working
                .as_ref()
                .map(|pair| [pair.dimensions(Side::Left), pair.dimensions(Side::Right)]),
            result: self.result.as_ref().map(Dimensions::of),
        }
    }

    fn apply_rotation(&self, pair: &WorkingPair) -> WorkingPair {
        let (Some(left), Some(right)) =
            (self.points.pair(Side::Left), self.points.pair(Side::Right))
        else {
            return pair.clone();
        };
        let plan = RotationPlan::from_points(left, right, self.options.rotate_left_image);
        log::debug!(
            "rotating {} image by {:.3} degrees",
            plan.side,
            plan.angle_degrees
        );
        let rotated = rotate(
            pair.get(plan.side),
            plan.angle_degrees,
            self.geometry.rotation_interpolation,
        );
        match plan.side {
            Side::Left => WorkingPair {
                left: rotated,
                right: pair.right.clone(),
            },
            Side::Right => WorkingPair {
                left: pair.left.clone(),
                right: rotated,
            },
        }
    }

    fn apply_scale(&self, pair: &WorkingPair) -> Result<WorkingPair, AlignError> {
        let (Some(left), Some(right)) =
            (self.points.pair(Side::Left), self.points.pair(Side::Right))
        else {
            return Ok(pair.clone());
        };
        let ratio = scale_ratio(left, right).inspect_err(|e| log::warn!("{e}"))?;
        log::debug!("scaling right image by {ratio:.4}");
        let right = scale(
            &pair.right,
            ratio,
            self.geometry.resample_filter,
            self.geometry.max_scaled_pixels,
        )
        .inspect_err(|e| log::warn!("{e}"))?;
        Ok(WorkingPair {
            left: pair.left.clone(),
            right,
        })
    }

    fn apply_crop(&self, pair: &WorkingPair) -> Result<WorkingPair, AlignError> {
        let (Some(left_anchor), Some(right_anchor)) =
            (self.points.first(Side::Left), self.points.first(Side::Right))
        else {
            return Ok(pair.clone());
        };
        let (left, right) = crop_pair(
            &pair.left,
            left_anchor,
            &pair.right,
            right_anchor,
            self.options.assume_equal_zoom,
        )
        .inspect_err(|e| log::warn!("{e}"))?;
        Ok(WorkingPair { left, right })
    }

    fn require(&self, expected: Stage) -> Result<(), AlignError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(AlignError::WrongStage {
                expected,
                actual: self.stage,
            })
        }
    }
}
