//! Mapping between image space and an on-screen view with pan and zoom.
//!
//! Each displayed image owns one [`ViewportMapper`]; the two views of a
//! stereo pair never share or synchronize state. The mapping is
//!
//! ```text
//! screen = image * scale + offset
//! image  = (screen - offset) / scale
//! ```
//!
//! The mapper also tells clicks apart from drags: a pointer press and
//! release that moved less than [`ViewportConfig::click_tolerance`]
//! screen pixels places a point, anything longer pans the view.

use serde::{Deserialize, Serialize};

use crate::types::{AlignError, Dimensions, Point};

/// A position in screen (viewport) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Pixels from the viewport's left edge.
    pub x: f64,
    /// Pixels from the viewport's top edge.
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Tunables for fit, zoom and click detection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Fraction of the viewport the image fills after fit-to-view.
    pub fit_margin: f64,
    /// Scale multiplier for one zoom-in step.
    pub zoom_in_factor: f64,
    /// Scale multiplier for one zoom-out step.
    pub zoom_out_factor: f64,
    /// Smallest allowed scale.
    pub min_scale: f64,
    /// Largest allowed scale.
    pub max_scale: f64,
    /// Pointer travel (screen pixels) below which a press/release is a click.
    pub click_tolerance: f64,
}

impl ViewportConfig {
    /// Default [`fit_margin`](Self::fit_margin).
    pub const DEFAULT_FIT_MARGIN: f64 = 0.95;
    /// Default [`zoom_in_factor`](Self::zoom_in_factor).
    pub const DEFAULT_ZOOM_IN_FACTOR: f64 = 1.2;
    /// Default [`zoom_out_factor`](Self::zoom_out_factor).
    pub const DEFAULT_ZOOM_OUT_FACTOR: f64 = 0.8;
    /// Default [`min_scale`](Self::min_scale).
    pub const DEFAULT_MIN_SCALE: f64 = 0.01;
    /// Default [`max_scale`](Self::max_scale).
    pub const DEFAULT_MAX_SCALE: f64 = 50.0;
    /// Default [`click_tolerance`](Self::click_tolerance).
    pub const DEFAULT_CLICK_TOLERANCE: f64 = 5.0;

    /// Check that every field is usable.
    ///
    /// # Errors
    ///
    /// Returns [`AlignError::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<(), AlignError> {
        let positive = [
            ("fit_margin", self.fit_margin),
            ("zoom_in_factor", self.zoom_in_factor),
            ("zoom_out_factor", self.zoom_out_factor),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(AlignError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(AlignError::InvalidConfig(format!(
                "min_scale ({}) exceeds max_scale ({})",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.click_tolerance.is_finite() && self.click_tolerance >= 0.0) {
            return Err(AlignError::InvalidConfig(format!(
                "click_tolerance must be non-negative, got {}",
                self.click_tolerance
            )));
        }
        Ok(())
    }
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            fit_margin: Self::DEFAULT_FIT_MARGIN,
            zoom_in_factor: Self::DEFAULT_ZOOM_IN_FACTOR,
            zoom_out_factor: Self::DEFAULT_ZOOM_OUT_FACTOR,
            min_scale: Self::DEFAULT_MIN_SCALE,
            max_scale: Self::DEFAULT_MAX_SCALE,
            click_tolerance: Self::DEFAULT_CLICK_TOLERANCE,
        }
    }
}

/// The affine image-to-screen map of one view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen pixels per image pixel. Always positive.
    pub scale: f64,
    /// Screen x of the image's left edge.
    pub offset_x: f64,
    /// Screen y of the image's top edge.
    pub offset_y: f64,
}

impl Viewport {
    /// Convert a screen position to image coordinates.
    #[must_use]
    pub fn screen_to_image(&self, screen: ScreenPoint) -> Point {
        Point::new(
            (screen.x - self.offset_x) / self.scale,
            (screen.y - self.offset_y) / self.scale,
        )
    }

    /// Convert an image position to screen coordinates.
    #[must_use]
    pub fn image_to_screen(&self, point: Point) -> ScreenPoint {
        ScreenPoint::new(
            point.x.mul_add(self.scale, self.offset_x),
            point.y.mul_add(self.scale, self.offset_y),
        )
    }
}

/// What a pointer release turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerRelease {
    /// The pointer barely moved: a point placement at this image
    /// position, already checked against the image bounds.
    Click(Point),
    /// The pointer barely moved but landed outside the image.
    OutOfBounds,
    /// The pointer travelled far enough to count as a pan.
    Pan,
    /// No press was in progress.
    Idle,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    start: ScreenPoint,
    last: ScreenPoint,
}

/// Pan/zoom state and pointer handling for one displayed image.
#[derive(Debug, Clone)]
pub struct ViewportMapper {
    config: ViewportConfig,
    image: Dimensions,
    viewport_width: f64,
    viewport_height: f64,
    view: Viewport,
    drag: Option<Drag>,
}

impl ViewportMapper {
    /// Create a mapper for an image shown in a viewport of the given
    /// size, already fitted to the view.
    #[must_use]
    pub fn new(
        config: ViewportConfig,
        image: Dimensions,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Self {
        let mut mapper = Self {
            config,
            image,
            viewport_width,
            viewport_height,
            view: Viewport {
                scale: 1.0,
                offset_x: 0.0,
                offset_y: 0.0,
            },
            drag: None,
        };
        mapper.fit_to_view();
        mapper
    }

    /// Current image-to-screen map.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.view
    }

    /// Dimensions of the displayed image.
    #[must_use]
    pub const fn image_dimensions(&self) -> Dimensions {
        self.image
    }

    /// Show a different image (e.g. after a stage replaced the working
    /// buffer) and refit.
    pub fn set_image(&mut self, image: Dimensions) {
        self.image = image;
        self.drag = None;
        self.fit_to_view();
    }

    /// Scale the image to fill [`ViewportConfig::fit_margin`] of the
    /// viewport along its tighter axis, centred.
    pub fn fit_to_view(&mut self) {
        let iw = f64::from(self.image.width.max(1));
        let ih = f64::from(self.image.height.max(1));
        let fit = (self.viewport_width / iw).min(self.viewport_height / ih);
        let scale = (self.config.fit_margin * fit).max(f64::MIN_POSITIVE);
        self.view = Viewport {
            scale,
            offset_x: iw.mul_add(-scale, self.viewport_width) / 2.0,
            offset_y: ih.mul_add(-scale, self.viewport_height) / 2.0,
        };
    }

    /// One zoom-in step about the viewport centre.
    pub fn zoom_in(&mut self) {
        self.zoom_by(self.config.zoom_in_factor);
    }

    /// One zoom-out step about the viewport centre.
    pub fn zoom_out(&mut self) {
        self.zoom_by(self.config.zoom_out_factor);
    }

    /// Multiply the scale by `factor`, clamped to the configured range,
    /// keeping the image point under the viewport centre fixed.
    pub fn zoom_by(&mut self, factor: f64) {
        let center = ScreenPoint::new(self.viewport_width / 2.0, self.viewport_height / 2.0);
        let anchor = self.view.screen_to_image(center);
        let scale = (self.view.scale * factor).clamp(self.config.min_scale, self.config.max_scale);
        self.view = Viewport {
            scale,
            offset_x: anchor.x.mul_add(-scale, center.x),
            offset_y: anchor.y.mul_add(-scale, center.y),
        };
    }

    /// Shift the view by a screen-space delta.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.view.offset_x += dx;
        self.view.offset_y += dy;
    }

    /// Begin a press at `at`.
    pub const fn pointer_down(&mut self, at: ScreenPoint) {
        self.drag = Some(Drag {
            start: at,
            last: at,
        });
    }

    /// Follow the pointer; pans while a press is in progress.
    pub fn pointer_move(&mut self, at: ScreenPoint) {
        if let Some(drag) = self.drag.as_mut() {
            let (dx, dy) = (at.x - drag.last.x, at.y - drag.last.y);
            drag.last = at;
            self.pan(dx, dy);
        }
    }

    /// End a press at `at` and classify it.
    pub fn pointer_up(&mut self, at: ScreenPoint) -> PointerRelease {
        let Some(drag) = self.drag.take() else {
            return PointerRelease::Idle;
        };
        // Any movement not yet reported through pointer_move still pans.
        self.pan(at.x - drag.last.x, at.y - drag.last.y);
        if drag.start.distance(at) >= self.config.click_tolerance {
            return PointerRelease::Pan;
        }
        self.image_point(at)
            .map_or(PointerRelease::OutOfBounds, PointerRelease::Click)
    }

    /// Image coordinates under a screen position, if they fall inside
    /// `[0, width] × [0, height]`.
    #[must_use]
    pub fn image_point(&self, screen: ScreenPoint) -> Option<Point> {
        let point = self.view.screen_to_image(screen);
        self.image.contains(point).then_some(point)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn mapper(iw: u32, ih: u32, vw: f64, vh: f64) -> ViewportMapper {
        ViewportMapper::new(ViewportConfig::default(), Dimensions::new(iw, ih), vw, vh)
    }

    #[test]
    fn fit_uses_tighter_axis_and_centres() {
        let m = mapper(400, 200, 800.0, 600.0);
        let v = m.viewport();
        // min(800/400, 600/200) = 2 -> 0.95 * 2
        assert_relative_eq!(v.scale, 1.9);
        assert_relative_eq!(v.offset_x, (800.0 - 400.0 * 1.9) / 2.0);
        assert_relative_eq!(v.offset_y, (600.0 - 200.0 * 1.9) / 2.0);
    }

    #[test]
    fn fit_is_idempotent() {
        let mut m = mapper(333, 517, 640.0, 480.0);
        m.zoom_in();
        m.pan(12.0, -7.0);
        m.fit_to_view();
        let first = m.viewport();
        m.fit_to_view();
        assert_eq!(m.viewport(), first);
    }

    #[test]
    fn zoom_keeps_centre_fixed() {
        let mut m = mapper(1000, 1000, 500.0, 500.0);
        m.pan(37.0, -12.0);
        let centre = ScreenPoint::new(250.0, 250.0);
        let before = m.viewport().screen_to_image(centre);
        m.zoom_in();
        let after = m.viewport().screen_to_image(centre);
        assert_relative_eq!(before.x, after.x, epsilon = 1e-9);
        assert_relative_eq!(before.y, after.y, epsilon = 1e-9);
        m.zoom_out();
        let again = m.viewport().screen_to_image(centre);
        assert_relative_eq!(before.x, again.x, epsilon = 1e-9);
    }

    #[test]
    fn zoom_steps_use_configured_factors() {
        let mut m = mapper(100, 100, 100.0, 100.0);
        let start = m.viewport().scale;
        m.zoom_in();
        assert_relative_eq!(m.viewport().scale, start * 1.2);
        m.zoom_out();
        assert_relative_eq!(m.viewport().scale, start * 1.2 * 0.8);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut m = mapper(100, 100, 100.0, 100.0);
        for _ in 0..200 {
            m.zoom_in();
        }
        assert_relative_eq!(m.viewport().scale, 50.0);
        for _ in 0..500 {
            m.zoom_out();
        }
        assert_relative_eq!(m.viewport().scale, 0.01);
    }

    #[test]
    fn screen_and_image_round_trip() {
        let m = mapper(300, 200, 640.0, 480.0);
        let p = Point::new(123.0, 45.5);
        let back = m.viewport().screen_to_image(m.viewport().image_to_screen(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
    }

    #[test]
    fn short_press_is_click_at_image_position() {
        let mut m = mapper(200, 100, 400.0, 200.0);
        let target = Point::new(50.0, 25.0);
        let screen = m.viewport().image_to_screen(target);
        m.pointer_down(screen);
        let up = ScreenPoint::new(screen.x + 2.0, screen.y + 2.0);
        m.pointer_move(up);
        let release = m.pointer_up(up);
        assert!(
            matches!(release, PointerRelease::Click(_)),
            "expected click, got {release:?}"
        );
        if let PointerRelease::Click(p) = release {
            // The tiny move panned the image along with the pointer.
            assert_relative_eq!(p.x, target.x, epsilon = 1e-9);
            assert_relative_eq!(p.y, target.y, epsilon = 1e-9);
        }
        assert_eq!(m.pointer_up(up), PointerRelease::Idle);
    }

    #[test]
    fn long_press_is_pan() {
        let mut m = mapper(200, 100, 400.0, 200.0);
        let before = m.viewport();
        m.pointer_down(ScreenPoint::new(100.0, 100.0));
        m.pointer_move(ScreenPoint::new(103.0, 100.0));
        let release = m.pointer_up(ScreenPoint::new(110.0, 100.0));
        assert_eq!(release, PointerRelease::Pan);
        assert_relative_eq!(m.viewport().offset_x, before.offset_x + 10.0);
        assert_relative_eq!(m.viewport().offset_y, before.offset_y);
    }

    #[test]
    fn click_outside_image_is_dropped() {
        let mut m = mapper(100, 100, 400.0, 400.0);
        // Fitted image occupies the centre; the corner is off-image.
        m.pointer_down(ScreenPoint::new(1.0, 1.0));
        assert_eq!(
            m.pointer_up(ScreenPoint::new(1.0, 1.0)),
            PointerRelease::OutOfBounds
        );
    }

    #[test]
    fn release_without_press_is_idle() {
        let mut m = mapper(10, 10, 10.0, 10.0);
        assert_eq!(m.pointer_up(ScreenPoint::new(0.0, 0.0)), PointerRelease::Idle);
    }

    #[test]
    fn default_config_is_valid_and_bad_values_rejected() {
        assert!(ViewportConfig::default().validate().is_ok());
        let bad = ViewportConfig {
            zoom_in_factor: 0.0,
            ..ViewportConfig::default()
        };
        assert!(matches!(bad.validate(), Err(AlignError::InvalidConfig(_))));
        let inverted = ViewportConfig {
            min_scale: 10.0,
            max_scale: 1.0,
            ..ViewportConfig::default()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn click_tolerance_boundary() {
        let press = |travel: f64| {
            let mut m = mapper(200, 100, 400.0, 200.0);
            m.pointer_down(ScreenPoint::new(200.0, 100.0));
            m.pointer_up(ScreenPoint::new(200.0 + travel, 100.0))
        };
        assert!(matches!(press(4.99), PointerRelease::Click(_)));
        assert_eq!(press(5.0), PointerRelease::Pan);
    }

    #[test]
    fn set_image_refits() {
        let mut m = mapper(100, 100, 200.0, 200.0);
        m.set_image(Dimensions::new(400, 100));
        assert_relative_eq!(m.viewport().scale, 0.95 * 0.5);
    }
}
