//! Headless replay of an alignment session.
//!
//! A session script is a JSON array of events, applied in order:
//!
//! ```json
//! [
//!   { "event": "click", "side": "left", "x": 210.0, "y": 140.0 },
//!   { "event": "drag", "side": "right", "from": [10, 10], "to": [60, 40] },
//!   { "event": "zoom", "side": "right", "direction": "in" },
//!   { "event": "point", "side": "right", "x": 64.5, "y": 30.0 },
//!   { "event": "undo" },
//!   { "event": "apply" }
//! ]
//! ```
//!
//! `click` and `drag` are in screen pixels of that side's view and go
//! through the same click/pan discrimination as pointer input. `point`
//! places an image-space point directly.

use parallax_pipeline::{
    ApplyOutcome, PipelineController, Point, PointerRelease, ScreenPoint, Side, Stage,
    ViewportConfig, ViewportMapper,
};
use serde::{Deserialize, Serialize};

/// Zoom step direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomDirection {
    /// Multiply the scale by the zoom-in factor.
    In,
    /// Multiply the scale by the zoom-out factor.
    Out,
}

/// One recorded operator action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Place an image-space point.
    Point { side: Side, x: f64, y: f64 },
    /// Press and release without moving, in screen pixels.
    Click { side: Side, x: f64, y: f64 },
    /// Press at `from`, move to `to`, release.
    Drag {
        side: Side,
        from: [f64; 2],
        to: [f64; 2],
    },
    /// One zoom step about the view centre.
    Zoom {
        side: Side,
        direction: ZoomDirection,
    },
    /// Refit one view.
    Fit { side: Side },
    /// Remove the last point on either side.
    Undo,
    /// Apply the active stage.
    Apply,
    /// Choose which image the rotate stage turns.
    RotateLeftImage { value: bool },
}

/// Parse a session script.
///
/// # Errors
///
/// Returns the `serde_json` error for malformed scripts.
pub fn parse(json: &str) -> Result<Vec<ScriptEvent>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Every stage in order with the active one bracketed, e.g.
/// `upload > rotate > [scale] > crop > result`.
fn stage_strip(active: Stage) -> String {
    Stage::ALL
        .iter()
        .map(|&stage| {
            if stage == active {
                format!("[{stage}]")
            } else {
                stage.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" > ")
}

/// A controller plus one view per side, sized like a window.
pub struct Session {
    controller: PipelineController,
    config: ViewportConfig,
    viewport: (f64, f64),
    views: Option<[ViewportMapper; 2]>,
}

impl Session {
    /// Wrap a started controller.
    #[must_use]
    pub fn new(
        controller: PipelineController,
        config: ViewportConfig,
        viewport: (f64, f64),
    ) -> Self {
        let mut session = Self {
            controller,
            config,
            viewport,
            views: None,
        };
        session.refit();
        session
    }

    /// The wrapped controller.
    #[must_use]
    pub const fn controller(&self) -> &PipelineController {
        &self.controller
    }

    /// Apply every event in order. Failures are logged and skipped, the
    /// same way an operator would see them and carry on.
    pub fn replay(&mut self, events: &[ScriptEvent]) {
        for (index, event) in events.iter().enumerate() {
            log::trace!("event {index}: {event:?}");
            self.handle(event);
        }
    }

    fn handle(&mut self, event: &ScriptEvent) {
        match *event {
            ScriptEvent::Point { side, x, y } => {
                if !self.controller.add_point(side, Point::new(x, y)) {
                    log::warn!("{side} point ({x}, {y}) was not accepted");
                }
            }
            ScriptEvent::Click { side, x, y } => {
                let at = ScreenPoint::new(x, y);
                if let Some(view) = self.view_mut(side) {
                    view.pointer_down(at);
                    let release = view.pointer_up(at);
                    self.release(side, release);
                }
            }
            ScriptEvent::Drag { side, from, to } => {
                if let Some(view) = self.view_mut(side) {
                    view.pointer_down(ScreenPoint::new(from[0], from[1]));
                    let end = ScreenPoint::new(to[0], to[1]);
                    view.pointer_move(end);
                    let release = view.pointer_up(end);
                    self.release(side, release);
                }
            }
            ScriptEvent::Zoom { side, direction } => {
                if let Some(view) = self.view_mut(side) {
                    match direction {
                        ZoomDirection::In => view.zoom_in(),
                        ZoomDirection::Out => view.zoom_out(),
                    }
                    log::debug!("{side} view scale {:.3}", view.viewport().scale);
                }
            }
            ScriptEvent::Fit { side } => {
                if let Some(view) = self.view_mut(side) {
                    view.fit_to_view();
                }
            }
            ScriptEvent::Undo => {
                if self.controller.undo_last_point().is_none() {
                    log::debug!("nothing to undo");
                }
            }
            ScriptEvent::Apply => match self.controller.apply() {
                Ok(ApplyOutcome::Advanced { to, .. }) => {
                    log::info!("{}", stage_strip(to));
                    self.refit();
                }
                Ok(ApplyOutcome::NotReady) => {}
                Err(e) => log::warn!("apply failed: {e}"),
            },
            ScriptEvent::RotateLeftImage { value } => {
                if let Err(e) = self.controller.set_rotate_left_image(value) {
                    log::warn!("{e}");
                }
            }
        }
    }

    fn release(&mut self, side: Side, release: PointerRelease) {
        match release {
            PointerRelease::Click(point) => {
                if !self.controller.add_point(side, point) {
                    log::warn!(
                        "{side} click at ({:.1}, {:.1}) was not accepted",
                        point.x,
                        point.y
                    );
                }
            }
            PointerRelease::OutOfBounds => log::debug!("{side} click outside the image"),
            PointerRelease::Pan => log::debug!("{side} view panned"),
            PointerRelease::Idle => {}
        }
    }

    fn view_mut(&mut self, side: Side) -> Option<&mut ViewportMapper> {
        let view = self.views.as_mut().map(|[left, right]| match side {
            Side::Left => left,
            Side::Right => right,
        });
        if view.is_none() {
            log::warn!("no working images to show in the {side} view");
        }
        view
    }

    /// Show the current working pair, fitted, in both views.
    fn refit(&mut self) {
        let (width, height) = self.viewport;
        let config = self.config;
        self.views = self.controller.working().map(|pair| {
            Side::ALL.map(|side| ViewportMapper::new(config, pair.dimensions(side), width, height))
        });
    }
}
