//! Correspondence points for the current stage.
//!
//! Points are kept per side, in pick order. A single history log records
//! which side received each point, so undo always removes the point that
//! was added last, whichever image it was picked on.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Side};

/// Ordered points for both sides plus the shared undo log.
///
/// The log length always equals the total number of stored points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCollector {
    left: Vec<Point>,
    right: Vec<Point>,
    history: Vec<Side>,
}

impl PointCollector {
    /// An empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point to one side and record it in the history.
    pub fn add_point(&mut self, side: Side, point: Point) {
        self.side_mut(side).push(point);
        self.history.push(side);
    }

    /// Remove the most recently added point.
    ///
    /// Returns the side and point that were removed, or `None` if there
    /// was nothing to undo.
    pub fn undo_last(&mut self) -> Option<(Side, Point)> {
        let side = self.history.pop()?;
        // The log and the side lists are only ever changed together.
        let point = self.side_mut(side).pop()?;
        Some((side, point))
    }

    /// Drop every point and the history.
    pub fn clear(&mut self) {
        self.left.clear();
        self.right.clear();
        self.history.clear();
    }

    /// Points on one side, in pick order.
    #[must_use]
    pub fn points(&self, side: Side) -> &[Point] {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Number of points on one side.
    #[must_use]
    pub fn len(&self, side: Side) -> usize {
        self.points(side).len()
    }

    /// Whether no point has been added on either side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Side tags in the order points were added.
    #[must_use]
    pub fn history(&self) -> &[Side] {
        &self.history
    }

    /// The first two points of a side, if at least two were picked.
    #[must_use]
    pub fn pair(&self, side: Side) -> Option<[Point; 2]> {
        match self.points(side) {
            [a, b, ..] => Some([*a, *b]),
            _ => None,
        }
    }

    /// The first point of a side, if any.
    #[must_use]
    pub fn first(&self, side: Side) -> Option<Point> {
        self.points(side).first().copied()
    }

    const fn side_mut(&mut self, side: Side) -> &mut Vec<Point> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}
