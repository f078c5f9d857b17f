//! Line angle measurement between two picked points.
//!
//! Angles are measured in image coordinates, where `y` grows downward,
//! so a positive angle points below the horizontal.

use crate::types::Point;

/// Angle of the directed line `from -> to`, in degrees.
///
/// Computed as `atan2(Δy, Δx)` and normalized into `(-180°, 180°]`.
/// Reversing the point order shifts the result by exactly 180° (mod 360°).
#[must_use]
pub fn line_angle(from: Point, to: Point) -> f64 {
    let degrees = (to.y - from.y).atan2(to.x - from.x).to_degrees();
    // atan2 can return exactly -180 when Δy is -0.0.
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}
