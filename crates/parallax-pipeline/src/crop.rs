//! Anchor-aligned symmetric crop.
//!
//! Each image carries one anchor marking the same scene feature. For each
//! edge the crop keeps the smaller of the two anchor-to-edge distances,
//! so both outputs end up the same size with the anchor at the same
//! position in each.

use image::RgbaImage;

use crate::types::{AlignError, Dimensions, Point};

/// Distances kept on each side of the anchor, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropMargins {
    /// Pixels kept left of the anchor.
    pub left: u32,
    /// Pixels kept right of the anchor.
    pub right: u32,
    /// Pixels kept above the anchor.
    pub top: u32,
    /// Pixels kept below the anchor.
    pub bottom: u32,
}

impl CropMargins {
    /// Per-edge minimum of the anchor-to-edge distances, floored.
    ///
    /// Anchors are expected inside their image (`[0, w] × [0, h]`);
    /// anything outside is clamped so every margin is non-negative.
    #[must_use]
    pub fn from_anchors(
        left_anchor: Point,
        left_dims: Dimensions,
        right_anchor: Point,
        right_dims: Dimensions,
    ) -> Self {
        let lw = f64::from(left_dims.width);
        let lh = f64::from(left_dims.height);
        let rw = f64::from(right_dims.width);
        let rh = f64::from(right_dims.height);
        Self {
            left: floor_px(left_anchor.x.min(right_anchor.x)),
            right: floor_px((lw - left_anchor.x).min(rw - right_anchor.x)),
            top: floor_px(left_anchor.y.min(right_anchor.y)),
            bottom: floor_px((lh - left_anchor.y).min(rh - right_anchor.y)),
        }
    }

    /// Size shared by both cropped outputs.
    #[must_use]
    pub const fn dimensions(self) -> Dimensions {
        Dimensions {
            width: self.left + self.right,
            height: self.top + self.bottom,
        }
    }

    /// Top-left corner of the crop window within the image whose anchor
    /// is `anchor`.
    #[must_use]
    pub fn origin(self, anchor: Point) -> (u32, u32) {
        (
            floor_px(anchor.x - f64::from(self.left)),
            floor_px(anchor.y - f64::from(self.top)),
        )
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn floor_px(value: f64) -> u32 {
    value.floor().clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Crop both images around their anchors to a shared size.
///
/// After cropping, each anchor sits at `(margins.left, margins.top)` in
/// its output. `equal_zoom` is informational: the per-edge minimum
/// already handles pairs at equal and unequal magnification alike.
///
/// # Errors
///
/// Returns [`AlignError::EmptyCrop`] when the shared size has a zero
/// width or height, which happens when an anchor sits on an image edge.
pub fn crop_pair(
    left: &RgbaImage,
    left_anchor: Point,
    right: &RgbaImage,
    right_anchor: Point,
    equal_zoom: bool,
) -> Result<(RgbaImage, RgbaImage), AlignError> {
    let margins = CropMargins::from_anchors(
        left_anchor,
        Dimensions::of(left),
        right_anchor,
        Dimensions::of(right),
    );
    let size = margins.dimensions();
    log::debug!(
        "crop margins {margins:?} -> {}x{} (equal_zoom={equal_zoom})",
        size.width,
        size.height
    );
    if size.width == 0 || size.height == 0 {
        return Err(AlignError::EmptyCrop {
            width: size.width,
            height: size.height,
        });
    }
    Ok((
        crop_at(left, margins.origin(left_anchor), size),
        crop_at(right, margins.origin(right_anchor), size),
    ))
}

fn crop_at(image: &RgbaImage, (x, y): (u32, u32), size: Dimensions) -> RgbaImage {
    image::imageops::crop_imm(image, x, y, size.width, size.height).to_image()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::Rgba;

    use super::*;

    /// Image that is black except for a single marker pixel.
    fn marked(width: u32, height: u32, marker: (u32, u32)) -> RgbaImage {
        let mut img = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        img.put_pixel(marker.0, marker.1, Rgba([255, 0, 0, 255]));
        img
    }

    #[test]
    fn margins_take_per_edge_minimum() {
        let margins = CropMargins::from_anchors(
            Point::new(40.0, 50.0),
            Dimensions::new(100, 100),
            Point::new(50.0, 50.0),
            Dimensions::new(120, 100),
        );
        assert_eq!(
            margins,
            CropMargins {
                left: 40,
                right: 60,
                top: 50,
                bottom: 50,
            }
        );
        assert_eq!(margins.dimensions(), Dimensions::new(100, 100));
    }

    #[test]
    fn anchor_lands_at_same_position_in_both_outputs() {
        let left = marked(100, 100, (40, 50));
        let right = marked(120, 100, (50, 50));
        let (l, r) = crop_pair(
            &left,
            Point::new(40.0, 50.0),
            &right,
            Point::new(50.0, 50.0),
            false,
        )
        .unwrap();
        assert_eq!(l.dimensions(), (100, 100));
        assert_eq!(r.dimensions(), (100, 100));
        assert_eq!(l.get_pixel(40, 50).0, [255, 0, 0, 255]);
        assert_eq!(r.get_pixel(40, 50).0, [255, 0, 0, 255]);
    }

    #[test]
    fn fractional_anchors_floor_consistently() {
        let left = marked(80, 60, (30, 20));
        let right = marked(90, 70, (45, 33));
        let (l, r) = crop_pair(
            &left,
            Point::new(30.7, 20.2),
            &right,
            Point::new(45.4, 33.9),
            true,
        )
        .unwrap();
        assert_eq!(l.dimensions(), r.dimensions());
        // margins: left 30, top 20 -> both markers at (30, 20)
        assert_eq!(l.get_pixel(30, 20).0, [255, 0, 0, 255]);
        assert_eq!(r.get_pixel(30, 20).0, [255, 0, 0, 255]);
    }

    #[test]
    fn equal_zoom_flag_does_not_change_result() {
        let left = marked(64, 48, (10, 10));
        let right = marked(70, 50, (20, 12));
        let a = crop_pair(&left, Point::new(10.0, 10.0), &right, Point::new(20.0, 12.0), true)
            .unwrap();
        let b = crop_pair(&left, Point::new(10.0, 10.0), &right, Point::new(20.0, 12.0), false)
            .unwrap();
        assert_eq!(a.0.as_raw(), b.0.as_raw());
        assert_eq!(a.1.as_raw(), b.1.as_raw());
    }

    #[test]
    fn anchor_on_edge_yields_empty_crop_error() {
        let left = marked(50, 50, (0, 0));
        let right = marked(50, 50, (0, 0));
        let result = crop_pair(
            &left,
            Point::new(50.0, 25.0),
            &right,
            Point::new(10.0, 25.0),
            false,
        );
        // right margin: min(50 - 50, 50 - 10) = 0, left margin: 10
        assert!(result.is_ok());

        let result = crop_pair(
            &left,
            Point::new(0.0, 25.0),
            &right,
            Point::new(50.0, 25.0),
            false,
        );
        assert!(matches!(
            result,
            Err(AlignError::EmptyCrop { width: 0, height: 50 })
        ));
    }

    #[test]
    fn crop_windows_stay_inside_sources() {
        let left = marked(33, 21, (0, 0));
        let right = marked(47, 29, (0, 0));
        let la = Point::new(20.9, 10.5);
        let ra = Point::new(5.3, 4.6);
        let margins =
            CropMargins::from_anchors(la, Dimensions::of(&left), ra, Dimensions::of(&right));
        let size = margins.dimensions();
        for (anchor, img) in [(la, &left), (ra, &right)] {
            let (x, y) = margins.origin(anchor);
            assert!(x + size.width <= img.width());
            assert!(y + size.height <= img.height());
        }
    }
}
