//! Side-by-side composition of the finished pair.

use image::{Rgba, RgbaImage};

/// Fill colour for the area neither image covers.
pub const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Offset that vertically centres a `source_height` image within
/// `canvas_height`, rounded down.
#[must_use]
pub const fn vertical_offset(canvas_height: u32, source_height: u32) -> u32 {
    canvas_height.saturating_sub(source_height) / 2
}

/// Place `left` and `right` next to each other on a black canvas.
///
/// The canvas is `left.width + right.width` wide and as tall as the
/// taller input; each input is vertically centred. All offsets are whole
/// pixels so the seam between the two halves stays sharp.
#[must_use]
pub fn side_by_side(left: &RgbaImage, right: &RgbaImage) -> RgbaImage {
    let width = left.width() + right.width();
    let height = left.height().max(right.height());
    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);

    image::imageops::replace(
        &mut canvas,
        left,
        0,
        i64::from(vertical_offset(height, left.height())),
    );
    image::imageops::replace(
        &mut canvas,
        right,
        i64::from(left.width()),
        i64::from(vertical_offset(height, right.height())),
    );
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    #[test]
    fn shorter_left_is_centred() {
        let left = RgbaImage::from_pixel(100, 80, RED);
        let right = RgbaImage::from_pixel(100, 100, BLUE);
        let out = side_by_side(&left, &right);

        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(vertical_offset(100, 80), 10);
        assert_eq!(vertical_offset(100, 100), 0);

        // Left band: background above row 10 and from row 90 on.
        assert_eq!(*out.get_pixel(50, 9), BACKGROUND);
        assert_eq!(*out.get_pixel(50, 10), RED);
        assert_eq!(*out.get_pixel(50, 89), RED);
        assert_eq!(*out.get_pixel(50, 90), BACKGROUND);

        // Right half fully covered, starting exactly at the seam.
        assert_eq!(*out.get_pixel(99, 50), RED);
        assert_eq!(*out.get_pixel(100, 0), BLUE);
        assert_eq!(*out.get_pixel(199, 99), BLUE);
    }

    #[test]
    fn odd_height_difference_floors_offset() {
        let left = RgbaImage::from_pixel(10, 10, RED);
        let right = RgbaImage::from_pixel(20, 15, BLUE);
        let out = side_by_side(&left, &right);
        assert_eq!(out.dimensions(), (30, 15));
        assert_eq!(vertical_offset(15, 10), 2);
        assert_eq!(*out.get_pixel(0, 1), BACKGROUND);
        assert_eq!(*out.get_pixel(0, 2), RED);
        assert_eq!(*out.get_pixel(0, 11), RED);
        assert_eq!(*out.get_pixel(0, 12), BACKGROUND);
    }

    #[test]
    fn equal_sizes_have_no_background() {
        let left = RgbaImage::from_pixel(4, 3, RED);
        let right = RgbaImage::from_pixel(5, 3, BLUE);
        let out = side_by_side(&left, &right);
        assert!(out.pixels().all(|p| *p == RED || *p == BLUE));
    }
}
