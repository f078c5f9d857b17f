//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces the RGBA
//! buffer the pipeline works on. Callers finish decoding both images
//! before handing them to the controller.

use image::RgbaImage;

use crate::types::AlignError;

/// Decode raw image bytes into an RGBA buffer.
///
/// # Errors
///
/// Returns [`AlignError::EmptyInput`] if `bytes` is empty.
/// Returns [`AlignError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage, AlignError> {
    if bytes.is_empty() {
        return Err(AlignError::EmptyInput);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(img.to_rgba8())
}
