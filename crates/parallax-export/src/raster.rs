//! Raster export.
//!
//! Turns an RGBA buffer into encoded file bytes. JPEG has no alpha
//! channel, so the buffer is flattened to RGB first; PNG keeps all four
//! channels and ignores the quality value.
//!
//! This is a pure function with no I/O -- it returns a `Vec<u8>`.

use std::fmt;
use std::path::Path;

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use parallax_pipeline::RgbaImage;
use serde::{Deserialize, Serialize};

/// JPEG quality used when the caller does not choose one.
pub const DEFAULT_JPEG_QUALITY: u8 = 92;

/// Errors that can occur while encoding an output image.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The encoder rejected the buffer.
    #[error("failed to encode {format}: {source}")]
    Encode {
        /// Format being written.
        format: OutputFormat,
        /// Underlying encoder error.
        source: image::ImageError,
    },

    /// The output path's extension names no supported format.
    #[error("cannot infer output format from {0:?}; use .jpg, .jpeg or .png")]
    UnknownExtension(String),
}

/// Supported output file formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossy JPEG, the usual choice for photographs.
    #[default]
    Jpeg,
    /// Lossless PNG.
    Png,
}

impl OutputFormat {
    /// Infer the format from a file extension (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::UnknownExtension`] when the path has no
    /// extension or one that is not `jpg`, `jpeg` or `png`.
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jpg" | "jpeg") => Ok(Self::Jpeg),
            Some("png") => Ok(Self::Png),
            _ => Err(ExportError::UnknownExtension(path.display().to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => f.write_str("JPEG"),
            Self::Png => f.write_str("PNG"),
        }
    }
}

/// Encode `image` as `format`.
///
/// `quality` applies to JPEG only and is clamped to `1..=100`.
///
/// # Errors
///
/// Returns [`ExportError::Encode`] if the underlying encoder fails.
pub fn encode(
    image: &RgbaImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    let (width, height) = image.dimensions();
    let written = match format {
        OutputFormat::Jpeg => {
            let rgb: RgbImage = image.convert();
            JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => PngEncoder::new(&mut buf).write_image(
            image.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        ),
    };
    written.map_err(|source| ExportError::Encode { format, source })?;
    Ok(buf)
}
