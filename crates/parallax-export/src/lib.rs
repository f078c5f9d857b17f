//! parallax-export: Pure raster encoders (sans-IO)
//!
//! Encodes the merged side-by-side image into an output file format.
//! Supports JPEG (with a quality setting) and PNG.

pub mod raster;

pub use raster::{DEFAULT_JPEG_QUALITY, ExportError, OutputFormat, encode};
