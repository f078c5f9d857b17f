//! parallax-pipeline: Stereo pair alignment (sans-IO).
//!
//! Takes two photos of the same scene, one per eye, and corrects them
//! into a matched pair through a short wizard:
//! rotate -> scale -> crop -> side-by-side result.
//!
//! Each correction stage is driven by points the operator picks on both
//! images. [`PipelineController`] owns the buffers and the stage machine;
//! [`ViewportMapper`] turns clicks on a zoomed, panned view into image
//! coordinates; [`PointCollector`] keeps the picks with a shared undo log.
//!
//! This crate has **no I/O dependencies** -- it decodes in-memory byte
//! slices and hands back RGBA buffers. Reading files and encoding the
//! final image live in the `parallax` binary and `parallax-export`.

pub mod angle;
pub mod compose;
pub mod crop;
pub mod decode;
pub mod pipeline;
pub mod points;
pub mod rotate;
pub mod scale;
pub mod types;
pub mod viewport;

pub use decode::decode;
pub use pipeline::{ApplyOutcome, PipelineController, SessionSnapshot, Stage};
pub use points::PointCollector;
pub use rotate::RotationInterpolation;
pub use scale::ResampleFilter;
pub use types::{
    AlignError, Dimensions, GeometryConfig, Point, ProcessingOptions, RgbaImage, Side,
    WorkingPair,
};
pub use viewport::{PointerRelease, ScreenPoint, Viewport, ViewportConfig, ViewportMapper};
