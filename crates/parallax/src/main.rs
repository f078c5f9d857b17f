//! parallax: align a stereo photo pair from the command line.
//!
//! Loads a left and a right image, replays a recorded session script of
//! point picks and stage applies, and writes the merged side-by-side
//! image.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin parallax -- left.jpg right.jpg \
//!     --script session.json --output pair.jpg
//! ```
//!
//! Set `RUST_LOG` (or pass `-v`) for more detail on each stage.

#![allow(clippy::print_stdout)]

mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use parallax_export::{DEFAULT_JPEG_QUALITY, OutputFormat};
use parallax_pipeline::{
    AlignError, GeometryConfig, PipelineController, ProcessingOptions, ResampleFilter,
    RotationInterpolation, Side, Stage, ViewportConfig,
};

use crate::script::Session;

/// Align a stereo photo pair into a matched side-by-side image.
///
/// Each correction stage (rotate, scale, crop) needs points picked on
/// both images; supply them with `--script`. Stages can be skipped with
/// the `--equal-*` flags.
#[derive(Parser)]
#[command(name = "parallax", version)]
struct Cli {
    /// Left-eye image (PNG, JPEG, BMP, WebP).
    left: PathBuf,

    /// Right-eye image (PNG, JPEG, BMP, WebP).
    right: PathBuf,

    /// Session script: a JSON array of point, click, drag, zoom, fit,
    /// undo, apply and `rotate_left_image` events.
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Where to write the merged image.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format. Inferred from the output extension when omitted.
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality (1-100). Ignored for PNG.
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(0..=100))]
    quality: u8,

    /// Both photos share the same camera roll: skip rotation.
    #[arg(long)]
    equal_tilt: bool,

    /// Both photos share the same magnification: skip scaling.
    #[arg(long)]
    equal_zoom: bool,

    /// The photos are already aligned: merge them straight away.
    #[arg(long)]
    equal_framing: bool,

    /// Rotate the left image instead of the right one.
    #[arg(long)]
    rotate_left: bool,

    /// Full processing options as a JSON string.
    ///
    /// When provided, the `--equal-*` and `--rotate-left` flags are
    /// ignored. The JSON must be a valid `ProcessingOptions`
    /// serialization.
    #[arg(long)]
    options_json: Option<String>,

    /// Sampling used when rotating.
    #[arg(long, value_enum, default_value_t = Interpolation::Bilinear)]
    interpolation: Interpolation,

    /// Resampling filter used when scaling.
    #[arg(long, value_enum, default_value_t = Filter::Triangle)]
    filter: Filter,

    /// Largest image the scale stage may produce, in pixels.
    #[arg(long, default_value_t = GeometryConfig::DEFAULT_MAX_SCALED_PIXELS)]
    max_pixels: u64,

    /// View tunables (fit margin, zoom factors, click tolerance) as a
    /// JSON `ViewportConfig`. Missing fields keep their defaults.
    #[arg(long)]
    view_json: Option<String>,

    /// Size of each simulated view, used to map script clicks.
    #[arg(long, value_name = "WxH", default_value = "800x600", value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Print the final session state as JSON on stdout.
    #[arg(long)]
    dump_state: bool,

    /// Log stage details (same as `RUST_LOG=debug`).
    #[arg(short, long)]
    verbose: bool,
}

/// Output format selection.
#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// JPEG.
    Jpeg,
    /// PNG.
    Png,
}

/// Rotation sampling selection.
#[derive(Clone, Copy, ValueEnum)]
enum Interpolation {
    /// Nearest-neighbor (fast, jagged).
    Nearest,
    /// Bilinear (smooth).
    Bilinear,
}

/// Scale resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Errors that end a CLI run.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("error reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error parsing --options-json: {0}")]
    Options(serde_json::Error),
    #[error("error parsing --view-json: {0}")]
    View(serde_json::Error),
    #[error("error parsing script {}: {source}", path.display())]
    Script {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{side} image: {source}")]
    Decode { side: Side, source: AlignError },
    #[error(transparent)]
    Align(#[from] AlignError),
    #[error(transparent)]
    Export(#[from] parallax_export::ExportError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("session ended in the {0} stage; the script needs more points or applies")]
    Unfinished(Stage),
}

/// Parse `--viewport "WxH"` into positive view dimensions.
fn parse_viewport(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("viewport must be 'WxH', got: '{s}'"))?;
    let parse = |v: &str| -> Result<f64, String> {
        let value: f64 = v
            .trim()
            .parse()
            .map_err(|e| format!("invalid viewport size '{v}': {e}"))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(format!("viewport size must be positive, got {value}"))
        }
    };
    Ok((parse(w)?, parse(h)?))
}

/// Build [`ProcessingOptions`] from CLI arguments.
///
/// If `--options-json` is provided, it is parsed directly and the
/// individual flags are ignored.
fn options_from_cli(cli: &Cli) -> Result<ProcessingOptions, CliError> {
    if let Some(ref json) = cli.options_json {
        return serde_json::from_str(json).map_err(CliError::Options);
    }
    Ok(ProcessingOptions {
        assume_equal_tilt: cli.equal_tilt,
        assume_equal_zoom: cli.equal_zoom,
        assume_equal_framing: cli.equal_framing,
        rotate_left_image: cli.rotate_left,
    })
}

/// Parse and validate `--view-json`, or fall back to the defaults.
fn view_config_from_cli(cli: &Cli) -> Result<ViewportConfig, CliError> {
    let Some(ref json) = cli.view_json else {
        return Ok(ViewportConfig::default());
    };
    let config: ViewportConfig = serde_json::from_str(json).map_err(CliError::View)?;
    config.validate()?;
    Ok(config)
}

const fn geometry_from_cli(cli: &Cli) -> GeometryConfig {
    GeometryConfig {
        rotation_interpolation: match cli.interpolation {
            Interpolation::Nearest => RotationInterpolation::Nearest,
            Interpolation::Bilinear => RotationInterpolation::Bilinear,
        },
        resample_filter: match cli.filter {
            Filter::Nearest => ResampleFilter::Nearest,
            Filter::Triangle => ResampleFilter::Triangle,
            Filter::CatmullRom => ResampleFilter::CatmullRom,
            Filter::Gaussian => ResampleFilter::Gaussian,
            Filter::Lanczos3 => ResampleFilter::Lanczos3,
        },
        max_scaled_pixels: cli.max_pixels,
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CliError> {
    std::fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load(controller: &mut PipelineController, side: Side, path: &Path) -> Result<(), CliError> {
    let bytes = read(path)?;
    let image =
        parallax_pipeline::decode(&bytes).map_err(|source| CliError::Decode { side, source })?;
    log::info!(
        "{side}: {} ({}x{}, {} bytes)",
        path.display(),
        image.width(),
        image.height(),
        bytes.len()
    );
    controller.load(side, image)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let options = options_from_cli(cli)?;
    let view_config = view_config_from_cli(cli)?;
    let mut controller = PipelineController::new(options, geometry_from_cli(cli));
    load(&mut controller, Side::Left, &cli.left)?;
    load(&mut controller, Side::Right, &cli.right)?;
    controller.start()?;

    let mut session = Session::new(controller, view_config, cli.viewport);
    if let Some(ref path) = cli.script {
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        let events = script::parse(&json).map_err(|source| CliError::Script {
            path: path.clone(),
            source,
        })?;
        log::info!("replaying {} events from {}", events.len(), path.display());
        session.replay(&events);
    }
    let controller = session.controller();

    if cli.dump_state {
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
    }

    let Some(result) = controller.result() else {
        return Err(CliError::Unfinished(controller.stage()));
    };
    log::info!("merged image {}x{}", result.width(), result.height());

    let Some(ref output) = cli.output else {
        log::info!("no --output given; nothing written");
        return Ok(());
    };
    let format = match cli.format {
        Some(Format::Jpeg) => OutputFormat::Jpeg,
        Some(Format::Png) => OutputFormat::Png,
        None => OutputFormat::from_path(output)?,
    };
    let bytes = parallax_export::encode(result, format, cli.quality)?;
    std::fs::write(output, &bytes).map_err(|source| CliError::Write {
        path: output.clone(),
        source,
    })?;
    log::info!(
        "{format} written to {} ({} bytes)",
        output.display(),
        bytes.len()
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
