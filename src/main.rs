//! `zncc-depth` - dense disparity map from a rectified stereo pair.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use zncc_stereo_rs::disparity_pipeline::{
    BackendKind, DisparityPipeline, OutputFormat, StereoConfig, TiffCompression,
};
use zncc_stereo_rs::logger::{self, error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Cpu,
    Cuda,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    DeflateBalanced,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::DeflateBalanced => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

/// Compute a ZNCC disparity map from a left/right image pair.
#[derive(Parser, Debug)]
#[command(name = "zncc-depth")]
#[command(version, about, long_about = None)]
struct Args {
    /// Left image of the stereo pair.
    #[arg(long, default_value = "im0.png", value_name = "PATH")]
    left: PathBuf,

    /// Right image of the stereo pair.
    #[arg(long, default_value = "im1.png", value_name = "PATH")]
    right: PathBuf,

    /// Output disparity image (.png, or .tif/.tiff for TIFF).
    #[arg(short, long, default_value = "depthmap.png", value_name = "PATH")]
    output: PathBuf,

    /// Downscale factor applied on each axis before matching.
    #[arg(long, default_value_t = 4, value_name = "INT")]
    downscale: usize,

    /// Half width of the matching window.
    #[arg(long, default_value_t = 8, value_name = "INT")]
    half_window_x: usize,

    /// Half height of the matching window.
    #[arg(long, default_value_t = 15, value_name = "INT")]
    half_window_y: usize,

    /// Largest disparity searched, in downscaled pixels.
    #[arg(long, default_value_t = 64, value_name = "INT")]
    max_disparity: u8,

    /// Largest left/right disagreement kept by the cross-check.
    #[arg(long, default_value_t = 2, value_name = "INT")]
    threshold: u8,

    /// Backend running preprocessing, matching and cross-checking.
    #[arg(long, value_enum, default_value_t = BackendArg::Cpu)]
    backend: BackendArg,

    /// Worker threads for the CPU backend (defaults to one per core).
    #[arg(long, value_name = "INT")]
    threads: Option<usize>,

    /// Compression used when writing TIFF output.
    #[arg(long, value_enum, default_value_t = CompressionArg::None)]
    compression: CompressionArg,

    /// Also write every intermediate image into this directory.
    #[arg(long, value_name = "DIR")]
    dump_dir: Option<PathBuf>,

    /// Accept images smaller than the matching window.
    #[arg(long)]
    no_validate: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    logger::init(if args.verbose { "debug" } else { "info" });

    if let Err(err) = run(&args) {
        error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    let config = StereoConfig::builder()
        .downscale(args.downscale)
        .window(args.half_window_x, args.half_window_y)
        .max_disparity(args.max_disparity)
        .cross_check_threshold(args.threshold)
        .backend(match args.backend {
            BackendArg::Cpu => BackendKind::Cpu,
            BackendArg::Cuda => BackendKind::Cuda,
        })
        .threads(args.threads)
        .output_format(OutputFormat::from_path(&args.output, args.compression.into()))
        .validate_dimensions(!args.no_validate)
        .build();

    let pipeline = DisparityPipeline::new(config).context("Failed to initialize pipeline")?;

    info!(
        "Window {}x{}, max disparity {}, threshold {}, backend {}",
        pipeline.config().window.width(),
        pipeline.config().window.height(),
        pipeline.config().max_disparity,
        pipeline.config().cross_check_threshold,
        pipeline.backend_name()
    );

    let outputs = pipeline
        .convert_files(&args.left, &args.right, &args.output)
        .context("Failed to compute disparity map")?;

    if let Some(dir) = &args.dump_dir {
        pipeline
            .write_intermediates(&outputs, dir)
            .context("Failed to write intermediate images")?;
    }

    outputs.timings.log_summary();
    info!(
        "Wrote {}x{} disparity map to {}",
        outputs.disparity.width,
        outputs.disparity.height,
        args.output.display()
    );

    Ok(())
}
