//! Layer segmentation CLI tool
//!
//! Command-line interface for splitting images into layers by background
//! color or by estimated depth.

use super::config::CliConfigBuilder;
use crate::{
    color::segment_color_file,
    tracing_config::{TracingConfig, TracingFormat},
    types::TuningAdvisory,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Image layer segmentation CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "layercut")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split images into foreground and background by color distance
    Color(ColorArgs),
    /// Split images into near, mid, and far bands by estimated depth
    Depth(DepthArgs),
}

#[derive(Args)]
pub struct ColorArgs {
    /// Input image files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory [default: next to each input file]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Color distance tolerance in percent (0-100)
    #[arg(short, long, default_value_t = 12.0)]
    pub tolerance: f32,

    /// Background color as R,G,B (e.g. 255,255,255) [default: auto-detect from corners]
    #[arg(short, long, value_name = "R,G,B")]
    pub background: Option<String>,

    /// Disable morphological closing and edge softening
    #[arg(long)]
    pub no_smoothing: bool,

    /// Gaussian kernel size for edge softening (odd)
    #[arg(long, default_value_t = 3)]
    pub blur_kernel: u32,

    /// Keep small isolated regions instead of removing them
    #[arg(long)]
    pub keep_noise: bool,

    /// Minimum region area in pixels kept by noise removal
    #[arg(long, default_value_t = 200)]
    pub min_area: u32,

    /// Print per-file diagnostics as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DepthArgs {
    /// Input image files or directories
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output directory [default: current working directory]
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to the ONNX depth estimation model
    #[arg(short, long, value_name = "MODEL")]
    pub model: PathBuf,

    /// Execution provider (auto, cpu, cuda, coreml)
    #[arg(short, long, default_value = "auto")]
    pub execution_provider: String,

    /// Lower depth percentile for the far band boundary (0-100)
    #[arg(long, default_value_t = 25.0)]
    pub lower_percentile: f64,

    /// Upper depth percentile for the near band boundary (0-100)
    #[arg(long, default_value_t = 75.0)]
    pub upper_percentile: f64,

    /// Gaussian sigma applied to the depth map before banding
    #[arg(long, default_value_t = 1.0)]
    pub sigma: f32,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    match &cli.command {
        Command::Color(args) => run_color(args),
        Command::Depth(args) => run_depth(args),
    }
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    TracingConfig::new()
        .with_verbosity(verbose_count)
        .with_format(TracingFormat::Console)
        .init()
        .context("Failed to initialize tracing subscriber")?;

    if verbose_count > 0 {
        tracing::debug!(verbosity = verbose_count, "Tracing initialized");
    }

    Ok(())
}

fn run_color(args: &ColorArgs) -> Result<()> {
    let config = CliConfigBuilder::color_config(args)?;
    let files = collect_input_files(&args.inputs)?;

    info!("Found {} image(s) to process", files.len());
    prepare_output_dir(args.output_dir.as_deref())?;

    let progress = batch_progress(files.len());
    let start_time = Instant::now();
    let mut processed_count = 0usize;
    let mut failed_count = 0usize;

    for file in &files {
        if let Some(pb) = &progress {
            pb.set_message(format!("Processing {}", file.display()));
        }

        match segment_color_file(file, args.output_dir.as_deref(), &config) {
            Ok(layers) => {
                processed_count += 1;
                info!(
                    "Wrote {} and {}",
                    layers.foreground.display(),
                    layers.background.display()
                );
                report_diagnostics(file, &layers.diagnostics.advisory, layers.diagnostics.foreground_percent_final);
                if args.json {
                    let line = serde_json::to_string(&layers.diagnostics)
                        .context("Failed to serialize diagnostics")?;
                    println!("{line}");
                }
            },
            Err(e) => {
                failed_count += 1;
                error!("Failed to process {}: {e}", file.display());
            },
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = &progress {
        pb.finish_with_message("Done");
    }

    finish_batch(processed_count, failed_count, start_time)
}

fn run_depth(args: &DepthArgs) -> Result<()> {
    #[cfg(feature = "onnx")]
    {
        use crate::backends::OnnxDepthEstimator;
        use crate::depth::segment_depth_file;

        let config = CliConfigBuilder::depth_config(args)?;
        let provider = CliConfigBuilder::parse_provider(&args.execution_provider)?;
        let files = collect_input_files(&args.inputs)?;

        info!("Found {} image(s) to process", files.len());
        prepare_output_dir(args.output_dir.as_deref())?;

        let mut estimator = OnnxDepthEstimator::from_file(&args.model, provider)
            .with_context(|| format!("Failed to load depth model {}", args.model.display()))?;

        let progress = batch_progress(files.len());
        let start_time = Instant::now();
        let mut processed_count = 0usize;
        let mut failed_count = 0usize;

        for file in &files {
            if let Some(pb) = &progress {
                pb.set_message(format!("Processing {}", file.display()));
            }

            match segment_depth_file(file, args.output_dir.as_deref(), &mut estimator, &config) {
                Ok(layers) => {
                    processed_count += 1;
                    info!(
                        "Wrote {}, {}, {} (bands split at {:.1}/{:.1})",
                        layers.foreground.display(),
                        layers.midground.display(),
                        layers.background.display(),
                        layers.thresholds.lower,
                        layers.thresholds.upper
                    );
                },
                Err(e) => {
                    failed_count += 1;
                    error!("Failed to process {}: {e}", file.display());
                },
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &progress {
            pb.finish_with_message("Done");
        }

        finish_batch(processed_count, failed_count, start_time)
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = args;
        anyhow::bail!(
            "Depth segmentation requires the 'onnx' feature. Rebuild with --features onnx."
        );
    }
}

/// Print tuning hints for a color segmentation result
fn report_diagnostics(file: &Path, advisory: &TuningAdvisory, foreground_percent: f32) {
    info!("{}: {foreground_percent:.1}% foreground", file.display());
    match advisory {
        TuningAdvisory::Balanced => {},
        other => warn!("{}: {other}", file.display()),
    }
}

/// Collect image files from the provided inputs (files and directories)
fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut all_files = Vec::new();

    for path in inputs {
        if path.is_file() {
            if is_image_file(path) {
                all_files.push(path.clone());
            } else {
                warn!("Skipping unsupported file: {}", path.display());
            }
        } else if path.is_dir() {
            for entry in std::fs::read_dir(path)
                .with_context(|| format!("Failed to read directory {}", path.display()))?
            {
                let entry = entry?;
                let entry_path = entry.path();
                if entry_path.is_file() && is_image_file(&entry_path) {
                    all_files.push(entry_path);
                }
            }
        } else {
            anyhow::bail!(
                "Input path does not exist or is not accessible: {}",
                path.display()
            );
        }
    }

    if all_files.is_empty() {
        anyhow::bail!("No supported image files found in the provided inputs");
    }

    // Sort files alphanumerically for consistent processing order
    all_files.sort();
    Ok(all_files)
}

/// Check if file is an image based on extension
fn is_image_file(path: &Path) -> bool {
    let extensions = ["jpg", "jpeg", "png", "webp"];
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext.to_lowercase().as_str()))
}

/// Create the output directory if requested and missing
fn prepare_output_dir(output_dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = output_dir {
        if dir.is_file() {
            anyhow::bail!(
                "Output path exists and is a file, not a directory: {}",
                dir.display()
            );
        }
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

/// Progress bar for multi-file batches
fn batch_progress(file_count: usize) -> Option<ProgressBar> {
    if file_count > 1 {
        let pb = ProgressBar::new(file_count as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        Some(pb)
    } else {
        None
    }
}

/// Summarize a batch run and fail if anything went wrong
fn finish_batch(processed_count: usize, failed_count: usize, start_time: Instant) -> Result<()> {
    let total_time = start_time.elapsed();
    info!(
        "Processed {} image(s) in {:.2}s",
        processed_count,
        total_time.as_secs_f64()
    );

    if failed_count > 0 {
        anyhow::bail!("{failed_count} input(s) failed to process");
    }
    Ok(())
}
