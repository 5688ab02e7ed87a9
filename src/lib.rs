#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Layercut
//!
//! A Rust library for splitting images into composable layers. Two
//! segmentation strategies are provided: color-distance separation of a
//! dominant background from the foreground, and depth-based separation of
//! an image into near, mid, and far bands using an ONNX depth estimation
//! model.
//!
//! ## Features
//!
//! - **Color segmentation**: auto-detected or manual background color,
//!   tolerance-based foreground extraction, noise removal, edge smoothing
//! - **Depth segmentation**: adaptive percentile thresholds split the scene
//!   into three mutually exclusive bands
//! - **Hardware Acceleration**: CUDA, `CoreML`, and CPU execution providers
//! - **CLI Integration**: Optional command-line interface (enable with the
//!   `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use image::RgbImage;
//! use layercut::{segment_by_color, ColorSegmentConfig};
//!
//! # fn example() -> layercut::Result<()> {
//! let image = RgbImage::from_pixel(64, 64, image::Rgb([255, 255, 255]));
//!
//! let config = ColorSegmentConfig::builder()
//!     .tolerance_percent(12.0)
//!     .build()?;
//! let result = segment_by_color(&image, &config)?;
//!
//! println!("{:.1}% foreground", result.diagnostics.foreground_percent_final);
//! # Ok(())
//! # }
//! ```
//!
//! Depth segmentation works against any [`DepthEstimator`]; the `onnx`
//! feature provides [`OnnxDepthEstimator`] for `MiDaS`-style models:
//!
//! ```rust,no_run
//! # #[cfg(feature = "onnx")]
//! # fn example() -> anyhow::Result<()> {
//! use layercut::{
//!     segment_depth_file, DepthSegmentConfig, ExecutionProvider, OnnxDepthEstimator,
//! };
//!
//! let mut estimator = OnnxDepthEstimator::from_file("midas.onnx", ExecutionProvider::Auto)?;
//! let config = DepthSegmentConfig::default();
//! let layers = segment_depth_file("photo.jpg", None, &mut estimator, &config)?;
//! println!("near layer at {}", layers.foreground.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `onnx` (default): ONNX Runtime depth estimation backend
//! - `cli` (default): Command-line interface and progress reporting
//! - `webp-support` (default): `WebP` image format support

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod compositor;
pub mod config;
pub mod depth;
pub mod error;
pub mod mask;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
pub use backends::*;
pub use color::{
    color_distance_map, estimate_background_color, segment_by_color, segment_color_file,
    ColorLayerFiles,
};
pub use compositor::composite;
pub use config::{
    BackgroundColor, ColorSegmentConfig, ColorSegmentConfigBuilder, DepthSegmentConfig,
    DepthSegmentConfigBuilder,
};
pub use depth::{segment_by_depth, segment_depth_file, DepthEstimator, DepthLayerFiles};
pub use error::{Result, SegmentationError};
pub use mask::{morph_close, remove_small_components, soften_edges};
pub use services::ImageIoService;
pub use types::{
    ColorSegmentation, DepthSegmentation, DepthThresholds, Mask, MaskStatistics, ScoreMap,
    SegmentationDiagnostics, TuningAdvisory, MASK_ON_THRESHOLD,
};
