//! Depth-tri-layer segmentation
//!
//! Buckets pixels into far/mid/near bands from a monocular depth prediction.
//! The depth model is an opaque collaborator behind [`DepthEstimator`]; the
//! band cut-points are computed per image from the depth distribution, so
//! the partition self-calibrates instead of relying on fixed cutoffs.

use crate::{
    compositor,
    config::DepthSegmentConfig,
    error::{Result, SegmentationError},
    mask,
    services::ImageIoService,
    types::{luma_from_raw, DepthSegmentation, DepthThresholds, Mask, ScoreMap},
};
use image::{imageops, ImageBuffer, Luma, RgbImage};
use log::{debug, info};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Monocular depth estimation collaborator
///
/// Implementations take an RGB image and return a single-channel depth
/// prediction, typically at a reduced or fixed resolution. Higher score
/// means closer to the camera. Any model-specific input transform happens
/// inside the implementation; the engine resizes the prediction back to the
/// source resolution itself.
pub trait DepthEstimator {
    /// Predict a depth map for the image
    ///
    /// # Errors
    /// Any failure is fatal for the segmentation call; no partial layers
    /// are produced.
    fn estimate(&mut self, image: &RgbImage) -> Result<ScoreMap>;
}

impl<F> DepthEstimator for F
where
    F: FnMut(&RgbImage) -> Result<ScoreMap>,
{
    fn estimate(&mut self, image: &RgbImage) -> Result<ScoreMap> {
        self(image)
    }
}

/// Output file paths produced by [`segment_depth_file`]
#[derive(Debug, Clone)]
pub struct DepthLayerFiles {
    /// Near band layer (`foreground.png`)
    pub foreground: PathBuf,
    /// Mid band layer (`midground.png`)
    pub midground: PathBuf,
    /// Far band layer (`background.png`)
    pub background: PathBuf,
    /// Normalized depth visualization (`depth_map.png`)
    pub depth_map: PathBuf,
    /// Adaptive thresholds used for the band partition
    pub thresholds: DepthThresholds,
}

/// Linear-interpolated percentile of sorted samples
///
/// Matches the numpy convention: rank `(n - 1) * q / 100`, interpolating
/// between the surrounding order statistics.
pub(crate) fn percentile(sorted: &[u8], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (sorted.len() - 1) as f64 * (q / 100.0);
    let lower = rank.floor() as usize;
    let fraction = rank - rank.floor();
    let low = f64::from(sorted.get(lower).copied().unwrap_or(0));
    let high = f64::from(sorted.get(lower + 1).copied().unwrap_or_else(|| {
        sorted.last().copied().unwrap_or(0)
    }));
    low + fraction * (high - low)
}

/// Resize a depth prediction to the target resolution
///
/// Uses Catmull-Rom (bicubic-equivalent) interpolation; predictions are
/// never cropped or padded to fit.
fn resize_score_map(map: &ScoreMap, width: u32, height: u32) -> Result<ScoreMap> {
    let (map_width, map_height) = map.dimensions();
    let samples: Vec<f32> = map.values().iter().copied().collect();
    let buffer = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(map_width, map_height, samples)
        .ok_or_else(|| {
            SegmentationError::depth_estimation("Depth prediction has malformed shape")
        })?;

    let resized = imageops::resize(&buffer, width, height, imageops::FilterType::CatmullRom);
    let values = Array2::from_shape_vec(
        (height as usize, width as usize),
        resized.into_raw(),
    )
    .map_err(|e| SegmentationError::processing(format!("Resized depth map shape error: {e}")))?;
    Ok(ScoreMap::new(values))
}

/// Gaussian-smooth a depth map to suppress single-pixel noise
fn smooth_score_map(map: &ScoreMap, sigma: f32) -> Result<ScoreMap> {
    if sigma <= 0.0 {
        return Ok(map.clone());
    }
    let (width, height) = map.dimensions();
    let samples: Vec<f32> = map.values().iter().copied().collect();
    let buffer = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(width, height, samples)
        .ok_or_else(|| SegmentationError::processing("Depth map buffer allocation failed"))?;

    let blurred = imageops::blur(&buffer, sigma);
    let values = Array2::from_shape_vec((height as usize, width as usize), blurred.into_raw())
        .map_err(|e| {
            SegmentationError::processing(format!("Smoothed depth map shape error: {e}"))
        })?;
    Ok(ScoreMap::new(values))
}

/// Segment an image into far/mid/near layers from estimated depth
///
/// Pipeline: depth prediction, bicubic resize back to source resolution,
/// Gaussian smoothing, min-max normalization to 0-255, percentile band
/// partition, per-band morphological closing, compositing. The three band
/// masks are mutually exclusive and jointly exhaustive before cleanup.
///
/// # Errors
/// Depth estimation failure or a malformed prediction aborts the call; no
/// partial layers are produced.
pub fn segment_by_depth(
    image: &RgbImage,
    estimator: &mut dyn DepthEstimator,
    config: &DepthSegmentConfig,
) -> Result<DepthSegmentation> {
    config.validate()?;

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(SegmentationError::processing("Cannot segment an empty image"));
    }

    let prediction = estimator.estimate(image)?;
    let (pred_width, pred_height) = prediction.dimensions();
    if pred_width == 0 || pred_height == 0 {
        return Err(SegmentationError::depth_estimation(
            "Depth estimator returned an empty prediction",
        ));
    }
    debug!("Depth prediction: {pred_width}x{pred_height}");

    let depth = if (pred_width, pred_height) == (width, height) {
        prediction
    } else {
        debug!("Resizing depth prediction to {width}x{height}");
        resize_score_map(&prediction, width, height)?
    };

    let depth = smooth_score_map(&depth, config.smoothing_sigma)?;
    let normalized = depth.to_normalized_u8();

    let mut sorted = normalized.clone();
    sorted.sort_unstable();
    let lower = percentile(&sorted, config.lower_percentile);
    let upper = percentile(&sorted, config.upper_percentile);
    info!("Adaptive thresholds - near: >{upper:.1}, far: <{lower:.1}");

    let value_at = |x: u32, y: u32| -> f64 {
        let index = (y * width + x) as usize;
        f64::from(normalized.get(index).copied().unwrap_or(0))
    };

    let near_mask = Mask::from_fn(width, height, |x, y| value_at(x, y) > upper);
    let far_mask = Mask::from_fn(width, height, |x, y| value_at(x, y) < lower);
    let mid_mask = Mask::from_fn(width, height, |x, y| {
        let v = value_at(x, y);
        v >= lower && v <= upper
    });

    let near_mask = mask::morph_close(&near_mask, config.close_radius);
    let mid_mask = mask::morph_close(&mid_mask, config.close_radius);
    let far_mask = mask::morph_close(&far_mask, config.close_radius);

    Ok(DepthSegmentation {
        near: compositor::composite(image, &near_mask)?,
        mid: compositor::composite(image, &mid_mask)?,
        far: compositor::composite(image, &far_mask)?,
        depth_map: luma_from_raw(width, height, normalized)?,
        thresholds: DepthThresholds {
            lower: lower as f32,
            upper: upper as f32,
        },
    })
}

/// Run depth segmentation on an image file and persist the layers
///
/// Writes `foreground.png`, `midground.png`, `background.png`, and the
/// intermediate `depth_map.png` into `output_dir`, or the current working
/// directory when no directory is given.
///
/// # Errors
/// Fails when the input cannot be loaded, the depth estimator fails, or
/// the output files cannot be written.
pub fn segment_depth_file<P: AsRef<Path>>(
    input_path: P,
    output_dir: Option<&Path>,
    estimator: &mut dyn DepthEstimator,
    config: &DepthSegmentConfig,
) -> Result<DepthLayerFiles> {
    let input_path = input_path.as_ref();
    info!("Loading: {}", input_path.display());

    let image = ImageIoService::load_image(input_path)?.to_rgb8();
    let segmentation = segment_by_depth(&image, estimator, config)?;

    let dir = output_dir.unwrap_or_else(|| Path::new("."));
    let paths = DepthLayerFiles {
        foreground: dir.join("foreground.png"),
        midground: dir.join("midground.png"),
        background: dir.join("background.png"),
        depth_map: dir.join("depth_map.png"),
        thresholds: segmentation.thresholds,
    };

    ImageIoService::save_gray_png(&segmentation.depth_map, &paths.depth_map)?;
    ImageIoService::save_rgba_png(&segmentation.near, &paths.foreground)?;
    ImageIoService::save_rgba_png(&segmentation.mid, &paths.midground)?;
    ImageIoService::save_rgba_png(&segmentation.far, &paths.background)?;

    info!(
        "Saved depth_map.png, foreground.png, midground.png, background.png to {}",
        dir.display()
    );

    Ok(paths)
}
