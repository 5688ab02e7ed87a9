//! Color-distance segmentation
//!
//! Classifies each pixel as foreground or background by its Euclidean RGB
//! distance from a reference background color, then cleans the resulting
//! mask and composites the layers. Works best on images with a dominant,
//! roughly uniform background such as comic panels.

use crate::{
    compositor,
    config::{BackgroundColor, ColorSegmentConfig},
    error::Result,
    mask,
    services::ImageIoService,
    types::{ColorSegmentation, Mask, ScoreMap, SegmentationDiagnostics, TuningAdvisory},
};
use image::RgbImage;
use log::{debug, info};
use ndarray::Array2;
use std::path::{Path, PathBuf};

/// Maximum possible Euclidean distance between two RGB colors
const MAX_RGB_DISTANCE: f32 = 441.672_94; // sqrt(3 * 255^2)

/// Output file paths produced by [`segment_color_file`]
#[derive(Debug, Clone)]
pub struct ColorLayerFiles {
    /// Transparent-foreground PNG (`{basename}_FG.png`)
    pub foreground: PathBuf,
    /// Opaque background PNG, identical to the source (`{basename}_BG.png`)
    pub background: PathBuf,
    /// Diagnostic statistics from the segmentation run
    pub diagnostics: SegmentationDiagnostics,
}

/// Estimate the background color by sampling the four corner regions
///
/// Each corner region is a square of side `min(H, W) / 10` (at least one
/// pixel). The estimate is the mean of the four per-corner mean colors,
/// truncated to integer channels. The underlying assumption is that
/// backgrounds dominate image corners.
#[must_use]
pub fn estimate_background_color(image: &RgbImage) -> [u8; 3] {
    let (width, height) = image.dimensions();
    let margin = (width.min(height) / 10).max(1);

    let corners = [
        (0, 0),
        (width - margin, 0),
        (0, height - margin),
        (width - margin, height - margin),
    ];

    let mut corner_means = [0.0_f64; 3];
    for &(x0, y0) in &corners {
        let mut sums = [0.0_f64; 3];
        for y in y0..y0 + margin {
            for x in x0..x0 + margin {
                let [r, g, b] = image.get_pixel(x, y).0;
                sums[0] += f64::from(r);
                sums[1] += f64::from(g);
                sums[2] += f64::from(b);
            }
        }
        let count = f64::from(margin * margin);
        for (mean, sum) in corner_means.iter_mut().zip(sums.iter()) {
            *mean += (sum / count) / 4.0;
        }
    }

    [
        corner_means[0] as u8,
        corner_means[1] as u8,
        corner_means[2] as u8,
    ]
}

/// Per-pixel color distance from the background, in percent (0-100)
///
/// Euclidean RGB distance normalized by the maximum possible distance.
#[must_use]
pub fn color_distance_map(image: &RgbImage, background: [u8; 3]) -> ScoreMap {
    let (width, height) = image.dimensions();
    let mut values = Array2::<f32>::zeros((height as usize, width as usize));

    for (x, y, pixel) in image.enumerate_pixels() {
        let dr = f32::from(pixel.0[0]) - f32::from(background[0]);
        let dg = f32::from(pixel.0[1]) - f32::from(background[1]);
        let db = f32::from(pixel.0[2]) - f32::from(background[2]);
        let distance = (dr * dr + dg * dg + db * db).sqrt();
        if let Some(v) = values.get_mut((y as usize, x as usize)) {
            *v = (distance / MAX_RGB_DISTANCE) * 100.0;
        }
    }

    ScoreMap::new(values)
}

/// Segment an image into foreground and background layers by color distance
///
/// The foreground layer carries source RGB with alpha derived from the
/// cleaned mask (graded when edge softening is on). The background layer is
/// a full opaque copy of the source image, not the complement of the mask,
/// so it remains usable as a fallback full image.
///
/// # Errors
/// Returns `SegmentationError::InvalidConfig` for invalid configuration;
/// computation itself is total over valid images.
pub fn segment_by_color(
    image: &RgbImage,
    config: &ColorSegmentConfig,
) -> Result<ColorSegmentation> {
    config.validate()?;

    let background_color = match config.background {
        BackgroundColor::Auto => {
            let estimated = estimate_background_color(image);
            info!(
                "Auto-detected background: RGB({}, {}, {})",
                estimated[0], estimated[1], estimated[2]
            );
            estimated
        },
        BackgroundColor::Manual(rgb) => {
            info!("Using manual background: RGB({}, {}, {})", rgb[0], rgb[1], rgb[2]);
            rgb
        },
    };

    let scores = color_distance_map(image, background_color);
    let (width, height) = image.dimensions();
    let tolerance = config.tolerance_percent;
    let raw_mask = Mask::from_fn(width, height, |x, y| scores.get(x, y) > tolerance);

    let foreground_percent_raw = raw_mask.coverage_percent();
    debug!("Initial: {foreground_percent_raw:.1}% foreground");

    let mut cleaned = raw_mask;
    let mut removed_components = 0;

    if config.remove_noise {
        let (filtered, removed) = mask::remove_small_components(&cleaned, config.min_region_area);
        cleaned = filtered;
        removed_components = removed;
        if removed > 0 {
            debug!("Removed {removed} noise regions");
        }
    }

    if config.smooth_edges {
        cleaned = mask::morph_close(&cleaned, config.close_radius);
        cleaned = mask::soften_edges(&cleaned, config.blur_kernel_size)?;
        debug!("Applied edge smoothing");
    }

    let foreground_percent_final = cleaned.coverage_percent();
    debug!(
        "Final: {foreground_percent_final:.1}% foreground / {:.1}% background",
        100.0 - foreground_percent_final
    );

    let foreground = compositor::composite(image, &cleaned)?;
    let background = image.clone();

    let diagnostics = SegmentationDiagnostics {
        background_color,
        foreground_percent_raw,
        foreground_percent_final,
        removed_components,
        advisory: TuningAdvisory::from_coverage(foreground_percent_final, tolerance),
    };

    Ok(ColorSegmentation {
        foreground,
        background,
        mask: cleaned,
        diagnostics,
    })
}

/// Run color-distance segmentation on an image file and persist the layers
///
/// Writes `{basename}_FG.png` and `{basename}_BG.png` into `output_dir`, or
/// next to the input when no directory is given.
///
/// # Errors
/// Fails when the input cannot be loaded or decoded, or when the output
/// files cannot be written. No partial output is left on load failure.
pub fn segment_color_file<P: AsRef<Path>>(
    input_path: P,
    output_dir: Option<&Path>,
    config: &ColorSegmentConfig,
) -> Result<ColorLayerFiles> {
    let input_path = input_path.as_ref();
    info!("Loading: {}", input_path.display());

    let image = ImageIoService::load_image(input_path)?.to_rgb8();
    debug!("Size: {}x{} pixels", image.width(), image.height());

    let segmentation = segment_by_color(&image, config)?;

    let (fg_path, bg_path) = ImageIoService::color_output_paths(input_path, output_dir)?;
    ImageIoService::save_rgba_png(&segmentation.foreground, &fg_path)?;
    ImageIoService::save_rgb_png(&segmentation.background, &bg_path)?;

    info!(
        "Saved {} and {} ({:.1}% foreground extracted, {})",
        fg_path.display(),
        bg_path.display(),
        segmentation.diagnostics.foreground_percent_final,
        segmentation.diagnostics.advisory
    );

    Ok(ColorLayerFiles {
        foreground: fg_path,
        background: bg_path,
        diagnostics: segmentation.diagnostics,
    })
}
