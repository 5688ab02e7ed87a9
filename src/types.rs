//! Core types for layer segmentation operations

use crate::error::{Result, SegmentationError};
use image::{GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Pixel value at or below which a mask sample counts as background
pub const MASK_ON_THRESHOLD: u8 = 127;

/// Per-pixel membership grid for one segmentation region
///
/// Stored as grayscale values: binary masks use 0/255, edge softening
/// produces graded values in between. A pixel is considered set when its
/// value exceeds [`MASK_ON_THRESHOLD`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl Mask {
    /// Create a new mask from raw data
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Create an all-background mask of the given size
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        Self::new(vec![0; (width * height) as usize], (width, height))
    }

    /// Create a binary mask by evaluating a predicate per pixel
    #[must_use]
    pub fn from_fn<F: FnMut(u32, u32) -> bool>(width: u32, height: u32, mut f: F) -> Self {
        let mut data = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(if f(x, y) { 255 } else { 0 });
            }
        }
        Self::new(data, (width, height))
    }

    /// Mask width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.dimensions.0
    }

    /// Mask height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.dimensions.1
    }

    /// Get the raw value at (x, y), or 0 outside the grid
    #[must_use]
    pub fn value(&self, x: u32, y: u32) -> u8 {
        if x >= self.width() || y >= self.height() {
            return 0;
        }
        let index = (y * self.width() + x) as usize;
        self.data.get(index).copied().unwrap_or(0)
    }

    /// Whether the pixel at (x, y) belongs to the region
    #[must_use]
    pub fn is_set(&self, x: u32, y: u32) -> bool {
        self.value(x, y) > MASK_ON_THRESHOLD
    }

    /// Create mask from a grayscale image
    #[must_use]
    pub fn from_image(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.as_raw().clone(), (width, height))
    }

    /// Convert mask to a grayscale image
    pub fn to_image(&self) -> Result<GrayImage> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone()).ok_or_else(|| {
            SegmentationError::processing("Failed to create image from mask data")
        })
    }

    /// Fraction of pixels that belong to the region, in percent
    #[must_use]
    pub fn coverage_percent(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let set = self
            .data
            .iter()
            .filter(|&&v| v > MASK_ON_THRESHOLD)
            .count();
        (set as f32 / self.data.len() as f32) * 100.0
    }

    /// Get mask statistics
    #[must_use]
    pub fn statistics(&self) -> MaskStatistics {
        let total_pixels = self.data.len();
        let region_pixels = self
            .data
            .iter()
            .filter(|&&v| v > MASK_ON_THRESHOLD)
            .count();

        MaskStatistics {
            total_pixels,
            region_pixels,
            coverage_ratio: if total_pixels == 0 {
                0.0
            } else {
                region_pixels as f32 / total_pixels as f32
            },
        }
    }
}

/// Statistics about a segmentation mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub region_pixels: usize,
    pub coverage_ratio: f32,
}

/// Per-pixel scalar grid derived from an image
///
/// Holds either a color-distance score (percent of the maximum possible RGB
/// distance) or a raw depth prediction. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct ScoreMap {
    values: Array2<f32>,
}

impl ScoreMap {
    /// Create a score map from an `(height, width)` array
    #[must_use]
    pub fn new(values: Array2<f32>) -> Self {
        Self { values }
    }

    /// Create a score map from row-major samples
    pub fn from_raw(width: u32, height: u32, samples: Vec<f32>) -> Result<Self> {
        let values = Array2::from_shape_vec((height as usize, width as usize), samples)
            .map_err(|e| {
                SegmentationError::processing(format!("Score map shape mismatch: {e}"))
            })?;
        Ok(Self::new(values))
    }

    /// Score map dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        let (h, w) = self.values.dim();
        (w as u32, h as u32)
    }

    /// Borrow the underlying `(height, width)` array
    #[must_use]
    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Score at (x, y)
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// Minimum and maximum score, or `None` for an empty map
    #[must_use]
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut iter = self.values.iter().copied();
        let first = iter.next()?;
        let mut min = first;
        let mut max = first;
        for v in iter {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        Some((min, max))
    }

    /// Min-max scale all scores to the 0-255 range
    ///
    /// A constant map scales to all zeros, matching the degenerate case of
    /// min-max normalization.
    #[must_use]
    pub fn to_normalized_u8(&self) -> Vec<u8> {
        let Some((min, max)) = self.min_max() else {
            return Vec::new();
        };
        let range = max - min;
        if range <= f32::EPSILON {
            return vec![0; self.values.len()];
        }
        self.values
            .iter()
            .map(|&v| (((v - min) / range) * 255.0).round().clamp(0.0, 255.0) as u8)
            .collect()
    }
}

/// Advisory tuning hint derived from segmentation diagnostics
///
/// Presentation-only: surfaced to the caller as guidance text, never used to
/// retry or adjust parameters automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TuningAdvisory {
    /// Foreground coverage within the healthy 20-80% band
    Balanced,
    /// Very little foreground extracted; a lower tolerance may help
    LowForeground { suggested_tolerance: f32 },
    /// Most of the image classified as foreground; a higher tolerance may help
    HighForeground { suggested_tolerance: f32 },
}

impl TuningAdvisory {
    /// Derive the advisory from final foreground coverage and the tolerance used
    #[must_use]
    pub fn from_coverage(foreground_percent: f32, tolerance_percent: f32) -> Self {
        if foreground_percent < 20.0 {
            Self::LowForeground {
                suggested_tolerance: (tolerance_percent - 5.0).max(0.0),
            }
        } else if foreground_percent > 80.0 {
            Self::HighForeground {
                suggested_tolerance: (tolerance_percent + 5.0).min(100.0),
            }
        } else {
            Self::Balanced
        }
    }
}

impl std::fmt::Display for TuningAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balanced => write!(f, "good foreground/background balance"),
            Self::LowForeground {
                suggested_tolerance,
            } => write!(
                f,
                "low foreground extracted; try decreasing tolerance to {suggested_tolerance}"
            ),
            Self::HighForeground {
                suggested_tolerance,
            } => write!(
                f,
                "high foreground extracted; try increasing tolerance to {suggested_tolerance}"
            ),
        }
    }
}

/// Diagnostics returned by the color-distance segmenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationDiagnostics {
    /// Background color used for distance scoring (estimated or supplied)
    pub background_color: [u8; 3],

    /// Percent of pixels classified foreground by raw thresholding
    pub foreground_percent_raw: f32,

    /// Percent of pixels classified foreground after mask cleanup
    pub foreground_percent_final: f32,

    /// Connected components dropped by noise removal
    pub removed_components: u32,

    /// Advisory tuning hint (never alters behavior)
    pub advisory: TuningAdvisory,
}

/// Result of color-distance segmentation
#[derive(Debug, Clone)]
pub struct ColorSegmentation {
    /// Foreground layer: source RGB with graded alpha from the cleaned mask
    pub foreground: RgbaImage,

    /// Background layer: the unmodified source image, fully opaque
    pub background: RgbImage,

    /// Cleaned (possibly graded) foreground mask
    pub mask: Mask,

    /// Diagnostic statistics for this run
    pub diagnostics: SegmentationDiagnostics,
}

/// Adaptive depth thresholds computed from a depth map's distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthThresholds {
    /// Lower percentile cut-point (far band below this)
    pub lower: f32,
    /// Upper percentile cut-point (near band above this)
    pub upper: f32,
}

/// Result of depth-tri-layer segmentation
#[derive(Debug, Clone)]
pub struct DepthSegmentation {
    /// Near band layer (depth above the upper cut-point)
    pub near: RgbaImage,

    /// Mid band layer
    pub mid: RgbaImage,

    /// Far band layer (depth below the lower cut-point)
    pub far: RgbaImage,

    /// Normalized depth map visualization
    pub depth_map: GrayImage,

    /// Adaptive thresholds used for the band partition
    pub thresholds: DepthThresholds,
}

/// Grayscale image from normalized depth samples
pub(crate) fn luma_from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<GrayImage> {
    ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(width, height, data).ok_or_else(|| {
        SegmentationError::processing("Failed to create grayscale image from depth data")
    })
}
