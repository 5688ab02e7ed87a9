//! Configuration for the segmentation strategies
//!
//! All tuning knobs are explicit configuration fields with defaults matching
//! the reference behavior; nothing is read from module-level state.

use crate::error::{Result, SegmentationError};
use serde::{Deserialize, Serialize};

/// Background color selection for color-distance segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundColor {
    /// Estimate the background from the four corner regions of the image
    Auto,
    /// Use the supplied RGB color
    Manual([u8; 3]),
}

/// Configuration for the color-distance segmenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSegmentConfig {
    /// Background color source (auto-detected or manual)
    pub background: BackgroundColor,

    /// Color distance above which a pixel is foreground (0-100)
    ///
    /// Lower tolerance classifies more pixels as foreground, since the
    /// background must match the reference color more closely.
    pub tolerance_percent: f32,

    /// Apply morphological closing and Gaussian edge softening
    pub smooth_edges: bool,

    /// Gaussian kernel size for edge softening (odd)
    pub blur_kernel_size: u32,

    /// Structuring element radius for morphological closing
    pub close_radius: u32,

    /// Drop small connected components from the raw mask
    pub remove_noise: bool,

    /// Minimum connected-component area kept by noise removal, in pixels
    pub min_region_area: u32,
}

impl Default for ColorSegmentConfig {
    fn default() -> Self {
        Self {
            background: BackgroundColor::Auto,
            tolerance_percent: 12.0,
            smooth_edges: true,
            blur_kernel_size: 3,
            close_radius: 1,
            remove_noise: true,
            min_region_area: 200,
        }
    }
}

impl ColorSegmentConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> ColorSegmentConfigBuilder {
        ColorSegmentConfigBuilder::new()
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns `SegmentationError::InvalidConfig` for out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.tolerance_percent) {
            return Err(SegmentationError::config_value_error(
                "tolerance_percent",
                self.tolerance_percent,
                "0-100",
            ));
        }
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            return Err(SegmentationError::invalid_config(format!(
                "blur_kernel_size must be odd and non-zero, got {}",
                self.blur_kernel_size
            )));
        }
        Ok(())
    }
}

/// Builder for [`ColorSegmentConfig`]
#[derive(Debug, Default)]
pub struct ColorSegmentConfigBuilder {
    config: ColorSegmentConfig,
}

impl ColorSegmentConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ColorSegmentConfig::default(),
        }
    }

    /// Estimate the background color from image corners
    #[must_use]
    pub fn auto_background(mut self) -> Self {
        self.config.background = BackgroundColor::Auto;
        self
    }

    /// Use a manual background color
    #[must_use]
    pub fn background_color(mut self, rgb: [u8; 3]) -> Self {
        self.config.background = BackgroundColor::Manual(rgb);
        self
    }

    #[must_use]
    pub fn tolerance_percent(mut self, tolerance: f32) -> Self {
        self.config.tolerance_percent = tolerance;
        self
    }

    #[must_use]
    pub fn smooth_edges(mut self, enabled: bool) -> Self {
        self.config.smooth_edges = enabled;
        self
    }

    #[must_use]
    pub fn blur_kernel_size(mut self, size: u32) -> Self {
        self.config.blur_kernel_size = size;
        self
    }

    #[must_use]
    pub fn close_radius(mut self, radius: u32) -> Self {
        self.config.close_radius = radius;
        self
    }

    #[must_use]
    pub fn remove_noise(mut self, enabled: bool) -> Self {
        self.config.remove_noise = enabled;
        self
    }

    #[must_use]
    pub fn min_region_area(mut self, area: u32) -> Self {
        self.config.min_region_area = area;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Returns `SegmentationError::InvalidConfig` for out-of-range values.
    pub fn build(self) -> Result<ColorSegmentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration for the depth-tri-layer segmenter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthSegmentConfig {
    /// Percentile below which pixels fall in the far band (0-100)
    pub lower_percentile: f64,

    /// Percentile above which pixels fall in the near band (0-100)
    pub upper_percentile: f64,

    /// Gaussian sigma applied to the depth map before thresholding
    pub smoothing_sigma: f32,

    /// Structuring element radius for per-band morphological closing
    pub close_radius: u32,
}

impl Default for DepthSegmentConfig {
    fn default() -> Self {
        Self {
            lower_percentile: 25.0,
            upper_percentile: 75.0,
            smoothing_sigma: 1.0,
            close_radius: 1,
        }
    }
}

impl DepthSegmentConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> DepthSegmentConfigBuilder {
        DepthSegmentConfigBuilder::new()
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Returns `SegmentationError::InvalidConfig` for out-of-range values or
    /// a non-positive percentile spread.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.lower_percentile) {
            return Err(SegmentationError::config_value_error(
                "lower_percentile",
                self.lower_percentile,
                "0-100",
            ));
        }
        if !(0.0..=100.0).contains(&self.upper_percentile) {
            return Err(SegmentationError::config_value_error(
                "upper_percentile",
                self.upper_percentile,
                "0-100",
            ));
        }
        if self.lower_percentile >= self.upper_percentile {
            return Err(SegmentationError::invalid_config(format!(
                "lower_percentile ({}) must be below upper_percentile ({})",
                self.lower_percentile, self.upper_percentile
            )));
        }
        if self.smoothing_sigma < 0.0 {
            return Err(SegmentationError::config_value_error(
                "smoothing_sigma",
                self.smoothing_sigma,
                ">= 0",
            ));
        }
        Ok(())
    }
}

/// Builder for [`DepthSegmentConfig`]
#[derive(Debug, Default)]
pub struct DepthSegmentConfigBuilder {
    config: DepthSegmentConfig,
}

impl DepthSegmentConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: DepthSegmentConfig::default(),
        }
    }

    #[must_use]
    pub fn percentiles(mut self, lower: f64, upper: f64) -> Self {
        self.config.lower_percentile = lower;
        self.config.upper_percentile = upper;
        self
    }

    #[must_use]
    pub fn smoothing_sigma(mut self, sigma: f32) -> Self {
        self.config.smoothing_sigma = sigma;
        self
    }

    #[must_use]
    pub fn close_radius(mut self, radius: u32) -> Self {
        self.config.close_radius = radius;
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// Returns `SegmentationError::InvalidConfig` for out-of-range values.
    pub fn build(self) -> Result<DepthSegmentConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
