//! CLI argument to library configuration conversion

use super::main_impl::{ColorArgs, DepthArgs};
use crate::config::{ColorSegmentConfig, DepthSegmentConfig};
use anyhow::{Context, Result};

/// Builds library configurations from parsed CLI arguments
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Convert color subcommand arguments to a validated configuration
    pub(crate) fn color_config(args: &ColorArgs) -> Result<ColorSegmentConfig> {
        let mut builder = ColorSegmentConfig::builder()
            .tolerance_percent(args.tolerance)
            .smooth_edges(!args.no_smoothing)
            .blur_kernel_size(args.blur_kernel)
            .remove_noise(!args.keep_noise)
            .min_region_area(args.min_area);

        if let Some(rgb) = &args.background {
            builder = builder.background_color(Self::parse_rgb(rgb)?);
        }

        builder.build().context("Invalid color segmentation settings")
    }

    /// Convert depth subcommand arguments to a validated configuration
    pub(crate) fn depth_config(args: &DepthArgs) -> Result<DepthSegmentConfig> {
        DepthSegmentConfig::builder()
            .percentiles(args.lower_percentile, args.upper_percentile)
            .smoothing_sigma(args.sigma)
            .build()
            .context("Invalid depth segmentation settings")
    }

    /// Parse an execution provider name
    #[cfg(feature = "onnx")]
    pub(crate) fn parse_provider(name: &str) -> Result<crate::backends::ExecutionProvider> {
        use crate::backends::ExecutionProvider;

        match name.to_lowercase().as_str() {
            "auto" => Ok(ExecutionProvider::Auto),
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" => Ok(ExecutionProvider::Cuda),
            "coreml" => Ok(ExecutionProvider::CoreMl),
            other => anyhow::bail!(
                "Unknown execution provider '{other}'. Valid values: auto, cpu, cuda, coreml"
            ),
        }
    }

    /// Parse a background color specification like "255,0,128"
    fn parse_rgb(spec: &str) -> Result<[u8; 3]> {
        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            anyhow::bail!("Background color must be three comma-separated values, e.g. 255,255,255");
        }

        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u8>()
                .with_context(|| format!("Invalid color channel value '{part}' (expected 0-255)"))?;
        }
        Ok(rgb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rgb_valid() {
        assert_eq!(CliConfigBuilder::parse_rgb("255,0,128").unwrap(), [255, 0, 128]);
        assert_eq!(CliConfigBuilder::parse_rgb(" 10 , 20 , 30 ").unwrap(), [10, 20, 30]);
    }

    #[test]
    fn test_parse_rgb_invalid() {
        assert!(CliConfigBuilder::parse_rgb("255,0").is_err());
        assert!(CliConfigBuilder::parse_rgb("255,0,128,64").is_err());
        assert!(CliConfigBuilder::parse_rgb("256,0,0").is_err());
        assert!(CliConfigBuilder::parse_rgb("red,green,blue").is_err());
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_parse_provider() {
        use crate::backends::ExecutionProvider;

        assert_eq!(
            CliConfigBuilder::parse_provider("auto").unwrap(),
            ExecutionProvider::Auto
        );
        assert_eq!(
            CliConfigBuilder::parse_provider("CUDA").unwrap(),
            ExecutionProvider::Cuda
        );
        assert!(CliConfigBuilder::parse_provider("tpu").is_err());
    }
}
