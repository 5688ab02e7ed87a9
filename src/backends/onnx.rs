//! ONNX Runtime depth estimation backend
//!
//! Wraps a monocular depth model (`MiDaS`-style) in the [`DepthEstimator`]
//! trait. The backend owns all model-specific concerns: the square input
//! resize, `ImageNet` normalization, session management, and extraction of
//! the raw prediction. The segmentation engine never sees an `ort` type.

use crate::{
    depth::DepthEstimator,
    error::{Result, SegmentationError},
    types::ScoreMap,
};
use image::{imageops, RgbImage};
use ndarray::{Array2, Array4};
use ort::execution_providers::{
    CUDAExecutionProvider, CoreMLExecutionProvider, ExecutionProvider as OrtExecutionProvider,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use std::path::Path;

/// Default square input resolution for `MiDaS`-style depth models
const DEFAULT_INPUT_SIZE: u32 = 384;

/// `ImageNet` channel means used by the model's input transform
const NORMALIZATION_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// `ImageNet` channel standard deviations used by the model's input transform
const NORMALIZATION_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Execution provider selection for the ONNX Runtime session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionProvider {
    /// Auto-detect: CUDA, then `CoreML`, then CPU
    #[default]
    Auto,
    /// CPU only
    Cpu,
    /// NVIDIA GPU acceleration (falls back to CPU when unavailable)
    Cuda,
    /// Apple Silicon acceleration (falls back to CPU when unavailable)
    CoreMl,
}

/// ONNX Runtime backed monocular depth estimator
pub struct OnnxDepthEstimator {
    session: Session,
    input_size: u32,
}

impl OnnxDepthEstimator {
    /// Load a depth model from an ONNX file
    ///
    /// # Errors
    /// Fails when the model file cannot be read or the session cannot be
    /// created.
    pub fn from_file<P: AsRef<Path>>(
        model_path: P,
        provider: ExecutionProvider,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let model_data = std::fs::read(model_path).map_err(|e| {
            SegmentationError::file_io_error("read depth model", model_path, &e)
        })?;

        let mut session_builder = Session::builder()
            .map_err(|e| {
                SegmentationError::depth_estimation(format!(
                    "Failed to create session builder: {e}"
                ))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                SegmentationError::depth_estimation(format!(
                    "Failed to set optimization level: {e}"
                ))
            })?;

        session_builder = match provider {
            ExecutionProvider::Auto => {
                let mut providers = Vec::new();
                let cuda = CUDAExecutionProvider::default();
                if OrtExecutionProvider::is_available(&cuda).unwrap_or(false) {
                    log::info!("CUDA execution provider is available and will be used");
                    providers.push(cuda.build());
                }
                let coreml = CoreMLExecutionProvider::default();
                if OrtExecutionProvider::is_available(&coreml).unwrap_or(false) {
                    log::info!("CoreML execution provider is available and will be used");
                    providers.push(coreml.build());
                }
                if providers.is_empty() {
                    log::debug!("No hardware acceleration available, using CPU");
                    session_builder
                } else {
                    session_builder
                        .with_execution_providers(providers)
                        .map_err(|e| {
                            SegmentationError::depth_estimation(format!(
                                "Failed to set execution providers: {e}"
                            ))
                        })?
                }
            },
            ExecutionProvider::Cpu => {
                log::info!("Using CPU execution provider");
                session_builder
            },
            ExecutionProvider::Cuda => {
                let cuda = CUDAExecutionProvider::default();
                if OrtExecutionProvider::is_available(&cuda).unwrap_or(false) {
                    log::info!("Using CUDA execution provider");
                    session_builder
                        .with_execution_providers([cuda.build()])
                        .map_err(|e| {
                            SegmentationError::depth_estimation(format!(
                                "Failed to set CUDA execution provider: {e}"
                            ))
                        })?
                } else {
                    log::warn!("CUDA requested but not available, falling back to CPU");
                    session_builder
                }
            },
            ExecutionProvider::CoreMl => {
                let coreml = CoreMLExecutionProvider::default();
                if OrtExecutionProvider::is_available(&coreml).unwrap_or(false) {
                    log::info!("Using CoreML execution provider");
                    session_builder
                        .with_execution_providers([coreml.build()])
                        .map_err(|e| {
                            SegmentationError::depth_estimation(format!(
                                "Failed to set CoreML execution provider: {e}"
                            ))
                        })?
                } else {
                    log::warn!("CoreML requested but not available, falling back to CPU");
                    session_builder
                }
            },
        };

        let session = session_builder
            .with_intra_threads(
                std::thread::available_parallelism()
                    .map(std::num::NonZero::get)
                    .unwrap_or(4),
            )
            .map_err(|e| {
                SegmentationError::depth_estimation(format!("Failed to set intra threads: {e}"))
            })?
            .commit_from_memory(&model_data)
            .map_err(|e| {
                SegmentationError::depth_estimation(format!(
                    "Failed to create session from model data: {e}"
                ))
            })?;

        log::debug!(
            "Loaded depth model from {} ({} bytes)",
            model_path.display(),
            model_data.len()
        );

        Ok(Self {
            session,
            input_size: DEFAULT_INPUT_SIZE,
        })
    }

    /// Override the square input resolution expected by the model
    #[must_use]
    pub fn with_input_size(mut self, input_size: u32) -> Self {
        self.input_size = input_size;
        self
    }

    /// Resize and normalize the image into an NCHW input tensor
    fn preprocess(&self, image: &RgbImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = imageops::resize(image, size, size, imageops::FilterType::CatmullRom);

        let size = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
        #[allow(clippy::indexing_slicing)] // tensor pre-allocated to the resize dimensions
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for channel in 0..3 {
                let value = f32::from(pixel.0[channel]) / 255.0;
                tensor[[0, channel, y, x]] =
                    (value - NORMALIZATION_MEAN[channel]) / NORMALIZATION_STD[channel];
            }
        }
        tensor
    }
}

impl std::fmt::Debug for OnnxDepthEstimator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxDepthEstimator")
            .field("input_size", &self.input_size)
            .finish_non_exhaustive()
    }
}

impl DepthEstimator for OnnxDepthEstimator {
    fn estimate(&mut self, image: &RgbImage) -> Result<ScoreMap> {
        let input = self.preprocess(image);

        let input_value = Value::from_array(input).map_err(|e| {
            SegmentationError::depth_estimation(format!("Failed to convert input tensor: {e}"))
        })?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|e| {
                SegmentationError::depth_estimation(format!("Depth inference failed: {e}"))
            })?;

        // Positional output access: depth models expose a single prediction
        let keys: Vec<_> = outputs.keys().collect();
        let first_key = keys.first().ok_or_else(|| {
            SegmentationError::depth_estimation("No output tensors found")
        })?;
        let output = outputs
            .get(first_key)
            .ok_or_else(|| SegmentationError::depth_estimation("First output tensor not found"))?
            .try_extract_array::<f32>()
            .map_err(|e| {
                SegmentationError::depth_estimation(format!(
                    "Failed to extract output tensor: {e}"
                ))
            })?;

        // Accept [1, H, W] (MiDaS) or [1, 1, H, W] predictions
        let shape = output.shape().to_vec();
        let (height, width) = match shape.as_slice() {
            [1, h, w] => (*h, *w),
            [1, 1, h, w] => (*h, *w),
            other => {
                return Err(SegmentationError::depth_estimation(format!(
                    "Unexpected depth prediction shape: {other:?}"
                )))
            },
        };

        let (data, _) = output.view().to_owned().into_raw_vec_and_offset();
        let values = Array2::from_shape_vec((height, width), data).map_err(|e| {
            SegmentationError::depth_estimation(format!(
                "Depth prediction shape mismatch: {e}"
            ))
        })?;

        Ok(ScoreMap::new(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_missing_model_fails() {
        let result =
            OnnxDepthEstimator::from_file("/nonexistent/midas.onnx", ExecutionProvider::Cpu);
        assert!(result.is_err());
    }

    #[test]
    fn test_default_provider_is_auto() {
        assert_eq!(ExecutionProvider::default(), ExecutionProvider::Auto);
    }
}
