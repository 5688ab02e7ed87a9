//! Depth estimation backends
//!
//! The segmentation engine only depends on the [`crate::depth::DepthEstimator`]
//! trait; concrete model backends live here behind feature gates.

#[cfg(feature = "onnx")]
pub mod onnx;

#[cfg(feature = "onnx")]
pub use onnx::{ExecutionProvider, OnnxDepthEstimator};
