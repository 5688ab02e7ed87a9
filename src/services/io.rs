//! Image file input/output operations
//!
//! Separates filesystem concerns from the segmentation logic so the
//! pipelines stay pure and testable.

use crate::error::{Result, SegmentationError};
use image::{DynamicImage, GrayImage, RgbaImage, RgbImage};
use std::path::{Path, PathBuf};

/// Service for handling image file input/output operations
pub struct ImageIoService;

impl ImageIoService {
    /// Load an image from a file path
    ///
    /// Tries extension-based format detection first and falls back to
    /// content-based detection, so files with wrong or missing extensions
    /// still load.
    ///
    /// # Errors
    /// Returns an error when the file is missing or cannot be decoded by
    /// either method. No partial result is produced.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(SegmentationError::file_io_error(
                "read image file",
                path_ref,
                &std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {e}. Attempting content-based detection.",
                    path_ref.display()
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    SegmentationError::file_io_error("read image data", path_ref, &io_err)
                })?;

                image::load_from_memory(&data)
                    .map_err(|_| SegmentationError::image_load_error(path_ref, &e))
            },
        }
    }

    /// Save an RGBA layer as PNG
    ///
    /// # Errors
    /// Propagates directory creation and encoding failures.
    pub fn save_rgba_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> Result<()> {
        Self::ensure_parent_dir(path.as_ref())?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Save an RGB image as PNG
    ///
    /// # Errors
    /// Propagates directory creation and encoding failures.
    pub fn save_rgb_png<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
        Self::ensure_parent_dir(path.as_ref())?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Save a grayscale image as PNG
    ///
    /// # Errors
    /// Propagates directory creation and encoding failures.
    pub fn save_gray_png<P: AsRef<Path>>(image: &GrayImage, path: P) -> Result<()> {
        Self::ensure_parent_dir(path.as_ref())?;
        image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    /// Derive `{basename}_FG.png` / `{basename}_BG.png` output paths
    ///
    /// The output directory defaults to the input's directory when not
    /// specified.
    ///
    /// # Errors
    /// Fails when the input path has no usable file stem.
    pub fn color_output_paths(
        input_path: &Path,
        output_dir: Option<&Path>,
    ) -> Result<(PathBuf, PathBuf)> {
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                SegmentationError::invalid_config(format!(
                    "Input path has no file name: {}",
                    input_path.display()
                ))
            })?;

        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input_path.parent().map_or_else(PathBuf::new, Path::to_path_buf),
        };

        Ok((
            dir.join(format!("{stem}_FG.png")),
            dir.join(format!("{stem}_BG.png")),
        ))
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    SegmentationError::file_io_error("create output directory", parent, &e)
                })?;
            }
        }
        Ok(())
    }
}
