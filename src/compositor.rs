//! Layer compositing
//!
//! Pure functions that turn a source image plus a mask into an RGBA layer.
//! No I/O happens here.

use crate::error::{Result, SegmentationError};
use crate::types::Mask;
use image::{Rgba, RgbaImage, RgbImage};

/// Apply a (possibly graded) mask to source pixels, producing an RGBA layer
///
/// Channels 0-2 equal the source RGB wherever the mask value is non-zero and
/// channel 3 carries the mask value itself; fully transparent pixels are
/// all-zero.
pub fn composite(image: &RgbImage, mask: &Mask) -> Result<RgbaImage> {
    let (width, height) = image.dimensions();
    if mask.dimensions != (width, height) {
        return Err(SegmentationError::processing(format!(
            "Image ({width}x{height}) and mask ({}x{}) dimensions do not match",
            mask.dimensions.0, mask.dimensions.1
        )));
    }

    let mut layer = RgbaImage::new(width, height);
    for (x, y, pixel) in image.enumerate_pixels() {
        let alpha = mask.value(x, y);
        if alpha > 0 {
            let [r, g, b] = pixel.0;
            layer.put_pixel(x, y, Rgba([r, g, b, alpha]));
        } else {
            layer.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }

    Ok(layer)
}
