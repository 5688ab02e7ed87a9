//! Shared mask cleanup utilities
//!
//! Stateless functions used by both segmentation strategies: connected
//! component noise filtering, morphological closing, and Gaussian edge
//! softening. Raw per-pixel thresholding produces salt-and-pepper noise;
//! only spatially coherent regions survive these passes.

use crate::error::Result;
use crate::types::{Mask, MASK_ON_THRESHOLD};

/// Offsets of an elliptical structuring element with the given radius
///
/// Radius 1 yields the 3x3 cross, matching the smallest elliptical kernel
/// used by the reference cleanup.
#[must_use]
pub(crate) fn elliptical_kernel(radius: u32) -> Vec<(i32, i32)> {
    let r = radius as i32;
    let r_sq = r * r;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy <= r_sq {
                offsets.push((dx, dy));
            }
        }
    }
    offsets
}

/// Gaussian sigma for a given odd kernel size
///
/// Uses the `OpenCV` convention so blur strength matches the reference
/// behavior for the same kernel size.
#[must_use]
pub(crate) fn gaussian_sigma_for_kernel(kernel_size: u32) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Drop 8-connected regions smaller than `min_area` pixels
///
/// Labels connected regions of set pixels via 8-neighbor adjacency and keeps
/// only components of at least `min_area` pixels. Returns the filtered mask
/// and the number of dropped components for diagnostics.
#[must_use]
pub fn remove_small_components(mask: &Mask, min_area: u32) -> (Mask, u32) {
    let (width, height) = mask.dimensions;
    let total = (width as usize) * (height as usize);
    let mut visited = vec![false; total];
    let mut cleaned = Mask::empty(width, height);
    let mut removed = 0_u32;

    let mut component = Vec::new();
    let mut stack = Vec::new();

    for start_y in 0..height {
        for start_x in 0..width {
            let start_index = (start_y * width + start_x) as usize;
            if visited.get(start_index).copied().unwrap_or(true) || !mask.is_set(start_x, start_y)
            {
                continue;
            }

            // Flood-fill one component
            component.clear();
            stack.clear();
            stack.push((start_x, start_y));
            if let Some(v) = visited.get_mut(start_index) {
                *v = true;
            }

            while let Some((x, y)) = stack.pop() {
                component.push((y * width + x) as usize);

                for dy in -1_i32..=1 {
                    for dx in -1_i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = x as i32 + dx;
                        let ny = y as i32 + dy;
                        if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        let neighbor_index = (ny * width + nx) as usize;
                        let seen = visited.get(neighbor_index).copied().unwrap_or(true);
                        if !seen && mask.is_set(nx, ny) {
                            if let Some(v) = visited.get_mut(neighbor_index) {
                                *v = true;
                            }
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            if component.len() >= min_area as usize {
                for &index in &component {
                    if let Some(value) = cleaned.data.get_mut(index) {
                        *value = 255;
                    }
                }
            } else {
                removed += 1;
            }
        }
    }

    (cleaned, removed)
}

/// Morphological dilation with an elliptical structuring element
#[must_use]
pub fn dilate(mask: &Mask, radius: u32) -> Mask {
    let kernel = elliptical_kernel(radius);
    let (width, height) = mask.dimensions;
    Mask::from_fn(width, height, |x, y| {
        kernel.iter().any(|&(dx, dy)| {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            nx >= 0
                && ny >= 0
                && nx < width as i32
                && ny < height as i32
                && mask.is_set(nx as u32, ny as u32)
        })
    })
}

/// Morphological erosion with an elliptical structuring element
///
/// Samples outside the grid count as set, so regions touching the image
/// border are not eroded away from the outside.
#[must_use]
pub fn erode(mask: &Mask, radius: u32) -> Mask {
    let kernel = elliptical_kernel(radius);
    let (width, height) = mask.dimensions;
    Mask::from_fn(width, height, |x, y| {
        kernel.iter().all(|&(dx, dy)| {
            let nx = x as i32 + dx;
            let ny = y as i32 + dy;
            if nx < 0 || ny < 0 || nx >= width as i32 || ny >= height as i32 {
                return true;
            }
            mask.is_set(nx as u32, ny as u32)
        })
    })
}

/// Morphological closing: dilation followed by erosion
///
/// Fills small gaps and smooths region boundaries without growing the
/// region size net.
#[must_use]
pub fn morph_close(mask: &Mask, radius: u32) -> Mask {
    if radius == 0 {
        return mask.clone();
    }
    erode(&dilate(mask, radius), radius)
}

/// Gaussian-blur a binary mask into a graded alpha mask
///
/// Produces soft anti-aliased edges at layer boundaries instead of jagged
/// binary cutoffs. The blur sigma is derived from the kernel size with the
/// same convention as the reference implementation.
pub fn soften_edges(mask: &Mask, blur_kernel_size: u32) -> Result<Mask> {
    let sigma = gaussian_sigma_for_kernel(blur_kernel_size);
    if sigma <= 0.0 {
        return Ok(mask.clone());
    }
    let gray = mask.to_image()?;
    let blurred = image::imageops::blur(&gray, sigma);
    Ok(Mask::from_image(&blurred))
}

/// Binarize a graded mask back to 0/255 at the standard threshold
#[must_use]
pub fn binarize(mask: &Mask) -> Mask {
    let data = mask
        .data
        .iter()
        .map(|&v| if v > MASK_ON_THRESHOLD { 255 } else { 0 })
        .collect();
    Mask::new(data, mask.dimensions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elliptical_kernel_radius_one_is_cross() {
        let mut kernel = elliptical_kernel(1);
        kernel.sort_unstable();
        assert_eq!(kernel, vec![(-1, 0), (0, -1), (0, 0), (0, 1), (1, 0)]);
    }

    #[test]
    fn test_elliptical_kernel_radius_zero() {
        assert_eq!(elliptical_kernel(0), vec![(0, 0)]);
    }

    #[test]
    fn test_gaussian_sigma_convention() {
        assert!((gaussian_sigma_for_kernel(3) - 0.8).abs() < 1e-6);
        assert!((gaussian_sigma_for_kernel(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_remove_small_components_keeps_large_drops_speck() {
        // One 500-pixel region (25x20) plus one isolated pixel far away
        let mask = Mask::from_fn(100, 100, |x, y| {
            (x < 25 && y < 20) || (x == 90 && y == 90)
        });

        let (cleaned, removed) = remove_small_components(&mask, 200);

        assert_eq!(removed, 1);
        assert!(cleaned.is_set(0, 0));
        assert!(cleaned.is_set(24, 19));
        assert!(!cleaned.is_set(90, 90));
        assert_eq!(cleaned.statistics().region_pixels, 500);
    }

    #[test]
    fn test_remove_small_components_diagonal_connectivity() {
        // Diagonal chain counts as one 8-connected component
        let mask = Mask::from_fn(10, 10, |x, y| x == y && x < 5);

        let (cleaned, removed) = remove_small_components(&mask, 5);
        assert_eq!(removed, 0);
        assert_eq!(cleaned.statistics().region_pixels, 5);

        let (cleaned, removed) = remove_small_components(&mask, 6);
        assert_eq!(removed, 1);
        assert_eq!(cleaned.statistics().region_pixels, 0);
    }

    #[test]
    fn test_remove_small_components_empty_mask() {
        let mask = Mask::empty(10, 10);
        let (cleaned, removed) = remove_small_components(&mask, 1);
        assert_eq!(removed, 0);
        assert_eq!(cleaned.statistics().region_pixels, 0);
    }

    #[test]
    fn test_morph_close_fills_single_pixel_gap() {
        // Solid 10x10 block with a hole in the middle
        let mask = Mask::from_fn(10, 10, |x, y| !(x == 5 && y == 5));

        let closed = morph_close(&mask, 1);
        assert!(closed.is_set(5, 5));
        assert_eq!(closed.statistics().region_pixels, 100);
    }

    #[test]
    fn test_morph_close_keeps_solid_region() {
        let mask = Mask::from_fn(20, 20, |x, y| (5..15).contains(&x) && (5..15).contains(&y));
        let closed = morph_close(&mask, 1);
        assert_eq!(closed, mask);
    }

    #[test]
    fn test_dilate_grows_and_erode_shrinks() {
        let mask = Mask::from_fn(9, 9, |x, y| x == 4 && y == 4);

        let dilated = dilate(&mask, 1);
        assert_eq!(dilated.statistics().region_pixels, 5);

        let eroded = erode(&dilated, 1);
        assert_eq!(eroded.statistics().region_pixels, 1);
        assert!(eroded.is_set(4, 4));
    }

    #[test]
    fn test_erode_preserves_border_regions() {
        let mask = Mask::from_fn(10, 10, |_, _| true);
        let eroded = erode(&mask, 1);
        assert_eq!(eroded.statistics().region_pixels, 100);
    }

    #[test]
    fn test_soften_edges_grades_boundary() {
        let mask = Mask::from_fn(20, 20, |x, _| x < 10);
        let softened = soften_edges(&mask, 3).unwrap();

        // Deep inside each region the values stay extreme; the boundary grades
        assert!(softened.value(0, 10) > 250);
        assert!(softened.value(19, 10) < 5);
        let edge = softened.value(9, 10);
        assert!(edge > 0 && edge < 255);
    }

    #[test]
    fn test_binarize() {
        let mask = Mask::new(vec![0, 100, 127, 128, 255], (5, 1));
        let binary = binarize(&mask);
        assert_eq!(binary.data, vec![0, 0, 0, 255, 255]);
    }
}
