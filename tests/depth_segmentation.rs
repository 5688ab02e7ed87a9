//! End-to-end tests for depth-based band segmentation
//!
//! A deterministic ramp estimator stands in for the neural depth model so
//! the adaptive thresholds and band partition can be verified exactly.

use image::{Rgb, RgbImage};
use layercut::{segment_depth_file, DepthSegmentConfig, Result, ScoreMap, SegmentationError};
use ndarray::Array2;
use tempfile::TempDir;

const WIDTH: u32 = 120;
const HEIGHT: u32 = 80;

/// Depth increases left to right, so bands become vertical stripes
fn ramp_estimator(image: &RgbImage) -> Result<ScoreMap> {
    let (width, height) = image.dimensions();
    let mut values = Array2::<f32>::zeros((height as usize, width as usize));
    for ((_, x), v) in values.indexed_iter_mut() {
        *v = (x as f32 / (width - 1) as f32) * 255.0;
    }
    Ok(ScoreMap::new(values))
}

fn save_test_image(dir: &std::path::Path) -> std::path::PathBuf {
    let image = RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([80, 120, 160]));
    let path = dir.join("scene.png");
    image.save(&path).unwrap();
    path
}

fn exact_partition_config() -> DepthSegmentConfig {
    // No smoothing or closing, so band membership follows the thresholds
    DepthSegmentConfig::builder()
        .smoothing_sigma(0.0)
        .close_radius(0)
        .build()
        .unwrap()
}

#[test]
fn writes_all_four_layers() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = save_test_image(dir.path());

    let mut estimator = ramp_estimator;
    let layers =
        segment_depth_file(&input, Some(out.path()), &mut estimator, &exact_partition_config())
            .unwrap();

    assert_eq!(layers.foreground, out.path().join("foreground.png"));
    assert_eq!(layers.midground, out.path().join("midground.png"));
    assert_eq!(layers.background, out.path().join("background.png"));
    assert_eq!(layers.depth_map, out.path().join("depth_map.png"));

    for path in [
        &layers.foreground,
        &layers.midground,
        &layers.background,
        &layers.depth_map,
    ] {
        assert!(path.is_file(), "missing {}", path.display());
    }
}

#[test]
fn bands_partition_the_image() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = save_test_image(dir.path());

    let mut estimator = ramp_estimator;
    let layers =
        segment_depth_file(&input, Some(out.path()), &mut estimator, &exact_partition_config())
            .unwrap();

    // Quartile thresholds on a linear ramp
    assert!((layers.thresholds.lower - 63.75).abs() < 0.5);
    assert!((layers.thresholds.upper - 191.25).abs() < 0.5);

    let near = image::open(&layers.foreground).unwrap().to_rgba8();
    let mid = image::open(&layers.midground).unwrap().to_rgba8();
    let far = image::open(&layers.background).unwrap().to_rgba8();

    // Every pixel belongs to exactly one band
    for y in [0, HEIGHT / 2, HEIGHT - 1] {
        for x in 0..WIDTH {
            let opaque = [&near, &mid, &far]
                .iter()
                .filter(|layer| layer.get_pixel(x, y).0[3] > 0)
                .count();
            assert_eq!(opaque, 1, "pixel ({x}, {y}) belongs to {opaque} bands");
        }
    }

    // Leftmost column is farthest, rightmost is nearest
    assert!(far.get_pixel(0, 10).0[3] > 0);
    assert!(mid.get_pixel(WIDTH / 2, 10).0[3] > 0);
    assert!(near.get_pixel(WIDTH - 1, 10).0[3] > 0);

    // Opaque pixels carry the source color
    assert_eq!(near.get_pixel(WIDTH - 1, 10).0, [80, 120, 160, 255]);
}

#[test]
fn depth_map_records_the_normalized_gradient() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = save_test_image(dir.path());

    let mut estimator = ramp_estimator;
    let layers =
        segment_depth_file(&input, Some(out.path()), &mut estimator, &exact_partition_config())
            .unwrap();

    let depth_map = image::open(&layers.depth_map).unwrap().to_luma8();
    assert_eq!(depth_map.dimensions(), (WIDTH, HEIGHT));
    assert_eq!(depth_map.get_pixel(0, 0).0[0], 0);
    assert_eq!(depth_map.get_pixel(WIDTH - 1, HEIGHT - 1).0[0], 255);
}

#[test]
fn estimator_failure_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = save_test_image(dir.path());

    let mut failing = |_: &RgbImage| -> Result<ScoreMap> {
        Err(SegmentationError::depth_estimation("inference failed"))
    };

    let result = segment_depth_file(&input, Some(out.path()), &mut failing, &exact_partition_config());
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[test]
fn missing_input_file_is_an_error() {
    let out = TempDir::new().unwrap();
    let mut estimator = ramp_estimator;

    let result = segment_depth_file(
        out.path().join("absent.png"),
        Some(out.path()),
        &mut estimator,
        &exact_partition_config(),
    );
    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
