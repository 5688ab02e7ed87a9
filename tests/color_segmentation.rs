//! End-to-end tests for color-distance segmentation
//!
//! These tests run the full file pipeline: load an image from disk, split
//! it into layers, and verify the written PNG outputs.

use image::{Rgb, RgbImage};
use layercut::{segment_color_file, BackgroundColor, ColorSegmentConfig, TuningAdvisory};
use std::path::Path;
use tempfile::TempDir;

/// White canvas with a centered black square, the canonical chroma test card
fn square_on_white(size: u32, square: u32) -> RgbImage {
    let offset = (size - square) / 2;
    RgbImage::from_fn(size, size, |x, y| {
        let inside = x >= offset && x < offset + square && y >= offset && y < offset + square;
        if inside {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

fn save_input(dir: &Path, name: &str, image: &RgbImage) -> std::path::PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

#[test]
fn writes_fg_and_bg_next_to_input_by_default() {
    let dir = TempDir::new().unwrap();
    let input = save_input(dir.path(), "card.png", &square_on_white(100, 20));

    let config = ColorSegmentConfig::default();
    let layers = segment_color_file(&input, None, &config).unwrap();

    assert_eq!(layers.foreground, dir.path().join("card_FG.png"));
    assert_eq!(layers.background, dir.path().join("card_BG.png"));
    assert!(layers.foreground.is_file());
    assert!(layers.background.is_file());
}

#[test]
fn respects_explicit_output_directory() {
    let dir = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let input = save_input(dir.path(), "card.png", &square_on_white(100, 20));

    let config = ColorSegmentConfig::default();
    let layers = segment_color_file(&input, Some(out.path()), &config).unwrap();

    assert_eq!(layers.foreground, out.path().join("card_FG.png"));
    assert_eq!(layers.background, out.path().join("card_BG.png"));
    assert!(layers.foreground.is_file());
    assert!(layers.background.is_file());
}

#[test]
fn foreground_layer_masks_the_square() {
    let dir = TempDir::new().unwrap();
    let input = save_input(dir.path(), "card.png", &square_on_white(100, 20));

    // Disable smoothing so the written alpha stays binary
    let config = ColorSegmentConfig::builder()
        .smooth_edges(false)
        .build()
        .unwrap();
    let layers = segment_color_file(&input, None, &config).unwrap();

    let fg = image::open(&layers.foreground).unwrap().to_rgba8();
    assert_eq!(fg.dimensions(), (100, 100));

    // Square interior is opaque black, background fully transparent
    assert_eq!(fg.get_pixel(50, 50).0, [0, 0, 0, 255]);
    assert_eq!(fg.get_pixel(0, 0).0, [0, 0, 0, 0]);
    assert_eq!(fg.get_pixel(99, 99).0, [0, 0, 0, 0]);

    let opaque = fg.pixels().filter(|p| p.0[3] == 255).count();
    assert_eq!(opaque, 400);
}

#[test]
fn background_layer_is_a_full_copy_of_the_source() {
    let dir = TempDir::new().unwrap();
    let source = square_on_white(100, 20);
    let input = save_input(dir.path(), "card.png", &source);

    let config = ColorSegmentConfig::default();
    let layers = segment_color_file(&input, None, &config).unwrap();

    let bg = image::open(&layers.background).unwrap().to_rgb8();
    assert_eq!(bg.as_raw(), source.as_raw());
}

#[test]
fn repeated_runs_produce_identical_files() {
    let dir = TempDir::new().unwrap();
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let input = save_input(dir.path(), "card.png", &square_on_white(100, 20));

    let config = ColorSegmentConfig::default();
    let run_a = segment_color_file(&input, Some(first.path()), &config).unwrap();
    let run_b = segment_color_file(&input, Some(second.path()), &config).unwrap();

    assert_eq!(
        std::fs::read(&run_a.foreground).unwrap(),
        std::fs::read(&run_b.foreground).unwrap()
    );
    assert_eq!(
        std::fs::read(&run_a.background).unwrap(),
        std::fs::read(&run_b.background).unwrap()
    );
}

#[test]
fn manual_background_color_overrides_detection() {
    let dir = TempDir::new().unwrap();
    // Blue canvas with a white patch; corner detection would pick blue
    let image = RgbImage::from_fn(60, 60, |x, y| {
        if x < 10 && y < 10 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 200])
        }
    });
    let input = save_input(dir.path(), "patch.png", &image);

    // Treat white as background instead, so the blue area becomes foreground
    let config = ColorSegmentConfig::builder()
        .background_color([255, 255, 255])
        .smooth_edges(false)
        .remove_noise(false)
        .build()
        .unwrap();
    let layers = segment_color_file(&input, None, &config).unwrap();

    assert_eq!(layers.diagnostics.background_color, [255, 255, 255]);

    let fg = image::open(&layers.foreground).unwrap().to_rgba8();
    assert_eq!(fg.get_pixel(30, 30).0[3], 255);
    assert_eq!(fg.get_pixel(5, 5).0[3], 0);
}

#[test]
fn low_foreground_advisory_suggests_lower_tolerance() {
    let dir = TempDir::new().unwrap();
    // 4% foreground, well under the 20% advisory floor
    let input = save_input(dir.path(), "sparse.png", &square_on_white(100, 20));

    let config = ColorSegmentConfig::default();
    let layers = segment_color_file(&input, None, &config).unwrap();

    match layers.diagnostics.advisory {
        TuningAdvisory::LowForeground { suggested_tolerance } => {
            assert!((suggested_tolerance - 7.0).abs() < f32::EPSILON);
        },
        ref other => panic!("expected low-foreground advisory, got {other:?}"),
    }
}

#[test]
fn noise_removal_reports_dropped_components() {
    let dir = TempDir::new().unwrap();
    // Large square plus a lone dark pixel far away from it
    let mut image = square_on_white(100, 30);
    image.put_pixel(5, 5, Rgb([0, 0, 0]));
    let input = save_input(dir.path(), "noisy.png", &image);

    let config = ColorSegmentConfig::builder()
        .smooth_edges(false)
        .min_region_area(200)
        .build()
        .unwrap();
    let layers = segment_color_file(&input, None, &config).unwrap();

    assert_eq!(layers.diagnostics.removed_components, 1);

    let fg = image::open(&layers.foreground).unwrap().to_rgba8();
    assert_eq!(fg.get_pixel(5, 5).0[3], 0);
    assert_eq!(fg.get_pixel(50, 50).0[3], 255);
}

#[test]
fn missing_input_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = ColorSegmentConfig::default();

    let result = segment_color_file(dir.path().join("absent.png"), None, &config);
    assert!(result.is_err());

    // Nothing is written on failure
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn invalid_tolerance_produces_no_output() {
    let dir = TempDir::new().unwrap();
    let input = save_input(dir.path(), "card.png", &square_on_white(50, 10));

    let config = ColorSegmentConfig {
        background: BackgroundColor::Auto,
        tolerance_percent: 150.0,
        ..ColorSegmentConfig::default()
    };

    assert!(segment_color_file(&input, None, &config).is_err());
    assert!(!dir.path().join("card_FG.png").exists());
}
