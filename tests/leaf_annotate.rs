use image::{DynamicImage, Rgb};
use leaf_doctor::synthetic::{LEAF_BROWN, LEAF_GREEN, banded_image, generate_leaf_sample, solid_image};
use leaf_doctor::{AnalysisError, AnnotationStyle, Condition, LeafAnalyzer, LeafDoctorConfig};
use std::fs;
use std::path::PathBuf;

const RED: Rgb<u8> = Rgb([255, 0, 0]);

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("leaf_doctor_{name}_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

#[test]
fn stressed_label_is_red_at_the_anchor() {
    let source = DynamicImage::ImageRgb8(banded_image(100, 100, 20, LEAF_BROWN, LEAF_GREEN));
    let out = LeafAnalyzer::default().analyze(&source, None).expect("analysis");
    assert_eq!(out.record.condition, Condition::Stressed);

    // Left stroke of the leading 'L': x 30..33, y 29..50 with the default style.
    assert_eq!(*out.annotated.get_pixel(31, 35), RED);
    assert_eq!(*out.annotated.get_pixel(30, 49), RED);
}

#[test]
fn healthy_label_is_green() {
    let white = Rgb([255, 255, 255]);
    let source = DynamicImage::ImageRgb8(solid_image(120, 80, white));
    let out = LeafAnalyzer::default().analyze(&source, None).expect("analysis");
    assert_eq!(out.record.condition, Condition::Healthy);
    assert_eq!(*out.annotated.get_pixel(31, 35), Rgb([0, 255, 0]));
}

#[test]
fn pixels_outside_the_text_band_are_untouched() {
    let img = banded_image(100, 100, 20, LEAF_BROWN, LEAF_GREEN);
    let source = DynamicImage::ImageRgb8(img.clone());
    let out = LeafAnalyzer::default().analyze(&source, None).expect("analysis");

    for (x, y, px) in out.annotated.enumerate_pixels() {
        let in_text_band = x >= 30 && (29..50).contains(&y);
        if !in_text_band {
            assert_eq!(px, img.get_pixel(x, y), "pixel ({x}, {y}) changed");
        }
    }
    // The caller's image is left alone.
    assert_eq!(source.to_rgb8().as_raw(), img.as_raw());
}

#[test]
fn custom_anchor_and_colors() {
    let config = LeafDoctorConfig {
        annotation: AnnotationStyle {
            anchor: (2, 10),
            glyph_scale: 1,
            stressed_color: [0, 0, 255],
            ..AnnotationStyle::default()
        },
        ..LeafDoctorConfig::default()
    };
    let analyzer = LeafAnalyzer::new(config).expect("config");
    let source = DynamicImage::ImageRgb8(solid_image(40, 20, LEAF_BROWN));
    let out = analyzer.analyze(&source, None).expect("analysis");
    assert_eq!(*out.annotated.get_pixel(2, 3), Rgb([0, 0, 255]));
    assert_eq!(*out.annotated.get_pixel(2, 10), LEAF_BROWN);
}

#[test]
fn analyze_path_writes_prefixed_result() {
    let dir = scratch_dir("path");
    let input = dir.join("leaf.png");
    banded_image(64, 64, 32, LEAF_BROWN, LEAF_GREEN)
        .save(&input)
        .expect("failed to write input");

    let out_dir = dir.join("results");
    let out = LeafAnalyzer::default()
        .analyze_path(&input, &out_dir, Some("from a test"))
        .expect("analysis");

    let expected = out_dir.join("result_leaf.png");
    assert_eq!(out.record.annotated_image_path.as_deref(), Some(expected.as_path()));
    assert_eq!(out.record.coverage_ratio, 50.0);
    assert_eq!(out.record.user_note.as_deref(), Some("from a test"));

    let written = image::open(&expected).expect("annotated image readable").to_rgb8();
    assert_eq!(written.as_raw(), out.annotated.as_raw());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = scratch_dir("missing");
    let err = LeafAnalyzer::default()
        .analyze_path(&dir.join("nope.png"), &dir, None)
        .unwrap_err();
    assert!(matches!(err, AnalysisError::Io { .. }));
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn corrupt_file_is_a_decode_error_and_writes_nothing() {
    let dir = scratch_dir("corrupt");
    let input = dir.join("broken.png");
    fs::write(&input, b"\x89PNG\r\n\x1a\nthis is not really a png").expect("write");

    let out_dir = dir.join("results");
    let err = LeafAnalyzer::default().analyze_path(&input, &out_dir, None).unwrap_err();
    assert!(matches!(err, AnalysisError::Decode(_)));
    assert!(!out_dir.join("result_broken.png").exists());
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn failed_encode_leaves_no_result_file() {
    let dir = scratch_dir("encode");
    // PNG content under an extension no encoder claims: decoding sniffs the
    // bytes, writing goes by the extension.
    let input = dir.join("leaf.xyz");
    solid_image(16, 16, LEAF_BROWN)
        .save_with_format(&input, image::ImageFormat::Png)
        .expect("failed to write input");

    let out_dir = dir.join("results");
    let err = LeafAnalyzer::default().analyze_path(&input, &out_dir, None).unwrap_err();
    assert!(matches!(err, AnalysisError::Encode { .. }));
    let leftovers: Vec<_> = fs::read_dir(&out_dir).expect("results dir").collect();
    assert!(leftovers.is_empty(), "left behind: {leftovers:?}");
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn sample_leaf_has_a_visible_blotch() {
    let dir = scratch_dir("sample");
    let path = dir.join("sample.png");
    generate_leaf_sample(&path).expect("sample written");

    let out = LeafAnalyzer::default().analyze_path(&path, &dir, None).expect("analysis");
    assert!(out.record.coverage_ratio > 0.0);
    assert!(out.record.coverage_ratio < 100.0);
    fs::remove_dir_all(&dir).ok();
}

#[test]
fn analyzer_serves_parallel_calls() {
    let analyzer = std::sync::Arc::new(LeafAnalyzer::default());
    let handles: Vec<_> = (0..8u32)
        .map(|rows| {
            let analyzer = std::sync::Arc::clone(&analyzer);
            std::thread::spawn(move || {
                let source = DynamicImage::ImageRgb8(banded_image(10, 8, rows, LEAF_BROWN, LEAF_GREEN));
                let out = analyzer.analyze(&source, None).expect("analysis");
                (rows, out.record.coverage_ratio)
            })
        })
        .collect();

    for handle in handles {
        let (rows, ratio) = handle.join().expect("thread panicked");
        assert_eq!(ratio, rows as f64 * 100.0 / 8.0);
    }
}
