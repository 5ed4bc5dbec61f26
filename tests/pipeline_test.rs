//! Conversion of PNG files through the sidecar detector.

mod common;

use common::*;
use inkmap::keepout::{self, MaskBuilder, MaskMethod, MaskOptions};
use inkmap::models::AppConfig;
use inkmap::rendering;
use inkmap::services::Converter;
use pretty_assertions::assert_eq;

fn map_config(method: MaskMethod, margin: u32) -> AppConfig {
    let mut config = AppConfig::default();
    config.keepout.enabled = true;
    config.keepout.method = method;
    config.keepout.margin = margin;
    config.output.optimize_png = false;
    config
}

#[test]
fn test_gradient_uses_only_palette_colors() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.png");
    write_png(&input, &gradient_image(64, 16));

    let mut config = AppConfig::default();
    config.output.optimize_png = false;
    let converter = Converter::from_config(&config).unwrap();
    let outcome = converter.convert(&input).unwrap();

    assert_eq!(outcome.output, dir.path().join("ramp_output.png"));
    assert_png_file(&outcome.output);

    let official: Vec<[u8; 3]> = config
        .palette
        .official
        .iter()
        .map(|hex| {
            let v = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap();
            [(v >> 16) as u8, (v >> 8) as u8, v as u8]
        })
        .collect();
    let decoded = rendering::load_png(&outcome.output).unwrap();
    assert_eq!((decoded.width, decoded.height), (64, 16));
    for pixel in decoded.data.chunks_exact(3) {
        assert!(
            official.iter().any(|c| c == pixel),
            "pixel {pixel:?} is not a palette color"
        );
    }
}

#[test]
fn test_conversion_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ramp.png");
    write_png(&input, &gradient_image(50, 20));

    let mut config = AppConfig::default();
    config.output.optimize_png = false;
    let first = Converter::from_config(&config).unwrap().convert(&input).unwrap();
    let first_bytes = std::fs::read(&first.output).unwrap();
    let second = Converter::from_config(&config).unwrap().convert(&input).unwrap();
    assert_eq!(std::fs::read(&second.output).unwrap(), first_bytes);
}

#[test]
fn test_sidecar_boxes_produce_map() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("beach.png");
    write_png(&input, &solid_image(100, 100, [200, 180, 120]));
    write_box_sidecar(dir.path(), "beach", &[([10.0, 10.0, 20.0, 20.0], 0.9)]);

    let converter = Converter::from_config(&map_config(MaskMethod::Boxes, 5)).unwrap();
    let outcome = converter.convert(&input).unwrap();

    let map = outcome.map.expect("map written");
    assert_eq!(map.path, dir.path().join("beach_output.map"));
    let decoded = keepout::read_map_file(&map.path).unwrap();
    assert!(decoded.mask.get(5, 5));
    assert!(!decoded.mask.get(4, 4));
    assert_eq!(decoded.mask.count(), 400);
}

#[test]
fn test_segmentation_request_falls_back_to_boxes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("park.png");
    write_png(&input, &solid_image(60, 40, [30, 120, 30]));
    write_box_sidecar(dir.path(), "park", &[([0.0, 0.0, 10.0, 10.0], 0.7)]);

    let converter = Converter::from_config(&map_config(MaskMethod::Segmentation, 0)).unwrap();
    let map = converter.convert(&input).unwrap().map.unwrap();
    let decoded = keepout::read_map_file(&map.path).unwrap();
    assert_eq!(decoded.mask.count(), 100);
}

#[test]
fn test_segmentation_masks_are_dilated() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dog.png");
    write_png(&input, &solid_image(10, 10, [255, 255, 255]));
    let mut data = vec!["0.0"; 100];
    data[5 * 10 + 5] = "0.9";
    let json = format!(
        r#"{{"detections": [{{"box": [5, 5, 6, 6], "confidence": 0.95, "class_id": 16,
            "mask": {{"width": 10, "height": 10, "data": [{}]}}}}]}}"#,
        data.join(", ")
    );
    std::fs::write(dir.path().join("dog.detections.json"), json).unwrap();

    let converter = Converter::from_config(&map_config(MaskMethod::Segmentation, 1)).unwrap();
    let map = converter.convert(&input).unwrap().map.unwrap();
    let mask = keepout::read_map_file(&map.path).unwrap().mask;

    // 2x2 element anchored at (1, 1): pixel 5 grows to [5, 6]
    assert_eq!(mask.count(), 4);
    assert!(mask.get(5, 5) && mask.get(6, 6));
    assert!(!mask.get(4, 4));
}

#[test]
fn test_low_confidence_or_missing_sidecar_skip_map() {
    let dir = tempfile::tempdir().unwrap();
    let faint = dir.path().join("faint.png");
    let bare = dir.path().join("bare.png");
    write_png(&faint, &solid_image(20, 20, [0, 0, 255]));
    write_png(&bare, &solid_image(20, 20, [0, 0, 255]));
    write_box_sidecar(dir.path(), "faint", &[([1.0, 1.0, 5.0, 5.0], 0.1)]);

    let converter = Converter::from_config(&map_config(MaskMethod::Boxes, 3)).unwrap();
    for input in [&faint, &bare] {
        let outcome = converter.convert(input).unwrap();
        assert!(outcome.map.is_none());
        assert!(outcome.output.exists());
    }
    assert!(!dir.path().join("faint_output.map").exists());
    assert!(!dir.path().join("bare_output.map").exists());
}

#[test]
fn test_output_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("pic.png");
    write_png(&input, &solid_image(4, 4, [255, 255, 0]));

    let out_dir = dir.path().join("out").join("frames");
    let converter = Converter::from_config(&AppConfig::default())
        .unwrap()
        .output_dir(&out_dir)
        .keep_out(MaskBuilder::new(MaskOptions::default()));
    let outcome = converter.convert(&input).unwrap();
    assert_eq!(outcome.output, out_dir.join("pic_output.png"));
    assert_png_file(&outcome.output);
}
