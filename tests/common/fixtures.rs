//! Test fixtures: masks, PNG files and detector sidecars.

use std::path::Path;

use inkmap::keepout::KeepOutMask;
use inkmap::rendering::{encode_rgb_png, RgbImage};

/// Deterministic pseudo-random mask (xorshift), about `density` percent set.
pub fn noise_mask(width: u32, height: u32, seed: u64, density: u64) -> KeepOutMask {
    let mut state = seed | 1;
    let mut mask = KeepOutMask::new(width, height);
    for y in 0..height {
        for x in 0..width {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            mask.set(x, y, state % 100 < density);
        }
    }
    mask
}

/// Mask with `size x size` squares at the given top-left corners.
pub fn squares_mask(width: u32, height: u32, size: i64, corners: &[(i64, i64)]) -> KeepOutMask {
    let mut mask = KeepOutMask::new(width, height);
    for &(x, y) in corners {
        mask.fill_rect(x, y, x + size, y + size);
    }
    mask
}

/// Horizontal gray ramp from black to white.
pub fn gradient_image(width: u32, height: u32) -> RgbImage {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _ in 0..height {
        for x in 0..width {
            let v = (x * 255 / (width - 1).max(1)) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
    }
    RgbImage {
        width,
        height,
        data,
    }
}

pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> RgbImage {
    RgbImage {
        width,
        height,
        data: rgb.repeat((width * height) as usize),
    }
}

pub fn write_png(path: &Path, image: &RgbImage) {
    let bytes = encode_rgb_png(image).expect("encode test PNG");
    std::fs::write(path, bytes).expect("write test PNG");
}

/// Write a `<stem>.detections.json` with one box per entry.
pub fn write_box_sidecar(dir: &Path, stem: &str, boxes: &[([f32; 4], f32)]) {
    let detections: Vec<String> = boxes
        .iter()
        .map(|([x1, y1, x2, y2], conf)| {
            format!(
                r#"{{"box": [{x1}, {y1}, {x2}, {y2}], "confidence": {conf}, "class_id": 0, "label": "person"}}"#
            )
        })
        .collect();
    let json = format!(r#"{{"detections": [{}]}}"#, detections.join(", "));
    std::fs::write(dir.join(format!("{stem}.detections.json")), json).expect("write sidecar");
}
