//! Assertion helpers for tests.

use pretty_assertions::assert_eq;

use inkmap::keepout::{codec, KeepOutMask};

/// Assert an encoded map has exactly the KOMAP size for its dimensions.
pub fn assert_map_len(bytes: &[u8], width: u32, height: u32) {
    let expected = codec::HEADER_LEN + (width as usize * height as usize).div_ceil(8);
    assert_eq!(
        bytes.len(),
        expected,
        "{width}x{height} map should be {expected} bytes"
    );
}

/// Assert two masks are equal, reporting the first differing pixel.
pub fn assert_masks_eq(actual: &KeepOutMask, expected: &KeepOutMask) {
    assert_eq!(
        (actual.width(), actual.height()),
        (expected.width(), expected.height()),
        "mask dimensions differ"
    );
    let first_diff = actual
        .cells()
        .iter()
        .zip(expected.cells())
        .position(|(a, b)| a != b);
    if let Some(i) = first_diff {
        let w = actual.width() as usize;
        panic!(
            "masks differ first at ({}, {}): got {}, expected {}",
            i % w,
            i / w,
            actual.cells()[i],
            expected.cells()[i]
        );
    }
}

/// Assert a file starts with the PNG signature.
pub fn assert_png_file(path: &std::path::Path) {
    let bytes = std::fs::read(path).expect("read output");
    assert!(
        bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]),
        "{} is not a PNG",
        path.display()
    );
}
