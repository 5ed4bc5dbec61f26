//! Gamma lookup table access
//!
//! The table is generated at compile time by build.rs.

include!(concat!(env!("OUT_DIR"), "/gamma_lut.rs"));

/// Convert an sRGB value (0.0..=1.0) to linear RGB using LUT with linear interpolation.
///
/// # Panics (debug only)
/// Debug-asserts that the input is in the range 0.0..=1.0.
#[inline]
pub fn srgb_to_linear(srgb: f32) -> f32 {
    debug_assert!(
        (0.0..=1.0).contains(&srgb),
        "srgb_to_linear: input {srgb} out of range 0.0..=1.0"
    );

    let srgb = srgb.clamp(0.0, 1.0);

    let scaled = srgb * 4095.0;
    let index = scaled as usize;

    if index >= 4095 {
        return SRGB_TO_LINEAR[4095];
    }

    let frac = scaled - index as f32;
    let a = SRGB_TO_LINEAR[index];
    let b = SRGB_TO_LINEAR[index + 1];
    a + (b - a) * frac
}
