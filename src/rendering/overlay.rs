//! Keep-out visualization over the source picture.

use crate::error::ImageError;
use crate::keepout::{KeepOutMask, Region};
use crate::rendering::RgbImage;

/// Regions that get an outline
pub const OUTLINED_REGIONS: usize = 10;

const KEEP_OUT_TINT: [u8; 3] = [255, 0, 0];
const TINT_ALPHA: u16 = 128;
const OUTLINE: [u8; 3] = [0, 255, 0];
const OUTLINE_WIDTH: u32 = 2;

/// Tint keep-out pixels red at half opacity and outline the largest regions.
///
/// `regions` is expected largest first, as returned by
/// [`analyze`](crate::keepout::analyze); only the first
/// [`OUTLINED_REGIONS`] are drawn.
pub fn render_overlay(
    image: &RgbImage,
    mask: &KeepOutMask,
    regions: &[Region],
) -> Result<RgbImage, ImageError> {
    if (image.width, image.height) != (mask.width(), mask.height()) {
        return Err(ImageError::Dimension {
            expected_width: mask.width(),
            expected_height: mask.height(),
            width: image.width,
            height: image.height,
        });
    }

    let mut out = image.clone();
    for (pixel, _) in out
        .data
        .chunks_exact_mut(3)
        .zip(mask.cells())
        .filter(|(_, &keep_out)| keep_out)
    {
        for (channel, &tint) in pixel.iter_mut().zip(&KEEP_OUT_TINT) {
            *channel = ((tint as u16 * TINT_ALPHA + *channel as u16 * (255 - TINT_ALPHA)) / 255) as u8;
        }
    }

    for region in regions.iter().take(OUTLINED_REGIONS) {
        outline(&mut out, region);
    }
    Ok(out)
}

/// Draw an inset rectangle border on the inclusive bounds of `region`.
fn outline(image: &mut RgbImage, region: &Region) {
    let width = image.width as usize;
    let mut paint = |x: u32, y: u32| {
        if x < image.width && y < image.height {
            let idx = (y as usize * width + x as usize) * 3;
            image.data[idx..idx + 3].copy_from_slice(&OUTLINE);
        }
    };

    for t in 0..OUTLINE_WIDTH {
        let (top, bottom) = (region.y_min + t, region.y_max.saturating_sub(t));
        let (left, right) = (region.x_min + t, region.x_max.saturating_sub(t));
        if top > bottom || left > right {
            break;
        }
        for x in left..=right {
            paint(x, top);
            paint(x, bottom);
        }
        for y in top..=bottom {
            paint(left, y);
            paint(right, y);
        }
    }
}
