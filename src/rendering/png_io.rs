//! PNG decode to RGB and indexed/RGB encode.

use std::io::Cursor;
use std::path::Path;

use spectra_dither::{IndexedImage, Srgb};

use crate::error::ImageError;

/// 8-bit RGB pixels, alpha already composited onto white.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    /// `[R, G, B, R, G, B, ...]`, row-major
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn to_srgb(&self) -> Vec<Srgb> {
        self.data
            .chunks_exact(3)
            .map(|c| Srgb::from_u8(c[0], c[1], c[2]))
            .collect()
    }
}

pub fn load_png(path: &Path) -> Result<RgbImage, ImageError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ImageError::PngDecode(format!("{}: {e}", path.display())))?;
    decode_png(&bytes)
}

/// Decode any PNG the `png` crate understands into 8-bit RGB.
///
/// Palette and low bit depth images are expanded, 16-bit samples stripped to
/// 8 bits, and transparent pixels composited onto white.
pub fn decode_png(bytes: &[u8]) -> Result<RgbImage, ImageError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageError::PngDecode(e.to_string()))?;

    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ImageError::PngDecode(e.to_string()))?;
    let frame = &buf[..info.buffer_size()];

    if info.bit_depth != png::BitDepth::Eight {
        return Err(ImageError::UnsupportedColor(format!(
            "{:?} at {:?} bits",
            info.color_type, info.bit_depth
        )));
    }

    let data = match info.color_type {
        png::ColorType::Rgb => frame.to_vec(),
        png::ColorType::Rgba => frame.chunks_exact(4).flat_map(composite_on_white).collect(),
        png::ColorType::Grayscale => frame.iter().flat_map(|&v| [v, v, v]).collect(),
        png::ColorType::GrayscaleAlpha => frame
            .chunks_exact(2)
            .flat_map(|p| composite_on_white(&[p[0], p[0], p[0], p[1]]))
            .collect(),
        other => {
            return Err(ImageError::UnsupportedColor(format!("{other:?}")));
        }
    };

    Ok(RgbImage {
        width: info.width,
        height: info.height,
        data,
    })
}

fn composite_on_white(pixel: &[u8]) -> [u8; 3] {
    let (r, g, b, a) = (pixel[0], pixel[1], pixel[2], pixel[3]);
    match a {
        255 => [r, g, b],
        0 => [255, 255, 255],
        _ => {
            let af = a as u16;
            let blend = |c: u8| ((c as u16 * af + 255 * (255 - af)) / 255) as u8;
            [blend(r), blend(g), blend(b)]
        }
    }
}

/// Encode as an indexed PNG whose PLTE holds the official palette colors.
///
/// With `optimize`, the result is re-compressed with oxipng; if that fails
/// the unoptimized bytes are returned.
pub fn encode_indexed_png(image: &IndexedImage, optimize: bool) -> Result<Vec<u8>, ImageError> {
    let (width, height) = png_dims(image.width(), image.height())?;
    let palette = image.palette();

    let (depth, bits) = match palette.len() {
        0..=2 => (png::BitDepth::One, 1),
        3..=4 => (png::BitDepth::Two, 2),
        5..=16 => (png::BitDepth::Four, 4),
        _ => (png::BitDepth::Eight, 8),
    };
    let plte: Vec<u8> = (0..palette.len())
        .flat_map(|i| palette.official(i).to_bytes())
        .collect();
    let packed = if bits == 8 {
        image.indices().to_vec()
    } else {
        pack_nbits(image.indices(), width, bits)
    };

    let png_bytes = encode_png(
        width,
        height,
        png::ColorType::Indexed,
        depth,
        Some(&plte),
        &packed,
    )?;
    Ok(if optimize {
        optimize_png(png_bytes)
    } else {
        png_bytes
    })
}

/// Encode 8-bit RGB data.
pub fn encode_rgb_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let expected = image.width as usize * image.height as usize * 3;
    if image.data.len() != expected {
        return Err(ImageError::PngEncode(format!(
            "{}x{} RGB image needs {expected} bytes, got {}",
            image.width,
            image.height,
            image.data.len()
        )));
    }
    encode_png(
        image.width,
        image.height,
        png::ColorType::Rgb,
        png::BitDepth::Eight,
        None,
        &image.data,
    )
}

/// Re-compress with oxipng (zopfli + adaptive filter selection).
fn optimize_png(png_bytes: Vec<u8>) -> Vec<u8> {
    oxipng::optimize_from_memory(
        &png_bytes,
        &oxipng::Options {
            strip: oxipng::StripChunks::Safe,
            optimize_alpha: false,
            ..Default::default()
        },
    )
    .unwrap_or(png_bytes)
}

fn png_dims(width: usize, height: usize) -> Result<(u32, u32), ImageError> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(ImageError::PngEncode(format!(
            "image {width}x{height} too large for PNG"
        ))),
    }
}

fn encode_png(
    width: u32,
    height: u32,
    color_type: png::ColorType,
    bit_depth: png::BitDepth,
    plte: Option<&[u8]>,
    data: &[u8],
) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    {
        // Fast settings; oxipng re-compresses when enabled
        let mut encoder = png::Encoder::new(&mut buf, width, height);
        encoder.set_color(color_type);
        encoder.set_depth(bit_depth);
        encoder.set_compression(png::Compression::Fast);
        encoder.set_filter(png::FilterType::NoFilter);
        if let Some(plte) = plte {
            encoder.set_palette(plte);
        }
        let mut writer = encoder
            .write_header()
            .map_err(|e| ImageError::PngEncode(e.to_string()))?;
        writer
            .write_image_data(data)
            .map_err(|e| ImageError::PngEncode(e.to_string()))?;
    }
    Ok(buf.into_inner())
}

/// Pack palette indices into N-bit PNG rows (1, 2, or 4 bits per pixel).
fn pack_nbits(indices: &[u8], width: u32, bits: u8) -> Vec<u8> {
    let pixels_per_byte = 8 / bits as usize;
    let bytes_per_row = (width as usize).div_ceil(pixels_per_byte);
    let height = indices.len() / width as usize;
    let mask = (1u8 << bits) - 1;
    let mut packed = Vec::with_capacity(bytes_per_row * height);

    for row in indices.chunks(width as usize) {
        let mut byte = 0u8;
        for (i, &idx) in row.iter().enumerate() {
            let shift = (8 - bits) - (i % pixels_per_byte) as u8 * bits;
            byte |= (idx & mask) << shift;

            if (i % pixels_per_byte) == pixels_per_byte - 1 || i == row.len() - 1 {
                packed.push(byte);
                byte = 0;
            }
        }
    }

    packed
}
