//! KOMAP keep-out map files.
//!
//! Layout (little-endian):
//!
//! | offset | size | field                         |
//! |--------|------|-------------------------------|
//! | 0      | 5    | magic `"KOMAP"`               |
//! | 5      | 1    | version (1)                   |
//! | 6      | 2    | width, u16                    |
//! | 8      | 2    | height, u16                   |
//! | 10     | 6    | reserved, zero on write       |
//! | 16     | n    | bitmap, `n = ceil(w * h / 8)` |
//!
//! The bitmap is one continuous MSB-first bitstream over the pixels in
//! row-major order: pixel `i` lives in byte `i / 8` under mask `0x80 >> (i % 8)`.
//! Rows are not padded, so the file size is exactly `16 + ceil(w * h / 8)`.

use std::io::Write;
use std::path::Path;

use super::KeepOutMask;
use crate::error::{FormatError, KeepOutError};

pub const MAGIC: &[u8; 5] = b"KOMAP";
pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 16;

/// Parsed 16-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapHeader {
    pub version: u8,
    pub width: u16,
    pub height: u16,
    /// Carried verbatim so rewritten files keep whatever a producer stored here
    pub reserved: [u8; 6],
}

impl MapHeader {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            version: VERSION,
            width,
            height,
            reserved: [0; 6],
        }
    }

    /// Parse and validate the header at the start of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::TruncatedHeader {
                actual: bytes.len(),
            });
        }
        if &bytes[0..5] != MAGIC {
            return Err(FormatError::BadMagic {
                found: String::from_utf8_lossy(&bytes[0..5]).into_owned(),
            });
        }
        let version = bytes[5];
        if version != VERSION {
            return Err(FormatError::UnsupportedVersion { version });
        }
        let width = u16::from_le_bytes([bytes[6], bytes[7]]);
        let height = u16::from_le_bytes([bytes[8], bytes[9]]);
        if width == 0 || height == 0 {
            return Err(FormatError::ZeroDimension { width, height });
        }
        let mut reserved = [0u8; 6];
        reserved.copy_from_slice(&bytes[10..16]);
        Ok(Self {
            version,
            width,
            height,
            reserved,
        })
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..5].copy_from_slice(MAGIC);
        out[5] = self.version;
        out[6..8].copy_from_slice(&self.width.to_le_bytes());
        out[8..10].copy_from_slice(&self.height.to_le_bytes());
        out[10..16].copy_from_slice(&self.reserved);
        out
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    #[inline]
    pub fn bitmap_len(&self) -> usize {
        self.pixel_count().div_ceil(8)
    }

    /// Expected file size without trailing data.
    #[inline]
    pub fn file_len(&self) -> usize {
        HEADER_LEN + self.bitmap_len()
    }
}

/// Result of [`decode_full`].
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMap {
    pub header: MapHeader,
    pub mask: KeepOutMask,
    /// Bytes present after the bitmap, ignored
    pub trailing: usize,
}

/// Encode with a fresh version-1 header.
pub fn encode(mask: &KeepOutMask) -> Result<Vec<u8>, KeepOutError> {
    let (width, height) = checked_dims(mask)?;
    encode_with_header(&MapHeader::new(width, height), mask)
}

/// Encode with an explicit header, e.g. one read from an existing file.
///
/// The header's dimensions must match the mask.
pub fn encode_with_header(header: &MapHeader, mask: &KeepOutMask) -> Result<Vec<u8>, KeepOutError> {
    let (width, height) = checked_dims(mask)?;
    if (header.width, header.height) != (width, height) {
        return Err(KeepOutError::Dimension(format!(
            "header says {}x{}, mask is {}x{}",
            header.width, header.height, width, height
        )));
    }

    let mut out = Vec::with_capacity(header.file_len());
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(&pack_bits(mask.cells()));
    Ok(out)
}

/// Decode a map, ignoring trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<KeepOutMask, KeepOutError> {
    Ok(decode_full(bytes)?.mask)
}

/// Decode a map and report its header and trailing byte count.
pub fn decode_full(bytes: &[u8]) -> Result<DecodedMap, KeepOutError> {
    let header = MapHeader::parse(bytes)?;
    let expected = header.bitmap_len();
    let body = &bytes[HEADER_LEN..];
    if body.len() < expected {
        return Err(FormatError::TruncatedBitmap {
            expected,
            actual: body.len(),
        }
        .into());
    }

    let trailing = body.len() - expected;
    if trailing > 0 {
        tracing::warn!(trailing, "Ignoring trailing bytes after keep-out bitmap");
    }

    let cells = unpack_bits(&body[..expected], header.pixel_count());
    let mask = KeepOutMask::from_cells(header.width as u32, header.height as u32, cells)?;
    Ok(DecodedMap {
        header,
        mask,
        trailing,
    })
}

/// Encode and write atomically: the bytes go to a temporary sibling that is
/// then renamed over `path`.
pub fn write_map_file(path: &Path, mask: &KeepOutMask) -> Result<(), KeepOutError> {
    let bytes = encode(mask)?;

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let written = std::fs::File::create(&tmp_path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|_| std::fs::rename(&tmp_path, path)) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote keep-out map");
    Ok(())
}

pub fn read_map_file(path: &Path) -> Result<DecodedMap, KeepOutError> {
    let bytes = std::fs::read(path)?;
    decode_full(&bytes)
}

fn checked_dims(mask: &KeepOutMask) -> Result<(u16, u16), KeepOutError> {
    let to_u16 = |v: u32| u16::try_from(v).ok().filter(|&v| v > 0);
    match (to_u16(mask.width()), to_u16(mask.height())) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(KeepOutError::Dimension(format!(
            "map dimensions must be within 1..=65535, got {}x{}",
            mask.width(),
            mask.height()
        ))),
    }
}

fn pack_bits(cells: &[bool]) -> Vec<u8> {
    let mut out = vec![0u8; cells.len().div_ceil(8)];
    for (i, _) in cells.iter().enumerate().filter(|(_, &c)| c) {
        out[i / 8] |= 0x80 >> (i % 8);
    }
    out
}

fn unpack_bits(bytes: &[u8], count: usize) -> Vec<bool> {
    (0..count)
        .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> KeepOutMask {
        let mut mask = KeepOutMask::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.set(x, y, (x + y) % 2 == 0);
            }
        }
        mask
    }

    #[test]
    fn test_header_layout() {
        let bytes = MapHeader::new(0x0102, 0x0304).to_bytes();
        assert_eq!(&bytes[0..5], b"KOMAP");
        assert_eq!(bytes[5], 1);
        assert_eq!(&bytes[6..10], &[0x02, 0x01, 0x04, 0x03]);
        assert_eq!(&bytes[10..16], &[0; 6]);
    }

    #[test]
    fn test_bit_order_msb_first() {
        let mut mask = KeepOutMask::new(3, 3);
        mask.set(0, 0, true);
        mask.set(2, 0, true);
        mask.set(1, 2, true); // pixel 7
        mask.set(2, 2, true); // pixel 8, second byte
        let bytes = encode(&mask).unwrap();
        assert_eq!(bytes.len(), 16 + 2);
        assert_eq!(bytes[16], 0b1010_0001);
        assert_eq!(bytes[17], 0b1000_0000);
    }

    #[test]
    fn test_roundtrip_odd_width() {
        let mask = checker(13, 7);
        let bytes = encode(&mask).unwrap();
        assert_eq!(bytes.len(), 16 + (13 * 7usize).div_ceil(8));
        assert_eq!(decode(&bytes).unwrap(), mask);
    }

    #[test]
    fn test_single_pixel() {
        let mut mask = KeepOutMask::new(1, 1);
        mask.set(0, 0, true);
        let bytes = encode(&mask).unwrap();
        assert_eq!(bytes.len(), 17);
        assert_eq!(decode(&bytes).unwrap(), mask);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&checker(8, 8)).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            decode(&bytes),
            Err(KeepOutError::Format(FormatError::BadMagic { .. }))
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&checker(8, 8)).unwrap();
        bytes[5] = 2;
        assert!(matches!(
            decode(&bytes),
            Err(KeepOutError::Format(FormatError::UnsupportedVersion { version: 2 }))
        ));
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        for (width, height) in [(0u16, 4u16), (4, 0), (0, 0)] {
            let bytes = MapHeader::new(width, height).to_bytes();
            assert_eq!(
                MapHeader::parse(&bytes),
                Err(FormatError::ZeroDimension { width, height })
            );
            assert!(matches!(
                decode(&bytes),
                Err(KeepOutError::Format(FormatError::ZeroDimension { .. }))
            ));
        }
        assert!(matches!(
            encode(&KeepOutMask::new(0, 4)),
            Err(KeepOutError::Dimension(_))
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            decode(b"KOMAP\x01"),
            Err(KeepOutError::Format(FormatError::TruncatedHeader { actual: 6 }))
        ));
    }

    #[test]
    fn test_truncated_bitmap() {
        let bytes = encode(&checker(10, 10)).unwrap();
        let short = &bytes[..bytes.len() - 1];
        assert!(matches!(
            decode(short),
            Err(KeepOutError::Format(FormatError::TruncatedBitmap {
                expected: 13,
                actual: 12
            }))
        ));
    }

    #[test]
    fn test_trailing_bytes_are_ignored() {
        let mask = checker(10, 10);
        let mut bytes = encode(&mask).unwrap();
        bytes.extend_from_slice(&[0xff; 10]);
        let decoded = decode_full(&bytes).unwrap();
        assert_eq!(decoded.trailing, 10);
        assert_eq!(decoded.mask, mask);
    }

    #[test]
    fn test_padding_bits_never_read() {
        let mask = KeepOutMask::new(3, 1);
        let mut bytes = encode(&mask).unwrap();
        bytes[16] = 0b0001_1111;
        assert_eq!(decode(&bytes).unwrap().count(), 0);
    }

    #[test]
    fn test_reserved_bytes_preserved() {
        let mask = checker(4, 4);
        let mut header = MapHeader::new(4, 4);
        header.reserved = [1, 2, 3, 4, 5, 6];
        let bytes = encode_with_header(&header, &mask).unwrap();
        assert_eq!(decode_full(&bytes).unwrap().header, header);
    }

    #[test]
    fn test_header_dimension_mismatch() {
        let header = MapHeader::new(5, 4);
        assert!(matches!(
            encode_with_header(&header, &checker(4, 4)),
            Err(KeepOutError::Dimension(_))
        ));
    }

    #[test]
    fn test_oversized_mask_rejected() {
        let mask = KeepOutMask::new(70_000, 1);
        assert!(matches!(encode(&mask), Err(KeepOutError::Dimension(_))));
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo_output.map");
        let mask = checker(31, 17);

        write_map_file(&path, &mask).unwrap();
        assert!(!dir.path().join("photo_output.map.tmp").exists());

        let decoded = read_map_file(&path).unwrap();
        assert_eq!(decoded.mask, mask);
        assert_eq!(decoded.trailing, 0);
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_map_file(&dir.path().join("nope.map")),
            Err(KeepOutError::Io(_))
        ));
    }
}
