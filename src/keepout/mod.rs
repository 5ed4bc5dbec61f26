//! Keep-out maps: regions of a picture that overlay text must avoid.
//!
//! - [`KeepOutMask`]: dense boolean grid over the image plane
//! - [`MaskBuilder`]: detections to mask (box expansion, mask dilation)
//! - [`codec`]: the `KOMAP` file format
//! - [`analyze`]: coverage statistics and connected regions

pub mod analyze;
pub mod builder;
pub mod codec;
mod mask;

pub use analyze::{analyze, MapStats, Region};
pub use builder::{MaskBuilder, MaskMethod, MaskOptions};
pub use codec::{
    decode, decode_full, encode, encode_with_header, read_map_file, write_map_file, DecodedMap,
    MapHeader,
};
pub use mask::KeepOutMask;
