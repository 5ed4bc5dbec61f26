//! Output types for the quantization pipeline.
//!
//! [`IndexedImage`] stores palette indices with dimension metadata and an
//! owned [`Palette`](crate::palette::Palette), offering:
//!
//! - **Indexed** ([`IndexedImage::indices`]): raw `u8` palette codes
//! - **Official RGB** ([`IndexedImage::to_rgb_official`]): panel upload colors
//! - **Actual RGB** ([`IndexedImage::to_rgb_actual`]): true appearance preview

mod indexed_image;

pub use indexed_image::IndexedImage;
