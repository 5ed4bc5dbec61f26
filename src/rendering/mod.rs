pub mod overlay;
pub mod png_io;

pub use overlay::render_overlay;
pub use png_io::{decode_png, encode_indexed_png, encode_rgb_png, load_png, RgbImage};
