use std::env;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// IEC 61966-2-1 exact formula: sRGB to linear
fn srgb_to_linear_exact(srgb: f64) -> f64 {
    if srgb <= 0.04045 {
        srgb / 12.92
    } else {
        ((srgb + 0.055) / 1.055).powf(2.4)
    }
}

fn write_lut(file: &mut File) -> io::Result<()> {
    writeln!(file, "/// Lookup table for sRGB to linear conversion")?;
    writeln!(file, "/// Index: srgb value * 4095.0, Value: linear value")?;
    writeln!(file, "pub static SRGB_TO_LINEAR: [f32; 4096] = [")?;
    for i in 0..4096 {
        let srgb = i as f64 / 4095.0;
        if i > 0 && i % 8 == 0 {
            writeln!(file)?;
        }
        write!(file, "    {:.9},", srgb_to_linear_exact(srgb) as f32)?;
    }
    writeln!(file, "\n];")
}

fn main() {
    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let dest_path = Path::new(&out_dir).join("gamma_lut.rs");
    let mut file = File::create(&dest_path).expect("create gamma_lut.rs");
    write_lut(&mut file).expect("write gamma_lut.rs");

    println!("cargo::rerun-if-changed=build.rs");
}
