//! Palette struct with dual color storage and nearest-color matching.
//!
//! This module provides the core `Palette` type that stores both official
//! (what the panel controller expects) and actual (measured) colors for
//! e-paper panels, together with the distance metric used to match pixels
//! against the actual colors.

use std::collections::HashSet;
use std::str::FromStr;

use super::error::PaletteError;
use crate::color::{Lab, Srgb};

/// Per-channel weights of the chroma term (R, G, B).
const CHANNEL_WEIGHTS: [f32; 3] = [0.25, 0.35, 0.40];

/// Fixed scale applied to the weighted RGB distance before the outer weight.
const CHROMA_SCALE: f32 = 0.75;

/// Distance metric for palette color matching.
///
/// A palette carries exactly one metric, so every pixel of an image quantized
/// against it is matched the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMetric {
    /// Weighted RGB distance plus a squared luma difference.
    ///
    /// ```text
    /// chroma = 0.75 * (0.25*dR² + 0.35*dG² + 0.40*dB²)     (channels in 0..1)
    /// luma   = 0.25*R + 0.35*G + 0.40*B
    /// d      = kc * chroma + kl * (luma_pixel - luma_entry)²
    /// ```
    ///
    /// With `kc: 1.5, kl: 0.60` the panel favors brightness-accurate matches
    /// over exact hue matches.
    LumaWeighted {
        /// Outer weight of the chroma term.
        kc: f32,
        /// Outer weight of the luma term.
        kl: f32,
    },

    /// Squared CIE76 ΔE in CIE L*a*b* (D65).
    CieLab76,
}

impl DistanceMetric {
    /// Luma-weighted metric with the panel's tuned weights.
    pub const SPECTRA: DistanceMetric = DistanceMetric::LumaWeighted { kc: 1.5, kl: 0.60 };

    /// Distance between two arbitrary colors under this metric.
    ///
    /// [`Palette::find_nearest()`] uses precomputed palette descriptors
    /// instead; this is the reference definition.
    ///
    /// # Example
    ///
    /// ```
    /// use spectra_dither::{DistanceMetric, Srgb};
    ///
    /// let c = Srgb::from_u8(190, 60, 55);
    /// assert_eq!(DistanceMetric::SPECTRA.distance(c, c), 0.0);
    /// assert_eq!(DistanceMetric::CieLab76.distance(c, c), 0.0);
    /// ```
    pub fn distance(self, a: Srgb, b: Srgb) -> f32 {
        match self {
            DistanceMetric::LumaWeighted { kc, kl } => {
                luma_weighted(kc, kl, a, a.luma(), b, b.luma())
            }
            DistanceMetric::CieLab76 => Lab::from(a).delta_e_squared(Lab::from(b)),
        }
    }
}

impl Default for DistanceMetric {
    fn default() -> Self {
        DistanceMetric::SPECTRA
    }
}

#[inline]
fn luma_weighted(kc: f32, kl: f32, a: Srgb, a_luma: f32, b: Srgb, b_luma: f32) -> f32 {
    let dr = a.r - b.r;
    let dg = a.g - b.g;
    let db = a.b - b.b;
    let chroma = (CHANNEL_WEIGHTS[0] * dr * dr
        + CHANNEL_WEIGHTS[1] * dg * dg
        + CHANNEL_WEIGHTS[2] * db * db)
        * CHROMA_SCALE;
    let dl = a_luma - b_luma;
    kc * chroma + kl * dl * dl
}

/// A color palette with dual color storage and perceptual matching.
///
/// `Palette` stores both the official colors (the codes the panel expects,
/// written to the indexed output) and the actual colors (what the panel
/// really shows). Matching and error computation use the actual colors.
///
/// The entry order is the palette code: index `i` in the quantized output
/// means official color `i`, on every encode and decode.
///
/// # Precomputation
///
/// Luma and CIE L*a*b* descriptors of the actual colors are computed once at
/// construction so per-pixel matching is a plain linear scan.
///
/// # Example
///
/// ```
/// use spectra_dither::{Palette, Srgb};
///
/// let colors = [Srgb::from_u8(0, 0, 0), Srgb::from_u8(255, 255, 255)];
/// let palette = Palette::new(&colors, None).unwrap();
///
/// assert_eq!(palette.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Palette {
    official_srgb: Vec<Srgb>,
    actual_srgb: Vec<Srgb>,
    actual_luma: Vec<f32>,
    actual_lab: Vec<Lab>,
    distance_metric: DistanceMetric,
}

impl Palette {
    /// Create a new palette from official sRGB colors.
    ///
    /// # Arguments
    ///
    /// * `official` - The official palette colors (what the panel expects)
    /// * `actual` - Optional actual colors (what the panel really shows).
    ///              If `None`, official colors are used for both.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `official` is empty ([`PaletteError::EmptyPalette`])
    /// - `official` has more than 256 entries ([`PaletteError::TooManyColors`])
    /// - `actual` has a different length than `official` ([`PaletteError::LengthMismatch`])
    /// - Either array contains duplicate colors ([`PaletteError::DuplicateColor`])
    pub fn new(official: &[Srgb], actual: Option<&[Srgb]>) -> Result<Self, PaletteError> {
        if official.is_empty() {
            return Err(PaletteError::EmptyPalette);
        }
        if official.len() > 256 {
            return Err(PaletteError::TooManyColors {
                count: official.len(),
            });
        }

        let actual_colors: Vec<Srgb> = match actual {
            Some(a) => {
                if a.len() != official.len() {
                    return Err(PaletteError::LengthMismatch {
                        official: official.len(),
                        actual: a.len(),
                    });
                }
                a.to_vec()
            }
            None => official.to_vec(),
        };

        check_distinct(official)?;
        check_distinct(&actual_colors)?;

        Ok(Self::from_validated(official.to_vec(), actual_colors))
    }

    /// The six pure panel colors: black, white, yellow, red, blue, green.
    pub fn spectra6() -> Self {
        let official = SPECTRA6_OFFICIAL.map(Srgb::from_bytes).to_vec();
        Self::from_validated(official.clone(), official)
    }

    /// Pure panel colors as output codes, matched against measured panel colors.
    ///
    /// Defaults to the CIE76 metric, the metric these measurements were tuned with.
    pub fn spectra6_measured() -> Self {
        Self::from_validated(
            SPECTRA6_OFFICIAL.map(Srgb::from_bytes).to_vec(),
            SPECTRA6_MEASURED.map(Srgb::from_bytes).to_vec(),
        )
        .with_distance_metric(DistanceMetric::CieLab76)
    }

    fn from_validated(official: Vec<Srgb>, actual: Vec<Srgb>) -> Self {
        let actual_luma = actual.iter().map(|c| c.luma()).collect();
        let actual_lab = actual.iter().map(|&c| Lab::from(c)).collect();

        Self {
            official_srgb: official,
            actual_srgb: actual,
            actual_luma,
            actual_lab,
            distance_metric: DistanceMetric::default(),
        }
    }

    /// Returns the number of colors in the palette.
    #[inline]
    pub fn len(&self) -> usize {
        self.official_srgb.len()
    }

    /// Always `false`: empty palettes are rejected at construction time.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.official_srgb.is_empty()
    }

    /// Get the official sRGB color at the given index.
    #[inline]
    pub fn official(&self, idx: usize) -> Srgb {
        self.official_srgb[idx]
    }

    /// Get the actual sRGB color at the given index.
    #[inline]
    pub fn actual(&self, idx: usize) -> Srgb {
        self.actual_srgb[idx]
    }

    /// Precomputed luma of the actual color at the given index.
    #[inline]
    pub fn luma(&self, idx: usize) -> f32 {
        self.actual_luma[idx]
    }

    /// Precomputed CIE L*a*b* of the actual color at the given index.
    #[inline]
    pub fn actual_lab(&self, idx: usize) -> Lab {
        self.actual_lab[idx]
    }

    /// The metric used by [`distance()`](Self::distance) and
    /// [`find_nearest()`](Self::find_nearest).
    #[inline]
    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    /// Replace the distance metric.
    ///
    /// # Example
    ///
    /// ```
    /// use spectra_dither::{DistanceMetric, Palette};
    ///
    /// let palette = Palette::spectra6().with_distance_metric(DistanceMetric::CieLab76);
    /// assert_eq!(palette.distance_metric(), DistanceMetric::CieLab76);
    /// ```
    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = metric;
        self
    }

    /// Distance from `color` to the palette entry at `idx`. Never negative.
    #[inline]
    pub fn distance(&self, color: Srgb, idx: usize) -> f32 {
        match self.distance_metric {
            DistanceMetric::LumaWeighted { kc, kl } => luma_weighted(
                kc,
                kl,
                color,
                color.luma(),
                self.actual_srgb[idx],
                self.actual_luma[idx],
            ),
            DistanceMetric::CieLab76 => Lab::from(color).delta_e_squared(self.actual_lab[idx]),
        }
    }

    /// Find the nearest palette color to `color`.
    ///
    /// Matches against ACTUAL colors. Returns `(index, distance)`; ties go to
    /// the lowest index.
    ///
    /// # Example
    ///
    /// ```
    /// use spectra_dither::{Palette, Srgb};
    ///
    /// let palette = Palette::spectra6();
    /// let (idx, dist) = palette.find_nearest(Srgb::from_u8(255, 255, 0));
    /// assert_eq!(idx, 2);
    /// assert_eq!(dist, 0.0);
    /// ```
    #[inline]
    pub fn find_nearest(&self, color: Srgb) -> (usize, f32) {
        let mut best_idx = 0;
        let mut best_dist = f32::MAX;

        // Linear scan - palettes are a handful of entries
        match self.distance_metric {
            DistanceMetric::LumaWeighted { kc, kl } => {
                let luma = color.luma();
                for (i, (&entry, &entry_luma)) in
                    self.actual_srgb.iter().zip(&self.actual_luma).enumerate()
                {
                    let dist = luma_weighted(kc, kl, color, luma, entry, entry_luma);
                    if dist < best_dist {
                        best_dist = dist;
                        best_idx = i;
                    }
                }
            }
            DistanceMetric::CieLab76 => {
                let lab = Lab::from(color);
                for (i, &entry) in self.actual_lab.iter().enumerate() {
                    let dist = lab.delta_e_squared(entry);
                    if dist < best_dist {
                        best_dist = dist;
                        best_idx = i;
                    }
                }
            }
        }

        (best_idx, best_dist)
    }

    /// Create a palette from hex color strings.
    ///
    /// # Errors
    ///
    /// Returns [`PaletteError::ParseColor`] if any hex string is invalid,
    /// or other [`PaletteError`] variants for palette validation failures.
    ///
    /// # Example
    ///
    /// ```
    /// use spectra_dither::Palette;
    ///
    /// let palette = Palette::from_hex(
    ///     &["#000000", "#FFFFFF", "#FF0000"],
    ///     Some(&["#0A0A0A", "#F5F5EB", "#BE3C37"]),
    /// ).unwrap();
    /// assert_eq!(palette.len(), 3);
    /// ```
    pub fn from_hex(official: &[&str], actual: Option<&[&str]>) -> Result<Self, PaletteError> {
        let official_srgb = parse_hex_list(official)?;
        let actual_srgb = match actual {
            Some(a) => Some(parse_hex_list(a)?),
            None => None,
        };
        Palette::new(&official_srgb, actual_srgb.as_deref())
    }
}

/// Pure panel colors in palette-code order.
const SPECTRA6_OFFICIAL: [[u8; 3]; 6] = [
    [0, 0, 0],       // black
    [255, 255, 255], // white
    [255, 255, 0],   // yellow
    [255, 0, 0],     // red
    [0, 0, 255],     // blue
    [0, 255, 0],     // green
];

/// Measured appearance of the same entries on the panel.
const SPECTRA6_MEASURED: [[u8; 3]; 6] = [
    [10, 10, 10],
    [245, 245, 235],
    [245, 210, 50],
    [190, 60, 55],
    [45, 75, 160],
    [55, 140, 85],
];

fn check_distinct(colors: &[Srgb]) -> Result<(), PaletteError> {
    let mut seen = HashSet::new();
    for (i, color) in colors.iter().enumerate() {
        if !seen.insert(color.to_bytes()) {
            return Err(PaletteError::DuplicateColor { index: i });
        }
    }
    Ok(())
}

fn parse_hex_list(list: &[&str]) -> Result<Vec<Srgb>, PaletteError> {
    list.iter()
        .map(|s| Srgb::from_str(s).map_err(PaletteError::ParseColor))
        .collect()
}
