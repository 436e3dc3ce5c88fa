//! Median-cut palette generation and error-diffusion dithering for 8-bit RGB rasters.
//!
//! [`compute_median_cut_pct`] builds an N-entry pseudocolor table from three
//! bands, and [`dither_rgb_to_pct`] maps the bands onto such a table, writing
//! one palette index per pixel. [`rgb_to_pct`] runs both.
//!
//! With the default [`QuantizeConfig`] the results match GDAL's
//! `ComputeMedianCutPCT` and `DitherRGB2PCT` bit for bit.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod band;
pub mod checksum;
pub mod dither;
pub mod error;
pub mod histogram;
pub mod median_cut;
pub mod palette;
pub mod progress;
pub mod remap;

pub use band::{Band, RgbBands, RgbPlanes};
pub use checksum::{checksum, checksum_window};
pub use dither::DitherMode;
pub use error::QuantizeError;
pub use palette::{ColorEntry, ColorTable};
pub use progress::{NoProgress, Progress};

use alloc::vec;
use alloc::vec::Vec;

/// Configuration for palette computation and dithering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizeConfig {
    /// Number of color table entries to produce (1..=256).
    pub max_colors: u32,
    /// Bits per channel of the median-cut histogram (1..=8).
    pub histogram_bits: u8,
    /// Bits per channel of the nearest-color lookup (1..=8).
    ///
    /// Below 8 bits a pixel is matched through its reduced cell, so a pixel
    /// equal to a table entry can map to another entry that is nearer to the
    /// cell's representative color. 8 gives exact nearest-color mapping.
    pub lookup_bits: u8,
    /// Dithering mode.
    pub dither: DitherMode,
}

impl Default for QuantizeConfig {
    fn default() -> Self {
        Self {
            max_colors: 256,
            histogram_bits: 5,
            lookup_bits: 5,
            dither: DitherMode::FloydSteinberg,
        }
    }
}

impl QuantizeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_colors(mut self, n: u32) -> Self {
        self.max_colors = n;
        self
    }

    pub fn histogram_bits(mut self, bits: u8) -> Self {
        self.histogram_bits = bits;
        self
    }

    /// Set the nearest-color lookup depth. Only 8 is exact.
    pub fn lookup_bits(mut self, bits: u8) -> Self {
        self.lookup_bits = bits;
        self
    }

    /// Set both the histogram and lookup depth to 8 bits.
    pub fn exact(self) -> Self {
        self.histogram_bits(8).lookup_bits(8)
    }

    pub fn dither(mut self, mode: DitherMode) -> Self {
        self.dither = mode;
        self
    }
}

/// Quantization result.
#[derive(Debug, Clone)]
pub struct QuantizeResult {
    color_table: ColorTable,
    indices: Vec<u8>,
    width: usize,
    height: usize,
}

impl QuantizeResult {
    pub fn color_table(&self) -> &ColorTable {
        &self.color_table
    }

    /// Palette index for each pixel, row-major.
    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Index band view of the result.
    pub fn index_band(&self) -> Band<'_> {
        Band::from_validated(&self.indices, self.width, self.height)
    }

    pub fn into_parts(self) -> (ColorTable, Vec<u8>) {
        (self.color_table, self.indices)
    }
}

/// Compute an optimal pseudocolor table for an RGB image.
///
/// The table always has exactly `config.max_colors` opaque entries. Images
/// with fewer distinct colors (at `config.histogram_bits`) get black padding.
pub fn compute_median_cut_pct(
    bands: &RgbBands<'_>,
    config: &QuantizeConfig,
    progress: &mut dyn Progress,
) -> Result<ColorTable, QuantizeError> {
    compute_median_cut_pct_masked(bands, None, config, progress)
}

/// Like [`compute_median_cut_pct`], counting only pixels whose `mask` value is non-zero.
pub fn compute_median_cut_pct_masked(
    bands: &RgbBands<'_>,
    mask: Option<&Band<'_>>,
    config: &QuantizeConfig,
    progress: &mut dyn Progress,
) -> Result<ColorTable, QuantizeError> {
    validate_config(config)?;

    let hist = histogram::build_histogram(bands, mask, config.histogram_bits, progress)?;
    if hist.total() == 0 {
        return Err(QuantizeError::NoPixels);
    }

    Ok(median_cut::median_cut(hist, config.max_colors as usize))
}

/// Convert an RGB image to palette indices in `target`, one byte per pixel.
///
/// `target` must hold exactly `width * height` bytes. The input bands are
/// not modified.
///
/// A pixel that equals a table entry maps to that entry only with
/// `config.lookup_bits == 8`. At lower depths the lookup resolves the
/// pixel's reduced cell, which may be nearer to another entry.
pub fn dither_rgb_to_pct(
    bands: &RgbBands<'_>,
    table: &ColorTable,
    target: &mut [u8],
    config: &QuantizeConfig,
    progress: &mut dyn Progress,
) -> Result<(), QuantizeError> {
    dither::dither_image(
        bands,
        table,
        target,
        config.dither,
        config.lookup_bits,
        progress,
    )
}

/// Compute a color table for `bands` and map the image onto it.
pub fn rgb_to_pct(
    bands: &RgbBands<'_>,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    let color_table = compute_median_cut_pct(bands, config, &mut NoProgress)?;

    let mut indices = vec![0u8; bands.pixel_count()];
    dither_rgb_to_pct(bands, &color_table, &mut indices, config, &mut NoProgress)?;

    Ok(QuantizeResult {
        color_table,
        indices,
        width: bands.width(),
        height: bands.height(),
    })
}

/// Quantize interleaved RGB pixels.
pub fn quantize(
    pixels: &[rgb::RGB<u8>],
    width: usize,
    height: usize,
    config: &QuantizeConfig,
) -> Result<QuantizeResult, QuantizeError> {
    let planes = RgbPlanes::from_pixels(pixels, width, height)?;
    rgb_to_pct(&planes.bands(), config)
}

fn validate_config(config: &QuantizeConfig) -> Result<(), QuantizeError> {
    if config.max_colors < 1 || config.max_colors > palette::MAX_ENTRIES as u32 {
        return Err(QuantizeError::InvalidMaxColors(config.max_colors));
    }
    histogram::check_bits(config.histogram_bits)?;
    histogram::check_bits(config.lookup_bits)?;
    Ok(())
}
