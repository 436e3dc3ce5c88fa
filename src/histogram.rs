extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::band::{Band, RgbBands};
use crate::error::QuantizeError;
use crate::progress::{self, Progress};

/// One occupied histogram cell: a color at reduced bit depth and its pixel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistEntry {
    /// Cell coordinates `[r, g, b]`, each in `0..(1 << bits)`.
    pub cell: [u8; 3],
    /// Number of pixels falling in this cell.
    pub count: u64,
}

/// Sparse RGB histogram at `bits` per channel.
#[derive(Debug, Clone)]
pub struct ColorHistogram {
    bits: u8,
    entries: Vec<HistEntry>,
    total: u64,
}

impl ColorHistogram {
    /// Bits per channel.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Right shift that maps an 8-bit sample onto a cell coordinate.
    pub fn shift(&self) -> u8 {
        8 - self.bits
    }

    /// Occupied cells in ascending `(r, g, b)` key order.
    pub fn entries(&self) -> &[HistEntry] {
        &self.entries
    }

    /// Number of pixels counted.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<HistEntry> {
        self.entries
    }
}

pub(crate) fn check_bits(bits: u8) -> Result<(), QuantizeError> {
    if (1..=8).contains(&bits) {
        Ok(())
    } else {
        Err(QuantizeError::InvalidBits(bits))
    }
}

#[inline]
fn cell_key(cell: [u8; 3]) -> u32 {
    (cell[0] as u32) << 16 | (cell[1] as u32) << 8 | cell[2] as u32
}

/// Count pixel colors of `bands` at `bits` per channel.
///
/// Pixels whose `mask` value is zero are skipped. Progress is reported once
/// per scanline.
pub fn build_histogram(
    bands: &RgbBands<'_>,
    mask: Option<&Band<'_>>,
    bits: u8,
    progress: &mut dyn Progress,
) -> Result<ColorHistogram, QuantizeError> {
    check_bits(bits)?;
    if let Some(mask) = mask {
        if mask.width() != bands.width() || mask.height() != bands.height() {
            return Err(QuantizeError::BandSizeMismatch {
                band: "mask",
                width: mask.width(),
                height: mask.height(),
                expected_width: bands.width(),
                expected_height: bands.height(),
            });
        }
    }

    let shift = 8 - bits;
    let height = bands.height();
    let mut buckets: BTreeMap<u32, u64> = BTreeMap::new();
    let mut total = 0u64;

    progress::step(progress, 0, height)?;
    for y in 0..height {
        let reds = bands.red().row(y);
        let greens = bands.green().row(y);
        let blues = bands.blue().row(y);
        let mask_row = mask.map(|m| m.row(y));

        for x in 0..reds.len() {
            if mask_row.is_some_and(|m| m[x] == 0) {
                continue;
            }
            let cell = [reds[x] >> shift, greens[x] >> shift, blues[x] >> shift];
            *buckets.entry(cell_key(cell)).or_insert(0) += 1;
            total += 1;
        }

        progress::step(progress, y + 1, height)?;
    }

    let entries: Vec<HistEntry> = buckets
        .into_iter()
        .map(|(key, count)| HistEntry {
            cell: [(key >> 16) as u8, (key >> 8) as u8, key as u8],
            count,
        })
        .collect();

    log::debug!(
        "histogram: {} pixels in {} cells at {} bits",
        total,
        entries.len(),
        bits
    );

    Ok(ColorHistogram {
        bits,
        entries,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::RgbPlanes;
    use crate::progress::NoProgress;
    use alloc::vec;

    fn planes(pixels: &[(u8, u8, u8)], width: usize) -> RgbPlanes {
        let px: Vec<rgb::RGB<u8>> = pixels
            .iter()
            .map(|&(r, g, b)| rgb::RGB { r, g, b })
            .collect();
        RgbPlanes::from_pixels(&px, width, pixels.len() / width).unwrap()
    }

    #[test]
    fn single_color_one_bucket() {
        let img = planes(&[(128, 128, 128); 100], 10);
        let hist = build_histogram(&img.bands(), None, 5, &mut NoProgress).unwrap();
        assert_eq!(hist.entries().len(), 1);
        assert_eq!(hist.entries()[0].cell, [16, 16, 16]);
        assert_eq!(hist.entries()[0].count, 100);
        assert_eq!(hist.total(), 100);
    }

    #[test]
    fn nearby_colors_share_a_cell_at_low_depth() {
        // 8..=15 all land in cell 1 at 5 bits, but stay apart at 8 bits.
        let img = planes(&[(8, 8, 8), (15, 15, 15)], 2);
        let coarse = build_histogram(&img.bands(), None, 5, &mut NoProgress).unwrap();
        assert_eq!(coarse.entries().len(), 1);
        let exact = build_histogram(&img.bands(), None, 8, &mut NoProgress).unwrap();
        assert_eq!(exact.entries().len(), 2);
    }

    #[test]
    fn entries_are_key_ordered() {
        let img = planes(&[(255, 0, 0), (0, 0, 255), (0, 255, 0), (0, 0, 0)], 2);
        let hist = build_histogram(&img.bands(), None, 8, &mut NoProgress).unwrap();
        let cells: Vec<[u8; 3]> = hist.entries().iter().map(|e| e.cell).collect();
        assert_eq!(
            cells,
            vec![[0, 0, 0], [0, 0, 255], [0, 255, 0], [255, 0, 0]]
        );
    }

    #[test]
    fn mask_excludes_pixels() {
        let img = planes(&[(10, 10, 10), (200, 200, 200)], 2);
        let mask_data = [1u8, 0];
        let mask = Band::new(&mask_data, 2, 1).unwrap();
        let hist = build_histogram(&img.bands(), Some(&mask), 8, &mut NoProgress).unwrap();
        assert_eq!(hist.total(), 1);
        assert_eq!(hist.entries()[0].cell, [10, 10, 10]);
    }

    #[test]
    fn mask_size_must_match() {
        let img = planes(&[(0, 0, 0); 4], 2);
        let mask_data = [1u8; 4];
        let mask = Band::new(&mask_data, 4, 1).unwrap();
        assert!(matches!(
            build_histogram(&img.bands(), Some(&mask), 5, &mut NoProgress),
            Err(QuantizeError::BandSizeMismatch { band: "mask", .. })
        ));
    }

    #[test]
    fn rejects_bad_bit_depth() {
        let img = planes(&[(0, 0, 0)], 1);
        for bits in [0u8, 9] {
            assert_eq!(
                build_histogram(&img.bands(), None, bits, &mut NoProgress).unwrap_err(),
                QuantizeError::InvalidBits(bits)
            );
        }
    }

    #[test]
    fn reports_per_row_and_cancels() {
        let img = planes(&[(0, 0, 0); 12], 3);
        let mut seen = vec![];
        let mut record = |c: f64| {
            seen.push(c);
            true
        };
        build_histogram(&img.bands(), None, 5, &mut record).unwrap();
        assert_eq!(seen, vec![0.0, 0.25, 0.5, 0.75, 1.0]);

        let mut stop = |c: f64| c < 0.5;
        assert_eq!(
            build_histogram(&img.bands(), None, 5, &mut stop).unwrap_err(),
            QuantizeError::Cancelled
        );
    }
}
