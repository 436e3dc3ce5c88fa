extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::band::{RgbBands, validate_dimensions};
use crate::error::QuantizeError;
use crate::palette::{ColorTable, MAX_ENTRIES};
use crate::progress::{self, Progress};
use crate::remap::{ColorLookup, remap_row};

/// Dithering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DitherMode {
    /// Nearest color only.
    None,
    /// Error diffusion in sixths: 2/6 to the right, then 1/6, 3/6 and 1/6
    /// to the pixels below-left, below and below-right.
    #[default]
    FloydSteinberg,
}

/// Quantization error carried from one scanline to the next.
///
/// Holds `width + 2` cells so that pixel `x` owns cell `x + 1` and the
/// below-left/below-right spill of the edge pixels needs no bounds checks.
#[derive(Debug, Clone)]
pub struct ErrorRow {
    cells: Vec<[i32; 3]>,
}

impl ErrorRow {
    pub fn new(width: usize) -> Self {
        Self {
            cells: vec![[0; 3]; width + 2],
        }
    }

    /// Carried error for pixel `x`.
    pub fn get(&self, x: usize) -> [i32; 3] {
        self.cells[x + 1]
    }

    /// Add the carried error to `row`, clamped to 0..=255, and clear the carry.
    pub fn apply(&mut self, row: &mut [[u8; 3]]) {
        for (x, px) in row.iter_mut().enumerate() {
            let err = self.cells[x + 1];
            for c in 0..3 {
                px[c] = (px[c] as i32 + err[c]).clamp(0, 255) as u8;
            }
        }
        self.cells.fill([0; 3]);
    }

    /// Spread error `err` of pixel `x` over the three pixels below it.
    /// Returns the share that goes to the right neighbour.
    fn spread(&mut self, x: usize, err: [i32; 3]) -> [i32; 3] {
        let mut right = [0; 3];
        for c in 0..3 {
            let sixth = err[c] / 6;
            self.cells[x][c] += sixth;
            self.cells[x + 1][c] += err[c] - 5 * sixth;
            self.cells[x + 2][c] += sixth;
            right[c] = 2 * sixth;
        }
        right
    }
}

/// Map one scanline to palette indices, diffusing error right and into `carry`.
///
/// `row` must already include the error carried from the previous line.
pub fn dither_row(
    lookup: &mut ColorLookup<'_>,
    row: &[[u8; 3]],
    carry: &mut ErrorRow,
    out: &mut [u8],
) {
    let table = lookup.table();
    let mut right = [0i32; 3];

    for (x, px) in row.iter().enumerate() {
        let value = [0, 1, 2].map(|c| (px[c] as i32 + right[c]).clamp(0, 255));
        let index = lookup.index(value[0] as u8, value[1] as u8, value[2] as u8);
        out[x] = index;

        let chosen = table.entries()[index as usize];
        let err = [
            value[0] - chosen.r as i32,
            value[1] - chosen.g as i32,
            value[2] - chosen.b as i32,
        ];
        right = carry.spread(x, err);
    }
}

/// Convert `bands` to palette indices in `target`.
///
/// Rows are processed top-down and each row left-to-right. Progress is
/// reported once per row.
pub fn dither_image(
    bands: &RgbBands<'_>,
    table: &ColorTable,
    target: &mut [u8],
    mode: DitherMode,
    lookup_bits: u8,
    progress: &mut dyn Progress,
) -> Result<(), QuantizeError> {
    debug_assert!(table.len() <= MAX_ENTRIES);
    let (width, height) = (bands.width(), bands.height());
    validate_dimensions(target.len(), width, height)?;

    let mut lookup = ColorLookup::new(table, lookup_bits)?;
    let mut carry = ErrorRow::new(width);
    let mut row = vec![[0u8; 3]; width];

    log::debug!(
        "dithering {}x{} to {} colors ({:?}, {}-bit lookup)",
        width,
        height,
        table.len(),
        mode,
        lookup_bits
    );

    progress::step(progress, 0, height)?;
    for (y, out) in target.chunks_exact_mut(width).enumerate() {
        let (reds, greens, blues) = (
            bands.red().row(y),
            bands.green().row(y),
            bands.blue().row(y),
        );

        match mode {
            DitherMode::None => remap_row(&mut lookup, reds, greens, blues, out),
            DitherMode::FloydSteinberg => {
                for (x, px) in row.iter_mut().enumerate() {
                    *px = [reds[x], greens[x], blues[x]];
                }
                carry.apply(&mut row);
                dither_row(&mut lookup, &row, &mut carry, out);
            }
        }

        progress::step(progress, y + 1, height)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::RgbPlanes;
    use crate::palette::ColorEntry;
    use crate::progress::NoProgress;

    fn black_white() -> ColorTable {
        ColorTable::from_entries(vec![
            ColorEntry { r: 0, g: 0, b: 0, a: 255 },
            ColorEntry { r: 255, g: 255, b: 255, a: 255 },
        ])
        .unwrap()
    }

    fn gray_planes(values: &[u8], width: usize) -> RgbPlanes {
        let px: Vec<rgb::RGB<u8>> = values.iter().map(|&v| rgb::RGB { r: v, g: v, b: v }).collect();
        RgbPlanes::from_pixels(&px, width, values.len() / width).unwrap()
    }

    fn run(values: &[u8], width: usize, mode: DitherMode) -> Vec<u8> {
        let planes = gray_planes(values, width);
        let table = black_white();
        let mut out = vec![0u8; values.len()];
        dither_image(&planes.bands(), &table, &mut out, mode, 8, &mut NoProgress).unwrap();
        out
    }

    #[test]
    fn error_spreads_to_the_right() {
        // 100 -> black, error 100, 2 * (100 / 6) = 32 carried right.
        // 132 -> white, error -123, 2 * -20 = -40 carried right.
        // 60 -> black.
        assert_eq!(run(&[100, 100, 100], 3, DitherMode::FloydSteinberg), vec![0, 1, 0]);
        assert_eq!(run(&[100, 100, 100], 3, DitherMode::None), vec![0, 0, 0]);
    }

    #[test]
    fn error_carries_to_next_row() {
        // 115 -> black, error 115, below gets 115 - 5 * 19 = 20, so the
        // second row sees 135 which is nearer to white.
        assert_eq!(run(&[115, 115], 1, DitherMode::FloydSteinberg), vec![0, 1]);
        assert_eq!(run(&[115, 115], 1, DitherMode::None), vec![0, 0]);
    }

    #[test]
    fn error_row_spread_and_apply() {
        let mut carry = ErrorRow::new(3);
        let right = carry.spread(1, [-13, 0, 60]);
        assert_eq!(right, [-4, 0, 20]);
        assert_eq!(carry.get(0), [-2, 0, 10]);
        assert_eq!(carry.get(1), [-3, 0, 10]);
        assert_eq!(carry.get(2), [-2, 0, 10]);

        let mut row = [[1u8, 250, 250]; 3];
        carry.apply(&mut row);
        assert_eq!(row, [[0, 250, 255], [0, 250, 255], [0, 250, 255]]);
        assert_eq!(carry.get(1), [0, 0, 0]);
    }

    #[test]
    fn exact_palette_color_maps_to_itself() {
        let table = ColorTable::from_entries(vec![
            ColorEntry { r: 36, g: 48, b: 32, a: 255 },
            ColorEntry { r: 92, g: 120, b: 20, a: 255 },
            ColorEntry { r: 164, g: 164, b: 108, a: 255 },
        ])
        .unwrap();
        for (i, e) in table.entries().iter().enumerate() {
            let px = [rgb::RGB { r: e.r, g: e.g, b: e.b }; 4];
            let planes = RgbPlanes::from_pixels(&px, 2, 2).unwrap();
            let mut out = [9u8; 4];
            dither_image(
                &planes.bands(),
                &table,
                &mut out,
                DitherMode::FloydSteinberg,
                8,
                &mut NoProgress,
            )
            .unwrap();
            assert_eq!(out, [i as u8; 4]);
        }
    }

    #[test]
    fn inputs_are_validated_before_writing() {
        let planes = gray_planes(&[0, 0, 0, 0], 2);
        let mut out = [7u8; 3];
        assert!(matches!(
            dither_image(
                &planes.bands(),
                &black_white(),
                &mut out,
                DitherMode::FloydSteinberg,
                5,
                &mut NoProgress
            ),
            Err(QuantizeError::DimensionMismatch { len: 3, .. })
        ));
        assert_eq!(out, [7, 7, 7]);

        let mut out = [7u8; 4];
        assert_eq!(
            dither_image(
                &planes.bands(),
                &ColorTable::default(),
                &mut out,
                DitherMode::FloydSteinberg,
                5,
                &mut NoProgress
            ),
            Err(QuantizeError::EmptyColorTable)
        );
        assert_eq!(out, [7; 4]);
    }

    #[test]
    fn full_size_table_is_accepted() {
        let entries: Vec<ColorEntry> = (0..=255u8)
            .map(|v| ColorEntry { r: v, g: v, b: v, a: 255 })
            .collect();
        let table = ColorTable::from_entries(entries).unwrap();
        assert_eq!(table.len(), MAX_ENTRIES);

        let planes = gray_planes(&[0, 64, 128, 255], 2);
        let mut out = [0u8; 4];
        dither_image(
            &planes.bands(),
            &table,
            &mut out,
            DitherMode::FloydSteinberg,
            8,
            &mut NoProgress,
        )
        .unwrap();
        assert_eq!(out, [0, 64, 128, 255]);
    }

    #[test]
    fn cancel_stops_between_rows() {
        let planes = gray_planes(&[200; 8], 2);
        let mut out = [9u8; 8];
        let mut first_row_only = |c: f64| c < 0.5;
        assert_eq!(
            dither_image(
                &planes.bands(),
                &black_white(),
                &mut out,
                DitherMode::FloydSteinberg,
                5,
                &mut first_row_only
            ),
            Err(QuantizeError::Cancelled)
        );
        assert_eq!(&out[..2], &[1, 1]);
        assert_eq!(&out[4..], &[9, 9, 9, 9]);
    }
}
