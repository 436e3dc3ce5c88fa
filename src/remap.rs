extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::QuantizeError;
use crate::histogram::check_bits;
use crate::palette::{ColorTable, nearest_in};

/// Depths up to this many bits get a precomputed dense cube.
const MAX_CUBE_BITS: u8 = 6;

#[derive(Debug, Clone)]
enum Cells {
    /// `levels^3` indices, red fastest.
    Cube(Vec<u8>),
    /// Filled on first use.
    Memo(BTreeMap<u32, u8>),
}

/// Nearest-color lookup over a color table at reduced bit depth.
///
/// Every 8-bit sample is reduced to `bits` per channel. The entry chosen
/// for a cell is the nearest one (see [`ColorTable::nearest`]) to the
/// cell's representative color `c * 255 / (levels - 1)`. At 8 bits this is
/// the exact nearest color.
#[derive(Debug, Clone)]
pub struct ColorLookup<'t> {
    table: &'t ColorTable,
    bits: u8,
    cells: Cells,
}

impl<'t> ColorLookup<'t> {
    pub fn new(table: &'t ColorTable, bits: u8) -> Result<Self, QuantizeError> {
        check_bits(bits)?;
        if table.is_empty() {
            return Err(QuantizeError::EmptyColorTable);
        }

        let cells = if bits <= MAX_CUBE_BITS {
            Cells::Cube(build_cube(table, bits))
        } else {
            Cells::Memo(BTreeMap::new())
        };

        Ok(Self { table, bits, cells })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    pub fn table(&self) -> &'t ColorTable {
        self.table
    }

    /// Palette index for an 8-bit color.
    pub fn index(&mut self, r: u8, g: u8, b: u8) -> u8 {
        let shift = 8 - self.bits;
        let (cr, cg, cb) = (r >> shift, g >> shift, b >> shift);
        match &mut self.cells {
            Cells::Cube(cube) => {
                let levels = 1usize << self.bits;
                cube[cr as usize + (cg as usize + cb as usize * levels) * levels]
            }
            Cells::Memo(memo) => {
                let key = (cr as u32) | (cg as u32) << 8 | (cb as u32) << 16;
                let (table, bits) = (self.table, self.bits);
                *memo
                    .entry(key)
                    .or_insert_with(|| nearest_to_cell(table, bits, cr, cg, cb))
            }
        }
    }
}

fn representative(cell: u8, bits: u8) -> i32 {
    let levels = 1i32 << bits;
    cell as i32 * 255 / (levels - 1)
}

fn nearest_to_cell(table: &ColorTable, bits: u8, cr: u8, cg: u8, cb: u8) -> u8 {
    nearest_in(
        table.entries(),
        representative(cr, bits),
        representative(cg, bits),
        representative(cb, bits),
    )
}

fn build_cube(table: &ColorTable, bits: u8) -> Vec<u8> {
    let levels = 1usize << bits;
    let mut cube = vec![0u8; levels * levels * levels];
    let mut i = 0;
    for cb in 0..levels {
        for cg in 0..levels {
            for cr in 0..levels {
                cube[i] = nearest_to_cell(table, bits, cr as u8, cg as u8, cb as u8);
                i += 1;
            }
        }
    }
    log::debug!(
        "built {}-bit lookup cube ({} cells) for {} colors",
        bits,
        cube.len(),
        table.len()
    );
    cube
}

/// Map each pixel to its lookup index without error diffusion.
pub fn remap_row(
    lookup: &mut ColorLookup<'_>,
    reds: &[u8],
    greens: &[u8],
    blues: &[u8],
    out: &mut [u8],
) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = lookup.index(reds[i], greens[i], blues[i]);
    }
}
