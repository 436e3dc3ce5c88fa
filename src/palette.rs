extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;

/// A color table entry. Quantizer output is always opaque (`a == 255`).
pub type ColorEntry = rgb::RGBA<u8>;

/// Largest color table an 8-bit index band can address.
pub const MAX_ENTRIES: usize = 256;

/// Ordered pseudocolor table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    entries: Vec<ColorEntry>,
}

impl ColorTable {
    /// Build a table from explicit entries.
    pub fn from_entries(entries: Vec<ColorEntry>) -> Result<Self, QuantizeError> {
        if entries.len() > MAX_ENTRIES {
            return Err(QuantizeError::ColorTableTooLarge(entries.len()));
        }
        Ok(Self { entries })
    }

    /// Build an opaque table from packed `[r, g, b, r, g, b, ...]` bytes,
    /// the layout of a PNG `PLTE` chunk. A trailing partial triplet is ignored.
    pub fn from_rgb_bytes(bytes: &[u8]) -> Result<Self, QuantizeError> {
        let entries = bytes
            .chunks_exact(3)
            .map(|c| ColorEntry {
                r: c[0],
                g: c[1],
                b: c[2],
                a: 255,
            })
            .collect();
        Self::from_entries(entries)
    }

    pub(crate) fn from_entries_unchecked(entries: Vec<ColorEntry>) -> Self {
        debug_assert!(entries.len() <= MAX_ENTRIES);
        Self { entries }
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }

    pub fn get(&self, index: u8) -> Option<ColorEntry> {
        self.entries.get(index as usize).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Packed RGB bytes for a PNG `PLTE` chunk.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|e| [e.r, e.g, e.b]).collect()
    }

    /// Alpha values for a PNG `tRNS` chunk, truncated after the last
    /// non-opaque entry. `None` if every entry is opaque.
    pub fn alpha_table(&self) -> Option<Vec<u8>> {
        let last_non_opaque = self.entries.iter().rposition(|e| e.a != 255)?;
        Some(self.entries[..=last_non_opaque].iter().map(|e| e.a).collect())
    }

    /// Index of the entry with the smallest `|dr| + |dg| + |db|`.
    /// The lowest index wins ties. Returns 0 for an empty table.
    pub fn nearest(&self, r: u8, g: u8, b: u8) -> u8 {
        nearest_in(&self.entries, r as i32, g as i32, b as i32)
    }

    /// Map palette indices back to colors.
    pub fn expand(&self, indices: &[u8]) -> Result<Vec<ColorEntry>, QuantizeError> {
        indices
            .iter()
            .map(|&index| {
                self.get(index).ok_or(QuantizeError::IndexOutOfRange {
                    index,
                    len: self.entries.len(),
                })
            })
            .collect()
    }
}

pub(crate) fn nearest_in(entries: &[ColorEntry], r: i32, g: i32, b: i32) -> u8 {
    let mut best_dist = i32::MAX;
    let mut best_idx = 0usize;
    for (i, e) in entries.iter().enumerate() {
        let d = (r - e.r as i32).abs() + (g - e.g as i32).abs() + (b - e.b as i32).abs();
        if d < best_dist {
            best_dist = d;
            best_idx = i;
        }
    }
    best_idx as u8
}
