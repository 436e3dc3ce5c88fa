extern crate alloc;
use alloc::vec;
use alloc::vec::Vec;

use crate::histogram::{ColorHistogram, HistEntry};
use crate::palette::{ColorEntry, ColorTable};

/// Axis-aligned box of histogram cells for median cut subdivision.
#[derive(Debug, Clone)]
struct ColorBox {
    min: [u8; 3],
    max: [u8; 3],
    total: u64,
    entries: Vec<HistEntry>,
}

impl ColorBox {
    fn new(entries: Vec<HistEntry>) -> Self {
        let total = entries.iter().map(|e| e.count).sum();
        let mut b = Self {
            min: [0; 3],
            max: [0; 3],
            total,
            entries,
        };
        b.shrink();
        b
    }

    fn extent(&self, axis: usize) -> u8 {
        self.max[axis] - self.min[axis]
    }

    fn splittable(&self) -> bool {
        (0..3).any(|axis| self.max[axis] > self.min[axis])
    }

    /// Longest axis. Red wins ties over green, green over blue.
    fn longest_axis(&self) -> usize {
        let (r, g, b) = (self.extent(0), self.extent(1), self.extent(2));
        if r >= g && r >= b {
            0
        } else if g >= b {
            1
        } else {
            2
        }
    }

    /// Contract the bounds to the occupied cells.
    fn shrink(&mut self) {
        let mut min = [u8::MAX; 3];
        let mut max = [0u8; 3];
        for e in &self.entries {
            for axis in 0..3 {
                min[axis] = min[axis].min(e.cell[axis]);
                max[axis] = max[axis].max(e.cell[axis]);
            }
        }
        if !self.entries.is_empty() {
            self.min = min;
            self.max = max;
        }
    }

    /// Representative color: the box midpoint scaled back to 8 bits.
    fn color(&self, shift: u8) -> ColorEntry {
        let mid = |axis: usize| {
            (((self.min[axis] as u32 + self.max[axis] as u32) << shift) / 2) as u8
        };
        ColorEntry {
            r: mid(0),
            g: mid(1),
            b: mid(2),
            a: 255,
        }
    }

    /// Split at the median of the longest axis.
    ///
    /// `self` keeps the upper half; the lower half is returned.
    fn split(&mut self) -> ColorBox {
        let axis = self.longest_axis();
        let first = self.min[axis] as usize;
        let last = self.max[axis] as usize;

        let mut along = vec![0u64; last - first + 1];
        for e in &self.entries {
            along[e.cell[axis] as usize - first] += e.count;
        }

        // First cell where the running sum reaches half the box.
        let half = self.total / 2;
        let mut sum = 0u64;
        let mut median = first;
        for (offset, &count) in along.iter().enumerate() {
            median = first + offset;
            sum += count;
            if sum >= half {
                break;
            }
        }
        if median == first {
            median += 1;
        }

        let (lower, upper): (Vec<HistEntry>, Vec<HistEntry>) = self
            .entries
            .drain(..)
            .partition(|e| (e.cell[axis] as usize) < median);

        log::trace!(
            "split {:?}..{:?} ({} px) on axis {} at {}",
            self.min,
            self.max,
            self.total,
            axis,
            median
        );

        *self = ColorBox::new(upper);
        ColorBox::new(lower)
    }
}

/// Heckbert median cut over `histogram`, producing exactly `max_colors` entries.
///
/// The box list starts with a single box around every occupied cell. Each
/// round splits the most populated box that still spans more than one cell;
/// the lower half is put at the front of the list. Table entry `k` is the
/// midpoint of box `k`. When the histogram runs out of splittable boxes the
/// remaining entries are opaque black.
pub fn median_cut(histogram: ColorHistogram, max_colors: usize) -> ColorTable {
    let shift = histogram.shift();
    let mut boxes: Vec<ColorBox> = Vec::with_capacity(max_colors);
    if !histogram.is_empty() {
        boxes.push(ColorBox::new(histogram.into_entries()));
    }

    while boxes.len() < max_colors {
        let Some(idx) = largest_box(&boxes) else {
            break; // no more splittable boxes
        };
        let lower = boxes[idx].split();
        boxes.insert(0, lower);
    }

    if boxes.len() < max_colors {
        log::warn!(
            "only {} distinct colors available, padding palette to {} entries",
            boxes.len(),
            max_colors
        );
    }

    let mut entries: Vec<ColorEntry> = boxes.iter().map(|b| b.color(shift)).collect();
    entries.resize(
        max_colors,
        ColorEntry {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        },
    );

    ColorTable::from_entries_unchecked(entries)
}

/// Splittable box with the largest pixel count; the first one in list order wins ties.
fn largest_box(boxes: &[ColorBox]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, b) in boxes.iter().enumerate() {
        if b.splittable() && best.map_or(true, |j| b.total > boxes[j].total) {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::band::RgbPlanes;
    use crate::histogram::build_histogram;
    use crate::progress::NoProgress;

    fn hist(pixels: &[(u8, u8, u8)], bits: u8) -> ColorHistogram {
        let px: Vec<rgb::RGB<u8>> = pixels
            .iter()
            .map(|&(r, g, b)| rgb::RGB { r, g, b })
            .collect();
        let planes = RgbPlanes::from_pixels(&px, px.len(), 1).unwrap();
        build_histogram(&planes.bands(), None, bits, &mut NoProgress).unwrap()
    }

    fn rgb_of(table: &ColorTable) -> Vec<(u8, u8, u8)> {
        table.entries().iter().map(|e| (e.r, e.g, e.b)).collect()
    }

    #[test]
    fn single_color_pads_with_black() {
        let table = median_cut(hist(&[(200, 100, 50); 10], 8), 4);
        assert_eq!(
            rgb_of(&table),
            vec![(200, 100, 50), (0, 0, 0), (0, 0, 0), (0, 0, 0)]
        );
        assert!(table.entries().iter().all(|e| e.a == 255));
    }

    #[test]
    fn one_color_requested_is_box_midpoint() {
        let table = median_cut(hist(&[(0, 0, 0), (255, 255, 255)], 8), 1);
        assert_eq!(rgb_of(&table), vec![(127, 127, 127)]);
    }

    #[test]
    fn lower_half_goes_first() {
        // Dark pixels dominate, so the median lands on the first cell and is
        // bumped one cell up. The dark half is inserted at index 0.
        let table = median_cut(hist(&[(0, 0, 0), (0, 0, 0), (0, 0, 0), (255, 0, 0)], 8), 2);
        assert_eq!(rgb_of(&table), vec![(0, 0, 0), (255, 0, 0)]);
    }

    #[test]
    fn splits_most_populated_box_first() {
        // Red ramp: 4 pixels at r=0, 1 at r=100, 1 at r=200.
        // First split: half = 3, running sum reaches 4 at r=0 -> bumped to r=1,
        // giving [0] (4 px) and [100, 200] (2 px). The [0] box cannot be
        // split, so the second split divides [100, 200].
        let px = [
            (0, 0, 0),
            (0, 0, 0),
            (0, 0, 0),
            (0, 0, 0),
            (100, 0, 0),
            (200, 0, 0),
        ];
        let table = median_cut(hist(&px, 8), 3);
        assert_eq!(rgb_of(&table), vec![(100, 0, 0), (0, 0, 0), (200, 0, 0)]);
    }

    #[test]
    fn midpoint_is_scaled_by_histogram_depth() {
        // At 5 bits, 36 and 39 share cell 4; midpoint (4 + 4) << 3 / 2 = 32.
        let table = median_cut(hist(&[(36, 48, 32), (39, 55, 39)], 5), 1);
        assert_eq!(rgb_of(&table), vec![(32, 48, 32)]);
    }

    #[test]
    fn longest_axis_prefers_red_on_ties() {
        let b = ColorBox::new(vec![
            HistEntry {
                cell: [0, 0, 0],
                count: 1,
            },
            HistEntry {
                cell: [4, 4, 4],
                count: 1,
            },
        ]);
        assert_eq!(b.longest_axis(), 0);
        let b = ColorBox::new(vec![
            HistEntry {
                cell: [0, 0, 0],
                count: 1,
            },
            HistEntry {
                cell: [1, 4, 4],
                count: 1,
            },
        ]);
        assert_eq!(b.longest_axis(), 1);
    }

    #[test]
    fn produces_requested_count_and_distinct_colors() {
        let px: Vec<(u8, u8, u8)> = (0..=255u8).map(|v| (v, 255 - v, v / 2)).collect();
        let table = median_cut(hist(&px, 5), 16);
        assert_eq!(table.len(), 16);
        let mut colors = rgb_of(&table);
        colors.sort_unstable();
        colors.dedup();
        assert_eq!(colors.len(), 16);
    }

    #[test]
    fn empty_histogram_gives_black_table() {
        let px = [(1u8, 2u8, 3u8)];
        let px: Vec<rgb::RGB<u8>> = px.iter().map(|&(r, g, b)| rgb::RGB { r, g, b }).collect();
        let planes = RgbPlanes::from_pixels(&px, 1, 1).unwrap();
        let mask_data = [0u8];
        let mask = crate::band::Band::new(&mask_data, 1, 1).unwrap();
        let h = build_histogram(&planes.bands(), Some(&mask), 5, &mut NoProgress).unwrap();
        let table = median_cut(h, 2);
        assert_eq!(rgb_of(&table), vec![(0, 0, 0), (0, 0, 0)]);
    }
}
