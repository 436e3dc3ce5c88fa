//! GDAL-compatible 16-bit band checksum.
//!
//! Each sample is reduced modulo the next prime of a fixed cycle and summed
//! into 16 bits. The prime cycle continues across row boundaries.

use crate::band::Band;
use crate::error::QuantizeError;

const PRIMES: [u32; 11] = [7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43];

/// Checksum of the whole band.
pub fn checksum(band: &Band<'_>) -> u32 {
    checksum_samples((0..band.height()).flat_map(|y| band.row(y).iter().copied()))
}

/// Checksum of the `width` x `height` window at (`x`, `y`).
pub fn checksum_window(
    band: &Band<'_>,
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) -> Result<u32, QuantizeError> {
    let fits = |off: usize, len: usize, size: usize| {
        off.checked_add(len).is_some_and(|end| end <= size)
    };
    if !fits(x, width, band.width()) || !fits(y, height, band.height()) {
        return Err(QuantizeError::WindowOutOfBounds {
            x,
            y,
            width,
            height,
        });
    }
    Ok(checksum_samples(
        (y..y + height).flat_map(|row| band.row(row)[x..x + width].iter().copied()),
    ))
}

fn checksum_samples(samples: impl Iterator<Item = u8>) -> u32 {
    let mut sum = 0u32;
    for (value, prime) in samples.zip(PRIMES.iter().cycle()) {
        sum = (sum + value as u32 % prime) & 0xffff;
    }
    sum
}
