extern crate alloc;
use alloc::vec::Vec;

use crate::error::QuantizeError;

/// A read-only 8-bit raster band, stored row-major.
#[derive(Debug, Clone, Copy)]
pub struct Band<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
}

impl<'a> Band<'a> {
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self, QuantizeError> {
        validate_dimensions(data.len(), width, height)?;
        Ok(Self {
            data,
            width,
            height,
        })
    }

    pub(crate) fn from_validated(data: &'a [u8], width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Scanline `y`.
    pub fn row(&self, y: usize) -> &'a [u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }
}

/// Red, green and blue bands of identical size.
#[derive(Debug, Clone, Copy)]
pub struct RgbBands<'a> {
    red: Band<'a>,
    green: Band<'a>,
    blue: Band<'a>,
}

impl<'a> RgbBands<'a> {
    /// Group three bands. Green and blue must match the red band's size.
    pub fn new(red: Band<'a>, green: Band<'a>, blue: Band<'a>) -> Result<Self, QuantizeError> {
        for (name, band) in [("green", &green), ("blue", &blue)] {
            if band.width != red.width || band.height != red.height {
                return Err(QuantizeError::BandSizeMismatch {
                    band: name,
                    width: band.width,
                    height: band.height,
                    expected_width: red.width,
                    expected_height: red.height,
                });
            }
        }
        Ok(Self { red, green, blue })
    }

    /// Wrap three raw planes that share `width` and `height`.
    pub fn from_planes(
        red: &'a [u8],
        green: &'a [u8],
        blue: &'a [u8],
        width: usize,
        height: usize,
    ) -> Result<Self, QuantizeError> {
        Self::new(
            Band::new(red, width, height)?,
            Band::new(green, width, height)?,
            Band::new(blue, width, height)?,
        )
    }

    pub fn red(&self) -> Band<'a> {
        self.red
    }

    pub fn green(&self) -> Band<'a> {
        self.green
    }

    pub fn blue(&self) -> Band<'a> {
        self.blue
    }

    pub fn width(&self) -> usize {
        self.red.width
    }

    pub fn height(&self) -> usize {
        self.red.height
    }

    pub fn pixel_count(&self) -> usize {
        self.red.width * self.red.height
    }
}

/// Owned planar copy of an interleaved RGB image.
#[derive(Debug, Clone)]
pub struct RgbPlanes {
    red: Vec<u8>,
    green: Vec<u8>,
    blue: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbPlanes {
    /// Deinterleave `pixels` into separate red, green and blue planes.
    pub fn from_pixels(
        pixels: &[rgb::RGB<u8>],
        width: usize,
        height: usize,
    ) -> Result<Self, QuantizeError> {
        validate_dimensions(pixels.len(), width, height)?;
        Ok(Self {
            red: pixels.iter().map(|p| p.r).collect(),
            green: pixels.iter().map(|p| p.g).collect(),
            blue: pixels.iter().map(|p| p.b).collect(),
            width,
            height,
        })
    }

    /// Same as [`RgbPlanes::from_pixels`], alpha is dropped.
    pub fn from_pixels_rgba(
        pixels: &[rgb::RGBA<u8>],
        width: usize,
        height: usize,
    ) -> Result<Self, QuantizeError> {
        validate_dimensions(pixels.len(), width, height)?;
        Ok(Self {
            red: pixels.iter().map(|p| p.r).collect(),
            green: pixels.iter().map(|p| p.g).collect(),
            blue: pixels.iter().map(|p| p.b).collect(),
            width,
            height,
        })
    }

    pub fn bands(&self) -> RgbBands<'_> {
        let (w, h) = (self.width, self.height);
        RgbBands {
            red: Band::from_validated(&self.red, w, h),
            green: Band::from_validated(&self.green, w, h),
            blue: Band::from_validated(&self.blue, w, h),
        }
    }
}

pub(crate) fn validate_dimensions(
    len: usize,
    width: usize,
    height: usize,
) -> Result<(), QuantizeError> {
    if width == 0 || height == 0 {
        return Err(QuantizeError::ZeroDimension);
    }
    if width.checked_mul(height) != Some(len) {
        return Err(QuantizeError::DimensionMismatch { len, width, height });
    }
    Ok(())
}
