use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantizeError {
    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("pixel buffer length {len} does not match dimensions {width}x{height}")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error(
        "{band} band is {width}x{height}, expected {expected_width}x{expected_height} to match red"
    )]
    BandSizeMismatch {
        band: &'static str,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("max_colors must be between 1 and 256, got {0}")]
    InvalidMaxColors(u32),

    #[error("bit depth must be between 1 and 8, got {0}")]
    InvalidBits(u8),

    #[error("color table is empty")]
    EmptyColorTable,

    #[error("color table has {0} entries, at most 256 are supported")]
    ColorTableTooLarge(usize),

    #[error("palette index {index} is out of range for a {len} entry color table")]
    IndexOutOfRange { index: u8, len: usize },

    #[error("no pixels selected by the mask")]
    NoPixels,

    #[error("window {x},{y} {width}x{height} is outside the band")]
    WindowOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("user terminated")]
    Cancelled,
}
