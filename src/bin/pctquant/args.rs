use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pctquant")]
#[command(version, about = "Convert RGB images to 8-bit pseudocolor and back", long_about = None)]
pub struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a 24-bit RGB image to an 8-bit paletted image
    Rgb2pct(Rgb2PctArgs),

    /// Expand a paletted image to RGB
    Pct2rgb(Pct2RgbArgs),

    /// Print the checksum of every band of an image
    Checksum {
        /// Input PNG
        #[arg(value_name = "SRC")]
        input: PathBuf,
    },
}

#[derive(Args)]
pub struct Rgb2PctArgs {
    /// Input RGB(A) PNG
    #[arg(value_name = "SRC")]
    pub input: PathBuf,

    /// Output paletted PNG
    #[arg(value_name = "DST")]
    pub output: PathBuf,

    /// Number of colors in the generated palette
    #[arg(
        short = 'n',
        long = "colors",
        value_name = "COLORS",
        default_value_t = 256,
        value_parser = clap::value_parser!(u32).range(1..=256)
    )]
    pub colors: u32,

    /// Use the palette of this paletted PNG instead of computing one
    #[arg(long = "pct", value_name = "PALETTE")]
    pub pct: Option<PathBuf>,

    /// Map to the nearest color without error diffusion
    #[arg(long)]
    pub no_dither: bool,

    /// Bits per channel of the median-cut histogram
    #[arg(
        long,
        value_name = "BITS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(1..=8)
    )]
    pub histogram_bits: u8,

    /// Bits per channel of the nearest-color lookup
    #[arg(
        long,
        value_name = "BITS",
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(1..=8)
    )]
    pub lookup_bits: u8,

    /// Print the checksum of the output index band
    #[arg(long)]
    pub checksum: bool,
}

#[derive(Args)]
pub struct Pct2RgbArgs {
    /// Input paletted PNG
    #[arg(value_name = "SRC")]
    pub input: PathBuf,

    /// Output RGB PNG
    #[arg(value_name = "DST")]
    pub output: PathBuf,

    /// Write an RGBA image carrying the palette alpha
    #[arg(long)]
    pub rgba: bool,
}
