use anyhow::{bail, Context, Result};
use pctquant::{ColorTable, RgbPlanes};
use png::{BitDepth, ColorType, Transformations};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Indexed image as stored in a paletted PNG.
pub struct IndexedImage {
    pub table: ColorTable,
    pub indices: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

fn open(path: &Path) -> Result<png::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(Transformations::IDENTITY);
    decoder
        .read_info()
        .with_context(|| format!("reading PNG header of {}", path.display()))
}

pub fn is_indexed(path: &Path) -> Result<bool> {
    Ok(open(path)?.info().color_type == ColorType::Indexed)
}

/// Decode a PNG to 8-bit samples, expanding palettes and low bit depths.
fn decode_expanded(path: &Path) -> Result<(Vec<u8>, png::OutputInfo)> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut decoder = png::Decoder::new(BufReader::new(file));
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .with_context(|| format!("reading PNG header of {}", path.display()))?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .with_context(|| format!("decoding {}", path.display()))?;
    buf.truncate(frame.buffer_size());

    log::info!(
        "{}: {}x{} {:?}",
        path.display(),
        frame.width,
        frame.height,
        frame.color_type
    );
    Ok((buf, frame))
}

/// Read a PNG as three 8-bit planes. Alpha is dropped, gray is replicated.
pub fn read_rgb(path: &Path) -> Result<RgbPlanes> {
    let (data, frame) = decode_expanded(path)?;
    let (width, height) = (frame.width as usize, frame.height as usize);

    let pixels: Vec<rgb::RGB<u8>> = match frame.color_type {
        ColorType::Rgb => data
            .chunks_exact(3)
            .map(|p| rgb::RGB::new(p[0], p[1], p[2]))
            .collect(),
        ColorType::Rgba => data
            .chunks_exact(4)
            .map(|p| rgb::RGB::new(p[0], p[1], p[2]))
            .collect(),
        ColorType::Grayscale => data.iter().map(|&v| rgb::RGB::new(v, v, v)).collect(),
        ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .map(|p| rgb::RGB::new(p[0], p[0], p[0]))
            .collect(),
        ColorType::Indexed => bail!("{}: palette was not expanded", path.display()),
    };

    RgbPlanes::from_pixels(&pixels, width, height)
        .with_context(|| format!("{}: unexpected pixel count", path.display()))
}

/// Every channel of a non-paletted PNG as its own plane.
pub struct Planes {
    pub planes: Vec<Vec<u8>>,
    pub width: usize,
    pub height: usize,
}

/// Read a PNG with one plane per stored channel: one for gray, two for
/// gray with alpha, three for RGB and four for RGBA.
pub fn read_bands(path: &Path) -> Result<Planes> {
    let (data, frame) = decode_expanded(path)?;
    let channels = frame.color_type.samples();
    let planes = (0..channels)
        .map(|c| data.iter().skip(c).step_by(channels).copied().collect())
        .collect();
    Ok(Planes {
        planes,
        width: frame.width as usize,
        height: frame.height as usize,
    })
}

/// Read only the palette of a paletted PNG, with tRNS alpha if present.
pub fn read_palette(path: &Path) -> Result<ColorTable> {
    let reader = open(path)?;
    palette_of(&reader, path)
}

fn palette_of(reader: &png::Reader<BufReader<File>>, path: &Path) -> Result<ColorTable> {
    let info = reader.info();
    let Some(plte) = info.palette.as_deref() else {
        bail!("{} has no color table", path.display());
    };
    let mut table = ColorTable::from_rgb_bytes(plte)
        .with_context(|| format!("{}: invalid color table", path.display()))?;
    if let Some(trns) = info.trns.as_deref() {
        table = ColorTable::from_entries(
            table
                .entries()
                .iter()
                .enumerate()
                .map(|(i, e)| pctquant::ColorEntry {
                    a: trns.get(i).copied().unwrap_or(255),
                    ..*e
                })
                .collect(),
        )?;
    }
    Ok(table)
}

/// Read a paletted PNG, unpacking sub-byte indices to one byte per pixel.
pub fn read_indexed(path: &Path) -> Result<IndexedImage> {
    let mut reader = open(path)?;
    if reader.info().color_type != ColorType::Indexed {
        bail!(
            "{} is {:?}, expected a paletted image",
            path.display(),
            reader.info().color_type
        );
    }
    let table = palette_of(&reader, path)?;

    let mut buf = vec![0u8; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .with_context(|| format!("decoding {}", path.display()))?;
    let (width, height) = (frame.width as usize, frame.height as usize);

    let bits = match frame.bit_depth {
        BitDepth::One => 1,
        BitDepth::Two => 2,
        BitDepth::Four => 4,
        BitDepth::Eight => 8,
        BitDepth::Sixteen => bail!("{}: 16-bit palette indices", path.display()),
    };
    let mut indices = Vec::with_capacity(width * height);
    for line in buf[..frame.buffer_size()].chunks_exact(frame.line_size) {
        indices.extend(unpack_line(line, bits, width));
    }

    Ok(IndexedImage {
        table,
        indices,
        width,
        height,
    })
}

fn unpack_line(line: &[u8], bits: u8, width: usize) -> impl Iterator<Item = u8> + '_ {
    let per_byte = (8 / bits) as usize;
    let mask = ((1u16 << bits) - 1) as u8;
    (0..width).map(move |x| {
        let shift = 8 - bits as usize * (x % per_byte + 1);
        (line[x / per_byte] >> shift) & mask
    })
}

/// Write an 8-bit paletted PNG. A tRNS chunk is written when any entry is translucent.
pub fn write_indexed(
    path: &Path,
    table: &ColorTable,
    indices: &[u8],
    width: usize,
    height: usize,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width as u32, height as u32);
    encoder.set_color(ColorType::Indexed);
    encoder.set_depth(BitDepth::Eight);
    encoder.set_palette(table.to_rgb_bytes());
    if let Some(alpha) = table.alpha_table() {
        encoder.set_trns(alpha);
    }
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .write_image_data(indices)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .finish()
        .with_context(|| format!("finishing {}", path.display()))?;
    Ok(())
}

/// Write 8-bit RGB or RGBA pixels.
pub fn write_rgb(
    path: &Path,
    pixels: &[rgb::RGBA<u8>],
    width: usize,
    height: usize,
    keep_alpha: bool,
) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width as u32, height as u32);
    encoder.set_depth(BitDepth::Eight);
    let data: Vec<u8> = if keep_alpha {
        encoder.set_color(ColorType::Rgba);
        pixels.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
    } else {
        encoder.set_color(ColorType::Rgb);
        pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect()
    };
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .write_image_data(&data)
        .with_context(|| format!("writing {}", path.display()))?;
    writer
        .finish()
        .with_context(|| format!("finishing {}", path.display()))?;
    Ok(())
}
