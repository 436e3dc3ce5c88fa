mod args;
mod io;

use anyhow::{Context, Result};
use clap::Parser;
use pctquant::{
    checksum, compute_median_cut_pct, dither_rgb_to_pct, Band, DitherMode, NoProgress, Progress,
    QuantizeConfig,
};
use std::io::Write;

use args::{Cli, Command, Pct2RgbArgs, Rgb2PctArgs};

/// Text progress bar printing `0...10...20...` up to `100 - done.`
struct TermProgress {
    last_tick: i32,
}

impl TermProgress {
    const TICKS: i32 = 40;

    fn new() -> Self {
        Self { last_tick: -1 }
    }
}

impl Progress for TermProgress {
    fn report(&mut self, complete: f64) -> bool {
        let tick = ((complete * Self::TICKS as f64) as i32).clamp(0, Self::TICKS);
        let mut err = std::io::stderr().lock();
        while tick > self.last_tick {
            self.last_tick += 1;
            let _ = if self.last_tick % 4 == 0 {
                write!(err, "{}", self.last_tick / 4 * 10)
            } else {
                write!(err, ".")
            };
        }
        if tick == Self::TICKS && self.last_tick == Self::TICKS {
            let _ = writeln!(err, " - done.");
            self.last_tick = Self::TICKS + 1;
        }
        let _ = err.flush();
        true
    }
}

fn progress_for(quiet: bool) -> Box<dyn Progress> {
    if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(TermProgress::new())
    }
}

fn rgb2pct(args: &Rgb2PctArgs, quiet: bool) -> Result<()> {
    let planes = io::read_rgb(&args.input)?;
    let bands = planes.bands();

    let config = QuantizeConfig::new()
        .max_colors(args.colors)
        .histogram_bits(args.histogram_bits)
        .lookup_bits(args.lookup_bits)
        .dither(if args.no_dither {
            DitherMode::None
        } else {
            DitherMode::FloydSteinberg
        });

    let table = match &args.pct {
        Some(path) => {
            let table = io::read_palette(path)?;
            log::info!("using {} colors from {}", table.len(), path.display());
            table
        }
        None => {
            log::info!("generating {} color palette", config.max_colors);
            compute_median_cut_pct(&bands, &config, &mut *progress_for(quiet))
                .context("computing color table")?
        }
    };

    let mut indices = vec![0u8; bands.pixel_count()];
    dither_rgb_to_pct(
        &bands,
        &table,
        &mut indices,
        &config,
        &mut *progress_for(quiet),
    )
    .context("mapping image to color table")?;

    io::write_indexed(&args.output, &table, &indices, bands.width(), bands.height())?;
    log::info!("wrote {}", args.output.display());

    if args.checksum {
        let band = Band::new(&indices, bands.width(), bands.height())?;
        println!("Band 1 Checksum={}", checksum(&band));
    }
    Ok(())
}

fn pct2rgb(args: &Pct2RgbArgs) -> Result<()> {
    let image = io::read_indexed(&args.input)?;
    let pixels = image
        .table
        .expand(&image.indices)
        .with_context(|| format!("expanding {}", args.input.display()))?;
    io::write_rgb(
        &args.output,
        &pixels,
        image.width,
        image.height,
        args.rgba,
    )?;
    log::info!("wrote {}", args.output.display());
    Ok(())
}

fn print_checksums(input: &std::path::Path) -> Result<()> {
    if io::is_indexed(input)? {
        let image = io::read_indexed(input)?;
        let band = Band::new(&image.indices, image.width, image.height)?;
        println!("Band 1 Checksum={}", checksum(&band));
    } else {
        let image = io::read_bands(input)?;
        for (n, plane) in image.planes.iter().enumerate() {
            let band = Band::new(plane, image.width, image.height)?;
            println!("Band {} Checksum={}", n + 1, checksum(&band));
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Rgb2pct(args) => rgb2pct(args, cli.quiet),
        Command::Pct2rgb(args) => pct2rgb(args),
        Command::Checksum { input } => print_checksums(input),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
