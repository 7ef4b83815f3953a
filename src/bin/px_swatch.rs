use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use anyhow::{Context, Result, bail};
use tracing_subscriber::{fmt, EnvFilter};
use px_swatch_wasm::{extract_palette_bytes, format, swatch_png, KMeansOptions, SwatchOptions, ToleranceTable};

/// Extract a small, perceptually distinct color palette from an image.
#[derive(Parser, Debug)]
#[command(name = "px-swatch", author, version, about)]
struct Args {
    /// Input image path
    input: PathBuf,

    /// Output file (.png swatch, or GIMP palette with --gpl)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the palette as hex colors instead of writing a file
    #[arg(short, long)]
    print: bool,

    /// Write the swatch PNG to stdout
    #[arg(short = 'i', long)]
    print_image: bool,

    /// Write a GIMP palette (.gpl) instead of a PNG swatch
    #[arg(short, long)]
    gpl: bool,

    /// Skip k-means refinement and use the histogram palette as is
    #[arg(long)]
    histogram_only: bool,

    /// Shrink the image to this percentage before sampling
    #[arg(short, long)]
    resize: Option<u32>,

    /// Maximum number of palette colors
    #[arg(short = 'k', long, default_value_t = px_swatch_wasm::DEFAULT_CAPACITY)]
    colors: usize,

    /// K-means iteration cap
    #[arg(long, default_value_t = px_swatch_wasm::kmeans::DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Largest center movement (Lab units) counted as converged
    #[arg(long, default_value_t = px_swatch_wasm::kmeans::DEFAULT_CONVERGENCE_EPSILON)]
    epsilon: f64,

    /// Run the k-means assignment step on all cores
    #[arg(long)]
    parallel: bool,

    /// JSON file with tolerance bands (defaults to the built-in table)
    #[arg(short, long)]
    tolerances: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn read_tolerances(path: Option<&PathBuf>) -> Result<ToleranceTable> {
    let table = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading tolerances from {}", path.display()))?;
            ToleranceTable::from_json(&json)
                .with_context(|| format!("parsing tolerances in {}", path.display()))?
        }
        None => ToleranceTable::default(),
    };
    table.validate().context("invalid tolerance table")?;
    tracing::debug!(?table, "tolerances loaded");
    Ok(table)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if !args.print && !args.print_image && args.output.is_none() {
        bail!("missing output file, specify one with -o <PATH>");
    }

    let options = SwatchOptions {
        capacity: args.colors,
        resize_percentage: args.resize,
        histogram_only: args.histogram_only,
        kmeans: KMeansOptions {
            max_iterations: args.max_iterations,
            convergence_epsilon: args.epsilon,
            parallel: args.parallel,
            workers: None,
        },
        tolerances: read_tolerances(args.tolerances.as_ref())?,
    };

    let bytes = fs::read(&args.input)
        .with_context(|| format!("input file {} does not exist or is unreadable", args.input.display()))?;
    let colors = extract_palette_bytes(&bytes, &options)
        .with_context(|| format!("processing {}", args.input.display()))?;

    if args.print {
        println!("Palette:");
        for hex in format::hex_list(&colors) {
            println!("Color: #{hex}");
        }
        return Ok(());
    }

    if args.print_image {
        let png = swatch_png(&colors)?;
        std::io::stdout().write_all(&png)?;
        return Ok(());
    }

    let Some(out_path) = args.output else {
        bail!("missing output file, specify one with -o <PATH>");
    };
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)?;
    }

    if args.gpl {
        let name = out_path.file_stem().unwrap_or_default().to_string_lossy();
        let mut text = format::to_gpl(&colors, &name).join("\n");
        text.push('\n');
        fs::write(&out_path, text)?;
    } else {
        fs::write(&out_path, swatch_png(&colors)?)?;
    }
    eprintln!("Saved → {}", out_path.display());

    Ok(())
}
