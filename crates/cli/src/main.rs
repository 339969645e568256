//! hsi - salmonid habitat suitability from depth and velocity rasters

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hsi_algorithms::curves::{CurveLibrary, PreferenceCurve};
use hsi_algorithms::suitability::{
    SuitabilityEngine, SuitabilityParams, VelocityFill, DEFAULT_OUTPUT_NODATA,
};
use hsi_core::io::{read_geotiff, Compression, GeoTiffOptions};
use hsi_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "hsi")]
#[command(author, version, about = "Salmonid habitat suitability index", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute a habitat suitability raster from depth and velocity rasters
    Compute {
        /// Water depth raster
        depth: PathBuf,
        /// Water velocity raster
        velocity: PathBuf,
        /// Species / life stage curve set (see `hsi curves`)
        #[arg(short, long)]
        curve: String,
        /// Output GeoTIFF (".tif" is added when there is no extension)
        #[arg(short, long)]
        output: PathBuf,
        /// Score the zero-filled depth grid as velocity, like early releases did
        #[arg(long)]
        legacy_velocity: bool,
        /// No-data value for cells without water
        #[arg(long, default_value_t = DEFAULT_OUTPUT_NODATA, allow_negative_numbers = true)]
        output_nodata: f64,
        /// Output compression: none, lzw or deflate
        #[arg(long, default_value = "deflate")]
        compression: Compression,
    },
    /// List the built-in curve sets (with --verbose, their control points)
    Curves,
    /// Score a single depth/velocity pair against a curve set
    Evaluate {
        /// Species / life stage curve set
        #[arg(long)]
        curve: String,
        /// Water depth
        #[arg(long, allow_negative_numbers = true)]
        depth: f64,
        /// Water velocity
        #[arg(long, allow_negative_numbers = true)]
        velocity: f64,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
        /// Band to read (1-indexed)
        #[arg(short, long, default_value = "1")]
        band: usize,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path, band: usize) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster = read_geotiff::<f64, _>(path, Some(band));
    pb.finish_and_clear();
    let raster = raster.with_context(|| format!("Failed to read {}", path.display()))?;
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn done(path: &Path, elapsed: std::time::Duration) {
    println!("Suitability saved to: {}", path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn print_curve(name: &str, curve: &PreferenceCurve) {
    let points: Vec<String> = curve
        .points()
        .map(|(x, y)| format!("({}, {})", x, y))
        .collect();
    println!("    {}: {}", name, points.join(" "));
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Compute {
            depth,
            velocity,
            curve,
            output,
            legacy_velocity,
            output_nodata,
            compression,
        } => {
            let params = SuitabilityParams {
                output_nodata,
                velocity_fill: if legacy_velocity {
                    VelocityFill::LegacyDepthCopy
                } else {
                    VelocityFill::OwnNoData
                },
            };
            let engine = SuitabilityEngine::new(CurveLibrary::standard(), params)
                .with_options(GeoTiffOptions { compression });

            let start = Instant::now();
            let pb = spinner("Computing habitat suitability...");
            let result = engine.compute(&depth, &velocity, &curve, &output);
            pb.finish_and_clear();
            let summary = result?;

            println!("{}", summary);
            println!("  Curve set: {}", summary.curve_set);
            println!(
                "  Cells: {} x {} ({} masked)",
                summary.cols, summary.rows, summary.masked_cells
            );
            if let (Some(min), Some(max), Some(mean)) = (summary.min, summary.max, summary.mean) {
                println!("  Score: min {:.4}, max {:.4}, mean {:.4}", min, max, mean);
            }
            done(&summary.output, start.elapsed());
        }

        Commands::Curves => {
            let library = CurveLibrary::standard();
            for (i, set) in library.iter().enumerate() {
                println!("{:>2}. {}", i + 1, set.label());
                if cli.verbose {
                    print_curve("depth", set.depth());
                    print_curve("velocity", set.velocity());
                }
            }
            if let Some(citation) = library.iter().find_map(|s| s.citation()) {
                println!("\nSource: {}", citation);
            }
        }

        Commands::Evaluate {
            curve,
            depth,
            velocity,
        } => {
            let library = CurveLibrary::standard();
            let set = library.lookup(&curve)?;
            let depth_score = set.depth().evaluate(depth);
            let velocity_score = set.velocity().evaluate(velocity);

            println!("{}", set.label());
            println!("  Depth {} -> {:.4}", depth, depth_score);
            println!("  Velocity {} -> {:.4}", velocity, velocity_score);
            println!("  Suitability: {:.4}", depth_score * velocity_score);
        }

        Commands::Info { input, band } => {
            let raster = read_raster(&input, band)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
            );
        }
    }

    Ok(())
}
