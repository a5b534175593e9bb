//! flowgate - flow cytometry gating CLI
//!
//! Command-line interface for running gates and gating pipelines on
//! tab-separated event tables.

use clap::{Parser, Subcommand};
use flowgate::data::{Channel, ChannelSelector, PointSet};
use flowgate::density::BinSpec;
use flowgate::error::Result;
use flowgate::gate::{Density2dGate, Gate};
use flowgate::pipeline::{Pipeline, PipelineConfig};
use log::info;
use std::path::PathBuf;

/// Gate flow cytometry events
#[derive(Parser)]
#[command(name = "flowgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline from a YAML configuration file
    Run {
        /// Path to pipeline configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        /// Path to event table TSV
        #[arg(short, long)]
        data: PathBuf,

        /// Output path for gated events TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Write per-step summaries and contours as JSON
        #[arg(long)]
        contours: Option<PathBuf>,

        /// Write the mask over the input events as TSV
        #[arg(long)]
        mask: Option<PathBuf>,
    },

    /// Apply a single density gate
    Density2d {
        /// Path to event table TSV
        #[arg(short, long)]
        data: PathBuf,

        /// X channel (name or zero-based index)
        #[arg(short = 'x', long)]
        x: String,

        /// Y channel (name or zero-based index)
        #[arg(short = 'y', long)]
        y: String,

        /// Fraction of events to keep (default: 0.65)
        #[arg(long, default_value = "0.65")]
        fraction: f64,

        /// Smoothing kernel width in bins (default: 10)
        #[arg(long, default_value = "10")]
        sigma: f64,

        /// Bins per axis (default: instrument edges, else 10)
        #[arg(long)]
        bins: Option<usize>,

        /// Output path for gated events TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Write boundary contours as JSON
        #[arg(long)]
        contours: Option<PathBuf>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            data,
            output,
            contours,
            mask,
        } => cmd_run(&config, &data, &output, contours.as_ref(), mask.as_ref()),

        Commands::Density2d {
            data,
            x,
            y,
            fraction,
            sigma,
            bins,
            output,
            contours,
        } => cmd_density2d(
            &data,
            &x,
            &y,
            fraction,
            sigma,
            bins,
            &output,
            contours.as_ref(),
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run a pipeline from configuration
fn cmd_run(
    config_path: &PathBuf,
    data_path: &PathBuf,
    output_path: &PathBuf,
    contours_path: Option<&PathBuf>,
    mask_path: Option<&PathBuf>,
) -> Result<()> {
    info!("Loading pipeline configuration from {:?}", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = PipelineConfig::from_yaml(&config_str)?;

    let points = load_points(data_path)?;

    info!("Running pipeline '{}' ({} steps)", config.name, config.steps.len());
    let pipeline = Pipeline::from_config(&config);
    let result = pipeline.run(&points)?;

    info!("Writing gated events to {:?}", output_path);
    result.gated.to_tsv(output_path)?;

    if let Some(path) = contours_path {
        info!("Writing step summaries to {:?}", path);
        std::fs::write(path, result.steps_to_json()?)?;
    }
    if let Some(path) = mask_path {
        info!("Writing mask to {:?}", path);
        result.mask.to_tsv(path)?;
    }

    println!("{}", result);
    Ok(())
}

/// Apply one density gate
#[allow(clippy::too_many_arguments)]
fn cmd_density2d(
    data_path: &PathBuf,
    x: &str,
    y: &str,
    fraction: f64,
    sigma: f64,
    bins: Option<usize>,
    output_path: &PathBuf,
    contours_path: Option<&PathBuf>,
) -> Result<()> {
    let points = load_points(data_path)?;

    let gate = Density2dGate::new(ChannelSelector::pair(Channel::parse(x), Channel::parse(y)))
        .with_fraction(fraction)
        .with_sigma(sigma)
        .with_bins(bins.map(BinSpec::Count).unwrap_or_default());

    info!(
        "Density gate on {}: fraction {}, sigma {}",
        gate.channels, fraction, sigma
    );
    let output = gate.apply(&points)?;

    info!("Writing gated events to {:?}", output_path);
    output.gated.to_tsv(output_path)?;

    if let Some(path) = contours_path {
        info!("Writing {} contour(s) to {:?}", output.contours.len(), path);
        std::fs::write(path, serde_json::to_string_pretty(&output.contours)?)?;
    }

    println!("{}", output);
    Ok(())
}

fn load_points(path: &PathBuf) -> Result<PointSet> {
    info!("Loading events from {:?}", path);
    let points = PointSet::from_tsv(path)?;
    info!(
        "Loaded {} events x {} channels",
        points.n_rows(),
        points.n_channels()
    );
    Ok(points)
}
