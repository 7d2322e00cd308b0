//! Operator tool for vessel patch datasets.
//!
//! - `check`: validates the dataset layout and the region of interest of
//!   every mask
//! - `sample`: runs one provider call and reports the batch summary

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vessel_core::{load_toml_config, setup_cli_logging, ProviderConfig};
use vessel_data::{DataProvider, ImageStore, RegionOfInterest};

#[derive(Parser)]
#[command(name = "vessel-patches")]
#[command(about = "Dataset checks and patch sampling for retinal vessel data", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the dataset layout and every mask's region of interest
    Check {
        /// Dataset root containing image/, label/ and mask/
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Patch size the regions of interest are shrunk by
        #[arg(short, long, default_value = "27")]
        patch_size: u32,

        /// Output file for the per-file report (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Draw one batch of patches and print its summary
    Sample {
        /// Provider configuration (TOML)
        #[arg(short, long, conflicts_with = "data_dir")]
        config: Option<PathBuf>,

        /// Dataset root, used with default parameters when no config is given
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Requested number of patches
        #[arg(short = 'n', long, default_value = "1000")]
        count: usize,

        /// Enable augmentation
        #[arg(long)]
        train: bool,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Output file for the summary (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_cli_logging(cli.verbose)?;

    match cli.command {
        Commands::Check {
            data_dir,
            patch_size,
            output,
        } => check_dataset(&data_dir, patch_size, output.as_deref())?,

        Commands::Sample {
            config,
            data_dir,
            count,
            train,
            seed,
            output,
        } => {
            let config = build_config(config.as_deref(), data_dir, train, seed)?;
            sample_batch(config, count, output.as_deref())?
        }
    }

    Ok(())
}

/// Computes the region of interest of every mask in the dataset
fn check_dataset(data_dir: &Path, patch_size: u32, output: Option<&Path>) -> Result<()> {
    let store = ImageStore::open(data_dir).context("Failed to open dataset")?;
    info!("Checking {} samples in {:?}", store.len(), data_dir);

    let pb = ProgressBar::new(store.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut report = Vec::with_capacity(store.len());
    let mut invalid = 0usize;

    for name in store.file_names() {
        pb.set_message(name.clone());
        let roi = store
            .read_mask(name)
            .and_then(|mask| RegionOfInterest::from_mask(&mask, name, patch_size));

        match roi {
            Ok(roi) => report.push(serde_json::json!({
                "file": name,
                "center": [roi.center.0, roi.center.1],
                "radius": roi.radius,
            })),
            Err(e) => {
                invalid += 1;
                warn!("{}: {}", name, e);
                report.push(serde_json::json!({
                    "file": name,
                    "error": e.to_string(),
                }));
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    println!("\nDataset check: {}", data_dir.display());
    println!("{}", "=".repeat(50));
    println!("{:<30} {:>10}", "Samples", store.len());
    println!("{:<30} {:>10}", "Invalid regions of interest", invalid);
    println!("{}", "=".repeat(50));

    if let Some(output_path) = output {
        fs::write(output_path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        info!("Report saved to {:?}", output_path);
    }

    if invalid > 0 {
        anyhow::bail!("{} of {} samples have no usable region of interest", invalid, store.len());
    }
    Ok(())
}

/// Provider configuration from a TOML file or from a bare data directory,
/// with command-line overrides applied on top
fn build_config(
    config: Option<&Path>,
    data_dir: Option<PathBuf>,
    train: bool,
    seed: Option<u64>,
) -> Result<ProviderConfig> {
    let mut config = match (config, data_dir) {
        (Some(path), _) => load_toml_config::<ProviderConfig>(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        (None, Some(dir)) => ProviderConfig::new(dir),
        (None, None) => anyhow::bail!("Either --config or --data-dir is required"),
    };

    if train {
        config.is_training = true;
    }
    if let Some(seed) = seed {
        config.seed = Some(seed);
    }
    Ok(config)
}

fn sample_batch(config: ProviderConfig, count: usize, output: Option<&Path>) -> Result<()> {
    info!(
        "Sampling {} patches from {:?} (training: {})",
        count, config.data_dir, config.is_training
    );

    let mut provider = DataProvider::new(config).context("Failed to create data provider")?;
    let batch = provider.sample(count).context("Failed to assemble batch")?;
    let summary = batch.summary();
    let json = serde_json::to_string_pretty(&summary)?;

    match output {
        Some(output_path) => {
            fs::write(output_path, &json)
                .with_context(|| format!("Failed to write {:?}", output_path))?;
            info!("Summary saved to {:?}", output_path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
