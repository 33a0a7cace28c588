//! Training CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use lungscan::backend::{self, TrainingBackend};
use lungscan::config::TrainConfig;
use lungscan::training::run_training;
use lungscan::utils::logging;

/// Fine-tune a pretrained backbone on a chest imaging dataset.
#[derive(Parser, Debug)]
#[command(name = "lungscan", version)]
struct Args {
    /// Path to the training configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,
}

fn main() -> Result<()> {
    logging::init()?;

    let args = Args::parse();

    let config = TrainConfig::from_file(&args.config)
        .context("Failed to load training configuration")?;
    config.validate()?;
    config.log_summary();

    let device = backend::default_device();
    info!("Backend: {}", backend::backend_name());

    let summary = run_training::<TrainingBackend>(&config, device)?;

    info!(
        "Training complete: {} epochs, best val_acc={:.3}",
        summary.epochs_run, summary.best_accuracy
    );

    Ok(())
}
