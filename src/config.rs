//! Run configuration loaded from a TOML document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{Error, Result};

fn default_seed() -> u64 {
    42
}

fn default_weight_decay() -> f32 {
    0.01
}

/// Learning rate schedule selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LrScheduleKind {
    /// Constant learning rate
    Constant,
    /// Step decay
    Step,
    /// Cosine annealing over the full run
    #[default]
    Cosine,
}

/// Configuration for one training run.
///
/// Loaded once from a TOML file and never mutated. Required keys:
/// `dataset_root`, `img_size`, `batch_size`, `augment`, `weights`,
/// `num_classes`, `lr`, `epochs`, `export_path`. Everything else has a
/// default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    /// Dataset root containing `train/` and `val/` class directories
    pub dataset_root: PathBuf,
    /// Square image size fed to the backbone
    pub img_size: usize,
    /// Training batch size (validation uses twice this)
    pub batch_size: usize,
    /// Enable random-resized-crop / horizontal-flip training augmentation
    pub augment: bool,
    /// Backbone identifier, e.g. `"resnet18"` or `"efficientnet_b0"`
    pub weights: String,
    /// Number of output classes; must match the dataset's class directories
    pub num_classes: usize,
    /// Initial learning rate
    pub lr: f64,
    /// Number of training epochs
    pub epochs: usize,
    /// Cross-entropy label smoothing factor in `[0, 1)`
    #[serde(default)]
    pub label_smoothing: f32,
    /// Path the best model record is written to (overwritten on improvement)
    pub export_path: PathBuf,

    /// Random seed for the run
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// AdamW weight decay
    #[serde(default = "default_weight_decay")]
    pub weight_decay: f32,
    /// Learning rate floor for cosine annealing
    #[serde(default)]
    pub min_lr: f64,
    /// Learning rate schedule
    #[serde(default)]
    pub lr_schedule: LrScheduleKind,
    /// Optional record file with pretrained backbone weights
    #[serde(default)]
    pub pretrained: Option<PathBuf>,
}

impl TrainConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config {}: {e}", path.display())))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config {}: {e}", path.display())))
    }

    /// Reject degenerate configurations before any training work starts.
    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::Config("epochs must be greater than 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be greater than 0".to_string()));
        }
        if self.num_classes == 0 {
            return Err(Error::Config("num_classes must be greater than 0".to_string()));
        }
        if self.img_size == 0 {
            return Err(Error::Config("img_size must be greater than 0".to_string()));
        }
        if self.lr <= 0.0 {
            return Err(Error::Config("lr must be positive".to_string()));
        }
        if self.min_lr < 0.0 || self.min_lr > self.lr {
            return Err(Error::Config("min_lr must be in [0, lr]".to_string()));
        }
        if !(0.0..1.0).contains(&self.label_smoothing) {
            return Err(Error::Config(
                "label_smoothing must be in [0, 1)".to_string(),
            ));
        }
        if !self.dataset_root.join("train").is_dir() {
            return Err(Error::Config(format!(
                "training directory does not exist: {}",
                self.dataset_root.join("train").display()
            )));
        }
        if !self.dataset_root.join("val").is_dir() {
            return Err(Error::Config(format!(
                "validation directory does not exist: {}",
                self.dataset_root.join("val").display()
            )));
        }
        Ok(())
    }

    /// Log a one-screen summary of the run parameters.
    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  dataset_root: {}", self.dataset_root.display());
        tracing::info!("  weights:      {}", self.weights);
        tracing::info!("  num_classes:  {}", self.num_classes);
        tracing::info!("  img_size:     {}", self.img_size);
        tracing::info!("  batch_size:   {}", self.batch_size);
        tracing::info!("  augment:      {}", self.augment);
        tracing::info!("  lr:           {} ({:?} schedule)", self.lr, self.lr_schedule);
        tracing::info!("  epochs:       {}", self.epochs);
        tracing::info!("  seed:         {}", self.seed);
        tracing::info!("  export_path:  {}", self.export_path.display());
    }
}
