//! # lungscan
//!
//! A fine-tuning pipeline for medical image classification built on the
//! Burn framework. Covers the common chest-imaging workloads: pneumonia
//! and tuberculosis chest X-rays, and LC25000 lung histology slides.
//!
//! A run is driven by a single TOML configuration document describing the
//! dataset location, backbone, and hyperparameters. The pipeline loads
//! `root/{train,val}/<class>/` directory datasets, fine-tunes a pretrained
//! backbone with AdamW and cosine learning rate annealing, keeps the best
//! validation checkpoint on disk, and prints a per-class classification
//! report at the end of the run.
//!
//! ## Modules
//!
//! - `config`: run configuration loading and validation
//! - `dataset`: directory discovery, image transforms, batching
//! - `model`: backbone construction and pretrained weight loading
//! - `training`: the train/validate loop, scheduling, checkpointing
//! - `utils`: errors, logging, metrics, seeding
//! - `backend`: Burn backend and device selection

pub mod backend;
pub mod config;
pub mod dataset;
pub mod model;
pub mod training;
pub mod utils;

pub use backend::{DefaultBackend, TrainingBackend};
pub use config::{LrScheduleKind, TrainConfig};
pub use dataset::{ScanBatch, ScanBatcher, ScanDataset, ScanFolder, ScanItem};
pub use model::{Backbone, ScanClassifier};
pub use training::{run_training, BestCheckpoint, TrainSummary};
pub use utils::error::{Error, Result};
pub use utils::metrics::{ClassificationReport, ConfusionMatrix, PhaseStats};

/// Version of the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
