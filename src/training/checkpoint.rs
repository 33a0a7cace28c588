//! Best-model checkpointing.
//!
//! One artifact path, one policy: the model record is persisted only when
//! the validation accuracy strictly improves on the best seen this run,
//! overwriting the previous record.

use std::fs;
use std::path::Path;

use burn::module::Module;
use burn::record::CompactRecorder;
use burn::tensor::backend::Backend;
use tracing::info;

use crate::model::ScanClassifier;
use crate::utils::error::{Error, Result};

/// Strict-improvement gate over validation accuracy.
///
/// `best_accuracy` starts at 0 and only ever increases; ties do not count
/// as improvements.
#[derive(Debug, Clone, Copy, Default)]
pub struct BestCheckpoint {
    best_accuracy: f64,
}

impl BestCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an epoch's validation accuracy. Returns `true` (and raises
    /// the best) only on strict improvement.
    pub fn observe(&mut self, val_accuracy: f64) -> bool {
        if val_accuracy > self.best_accuracy {
            self.best_accuracy = val_accuracy;
            true
        } else {
            false
        }
    }

    pub fn best_accuracy(&self) -> f64 {
        self.best_accuracy
    }
}

/// Persist the full model parameter record to `path`, overwriting any
/// existing record. The parent directory is created when missing.
pub fn save_model<B: Backend>(model: ScanClassifier<B>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let recorder = CompactRecorder::new();
    model.save_file(path, &recorder).map_err(|e| {
        Error::Checkpoint(format!("failed to write {}: {e:?}", path.display()))
    })?;

    info!("Checkpoint saved to {}", path.display());
    Ok(())
}
