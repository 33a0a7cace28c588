//! The train/validate loop.
//!
//! Drives exactly `epochs` iterations, each a full training pass followed
//! by a full validation pass, tracking top-1 accuracy for both, advancing
//! the learning rate schedule once per epoch, and persisting the model on
//! strict validation improvement. After the final epoch the validation
//! predictions of that epoch are rendered as a classification report.

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    tensor::{
        backend::{AutodiffBackend, Backend},
        ElementConversion,
    },
};
use rand::seq::SliceRandom;
use tracing::info;

use crate::config::TrainConfig;
use crate::dataset::{ScanBatch, ScanBatcher, ScanDataset, ScanFolder, ScanItem};
use crate::model::{self, ScanClassifier};
use crate::training::checkpoint::{self, BestCheckpoint};
use crate::training::scheduler::LrScheduler;
use crate::utils::error::{Error, Result};
use crate::utils::metrics::{ClassificationReport, PhaseStats};
use crate::utils::seed::seed_all;

/// Outcome of a completed run.
#[derive(Debug)]
pub struct TrainSummary {
    /// Number of epochs driven
    pub epochs_run: usize,
    /// Best validation accuracy observed
    pub best_accuracy: f64,
    /// Training accuracy of the final epoch
    pub final_train_accuracy: f64,
    /// Validation accuracy of the final epoch
    pub final_val_accuracy: f64,
    /// Report over the final epoch's validation predictions
    pub report: ClassificationReport,
}

/// Run the full fine-tuning pipeline described by `config` on `device`.
pub fn run_training<B: AutodiffBackend>(
    config: &TrainConfig,
    device: B::Device,
) -> Result<TrainSummary> {
    if config.epochs == 0 {
        return Err(Error::Config(
            "epochs must be greater than 0".to_string(),
        ));
    }

    let mut rng = seed_all::<B>(config.seed);

    let folder = ScanFolder::open(&config.dataset_root, config.num_classes)?;

    info!("Preparing training data...");
    let train_dataset = if config.augment {
        ScanDataset::lazy(folder.train().to_vec(), config.img_size, true)
    } else {
        ScanDataset::preloaded(folder.train().to_vec(), config.img_size)?
    };

    info!("Preparing validation data...");
    let val_dataset = ScanDataset::preloaded(folder.val().to_vec(), config.img_size)?;

    let batcher = ScanBatcher::new(config.img_size);

    let mut model = model::build::<B>(
        &config.weights,
        config.num_classes,
        config.pretrained.as_deref(),
        &device,
    )?;

    let mut optimizer = AdamWConfig::new()
        .with_weight_decay(config.weight_decay)
        .init();
    let mut scheduler = LrScheduler::from_config(config);

    let smoothing = (config.label_smoothing > 0.0).then_some(config.label_smoothing);
    let criterion = CrossEntropyLossConfig::new()
        .with_smoothing(smoothing)
        .init(&device);

    let mut best = BestCheckpoint::new();
    let mut prediction_log: Vec<(usize, usize)> = Vec::new();
    let mut final_train_accuracy = 0.0;
    let mut final_val_accuracy = 0.0;

    let mut indices: Vec<usize> = (0..train_dataset.len()).collect();

    info!(
        "Starting training: {} epochs, {} train / {} val samples",
        config.epochs,
        train_dataset.len(),
        val_dataset.len()
    );

    for epoch in 1..=config.epochs {
        indices.shuffle(&mut rng);
        let mut stats = PhaseStats::new();
        let mut epoch_loss = 0.0;
        let mut num_batches = 0usize;

        for chunk in indices.chunks(config.batch_size) {
            let items = take_batch(&train_dataset, chunk)?;
            let batch: ScanBatch<B> = batcher.batch(items, &device);

            let output = model.forward(batch.images.clone());
            let loss = criterion.forward(output.clone(), batch.targets.clone());
            epoch_loss += loss.clone().into_scalar().elem::<f64>();
            num_batches += 1;

            let predictions = output.argmax(1).squeeze::<1>(1);
            let batch_correct: i64 = predictions
                .equal(batch.targets.clone())
                .int()
                .sum()
                .into_scalar()
                .elem();
            stats.record(batch_correct as usize, batch.targets.dims()[0]);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(scheduler.current_lr(), model, grads);
        }

        scheduler.step();
        let train_accuracy = stats.accuracy()?;
        let avg_loss = epoch_loss / num_batches.max(1) as f64;

        let (val_accuracy, epoch_log) =
            validate::<B>(&model, &val_dataset, &batcher, config.batch_size * 2)?;

        info!(
            "Epoch {}/{} | loss={:.4} train_acc={:.3} val_acc={:.3}",
            epoch, config.epochs, avg_loss, train_accuracy, val_accuracy
        );

        if best.observe(val_accuracy) {
            checkpoint::save_model(model.clone(), &config.export_path)?;
            info!(
                "New best model (val_acc={:.3}) exported to {}",
                val_accuracy,
                config.export_path.display()
            );
        }

        prediction_log = epoch_log;
        final_train_accuracy = train_accuracy;
        final_val_accuracy = val_accuracy;
    }

    let report = ClassificationReport::from_pairs(&prediction_log, folder.class_names())?;
    println!("\nValidation classification report:\n{report}");

    Ok(TrainSummary {
        epochs_run: config.epochs,
        best_accuracy: best.best_accuracy(),
        final_train_accuracy,
        final_val_accuracy,
        report,
    })
}

/// Run one validation pass on the inner (non-autodiff) backend.
///
/// Returns the phase accuracy and the ordered `(predicted, ground_truth)`
/// pairs collected across all batches.
fn validate<B: AutodiffBackend>(
    model: &ScanClassifier<B>,
    dataset: &ScanDataset,
    batcher: &ScanBatcher,
    batch_size: usize,
) -> Result<(f64, Vec<(usize, usize)>)> {
    let device = <B::InnerBackend as Backend>::Device::default();
    let model = model.valid();

    let mut stats = PhaseStats::new();
    let mut log = Vec::with_capacity(dataset.len());

    for start in (0..dataset.len()).step_by(batch_size) {
        let end = (start + batch_size).min(dataset.len());
        let indices: Vec<usize> = (start..end).collect();
        let items = take_batch(dataset, &indices)?;
        let batch: ScanBatch<B::InnerBackend> = batcher.batch(items, &device);

        let output = model.forward(batch.images);
        let predictions = output.argmax(1).squeeze::<1>(1);

        let predicted: Vec<i64> = predictions.into_data().iter::<i64>().collect();
        let truth: Vec<i64> = batch.targets.into_data().iter::<i64>().collect();

        let correct = predicted
            .iter()
            .zip(truth.iter())
            .filter(|(p, t)| p == t)
            .count();
        stats.record(correct, truth.len());

        log.extend(
            predicted
                .iter()
                .zip(truth.iter())
                .map(|(&p, &t)| (p as usize, t as usize)),
        );
    }

    Ok((stats.accuracy()?, log))
}

/// Materialize one batch of items, failing the run on any unloadable sample.
fn take_batch(dataset: &ScanDataset, indices: &[usize]) -> Result<Vec<ScanItem>> {
    indices
        .iter()
        .map(|&idx| {
            dataset
                .get(idx)
                .ok_or_else(|| Error::Dataset(format!("failed to load sample {idx}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::TrainingBackend;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_class_image(path: &Path, brightness: u8) {
        let img =
            image::ImageBuffer::from_fn(24, 24, |_, _| image::Rgb([brightness, brightness, 40u8]));
        img.save(path).unwrap();
    }

    fn build_dataset(root: &Path) {
        // Two visually distinct classes, two images per split each
        for split in ["train", "val"] {
            for (class, brightness) in [("dark", 20u8), ("light", 230u8)] {
                let dir = root.join(split).join(class);
                fs::create_dir_all(&dir).unwrap();
                for i in 0..2 {
                    write_class_image(&dir.join(format!("img_{i}.png")), brightness);
                }
            }
        }
    }

    fn smoke_config(root: &Path, export: &Path) -> TrainConfig {
        toml::from_str::<TrainConfig>(&format!(
            r#"
            dataset_root = "{}"
            img_size = 24
            batch_size = 2
            augment = false
            weights = "efficientnet_b0"
            num_classes = 2
            lr = 1e-3
            epochs = 1
            export_path = "{}"
            "#,
            root.display(),
            export.display()
        ))
        .unwrap()
    }

    #[test]
    fn test_run_training_smoke() {
        let temp = TempDir::new().unwrap();
        build_dataset(temp.path());
        let export = temp.path().join("out/model");
        let config = smoke_config(temp.path(), &export);

        let device = Default::default();
        let summary = run_training::<TrainingBackend>(&config, device).unwrap();

        assert_eq!(summary.epochs_run, 1);
        assert_eq!(summary.report.total_samples, 4);
        assert!(summary.best_accuracy >= 0.0 && summary.best_accuracy <= 1.0);
        if summary.best_accuracy > 0.0 {
            assert!(export.with_extension("mpk").exists());
        }
    }

    #[test]
    fn test_report_covers_final_epoch_only() {
        let temp = TempDir::new().unwrap();
        build_dataset(temp.path());
        let export = temp.path().join("out/model");
        let mut config = smoke_config(temp.path(), &export);
        config.epochs = 2;

        let device = Default::default();
        let summary = run_training::<TrainingBackend>(&config, device).unwrap();

        // Two epochs validated 4 samples each; the report must reflect a
        // single validation pass, not an aggregate.
        assert_eq!(summary.epochs_run, 2);
        assert_eq!(summary.report.total_samples, 4);
    }

    #[test]
    fn test_run_training_missing_dataset() {
        let temp = TempDir::new().unwrap();
        let export = temp.path().join("out/model");
        let config = smoke_config(&temp.path().join("nope"), &export);

        let device = Default::default();
        let result = run_training::<TrainingBackend>(&config, device);
        assert!(matches!(result, Err(Error::Dataset(_))));
    }

    #[test]
    fn test_run_training_zero_epochs_is_config_error() {
        let temp = TempDir::new().unwrap();
        build_dataset(temp.path());
        let export = temp.path().join("out/model");
        let mut config = smoke_config(temp.path(), &export);
        config.epochs = 0;

        let device = Default::default();
        let result = run_training::<TrainingBackend>(&config, device);
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!export.with_extension("mpk").exists());
    }

    #[test]
    fn test_take_batch_reports_missing_samples() {
        let dataset = ScanDataset::lazy(
            vec![(std::path::PathBuf::from("/nonexistent/scan.png"), 0)],
            8,
            false,
        );
        assert!(take_batch(&dataset, &[0]).is_err());
    }
}
