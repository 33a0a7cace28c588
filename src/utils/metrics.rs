//! Evaluation metrics for the training pipeline.
//!
//! Provides:
//! - Running accuracy bookkeeping for a train/validation phase
//! - Confusion matrix over predicted vs. ground-truth labels
//! - Per-class precision, recall, F1 and support
//! - A formatted classification report for end-of-run output

use serde::{Deserialize, Serialize};

use crate::utils::error::{Error, Result};

/// Running `correct / total` counters for one phase of one epoch.
///
/// Counters are reset by constructing a fresh value at the start of each
/// phase. A phase that saw zero examples has no defined accuracy; asking
/// for it is an error rather than `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseStats {
    total: usize,
    correct: usize,
}

impl PhaseStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one batch: the number of correct top-1 predictions and the
    /// batch length.
    pub fn record(&mut self, correct: usize, batch_len: usize) {
        self.correct += correct;
        self.total += batch_len;
    }

    /// Total examples seen in this phase.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Correct predictions seen in this phase.
    pub fn correct(&self) -> usize {
        self.correct
    }

    /// Top-1 accuracy for the phase.
    pub fn accuracy(&self) -> Result<f64> {
        if self.total == 0 {
            return Err(Error::Training(
                "accuracy is undefined for a phase with zero examples".to_string(),
            ));
        }
        Ok(self.correct as f64 / self.total as f64)
    }
}

/// Confusion matrix for multi-class classification.
///
/// Rows index the actual class, columns the predicted class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    num_classes: usize,
    /// Flat row-major counts, `[actual * num_classes + predicted]`.
    counts: Vec<usize>,
}

impl ConfusionMatrix {
    /// Create an empty matrix for `num_classes` classes.
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    /// Build a matrix from parallel prediction/ground-truth slices.
    pub fn from_pairs(pairs: &[(usize, usize)], num_classes: usize) -> Self {
        let mut matrix = Self::new(num_classes);
        for &(predicted, actual) in pairs {
            matrix.record(predicted, actual);
        }
        matrix
    }

    /// Record a single prediction. Out-of-range labels are ignored.
    pub fn record(&mut self, predicted: usize, actual: usize) {
        if predicted < self.num_classes && actual < self.num_classes {
            self.counts[actual * self.num_classes + predicted] += 1;
        }
    }

    /// Count at (actual, predicted).
    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        self.counts[actual * self.num_classes + predicted]
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Total recorded samples.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Diagonal sum: predictions that matched ground truth.
    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|i| self.get(i, i)).sum()
    }
}

/// Per-class metrics derived from a confusion matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class_idx: usize,
    pub class_name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of ground-truth samples of this class.
    pub support: usize,
}

impl ClassMetrics {
    fn from_confusion_matrix(matrix: &ConfusionMatrix, class_idx: usize, class_name: &str) -> Self {
        let num_classes = matrix.num_classes();

        let true_positives = matrix.get(class_idx, class_idx) as f64;

        // Predicted as this class but actually another
        let false_positives: f64 = (0..num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| matrix.get(i, class_idx) as f64)
            .sum();

        // Actually this class but predicted as another
        let false_negatives: f64 = (0..num_classes)
            .filter(|&i| i != class_idx)
            .map(|i| matrix.get(class_idx, i) as f64)
            .sum();

        let support = (true_positives + false_negatives) as usize;

        let precision = if true_positives + false_positives > 0.0 {
            true_positives / (true_positives + false_positives)
        } else {
            0.0
        };

        let recall = if true_positives + false_negatives > 0.0 {
            true_positives / (true_positives + false_negatives)
        } else {
            0.0
        };

        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            class_idx,
            class_name: class_name.to_string(),
            precision,
            recall,
            f1,
            support,
        }
    }
}

/// End-of-run classification report.
///
/// Built from the `(predicted, ground_truth)` pairs of a single
/// validation pass; the `Display` impl renders the familiar
/// per-class precision/recall/F1/support table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub per_class: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub total_samples: usize,
}

impl ClassificationReport {
    /// Build a report from `(predicted, ground_truth)` pairs.
    ///
    /// Errors when `pairs` is empty: a report over zero predictions is a
    /// degenerate-run condition, not an empty table.
    pub fn from_pairs(pairs: &[(usize, usize)], class_names: &[String]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(Error::Training(
                "classification report requires at least one prediction".to_string(),
            ));
        }

        let num_classes = class_names.len();
        let matrix = ConfusionMatrix::from_pairs(pairs, num_classes);

        let per_class = class_names
            .iter()
            .enumerate()
            .map(|(idx, name)| ClassMetrics::from_confusion_matrix(&matrix, idx, name))
            .collect();

        let total_samples = matrix.total();
        let accuracy = matrix.correct() as f64 / total_samples as f64;

        Ok(Self {
            per_class,
            accuracy,
            total_samples,
        })
    }

    /// Macro-averaged precision over all classes.
    pub fn macro_precision(&self) -> f64 {
        self.macro_average(|m| m.precision)
    }

    /// Macro-averaged recall over all classes.
    pub fn macro_recall(&self) -> f64 {
        self.macro_average(|m| m.recall)
    }

    /// Macro-averaged F1 over all classes.
    pub fn macro_f1(&self) -> f64 {
        self.macro_average(|m| m.f1)
    }

    fn macro_average(&self, field: impl Fn(&ClassMetrics) -> f64) -> f64 {
        if self.per_class.is_empty() {
            return 0.0;
        }
        self.per_class.iter().map(field).sum::<f64>() / self.per_class.len() as f64
    }
}

impl std::fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name_width = self
            .per_class
            .iter()
            .map(|m| m.class_name.len())
            .chain(std::iter::once("macro avg".len()))
            .max()
            .unwrap_or(10);

        writeln!(
            f,
            "{:>name_width$} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;

        for metrics in &self.per_class {
            writeln!(
                f,
                "{:>name_width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                metrics.class_name, metrics.precision, metrics.recall, metrics.f1, metrics.support
            )?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>name_width$} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.total_samples
        )?;
        writeln!(
            f,
            "{:>name_width$} {:>10.4} {:>10.4} {:>10.4} {:>10}",
            "macro avg",
            self.macro_precision(),
            self.macro_recall(),
            self.macro_f1(),
            self.total_samples
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("class_{i}")).collect()
    }

    #[test]
    fn test_phase_stats_accumulation() {
        let mut stats = PhaseStats::new();
        stats.record(3, 4);
        stats.record(2, 4);
        assert_eq!(stats.total(), 8);
        assert_eq!(stats.correct(), 5);
        assert!((stats.accuracy().unwrap() - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_phase_stats_zero_total_is_error() {
        let stats = PhaseStats::new();
        assert!(stats.accuracy().is_err());
    }

    #[test]
    fn test_confusion_matrix_record() {
        let mut matrix = ConfusionMatrix::new(3);
        matrix.record(0, 0);
        matrix.record(1, 0);
        matrix.record(1, 1);

        assert_eq!(matrix.get(0, 0), 1);
        assert_eq!(matrix.get(0, 1), 1);
        assert_eq!(matrix.get(1, 1), 1);
        assert_eq!(matrix.total(), 3);
        assert_eq!(matrix.correct(), 2);
    }

    #[test]
    fn test_confusion_matrix_ignores_out_of_range() {
        let mut matrix = ConfusionMatrix::new(2);
        matrix.record(5, 0);
        matrix.record(0, 5);
        assert_eq!(matrix.total(), 0);
    }

    #[test]
    fn test_report_four_example_scenario() {
        // predictions [0, 1, 1, 0] against ground truth [0, 1, 0, 0]
        let pairs = vec![(0, 0), (1, 1), (1, 0), (0, 0)];
        let report = ClassificationReport::from_pairs(&pairs, &names(2)).unwrap();

        assert_eq!(report.total_samples, 4);
        assert!((report.accuracy - 0.75).abs() < 1e-12);

        let class0 = &report.per_class[0];
        assert_eq!(class0.support, 3);
        assert!((class0.precision - 1.0).abs() < 1e-12);
        assert!((class0.recall - 2.0 / 3.0).abs() < 1e-12);

        let class1 = &report.per_class[1];
        assert_eq!(class1.support, 1);
        assert!((class1.precision - 0.5).abs() < 1e-12);
        assert!((class1.recall - 1.0).abs() < 1e-12);
        assert!((class1.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_empty_pairs_is_error() {
        let report = ClassificationReport::from_pairs(&[], &names(2));
        assert!(report.is_err());
    }

    #[test]
    fn test_report_perfect_predictions() {
        let pairs = vec![(0, 0), (1, 1), (2, 2)];
        let report = ClassificationReport::from_pairs(&pairs, &names(3)).unwrap();
        assert!((report.accuracy - 1.0).abs() < 1e-12);
        assert!((report.macro_f1() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_display_contains_classes() {
        let pairs = vec![(0, 0), (1, 0)];
        let report = ClassificationReport::from_pairs(
            &pairs,
            &["NORMAL".to_string(), "PNEUMONIA".to_string()],
        )
        .unwrap();

        let rendered = report.to_string();
        assert!(rendered.contains("NORMAL"));
        assert!(rendered.contains("PNEUMONIA"));
        assert!(rendered.contains("precision"));
        assert!(rendered.contains("support"));
    }
}
