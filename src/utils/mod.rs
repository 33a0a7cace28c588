//! Shared utilities: error types, logging, metrics, and seeding.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod seed;

pub use error::{Error, Result};
pub use metrics::{ClassMetrics, ClassificationReport, ConfusionMatrix, PhaseStats};
pub use seed::seed_all;
