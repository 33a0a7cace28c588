//! Epoch-level learning rate scheduling.
//!
//! The scheduler is advanced exactly once per epoch, after the training
//! phase. Supported strategies:
//! - Constant
//! - Step decay
//! - Cosine annealing

use std::f64::consts::PI;

use crate::config::{LrScheduleKind, TrainConfig};

/// Schedule strategy with its parameters.
#[derive(Debug, Clone)]
pub enum Schedule {
    /// No scheduling
    Constant,

    /// Multiply the rate by `gamma` every `step_size` epochs
    StepDecay { step_size: usize, gamma: f64 },

    /// Cosine decay from the base rate to `eta_min` over `t_max` epochs
    CosineAnnealing { t_max: usize, eta_min: f64 },
}

/// Stateful learning rate scheduler.
pub struct LrScheduler {
    schedule: Schedule,
    base_lr: f64,
    current_lr: f64,
    current_step: usize,
}

impl LrScheduler {
    /// Create a scheduler with the given strategy and base rate.
    pub fn new(schedule: Schedule, base_lr: f64) -> Self {
        Self {
            schedule,
            base_lr,
            current_lr: base_lr,
            current_step: 0,
        }
    }

    /// Build the scheduler selected by the run configuration.
    pub fn from_config(config: &TrainConfig) -> Self {
        let schedule = match config.lr_schedule {
            LrScheduleKind::Constant => Schedule::Constant,
            LrScheduleKind::Step => Schedule::StepDecay {
                step_size: (config.epochs / 3).max(1),
                gamma: 0.1,
            },
            LrScheduleKind::Cosine => Schedule::CosineAnnealing {
                t_max: config.epochs,
                eta_min: config.min_lr,
            },
        };

        Self::new(schedule, config.lr)
    }

    /// Learning rate to use for the current epoch.
    pub fn current_lr(&self) -> f64 {
        self.current_lr
    }

    /// Advance the schedule by one epoch.
    pub fn step(&mut self) {
        self.current_step += 1;

        match &self.schedule {
            Schedule::Constant => {}

            Schedule::StepDecay { step_size, gamma } => {
                if self.current_step % step_size == 0 {
                    self.current_lr *= gamma;
                }
            }

            Schedule::CosineAnnealing { t_max, eta_min } => {
                let progress = (self.current_step as f64 / *t_max as f64).min(1.0);
                self.current_lr =
                    eta_min + (self.base_lr - eta_min) * (1.0 + (progress * PI).cos()) / 2.0;
            }
        }
    }

    /// Epochs the schedule has been advanced.
    pub fn current_step(&self) -> usize {
        self.current_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_never_moves() {
        let mut scheduler = LrScheduler::new(Schedule::Constant, 0.001);
        for _ in 0..5 {
            scheduler.step();
            assert_eq!(scheduler.current_lr(), 0.001);
        }
    }

    #[test]
    fn test_step_decay() {
        let mut scheduler = LrScheduler::new(
            Schedule::StepDecay {
                step_size: 2,
                gamma: 0.5,
            },
            0.001,
        );

        scheduler.step();
        assert!((scheduler.current_lr() - 0.001).abs() < 1e-9);

        scheduler.step();
        assert!((scheduler.current_lr() - 0.0005).abs() < 1e-9);

        scheduler.step();
        assert!((scheduler.current_lr() - 0.0005).abs() < 1e-9);

        scheduler.step();
        assert!((scheduler.current_lr() - 0.00025).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_starts_at_base_and_ends_at_floor() {
        let mut scheduler = LrScheduler::new(
            Schedule::CosineAnnealing {
                t_max: 10,
                eta_min: 0.0001,
            },
            0.001,
        );

        assert_eq!(scheduler.current_lr(), 0.001);

        let mut previous = scheduler.current_lr();
        for _ in 0..10 {
            scheduler.step();
            assert!(scheduler.current_lr() <= previous + 1e-12);
            previous = scheduler.current_lr();
        }

        assert!((scheduler.current_lr() - 0.0001).abs() < 1e-9);

        // Past t_max the rate stays on the floor
        scheduler.step();
        assert!((scheduler.current_lr() - 0.0001).abs() < 1e-9);
    }

    #[test]
    fn test_cosine_halfway_point() {
        let mut scheduler = LrScheduler::new(
            Schedule::CosineAnnealing {
                t_max: 10,
                eta_min: 0.0,
            },
            0.001,
        );

        for _ in 0..5 {
            scheduler.step();
        }
        assert!((scheduler.current_lr() - 0.0005).abs() < 1e-9);
    }

    #[test]
    fn test_from_config_defaults_to_cosine() {
        let config: TrainConfig = toml::from_str(
            r#"
            dataset_root = "data"
            img_size = 64
            batch_size = 8
            augment = false
            weights = "resnet18"
            num_classes = 2
            lr = 0.01
            epochs = 4
            export_path = "out/model"
            "#,
        )
        .unwrap();

        let mut scheduler = LrScheduler::from_config(&config);
        assert_eq!(scheduler.current_lr(), 0.01);
        for _ in 0..4 {
            scheduler.step();
        }
        assert!(scheduler.current_lr() < 1e-9);
    }
}
