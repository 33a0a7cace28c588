//! Dataset handling for chest imaging data.
//!
//! This module provides:
//! - Discovery of `root/{train,val}/<class>/` directory datasets
//! - Image loading, transforms, and training augmentation
//! - Burn `Dataset`/`Batcher` implementations with ImageNet normalization

pub mod augment;
pub mod loader;
pub mod source;

pub use loader::{ScanFolder, ScanSample};
pub use source::{ScanBatch, ScanBatcher, ScanDataset, ScanItem, IMAGENET_MEAN, IMAGENET_STD};
