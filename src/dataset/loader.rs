//! Directory-tree dataset discovery.
//!
//! Expects the layout produced by the dataset preparation step:
//!
//! ```text
//! root/
//! ├── train/
//! │   ├── NORMAL/
//! │   │   ├── img_001.jpeg
//! │   │   └── ...
//! │   └── PNEUMONIA/
//! │       └── ...
//! └── val/
//!     ├── NORMAL/
//!     └── PNEUMONIA/
//! ```
//!
//! Class names are the subdirectory names; labels are their indices in
//! lexical order.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::utils::error::{Error, Result};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// A labeled image path.
pub type ScanSample = (PathBuf, usize);

/// Discovered train/val splits of a scan dataset.
#[derive(Debug, Clone)]
pub struct ScanFolder {
    root: PathBuf,
    class_names: Vec<String>,
    train: Vec<ScanSample>,
    val: Vec<ScanSample>,
}

impl ScanFolder {
    /// Scan `root/{train,val}` and build both splits.
    ///
    /// Both splits must carry the same class directories, the class count
    /// must match `expected_classes`, and neither split may be empty.
    pub fn open(root: &Path, expected_classes: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Dataset(format!(
                "dataset root does not exist: {}",
                root.display()
            )));
        }

        let class_names = list_classes(&root.join("train"))?;
        let val_classes = list_classes(&root.join("val"))?;

        if class_names != val_classes {
            return Err(Error::Dataset(format!(
                "train and val class directories differ: {class_names:?} vs {val_classes:?}"
            )));
        }
        if class_names.len() != expected_classes {
            return Err(Error::Dataset(format!(
                "config expects {expected_classes} classes but found {} under {}",
                class_names.len(),
                root.join("train").display()
            )));
        }

        let train = collect_split(&root.join("train"), &class_names)?;
        let val = collect_split(&root.join("val"), &class_names)?;

        if train.is_empty() {
            return Err(Error::Dataset(format!(
                "training split is empty: {}",
                root.join("train").display()
            )));
        }
        if val.is_empty() {
            return Err(Error::Dataset(format!(
                "validation split is empty: {}",
                root.join("val").display()
            )));
        }

        info!(
            "Loaded dataset from {}: {} classes, {} train / {} val samples",
            root.display(),
            class_names.len(),
            train.len(),
            val.len()
        );

        Ok(Self {
            root: root.to_path_buf(),
            class_names,
            train,
            val,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Class names in label order.
    pub fn class_names(&self) -> &[String] {
        &self.class_names
    }

    pub fn train(&self) -> &[ScanSample] {
        &self.train
    }

    pub fn val(&self) -> &[ScanSample] {
        &self.val
    }
}

/// List class subdirectories of a split directory, lexically sorted.
fn list_classes(split_dir: &Path) -> Result<Vec<String>> {
    if !split_dir.is_dir() {
        return Err(Error::Dataset(format!(
            "split directory does not exist: {}",
            split_dir.display()
        )));
    }

    let mut classes = Vec::new();
    for entry in std::fs::read_dir(split_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                classes.push(name.to_string());
            }
        }
    }
    classes.sort();

    if classes.is_empty() {
        return Err(Error::Dataset(format!(
            "no class directories under {}",
            split_dir.display()
        )));
    }

    Ok(classes)
}

/// Collect all image files of one split, labeled by class index.
fn collect_split(split_dir: &Path, class_names: &[String]) -> Result<Vec<ScanSample>> {
    let mut samples = Vec::new();

    for (label, class_name) in class_names.iter().enumerate() {
        let class_dir = split_dir.join(class_name);
        let mut count = 0usize;

        for entry in WalkDir::new(&class_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path().to_path_buf();
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                    samples.push((path, label));
                    count += 1;
                }
            }
        }

        debug!(
            "Class '{}' (label {}): {} samples in {}",
            class_name,
            label,
            count,
            split_dir.display()
        );
    }

    Ok(samples)
}
