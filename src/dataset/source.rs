//! Burn dataset and batcher for scan images.
//!
//! `ScanItem` holds one decoded image as a flattened CHW float array in
//! `[0, 1]`; `ScanBatcher` stacks items into tensors and applies ImageNet
//! mean/std normalization at batch time.

use std::path::{Path, PathBuf};

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor, TensorData};
use image::ImageReader;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use super::augment;
use super::loader::ScanSample;
use crate::utils::error::{Error, Result};

/// ImageNet channel means, matching the pretrained backbone statistics.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// A single preprocessed scan ready for batching.
#[derive(Clone, Debug)]
pub struct ScanItem {
    /// Flattened CHW image data, `3 * size * size`, in `[0, 1]`
    pub image: Vec<f32>,
    /// Integer class label
    pub label: usize,
}

impl ScanItem {
    /// Load an image from disk, apply the transform for the given mode,
    /// and convert to CHW floats.
    pub fn load(path: &Path, label: usize, img_size: usize, augment: bool) -> Result<Self> {
        let img = ImageReader::open(path)
            .map_err(|e| Error::Image(format!("{}: {e}", path.display())))?
            .decode()
            .map_err(|e| Error::Image(format!("{}: {e}", path.display())))?;

        let img = if augment {
            augment::train_transform(&img, img_size as u32, &mut rand::thread_rng())
        } else {
            augment::eval_transform(&img, img_size as u32)
        };

        let rgb = img.to_rgb8();
        let (width, height) = (img_size, img_size);
        let mut image = vec![0.0f32; 3 * height * width];

        for y in 0..height {
            for x in 0..width {
                let pixel = rgb.get_pixel(x as u32, y as u32);
                for c in 0..3 {
                    image[c * height * width + y * width + x] = pixel[c] as f32 / 255.0;
                }
            }
        }

        Ok(Self { image, label })
    }
}

/// Scan dataset implementing Burn's `Dataset` trait.
///
/// Two modes:
/// - `preloaded`: all images decoded up front, deterministic transform.
///   Used for validation and for un-augmented training.
/// - `lazy`: images decoded on every access so augmented training sees a
///   fresh random transform each epoch.
#[derive(Debug, Clone)]
pub struct ScanDataset {
    samples: Vec<ScanSample>,
    img_size: usize,
    augment: bool,
    cached: Option<Vec<ScanItem>>,
}

impl ScanDataset {
    /// Build a lazily-loading dataset.
    pub fn lazy(samples: Vec<ScanSample>, img_size: usize, augment: bool) -> Self {
        Self {
            samples,
            img_size,
            augment,
            cached: None,
        }
    }

    /// Build a dataset with every image decoded up front.
    ///
    /// Any unreadable or corrupt image fails the whole load.
    pub fn preloaded(samples: Vec<ScanSample>, img_size: usize) -> Result<Self> {
        let bar = ProgressBar::new(samples.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        bar.set_message("loading images");

        let mut cached = Vec::with_capacity(samples.len());
        for (path, label) in &samples {
            cached.push(ScanItem::load(path, *label, img_size, false)?);
            bar.inc(1);
        }
        bar.finish_and_clear();

        Ok(Self {
            samples,
            img_size,
            augment: false,
            cached: Some(cached),
        })
    }

    /// Number of classes covered by the samples.
    pub fn num_classes(&self) -> usize {
        self.samples
            .iter()
            .map(|(_, label)| *label)
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }
}

impl Dataset<ScanItem> for ScanDataset {
    fn get(&self, index: usize) -> Option<ScanItem> {
        if let Some(ref cached) = self.cached {
            return cached.get(index).cloned();
        }

        let (path, label) = self.samples.get(index)?;
        match ScanItem::load(path, *label, self.img_size, self.augment) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Failed to load {}: {e}", path.display());
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

/// A batch of scans for one training or validation step.
#[derive(Clone, Debug)]
pub struct ScanBatch<B: Backend> {
    /// Images with shape `[batch_size, 3, size, size]`, normalized
    pub images: Tensor<B, 4>,
    /// Labels with shape `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

/// Batcher stacking `ScanItem`s into normalized tensors.
#[derive(Clone, Debug)]
pub struct ScanBatcher {
    img_size: usize,
}

impl ScanBatcher {
    pub fn new(img_size: usize) -> Self {
        Self { img_size }
    }
}

impl<B: Backend> Batcher<B, ScanItem, ScanBatch<B>> for ScanBatcher {
    fn batch(&self, items: Vec<ScanItem>, device: &B::Device) -> ScanBatch<B> {
        let batch_size = items.len();
        let (channels, height, width) = (3, self.img_size, self.img_size);

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_data(
            TensorData::new(images_data, [batch_size, channels, height, width]),
            device,
        );

        let mean = Tensor::<B, 4>::from_data(
            TensorData::new(IMAGENET_MEAN.to_vec(), [1, 3, 1, 1]),
            device,
        );
        let std = Tensor::<B, 4>::from_data(
            TensorData::new(IMAGENET_STD.to_vec(), [1, 3, 1, 1]),
            device,
        );
        let images = (images - mean) / std;

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets =
            Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

        ScanBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use tempfile::TempDir;

    fn write_gray_image(path: &Path, value: u8) {
        let img = image::ImageBuffer::from_fn(16, 16, |_, _| image::Rgb([value, value, value]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_item_load_shape_and_range() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.png");
        write_gray_image(&path, 255);

        let item = ScanItem::load(&path, 1, 8, false).unwrap();
        assert_eq!(item.label, 1);
        assert_eq!(item.image.len(), 3 * 8 * 8);
        assert!(item.image.iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!((item.image[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_item_load_missing_file() {
        let result = ScanItem::load(Path::new("/nonexistent/scan.png"), 0, 8, false);
        assert!(matches!(result, Err(Error::Image(_))));
    }

    #[test]
    fn test_preloaded_dataset_get() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.png");
        write_gray_image(&path, 10);

        let dataset = ScanDataset::preloaded(vec![(path, 0)], 8).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(dataset.get(0).is_some());
        assert!(dataset.get(1).is_none());
    }

    #[test]
    fn test_preloaded_dataset_fails_on_corrupt_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        assert!(ScanDataset::preloaded(vec![(path, 0)], 8).is_err());
    }

    #[test]
    fn test_batcher_shapes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("scan.png");
        write_gray_image(&path, 128);

        let items = vec![
            ScanItem::load(&path, 0, 8, false).unwrap(),
            ScanItem::load(&path, 1, 8, false).unwrap(),
        ];

        let batcher = ScanBatcher::new(8);
        let device = Default::default();
        let batch: ScanBatch<NdArray> = batcher.batch(items, &device);

        assert_eq!(batch.images.dims(), [2, 3, 8, 8]);
        assert_eq!(batch.targets.dims(), [2]);
    }

    #[test]
    fn test_batcher_normalization() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("white.png");
        write_gray_image(&path, 255);

        let items = vec![ScanItem::load(&path, 0, 4, false).unwrap()];
        let batcher = ScanBatcher::new(4);
        let device = Default::default();
        let batch: ScanBatch<NdArray> = batcher.batch(items, &device);

        // First channel of a white image: (1.0 - 0.485) / 0.229
        let expected = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let data: Vec<f32> = batch.images.into_data().iter::<f32>().collect();
        assert!((data[0] - expected).abs() < 1e-4);
    }
}
