//! Training-time image transforms.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use rand::Rng;

/// Deterministic transform used for validation and un-augmented training:
/// exact resize to a square.
pub fn eval_transform(img: &DynamicImage, size: u32) -> DynamicImage {
    img.resize_exact(size, size, FilterType::Triangle)
}

/// Random-resized-crop plus random horizontal flip.
pub fn train_transform<R: Rng>(img: &DynamicImage, size: u32, rng: &mut R) -> DynamicImage {
    let cropped = random_resized_crop(img, size, rng);
    if rng.gen_bool(0.5) {
        cropped.fliph()
    } else {
        cropped
    }
}

/// Crop a random area (8-100% of the image, aspect ratio 3/4 to 4/3) and
/// resize it to the target square. Falls back to a plain resize when no
/// valid crop is sampled.
fn random_resized_crop<R: Rng>(img: &DynamicImage, size: u32, rng: &mut R) -> DynamicImage {
    let (width, height) = img.dimensions();
    let area = (width * height) as f32;

    for _ in 0..10 {
        let target_area = area * rng.gen_range(0.08f32..=1.0);
        let aspect = rng.gen_range(0.75f32..=4.0 / 3.0);

        let crop_w = (target_area * aspect).sqrt().round() as u32;
        let crop_h = (target_area / aspect).sqrt().round() as u32;

        if crop_w >= 1 && crop_h >= 1 && crop_w <= width && crop_h <= height {
            let x = rng.gen_range(0..=width - crop_w);
            let y = rng.gen_range(0..=height - crop_h);
            return img
                .crop_imm(x, y, crop_w, crop_h)
                .resize_exact(size, size, FilterType::Triangle);
        }
    }

    eval_transform(img, size)
}
