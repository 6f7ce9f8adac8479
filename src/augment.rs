use std::fs;

use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader, Rgb};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::map::map_colors;
use rand::Rng;

use crate::config::{AugmentConfig, Range};
use crate::dataset;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AugmentReport {
    pub images_augmented: usize,
    pub variants_written: usize,
    pub images_skipped_no_label: usize,
    pub images_failed: usize,
}

/// Rotate by a random angle drawn from `range` (degrees). The canvas size is
/// kept; uncovered corners fill with black.
pub fn random_rotation(image: &DynamicImage, range: Range, rng: &mut impl Rng) -> DynamicImage {
    let angle = rng.gen_range(range.min..=range.max).to_radians();
    let rotated = rotate_about_center(
        &image.to_rgb8(),
        angle,
        Interpolation::Bicubic,
        Rgb([0, 0, 0]),
    );
    DynamicImage::ImageRgb8(rotated)
}

/// Scale brightness by a random factor drawn from `range`.
pub fn random_brightness(image: &DynamicImage, range: Range, rng: &mut impl Rng) -> DynamicImage {
    let factor = rng.gen_range(range.min..=range.max);
    let adjusted = map_colors(&image.to_rgb8(), |p| {
        Rgb([
            scale_channel(p[0], factor),
            scale_channel(p[1], factor),
            scale_channel(p[2], factor),
        ])
    });
    DynamicImage::ImageRgb8(adjusted)
}

fn scale_channel(value: u8, factor: f32) -> u8 {
    (value as f32 * factor).round().clamp(0.0, 255.0) as u8
}

/// Expand a labelled dataset with jittered copies. Each source image with a
/// label yields `augmentation_factor` variants named
/// `{stem}_augmented_{i}.{ext}`, each with the source label file copied
/// alongside (the geometry of a rotated full-frame meter photo stays usable
/// for training the locator). Images without a label are skipped with a
/// warning.
pub fn augment_dataset(config: &AugmentConfig) -> Result<AugmentReport> {
    let images_dir = config.input_folder.join("images");
    let labels_dir = config.input_folder.join("labels");
    let out = dataset::ensure_layout(&config.output_folder)?;

    let extensions: Vec<&str> = config.valid_extensions.iter().map(|s| s.as_str()).collect();
    let mut rng = rand::thread_rng();
    let mut report = AugmentReport::default();

    for image_path in dataset::list_images_with(&images_dir, &extensions)? {
        let Some(stem) = dataset::stem_of(&image_path) else {
            continue;
        };
        let image_name = image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| stem.clone());

        let label_path = labels_dir.join(format!("{stem}.txt"));
        if !label_path.is_file() {
            println!("Warning: Label file not found for {image_name}. Skipping...");
            report.images_skipped_no_label += 1;
            continue;
        }

        let image = match ImageReader::open(&image_path)
            .map_err(anyhow::Error::from)
            .and_then(|r| r.decode().map_err(anyhow::Error::from))
        {
            Ok(image) => image,
            Err(err) => {
                println!("Warning: Could not read {image_name}: {err}. Skipping...");
                report.images_failed += 1;
                continue;
            }
        };

        let ext = image_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());

        for i in 0..config.augmentation.augmentation_factor {
            let rotated = random_rotation(&image, config.augmentation.rotation_range, &mut rng);
            let jittered =
                random_brightness(&rotated, config.augmentation.brightness_range, &mut rng);

            let out_image = out.images_dir.join(format!("{stem}_augmented_{i}.{ext}"));
            let out_label = out.labels_dir.join(format!("{stem}_augmented_{i}.txt"));

            jittered
                .save(&out_image)
                .with_context(|| format!("failed to save {}", out_image.display()))?;
            fs::copy(&label_path, &out_label)
                .with_context(|| format!("failed to copy label to {}", out_label.display()))?;
            report.variants_written += 1;
        }

        report.images_augmented += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AugmentParams;
    use image::RgbImage;

    fn jitter_params(factor: usize) -> AugmentParams {
        AugmentParams {
            rotation_range: Range { min: -10.0, max: 10.0 },
            brightness_range: Range { min: 0.8, max: 1.2 },
            augmentation_factor: factor,
        }
    }

    #[test]
    fn brightness_factor_one_is_identity() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([100, 150, 200])));
        let range = Range { min: 1.0, max: 1.0 };
        let out = random_brightness(&image, range, &mut rand::thread_rng());
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([100, 150, 200]));
    }

    #[test]
    fn brightness_saturates_at_white() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([200, 200, 200])));
        let range = Range { min: 2.0, max: 2.0 };
        let out = random_brightness(&image, range, &mut rand::thread_rng());
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([255, 255, 255]));
    }

    #[test]
    fn rotation_keeps_dimensions() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(20, 10));
        let range = Range { min: -15.0, max: 15.0 };
        let out = random_rotation(&image, range, &mut rand::thread_rng());
        assert_eq!((out.width(), out.height()), (20, 10));
    }

    #[test]
    fn dataset_expands_by_factor_and_copies_labels() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let input = dir.path().join("raw");
        let layout = dataset::ensure_layout(&input)?;
        RgbImage::new(32, 32).save(layout.images_dir.join("meter01.png"))?;
        RgbImage::new(32, 32).save(layout.images_dir.join("meter02.png"))?;
        fs::write(layout.labels_dir.join("meter01.txt"), "0 0.5 0.5 0.4 0.6\n")?;

        let config = AugmentConfig {
            input_folder: input,
            output_folder: dir.path().join("augmented"),
            augmentation: jitter_params(3),
            valid_extensions: vec!["png".to_string()],
        };
        let report = augment_dataset(&config)?;

        assert_eq!(report.images_augmented, 1);
        assert_eq!(report.variants_written, 3);
        assert_eq!(report.images_skipped_no_label, 1);

        let out_images = config.output_folder.join("images");
        let out_labels = config.output_folder.join("labels");
        for i in 0..3 {
            assert!(out_images.join(format!("meter01_augmented_{i}.png")).is_file());
            let label = fs::read_to_string(out_labels.join(format!("meter01_augmented_{i}.txt")))?;
            assert_eq!(label, "0 0.5 0.5 0.4 0.6\n");
        }
        Ok(())
    }
}
