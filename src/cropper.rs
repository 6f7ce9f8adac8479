use std::path::Path;

use anyhow::{Context, Result};
use image::ImageReader;

use crate::dataset;
use crate::labels;

/// Per-run accounting for `crop_dataset`. Skips are normal states of a
/// partially labelled dataset, never batch failures.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CropReport {
    pub images_processed: usize,
    pub images_skipped_no_label: usize,
    pub images_failed: usize,
    pub labels_malformed: usize,
    pub boxes_cropped: usize,
    pub boxes_skipped_degenerate: usize,
}

/// Crop every labelled region out of a dataset. For each image in
/// `images_dir` paired with a label file in `labels_dir`, each non-degenerate
/// box becomes `{stem}_crop_{index}.{ext}` plus a full-coverage label under
/// `output_dir/images` and `output_dir/labels`. `index` counts the
/// non-degenerate boxes of that image, in label-file order.
pub fn crop_dataset(images_dir: &Path, labels_dir: &Path, output_dir: &Path) -> Result<CropReport> {
    let out = dataset::ensure_layout(output_dir)?;
    let mut report = CropReport::default();

    for entry in labels::pair(images_dir, labels_dir)? {
        let image_name = entry
            .image_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| entry.stem.clone());

        let Some(label_path) = &entry.label_path else {
            println!("Warning: Label file not found for {image_name}. Skipping...");
            report.images_skipped_no_label += 1;
            continue;
        };

        let records = match labels::read(label_path) {
            Ok(records) => records,
            Err(err) => {
                println!("Warning: {err}. Skipping...");
                report.labels_malformed += 1;
                continue;
            }
        };

        let image = match ImageReader::open(&entry.image_path)
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

        let ext = entry
            .image_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());

        let mut index = 0;
        for record in &records {
            let Some(rect) = record.to_pixel_rect(image.width(), image.height()) else {
                println!("Warning: Degenerate box in {image_name}. Skipping box...");
                report.boxes_skipped_degenerate += 1;
                continue;
            };

            let cropped = image.crop_imm(rect.x, rect.y, rect.w, rect.h);
            let crop_image_path = out
                .images_dir
                .join(format!("{}_crop_{}.{}", entry.stem, index, ext));
            let crop_label_path = out
                .labels_dir
                .join(format!("{}_crop_{}.txt", entry.stem, index));

            cropped
                .save(&crop_image_path)
                .with_context(|| format!("failed to save {}", crop_image_path.display()))?;
            labels::write_full_coverage(&crop_label_path, record.class_id)?;

            report.boxes_cropped += 1;
            index += 1;
        }

        report.images_processed += 1;
    }

    Ok(report)
}
