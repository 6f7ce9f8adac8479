use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::PredictConfig;
use crate::cropper::{self, CropReport};
use crate::dataset::{self, DatasetLayout};
use crate::detector::{Detector, YoloCliDetector};

/// Run-directory names the detectors write under before relocation.
pub const METER_RUN_NAME: &str = "water_meter_predictions";
pub const DIGIT_RUN_NAME: &str = "digit_predictions";

/// The pipeline's strictly sequential stages. Each stage consumes the whole
/// batch before the next starts, since the detector calls are batch-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LocateMeter,
    Crop,
    LocateDigits,
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LocateMeter => "water meter detection",
            Stage::Crop => "cropping",
            Stage::LocateDigits => "digit detection",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// Counts reported after a completed run. No stage mutates anything after
/// this is built.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    pub meter_labels: usize,
    pub crop: CropReport,
    pub digit_labels: usize,
    pub annotated_images: usize,
}

/// Orchestrates the two-stage pipeline: locate meters in the raw photos,
/// crop the dial regions, locate digits in the crops, and assemble the final
/// labelled dataset. Owns the intermediate directories and the relocation of
/// detector results between stages.
pub struct Predictor {
    config: PredictConfig,
    meter_locator: Box<dyn Detector>,
    digit_locator: Box<dyn Detector>,
    verbose: bool,
}

impl Predictor {
    /// Build the two YOLO CLI detector instances from the configuration.
    pub fn from_config(config: PredictConfig) -> Self {
        let meter = YoloCliDetector::new(
            &config.detector_program,
            &config.water_meter_model,
            &config.input_dir,
            METER_RUN_NAME,
        );
        // The digit stage mirrors the training-time invocation: confidences
        // in the label files and annotated previews alongside them.
        let digit = YoloCliDetector::new(
            &config.detector_program,
            &config.digit_model,
            &config.output_dir,
            DIGIT_RUN_NAME,
        )
        .with_confidences(true)
        .with_annotated_images(true);

        Self::with_detectors(config, Box::new(meter), Box::new(digit))
    }

    /// Plug in arbitrary detector implementations (used by tests).
    pub fn with_detectors(
        config: PredictConfig,
        meter_locator: Box<dyn Detector>,
        digit_locator: Box<dyn Detector>,
    ) -> Self {
        Self {
            config,
            meter_locator,
            digit_locator,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Run LOCATE_METER → CROP → LOCATE_DIGITS → FINALIZE. Detector failures
    /// abort the run with an error naming the stage; per-image crop issues
    /// accumulate in the report instead.
    pub fn run(&self) -> Result<RunReport> {
        let input = dataset::ensure_layout(&self.config.input_dir)?;
        dataset::ensure_layout(&self.config.cropped_dir)?;
        let output = dataset::ensure_layout(&self.config.output_dir)?;

        let mut report = RunReport::default();

        if self.verbose {
            println!("Starting water meter detection...");
        }
        report.meter_labels = self
            .locate_meters(&input)
            .with_context(|| format!("{} stage failed", Stage::LocateMeter))?;

        if self.verbose {
            println!("Cropping water meter regions...");
        }
        report.crop = cropper::crop_dataset(
            &input.images_dir,
            &input.labels_dir,
            &self.config.cropped_dir,
        )
        .with_context(|| format!("{} stage failed", Stage::Crop))?;

        if self.verbose {
            println!("Starting digit detection...");
        }
        (report.digit_labels, report.annotated_images) = self
            .locate_digits(&output)
            .with_context(|| format!("{} stage failed", Stage::LocateDigits))?;

        if self.verbose {
            println!("Pipeline completed. All results saved.");
        }
        Ok(report)
    }

    /// LOCATE_METER: run the meter locator over the raw images and move its
    /// label files into `input_dir/labels`.
    fn locate_meters(&self, input: &DatasetLayout) -> Result<usize> {
        let run = self.meter_locator.detect(&input.images_dir)?;
        let moved = dataset::relocate_files(&run.labels_dir(), &input.labels_dir, |p| {
            dataset::has_label_extension(p)
        })?;
        dataset::remove_scratch(&run.run_dir)?;
        Ok(moved)
    }

    /// LOCATE_DIGITS: run the digit locator over the crops, move its labels
    /// into `output_dir/labels`, and move annotated images that correspond
    /// to a relocated label into `output_dir/images`. Anything else in the
    /// run directory is diagnostic output and goes away with the scratch
    /// directory.
    fn locate_digits(&self, output: &DatasetLayout) -> Result<(usize, usize)> {
        let cropped_images = self.config.cropped_dir.join("images");
        let run = self.digit_locator.detect(&cropped_images)?;

        let labels_moved = dataset::relocate_files(&run.labels_dir(), &output.labels_dir, |p| {
            dataset::has_label_extension(p)
        })?;

        // Stems come from the canonical labels directory, not just this
        // run's batch, so a retried relocation still finds its matches.
        let labelled = label_stems(&output.labels_dir)?;
        let images_moved = dataset::relocate_files(&run.run_dir, &output.images_dir, |p| {
            dataset::is_image_file(p)
                && dataset::stem_of(p).is_some_and(|stem| labelled.contains(&stem))
        })?;

        dataset::remove_scratch(&run.run_dir)?;
        Ok((labels_moved, images_moved))
    }
}

fn label_stems(labels_dir: &Path) -> Result<HashSet<String>> {
    let mut stems = HashSet::new();
    if !labels_dir.exists() {
        return Ok(stems);
    }
    let entries = fs::read_dir(labels_dir)
        .with_context(|| format!("failed to read directory {}", labels_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read directory {}", labels_dir.display()))?
            .path();
        if path.is_file() && dataset::has_label_extension(&path) {
            if let Some(stem) = dataset::stem_of(&path) {
                stems.insert(stem);
            }
        }
    }
    Ok(stems)
}
