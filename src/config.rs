use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::dataset;

/// Configuration for a full pipeline run: the two model weights and the
/// three dataset roots the stages move artifacts between.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    pub water_meter_model: PathBuf,
    pub digit_model: PathBuf,
    pub input_dir: PathBuf,
    pub cropped_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Command used to invoke the detector over a batch of images.
    #[serde(default = "default_detector_program")]
    pub detector_program: String,
}

fn default_detector_program() -> String {
    "yolo".to_string()
}

impl PredictConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid pipeline config {}", path.display()))
    }
}

/// An inclusive sampling range for augmentation jitter.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Range {
    pub min: f32,
    pub max: f32,
}

/// Jitter parameters: rotation in degrees, brightness as a multiplicative
/// factor, and how many variants to produce per source image.
#[derive(Debug, Clone, Deserialize)]
pub struct AugmentParams {
    pub rotation_range: Range,
    pub brightness_range: Range,
    pub augmentation_factor: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AugmentConfig {
    pub input_folder: PathBuf,
    pub output_folder: PathBuf,
    pub augmentation: AugmentParams,
    #[serde(default = "default_extensions")]
    pub valid_extensions: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    dataset::IMAGE_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}

impl AugmentConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid augmentation config {}", path.display()))
    }
}
