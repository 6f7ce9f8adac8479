use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Where a detector left its results: a run directory it owns, with label
/// files under `labels/` and annotated preview images (when enabled) in the
/// run directory itself. The orchestrator relocates these into the canonical
/// dataset layout.
#[derive(Debug, Clone)]
pub struct DetectorOutput {
    pub run_dir: PathBuf,
}

impl DetectorOutput {
    pub fn labels_dir(&self) -> PathBuf {
        self.run_dir.join("labels")
    }
}

/// The one capability the pipeline needs from a detection model: run over a
/// directory of images and write one label file per image with detections,
/// each line a normalized box. The meter locator and the digit locator are
/// two configured instances of this.
pub trait Detector {
    fn detect(&self, images_dir: &Path) -> Result<DetectorOutput>;
}

/// Detector backed by an Ultralytics-style `yolo predict` command line.
/// Results land under `{project}/{run_name}` with labels in a `labels/`
/// subdirectory, matching the layout the pipeline relocates from.
pub struct YoloCliDetector {
    program: String,
    weights: PathBuf,
    project: PathBuf,
    run_name: String,
    save_conf: bool,
    save_annotated: bool,
}

impl YoloCliDetector {
    pub fn new(
        program: impl Into<String>,
        weights: impl Into<PathBuf>,
        project: impl Into<PathBuf>,
        run_name: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            weights: weights.into(),
            project: project.into(),
            run_name: run_name.into(),
            save_conf: false,
            save_annotated: false,
        }
    }

    /// Append a confidence column to each label line.
    pub fn with_confidences(mut self, on: bool) -> Self {
        self.save_conf = on;
        self
    }

    /// Also save annotated preview images into the run directory.
    pub fn with_annotated_images(mut self, on: bool) -> Self {
        self.save_annotated = on;
        self
    }

    pub fn run_dir(&self) -> PathBuf {
        self.project.join(&self.run_name)
    }
}

impl Detector for YoloCliDetector {
    fn detect(&self, images_dir: &Path) -> Result<DetectorOutput> {
        let status = Command::new(&self.program)
            .arg("predict")
            .arg(format!("model={}", self.weights.display()))
            .arg(format!("source={}", images_dir.display()))
            .arg("save_txt=True")
            .arg(format!("save_conf={}", py_bool(self.save_conf)))
            .arg(format!("save={}", py_bool(self.save_annotated)))
            .arg(format!("project={}", self.project.display()))
            .arg(format!("name={}", self.run_name))
            .arg("exist_ok=True")
            .status()
            .with_context(|| format!("failed to launch detector command '{}'", self.program))?;

        if !status.success() {
            bail!(
                "detector '{}' failed with {} on source {}",
                self.program,
                status,
                images_dir.display()
            );
        }

        Ok(DetectorOutput {
            run_dir: self.run_dir(),
        })
    }
}

fn py_bool(value: bool) -> &'static str {
    if value { "True" } else { "False" }
}
