pub mod augment;
pub mod config;
pub mod cropper;
pub mod dataset;
pub mod detector;
pub mod labels;
pub mod models;
pub mod pipeline;

// Re-export main types
pub use crate::augment::{augment_dataset, AugmentReport};
pub use crate::config::{AugmentConfig, PredictConfig};
pub use crate::cropper::{crop_dataset, CropReport};
pub use crate::detector::{Detector, DetectorOutput, YoloCliDetector};
pub use crate::labels::{DatasetEntry, LabelError};
pub use crate::models::{NormalizedBox, PixelRect};
pub use crate::pipeline::{Predictor, RunReport, Stage};
