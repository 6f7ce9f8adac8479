use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::dataset;
use crate::models::NormalizedBox;

/// Errors from reading a label file. `Malformed` is the per-item recoverable
/// case: callers skip the file and keep going with the rest of the batch.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read label file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed label line {} in {}: {}", line, path.display(), reason)]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// Parse a label file: one object per non-blank line,
/// `class x_center y_center width height [confidence]`, whitespace-separated.
pub fn read(path: &Path) -> Result<Vec<NormalizedBox>, LabelError> {
    let content = fs::read_to_string(path).map_err(|source| LabelError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_line(line, path, idx + 1)?);
    }
    Ok(records)
}

fn parse_line(line: &str, path: &Path, line_no: usize) -> Result<NormalizedBox, LabelError> {
    let malformed = |reason: String| LabelError::Malformed {
        path: path.to_path_buf(),
        line: line_no,
        reason,
    };

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 5 && fields.len() != 6 {
        return Err(malformed(format!(
            "expected 5 or 6 fields, got {}",
            fields.len()
        )));
    }

    let class_id = fields[0]
        .parse::<u32>()
        .map_err(|_| malformed(format!("invalid class id '{}'", fields[0])))?;

    let mut floats = [0.0f32; 4];
    for (slot, field) in floats.iter_mut().zip(&fields[1..5]) {
        *slot = field
            .parse::<f32>()
            .map_err(|_| malformed(format!("invalid coordinate '{field}'")))?;
    }

    let mut bbox = NormalizedBox::new(class_id, floats[0], floats[1], floats[2], floats[3]);
    if let Some(conf) = fields.get(5) {
        let conf = conf
            .parse::<f32>()
            .map_err(|_| malformed(format!("invalid confidence '{conf}'")))?;
        bbox = bbox.with_confidence(conf);
    }
    Ok(bbox)
}

/// Overwrite `path` with one line per record. Coordinates are written with
/// six decimal places, matching detector output files.
pub fn write(path: &Path, records: &[NormalizedBox]) -> Result<()> {
    let mut out = String::new();
    for r in records {
        match r.confidence {
            Some(conf) => out.push_str(&format!(
                "{} {:.6} {:.6} {:.6} {:.6} {:.6}\n",
                r.class_id, r.x_center, r.y_center, r.width, r.height, conf
            )),
            None => out.push_str(&format!(
                "{} {:.6} {:.6} {:.6} {:.6}\n",
                r.class_id, r.x_center, r.y_center, r.width, r.height
            )),
        }
    }
    fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

/// The synthesized label of a crop: its object covers the whole image.
/// Written in the fixed short form other tools expect.
pub fn write_full_coverage(path: &Path, class_id: u32) -> Result<()> {
    fs::write(path, format!("{class_id} 0.5 0.5 1.0 1.0\n"))
        .with_context(|| format!("failed to write {}", path.display()))
}

/// One image of a dataset, paired with its label file when present. A
/// missing label file means "no detections", not an error.
#[derive(Debug, Clone)]
pub struct DatasetEntry {
    pub stem: String,
    pub image_path: PathBuf,
    pub label_path: Option<PathBuf>,
}

/// Pair every image in `images_dir` with its `{stem}.txt` label, sorted by
/// filename. Yields exactly one entry per image.
pub fn pair(images_dir: &Path, labels_dir: &Path) -> Result<Vec<DatasetEntry>> {
    let mut entries = Vec::new();
    for image_path in dataset::list_images(images_dir)? {
        let Some(stem) = dataset::stem_of(&image_path) else {
            continue;
        };
        let candidate = labels_dir.join(format!("{stem}.txt"));
        let label_path = candidate.is_file().then_some(candidate);
        entries.push(DatasetEntry {
            stem,
            image_path,
            label_path,
        });
    }
    Ok(entries)
}
