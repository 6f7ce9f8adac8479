use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Image extensions accepted when scanning a dataset directory.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "bmp", "tiff"];

/// The canonical dataset layout: a root with `images/` and `labels/` siblings.
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

/// Create the `images/` and `labels/` scaffolding under `root`. Safe to call
/// repeatedly.
pub fn ensure_layout(root: &Path) -> Result<DatasetLayout> {
    let images_dir = root.join("images");
    let labels_dir = root.join("labels");
    fs::create_dir_all(&images_dir)
        .with_context(|| format!("failed to create {}", images_dir.display()))?;
    fs::create_dir_all(&labels_dir)
        .with_context(|| format!("failed to create {}", labels_dir.display()))?;
    Ok(DatasetLayout {
        root: root.to_path_buf(),
        images_dir,
        labels_dir,
    })
}

/// Case-insensitive extension match against `extensions` (leading dots in the
/// configured set are tolerated).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|e| ext.eq_ignore_ascii_case(e.trim_start_matches('.')))
}

pub fn is_image_file(path: &Path) -> bool {
    has_extension(path, &IMAGE_EXTENSIONS)
}

pub fn has_label_extension(path: &Path) -> bool {
    has_extension(path, &["txt"])
}

/// List image files in `dir` with one of the given extensions, sorted by
/// filename so batch processing order is deterministic.
pub fn list_images_with(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut images = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read directory {}", dir.display()))?
            .path();
        if path.is_file() && has_extension(&path, extensions) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    list_images_with(dir, &IMAGE_EXTENSIONS)
}

/// Move every file in `src_dir` matching `keep` into `dst_dir`, returning the
/// number moved. Relocation is idempotent: a missing source directory means a
/// previous run already moved everything, and an existing destination file is
/// simply replaced.
pub fn relocate_files<F>(src_dir: &Path, dst_dir: &Path, keep: F) -> Result<usize>
where
    F: Fn(&Path) -> bool,
{
    if !src_dir.exists() {
        return Ok(0);
    }
    fs::create_dir_all(dst_dir)
        .with_context(|| format!("failed to create {}", dst_dir.display()))?;

    let mut moved = 0;
    let entries = fs::read_dir(src_dir)
        .with_context(|| format!("failed to read directory {}", src_dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read directory {}", src_dir.display()))?
            .path();
        if !path.is_file() || !keep(&path) {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        let dst = dst_dir.join(name);
        fs::rename(&path, &dst).with_context(|| {
            format!("failed to move {} to {}", path.display(), dst.display())
        })?;
        moved += 1;
    }
    Ok(moved)
}

/// Remove a detector's scratch directory. Absence is not an error, so a
/// retried run can clean up after an earlier attempt.
pub fn remove_scratch(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", dir.display())),
    }
}

/// Filename without its extension, used to pair images with label files.
pub fn stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}
