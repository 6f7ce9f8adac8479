#![allow(dead_code)]

use std::path::Path;

use image::RgbImage;

/// Write a plain image of the given size, for dataset fixtures.
pub fn write_image(path: &Path, width: u32, height: u32) -> anyhow::Result<()> {
    RgbImage::new(width, height).save(path)?;
    Ok(())
}

pub fn image_size(path: &Path) -> anyhow::Result<(u32, u32)> {
    Ok(image::image_dimensions(path)?)
}

/// Sorted file names in a directory, for comparing dataset listings.
pub fn file_names(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        names.push(entry?.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
