use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageError};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("Failed to load image: {0}")]
    Load(#[from] ImageError),
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Failed to save image: {0}")]
    Save(String),
}

pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage, ImageLoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(ImageLoadError::NotFound(path.display().to_string()));
    }
    Ok(image::open(path)?)
}

/// Whether the extension of `filename` is a JPEG one, which cannot carry alpha.
pub fn is_jpeg_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

/// Save `image` as `output_dir/filename`, creating the directory if needed.
///
/// JPEG outputs are flattened to RGB first.
pub fn save_image(
    image: &DynamicImage,
    output_dir: &Path,
    filename: &str,
) -> Result<PathBuf, ImageLoadError> {
    fs::create_dir_all(output_dir).map_err(|e| ImageLoadError::Save(e.to_string()))?;
    let out_path = output_dir.join(filename);

    let result = if is_jpeg_filename(filename) {
        DynamicImage::ImageRgb8(image.to_rgb8()).save(&out_path)
    } else {
        image.save(&out_path)
    };
    result.map_err(|e| ImageLoadError::Save(format!("{}: {}", out_path.display(), e)))?;

    debug!(path = %out_path.display(), "saved image");
    Ok(out_path)
}
