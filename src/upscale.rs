//! Integer-factor upscaling of design images.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::info;

use crate::discovery::find_image_file_paths;
use crate::error::{PicGeniusError, Result};
use crate::image_loader::save_image;
use crate::types::Design;

pub const SUPPORTED_SCALES: [u32; 6] = [2, 4, 8, 10, 12, 16];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpscaleOptions {
    pub scale: u32,
    /// Accepted for CLI compatibility; resampling always runs on the CPU.
    pub cpu: bool,
    pub suffix: Option<String>,
    pub extension: String,
}

impl UpscaleOptions {
    pub fn new(scale: u32) -> Self {
        Self {
            scale,
            cpu: false,
            suffix: None,
            extension: "jpg".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_SCALES.contains(&self.scale) {
            return Err(PicGeniusError::configuration(format!(
                "unsupported upscale scale {}: expected one of 2, 4, 8, 10, 12, 16",
                self.scale
            )));
        }
        Ok(())
    }

    pub fn suffix(&self) -> String {
        self.suffix
            .clone()
            .unwrap_or_else(|| format!("-x{}-upscaled", self.scale))
    }

    pub fn output_filename(&self, design_name: &str) -> String {
        format!(
            "{}{}.{}",
            design_name,
            self.suffix(),
            self.extension.trim_start_matches('.')
        )
    }
}

pub fn upscale_image(image: &DynamicImage, scale: u32) -> Result<DynamicImage> {
    let width = image.width().checked_mul(scale);
    let height = image.height().checked_mul(scale);
    match (width, height) {
        (Some(width), Some(height)) => Ok(image.resize_exact(width, height, FilterType::Lanczos3)),
        _ => Err(PicGeniusError::configuration(format!(
            "x{} upscale of a {}x{} image overflows",
            scale,
            image.width(),
            image.height()
        ))),
    }
}

/// Upscale every design found at `design_path` into `output_dir`.
pub fn upscale_designs(
    design_path: &Path,
    output_dir: &Path,
    options: &UpscaleOptions,
) -> Result<Vec<PathBuf>> {
    options.validate()?;
    if options.cpu {
        info!("--cpu requested; upscaling uses CPU resampling");
    }

    let designs: Vec<Design> = find_image_file_paths(design_path)?
        .into_iter()
        .map(Design::new)
        .collect();
    info!(count = designs.len(), path = %design_path.display(), "found designs to upscale");

    let mut written = Vec::with_capacity(designs.len());
    for design in &designs {
        let image = design.load_image()?;
        let upscaled = upscale_image(&image, options.scale)?;
        let path = save_image(&upscaled, output_dir, &options.output_filename(&design.name))?;
        info!(design = %design.name, scale = options.scale, path = %path.display(), "upscale done");
        written.push(path);
    }
    Ok(written)
}
