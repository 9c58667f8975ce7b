//! Rendering every asset of one product to the output tree:
//! `<output>/<product>/formatted/[<design>/]` and `<output>/<product>/visuals/`.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use super::batch::assign_design_indices;
use super::design::format_design;
use super::template::generate_template;
use super::video::generate_video as render_video;
use crate::encode::write_video;
use crate::error::{PicGeniusError, Result};
use crate::image_loader::save_image;
use crate::types::{Design, Product};
use crate::worker::WorkerPool;

pub const FORMATTED_DESIGNS_FOLDER: &str = "formatted";
pub const VISUALS_FOLDER: &str = "visuals";

/// Which design of a product the preview video is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DesignSelection {
    Index(usize),
    Random,
}

impl Default for DesignSelection {
    fn default() -> Self {
        DesignSelection::Index(0)
    }
}

impl DesignSelection {
    pub fn select<'a>(&self, designs: &'a [Design]) -> Result<&'a Design> {
        let selected = match *self {
            DesignSelection::Index(index) => designs.get(index),
            DesignSelection::Random => designs.choose(&mut rand::thread_rng()),
        };
        selected.ok_or_else(|| {
            PicGeniusError::validation(format!(
                "design selection {:?} is out of range for {} designs",
                self,
                designs.len()
            ))
        })
    }
}

pub fn formatted_output_dir(base: &Path, product: &Product, design_name: &str) -> PathBuf {
    let dir = base.join(&product.name).join(FORMATTED_DESIGNS_FOLDER);
    if design_name.is_empty() {
        dir
    } else {
        dir.join(design_name)
    }
}

pub fn visuals_output_dir(base: &Path, product: &Product) -> PathBuf {
    base.join(&product.name).join(VISUALS_FOLDER)
}

/// Save every format of every design; returns the number of files written.
pub fn generate_formatted_designs(
    product: &Product,
    output_dir: &Path,
    pool: &WorkerPool,
) -> Result<usize> {
    let formats = &product.product_type.formats;
    let mut written = 0;

    for design in &product.designs {
        let subfolder = if formats.len() > 1 { design.name.as_str() } else { "" };
        let dir = formatted_output_dir(output_dir, product, subfolder);
        let image = design.load_image()?;

        let jobs = formats.iter().map(|format| {
            let (image, dir, name) = (&image, &dir, design.name.as_str());
            move || {
                let (formatted, filename) = format_design(image, name, format)?;
                save_image(&formatted, dir, &filename)?;
                Ok(())
            }
        });
        written += pool.run_all(jobs)?;
        debug!(product = %product.name, design = %design.name, "formatted design saved");
    }
    Ok(written)
}

/// Render and save every template of the product type.
///
/// Designs are assigned to templates up front, in template order; each
/// template is then rendered and saved by its own job.
pub fn generate_templates(product: &Product, output_dir: &Path, pool: &WorkerPool) -> Result<usize> {
    let templates = &product.product_type.templates;
    let designs = &product.designs;
    if designs.is_empty() && !templates.is_empty() {
        return Err(PicGeniusError::validation(format!(
            "product '{}' has no design to render templates with",
            product.name
        )));
    }

    let dir = visuals_output_dir(output_dir, product);
    let plan = assign_design_indices(templates, designs.len());
    let jobs = templates.iter().zip(plan).map(|(template, indices)| {
        let dir = &dir;
        move || {
            let selected: Vec<&Design> = indices.iter().map(|&index| &designs[index]).collect();
            let image = generate_template(template, &selected)?;
            save_image(&DynamicImage::ImageRgba8(image), dir, &template.filename)?;
            Ok(())
        }
    });
    pool.run_all(jobs)
}

/// Render the preview video, if the product type configures one.
pub fn generate_video(
    product: &Product,
    output_dir: &Path,
    selection: DesignSelection,
) -> Result<Option<PathBuf>> {
    let Some(settings) = product.product_type.video_settings.as_ref() else {
        debug!(product = %product.name, "no video settings, skipping video");
        return Ok(None);
    };

    let design = selection.select(&product.designs)?;
    let image = design.load_image()?;
    let clip = render_video(&image, settings)?;

    let dir = visuals_output_dir(output_dir, product);
    let path = write_video(&clip, &dir.join(&settings.filename))?;
    info!(product = %product.name, design = %design.name, movement = %clip.movement, "video generated");
    Ok(Some(path))
}
