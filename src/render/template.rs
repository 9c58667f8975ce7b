use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, RgbaImage};
use tracing::debug;

use super::watermark::apply_watermarks;
use crate::error::{PicGeniusError, Result};
use crate::geometry::{
    apply_transparency, apply_transparent_overlay, crop_to_ratio, find_coeffs,
    perspective_transform_sized, proportional_overlap_resize, resize_and_crop,
    smooth_integration, paste_onto, zoom, Quad,
};
use crate::image_loader::load_image;
use crate::types::{
    Design, ElementSize, Placement, Template, TemplateBackground, TemplateElement,
    TemplateImageElement,
};

/// Inward offset of the sharp region kept by edge smoothing.
const PERSPECTIVE_CUT_PIXELS: i32 = 3;
/// Blur passes applied to the edge of a perspective paste.
const PERSPECTIVE_SMOOTH_POWER: u32 = 2;

/// Render `template` with `designs` filling its elements in order.
pub fn generate_template(template: &Template, designs: &[&Design]) -> Result<RgbaImage> {
    let images = designs
        .iter()
        .take(template.elements.len())
        .map(|design| design.load_image())
        .collect::<Result<Vec<_>>>()?;
    render_template(template, &images)
}

/// Render `template` from already decoded design images.
///
/// Elements are filled first, then fixed image elements are pasted, then
/// watermarks are applied in list order.
pub fn render_template(template: &Template, designs: &[DynamicImage]) -> Result<RgbaImage> {
    if designs.len() < template.elements.len() {
        return Err(PicGeniusError::validation(format!(
            "template '{}' has {} elements but only {} designs were given",
            template.name,
            template.elements.len(),
            designs.len()
        )));
    }

    let mut canvas = create_template_image(template)
        .map_err(|err| err.with_context(&format!("template '{}'", template.name)))?;
    for (index, (element, design)) in template.elements.iter().zip(designs).enumerate() {
        design_pre_treatment(design, element)
            .and_then(|treated| integrate_element(&mut canvas, &treated, element))
            .map_err(|err| {
                err.with_context(&format!("template '{}', element #{}", template.name, index))
            })?;
    }

    for (index, image_element) in template.images.iter().enumerate() {
        paste_image_element(&mut canvas, image_element).map_err(|err| {
            err.with_context(&format!("template '{}', image #{}", template.name, index))
        })?;
    }

    apply_watermarks(canvas, &template.watermarks)
        .map_err(|err| err.with_context(&format!("template '{}'", template.name)))
}

fn create_template_image(template: &Template) -> Result<RgbaImage> {
    match &template.background {
        TemplateBackground::Image(path) => Ok(load_image(path)?.to_rgba8()),
        TemplateBackground::Canvas { size, color } => {
            Ok(RgbaImage::from_pixel(size.0, size.1, *color))
        }
    }
}

/// Ratio crop, zoom, color overlay and transparency, in that order.
pub fn design_pre_treatment(image: &DynamicImage, element: &TemplateElement) -> Result<DynamicImage> {
    let mut treated = match element.ratio {
        Some(ratio) => crop_to_ratio(image, ratio)?,
        None => image.clone(),
    };
    if let Some(factor) = element.zoom {
        treated = zoom(&treated, factor, element.zoom_position)?;
    }
    if let Some(color) = element.overlay {
        treated = apply_transparent_overlay(&treated, color);
    }
    if let Some(transparency) = element.transparency.filter(|t| *t < 1.0) {
        treated = apply_transparency(&treated, transparency);
    }
    Ok(treated)
}

/// Place an already pre-treated design into `canvas`.
pub fn integrate_element(
    canvas: &mut RgbaImage,
    design: &DynamicImage,
    element: &TemplateElement,
) -> Result<()> {
    match element.placement {
        Placement::AxisAligned { position, size } => {
            fit_design_in_template(canvas, design, position, size)
        }
        Placement::Perspective { corners } => fit_design_in_perspective(canvas, design, &corners),
    }
}

fn fit_design_in_template(
    canvas: &mut RgbaImage,
    design: &DynamicImage,
    position: (i64, i64),
    size: ElementSize,
) -> Result<()> {
    let (width, height) = size.resolve(design.dimensions());
    let resized = resize_and_crop(design, width, height)?;
    paste_onto(canvas, &resized, position.0, position.1);
    Ok(())
}

fn fit_design_in_perspective(
    canvas: &mut RgbaImage,
    design: &DynamicImage,
    corners: &[(i64, i64); 4],
) -> Result<()> {
    let working = proportional_overlap_resize(design, &*canvas);
    let (width, height) = (working.width() as f64, working.height() as f64);

    let source: Quad = [(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)];
    let target: Quad = corners.map(|(x, y)| (x as f64, y as f64));
    let coeffs = find_coeffs(&source, &target)?;

    let warped = perspective_transform_sized(&working.to_rgba8(), &coeffs, canvas.dimensions());
    let smoothed = smooth_integration(
        &warped,
        &target,
        PERSPECTIVE_CUT_PIXELS,
        PERSPECTIVE_SMOOTH_POWER,
    );
    debug!(?corners, "pasted design in perspective");
    imageops::overlay(canvas, &smoothed, 0, 0);
    Ok(())
}

/// Paste a badge/logo image element, sized and positioned relative to the canvas.
pub fn paste_image_element(canvas: &mut RgbaImage, element: &TemplateImageElement) -> Result<()> {
    let image = load_image(&element.path)?;
    let (width, height) = element.resolve_size(image.dimensions(), canvas.dimensions());
    if width == 0 || height == 0 {
        debug!(path = %element.path.display(), "image element resolves to an empty size, skipped");
        return Ok(());
    }

    let mut resized = image.resize_exact(width, height, FilterType::Lanczos3);
    if element.transparency < 1.0 {
        resized = apply_transparency(&resized, element.transparency);
    }
    let (x, y) = element
        .position
        .resolve(canvas.dimensions(), (width, height), element.margin);
    imageops::overlay(canvas, &resized.to_rgba8(), x, y);
    Ok(())
}
