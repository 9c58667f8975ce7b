use image::DynamicImage;

use crate::error::Result;
use crate::geometry::resize_and_crop;
use crate::types::Format;

/// Print-ready version of one design in one format, with its file name.
pub fn format_design(
    image: &DynamicImage,
    design_name: &str,
    format: &Format,
) -> Result<(DynamicImage, String)> {
    let (width, height) = format.pixel_size();
    let formatted = resize_and_crop(image, width, height)?;
    Ok((formatted, format.filename(design_name)))
}

/// Print-ready versions of one design, one per format, with their file names.
pub fn generate_design_formats<'a>(
    image: &'a DynamicImage,
    design_name: &'a str,
    formats: &'a [Format],
) -> impl Iterator<Item = Result<(DynamicImage, String)>> + 'a {
    formats
        .iter()
        .map(move |format| format_design(image, design_name, format))
}
