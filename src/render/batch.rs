//! Round-robin assignment of designs to the templates of a batch.

use image::RgbaImage;

use super::template::generate_template;
use crate::error::{PicGeniusError, Result};
use crate::types::{Design, Template};

/// Design indices for one template, starting at `cursor`, and the cursor
/// after it.
///
/// A repeating template fills every slot with the design under the cursor
/// and advances once; otherwise each slot takes the next design, wrapping
/// around the list.
pub fn slot_indices(
    slots: usize,
    repeat: bool,
    design_count: usize,
    cursor: usize,
) -> (Vec<usize>, usize) {
    if design_count == 0 {
        return (Vec::new(), cursor);
    }
    let cursor = cursor % design_count;
    if repeat {
        return (vec![cursor; slots], (cursor + 1) % design_count);
    }
    let indices = (0..slots).map(|i| (cursor + i) % design_count).collect();
    (indices, (cursor + slots) % design_count)
}

/// The designs filling `template` and the advanced cursor.
pub fn next_designs<'a>(
    template: &Template,
    designs: &'a [Design],
    cursor: usize,
) -> Result<(usize, Vec<&'a Design>)> {
    if designs.is_empty() {
        return Err(PicGeniusError::validation(format!(
            "no designs available for template '{}'",
            template.name
        )));
    }
    let (indices, cursor) = slot_indices(
        template.elements.len(),
        template.repeat,
        designs.len(),
        cursor,
    );
    Ok((cursor, indices.into_iter().map(|i| &designs[i]).collect()))
}

/// Index plan of a whole batch, one entry per template.
pub fn assign_design_indices(templates: &[Template], design_count: usize) -> Vec<Vec<usize>> {
    let mut cursor = 0;
    templates
        .iter()
        .map(|template| {
            let (indices, next) =
                slot_indices(template.elements.len(), template.repeat, design_count, cursor);
            cursor = next;
            indices
        })
        .collect()
}

/// Lazily rendered templates, one item per template in list order.
///
/// Single pass: each call to `next` renders the following template.
pub struct TemplateBatch<'a> {
    templates: std::slice::Iter<'a, Template>,
    designs: &'a [Design],
    cursor: usize,
}

impl<'a> TemplateBatch<'a> {
    /// Index of the design the next template starts from.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for TemplateBatch<'a> {
    type Item = Result<(RgbaImage, &'a Template)>;

    fn next(&mut self) -> Option<Self::Item> {
        let template = self.templates.next()?;
        let result = next_designs(template, self.designs, self.cursor).and_then(
            |(cursor, selected)| {
                self.cursor = cursor;
                generate_template(template, &selected)
            },
        );
        Some(result.map(|image| (image, template)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.templates.size_hint()
    }
}

pub fn generate_templates<'a>(
    templates: &'a [Template],
    designs: &'a [Design],
) -> Result<TemplateBatch<'a>> {
    if designs.is_empty() && !templates.is_empty() {
        return Err(PicGeniusError::validation(
            "cannot render templates without any design",
        ));
    }
    Ok(TemplateBatch {
        templates: templates.iter(),
        designs,
        cursor: 0,
    })
}
