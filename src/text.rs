//! Font loading, text measuring and text compositing.

use std::path::Path;

use ab_glyph::{Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size as glyph_box_size};
use imageproc::rect::Rect;
use tracing::debug;

use crate::error::{PicGeniusError, Result};
use crate::types::Textbox;

/// Text still measuring zero at this size has no advancing glyphs and
/// keeps size 1.
const ZERO_WIDTH_PROBE_SIZE: u32 = 256;
/// Upper bound of the font size search.
pub const MAX_FONT_SIZE: u32 = 8192;

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| {
        PicGeniusError::resource(format!("Font not readable: {} ({})", path.display(), e))
    })?;
    FontVec::try_from_vec(bytes)
        .map_err(|_| PicGeniusError::resource(format!("Invalid font file: {}", path.display())))
}

pub fn font_scale(size: u32) -> PxScale {
    PxScale::from(size as f32)
}

/// Advance width of `text` in pixels, kerning included.
pub fn measure_text_width(font: &impl Font, size: u32, text: &str) -> u32 {
    let scaled = font.as_scaled(font_scale(size));
    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = scaled.glyph_id(ch);
        if let Some(prev) = prev_glyph {
            width += scaled.kern(prev, glyph_id);
        }
        width += scaled.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    width.max(0.0).ceil() as u32
}

/// Right/bottom extent of the rendered glyphs when drawn at the origin.
pub fn text_size(font: &impl Font, size: u32, text: &str) -> (u32, u32) {
    glyph_box_size(font_scale(size), font, text)
}

/// Largest font size whose measured width is `<= max_width`, at least 1
/// and at most [`MAX_FONT_SIZE`].
///
/// Measured width never decreases with size, so the size is bracketed by
/// doubling and then narrowed by bisection.
pub fn find_font_size(text: &str, font: &impl Font, max_width: u32) -> u32 {
    if measure_text_width(font, ZERO_WIDTH_PROBE_SIZE, text) == 0 {
        return 1;
    }
    let fits = |size: u32| measure_text_width(font, size, text) <= max_width;

    // `low` fits (or is the floor of 1), `high` does not.
    let mut low = 1;
    let mut high = 2;
    while fits(high) {
        if high == MAX_FONT_SIZE {
            debug!(size = high, max_width, text, "font size capped");
            return high;
        }
        low = high;
        high = (high * 2).min(MAX_FONT_SIZE);
    }
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        if fits(mid) {
            low = mid;
        } else {
            high = mid;
        }
    }
    debug!(size = low, max_width, text, "fitted font size");
    low
}

/// Drawing offsets are kept within this distance of the origin so glyph
/// and box extents added to them stay inside `i32`.
const DRAW_OFFSET_LIMIT: i64 = (i32::MAX / 2) as i64;

fn clamp_offset(value: i64) -> i32 {
    value.clamp(-DRAW_OFFSET_LIMIT, DRAW_OFFSET_LIMIT) as i32
}

/// Draw `text` at `pos` over `image`, optionally on a padded background box.
///
/// Box and text are drawn on a transparent layer that is then
/// alpha-composited over the base.
pub fn paste_text_on_image(
    image: &RgbaImage,
    text: &str,
    font: &impl Font,
    size: u32,
    pos: (i64, i64),
    color: Rgba<u8>,
    textbox: Option<&Textbox>,
) -> RgbaImage {
    let (width, height) = image.dimensions();
    let mut layer = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 0]));

    if let Some(textbox) = textbox {
        let (text_w, text_h) = text_size(font, size, text);
        let padding = textbox.padding;
        let left = pos.0.saturating_sub(padding.left as i64);
        let top = pos.1.saturating_sub(padding.top as i64);
        let right = pos.0.saturating_add(text_w as i64 + padding.right as i64);
        let bottom = pos.1.saturating_add(text_h as i64 + padding.bottom as i64);

        if right > left && bottom > top {
            let (left, top) = (clamp_offset(left), clamp_offset(top));
            let rect_w = u32::try_from(clamp_offset(right) as i64 - left as i64).unwrap_or(0);
            let rect_h = u32::try_from(clamp_offset(bottom) as i64 - top as i64).unwrap_or(0);
            if rect_w > 0 && rect_h > 0 {
                let rect = Rect::at(left, top).of_size(rect_w, rect_h);
                draw_filled_rect_mut(&mut layer, rect, textbox.color);
            }
        }
    }

    draw_text_mut(
        &mut layer,
        color,
        clamp_offset(pos.0),
        clamp_offset(pos.1),
        font_scale(size),
        font,
        text,
    );

    let mut combined = image.clone();
    imageops::overlay(&mut combined, &layer, 0, 0);
    combined
}
