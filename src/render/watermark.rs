use ab_glyph::Font;
use image::RgbaImage;
use tracing::debug;

use crate::error::Result;
use crate::text::{find_font_size, load_font, paste_text_on_image, text_size};
use crate::types::Watermark;

/// Draw `watermark` over `image`, fitting the font to the watermark width.
pub fn apply_watermarking(image: &RgbaImage, watermark: &Watermark) -> Result<RgbaImage> {
    let font = load_font(&watermark.font_path)?;
    Ok(apply_watermarking_with_font(image, watermark, &font))
}

/// Apply every watermark in order.
pub fn apply_watermarks(image: RgbaImage, watermarks: &[Watermark]) -> Result<RgbaImage> {
    watermarks
        .iter()
        .try_fold(image, |current, watermark| apply_watermarking(&current, watermark))
}

pub fn apply_watermarking_with_font(
    image: &RgbaImage,
    watermark: &Watermark,
    font: &impl Font,
) -> RgbaImage {
    let (width, height) = image.dimensions();
    let max_width = watermark.width.resolve(width);
    let size = find_font_size(&watermark.text, font, max_width);
    let measured = text_size(font, size, &watermark.text);
    let position = watermark
        .position
        .resolve((width, height), measured, watermark.margin);

    debug!(
        text = %watermark.text,
        font_size = size,
        x = position.0,
        y = position.1,
        "placing watermark"
    );
    paste_text_on_image(
        image,
        &watermark.text,
        font,
        size,
        position,
        watermark.color,
        watermark.textbox.as_ref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tests::{fixture_font, fixture_font_path};
    use crate::types::{Anchor, AxisPosition, Dimension, Position2D};
    use image::Rgba;

    fn dark(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]))
    }

    fn lit_columns(image: &RgbaImage) -> (u32, u32) {
        let xs: Vec<u32> = image
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] > 128)
            .map(|(x, _, _)| x)
            .collect();
        (
            *xs.iter().min().expect("some lit pixel"),
            *xs.iter().max().expect("some lit pixel"),
        )
    }

    #[test]
    fn centered_watermark_stays_within_width_budget() {
        let watermark = Watermark::new(fixture_font_path(), "Sample");
        let out = apply_watermarking(&dark(400, 200), &watermark).expect("watermark");

        let (min_x, max_x) = lit_columns(&out);
        assert!(max_x - min_x <= 280, "text spans {min_x}..{max_x}");
        // Roughly centered.
        assert!((min_x as i64 - (399 - max_x) as i64).abs() < 20, "{min_x}..{max_x}");
    }

    #[test]
    fn margins_push_text_away_from_edges() {
        let font = fixture_font();
        let mut watermark = Watermark::new(fixture_font_path(), "Brand");
        watermark.width = Dimension::Pixels(80);
        watermark.margin = 25;
        watermark.position = Position2D {
            x: AxisPosition::Anchor(Anchor::End),
            y: AxisPosition::Anchor(Anchor::End),
        };

        let out = apply_watermarking_with_font(&dark(300, 120), &watermark, &font);
        let (min_x, max_x) = lit_columns(&out);
        assert!(max_x < 300 - 25 + 2, "right edge at {max_x}");
        assert!(min_x > 300 - 25 - 90, "left edge at {min_x}");
    }

    #[test]
    fn watermarks_apply_in_order() {
        let mut first = Watermark::new(fixture_font_path(), "A");
        first.position = Position2D {
            x: AxisPosition::Pixels(5),
            y: AxisPosition::Pixels(5),
        };
        first.width = Dimension::Pixels(30);
        let mut second = first.clone();
        second.position.x = AxisPosition::Pixels(60);

        let out = apply_watermarks(dark(100, 50), &[first, second]).expect("watermarks");
        let (min_x, max_x) = lit_columns(&out);
        assert!(min_x < 40 && max_x >= 60, "{min_x}..{max_x}");
    }

    #[test]
    fn missing_font_fails_watermarking() {
        let watermark = Watermark::new("/nonexistent/font.ttf", "x");
        assert!(apply_watermarking(&dark(10, 10), &watermark).is_err());
    }
}
