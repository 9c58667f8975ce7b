//! Pixel-level geometry shared by every renderer.
//!
//! Aspect-ratio cropping, perspective coefficient solving and warping,
//! edge smoothing of warped designs, overlays and alpha-aware pasting.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometric_transformations::{warp_into_with, warp_with, Interpolation};
use imageproc::point::Point;
use tracing::debug;

use crate::error::{PicGeniusError, Result};

/// Four corners ordered top-left, top-right, bottom-left, bottom-right.
pub type Quad = [(f64, f64); 4];

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Relative pivot magnitude under which the perspective system is singular.
const SINGULAR_PIVOT: f64 = 1e-10;

/// Box `(x, y, width, height)` of the largest centered region of a
/// `width`x`height` image with the aspect ratio `ratio_w:ratio_h`.
pub fn centered_crop_box(width: u32, height: u32, ratio_w: u32, ratio_h: u32) -> (u32, u32, u32, u32) {
    let target_ratio = ratio_w as f64 / ratio_h as f64;
    let current_ratio = width as f64 / height as f64;

    if current_ratio > target_ratio {
        let new_width = ((height as f64 * target_ratio) as u32).clamp(1, width);
        let left = (width - new_width) / 2;
        (left, 0, new_width, height)
    } else {
        let new_height = ((width as f64 / target_ratio) as u32).clamp(1, height);
        let top = (height - new_height) / 2;
        (0, top, width, new_height)
    }
}

fn ensure_positive(width: u32, height: u32, what: &str) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PicGeniusError::configuration(format!(
            "{what} must have positive dimensions, got {width}x{height}"
        )));
    }
    Ok(())
}

/// Crop `image` symmetrically to the ratio of `target_width:target_height`,
/// then resize it to exactly that size. Never letterboxes.
pub fn resize_and_crop(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<DynamicImage> {
    ensure_positive(target_width, target_height, "resize target")?;
    let (width, height) = image.dimensions();
    ensure_positive(width, height, "source image")?;

    let (x, y, crop_w, crop_h) = centered_crop_box(width, height, target_width, target_height);
    Ok(image
        .crop_imm(x, y, crop_w, crop_h)
        .resize_exact(target_width, target_height, FilterType::Lanczos3))
}

/// Crop `image` symmetrically to `ratio` (w, h), keeping native resolution.
pub fn crop_to_ratio(image: &DynamicImage, ratio: (u32, u32)) -> Result<DynamicImage> {
    ensure_positive(ratio.0, ratio.1, "crop ratio")?;
    let (width, height) = image.dimensions();
    ensure_positive(width, height, "source image")?;

    let (x, y, crop_w, crop_h) = centered_crop_box(width, height, ratio.0, ratio.1);
    Ok(image.crop_imm(x, y, crop_w, crop_h))
}

/// Magnify `image` by `factor` around `center` (defaults to the middle),
/// keeping the original dimensions. The crop window stays inside the image.
pub fn zoom(image: &DynamicImage, factor: f64, center: Option<(u32, u32)>) -> Result<DynamicImage> {
    if !factor.is_finite() || factor < 1.0 {
        return Err(PicGeniusError::configuration(format!(
            "zoom factor must be >= 1, got {factor}"
        )));
    }
    let (width, height) = image.dimensions();
    ensure_positive(width, height, "source image")?;

    let crop_w = ((width as f64 / factor).round() as u32).clamp(1, width);
    let crop_h = ((height as f64 / factor).round() as u32).clamp(1, height);
    let (cx, cy) = center.unwrap_or((width / 2, height / 2));

    let left = (cx as i64 - crop_w as i64 / 2).clamp(0, (width - crop_w) as i64) as u32;
    let top = (cy as i64 - crop_h as i64 / 2).clamp(0, (height - crop_h) as i64) as u32;

    Ok(image
        .crop_imm(left, top, crop_w, crop_h)
        .resize_exact(width, height, FilterType::Lanczos3))
}

/// Coefficients `(a, b, c, d, e, f, g, h)` of a projective transform that
/// maps an output pixel `(x, y)` back to its source location:
/// `((a x + b y + c) / (g x + h y + 1), (d x + e y + f) / (g x + h y + 1))`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCoeffs(pub [f64; 8]);

impl PerspectiveCoeffs {
    pub const IDENTITY: PerspectiveCoeffs = PerspectiveCoeffs([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);

    /// Source location of the output point `(x, y)`; `None` on the line at infinity.
    pub fn map(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let [a, b, c, d, e, f, g, h] = self.0;
        let denominator = g * x + h * y + 1.0;
        if denominator.abs() < f64::EPSILON {
            return None;
        }
        Some((
            (a * x + b * y + c) / denominator,
            (d * x + e * y + f) / denominator,
        ))
    }

    fn sample_point(&self, x: f32, y: f32) -> (f32, f32) {
        self.map(x as f64, y as f64)
            .map(|(sx, sy)| (sx as f32, sy as f32))
            .unwrap_or((-1.0, -1.0))
    }
}

/// Solve for the coefficients mapping `target` corners onto `source` corners.
///
/// Both quads use the same corner order. A degenerate quadrilateral (for
/// instance three collinear corners) yields a singular system and a
/// [`PicGeniusError::Numeric`] error.
pub fn find_coeffs(source: &Quad, target: &Quad) -> Result<PerspectiveCoeffs> {
    let mut matrix = [[0f64; 9]; 8];
    for (i, (s, t)) in source.iter().zip(target.iter()).enumerate() {
        matrix[2 * i] = [t.0, t.1, 1.0, 0.0, 0.0, 0.0, -s.0 * t.0, -s.0 * t.1, s.0];
        matrix[2 * i + 1] = [0.0, 0.0, 0.0, t.0, t.1, 1.0, -s.1 * t.0, -s.1 * t.1, s.1];
    }

    let solution = solve_linear_system(matrix).ok_or_else(|| {
        PicGeniusError::numeric(format!(
            "degenerate perspective quadrilateral {:?}: the coefficient system is singular",
            target
        ))
    })?;
    Ok(PerspectiveCoeffs(solution))
}

/// Gaussian elimination with partial pivoting over an augmented 8x9 matrix.
fn solve_linear_system(mut m: [[f64; 9]; 8]) -> Option<[f64; 8]> {
    let scale = m
        .iter()
        .flat_map(|row| row[..8].iter())
        .fold(0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }

    for col in 0..8 {
        let pivot_row = (col..8).max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))?;
        if m[pivot_row][col].abs() <= SINGULAR_PIVOT * scale {
            return None;
        }
        m.swap(col, pivot_row);

        for row in (col + 1)..8 {
            let factor = m[row][col] / m[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..9 {
                m[row][k] -= factor * m[col][k];
            }
        }
    }

    let mut x = [0f64; 8];
    for row in (0..8).rev() {
        let tail: f64 = ((row + 1)..8).map(|k| m[row][k] * x[k]).sum();
        x[row] = (m[row][8] - tail) / m[row][row];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}

/// Apply `coeffs` with bicubic resampling; the output has the input's size.
pub fn perspective_transform(image: &RgbaImage, coeffs: &PerspectiveCoeffs) -> RgbaImage {
    let coeffs = *coeffs;
    warp_with(
        image,
        move |x, y| coeffs.sample_point(x, y),
        Interpolation::Bicubic,
        TRANSPARENT,
    )
}

/// Like [`perspective_transform`] but renders onto a transparent canvas of
/// `size`, so the warped quad is never clipped to the source extent.
pub fn perspective_transform_sized(
    image: &RgbaImage,
    coeffs: &PerspectiveCoeffs,
    size: (u32, u32),
) -> RgbaImage {
    let coeffs = *coeffs;
    let mut out = RgbaImage::from_pixel(size.0, size.1, TRANSPARENT);
    warp_into_with(
        image,
        move |x, y| coeffs.sample_point(x, y),
        Interpolation::Bicubic,
        TRANSPARENT,
        &mut out,
    );
    out
}

/// Soften the jagged border of a warped design.
///
/// A copy blurred `smooth_power` times is used everywhere except inside the
/// quad shrunk inward by `cut_pixels`, where the sharp pixels are kept.
pub fn smooth_integration(
    image: &RgbaImage,
    corners: &Quad,
    cut_pixels: i32,
    smooth_power: u32,
) -> RgbaImage {
    let mut background = image.clone();
    for _ in 0..smooth_power {
        background = gaussian_blur_f32(&background, 1.0);
    }

    let [tl, tr, bl, br] = corners.map(|(x, y)| (x.round() as i32, y.round() as i32));
    let polygon = [
        Point::new(tl.0 + cut_pixels, tl.1 + cut_pixels),
        Point::new(tr.0 - cut_pixels, tr.1 + cut_pixels),
        Point::new(br.0 - cut_pixels, br.1 - cut_pixels),
        Point::new(bl.0 + cut_pixels, bl.1 - cut_pixels),
    ];
    let distinct = polygon
        .iter()
        .enumerate()
        .all(|(i, p)| polygon[i + 1..].iter().all(|q| q != p));
    if !distinct {
        debug!(?corners, cut_pixels, "shrunken quad collapsed, keeping blurred edges only");
        return background;
    }

    let (width, height) = image.dimensions();
    let mut mask = GrayImage::new(width, height);
    draw_polygon_mut(&mut mask, &polygon, Luma([255u8]));

    for ((out, sharp), keep) in background
        .pixels_mut()
        .zip(image.pixels())
        .zip(mask.pixels())
    {
        if keep[0] > 0 {
            *out = *sharp;
        }
    }
    background
}

/// Scale `image` so its width matches `reference`, preserving aspect ratio.
pub fn proportional_overlap_resize<I: GenericImageView>(
    image: &DynamicImage,
    reference: &I,
) -> DynamicImage {
    let (ref_width, _) = reference.dimensions();
    let (width, height) = image.dimensions();
    let aspect_ratio = width as f64 / height.max(1) as f64;

    let new_width = ref_width.max(1);
    let new_height = ((new_width as f64 / aspect_ratio) as u32).max(1);
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Alpha-composite a uniform `color` layer over `image`.
pub fn apply_transparent_overlay(image: &DynamicImage, color: Rgba<u8>) -> DynamicImage {
    let mut base = image.to_rgba8();
    let overlay = RgbaImage::from_pixel(base.width(), base.height(), color);
    imageops::overlay(&mut base, &overlay, 0, 0);
    DynamicImage::ImageRgba8(base)
}

/// Scale the alpha channel of `image` by `transparency` in `[0, 1]`.
pub fn apply_transparency(image: &DynamicImage, transparency: f64) -> DynamicImage {
    let factor = transparency.clamp(0.0, 1.0);
    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        pixel[3] = (pixel[3] as f64 * factor).round() as u8;
    }
    DynamicImage::ImageRgba8(rgba)
}

/// Paste `image` at `(x, y)`, using its alpha channel as mask when it has one.
pub fn paste_onto(canvas: &mut RgbaImage, image: &DynamicImage, x: i64, y: i64) {
    let rgba = image.to_rgba8();
    if image.color().has_alpha() {
        imageops::overlay(canvas, &rgba, x, y);
    } else {
        imageops::replace(canvas, &rgba, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32, horizontal: bool) -> DynamicImage {
        let colors = [Rgba([255, 0, 0, 255]), Rgba([0, 255, 0, 255]), Rgba([0, 0, 255, 255])];
        let img = RgbaImage::from_fn(width, height, |x, y| {
            let band = if horizontal { x * 3 / width } else { y * 3 / height };
            colors[band as usize]
        });
        DynamicImage::ImageRgba8(img)
    }

    fn close(a: &Rgba<u8>, b: &Rgba<u8>, tolerance: u8) -> bool {
        a.0.iter().zip(b.0.iter()).all(|(x, y)| x.abs_diff(*y) <= tolerance)
    }

    #[test]
    fn resize_and_crop_hits_exact_target_size() {
        let img = DynamicImage::new_rgba8(640, 480);
        for (w, h) in [(100, 100), (480, 685), (1, 7), (1000, 20)] {
            let out = resize_and_crop(&img, w, h).expect("resize");
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn resize_and_crop_keeps_center_of_wide_image() {
        // Only the green middle third survives a square crop of a 3:1 image.
        let img = striped(300, 100, true);
        let out = resize_and_crop(&img, 50, 50).expect("resize").to_rgba8();
        let green = Rgba([0, 255, 0, 255]);
        for (x, y) in [(0, 0), (49, 0), (0, 49), (49, 49), (25, 25)] {
            assert!(close(out.get_pixel(x, y), &green, 1), "pixel ({x},{y})");
        }
    }

    #[test]
    fn resize_and_crop_keeps_center_of_tall_image() {
        let img = striped(100, 300, false);
        let out = resize_and_crop(&img, 20, 20).expect("resize").to_rgba8();
        assert!(close(out.get_pixel(0, 0), &Rgba([0, 255, 0, 255]), 1));
        assert!(close(out.get_pixel(19, 19), &Rgba([0, 255, 0, 255]), 1));
    }

    #[test]
    fn resize_and_crop_rejects_zero_target() {
        let img = DynamicImage::new_rgba8(10, 10);
        assert!(matches!(
            resize_and_crop(&img, 0, 10),
            Err(PicGeniusError::Configuration(_))
        ));
    }

    #[test]
    fn crop_to_ratio_keeps_native_resolution() {
        let img = DynamicImage::new_rgba8(400, 300);
        assert_eq!(crop_to_ratio(&img, (1, 1)).unwrap().dimensions(), (300, 300));
        assert_eq!(crop_to_ratio(&img, (3, 4)).unwrap().dimensions(), (225, 300));
        assert_eq!(crop_to_ratio(&img, (16, 9)).unwrap().dimensions(), (400, 225));
    }

    #[test]
    fn zoom_magnifies_around_center() {
        // Quadrants: red top-left, blue elsewhere.
        let img = DynamicImage::ImageRgba8(RgbaImage::from_fn(100, 100, |x, y| {
            if x < 50 && y < 50 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        }));
        let out = zoom(&img, 4.0, Some((25, 25))).expect("zoom").to_rgba8();
        assert_eq!(out.dimensions(), (100, 100));
        assert!(close(out.get_pixel(50, 50), &Rgba([255, 0, 0, 255]), 1));
        assert!(close(out.get_pixel(5, 95), &Rgba([255, 0, 0, 255]), 1));
    }

    #[test]
    fn zoom_window_is_clamped_inside_image() {
        let img = DynamicImage::new_rgba8(80, 40);
        let out = zoom(&img, 2.0, Some((1000, 1000))).expect("zoom");
        assert_eq!(out.dimensions(), (80, 40));
        assert!(zoom(&img, 0.5, None).is_err());
    }

    #[test]
    fn find_coeffs_maps_target_corners_back_to_source() {
        let source: Quad = [(0.0, 0.0), (200.0, 0.0), (0.0, 100.0), (200.0, 100.0)];
        let target: Quad = [(110.0, 172.0), (286.0, 198.0), (110.0, 533.0), (286.0, 530.0)];
        let coeffs = find_coeffs(&source, &target).expect("coeffs");

        for (s, t) in source.iter().zip(target.iter()) {
            let (x, y) = coeffs.map(t.0, t.1).expect("finite mapping");
            assert!((x - s.0).abs() < 1e-6, "x: {x} vs {}", s.0);
            assert!((y - s.1).abs() < 1e-6, "y: {y} vs {}", s.1);
        }
    }

    #[test]
    fn find_coeffs_of_rectangle_onto_itself_is_identity() {
        let rect: Quad = [(0.0, 0.0), (64.0, 0.0), (0.0, 48.0), (64.0, 48.0)];
        let coeffs = find_coeffs(&rect, &rect).expect("coeffs");
        for (got, want) in coeffs.0.iter().zip(PerspectiveCoeffs::IDENTITY.0.iter()) {
            assert!((got - want).abs() < 1e-9, "{got} vs {want}");
        }
    }

    #[test]
    fn find_coeffs_rejects_degenerate_quad() {
        let source: Quad = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0), (10.0, 10.0)];
        let collinear: Quad = [(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)];
        let err = find_coeffs(&source, &collinear).unwrap_err();
        assert!(matches!(err, PicGeniusError::Numeric(_)));

        let collapsed: Quad = [(5.0, 5.0); 4];
        assert!(find_coeffs(&source, &collapsed).is_err());
    }

    #[test]
    fn identity_warp_preserves_interior_pixels() {
        let img = RgbaImage::from_fn(32, 24, |x, y| Rgba([(x * 7) as u8, (y * 9) as u8, 128, 255]));
        let rect: Quad = [(0.0, 0.0), (32.0, 0.0), (0.0, 24.0), (32.0, 24.0)];
        let coeffs = find_coeffs(&rect, &rect).expect("coeffs");
        let out = perspective_transform(&img, &coeffs);

        assert_eq!(out.dimensions(), img.dimensions());
        for y in 2..21 {
            for x in 2..29 {
                assert!(
                    close(out.get_pixel(x, y), img.get_pixel(x, y), 1),
                    "pixel ({x},{y}) changed: {:?} vs {:?}",
                    out.get_pixel(x, y),
                    img.get_pixel(x, y)
                );
            }
        }
    }

    #[test]
    fn sized_transform_renders_onto_requested_canvas() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 255]));
        let source: Quad = [(0.0, 0.0), (40.0, 0.0), (0.0, 40.0), (40.0, 40.0)];
        let target: Quad = [(10.0, 60.0), (50.0, 65.0), (10.0, 110.0), (50.0, 105.0)];
        let coeffs = find_coeffs(&source, &target).expect("coeffs");
        let out = perspective_transform_sized(&img, &coeffs, (64, 128));

        assert_eq!(out.dimensions(), (64, 128));
        assert_eq!(out.get_pixel(30, 85)[3], 255, "quad interior is opaque");
        assert_eq!(out.get_pixel(2, 2)[3], 0, "outside the quad stays transparent");
    }

    #[test]
    fn smooth_integration_keeps_interior_sharp() {
        let img = RgbaImage::from_fn(40, 40, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        });
        let corners: Quad = [(0.0, 0.0), (39.0, 0.0), (0.0, 39.0), (39.0, 39.0)];
        let out = smooth_integration(&img, &corners, 3, 2);

        assert_eq!(out.dimensions(), (40, 40));
        assert_eq!(out.get_pixel(20, 20), img.get_pixel(20, 20));
        assert_ne!(out.get_pixel(0, 20), img.get_pixel(0, 20), "edge is blurred");
    }

    #[test]
    fn proportional_resize_matches_reference_width() {
        let img = DynamicImage::new_rgba8(200, 100);
        let reference = RgbaImage::new(500, 80);
        assert_eq!(proportional_overlap_resize(&img, &reference).dimensions(), (500, 250));
    }

    #[test]
    fn overlay_blends_uniform_color() {
        let img = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(4, 4, image::Rgb([255, 255, 255])));
        let out = apply_transparent_overlay(&img, Rgba([0, 0, 0, 128])).to_rgba8();
        let px = out.get_pixel(1, 1);
        assert!((126..=128).contains(&px[0]), "got {:?}", px);
        assert_eq!(px[3], 255);
    }

    #[test]
    fn transparency_scales_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 200])));
        let out = apply_transparency(&img, 0.5).to_rgba8();
        assert_eq!(out.get_pixel(0, 0), &Rgba([1, 2, 3, 100]));
    }

    #[test]
    fn paste_onto_respects_alpha_only_when_present() {
        let mut canvas = RgbaImage::from_pixel(4, 4, Rgba([9, 9, 9, 255]));
        let clear = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([200, 0, 0, 0])));
        paste_onto(&mut canvas, &clear, 1, 1);
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([9, 9, 9, 255]));

        let opaque = DynamicImage::ImageRgb8(image::RgbImage::from_pixel(2, 2, image::Rgb([0, 200, 0])));
        paste_onto(&mut canvas, &opaque, 2, 2);
        assert_eq!(canvas.get_pixel(3, 3), &Rgba([0, 200, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 1), &Rgba([9, 9, 9, 255]));
    }
}
