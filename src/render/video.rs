//! Preview video frames synthesized from one watermarked still.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::watermark::apply_watermarks;
use crate::error::Result;
use crate::geometry::resize_and_crop;
use crate::types::{Movement, VideoSettings};

/// Ordered frames tagged with their playback rate.
#[derive(Debug, Clone)]
pub struct VideoClip {
    pub frames: Vec<RgbaImage>,
    pub fps: u32,
    pub movement: Movement,
}

impl VideoClip {
    pub fn frame_size(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|frame| frame.dimensions())
    }
}

pub fn generate_video(image: &DynamicImage, settings: &VideoSettings) -> Result<VideoClip> {
    generate_video_with_rng(image, settings, &mut rand::thread_rng())
}

/// Like [`generate_video`], drawing a `random` movement from `rng`.
pub fn generate_video_with_rng<R: Rng + ?Sized>(
    image: &DynamicImage,
    settings: &VideoSettings,
    rng: &mut R,
) -> Result<VideoClip> {
    let (width, height) = settings.format;
    let base = resize_and_crop(image, width, height)?.to_rgba8();
    let base = apply_watermarks(base, &settings.watermarks)?;

    let movement = resolve_movement(settings.movement, rng);
    let offsets = frame_offsets(settings);
    debug!(%movement, frames = offsets.len(), "synthesizing video frames");

    let frames = match movement {
        Movement::ZoomOut => zoom_frames(&base, offsets.iter().rev()),
        Movement::SlideLeft => slide_frames(&base, settings.start_zoom, &offsets, true),
        Movement::SlideRight => slide_frames(&base, settings.start_zoom, &offsets, false),
        Movement::ZoomIn | Movement::Random => zoom_frames(&base, offsets.iter()),
    };

    Ok(VideoClip {
        frames,
        fps: settings.fps,
        movement,
    })
}

/// A concrete movement; `Random` is drawn once, uniformly.
pub fn resolve_movement<R: Rng + ?Sized>(movement: Movement, rng: &mut R) -> Movement {
    match movement {
        Movement::Random => *Movement::CONCRETE
            .choose(rng)
            .unwrap_or(&Movement::ZoomIn),
        concrete => concrete,
    }
}

/// Per-frame offsets `0, step, 2*step, ...` below `frames`.
pub fn frame_offsets(settings: &VideoSettings) -> Vec<u32> {
    (0..settings.frames)
        .step_by(settings.step.max(1) as usize)
        .collect()
}

/// Crop `offset` pixels from each side (height scaled to keep the aspect
/// ratio) and scale back to the frame size.
fn zoom_frames<'a>(base: &RgbaImage, offsets: impl Iterator<Item = &'a u32>) -> Vec<RgbaImage> {
    let (width, height) = base.dimensions();
    offsets
        .map(|&offset| {
            let dx = offset.min(width.saturating_sub(1) / 2);
            let dy = ((offset as u64 * height as u64 / width.max(1) as u64) as u32)
                .min(height.saturating_sub(1) / 2);
            let region =
                imageops::crop_imm(base, dx, dy, width - 2 * dx, height - 2 * dy).to_image();
            imageops::resize(&region, width, height, FilterType::Lanczos3)
        })
        .collect()
}

/// Pan a frame-sized window across the base enlarged by `start_zoom` percent.
fn slide_frames(base: &RgbaImage, start_zoom: f64, offsets: &[u32], leftward: bool) -> Vec<RgbaImage> {
    let (width, height) = base.dimensions();
    let scale = (start_zoom / 100.0).max(1.0);
    let zoomed_w = ((width as f64 * scale) as u32).max(width);
    let zoomed_h = ((height as f64 * scale) as u32).max(height);
    let zoomed = imageops::resize(base, zoomed_w, zoomed_h, FilterType::Lanczos3);

    let travel = zoomed_w - width;
    let top = (zoomed_h - height) / 2;
    offsets
        .iter()
        .map(|&offset| {
            let moved = offset.min(travel);
            let left = if leftward { travel - moved } else { moved };
            imageops::crop_imm(&zoomed, left, top, width, height).to_image()
        })
        .collect()
}
