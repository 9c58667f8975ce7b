use std::fmt;
use std::str::FromStr;

use super::watermark::Watermark;
use crate::error::PicGeniusError;

/// Camera movement of a preview video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    ZoomIn,
    ZoomOut,
    SlideLeft,
    SlideRight,
    /// One of the concrete movements, drawn once per video.
    Random,
}

impl Movement {
    pub const CONCRETE: [Movement; 4] = [
        Movement::ZoomIn,
        Movement::ZoomOut,
        Movement::SlideLeft,
        Movement::SlideRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Movement::ZoomIn => "zoom_in",
            Movement::ZoomOut => "zoom_out",
            Movement::SlideLeft => "slide_left",
            Movement::SlideRight => "slide_right",
            Movement::Random => "random",
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Movement {
    type Err = PicGeniusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "zoom_in" => Ok(Movement::ZoomIn),
            "zoom_out" => Ok(Movement::ZoomOut),
            "slide_left" => Ok(Movement::SlideLeft),
            "slide_right" => Ok(Movement::SlideRight),
            "random" => Ok(Movement::Random),
            other => Err(PicGeniusError::configuration(format!(
                "unknown video movement \"{}\": expected zoom_in, zoom_out, slide_left, slide_right or random",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSettings {
    pub movement: Movement,
    /// Pixels moved (or cropped per side) between consecutive frames.
    pub step: u32,
    /// Frame index range; `ceil(frames / step)` frames are produced.
    pub frames: u32,
    pub fps: u32,
    /// Output frame size.
    pub format: (u32, u32),
    /// Pre-zoom of slide movements, in percent of the frame size.
    pub start_zoom: f64,
    pub filename: String,
    pub watermarks: Vec<Watermark>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            movement: Movement::ZoomIn,
            step: 1,
            frames: 100,
            fps: 24,
            format: (1080, 1080),
            start_zoom: 120.0,
            filename: "video.mp4".to_string(),
            watermarks: Vec::new(),
        }
    }
}

impl VideoSettings {
    pub fn frame_count(&self) -> usize {
        (0..self.frames).step_by(self.step.max(1) as usize).count()
    }
}
