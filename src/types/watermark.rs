use std::path::PathBuf;

use image::Rgba;

use super::position::{Dimension, Position2D};
use crate::error::{PicGeniusError, Result};

/// Padding of a textbox around the measured text, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Padding {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Padding {
    pub fn uniform(value: i32) -> Self {
        Self {
            left: value,
            top: value,
            right: value,
            bottom: value,
        }
    }

    /// Expand a padding list the way CSS-like shorthands do:
    /// `[p]` is every side, `[vertical, horizontal]` pairs the axes and
    /// `[left, top, right, bottom]` is taken as is.
    pub fn from_values(values: &[i32]) -> Result<Self> {
        match *values {
            [p] => Ok(Self::uniform(p)),
            [vertical, horizontal] => Ok(Self {
                left: horizontal,
                top: vertical,
                right: horizontal,
                bottom: vertical,
            }),
            [left, top, right, bottom] => Ok(Self {
                left,
                top,
                right,
                bottom,
            }),
            _ => Err(PicGeniusError::configuration(format!(
                "textbox padding must have 1, 2 or 4 values, got {}",
                values.len()
            ))),
        }
    }

    pub fn as_tuple(&self) -> (i32, i32, i32, i32) {
        (self.left, self.top, self.right, self.bottom)
    }
}

/// Background rectangle drawn behind watermark text.
#[derive(Debug, Clone, PartialEq)]
pub struct Textbox {
    pub color: Rgba<u8>,
    pub padding: Padding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub font_path: PathBuf,
    pub text: String,
    pub color: Rgba<u8>,
    pub position: Position2D,
    /// Maximum text width; the font size is fitted to it.
    pub width: Dimension,
    pub margin: i64,
    pub textbox: Option<Textbox>,
}

impl Watermark {
    pub const DEFAULT_WIDTH: Dimension = Dimension::Percent(70.0);

    /// White, centered text spanning 70% of the image width.
    pub fn new(font_path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            font_path: font_path.into(),
            text: text.into(),
            color: Rgba([255, 255, 255, 255]),
            position: Position2D::CENTER,
            width: Self::DEFAULT_WIDTH,
            margin: 0,
            textbox: None,
        }
    }
}
