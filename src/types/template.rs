use std::path::{Path, PathBuf};

use image::Rgba;

use super::position::{Dimension, Position2D};
use super::watermark::Watermark;

/// Size of an axis-aligned slot. A missing dimension is derived from the
/// design's aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementSize {
    Exact { width: u32, height: u32 },
    Width(u32),
    Height(u32),
    Native,
}

impl ElementSize {
    pub fn from_parts(size: Option<(u32, u32)>, width: Option<u32>, height: Option<u32>) -> Self {
        match (size, width, height) {
            (Some((width, height)), _, _) => ElementSize::Exact { width, height },
            (None, Some(width), Some(height)) => ElementSize::Exact { width, height },
            (None, Some(width), None) => ElementSize::Width(width),
            (None, None, Some(height)) => ElementSize::Height(height),
            (None, None, None) => ElementSize::Native,
        }
    }

    /// Final `(width, height)` for a design of `native` size.
    pub fn resolve(&self, native: (u32, u32)) -> (u32, u32) {
        let (native_w, native_h) = (native.0.max(1) as f64, native.1.max(1) as f64);
        match *self {
            ElementSize::Exact { width, height } => (width, height),
            ElementSize::Width(width) => {
                (width, ((width as f64 * native_h / native_w) as u32).max(1))
            }
            ElementSize::Height(height) => {
                (((height as f64 * native_w / native_h) as u32).max(1), height)
            }
            ElementSize::Native => native,
        }
    }
}

/// How a design is laid into its slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Top-left corner plus size.
    AxisAligned { position: (i64, i64), size: ElementSize },
    /// Quadrilateral corners: top-left, top-right, bottom-left, bottom-right.
    Perspective { corners: [(i64, i64); 4] },
}

/// One design slot of a template, with its pre-treatment options.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    pub placement: Placement,
    pub ratio: Option<(u32, u32)>,
    pub zoom: Option<f64>,
    pub zoom_position: Option<(u32, u32)>,
    pub overlay: Option<Rgba<u8>>,
    pub transparency: Option<f64>,
}

impl TemplateElement {
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            ratio: None,
            zoom: None,
            zoom_position: None,
            overlay: None,
            transparency: None,
        }
    }

    pub fn axis_aligned(position: (i64, i64), size: ElementSize) -> Self {
        Self::new(Placement::AxisAligned { position, size })
    }

    pub fn perspective(corners: [(i64, i64); 4]) -> Self {
        Self::new(Placement::Perspective { corners })
    }
}

/// A fixed auxiliary image such as a badge or logo.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateImageElement {
    pub path: PathBuf,
    pub position: Position2D,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub margin: i64,
    pub transparency: f64,
}

impl TemplateImageElement {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            position: Position2D::CENTER,
            width: None,
            height: None,
            margin: 0,
            transparency: 1.0,
        }
    }

    /// Final size inside a template of `template` size for an image of
    /// `native` size. Percentages are relative to the template.
    pub fn resolve_size(&self, native: (u32, u32), template: (u32, u32)) -> (u32, u32) {
        let (native_w, native_h) = (native.0.max(1) as f64, native.1.max(1) as f64);
        match (self.width, self.height) {
            (Some(width), Some(height)) => (width.resolve(template.0), height.resolve(template.1)),
            (Some(width), None) => {
                let width = width.resolve(template.0);
                (width, (width as f64 * native_h / native_w) as u32)
            }
            (None, Some(height)) => {
                let height = height.resolve(template.1);
                ((height as f64 * native_w / native_h) as u32, height)
            }
            (None, None) => native,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateBackground {
    Image(PathBuf),
    Canvas { size: (u32, u32), color: Rgba<u8> },
}

impl TemplateBackground {
    pub const DEFAULT_CANVAS_SIZE: (u32, u32) = (2000, 2000);
    pub const DEFAULT_CANVAS_COLOR: Rgba<u8> = Rgba([0, 0, 0, 255]);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    /// Stem of `filename`, used in logs.
    pub name: String,
    /// Output file name of the rendered visual.
    pub filename: String,
    pub background: TemplateBackground,
    pub elements: Vec<TemplateElement>,
    pub images: Vec<TemplateImageElement>,
    pub watermarks: Vec<Watermark>,
    /// Fill every element with the same design.
    pub repeat: bool,
}

impl Template {
    pub fn new(filename: impl Into<String>, background: TemplateBackground) -> Self {
        let filename = filename.into();
        let name = Path::new(&filename)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(&filename)
            .to_string();
        Self {
            name,
            filename,
            background,
            elements: Vec::new(),
            images: Vec::new(),
            watermarks: Vec::new(),
            repeat: false,
        }
    }

    /// Template rendered over an existing mockup image, saved under the
    /// mockup's own file name.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template.png".to_string());
        Self::new(filename, TemplateBackground::Image(path))
    }

    pub fn with_elements(mut self, elements: Vec<TemplateElement>) -> Self {
        self.elements = elements;
        self
    }

    /// Designs consumed from the batch when rendering this template.
    pub fn designs_consumed(&self) -> usize {
        if self.repeat {
            1
        } else {
            self.elements.len()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_size_derives_missing_dimension() {
        assert_eq!(ElementSize::from_parts(Some((10, 20)), Some(5), None).resolve((1, 1)), (10, 20));
        assert_eq!(ElementSize::Width(100).resolve((400, 200)), (100, 50));
        assert_eq!(ElementSize::Height(100).resolve((400, 200)), (200, 100));
        assert_eq!(ElementSize::Native.resolve((33, 44)), (33, 44));
        assert_eq!(
            ElementSize::from_parts(None, Some(30), Some(40)),
            ElementSize::Exact { width: 30, height: 40 }
        );
    }

    #[test]
    fn image_element_sizes_are_relative_to_template() {
        let mut badge = TemplateImageElement::new("badge.png");
        badge.width = Some(Dimension::Percent(10.0));
        assert_eq!(badge.resolve_size((200, 100), (2000, 1000)), (200, 100));

        badge.width = None;
        badge.height = Some(Dimension::Pixels(50));
        assert_eq!(badge.resolve_size((200, 100), (2000, 1000)), (100, 50));
    }

    #[test]
    fn template_name_comes_from_filename() {
        let template = Template::from_path("/mockups/bedroom.png");
        assert_eq!(template.filename, "bedroom.png");
        assert_eq!(template.name, "bedroom");

        let mut canvas = Template::new(
            "grid.jpg",
            TemplateBackground::Canvas {
                size: (10, 10),
                color: TemplateBackground::DEFAULT_CANVAS_COLOR,
            },
        )
        .with_elements(vec![
            TemplateElement::axis_aligned((0, 0), ElementSize::Native),
            TemplateElement::axis_aligned((5, 5), ElementSize::Native),
        ]);
        assert_eq!(canvas.name, "grid");
        assert_eq!(canvas.designs_consumed(), 2);
        canvas.repeat = true;
        assert_eq!(canvas.designs_consumed(), 1);
    }
}
