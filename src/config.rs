//! YAML configuration: raw `serde` structs converted into the validated
//! model of [`crate::types`].

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::Rgba;
use serde::Deserialize;
use tracing::debug;

use crate::error::{PicGeniusError, Result};
use crate::types::{
    Axis, AxisPosition, Dimension, ElementSize, Format, Movement, Padding, Placement,
    Position2D, ProductType, Template, TemplateBackground, TemplateElement,
    TemplateImageElement, Textbox, VideoSettings, Watermark,
};

pub const DEFAULT_CONFIG_FILE: &str = "picgenius.yml";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    global: RawGlobal,
    #[serde(default)]
    product_types: BTreeMap<String, RawProductType>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawGlobal {
    formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    watermarks: BTreeMap<String, RawWatermark>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProductType {
    #[serde(rename = "designs-count", alias = "designs_count")]
    designs_count: usize,
    formats: Option<Vec<RawFormat>>,
    #[serde(default)]
    watermarks: BTreeMap<String, RawWatermark>,
    #[serde(default)]
    templates: Vec<RawTemplate>,
    video: Option<RawVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormat {
    ppi: u32,
    inches: (u32, u32),
    extension: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAxis {
    Pixels(i64),
    Keyword(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDimension {
    Pixels(u32),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPadding {
    Uniform(i32),
    Sides(Vec<i32>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTextbox {
    padding: Option<RawPadding>,
    color: Vec<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWatermark {
    font_path: PathBuf,
    text: String,
    color: Option<Vec<u8>>,
    position: Option<(RawAxis, RawAxis)>,
    width: Option<RawDimension>,
    #[serde(default)]
    margin: i64,
    textbox: Option<RawTextbox>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawWatermarkRef {
    Named(String),
    Inline(RawWatermark),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPosition {
    Point(Vec<i64>),
    Corners(Vec<Vec<i64>>),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawElement {
    position: RawPosition,
    size: Option<(u32, u32)>,
    width: Option<u32>,
    height: Option<u32>,
    ratio: Option<(u32, u32)>,
    zoom: Option<f64>,
    zoom_position: Option<(u32, u32)>,
    overlay: Option<Vec<u8>>,
    transparency: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawImageElement {
    path: PathBuf,
    position: Option<(RawAxis, RawAxis)>,
    width: Option<RawDimension>,
    height: Option<RawDimension>,
    #[serde(default)]
    margin: i64,
    transparency: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTemplate {
    #[serde(alias = "path")]
    template_path: Option<PathBuf>,
    filename: Option<String>,
    size: Option<(u32, u32)>,
    background_color: Option<Vec<u8>>,
    #[serde(default)]
    elements: Vec<RawElement>,
    #[serde(default)]
    images: Vec<RawImageElement>,
    #[serde(default)]
    watermarks: Vec<RawWatermarkRef>,
    #[serde(default)]
    repeat: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVideo {
    movement: Option<String>,
    step: Option<u32>,
    frames: Option<u32>,
    fps: Option<u32>,
    format: Option<(u32, u32)>,
    start_zoom: Option<f64>,
    filename: Option<String>,
    #[serde(default)]
    watermarks: Vec<RawWatermarkRef>,
}

/// Loaded configuration: every product type plus the global pools.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub product_types: BTreeMap<String, Arc<ProductType>>,
    pub global_formats: Vec<Format>,
    pub global_watermarks: BTreeMap<String, Watermark>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PicGeniusError::configuration(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&text, base_dir)
    }

    /// Parse YAML text; relative paths are resolved against `base_dir`.
    pub fn from_yaml_str(text: &str, base_dir: &Path) -> Result<Self> {
        let raw: RawConfig = if text.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        let loader = Loader { base_dir };

        let global_formats = match raw.global.formats {
            Some(formats) => loader
                .formats(formats)
                .map_err(context("global formats"))?,
            None => Vec::new(),
        };
        let mut global_watermarks = BTreeMap::new();
        for (name, watermark) in raw.global.watermarks {
            let watermark = loader
                .watermark(watermark)
                .map_err(context(&format!("global watermark \"{}\"", name)))?;
            global_watermarks.insert(name, watermark);
        }

        let mut product_types = BTreeMap::new();
        for (name, raw_type) in raw.product_types {
            let product_type = loader
                .product_type(raw_type, &global_formats, &global_watermarks)
                .map_err(context(&format!("product type \"{}\"", name)))?;
            debug!(
                product_type = %name,
                templates = product_type.templates.len(),
                formats = product_type.formats.len(),
                "loaded product type"
            );
            product_types.insert(name, Arc::new(product_type));
        }

        Ok(Self {
            product_types,
            global_formats,
            global_watermarks,
        })
    }

    pub fn product_type(&self, name: &str) -> Result<Arc<ProductType>> {
        self.product_types.get(name).cloned().ok_or_else(|| {
            let known: Vec<&str> = self.product_types.keys().map(String::as_str).collect();
            PicGeniusError::configuration(format!(
                "Product type \"{}\" not found in config (known: {})",
                name,
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            ))
        })
    }
}

/// Prefix configuration errors with where they happened.
fn context(location: &str) -> impl Fn(PicGeniusError) -> PicGeniusError + '_ {
    move |err| match err {
        PicGeniusError::Configuration(msg) => {
            PicGeniusError::Configuration(format!("{}: {}", location, msg))
        }
        other => other,
    }
}

fn parse_color(values: &[u8]) -> Result<Rgba<u8>> {
    match *values {
        [r, g, b] => Ok(Rgba([r, g, b, 255])),
        [r, g, b, a] => Ok(Rgba([r, g, b, a])),
        _ => Err(PicGeniusError::configuration(format!(
            "color must have 3 or 4 components, got {}",
            values.len()
        ))),
    }
}

fn parse_transparency(value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PicGeniusError::configuration(format!(
            "transparency must be within [0, 1], got {}",
            value
        )))
    }
}

fn parse_axis(axis: Axis, value: RawAxis) -> Result<AxisPosition> {
    match value {
        RawAxis::Pixels(px) => Ok(AxisPosition::Pixels(px)),
        RawAxis::Keyword(keyword) => AxisPosition::from_keyword(axis, &keyword),
    }
}

fn parse_position(value: Option<(RawAxis, RawAxis)>) -> Result<Position2D> {
    match value {
        Some((x, y)) => Ok(Position2D {
            x: parse_axis(Axis::Horizontal, x)?,
            y: parse_axis(Axis::Vertical, y)?,
        }),
        None => Ok(Position2D::CENTER),
    }
}

fn parse_dimension(value: RawDimension) -> Result<Dimension> {
    match value {
        RawDimension::Pixels(px) => Ok(Dimension::Pixels(px)),
        RawDimension::Text(text) => Dimension::parse(&text),
    }
}

fn parse_placement(position: RawPosition, size: ElementSize) -> Result<Placement> {
    match position {
        RawPosition::Point(point) => match point.as_slice() {
            &[x, y] => Ok(Placement::AxisAligned {
                position: (x, y),
                size,
            }),
            other => Err(PicGeniusError::configuration(format!(
                "invalid position arity {}: expected [x, y] or four [x, y] corners",
                other.len()
            ))),
        },
        RawPosition::Corners(corners) => {
            if corners.len() != 4 {
                return Err(PicGeniusError::configuration(format!(
                    "invalid position arity {}: a perspective position needs four [x, y] corners",
                    corners.len()
                )));
            }
            let mut points = [(0i64, 0i64); 4];
            for (slot, corner) in points.iter_mut().zip(&corners) {
                match corner.as_slice() {
                    &[x, y] => *slot = (x, y),
                    other => {
                        return Err(PicGeniusError::configuration(format!(
                            "invalid position corner with {} values: expected [x, y]",
                            other.len()
                        )))
                    }
                }
            }
            Ok(Placement::Perspective { corners: points })
        }
    }
}

struct Loader<'a> {
    base_dir: &'a Path,
}

impl Loader<'_> {
    fn resolve_path(&self, path: PathBuf) -> PathBuf {
        if path.is_relative() {
            self.base_dir.join(path)
        } else {
            path
        }
    }

    fn formats(&self, raw: Vec<RawFormat>) -> Result<Vec<Format>> {
        raw.into_iter()
            .enumerate()
            .map(|(index, format)| {
                if format.ppi == 0 || format.inches.0 == 0 || format.inches.1 == 0 {
                    return Err(PicGeniusError::configuration(format!(
                        "format #{}: ppi and inches must be greater than 0",
                        index
                    )));
                }
                Ok(Format {
                    ppi: format.ppi,
                    inches: format.inches,
                    extension: format
                        .extension
                        .unwrap_or_else(|| Format::DEFAULT_EXTENSION.to_string()),
                })
            })
            .collect()
    }

    fn watermark(&self, raw: RawWatermark) -> Result<Watermark> {
        let textbox = match raw.textbox {
            Some(textbox) => {
                let padding = match textbox.padding {
                    Some(RawPadding::Uniform(p)) => Padding::uniform(p),
                    Some(RawPadding::Sides(values)) => Padding::from_values(&values)?,
                    None => Padding::default(),
                };
                Some(Textbox {
                    color: parse_color(&textbox.color)?,
                    padding,
                })
            }
            None => None,
        };

        let mut watermark = Watermark::new(self.resolve_path(raw.font_path), raw.text);
        if let Some(color) = raw.color {
            watermark.color = parse_color(&color)?;
        }
        watermark.position = parse_position(raw.position)?;
        if let Some(width) = raw.width {
            watermark.width = parse_dimension(width)?;
        }
        watermark.margin = raw.margin;
        watermark.textbox = textbox;
        Ok(watermark)
    }

    /// Product-type pool first, then the global pool.
    fn watermark_ref(
        &self,
        raw: RawWatermarkRef,
        local: &BTreeMap<String, Watermark>,
        global: &BTreeMap<String, Watermark>,
    ) -> Result<Watermark> {
        match raw {
            RawWatermarkRef::Named(name) => local
                .get(&name)
                .or_else(|| global.get(&name))
                .cloned()
                .ok_or_else(|| {
                    PicGeniusError::configuration(format!("watermark \"{}\" not found", name))
                }),
            RawWatermarkRef::Inline(raw) => self.watermark(raw),
        }
    }

    fn element(&self, raw: RawElement) -> Result<TemplateElement> {
        let zero_size = raw.size.is_some_and(|(width, height)| width == 0 || height == 0);
        if zero_size || raw.width == Some(0) || raw.height == Some(0) {
            return Err(PicGeniusError::configuration(
                "element size, width and height must be greater than 0",
            ));
        }
        let size = ElementSize::from_parts(raw.size, raw.width, raw.height);
        let mut element = TemplateElement::new(parse_placement(raw.position, size)?);

        if let Some(ratio) = raw.ratio {
            if ratio.0 == 0 || ratio.1 == 0 {
                return Err(PicGeniusError::configuration(
                    "ratio components must be greater than 0",
                ));
            }
            element.ratio = Some(ratio);
        }
        if let Some(zoom) = raw.zoom {
            if !zoom.is_finite() || zoom < 1.0 {
                return Err(PicGeniusError::configuration(format!(
                    "zoom must be at least 1, got {}",
                    zoom
                )));
            }
            element.zoom = Some(zoom);
        }
        element.zoom_position = raw.zoom_position;
        element.overlay = raw.overlay.as_deref().map(parse_color).transpose()?;
        element.transparency = raw.transparency.map(parse_transparency).transpose()?;
        Ok(element)
    }

    fn image_element(&self, raw: RawImageElement) -> Result<TemplateImageElement> {
        let mut element = TemplateImageElement::new(self.resolve_path(raw.path));
        element.position = parse_position(raw.position)?;
        element.width = raw.width.map(parse_dimension).transpose()?;
        element.height = raw.height.map(parse_dimension).transpose()?;
        element.margin = raw.margin;
        if let Some(transparency) = raw.transparency {
            element.transparency = parse_transparency(transparency)?;
        }
        Ok(element)
    }

    fn template(
        &self,
        raw: RawTemplate,
        local: &BTreeMap<String, Watermark>,
        global: &BTreeMap<String, Watermark>,
    ) -> Result<Template> {
        let mut template = match (raw.template_path, raw.filename) {
            (Some(path), filename) => {
                let mut template = Template::from_path(self.resolve_path(path));
                if let Some(filename) = filename {
                    template = Template::new(filename, template.background);
                }
                template
            }
            (None, Some(filename)) => {
                let color = raw
                    .background_color
                    .as_deref()
                    .map(parse_color)
                    .transpose()?
                    .unwrap_or(TemplateBackground::DEFAULT_CANVAS_COLOR);
                let size = raw.size.unwrap_or(TemplateBackground::DEFAULT_CANVAS_SIZE);
                if size.0 == 0 || size.1 == 0 {
                    return Err(PicGeniusError::configuration(
                        "canvas size must be greater than 0",
                    ));
                }
                Template::new(filename, TemplateBackground::Canvas { size, color })
            }
            (None, None) => {
                return Err(PicGeniusError::configuration(
                    "a template needs a template_path or a filename",
                ))
            }
        };

        for (index, element) in raw.elements.into_iter().enumerate() {
            let element = self
                .element(element)
                .map_err(context(&format!("element #{}", index)))?;
            template.elements.push(element);
        }
        for (index, image) in raw.images.into_iter().enumerate() {
            let image = self
                .image_element(image)
                .map_err(context(&format!("image #{}", index)))?;
            template.images.push(image);
        }
        for watermark in raw.watermarks {
            template
                .watermarks
                .push(self.watermark_ref(watermark, local, global)?);
        }
        template.repeat = raw.repeat;
        Ok(template)
    }

    fn video(
        &self,
        raw: RawVideo,
        local: &BTreeMap<String, Watermark>,
        global: &BTreeMap<String, Watermark>,
    ) -> Result<VideoSettings> {
        let defaults = VideoSettings::default();
        let settings = VideoSettings {
            movement: match raw.movement {
                Some(movement) => movement.parse::<Movement>()?,
                None => defaults.movement,
            },
            step: raw.step.unwrap_or(defaults.step),
            frames: raw.frames.unwrap_or(defaults.frames),
            fps: raw.fps.unwrap_or(defaults.fps),
            format: raw.format.unwrap_or(defaults.format),
            start_zoom: raw.start_zoom.unwrap_or(defaults.start_zoom),
            filename: raw.filename.unwrap_or(defaults.filename),
            watermarks: raw
                .watermarks
                .into_iter()
                .map(|watermark| self.watermark_ref(watermark, local, global))
                .collect::<Result<_>>()?,
        };

        if settings.step == 0 || settings.frames == 0 || settings.fps == 0 {
            return Err(PicGeniusError::configuration(
                "video step, frames and fps must be greater than 0",
            ));
        }
        if settings.format.0 == 0 || settings.format.1 == 0 {
            return Err(PicGeniusError::configuration(
                "video format dimensions must be greater than 0",
            ));
        }
        // yuv420p subsamples chroma by two on both axes.
        if settings.format.0 % 2 != 0 || settings.format.1 % 2 != 0 {
            return Err(PicGeniusError::configuration(format!(
                "video format dimensions must be even, got [{}, {}]",
                settings.format.0, settings.format.1
            )));
        }
        if !settings.start_zoom.is_finite() || settings.start_zoom < 100.0 {
            return Err(PicGeniusError::configuration(format!(
                "video start_zoom is a percentage of at least 100, got {}",
                settings.start_zoom
            )));
        }
        Ok(settings)
    }

    fn product_type(
        &self,
        raw: RawProductType,
        global_formats: &[Format],
        global_watermarks: &BTreeMap<String, Watermark>,
    ) -> Result<ProductType> {
        if raw.designs_count == 0 {
            return Err(PicGeniusError::configuration(
                "designs-count must be at least 1",
            ));
        }

        let formats = match raw.formats {
            Some(formats) => self.formats(formats)?,
            None => global_formats.to_vec(),
        };

        let mut watermarks = BTreeMap::new();
        for (name, watermark) in raw.watermarks {
            let watermark = self
                .watermark(watermark)
                .map_err(context(&format!("watermark \"{}\"", name)))?;
            watermarks.insert(name, watermark);
        }

        let mut templates = Vec::with_capacity(raw.templates.len());
        for (index, template) in raw.templates.into_iter().enumerate() {
            let label = template
                .filename
                .clone()
                .or_else(|| {
                    template
                        .template_path
                        .as_ref()
                        .map(|path| path.display().to_string())
                })
                .unwrap_or_else(|| "?".to_string());
            let template = self
                .template(template, &watermarks, global_watermarks)
                .map_err(context(&format!("template '{}' (#{})", label, index)))?;
            templates.push(template);
        }

        let video_settings = raw
            .video
            .map(|video| self.video(video, &watermarks, global_watermarks))
            .transpose()
            .map_err(context("video"))?;

        Ok(ProductType {
            designs_count: raw.designs_count,
            formats,
            templates,
            watermarks,
            video_settings,
        })
    }
}
