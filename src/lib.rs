//! PicGenius Library
//!
//! Batch generation of marketing visuals for print-on-demand designs:
//! designs are composited into mock-up templates (axis-aligned or
//! perspective-warped), watermarked, resized to print formats and turned into
//! short preview videos.
//!
//! # Module Overview
//!
//! - [`config`] - YAML configuration loading into the typed model
//! - [`types`] - Product, template, watermark and video types
//! - [`geometry`] - Crop, resize, overlay and perspective utilities
//! - [`text`] - Font loading, text measurement and drawing
//! - [`render`] - Template, watermark, format and video renderers
//! - [`controller`] - Runs renderers over every discovered product
//! - [`encode`] - ffmpeg-backed mp4 encoding
//! - [`upscale`] - Integer-factor design upscaling
//! - [`output`] - JSON run report schemas
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use picgenius_lib::{Config, Controller, ControllerOptions};
//!
//! # fn example() -> picgenius_lib::Result<()> {
//! let config = Config::load(Path::new("picgenius.yml"))?;
//! let product_type = config.product_type("poster")?;
//! let controller = Controller::new(
//!     "./workdir/designs",
//!     Some(product_type),
//!     ControllerOptions::default(),
//! )?;
//! controller.generate_templates(Path::new("./workdir/products"))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod geometry;
pub mod image_loader;
pub mod output;
pub mod progress;
pub mod render;
pub mod text;
pub mod types;
pub mod upscale;
pub mod worker;

pub use config::{Config, DEFAULT_CONFIG_FILE};
pub use controller::{Controller, ControllerOptions};
pub use error::{ErrorCategory, ErrorPayload, PicGeniusError, Result};
pub use image_loader::{load_image, save_image, ImageLoadError};
pub use output::{
    ErrorReport, PicGeniusOutput, ProductSummary, RunReport, PICGENIUS_OUTPUT_VERSION,
};
pub use progress::ProgressCallback;
pub use render::DesignSelection;
pub use types::{
    Design, Format, Movement, Product, ProductType, Template, TemplateElement, VideoSettings,
    Watermark,
};
pub use upscale::{UpscaleOptions, SUPPORTED_SCALES};
pub use worker::{WorkerPool, DEFAULT_MAX_THREADS};
