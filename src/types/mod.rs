//! Typed, validated model shared read-only by every render step.
//!
//! - [`Template`], [`TemplateElement`], [`TemplateImageElement`] - mockup slots
//! - [`Watermark`], [`Textbox`], [`Padding`] - text overlays
//! - [`ProductType`], [`Product`], [`Design`], [`Format`] - what gets rendered
//! - [`VideoSettings`], [`Movement`] - preview videos

pub mod position;
pub mod product;
pub mod template;
pub mod video;
pub mod watermark;

pub use position::{resolve_axis, Anchor, Axis, AxisPosition, Dimension, Position2D};
pub use product::{Design, Format, Product, ProductType};
pub use template::{
    ElementSize, Placement, Template, TemplateBackground, TemplateElement, TemplateImageElement,
};
pub use video::{Movement, VideoSettings};
pub use watermark::{Padding, Textbox, Watermark};
