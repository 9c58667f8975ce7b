//! Compositing pipeline: designs into templates, watermarks, print formats
//! and preview videos.

pub mod batch;
pub mod design;
pub mod product;
pub mod template;
pub mod video;
pub mod watermark;

pub use batch::{assign_design_indices, generate_templates, next_designs, slot_indices, TemplateBatch};
pub use design::{format_design, generate_design_formats};
pub use product::{DesignSelection, FORMATTED_DESIGNS_FOLDER, VISUALS_FOLDER};
pub use template::{design_pre_treatment, generate_template, integrate_element, render_template};
pub use video::{generate_video, generate_video_with_rng, VideoClip};
pub use watermark::{apply_watermarking, apply_watermarks};
