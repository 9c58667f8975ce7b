use crate::image_loader::ImageLoadError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PicGeniusError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Numeric error: {0}")]
    Numeric(String),

    #[error("Resource error: {0}")]
    Resource(String),

    #[error("Video encoding error: {0}")]
    Encode(String),

    #[error("{} of {total} jobs failed; first failure: {}", failures.len(), first_failure(failures))]
    Batch {
        total: usize,
        failures: Vec<PicGeniusError>,
    },
}

fn first_failure(failures: &[PicGeniusError]) -> String {
    failures
        .first()
        .map(|err| err.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl PicGeniusError {
    pub fn configuration(message: impl Into<String>) -> Self {
        PicGeniusError::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PicGeniusError::Validation(message.into())
    }

    pub fn numeric(message: impl Into<String>) -> Self {
        PicGeniusError::Numeric(message.into())
    }

    pub fn resource(message: impl Into<String>) -> Self {
        PicGeniusError::Resource(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        PicGeniusError::Encode(message.into())
    }

    /// Prefix the message with `location`, keeping the category.
    ///
    /// Wrapped IO and codec errors become Resource errors carrying their
    /// original text. Batch errors are returned unchanged.
    pub fn with_context(self, location: &str) -> Self {
        match self {
            PicGeniusError::Configuration(msg) => {
                PicGeniusError::Configuration(format!("{}: {}", location, msg))
            }
            PicGeniusError::Validation(msg) => {
                PicGeniusError::Validation(format!("{}: {}", location, msg))
            }
            PicGeniusError::Numeric(msg) => PicGeniusError::Numeric(format!("{}: {}", location, msg)),
            PicGeniusError::Resource(msg) => {
                PicGeniusError::Resource(format!("{}: {}", location, msg))
            }
            PicGeniusError::Encode(msg) => PicGeniusError::Encode(format!("{}: {}", location, msg)),
            err @ (PicGeniusError::Io(_)
            | PicGeniusError::Image(_)
            | PicGeniusError::Yaml(_)
            | PicGeniusError::Serialization(_)) => {
                PicGeniusError::Resource(format!("{}: {}", location, err))
            }
            batch @ PicGeniusError::Batch { .. } => batch,
        }
    }

    pub fn to_payload(&self) -> ErrorPayload {
        match self {
            PicGeniusError::Io(e) => ErrorPayload::new(
                ErrorCategory::Resource,
                e.to_string(),
                "Check file paths/permissions and free disk space.",
            ),
            PicGeniusError::Image(e) => ErrorPayload::new(
                ErrorCategory::Image,
                e.to_string(),
                "Verify the image path/format (png, jpg, jpeg) and that the file is readable.",
            ),
            PicGeniusError::Yaml(e) => ErrorPayload::new(
                ErrorCategory::Config,
                e.to_string(),
                "Fix the YAML syntax of the configuration file (see the reported line/column).",
            ),
            PicGeniusError::Serialization(e) => ErrorPayload::new(
                ErrorCategory::Unknown,
                e.to_string(),
                "Re-run with --verbose; file an issue if persistent.",
            ),
            PicGeniusError::Configuration(msg) => {
                let lower = msg.to_ascii_lowercase();
                let remediation = if lower.contains("product type") && lower.contains("not found")
                {
                    "Pass a --product-type that is declared under `product_types` in the config file."
                } else if lower.contains("watermark") && lower.contains("not found") {
                    "Declare the watermark under `global.watermarks` or the product type `watermarks`."
                } else if lower.contains("position") {
                    "Use [x, y] for axis-aligned elements or four [x, y] corners (TL, TR, BL, BR) for perspective elements; symbolic positions are left|center|right and top|center|bottom."
                } else if lower.contains("transparency") {
                    "Transparency must be a number between 0 and 1."
                } else if lower.contains("scale") {
                    "Use one of the supported scales: 2, 4, 8, 10, 12, 16."
                } else {
                    "Check the configuration file against the documented template/watermark keys."
                };
                ErrorPayload::new(ErrorCategory::Config, msg.to_string(), remediation)
            }
            PicGeniusError::Validation(msg) => ErrorPayload::new(
                ErrorCategory::Validation,
                msg.to_string(),
                "Make sure each product folder holds exactly `designs-count` images (png, jpg, jpeg).",
            ),
            PicGeniusError::Numeric(msg) => ErrorPayload::new(
                ErrorCategory::Numeric,
                msg.to_string(),
                "Check the four perspective corners: no three of them may be collinear.",
            ),
            PicGeniusError::Resource(msg) => {
                let remediation = if msg.to_ascii_lowercase().contains("ffmpeg") {
                    "Install ffmpeg and make sure the binary is on PATH."
                } else {
                    "Verify the file exists; relative config paths are resolved from the config file's directory."
                };
                ErrorPayload::new(ErrorCategory::Resource, msg.to_string(), remediation)
            }
            PicGeniusError::Encode(msg) => ErrorPayload::new(
                ErrorCategory::Encode,
                msg.to_string(),
                "Inspect the ffmpeg error output; even frame dimensions are required for mp4.",
            ),
            PicGeniusError::Batch { .. } => ErrorPayload::new(
                ErrorCategory::Batch,
                self.to_string(),
                "Re-run with --verbose to see every failed job.",
            ),
        }
    }
}

impl From<ImageLoadError> for PicGeniusError {
    fn from(err: ImageLoadError) -> Self {
        match err {
            ImageLoadError::Load(e) => PicGeniusError::Image(e),
            ImageLoadError::NotFound(path) => {
                PicGeniusError::Resource(format!("File not found: {}", path))
            }
            ImageLoadError::Save(msg) => PicGeniusError::Io(std::io::Error::other(format!(
                "Failed to save image: {}",
                msg
            ))),
        }
    }
}

pub type Result<T> = std::result::Result<T, PicGeniusError>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Config,
    Validation,
    Numeric,
    Resource,
    Image,
    Encode,
    Batch,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<String>,
}

impl ErrorPayload {
    pub fn new(category: ErrorCategory, message: String, remediation: impl Into<String>) -> Self {
        Self {
            category,
            message,
            remediation: Some(remediation.into()),
        }
    }
}
