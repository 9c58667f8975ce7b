use crate::error::ErrorPayload;
use crate::types::Product;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Schema version for output payloads.
pub const PICGENIUS_OUTPUT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum PicGeniusOutput {
    Run(RunReport),
    Error(ErrorReport),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub version: String,
    /// Command that produced the report, e.g. `generate templates`.
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSummary>,
    pub output_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub written: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(
        command: impl Into<String>,
        product_type: Option<String>,
        products: &[Product],
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            version: PICGENIUS_OUTPUT_VERSION.to_string(),
            command: command.into(),
            product_type,
            products: products.iter().map(ProductSummary::from).collect(),
            output_dir: output_dir.into(),
            written: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub name: String,
    pub designs: Vec<String>,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            designs: product.designs.iter().map(|d| d.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub version: String,
    pub error: ErrorPayload,
}
