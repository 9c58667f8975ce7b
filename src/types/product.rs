use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;

use super::template::Template;
use super::video::VideoSettings;
use super::watermark::Watermark;
use crate::discovery::{extract_filename, find_image_file_paths};
use crate::error::{PicGeniusError, Result};
use crate::image_loader::load_image;

/// A source artwork, named after its file stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Design {
    pub path: PathBuf,
    pub name: String,
}

impl Design {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (_, name) = extract_filename(&path);
        Self { path, name }
    }

    pub fn load_image(&self) -> Result<DynamicImage> {
        Ok(load_image(&self.path)?)
    }
}

/// Physical print size at a given resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub ppi: u32,
    pub inches: (u32, u32),
    pub extension: String,
}

impl Format {
    pub const DEFAULT_EXTENSION: &'static str = "jpg";

    pub fn new(ppi: u32, inches: (u32, u32)) -> Self {
        Self {
            ppi,
            inches,
            extension: Self::DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.inches.0.saturating_mul(self.ppi),
            self.inches.1.saturating_mul(self.ppi),
        )
    }

    /// `<design>-<w>-<h>.<ext>` with the size in inches.
    pub fn filename(&self, design_name: &str) -> String {
        format!(
            "{}-{}-{}.{}",
            design_name, self.inches.0, self.inches.1, self.extension
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductType {
    pub designs_count: usize,
    pub formats: Vec<Format>,
    pub templates: Vec<Template>,
    pub watermarks: BTreeMap<String, Watermark>,
    pub video_settings: Option<VideoSettings>,
}

/// A design folder (or single design file) bound to its product type.
#[derive(Debug, Clone)]
pub struct Product {
    pub name: String,
    pub design_path: PathBuf,
    pub product_type: Arc<ProductType>,
    pub designs: Vec<Design>,
}

impl Product {
    /// Resolve the designs under `design_path` and check their count.
    pub fn new(product_type: Arc<ProductType>, design_path: impl AsRef<Path>) -> Result<Self> {
        let raw = design_path.as_ref().to_string_lossy();
        let trimmed = raw.trim_end_matches('/');
        let design_path = PathBuf::from(if trimmed.is_empty() { "/" } else { trimmed });

        let designs = find_image_file_paths(&design_path)?
            .into_iter()
            .map(Design::new)
            .collect();
        let (_, name) = extract_filename(&design_path);
        Self::with_designs(product_type, name, design_path, designs)
    }

    pub fn with_designs(
        product_type: Arc<ProductType>,
        name: impl Into<String>,
        design_path: impl Into<PathBuf>,
        designs: Vec<Design>,
    ) -> Result<Self> {
        let name = name.into();
        if designs.len() != product_type.designs_count {
            return Err(PicGeniusError::validation(format!(
                "product \"{}\": the number of designs doesn't match the product type count: {} != {}",
                name,
                designs.len(),
                product_type.designs_count
            )));
        }
        Ok(Self {
            name,
            design_path: design_path.into(),
            product_type,
            designs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn product_type(designs_count: usize) -> Arc<ProductType> {
        Arc::new(ProductType {
            designs_count,
            ..ProductType::default()
        })
    }

    #[test]
    fn format_pixel_size_and_filename() {
        let format = Format::new(300, (8, 10));
        assert_eq!(format.pixel_size(), (2400, 3000));
        assert_eq!(format.filename("sunset"), "sunset-8-10.jpg");
    }

    #[test]
    fn product_is_named_after_its_folder() {
        let dir = TempDir::new().expect("tempdir");
        let folder = dir.path().join("duo");
        std::fs::create_dir(&folder).expect("dir");
        File::create(folder.join("left.png")).expect("file");
        File::create(folder.join("right.png")).expect("file");

        let with_slash = format!("{}/", folder.display());
        let product = Product::new(product_type(2), &with_slash).expect("product");
        assert_eq!(product.name, "duo");
        assert_eq!(product.design_path, folder);
        let names: Vec<_> = product.designs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["left", "right"]);
    }

    #[test]
    fn design_count_mismatch_is_a_validation_error() {
        let dir = TempDir::new().expect("tempdir");
        File::create(dir.path().join("only.png")).expect("file");

        let err = Product::new(product_type(2), dir.path()).unwrap_err();
        assert!(matches!(err, PicGeniusError::Validation(_)));
        assert!(err.to_string().contains("1 != 2"));
    }
}
