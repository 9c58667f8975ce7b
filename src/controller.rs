//! Runs renderers over every product discovered under a design path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::discovery::find_product_paths;
use crate::error::{PicGeniusError, Result};
use crate::progress::{report, ProgressCallback};
use crate::render::product::{self, DesignSelection};
use crate::types::{Product, ProductType};
use crate::upscale::{upscale_designs, UpscaleOptions};
use crate::worker::{WorkerPool, DEFAULT_MAX_THREADS};

#[derive(Clone, Default)]
pub struct ControllerOptions {
    /// Worker threads; `None` uses [`DEFAULT_MAX_THREADS`].
    pub threads: Option<usize>,
    pub progress: Option<ProgressCallback>,
}

pub struct Controller {
    design_path: PathBuf,
    products: Vec<Product>,
    pool: WorkerPool,
    progress: Option<ProgressCallback>,
}

impl Controller {
    /// Discover products under `design_path`. Without a product type no
    /// products are built, which is enough for upscaling.
    pub fn new(
        design_path: impl Into<PathBuf>,
        product_type: Option<Arc<ProductType>>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let design_path = design_path.into();
        let products = match product_type {
            Some(product_type) => Self::create_products(&product_type, &design_path)?,
            None => Vec::new(),
        };
        let pool = WorkerPool::new(options.threads.unwrap_or(DEFAULT_MAX_THREADS))?;
        Ok(Self {
            design_path,
            products,
            pool,
            progress: options.progress,
        })
    }

    pub fn create_products(product_type: &Arc<ProductType>, design_path: &Path) -> Result<Vec<Product>> {
        find_product_paths(product_type.designs_count, design_path)?
            .into_iter()
            .map(|path| Product::new(Arc::clone(product_type), path))
            .collect()
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    fn progress(&self, message: &str) {
        info!("{}", message);
        report(self.progress.as_ref(), message);
    }

    fn log_found_products(&self) {
        self.progress(&format!(
            "Found {} products in {}",
            self.products.len(),
            self.design_path.display()
        ));
        for product in &self.products {
            let designs: Vec<String> = product
                .designs
                .iter()
                .map(|design| design.path.display().to_string())
                .collect();
            self.progress(&format!("({}) {}", product.name, designs.join(", ")));
        }
    }

    /// Run `step` for every product in turn, bracketed by progress lines.
    fn for_each_product<F>(&self, label: &str, output_dir: &Path, mut step: F) -> Result<()>
    where
        F: FnMut(&Product) -> Result<()>,
    {
        self.log_found_products();
        for product in &self.products {
            self.progress(&format!("({}) Start {} generation", product.name, label));
            self.progress(&format!(
                "({}) output directory: {}",
                product.name,
                output_dir.join(&product.name).display()
            ));
            step(product)?;
            self.progress(&format!("({}) {} generation done", product.name, capitalize(label)));
        }
        Ok(())
    }

    /// Formats, templates then video for every product, products in parallel.
    pub fn generate_all(&self, output_dir: &Path) -> Result<()> {
        self.log_found_products();
        let jobs = self.products.iter().map(|product| {
            move || -> Result<()> {
                self.progress(&format!("({}) Start product all assets generation", product.name));
                self.progress(&format!(
                    "({}) output directory: {}",
                    product.name,
                    output_dir.join(&product.name).display()
                ));
                product::generate_formatted_designs(product, output_dir, &self.pool)?;
                product::generate_templates(product, output_dir, &self.pool)?;
                product::generate_video(product, output_dir, DesignSelection::default())?;
                self.progress(&format!("({}) All assets generation done", product.name));
                Ok(())
            }
        });
        self.pool.run_all(jobs).map(|_| ())
    }

    pub fn generate_templates(&self, output_dir: &Path) -> Result<()> {
        self.for_each_product("templates", output_dir, |product| {
            product::generate_templates(product, output_dir, &self.pool).map(|_| ())
        })
    }

    pub fn generate_video(&self, output_dir: &Path, selection: DesignSelection) -> Result<()> {
        self.for_each_product("video", output_dir, |product| {
            product::generate_video(product, output_dir, selection).map(|_| ())
        })
    }

    pub fn generate_formatted_designs(&self, output_dir: &Path) -> Result<()> {
        self.for_each_product("formatted designs", output_dir, |product| {
            product::generate_formatted_designs(product, output_dir, &self.pool).map(|_| ())
        })
    }

    /// Upscale the designs found directly at the design path.
    pub fn upscale_designs(&self, output_dir: &Path, options: &UpscaleOptions) -> Result<Vec<PathBuf>> {
        options.validate()?;
        self.progress(&format!(
            "Start x{} upscale of {}",
            options.scale,
            self.design_path.display()
        ));
        let written = upscale_designs(&self.design_path, output_dir, options)?;
        if written.is_empty() {
            return Err(PicGeniusError::validation(format!(
                "no design found to upscale in {}",
                self.design_path.display()
            )));
        }
        self.progress(&format!("x{} upscale done ({} designs)", options.scale, written.len()));
        Ok(written)
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementSize, Format, Template, TemplateBackground, TemplateElement};
    use image::{Rgba, RgbaImage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn single_design_type() -> Arc<ProductType> {
        let template = Template::new(
            "framed.png",
            TemplateBackground::Canvas {
                size: (30, 30),
                color: Rgba([255, 255, 255, 255]),
            },
        )
        .with_elements(vec![TemplateElement::axis_aligned(
            (5, 5),
            ElementSize::Exact { width: 20, height: 20 },
        )]);
        Arc::new(ProductType {
            designs_count: 1,
            formats: vec![Format::new(10, (2, 2))],
            templates: vec![template],
            ..ProductType::default()
        })
    }

    fn designs_dir() -> TempDir {
        let dir = TempDir::new().expect("tempdir");
        for (name, color) in [("one.png", [200, 0, 0, 255]), ("two.png", [0, 200, 0, 255])] {
            RgbaImage::from_pixel(16, 16, Rgba(color))
                .save(dir.path().join(name))
                .expect("save design");
        }
        dir
    }

    #[test]
    fn each_image_is_a_product_for_single_design_types() {
        let designs = designs_dir();
        let controller =
            Controller::new(designs.path(), Some(single_design_type()), ControllerOptions::default())
                .expect("controller");
        let names: Vec<_> = controller.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["one", "two"]);
    }

    #[test]
    fn generate_all_writes_every_asset_and_reports_progress() {
        let designs = designs_dir();
        let output = TempDir::new().expect("tempdir");
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let options = ControllerOptions {
            threads: Some(2),
            progress: Some(Arc::new(move |line: &str| {
                sink.lock().unwrap().push(line.to_string());
            })),
        };

        let controller =
            Controller::new(designs.path(), Some(single_design_type()), options).expect("controller");
        controller.generate_all(output.path()).expect("generate all");

        for product in ["one", "two"] {
            let root = output.path().join(product);
            assert!(root.join("formatted").join(format!("{product}-2-2.jpg")).is_file());
            assert!(root.join("visuals/framed.png").is_file());
        }
        let lines = lines.lock().unwrap();
        let found = format!("Found 2 products in {}", designs.path().display());
        assert!(lines.contains(&found));
        assert!(lines.contains(&"(one) All assets generation done".to_string()));
    }

    #[test]
    fn templates_only_run_reports_per_product() {
        let designs = designs_dir();
        let output = TempDir::new().expect("tempdir");
        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = Arc::clone(&lines);
        let options = ControllerOptions {
            threads: Some(1),
            progress: Some(Arc::new(move |line: &str| {
                sink.lock().unwrap().push(line.to_string());
            })),
        };
        let controller =
            Controller::new(designs.path(), Some(single_design_type()), options).expect("controller");
        controller.generate_templates(output.path()).expect("templates");

        assert!(output.path().join("two/visuals/framed.png").is_file());
        assert!(!output.path().join("two/formatted").exists());
        let lines = lines.lock().unwrap();
        assert!(lines.contains(&"(two) Start templates generation".to_string()));
        assert!(lines.contains(&"(two) Templates generation done".to_string()));
    }

    #[test]
    fn upscale_without_designs_fails() {
        let empty = TempDir::new().expect("tempdir");
        let output = TempDir::new().expect("tempdir");
        let controller =
            Controller::new(empty.path(), None, ControllerOptions::default()).expect("controller");
        let err = controller
            .upscale_designs(output.path(), &UpscaleOptions::new(2))
            .unwrap_err();
        assert!(matches!(err, PicGeniusError::Validation(_)));
    }
}
