//! Locating design images and product folders on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PicGeniusError, Result};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
        .unwrap_or(false)
}

/// `(file_name, file_stem)` of `path`.
pub fn extract_filename(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    (file_name, stem)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| {
            PicGeniusError::resource(format!("Cannot list directory {}: {}", dir.display(), e))
        })?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

/// `path` itself when it is an image file, else the image files directly
/// inside the directory, sorted by name.
pub fn find_image_file_paths(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(if has_image_extension(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }
    if !path.is_dir() {
        return Err(PicGeniusError::resource(format!(
            "Design path not found: {}",
            path.display()
        )));
    }

    Ok(sorted_entries(path)?
        .into_iter()
        .filter(|entry| entry.is_file() && has_image_extension(entry))
        .collect())
}

fn is_directory_with_n_image_files(path: &Path, count: usize) -> Result<bool> {
    Ok(path.is_dir() && find_image_file_paths(path)?.len() == count)
}

/// Paths that each form one product of `designs_count` designs.
///
/// Single-design products are the image files themselves. Multi-design
/// products are directories holding exactly `designs_count` images: `path`
/// itself when it qualifies, else its qualifying direct subdirectories.
pub fn find_product_paths(designs_count: usize, path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(PicGeniusError::resource(format!(
            "Design path not found: {}",
            path.display()
        )));
    }
    if designs_count == 1 {
        return find_image_file_paths(path);
    }
    if !path.is_dir() {
        return Ok(Vec::new());
    }
    if is_directory_with_n_image_files(path, designs_count)? {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut products = Vec::new();
    for entry in sorted_entries(path)? {
        if is_directory_with_n_image_files(&entry, designs_count)? {
            products.push(entry);
        } else if entry.is_dir() {
            debug!(path = %entry.display(), designs_count, "skipping folder with a different design count");
        }
    }
    Ok(products)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        File::create(path).expect("create file");
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(has_image_extension(Path::new("a.PNG")));
        assert!(has_image_extension(Path::new("dir/b.jpeg")));
        assert!(!has_image_extension(Path::new("c.webp")));
        assert!(!has_image_extension(Path::new("png")));
    }

    #[test]
    fn extract_filename_splits_stem() {
        assert_eq!(
            extract_filename(Path::new("/designs/sunset.final.png")),
            ("sunset.final.png".to_string(), "sunset.final".to_string())
        );
    }

    #[test]
    fn image_files_are_sorted_and_filtered() {
        let dir = TempDir::new().expect("tempdir");
        touch(&dir.path().join("b.png"));
        touch(&dir.path().join("a.jpg"));
        touch(&dir.path().join("notes.txt"));
        fs::create_dir(dir.path().join("nested.png")).expect("dir");

        let found = find_image_file_paths(dir.path()).expect("list");
        let names: Vec<_> = found.iter().map(|p| extract_filename(p).0).collect();
        assert_eq!(names, ["a.jpg", "b.png"]);

        let single = find_image_file_paths(&dir.path().join("b.png")).expect("single");
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn multi_design_products_are_matching_subfolders() {
        let dir = TempDir::new().expect("tempdir");
        let pair = dir.path().join("pair");
        let triple = dir.path().join("triple");
        fs::create_dir(&pair).expect("dir");
        fs::create_dir(&triple).expect("dir");
        touch(&pair.join("1.png"));
        touch(&pair.join("2.png"));
        for name in ["1.png", "2.png", "3.png"] {
            touch(&triple.join(name));
        }

        assert_eq!(find_product_paths(2, dir.path()).expect("find"), vec![pair.clone()]);
        assert_eq!(find_product_paths(2, &pair).expect("find"), vec![pair]);
        assert_eq!(find_product_paths(1, &triple).expect("find").len(), 3);
    }

    #[test]
    fn missing_path_is_a_resource_error() {
        let err = find_product_paths(1, Path::new("/nonexistent/designs")).unwrap_err();
        assert!(matches!(err, PicGeniusError::Resource(_)));
    }
}
