use std::path::Path;

use picgenius_lib::{Config, PicGeniusError};
use tracing::debug;

/// Load the YAML config, naming the file in configuration errors.
pub fn load_config(path: &Path) -> Result<Config, PicGeniusError> {
    Config::load(path).map_err(|err| match err {
        PicGeniusError::Configuration(msg) if !msg.contains(&path.display().to_string()) => {
            PicGeniusError::Configuration(format!("Invalid config ({}): {}", path.display(), msg))
        }
        other => other,
    })
}

/// Log effective settings (visible with --verbose).
pub fn log_effective_settings(config_path: &Path, config: &Config, threads: usize) {
    debug!("{}", format_effective_settings(config_path, config, threads));
}

/// Format effective settings as a single-line string.
pub fn format_effective_settings(config_path: &Path, config: &Config, threads: usize) -> String {
    let product_types: Vec<&str> = config.product_types.keys().map(String::as_str).collect();
    let watermarks: Vec<&str> = config.global_watermarks.keys().map(String::as_str).collect();
    format!(
        "Effective settings [{}]: threads={}, product_types=[{}], global_formats={}, global_watermarks=[{}]",
        config_path.display(),
        threads,
        product_types.join(", "),
        config.global_formats.len(),
        watermarks.join(", ")
    )
}
