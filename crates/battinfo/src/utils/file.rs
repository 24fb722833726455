use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use battinfo_core::Settings;

/// Prefix of the output file name, followed by the workbook name.
const OUTPUT_PREFIX: &str = "BattINFO_converter_";

/// Load converter settings, falling back to the defaults when no file is given
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Ok(Settings::default()),
    }
}

/// `BattINFO_converter_<workbook>.json` in the current directory
pub fn default_output_path(dir: &Path) -> PathBuf {
    let base = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()?
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "workbook".to_string());
    PathBuf::from(format!("{OUTPUT_PREFIX}{base}.json"))
}
