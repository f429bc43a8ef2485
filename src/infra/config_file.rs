// ============================================================
// Layer 6 — Config File
// ============================================================
// Reads and writes TrainConfig as JSON.
//
// Fields missing from the file fall back to TrainConfig's
// defaults (#[serde(default)]), so a file only needs the values
// that differ:
//
//   { "kind": "transformer", "hidden_size": 64, "base": 16 }
//
// Reference: serde_json crate documentation
//            Rust Book §9 (Error Handling)

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::application::train_use_case::TrainConfig;

/// Load a run configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainConfig> {
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

    let cfg = serde_json::from_str(&json)
        .with_context(|| format!("Invalid config JSON in '{}'", path.display()))?;

    tracing::debug!("Loaded training config from '{}'", path.display());
    Ok(cfg)
}

/// Write a run configuration as pretty-printed JSON.
pub fn save_config(path: impl AsRef<Path>, cfg: &TrainConfig) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create '{}'", dir.display()))?;
    }

    fs::write(path, serde_json::to_string_pretty(cfg)?)
        .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

    tracing::debug!("Saved training config to '{}'", path.display());
    Ok(())
}
