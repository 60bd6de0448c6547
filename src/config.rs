// imgchain/src/config.rs
//! Batch config files.
//!
//! ```json
//! {
//!   "images": [
//!     { "input": "photos/cat.jpg", "output": "out/", "operations": {
//!         "convert": { "format": "webp" },
//!         "resize": { "width": 800, "height": 600, "fit": "inside" },
//!         "compress": { "quality": 75 }
//!     } },
//!     { "input": "photos/raw", "output": "out/raw", "operations": { "compress": {} } }
//!   ]
//! }
//! ```

use crate::core::{ImageToolError, OperationSpec, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub operations: OperationSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BatchConfig {
    pub images: Vec<BatchEntry>,
}

impl BatchConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: BatchConfig = serde_json::from_str(json)
            .map_err(|e| ImageToolError::Config(format!("Invalid batch config: {}", e)))?;

        if config.images.is_empty() {
            return Err(ImageToolError::Config(
                "Batch config lists no images".to_string(),
            ));
        }

        Ok(config)
    }

    /// Relative entry paths are taken relative to `base`.
    pub fn rebase(mut self, base: &Path) -> Self {
        for entry in &mut self.images {
            if entry.input.is_relative() {
                entry.input = base.join(&entry.input);
            }
            if entry.output.is_relative() {
                entry.output = base.join(&entry.output);
            }
        }
        self
    }
}

/// Reads a batch config; relative paths inside it resolve against the
/// config file's directory.
pub fn load_batch_config(path: &Path) -> Result<BatchConfig> {
    let json = std::fs::read_to_string(path).map_err(|e| {
        ImageToolError::Config(format!("Cannot read {}: {}", path.display(), e))
    })?;

    let config = BatchConfig::from_json(&json)?;
    log::debug!(
        "Loaded {} batch entries from {}",
        config.images.len(),
        path.display()
    );

    match path.parent() {
        Some(base) if !base.as_os_str().is_empty() => Ok(config.rebase(base)),
        _ => Ok(config),
    }
}
