//! Tool configuration, read from an optional JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use prism_export::{BakeMode, ExportFormat};
use prism_paint::MAX_TEXTURE_SIZE;
use serde::{Deserialize, Serialize};

/// Defaults applied when a command-line flag is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrismConfig {
    /// Edge length of generated gradient textures, in pixels.
    pub texture_size: u32,
    /// Format used when neither `--format` nor the output extension decides.
    pub export_format: ExportFormat,
    pub bake: BakeMode,
    /// Pretty-print JSON output.
    pub pretty: bool,
    /// Write ASCII STL instead of binary.
    pub stl_ascii: bool,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for PrismConfig {
    fn default() -> Self {
        Self {
            texture_size: 512,
            export_format: ExportFormat::Glb,
            bake: BakeMode::Baked,
            pretty: true,
            stl_ascii: false,
            log_filter: "info".to_string(),
        }
    }
}

impl PrismConfig {
    /// Load from `path`, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        anyhow::ensure!(
            (1..=MAX_TEXTURE_SIZE).contains(&config.texture_size),
            "textureSize must be between 1 and {MAX_TEXTURE_SIZE}"
        );
        Ok(config)
    }
}
