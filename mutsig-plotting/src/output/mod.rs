//! Output format handling for figures
//!
//! Figures are held in memory; the format only matters when one is written
//! to disk with [`crate::Figure::save`].

use anyhow::{anyhow, Result};
use std::path::Path;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Scalable Vector Graphics (default)
    Svg,
    /// Portable Network Graphics (requires `png` feature)
    Png,
}

impl OutputFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Detect format from a path, defaulting to SVG when there is no extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            None => Ok(Self::Svg),
            Some(ext) => Self::from_extension(ext)
                .ok_or_else(|| anyhow!("Unsupported output format: {}", ext)),
        }
    }

    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Svg
    }
}
