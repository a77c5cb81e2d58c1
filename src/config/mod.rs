// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for the screenshot gallery

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::classifier::{default_folder_rules, RuleKind};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Directory scanning
    #[serde(default)]
    pub scan: ScanConfig,

    /// Filename classification rules
    #[serde(default)]
    pub classification: ClassificationConfig,

    /// Thumbnail generation
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    /// Root folder used when none is given on the command line
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassificationConfig {
    /// Folder name → rule used for files directly inside it
    #[serde(default = "default_folder_rules")]
    pub folder_rules: BTreeMap<String, RuleKind>,
    /// Upper bound on cached classifications; unbounded when absent
    #[serde(default)]
    pub max_entries: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ThumbnailConfig {
    #[serde(default = "default_thumbnail_edge")]
    pub max_width: u32,
    #[serde(default = "default_thumbnail_edge")]
    pub max_height: u32,
    /// JPEG quality, 1-100
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Upper bound on cached thumbnails; unbounded when absent
    #[serde(default)]
    pub max_entries: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

// Default value functions
fn default_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png"].into_iter().map(String::from).collect()
}
fn default_thumbnail_edge() -> u32 { 200 }
fn default_quality() -> u8 { 70 }
fn default_db_path() -> String { "gallery.db".to_string() }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: None,
            extensions: default_extensions(),
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            folder_rules: default_folder_rules(),
            max_entries: None,
        }
    }
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_width: default_thumbnail_edge(),
            max_height: default_thumbnail_edge(),
            quality: default_quality(),
            max_entries: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content)
                .map_err(|e| crate::GalleryError::Config(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let t = &self.thumbnails;
        if t.max_width == 0 || t.max_height == 0 {
            return Err(crate::GalleryError::Config(
                "thumbnail bounds must be non-zero".to_string(),
            ));
        }
        if !(1..=100).contains(&t.quality) {
            return Err(crate::GalleryError::Config(format!(
                "thumbnail quality must be within 1-100, got {}",
                t.quality
            )));
        }
        if self.classification.max_entries == Some(0) || t.max_entries == Some(0) {
            return Err(crate::GalleryError::Config(
                "cache max_entries must be at least 1; omit it for no bound".to_string(),
            ));
        }
        if self.scan.extensions.is_empty() {
            return Err(crate::GalleryError::Config(
                "at least one image extension is required".to_string(),
            ));
        }
        Ok(())
    }
}
