// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Configuration management for dicomfmt

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Log skip decisions and soft errors
    #[serde(default)]
    pub verbose: bool,

    /// Text-file heuristic settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Destination tree settings
    #[serde(default)]
    pub placement: PlacementConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClassifierConfig {
    /// Number of decoded characters inspected before a file is called text
    #[serde(default = "default_probe_chars")]
    pub probe_chars: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlacementConfig {
    /// Permission bits for created directories (unix only)
    #[serde(default = "default_dir_mode")]
    pub dir_mode: u32,

    /// Append-only JSONL record of every placement
    #[serde(default)]
    pub journal_path: Option<String>,
}

// Default value functions
fn default_probe_chars() -> usize { 128 }
fn default_dir_mode() -> u32 { 0o750 }

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            probe_chars: default_probe_chars(),
        }
    }
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            dir_mode: default_dir_mode(),
            journal_path: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content).map_err(|e| {
                crate::DicomfmtError::Config(format!("Failed to parse config: {}", e))
            })?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    fn validate(&self) -> crate::Result<()> {
        if self.classifier.probe_chars == 0 {
            return Err(crate::DicomfmtError::Config(
                "classifier.probe_chars must be at least 1".to_string(),
            ));
        }
        if self.placement.dir_mode > 0o7777 {
            return Err(crate::DicomfmtError::Config(format!(
                "placement.dir_mode {:o} is not a permission mode",
                self.placement.dir_mode
            )));
        }
        Ok(())
    }
}
