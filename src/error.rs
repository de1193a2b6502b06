// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for dicomfmt

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dicomfmt operations
pub type Result<T> = std::result::Result<T, DicomfmtError>;

/// dicomfmt error types
#[derive(Error, Debug)]
pub enum DicomfmtError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Must provide a directory to split")]
    EmptyPath,

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Extraction error: {0}")]
    Extract(String),

    #[error("Cannot create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot place {from:?} at {to:?}: {source}")]
    Placement {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DicomfmtError {
    /// Whether the error must stop the whole run rather than skip one item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CreateDir { .. } | Self::Placement { .. } | Self::Journal(_)
        )
    }
}
