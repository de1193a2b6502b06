// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! dicomfmt: DICOM folder organizer
//!
//! Groups DICOM files by SeriesInstanceUID and lays them out as
//! `target/PatientName/SeriesDescription/<file>`, either copying from one or
//! more source trees or re-normalizing an organized tree in place.

pub mod classifier;
pub mod config;
pub mod error;
pub mod extract;
pub mod journal;
pub mod organize;
pub mod paths;
pub mod placement;
pub mod series;

pub use config::AppConfig;
pub use error::{DicomfmtError, Result};
pub use extract::{DicomExtractor, FieldExtractor, RecordFields};
pub use organize::{Organizer, RunPlan};
pub use placement::Action;
