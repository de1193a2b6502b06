// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Series discovery
//!
//! Walks a source tree and groups every DICOM file it finds by its
//! SeriesInstanceUID, no matter which subdirectory the file sits in.

use std::collections::hash_map::{self, Entry};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::classifier::TextClassifier;
use crate::extract::FieldExtractor;
use crate::paths::clean_path;
use crate::{DicomfmtError, Result};

/// All files of one series plus its display metadata.
///
/// The metadata comes from the first file seen for the series and is never
/// overwritten by later files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesGroup {
    pub patient_name: String,
    pub series_description: String,
    /// Files in discovery order
    pub files: Vec<PathBuf>,
}

/// Series of one source tree, keyed by SeriesInstanceUID
#[derive(Debug, Clone, Default)]
pub struct SeriesTable {
    groups: HashMap<String, SeriesGroup>,
}

impl SeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `other` into this table.
    ///
    /// File lists of a series present in both are concatenated; this table's
    /// metadata is kept.
    pub fn merge(&mut self, other: SeriesTable) {
        for (uid, group) in other.groups {
            match self.groups.entry(uid) {
                Entry::Occupied(mut existing) => existing.get_mut().files.extend(group.files),
                Entry::Vacant(slot) => {
                    slot.insert(group);
                }
            }
        }
    }

    /// Append a file to a series that is already known.
    ///
    /// Returns false when `uid` has no group yet.
    pub fn append(&mut self, uid: &str, file: PathBuf) -> bool {
        match self.groups.get_mut(uid) {
            Some(group) => {
                group.files.push(file);
                true
            }
            None => false,
        }
    }

    /// Start a new series seeded with a single file
    pub fn insert(
        &mut self,
        uid: String,
        patient_name: String,
        series_description: String,
        file: PathBuf,
    ) {
        self.groups.insert(
            uid,
            SeriesGroup {
                patient_name,
                series_description,
                files: vec![file],
            },
        );
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.groups.contains_key(uid)
    }

    pub fn get(&self, uid: &str) -> Option<&SeriesGroup> {
        self.groups.get(uid)
    }

    /// Iterate series in unspecified order
    pub fn iter(&self) -> hash_map::Iter<'_, String, SeriesGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of files across all series
    pub fn file_count(&self) -> usize {
        self.groups.values().map(|g| g.files.len()).sum()
    }
}

impl IntoIterator for SeriesTable {
    type Item = (String, SeriesGroup);
    type IntoIter = hash_map::IntoIter<String, SeriesGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}

/// Recursive scanner producing a [`SeriesTable`] per source root
pub struct SeriesAggregator<E> {
    classifier: TextClassifier,
    extractor: E,
    verbose: bool,
}

impl<E: FieldExtractor> SeriesAggregator<E> {
    pub fn new(classifier: TextClassifier, extractor: E, verbose: bool) -> Self {
        Self {
            classifier,
            extractor,
            verbose,
        }
    }

    /// Group every file under `dir` by series.
    ///
    /// Unreadable subdirectories and files that are not usable records are
    /// logged and skipped. Only an empty path or an unreadable `dir` itself
    /// is an error.
    pub fn split_series(&self, dir: &Path) -> Result<SeriesTable> {
        if dir.as_os_str().is_empty() {
            return Err(DicomfmtError::EmptyPath);
        }

        let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        entries.sort_by_key(|e| e.file_name());

        let mut table = SeriesTable::new();
        for entry in entries {
            let path = clean_path(&dir.join(entry.file_name()));
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir {
                match self.split_series(&path) {
                    Ok(sub) => table.merge(sub),
                    Err(e) => warn!("Skipping directory {:?}: {}", path, e),
                }
            } else {
                self.add_file(&mut table, path);
            }
        }

        Ok(table)
    }

    fn add_file(&self, table: &mut SeriesTable, path: PathBuf) {
        if self.classifier.is_likely_text_file(&path) {
            if self.verbose {
                debug!("Skipping {:?}: not a DICOM file", path);
            }
            return;
        }

        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) => {
                warn!("Cannot read {:?}: {}", path, e);
                return;
            }
        };

        let fields = match self.extractor.extract(&bytes) {
            Ok(f) => f,
            Err(e) => {
                warn!("{:?} parser error: {}", path, e);
                return;
            }
        };

        let uid = match fields.series_instance_uid.filter(|uid| !uid.is_empty()) {
            Some(uid) => uid,
            None => {
                warn!("Could not find SeriesInstanceUID in {:?}", path);
                return;
            }
        };

        if table.contains(&uid) {
            table.append(&uid, path);
            return;
        }

        let Some(patient_name) = fields.patient_name else {
            warn!("{:?} lookup error for PatientName", path);
            return;
        };
        let Some(series_description) = fields.series_description else {
            warn!("{:?} lookup error for SeriesDescription", path);
            return;
        };

        if self.verbose {
            debug!(
                "New series {} ({} / {}) from {:?}",
                uid, patient_name, series_description, path
            );
        }
        table.insert(uid, patient_name, series_description, path);
    }
}
