// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

use std::fs;
use std::path::{Path, PathBuf};

use dicomfmt::{DicomfmtError, FieldExtractor, RecordFields, Result};

/// Test records: a NUL byte, then `uid|patient|description`. Empty fields are absent.
pub struct StubExtractor;

impl FieldExtractor for StubExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<RecordFields> {
        let body = bytes
            .strip_prefix(b"\0")
            .ok_or_else(|| DicomfmtError::Extract("no marker".to_string()))?;
        let text = std::str::from_utf8(body).map_err(|e| DicomfmtError::Extract(e.to_string()))?;
        let mut parts = text.splitn(3, '|');
        let mut next = || parts.next().filter(|s| !s.is_empty()).map(str::to_string);
        Ok(RecordFields {
            series_instance_uid: next(),
            patient_name: next(),
            series_description: next(),
        })
    }
}

pub fn write_record(path: &Path, uid: &str, patient: &str, desc: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, format!("\0{}|{}|{}", uid, patient, desc)).unwrap();
}

pub fn sorted_lines(out: Vec<u8>) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    lines
}

pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(files_under(&path));
            } else {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}
