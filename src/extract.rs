// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Metadata extraction from DICOM records

use dicom_core::Tag;
use dicom_dictionary_std::tags;
use dicom_object::DefaultDicomObject;
use serde::{Deserialize, Serialize};

use crate::{DicomfmtError, Result};

/// Offset of the `DICM` magic code in a Part 10 file
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// The fields the organizer needs from one record.
///
/// `None` means the element is absent; a present but blank element is `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub series_instance_uid: Option<String>,
    pub patient_name: Option<String>,
    pub series_description: Option<String>,
}

/// Turns raw file bytes into [`RecordFields`]
pub trait FieldExtractor {
    /// Parse `bytes`, failing if they are not a well-formed record
    fn extract(&self, bytes: &[u8]) -> Result<RecordFields>;
}

/// Extractor for DICOM Part 10 files
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomExtractor;

impl DicomExtractor {
    pub fn new() -> Self {
        Self
    }

    fn open(bytes: &[u8]) -> Result<DefaultDicomObject> {
        let start = if bytes.len() >= PREAMBLE_LEN + MAGIC.len()
            && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()] == MAGIC
        {
            PREAMBLE_LEN
        } else if bytes.starts_with(MAGIC) {
            0
        } else {
            return Err(DicomfmtError::Extract("missing DICM magic code".to_string()));
        };

        dicom_object::from_reader(&bytes[start..])
            .map_err(|e| DicomfmtError::Extract(e.to_string()))
    }

    fn lookup(obj: &DefaultDicomObject, tag: Tag) -> Option<String> {
        let element = obj.element(tag).ok()?;
        let value = element.to_str().ok()?;
        Some(value.trim_end_matches(['\0', ' ']).to_string())
    }
}

impl FieldExtractor for DicomExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<RecordFields> {
        let obj = Self::open(bytes)?;

        Ok(RecordFields {
            series_instance_uid: Self::lookup(&obj, tags::SERIES_INSTANCE_UID),
            patient_name: Self::lookup(&obj, tags::PATIENT_NAME),
            series_description: Self::lookup(&obj, tags::SERIES_DESCRIPTION),
        })
    }
}
