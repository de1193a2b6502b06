// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use dicomfmt::{DicomExtractor, FieldExtractor};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must come back as an error, never a panic
    let _ = DicomExtractor::new().extract(data);
});
