// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

#![no_main]

use dicomfmt::classifier::TextClassifier;
use dicomfmt::config::ClassifierConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let classifier = TextClassifier::new(&ClassifierConfig::default(), false);
    let _ = classifier.is_likely_text(data);
});
