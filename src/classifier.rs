// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Text-file heuristic
//!
//! DICOM files open with a binary preamble or meta header, so a file whose
//! leading characters are all printable is almost certainly a README, a log
//! or some other incidental text file and is not worth handing to the parser.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::config::ClassifierConfig;

/// Decides whether a file looks like plain text
#[derive(Debug, Clone)]
pub struct TextClassifier {
    probe_chars: usize,
    verbose: bool,
}

impl TextClassifier {
    /// Create a classifier inspecting `config.probe_chars` characters
    pub fn new(config: &ClassifierConfig, verbose: bool) -> Self {
        Self {
            probe_chars: config.probe_chars,
            verbose,
        }
    }

    /// Check whether the file at `path` is likely a text file.
    ///
    /// A file that cannot be opened is reported as not text, so it reaches
    /// the parser and fails there loudly instead of being skipped.
    pub fn is_likely_text_file(&self, path: &Path) -> bool {
        match File::open(path) {
            Ok(file) => self.is_likely_text(file),
            Err(e) => {
                warn!("Cannot open {:?}: {}", path, e);
                false
            }
        }
    }

    /// Check the leading characters of a byte stream.
    ///
    /// Returns false as soon as a non-printable character other than `\n`,
    /// `\t` or `\r` is seen. Running out of input (or failing to read) before
    /// the probe limit is not disqualifying.
    pub fn is_likely_text<R: Read>(&self, reader: R) -> bool {
        // Every char is at most 4 bytes of UTF-8
        let limit = (self.probe_chars as u64).saturating_mul(4);
        let mut buf = Vec::with_capacity(limit.min(4096) as usize);

        if let Err(e) = reader.take(limit).read_to_end(&mut buf) {
            if self.verbose {
                debug!("Read stopped early: {}", e);
            }
        }

        // Invalid sequences decode to U+FFFD, which counts as printable
        String::from_utf8_lossy(&buf)
            .chars()
            .take(self.probe_chars)
            .all(|c| is_printable(c) || matches!(c, '\n' | '\t' | '\r'))
    }
}

/// Printable: letters, marks, numbers, punctuation, symbols and the ASCII space
fn is_printable(c: char) -> bool {
    use GeneralCategory::*;

    if c == ' ' {
        return true;
    }
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | NonspacingMark
            | SpacingMark
            | EnclosingMark
            | DecimalNumber
            | LetterNumber
            | OtherNumber
            | ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
            | MathSymbol
            | CurrencySymbol
            | ModifierSymbol
            | OtherSymbol
    )
}
