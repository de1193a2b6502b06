// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Placement journal for undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;

use crate::placement::Action;
use crate::{DicomfmtError, Result};

/// A single placement in the journal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub action: Action,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub series_instance_uid: String,
    #[serde(default)]
    pub undone: bool,
}

impl JournalEntry {
    pub fn new(
        action: Action,
        source: PathBuf,
        destination: PathBuf,
        series_instance_uid: String,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            action,
            source,
            destination,
            series_instance_uid,
            undone: false,
        }
    }
}

/// Outcome of reverting one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    Reverted,
    WouldRevert,
    /// The placed file is gone
    MissingDestination,
    /// Something already occupies the original location
    SourceOccupied,
}

/// Append-only JSONL journal
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append an entry to the journal
    pub fn append(&self, entry: &JournalEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| DicomfmtError::Journal(format!("{:?}: {}", self.path, e)))?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)
            .map_err(|e| DicomfmtError::Journal(format!("{:?}: {}", self.path, e)))?;

        Ok(())
    }

    /// Read all journal entries
    pub fn read_all(&self) -> Result<Vec<JournalEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Failed to parse journal entry: {}", e);
                }
            }
        }

        Ok(entries)
    }

    /// Entries not yet undone, newest first
    pub fn get_undoable(&self) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<_> = self.read_all()?.into_iter().filter(|e| !e.undone).collect();
        entries.reverse();
        Ok(entries)
    }

    /// Mark entries as undone
    pub fn mark_undone(&self, ids: &[String]) -> Result<()> {
        let entries = self.read_all()?;

        // Rewrite the entire file with the updated entries
        let file = File::create(&self.path)?;
        let mut writer = std::io::BufWriter::new(file);

        for mut entry in entries {
            if ids.contains(&entry.id) {
                entry.undone = true;
            }
            let json = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", json)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Revert the `count` most recent placements (0 means all).
    ///
    /// Entries reverted before a failing one are still marked undone.
    pub fn undo(&self, count: usize, dry_run: bool) -> Result<Vec<(JournalEntry, UndoOutcome)>> {
        let undoable = self.get_undoable()?;
        let take = if count == 0 { undoable.len() } else { count };

        let mut results = Vec::new();
        let mut reverted = Vec::new();
        for entry in undoable.into_iter().take(take) {
            let outcome = match revert(&entry, dry_run) {
                Ok(outcome) => outcome,
                Err(e) => {
                    if !reverted.is_empty() {
                        self.mark_undone(&reverted)?;
                    }
                    return Err(e);
                }
            };
            if outcome == UndoOutcome::Reverted {
                reverted.push(entry.id.clone());
            }
            results.push((entry, outcome));
        }

        if !reverted.is_empty() {
            self.mark_undone(&reverted)?;
        }
        Ok(results)
    }

    /// Clear the journal
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

fn revert(entry: &JournalEntry, dry_run: bool) -> Result<UndoOutcome> {
    if !entry.destination.exists() {
        return Ok(UndoOutcome::MissingDestination);
    }

    match entry.action {
        Action::Move => {
            if entry.source.exists() {
                return Ok(UndoOutcome::SourceOccupied);
            }
            if dry_run {
                return Ok(UndoOutcome::WouldRevert);
            }
            if let Some(parent) = entry.source.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&entry.destination, &entry.source)?;
        }
        Action::Copy => {
            if dry_run {
                return Ok(UndoOutcome::WouldRevert);
            }
            fs::remove_file(&entry.destination)?;
        }
    }

    Ok(UndoOutcome::Reverted)
}
