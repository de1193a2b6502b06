// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Placement of series files into the canonical layout
//!
//! Every file of a series ends up at
//! `target/PatientName/SeriesDescription/<file name>`. Files already there are
//! left alone, so running the engine twice over an organized tree is a no-op.
//! Any failure to create a directory or to move/copy a file stops the run.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::PlacementConfig;
use crate::journal::{Journal, JournalEntry};
use crate::paths::{clean_path, sanitize_component};
use crate::series::{SeriesGroup, SeriesTable};
use crate::{DicomfmtError, Result};

/// What to do with a file that is not yet in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Rename into place and remove directories left empty
    Move,
    /// Duplicate into place, leaving the source untouched
    Copy,
}

impl Action {
    fn apply(self, from: &Path, to: &Path) -> std::io::Result<()> {
        match self {
            Action::Move => fs::rename(from, to),
            Action::Copy => fs::copy(from, to).map(|_| ()),
        }
    }
}

/// Per-series result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupOutcome {
    /// Files moved or copied
    pub placed: usize,
    /// Files already at their destination
    pub in_place: usize,
}

/// Totals for one [`SeriesTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    pub series_reported: usize,
    pub files_placed: usize,
    pub files_in_place: usize,
}

impl PlacementStats {
    pub fn add(&mut self, other: PlacementStats) {
        self.series_reported += other.series_reported;
        self.files_placed += other.files_placed;
        self.files_in_place += other.files_in_place;
    }
}

pub struct PlacementEngine {
    target: PathBuf,
    action: Action,
    dir_mode: u32,
    dry_run: bool,
    journal: Option<Journal>,
    /// Series directories already written to the report
    reported: HashSet<PathBuf>,
}

impl PlacementEngine {
    pub fn new(target: &Path, action: Action, config: &PlacementConfig) -> Self {
        Self {
            target: clean_path(target),
            action,
            dir_mode: config.dir_mode,
            dry_run: false,
            journal: config.journal_path.as_ref().map(|p| Journal::new(PathBuf::from(p))),
            reported: HashSet::new(),
        }
    }

    /// Report what would be placed without touching the filesystem
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Canonical directory of a series
    pub fn series_dir(&self, group: &SeriesGroup) -> PathBuf {
        clean_path(
            &self
                .target
                .join(sanitize_component(&group.patient_name))
                .join(sanitize_component(&group.series_description)),
        )
    }

    /// Place every series of `table`, writing one line to `out` per series
    /// directory that received at least one file. A directory is reported
    /// once per engine even when several tables feed it.
    pub fn place_table<W: Write>(
        &mut self,
        table: &SeriesTable,
        out: &mut W,
    ) -> Result<PlacementStats> {
        let mut stats = PlacementStats::default();

        for (uid, group) in table.iter() {
            let outcome = self.place_group(uid, group)?;
            stats.files_placed += outcome.placed;
            stats.files_in_place += outcome.in_place;

            if outcome.placed > 0 {
                let dir = self.series_dir(group);
                if !self.reported.contains(&dir) {
                    writeln!(out, "{}", dir.display())?;
                    self.reported.insert(dir);
                    stats.series_reported += 1;
                }
            }
        }

        Ok(stats)
    }

    /// Place the files of a single series
    pub fn place_group(&self, uid: &str, group: &SeriesGroup) -> Result<GroupOutcome> {
        let dst_dir = self.series_dir(group);
        let mut outcome = GroupOutcome::default();
        let mut dir_ready = false;

        for file in &group.files {
            let Some(name) = file.file_name() else {
                continue;
            };
            let dst_file = clean_path(&dst_dir.join(name));

            if dst_file == clean_path(file) {
                outcome.in_place += 1;
                continue;
            }
            outcome.placed += 1;

            if self.dry_run {
                info!("DRY RUN: Would {:?} {:?} to {:?}", self.action, file, dst_file);
                continue;
            }

            if !dir_ready {
                ensure_dir(&dst_dir, self.dir_mode)?;
                dir_ready = true;
            }

            self.action
                .apply(file, &dst_file)
                .map_err(|source| DicomfmtError::Placement {
                    from: file.clone(),
                    to: dst_file.clone(),
                    source,
                })?;
            debug!("{:?} {:?} -> {:?}", self.action, file, dst_file);

            if let Some(journal) = &self.journal {
                journal.append(&JournalEntry::new(
                    self.action,
                    file.clone(),
                    dst_file.clone(),
                    uid.to_string(),
                ))?;
            }

            if self.action == Action::Move {
                self.cleanup_after_move(file);
            }
        }

        Ok(outcome)
    }

    /// Remove the moved file's directory if it is now empty, then its parent
    /// if that became empty too. The target root is never removed.
    fn cleanup_after_move(&self, file: &Path) {
        let Some(src_dir) = file.parent() else {
            return;
        };
        if !self.is_removable(src_dir) || !remove_empty(src_dir) {
            return;
        }
        debug!("Removed empty directory {:?}", src_dir);

        if let Some(parent) = src_dir.parent() {
            if self.is_removable(parent) && remove_empty(parent) {
                debug!("Removed empty directory {:?}", parent);
            }
        }
    }

    fn is_removable(&self, dir: &Path) -> bool {
        !dir.as_os_str().is_empty() && clean_path(dir) != self.target
    }
}

/// Create `path` and any missing parents with permission bits `mode`
pub fn ensure_dir(path: &Path, mode: u32) -> Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path).map_err(|source| DicomfmtError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove `dir` if it has no entries. Failures are ignored.
fn remove_empty(dir: &Path) -> bool {
    let Ok(mut entries) = fs::read_dir(dir) else {
        return false;
    };
    if entries.next().is_some() {
        return false;
    }
    fs::remove_dir(dir).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn group(patient: &str, desc: &str, files: Vec<PathBuf>) -> SeriesGroup {
        SeriesGroup {
            patient_name: patient.to_string(),
            series_description: desc.to_string(),
            files,
        }
    }

    fn table_of(uid: &str, g: SeriesGroup) -> SeriesTable {
        let mut table = SeriesTable::new();
        let mut files = g.files.into_iter();
        table.insert(
            uid.to_string(),
            g.patient_name,
            g.series_description,
            files.next().unwrap(),
        );
        for f in files {
            table.append(uid, f);
        }
        table
    }

    #[test]
    fn test_series_dir_is_cleaned_and_sanitized() {
        let engine =
            PlacementEngine::new(Path::new("/out/./"), Action::Copy, &PlacementConfig::default());
        let g = group("Doe", "T1/T2", vec![]);
        assert_eq!(engine.series_dir(&g), PathBuf::from("/out/Doe/T1_T2"));

        let blank = group("Doe", "", vec![]);
        assert_eq!(engine.series_dir(&blank), PathBuf::from("/out/Doe"));
    }

    #[test]
    fn test_copy_places_and_reports() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src").join("IM1");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, b"pixels").unwrap();
        let target = dir.path().join("out");

        let mut engine = PlacementEngine::new(&target, Action::Copy, &PlacementConfig::default());
        let mut out = Vec::new();
        let stats = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![src.clone()])), &mut out)
            .unwrap();

        assert_eq!(stats.files_placed, 1);
        assert_eq!(stats.series_reported, 1);
        assert!(src.exists());
        assert_eq!(fs::read(target.join("Doe/CT/IM1")).unwrap(), b"pixels");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", target.join("Doe").join("CT").display())
        );
    }

    #[test]
    fn test_series_dir_reported_once_across_tables() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a").join("IM1");
        let b = dir.path().join("b").join("IM2");
        for f in [&a, &b] {
            fs::create_dir_all(f.parent().unwrap()).unwrap();
            fs::write(f, b"x").unwrap();
        }

        let target = dir.path().join("out");
        let mut engine = PlacementEngine::new(&target, Action::Copy, &PlacementConfig::default());
        let mut out = Vec::new();
        let first = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![a])), &mut out)
            .unwrap();
        let second = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![b])), &mut out)
            .unwrap();

        assert_eq!(first.series_reported + second.series_reported, 1);
        assert_eq!(second.files_placed, 1);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_already_placed_is_skipped() {
        let dir = tempdir().unwrap();
        let target = dir.path().to_path_buf();
        let file = target.join("Doe").join("CT").join("IM1");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"pixels").unwrap();

        let mut engine = PlacementEngine::new(&target, Action::Move, &PlacementConfig::default());
        let mut out = Vec::new();
        let stats = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![file.clone()])), &mut out)
            .unwrap();

        assert_eq!(stats.files_placed, 0);
        assert_eq!(stats.files_in_place, 1);
        assert!(out.is_empty());
        assert!(file.exists());
    }

    #[test]
    fn test_move_cascades_cleanup_two_levels() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let only = root.join("PatientX").join("SeriesY").join("only.dat");
        fs::create_dir_all(only.parent().unwrap()).unwrap();
        fs::write(&only, b"x").unwrap();

        let mut engine = PlacementEngine::new(&root, Action::Move, &PlacementConfig::default());
        let mut out = Vec::new();
        engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![only.clone()])), &mut out)
            .unwrap();

        assert!(root.join("Doe/CT/only.dat").exists());
        assert!(!root.join("PatientX/SeriesY").exists());
        assert!(!root.join("PatientX").exists());
        assert!(root.exists());
    }

    #[test]
    fn test_move_keeps_non_empty_directories() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let series = root.join("PatientX").join("SeriesY");
        fs::create_dir_all(&series).unwrap();
        fs::write(series.join("a.dcm"), b"a").unwrap();
        fs::write(series.join("notes.txt"), b"keep me").unwrap();

        let engine = PlacementEngine::new(&root, Action::Move, &PlacementConfig::default());
        engine
            .place_group("S1", &group("Doe", "CT", vec![series.join("a.dcm")]))
            .unwrap();

        assert!(series.join("notes.txt").exists());
        assert!(root.join("Doe/CT/a.dcm").exists());
    }

    #[test]
    fn test_unsafe_names_stay_inside_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("root");
        let series = root.join("Loose");
        fs::create_dir_all(&series).unwrap();
        fs::write(series.join("a.dcm"), b"a").unwrap();

        let engine = PlacementEngine::new(&root, Action::Move, &PlacementConfig::default());
        let g = group("..", "..", vec![series.join("a.dcm")]);
        engine.place_group("S1", &g).unwrap();

        assert!(root.join("_").join("_").join("a.dcm").exists());
        assert!(!series.exists());
        assert!(root.exists());
    }

    #[test]
    fn test_directory_collision_is_fatal() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("IM1");
        fs::write(&src, b"x").unwrap();
        let target = dir.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("Doe"), b"not a directory").unwrap();

        let mut engine = PlacementEngine::new(&target, Action::Copy, &PlacementConfig::default());
        let mut out = Vec::new();
        let err = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![src])), &mut out)
            .unwrap_err();

        assert!(matches!(err, DicomfmtError::CreateDir { .. }));
        assert!(err.is_fatal());
        assert!(out.is_empty());
    }

    #[test]
    fn test_failed_copy_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("vanished.dcm");
        let target = dir.path().join("out");
        let engine = PlacementEngine::new(&target, Action::Copy, &PlacementConfig::default());

        let err = engine
            .place_group("S1", &group("Doe", "CT", vec![missing]))
            .unwrap_err();
        assert!(matches!(err, DicomfmtError::Placement { .. }));
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("IM1");
        fs::write(&src, b"x").unwrap();
        let target = dir.path().join("out");

        let mut engine = PlacementEngine::new(&target, Action::Move, &PlacementConfig::default())
            .with_dry_run(true);
        let mut out = Vec::new();
        let stats = engine
            .place_table(&table_of("S1", group("Doe", "CT", vec![src.clone()])), &mut out)
            .unwrap();

        assert_eq!(stats.series_reported, 1);
        assert!(src.exists());
        assert!(!target.exists());
        assert!(!out.is_empty());
    }

    #[test]
    fn test_journal_records_placements() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("IM1");
        fs::write(&src, b"x").unwrap();
        let journal_path = dir.path().join("journal.jsonl");
        let config = PlacementConfig {
            journal_path: Some(journal_path.to_string_lossy().into_owned()),
            ..PlacementConfig::default()
        };

        let engine = PlacementEngine::new(&dir.path().join("out"), Action::Copy, &config);
        engine
            .place_group("1.2.840.1", &group("Doe", "CT", vec![src.clone()]))
            .unwrap();

        let entries = Journal::new(journal_path).read_all().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, Action::Copy);
        assert_eq!(entries[0].source, src);
        assert_eq!(entries[0].series_instance_uid, "1.2.840.1");
    }

    #[cfg(unix)]
    #[test]
    fn test_created_directories_use_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b");
        ensure_dir(&path, 0o700).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        // umask may only clear bits
        assert_eq!(mode & !0o700, 0);
    }
}
