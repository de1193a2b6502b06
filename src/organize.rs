// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! One organizer run over a set of source trees

use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::classifier::TextClassifier;
use crate::extract::FieldExtractor;
use crate::placement::{ensure_dir, Action, PlacementEngine, PlacementStats};
use crate::series::SeriesAggregator;
use crate::{AppConfig, Result};

/// Work requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub sources: Vec<PathBuf>,
    pub target: PathBuf,
    pub action: Action,
}

impl RunPlan {
    /// Derive the plan from positional paths.
    ///
    /// A single path is reorganized in place by moving. With more paths the
    /// last one is the target and the others are copied into it. `None` if
    /// `paths` is empty.
    pub fn from_paths(paths: &[PathBuf]) -> Option<Self> {
        match paths {
            [] => None,
            [only] => Some(Self {
                sources: vec![only.clone()],
                target: only.clone(),
                action: Action::Move,
            }),
            [sources @ .., target] => Some(Self {
                sources: sources.to_vec(),
                target: target.clone(),
                action: Action::Copy,
            }),
        }
    }
}

/// Drives the aggregator and placement engine over each source
pub struct Organizer<E> {
    aggregator: SeriesAggregator<E>,
    config: AppConfig,
    dry_run: bool,
}

impl<E: FieldExtractor> Organizer<E> {
    pub fn new(config: AppConfig, extractor: E) -> Self {
        let classifier = TextClassifier::new(&config.classifier, config.verbose);
        let aggregator = SeriesAggregator::new(classifier, extractor, config.verbose);
        Self {
            aggregator,
            config,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Execute `plan`, writing one line per populated series directory to `out`.
    ///
    /// Missing or unreadable sources are skipped. Placement errors end the
    /// run immediately.
    pub fn run<W: Write>(&self, plan: &RunPlan, out: &mut W) -> Result<PlacementStats> {
        if !self.dry_run && !plan.target.exists() {
            ensure_dir(&plan.target, self.config.placement.dir_mode)?;
        }

        let mut engine = PlacementEngine::new(&plan.target, plan.action, &self.config.placement)
            .with_dry_run(self.dry_run);

        let mut stats = PlacementStats::default();
        for source in &plan.sources {
            if !exists(source) {
                warn!("{:?} does not exist", source);
                continue;
            }

            let table = match self.aggregator.split_series(source) {
                Ok(t) => t,
                Err(e) => {
                    warn!("Skipping source {:?}: {}", source, e);
                    continue;
                }
            };
            info!("Found {} series ({} files) in {:?}", table.len(), table.file_count(), source);

            stats.add(engine.place_table(&table, out)?);
        }

        Ok(stats)
    }
}

fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
