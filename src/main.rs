// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! dicomfmt: DICOM folder organizer
//!
//! With one directory the tree is re-organized in place by moving files.
//! With several, every directory but the last is copied into the last one.
//! Each series directory that received files is printed to standard output.

use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dicomfmt::{AppConfig, DicomExtractor, DicomfmtError, Organizer, Result, RunPlan};

/// dicomfmt - organize DICOM folders by patient and series
#[derive(Parser, Debug)]
#[command(name = "dicomfmt")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(
    about = "Organize DICOM files into targetDir/PatientName/SeriesDescription",
    long_about = None
)]
struct Cli {
    /// Print extra information to standard error
    #[arg(short, long)]
    verbose: bool,

    /// Path to configuration file (JSON format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record every placement to this JSONL file for dicomfmt-undo
    #[arg(short, long)]
    journal: Option<PathBuf>,

    /// Show which series directories would be written without changing anything
    #[arg(long)]
    dry_run: bool,

    /// source_dir [source_dir ...] target_directory
    #[arg(required = true, value_name = "DIR")]
    paths: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    // Standard output is reserved for series directories
    let filter = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&cli, config) {
        if e.is_fatal() {
            error!("Fatal: {}", e);
        } else {
            error!("{}", e);
        }
        std::process::exit(1);
    }
}

/// Merge the optional config file with command-line overrides
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    config.verbose |= cli.verbose;
    if let Some(journal) = &cli.journal {
        config.placement.journal_path = Some(journal.to_string_lossy().into_owned());
    }
    Ok(config)
}

fn run(cli: &Cli, config: AppConfig) -> Result<()> {
    let plan = RunPlan::from_paths(&cli.paths)
        .ok_or_else(|| DicomfmtError::Config("No directory given".to_string()))?;

    let organizer = Organizer::new(config, DicomExtractor::new()).with_dry_run(cli.dry_run);
    let stdout = io::stdout();
    let stats = organizer.run(&plan, &mut stdout.lock())?;

    info!(
        "{:?}: {} files placed in {} series, {} already in place",
        plan.action, stats.files_placed, stats.series_reported, stats.files_in_place
    );
    Ok(())
}
