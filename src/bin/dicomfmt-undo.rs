// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! dicomfmt Undo Utility
//!
//! Reverses placements recorded in the journal.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use dicomfmt::journal::{Journal, UndoOutcome};

#[derive(Parser, Debug)]
#[command(name = "dicomfmt-undo")]
#[command(version = "1.0.0")]
#[command(about = "Undo dicomfmt placements")]
struct Args {
    /// Path to journal file
    #[arg(short, long, default_value = "dicomfmt_journal.jsonl")]
    journal: PathBuf,

    /// Number of placements to undo (default: 1, use 0 for all)
    #[arg(short, long, default_value = "1")]
    count: usize,

    /// Dry run - show what would be undone without doing it
    #[arg(long)]
    dry_run: bool,

    /// List all entries in the journal
    #[arg(long)]
    list: bool,

    /// Delete the journal
    #[arg(long)]
    clear: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.journal.exists() {
        eprintln!("Journal not found: {:?}", args.journal);
        eprintln!("Nothing to undo.");
        return Ok(());
    }

    let journal = Journal::new(args.journal.clone());

    if args.clear {
        journal.clear().with_context(|| format!("removing {:?}", args.journal))?;
        println!("Journal cleared");
        return Ok(());
    }

    if args.list {
        let entries = journal
            .read_all()
            .with_context(|| format!("reading {:?}", args.journal))?;
        println!("Placement Journal ({} entries):", entries.len());
        println!("{:-<80}", "");
        for (i, entry) in entries.iter().rev().enumerate() {
            println!(
                "{:3}. [{}] {:?} {} -> {}{}",
                i + 1,
                entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                entry.action,
                entry.source.display(),
                entry.destination.display(),
                if entry.undone { " [UNDONE]" } else { "" }
            );
        }
        return Ok(());
    }

    let results = journal
        .undo(args.count, args.dry_run)
        .with_context(|| format!("undoing entries from {:?}", args.journal))?;

    if results.is_empty() {
        println!("No placements to undo.");
        return Ok(());
    }

    let mut undone = 0;
    let mut skipped = 0;
    for (entry, outcome) in &results {
        match outcome {
            UndoOutcome::Reverted => {
                println!(
                    "  Undone: {} -> {}",
                    entry.destination.display(),
                    entry.source.display()
                );
                undone += 1;
            }
            UndoOutcome::WouldRevert => {
                println!(
                    "  Would undo: {} -> {}",
                    entry.destination.display(),
                    entry.source.display()
                );
            }
            UndoOutcome::MissingDestination => {
                eprintln!(
                    "  Skip: {} (file not found, may have been moved/deleted)",
                    entry.destination.display()
                );
                skipped += 1;
            }
            UndoOutcome::SourceOccupied => {
                eprintln!("  Skip: {} (original path already exists)", entry.source.display());
                skipped += 1;
            }
        }
    }

    println!();
    if args.dry_run {
        println!("Dry run complete. {} placement(s) would be undone.", results.len() - skipped);
    } else {
        println!("Done. {} undone, {} skipped.", undone, skipped);
    }

    Ok(())
}
