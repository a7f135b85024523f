//! Journal inspection commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::Colorize;
use kiln_training::{EvalPhaseModel, PhasedLayout, TrainPhaseModel, TrainingJournal};
use std::path::{Path, PathBuf};

/// Journal subcommands
#[derive(Subcommand, Debug)]
pub enum JournalCommand {
    /// Show the recorded state of a phased run
    Show {
        /// Base directory of the phased cache
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Journal location (overrides the base directory default)
        #[arg(long)]
        journal_path: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete the journal and the phased cache
    Clear {
        /// Base directory of the phased cache
        #[arg(long)]
        base_dir: PathBuf,

        /// Journal location (overrides the base directory default)
        #[arg(long)]
        journal_path: Option<PathBuf>,

        /// Delete without confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub fn execute(cmd: JournalCommand) -> Result<()> {
    match cmd {
        JournalCommand::Show { base_dir, journal_path, json } => show(base_dir, journal_path, json),
        JournalCommand::Clear { base_dir, journal_path, yes } => clear(&base_dir, journal_path, yes),
    }
}

fn show(base_dir: Option<PathBuf>, journal_path: Option<PathBuf>, json: bool) -> Result<()> {
    let path = resolve_journal_path(base_dir, journal_path)?;
    let journal = TrainingJournal::new(&path)
        .with_context(|| format!("failed to read journal {}", path.display()))?;

    if !journal.was_loaded() {
        println!("{}", format!("No journal found at {}", path.display()).yellow());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&journal.model)?);
        return Ok(());
    }

    let model = &journal.model;
    println!();
    println!("{}", "Training Journal".bold().cyan());
    println!();
    println!("  Journal: {}", path.display().to_string().dimmed());
    println!("  Run: {}", model.run_id.to_string().cyan());
    println!("  Started: {}", fmt_time(&model.started_at_utc).dimmed());
    if let Some(ref ended) = model.ended_at_utc {
        println!("  Ended: {}", fmt_time(ended).dimmed());
    }
    println!("  Current phase: {}", model.current_phase.to_string().bold());
    println!();
    print_train_phase("train1", model.train_1.as_ref());
    print_train_phase("train2", model.train_2.as_ref());
    print_eval_phase("eval2", model.eval_2.as_ref());
    if let Some(ref best) = model.final_output {
        println!();
        println!(
            "  Final output: {} {}",
            best.checkpoint.display().to_string().green(),
            format!("(score {:.2})", best.score).dimmed()
        );
    }
    println!();
    Ok(())
}

fn clear(base_dir: &Path, journal_path: Option<PathBuf>, yes: bool) -> Result<()> {
    let layout = PhasedLayout::new(base_dir.to_path_buf());
    let path = journal_path.unwrap_or_else(|| layout.journal_path());

    if !yes {
        anyhow::bail!(
            "refusing to delete {} and the phased cache under {}; re-run with --yes",
            path.display(),
            base_dir.display()
        );
    }

    layout.clear()?;
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("failed to remove journal {}", path.display()))?;
    }

    println!("{}", "Cleared phased run".bold().green());
    println!("  Journal: {}", path.display().to_string().dimmed());
    println!("  Cache: {}", base_dir.display().to_string().dimmed());
    Ok(())
}

fn resolve_journal_path(
    base_dir: Option<PathBuf>,
    journal_path: Option<PathBuf>,
) -> Result<PathBuf> {
    if let Some(path) = journal_path {
        return Ok(path);
    }
    base_dir
        .map(|base| PhasedLayout::new(base).journal_path())
        .ok_or_else(|| anyhow::anyhow!("pass --base-dir or --journal-path to locate the journal"))
}

fn fmt_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn print_train_phase(name: &str, record: Option<&TrainPhaseModel>) {
    match record {
        None => println!("  {}: {}", name, "not started".dimmed()),
        Some(record) => match record.ended_at_utc {
            Some(ended) => println!(
                "  {}: {} (finished {})",
                name,
                "complete".green(),
                fmt_time(&ended).dimmed()
            ),
            None => println!("  {}: {}", name, "in progress".yellow()),
        },
    }
}

fn print_eval_phase(name: &str, record: Option<&EvalPhaseModel>) {
    match record {
        None => println!("  {}: {}", name, "not started".dimmed()),
        Some(record) => {
            let scored = record.finished_checkpoints.len();
            let total = record.checkpoints.len();
            let status = if record.ended_at_utc.is_some() {
                "complete".green()
            } else {
                "in progress".yellow()
            };
            println!("  {}: {} ({} of {} checkpoints scored)", name, status, scored, total);
            if let Some(ref best) = record.best_checkpoint {
                println!(
                    "    Best: {} {}",
                    best.checkpoint.display().to_string().cyan(),
                    format!("(score {:.2})", best.score).dimmed()
                );
            }
        }
    }
}
