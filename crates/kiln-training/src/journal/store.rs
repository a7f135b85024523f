//! Durable, lock-protected persistence for the journal model.

use crate::error::{TrainingError, TrainingResult};
use crate::journal::model::{EvalPhaseModel, EvalResult, JournalModel};
use crate::phase::TrainingPhase;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle on the single YAML journal file of a phased run.
///
/// `model` is the working copy; `commit` persists it whole. Loading never
/// fails on a malformed journal: the error is logged and a fresh model takes
/// its place, with `was_loaded` telling the caller which case they got.
#[derive(Debug)]
pub struct TrainingJournal {
    path: PathBuf,
    pub model: JournalModel,
    was_loaded: bool,
}

impl TrainingJournal {
    /// Open the journal at `path`, loading the existing model if one parses.
    ///
    /// Errors only when `path` cannot be a journal at all (it is a
    /// directory).
    pub fn new(path: &Path) -> TrainingResult<Self> {
        if path.is_dir() {
            return Err(TrainingError::Journal(format!(
                "journal path is a directory: {}",
                path.display()
            )));
        }

        let (model, was_loaded) = if path.is_file() {
            match Self::read_model(path) {
                Ok(Some(model)) => {
                    debug!(path = %path.display(), phase = %model.current_phase, "loaded existing journal");
                    (model, true)
                }
                Ok(None) => (JournalModel::default(), false),
                Err(e) => {
                    warn!(
                        "Failed to parse journal {}: {}; starting with a fresh model",
                        path.display(),
                        e
                    );
                    (JournalModel::default(), false)
                }
            }
        } else {
            (JournalModel::default(), false)
        };

        Ok(Self { path: path.to_path_buf(), model, was_loaded })
    }

    /// Whether `new` found a parseable journal on disk.
    #[must_use]
    pub fn was_loaded(&self) -> bool {
        self.was_loaded
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn current_phase(&self) -> TrainingPhase {
        self.model.current_phase
    }

    /// Set the phase without validation; advancement rules belong to the
    /// orchestrator.
    pub fn set_current_phase(&mut self, phase: TrainingPhase) {
        self.model.current_phase = phase;
    }

    /// Touch the journal file into existence, parents included. Idempotent.
    pub fn create_empty_journal(&self) -> TrainingResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(&self.path)?;
        Ok(())
    }

    /// Persist the in-memory model to the journal file.
    ///
    /// The model is serialized before the file is opened, so a
    /// serialization failure cannot truncate a previously committed
    /// journal. The write happens under an exclusive advisory lock and is
    /// flushed and fsynced before the lock goes away with the closing file.
    pub fn commit(&self, create_new: bool) -> TrainingResult<()> {
        let yaml = serde_yaml::to_string(&self.model)?;

        if create_new {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        file.write_all(yaml.as_bytes())?;
        file.flush()?;
        file.sync_all()?;
        debug!(path = %self.path.display(), phase = %self.model.current_phase, "journal committed");
        Ok(())
    }

    /// The highest scoring result recorded in an evaluation phase.
    ///
    /// An empty result list is a programming error: the caller asked for a
    /// winner before anything was scored.
    pub fn best_checkpoint(eval: &EvalPhaseModel) -> TrainingResult<EvalResult> {
        eval.results
            .iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
            .cloned()
            .ok_or(TrainingError::NoResults)
    }

    /// Single source for journal timestamps.
    #[must_use]
    pub fn now_utc() -> DateTime<Utc> {
        Utc::now()
    }

    fn read_model(path: &Path) -> TrainingResult<Option<JournalModel>> {
        let raw = std::fs::read_to_string(path)?;
        // An empty file is a journal that was touched but never committed.
        if raw.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_yaml::from_str(&raw)?))
    }
}
