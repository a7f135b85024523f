//! Serde models persisted in the training journal.
//!
//! The journal is written whole on every commit, so these types are plain
//! data with `PartialEq` for round-trip checks. Constructors that take
//! checkpoint paths validate the directories exist up front; a journal never
//! records a path that was not real at the time of writing.

use crate::checkpoints::compare_newest_first;
use crate::error::{TrainingError, TrainingResult};
use crate::phase::TrainingPhase;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Final score for one evaluated checkpoint. Written once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub checkpoint: PathBuf,
    pub score: f64,
    pub ended_at_utc: DateTime<Utc>,
}

impl EvalResult {
    pub fn new(checkpoint: PathBuf, score: f64) -> TrainingResult<Self> {
        if !checkpoint.is_dir() {
            return Err(TrainingError::Model(format!(
                "checkpoint directory does not exist: {}",
                checkpoint.display()
            )));
        }
        Ok(Self { checkpoint, score, ended_at_utc: Utc::now() })
    }
}

/// Progress record for one evaluation phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalPhaseModel {
    pub started_at_utc: DateTime<Utc>,
    pub ended_at_utc: Option<DateTime<Utc>>,
    /// Every checkpoint this phase has to score.
    pub checkpoints: Vec<PathBuf>,
    /// Checkpoints already scored, one entry per element of `results`.
    #[serde(default)]
    pub finished_checkpoints: Vec<PathBuf>,
    #[serde(default)]
    pub results: Vec<EvalResult>,
    /// Set exactly once, when the phase is finalized.
    pub best_checkpoint: Option<EvalResult>,
}

impl EvalPhaseModel {
    pub fn new(checkpoints: Vec<PathBuf>) -> TrainingResult<Self> {
        for checkpoint in &checkpoints {
            if !checkpoint.is_dir() {
                return Err(TrainingError::Model(format!(
                    "checkpoint directory does not exist: {}",
                    checkpoint.display()
                )));
            }
        }
        Ok(Self {
            started_at_utc: Utc::now(),
            ended_at_utc: None,
            checkpoints,
            finished_checkpoints: Vec::new(),
            results: Vec::new(),
            best_checkpoint: None,
        })
    }

    /// Checkpoints still to score, newest first.
    ///
    /// The order is re-derived from the directory names rather than taken
    /// from insertion order, so interrupted runs resume in a stable,
    /// predictable sequence.
    #[must_use]
    pub fn unfinished(&self) -> Vec<PathBuf> {
        let mut todo: Vec<PathBuf> = self
            .checkpoints
            .iter()
            .filter(|c| !self.finished_checkpoints.contains(c))
            .cloned()
            .collect();
        todo.sort_by(|a, b| compare_newest_first(a, b));
        todo
    }

    /// Record a finished checkpoint in both the result list and the
    /// finished set.
    pub fn record_result(&mut self, result: EvalResult) {
        self.finished_checkpoints.push(result.checkpoint.clone());
        self.results.push(result);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.finished_checkpoints.len() == self.checkpoints.len()
    }
}

/// Progress record for one training phase.
///
/// Deliberately stores no hyperparameters; those live in `TrainingArgs` and
/// recording them here as well would leave two copies to drift apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainPhaseModel {
    pub started_at_utc: DateTime<Utc>,
    pub ended_at_utc: Option<DateTime<Utc>>,
    /// The directory the phase writes checkpoints into.
    pub checkpoints: PathBuf,
}

impl TrainPhaseModel {
    pub fn new(checkpoints: PathBuf) -> TrainingResult<Self> {
        if !checkpoints.is_dir() {
            return Err(TrainingError::Model(format!(
                "checkpoint output directory does not exist: {}",
                checkpoints.display()
            )));
        }
        Ok(Self { started_at_utc: Utc::now(), ended_at_utc: None, checkpoints })
    }
}

/// Root of the journal: everything a resumed run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalModel {
    pub run_id: Uuid,
    pub started_at_utc: DateTime<Utc>,
    pub ended_at_utc: Option<DateTime<Utc>>,
    pub current_phase: TrainingPhase,
    pub train_1: Option<TrainPhaseModel>,
    /// Reserved for the MMLU gate; nothing writes it today.
    pub eval_1: Option<EvalPhaseModel>,
    pub train_2: Option<TrainPhaseModel>,
    pub eval_2: Option<EvalPhaseModel>,
    /// The run's winning checkpoint, set when `current_phase` reaches done.
    pub final_output: Option<EvalResult>,
}

impl Default for JournalModel {
    fn default() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at_utc: Utc::now(),
            ended_at_utc: None,
            current_phase: TrainingPhase::Train1,
            train_1: None,
            eval_1: None,
            train_2: None,
            eval_2: None,
            final_output: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_dirs(temp: &TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let dir = temp.path().join(name);
                std::fs::create_dir_all(&dir).unwrap();
                dir
            })
            .collect()
    }

    #[test]
    fn test_eval_result_requires_existing_checkpoint() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("samples_10");
        assert!(EvalResult::new(missing, 0.5).is_err());

        let dirs = make_dirs(&temp, &["samples_10"]);
        assert!(EvalResult::new(dirs[0].clone(), 0.5).is_ok());
    }

    #[test]
    fn test_unfinished_is_a_set_difference_sorted_newest_first() {
        let temp = TempDir::new().unwrap();
        let dirs = make_dirs(&temp, &["samples_200", "samples_500", "samples_1000"]);
        let mut eval = EvalPhaseModel::new(dirs.clone()).unwrap();

        eval.record_result(EvalResult::new(dirs[1].clone(), 0.4).unwrap());

        let todo = eval.unfinished();
        assert_eq!(todo.len(), 2);
        assert!(todo[0].ends_with("samples_1000"));
        assert!(todo[1].ends_with("samples_200"));
        assert!(!eval.is_complete());
    }

    #[test]
    fn test_record_result_keeps_results_and_finished_in_step() {
        let temp = TempDir::new().unwrap();
        let dirs = make_dirs(&temp, &["samples_100"]);
        let mut eval = EvalPhaseModel::new(dirs.clone()).unwrap();

        eval.record_result(EvalResult::new(dirs[0].clone(), 0.9).unwrap());

        assert_eq!(eval.results.len(), eval.finished_checkpoints.len());
        assert!(eval.is_complete());
        assert!(eval.unfinished().is_empty());
    }

    #[test]
    fn test_eval_phase_rejects_missing_checkpoint_dirs() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("samples_7");
        assert!(EvalPhaseModel::new(vec![missing]).is_err());
    }

    #[test]
    fn test_journal_model_defaults_to_a_fresh_train1_run() {
        let model = JournalModel::default();
        assert_eq!(model.current_phase, TrainingPhase::Train1);
        assert!(model.train_1.is_none());
        assert!(model.final_output.is_none());
        assert!(model.ended_at_utc.is_none());
    }
}
