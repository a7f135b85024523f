//! The phased training state machine.
//!
//! Two training rounds and a final evaluation, with every boundary committed
//! to the journal. A crash at any point resumes from the last committed
//! phase; completed phases are skipped, never re-verified.

use crate::config::{PhasedConfig, ResumePolicy};
use crate::error::{OrchestratorError, Result};
use crate::evaluator::evaluate_checkpoints;
use kiln_eval::CheckpointScorer;
use kiln_training::{
    DistributedArgs, EvalPhaseModel, EvalResult, PhasedLayout, TrainPhaseModel, TrainingArgs,
    TrainingBackend, TrainingJournal, TrainingPhase, discover_checkpoints, latest_checkpoint,
};
use std::path::PathBuf;
use tracing::{info, warn};

/// Drives one run through train1, train2, and the final evaluation.
pub struct PhasedTrainer {
    config: PhasedConfig,
    base_args: TrainingArgs,
    dist: DistributedArgs,
    layout: PhasedLayout,
}

impl PhasedTrainer {
    /// Validate the run's inputs; nothing on disk changes here.
    pub fn new(
        config: PhasedConfig,
        base_args: TrainingArgs,
        dist: DistributedArgs,
    ) -> Result<Self> {
        if !config.phase1_data.exists() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "phase 1 data not found: {}",
                config.phase1_data.display()
            )));
        }
        if !config.phase2_data.exists() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "phase 2 data not found: {}",
                config.phase2_data.display()
            )));
        }
        if !config.judge_model.is_absolute() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "judge model path must be absolute: {}",
                config.judge_model.display()
            )));
        }
        if !config.judge_model.is_dir() {
            return Err(OrchestratorError::InvalidConfig(format!(
                "judge model directory not found: {}",
                config.judge_model.display()
            )));
        }
        // Both phases' effective args must be valid before anything runs.
        for overrides in [&config.phase1_overrides, &config.phase2_overrides] {
            let mut probe = base_args.clone();
            overrides.apply(&mut probe);
            probe.validate()?;
        }

        let layout = PhasedLayout::new(config.base_dir.clone());
        Ok(Self { config, base_args, dist, layout })
    }

    fn journal_path(&self) -> PathBuf {
        self.config
            .journal_path
            .clone()
            .unwrap_or_else(|| self.layout.journal_path())
    }

    /// Run the phases that are not already recorded as complete.
    ///
    /// Returns the winning evaluation result. Every failure leaves the
    /// journal describing exactly how far the run got; re-invoking against
    /// the same journal picks up from there.
    pub async fn run(
        &self,
        backend: &dyn TrainingBackend,
        scorer: &dyn CheckpointScorer,
    ) -> Result<EvalResult> {
        self.layout.ensure_dirs()?;
        let journal_path = self.journal_path();
        let mut journal = TrainingJournal::new(&journal_path)?;

        if journal.was_loaded() {
            match self.config.resume {
                ResumePolicy::Resume => {
                    info!(
                        run_id = %journal.model.run_id,
                        phase = %journal.current_phase(),
                        path = %journal_path.display(),
                        "resuming from existing journal"
                    );
                    warn!(
                        "phase directories on disk are trusted to match the journal; they are not revalidated"
                    );
                }
                ResumePolicy::Clear => {
                    info!(path = %journal_path.display(), "clearing previous phased run");
                    self.layout.clear()?;
                    remove_file_if_exists(&journal_path)?;
                    self.layout.ensure_dirs()?;
                    journal = TrainingJournal::new(&journal_path)?;
                }
                ResumePolicy::Fail => {
                    return Err(OrchestratorError::ResumeRefused { path: journal_path });
                }
            }
        }
        if !journal.was_loaded() {
            info!(run_id = %journal.model.run_id, path = %journal_path.display(), "starting fresh phased run");
            journal.commit(true)?;
        }

        if TrainingPhase::Train1.is_behind(journal.current_phase()) {
            info!("train1 already complete; skipping");
        } else {
            self.run_train1(&mut journal, backend).await?;
        }

        if TrainingPhase::Train2.is_behind(journal.current_phase()) {
            info!("train2 already complete; skipping");
        } else {
            self.run_train2(&mut journal, backend).await?;
        }

        // The reserved eval1 gate between the training phases is bypassed.
        if TrainingPhase::Eval2.is_behind(journal.current_phase()) {
            info!("eval2 already complete; skipping");
        } else {
            self.run_eval2(&mut journal, scorer).await?;
        }

        journal
            .model
            .final_output
            .clone()
            .ok_or(OrchestratorError::MissingFinalOutput)
    }

    async fn run_train1(
        &self,
        journal: &mut TrainingJournal,
        backend: &dyn TrainingBackend,
    ) -> Result<()> {
        info!("phase train1: starting");
        if journal.model.train_1.is_none() {
            journal.model.train_1 =
                Some(TrainPhaseModel::new(self.layout.phase1_checkpoints_dir())?);
            journal.commit(false)?;
        }

        let mut args = self.base_args.clone();
        args.data_path = self.config.phase1_data.clone();
        args.ckpt_output_dir = self.layout.phase1_checkpoints_dir();
        self.config.phase1_overrides.apply(&mut args);

        backend
            .run_training(&args, &self.dist)
            .await
            .map_err(|source| OrchestratorError::Phase { phase: TrainingPhase::Train1, source })?;

        if let Some(record) = journal.model.train_1.as_mut() {
            record.ended_at_utc = Some(TrainingJournal::now_utc());
        }
        journal.set_current_phase(TrainingPhase::Train2);
        journal.commit(false)?;
        info!("phase train1: complete");
        Ok(())
    }

    async fn run_train2(
        &self,
        journal: &mut TrainingJournal,
        backend: &dyn TrainingBackend,
    ) -> Result<()> {
        info!("phase train2: starting");
        if journal.model.train_2.is_none() {
            journal.model.train_2 =
                Some(TrainPhaseModel::new(self.layout.phase2_checkpoints_dir())?);
            journal.commit(false)?;
        }

        // Phase 2 trains from the newest phase 1 checkpoint. The reserved
        // knowledge gate would pick by score instead.
        let starting_model = latest_checkpoint(&self.layout.phase1_checkpoints_dir())?;
        info!(model = %starting_model.display(), "phase train2: continuing from phase 1 output");

        let mut args = self.base_args.clone();
        args.model_path = starting_model;
        args.data_path = self.config.phase2_data.clone();
        args.ckpt_output_dir = self.layout.phase2_checkpoints_dir();
        self.config.phase2_overrides.apply(&mut args);

        backend
            .run_training(&args, &self.dist)
            .await
            .map_err(|source| OrchestratorError::Phase { phase: TrainingPhase::Train2, source })?;

        if let Some(record) = journal.model.train_2.as_mut() {
            record.ended_at_utc = Some(TrainingJournal::now_utc());
        }
        journal.set_current_phase(TrainingPhase::Eval2);
        journal.commit(false)?;
        info!("phase train2: complete");
        Ok(())
    }

    async fn run_eval2(
        &self,
        journal: &mut TrainingJournal,
        scorer: &dyn CheckpointScorer,
    ) -> Result<()> {
        info!("phase eval2: starting");
        if journal.model.eval_2.is_none() {
            let checkpoints = discover_checkpoints(&self.layout.phase2_checkpoints_dir())?;
            info!(count = checkpoints.len(), "discovered checkpoints to evaluate");
            journal.model.eval_2 = Some(EvalPhaseModel::new(checkpoints)?);
            journal.commit(false)?;
        }

        let already_complete = journal
            .model
            .eval_2
            .as_ref()
            .is_some_and(EvalPhaseModel::is_complete);

        // A run that crashed between the last per-checkpoint commit and the
        // finalize commit has nothing left to score; the winner comes from
        // the recorded results.
        let best = if already_complete {
            let record = journal
                .model
                .eval_2
                .as_ref()
                .ok_or(OrchestratorError::MissingEvalRecord)?;
            info!("all checkpoints already scored; finalizing from recorded results");
            TrainingJournal::best_checkpoint(record)?
        } else {
            evaluate_checkpoints(journal, scorer).await?
        };

        info!(
            checkpoint = %best.checkpoint.display(),
            score = best.score,
            "phase eval2: best checkpoint selected"
        );
        if let Some(record) = journal.model.eval_2.as_mut() {
            record.best_checkpoint = Some(best.clone());
            record.ended_at_utc = Some(TrainingJournal::now_utc());
        }
        journal.model.final_output = Some(best);
        journal.model.ended_at_utc = Some(TrainingJournal::now_utc());
        journal.set_current_phase(TrainingPhase::Done);
        journal.commit(false)?;
        info!("phase eval2: complete");
        Ok(())
    }
}

fn remove_file_if_exists(path: &std::path::Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
