//! Resumable checkpoint evaluation: one journal commit per scored
//! checkpoint.

use crate::error::{OrchestratorError, Result};
use kiln_eval::CheckpointScorer;
use kiln_training::{EvalResult, TrainingJournal};
use tracing::info;

/// Score every unfinished checkpoint of the journal's evaluation phase.
///
/// The journal is committed after each checkpoint, so a crash loses at most
/// the evaluation in flight. Calling this with nothing left to do is an
/// error: the caller should have recognized the phase as finished.
///
/// Returns the best result across all recorded scores, including ones from
/// earlier, interrupted invocations.
pub async fn evaluate_checkpoints(
    journal: &mut TrainingJournal,
    scorer: &dyn CheckpointScorer,
) -> Result<EvalResult> {
    let todo = journal
        .model
        .eval_2
        .as_ref()
        .ok_or(OrchestratorError::MissingEvalRecord)?
        .unfinished();
    if todo.is_empty() {
        return Err(OrchestratorError::NothingToEvaluate);
    }

    info!(count = todo.len(), scorer = scorer.id(), "evaluating unfinished checkpoints");
    for checkpoint in &todo {
        let score = scorer.score(checkpoint).await.map_err(|source| {
            OrchestratorError::Scoring { checkpoint: checkpoint.clone(), source }
        })?;
        info!(checkpoint = %checkpoint.display(), score, "checkpoint scored");

        let result = EvalResult::new(checkpoint.clone(), score)?;
        let record = journal
            .model
            .eval_2
            .as_mut()
            .ok_or(OrchestratorError::MissingEvalRecord)?;
        record.record_result(result);
        journal.commit(false)?;
    }

    let record = journal
        .model
        .eval_2
        .as_ref()
        .ok_or(OrchestratorError::MissingEvalRecord)?;
    Ok(TrainingJournal::best_checkpoint(record)?)
}
