// Error types for phased orchestration

use kiln_training::TrainingPhase;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Orchestration errors
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Bad or missing run configuration, caught before any state changes
    #[error("invalid phased config: {0}")]
    InvalidConfig(String),

    /// An earlier journal exists and the resume policy forbids continuing
    #[error("existing journal at {} and resume policy is fail; pass a resume or clear decision", path.display())]
    ResumeRefused { path: PathBuf },

    /// A training phase failed
    #[error("phase {phase} failed: {source}")]
    Phase {
        phase: TrainingPhase,
        source: kiln_training::TrainingError,
    },

    /// Scoring one checkpoint failed
    #[error("evaluation failed for {}: {source}", checkpoint.display())]
    Scoring {
        checkpoint: PathBuf,
        source: kiln_eval::ScorerError,
    },

    /// The evaluator was invoked with no unfinished checkpoints
    #[error("evaluation phase has no unfinished checkpoints")]
    NothingToEvaluate,

    /// The evaluator was invoked before the evaluation record was created
    #[error("no evaluation phase record in the journal")]
    MissingEvalRecord,

    /// The journal claims the run is done but records no winner
    #[error("journal is marked done but has no final output")]
    MissingFinalOutput,

    /// Training-domain error outside a specific phase
    #[error(transparent)]
    Training(#[from] kiln_training::TrainingError),

    /// IO error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Other error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
