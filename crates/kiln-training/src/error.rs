use std::path::PathBuf;
use thiserror::Error;

pub type TrainingResult<T> = std::result::Result<T, TrainingError>;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid training args: {0}")]
    InvalidArgs(String),

    #[error("journal error: {0}")]
    Journal(String),

    #[error("journal model error: {0}")]
    Model(String),

    #[error("no checkpoints found in {}", dir.display())]
    CheckpointsNotFound { dir: PathBuf },

    #[error("no evaluation results to pick a best checkpoint from")]
    NoResults,

    #[error("training backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
