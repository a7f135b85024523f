use std::path::PathBuf;
use thiserror::Error;

pub type ScorerResult<T> = std::result::Result<T, ScorerError>;

#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("invalid serving config: {0}")]
    InvalidConfig(String),

    #[error("failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("{} exited with {status}: {stderr}", program.display())]
    Failed {
        program: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("could not parse a score from {} output: {output:?}", program.display())]
    ParseScore { program: PathBuf, output: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
