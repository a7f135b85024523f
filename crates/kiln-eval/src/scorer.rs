use crate::error::{ScorerError, ScorerResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Command;

/// Scores one checkpoint; higher is better.
///
/// A scorer is self-contained: it may start and stop its own serving
/// process per call. Callers only sequence calls and record scores.
#[async_trait]
pub trait CheckpointScorer: Send + Sync {
    fn id(&self) -> &'static str;

    async fn score(&self, checkpoint: &Path) -> ScorerResult<f64>;
}

/// Run a benchmark program to completion and parse its score.
///
/// Shared plumbing for the command adapters: spawn failures, non-zero
/// exits, and unparseable output each get their own error.
pub(crate) async fn run_for_score(program: &Path, cmd: Command) -> ScorerResult<f64> {
    let output = tokio::process::Command::from(cmd).output().await.map_err(|source| {
        ScorerError::Spawn { program: program.to_path_buf(), source }
    })?;
    if !output.status.success() {
        return Err(ScorerError::Failed {
            program: program.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    parse_score(program, &output.stdout)
}

/// The score is the last non-empty line of stdout.
pub(crate) fn parse_score(program: &Path, stdout: &[u8]) -> ScorerResult<f64> {
    let text = String::from_utf8_lossy(stdout);
    let last = text
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("")
        .trim();
    last.parse::<f64>().map_err(|_| ScorerError::ParseScore {
        program: program.to_path_buf(),
        output: last.to_string(),
    })
}
