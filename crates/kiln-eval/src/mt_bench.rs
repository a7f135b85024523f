use crate::error::ScorerResult;
use crate::scorer::{CheckpointScorer, run_for_score};
use crate::serving::ServingConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// MT-Bench as an external program.
///
/// The program is expected to serve the checkpoint, judge its answers with
/// `judge_model`, keep its working files under `output_dir`, and print the
/// final score as the last line of stdout.
#[derive(Debug, Clone)]
pub struct MtBenchScorer {
    program: PathBuf,
    judge_model: PathBuf,
    output_dir: PathBuf,
    serving: ServingConfig,
}

impl MtBenchScorer {
    #[must_use]
    pub fn new(
        program: PathBuf,
        judge_model: PathBuf,
        output_dir: PathBuf,
        serving: ServingConfig,
    ) -> Self {
        Self { program, judge_model, output_dir, serving }
    }

    fn build_command(&self, checkpoint: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--model")
            .arg(checkpoint)
            .arg("--judge-model")
            .arg(&self.judge_model)
            .arg("--output-dir")
            .arg(&self.output_dir)
            .arg("--serving-backend")
            .arg(self.serving.backend.to_string())
            .arg("--gpus")
            .arg(self.serving.gpus.to_string());
        cmd
    }
}

#[async_trait]
impl CheckpointScorer for MtBenchScorer {
    fn id(&self) -> &'static str {
        "mt-bench"
    }

    async fn score(&self, checkpoint: &Path) -> ScorerResult<f64> {
        std::fs::create_dir_all(&self.output_dir)?;
        info!(checkpoint = %checkpoint.display(), "running MT-Bench");
        let score = run_for_score(&self.program, self.build_command(checkpoint)).await?;
        debug!(checkpoint = %checkpoint.display(), score, "MT-Bench finished");
        Ok(score)
    }
}
