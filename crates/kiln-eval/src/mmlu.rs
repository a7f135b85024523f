use crate::error::ScorerResult;
use crate::scorer::{CheckpointScorer, run_for_score};
use crate::serving::ServingConfig;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// MMLU as an external program.
///
/// Kept for the reserved knowledge gate between the two training phases and
/// for standalone runs; the phased orchestrator never invokes it today.
#[derive(Debug, Clone)]
pub struct MmluScorer {
    program: PathBuf,
    /// Custom task bundle; omitted for the stock MMLU task set.
    tasks_dir: Option<PathBuf>,
    few_shots: u32,
    serving: ServingConfig,
}

impl MmluScorer {
    #[must_use]
    pub fn new(program: PathBuf, serving: ServingConfig) -> Self {
        Self { program, tasks_dir: None, few_shots: 5, serving }
    }

    #[must_use]
    pub fn with_tasks_dir(mut self, tasks_dir: PathBuf) -> Self {
        self.tasks_dir = Some(tasks_dir);
        self
    }

    #[must_use]
    pub fn with_few_shots(mut self, few_shots: u32) -> Self {
        self.few_shots = few_shots;
        self
    }

    fn build_command(&self, checkpoint: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--model")
            .arg(checkpoint)
            .arg("--few-shots")
            .arg(self.few_shots.to_string())
            .arg("--serving-backend")
            .arg(self.serving.backend.to_string())
            .arg("--gpus")
            .arg(self.serving.gpus.to_string());
        if let Some(tasks_dir) = &self.tasks_dir {
            cmd.arg("--tasks-dir").arg(tasks_dir);
        }
        cmd
    }
}

#[async_trait]
impl CheckpointScorer for MmluScorer {
    fn id(&self) -> &'static str {
        "mmlu"
    }

    async fn score(&self, checkpoint: &Path) -> ScorerResult<f64> {
        info!(checkpoint = %checkpoint.display(), few_shots = self.few_shots, "running MMLU");
        let score = run_for_score(&self.program, self.build_command(checkpoint)).await?;
        debug!(checkpoint = %checkpoint.display(), score, "MMLU finished");
        Ok(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_build_command_includes_tasks_dir_only_when_set() {
        let serving = ServingConfig::default();
        let plain = MmluScorer::new(PathBuf::from("mmlu"), serving);
        let cmd = plain.build_command(Path::new("/ckpt"));
        let flags: Vec<OsString> =
            cmd.get_args().map(std::ffi::OsStr::to_os_string).collect();
        assert!(!flags.contains(&OsString::from("--tasks-dir")));
        assert!(flags.contains(&OsString::from("--few-shots")));
        assert!(flags.contains(&OsString::from("5")));

        let branched = MmluScorer::new(PathBuf::from("mmlu"), serving)
            .with_tasks_dir(PathBuf::from("/tasks"))
            .with_few_shots(2);
        let cmd = branched.build_command(Path::new("/ckpt"));
        let flags: Vec<OsString> =
            cmd.get_args().map(std::ffi::OsStr::to_os_string).collect();
        assert!(flags.contains(&OsString::from("--tasks-dir")));
        assert!(flags.contains(&OsString::from("2")));
    }
}
