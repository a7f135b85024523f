use crate::args::{DistributedArgs, TrainingArgs};
use crate::error::{TrainingError, TrainingResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Command;
use tracing::info;

/// A training backend runs one phase of training to completion.
///
/// `run_training` returns only once checkpoints are fully written under
/// `{ckpt_output_dir}/hf_format/`. Any error is fatal for the run; the
/// orchestrator does not retry.
#[async_trait]
pub trait TrainingBackend: Send + Sync {
    fn id(&self) -> &'static str;

    async fn run_training(
        &self,
        args: &TrainingArgs,
        dist: &DistributedArgs,
    ) -> TrainingResult<()>;
}

/// Backend that shells out to an operator-configured training launcher.
///
/// The launcher gets torchrun-style rendezvous flags followed by the
/// training flags; entries from `args.extra` are appended as
/// `--kebab-case-key value` pairs, with `true` booleans as bare flags and
/// `false` booleans dropped.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: PathBuf,
}

impl CommandBackend {
    #[must_use]
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    fn build_command(&self, args: &TrainingArgs, dist: &DistributedArgs) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--nproc-per-node")
            .arg(dist.nproc_per_node.to_string())
            .arg("--nnodes")
            .arg(dist.nnodes.to_string())
            .arg("--node-rank")
            .arg(dist.node_rank.to_string())
            .arg("--rdzv-id")
            .arg(dist.rdzv_id.to_string())
            .arg("--rdzv-endpoint")
            .arg(&dist.rdzv_endpoint)
            .arg("--model-path")
            .arg(&args.model_path)
            .arg("--data-path")
            .arg(&args.data_path)
            .arg("--ckpt-output-dir")
            .arg(&args.ckpt_output_dir)
            .arg("--num-epochs")
            .arg(args.num_epochs.to_string())
            .arg("--effective-batch-size")
            .arg(args.effective_batch_size.to_string())
            .arg("--save-samples")
            .arg(args.save_samples.to_string())
            .arg("--max-seq-len")
            .arg(args.max_seq_len.to_string())
            .arg("--learning-rate")
            .arg(args.learning_rate.to_string())
            .arg("--distributed-backend")
            .arg(args.distributed_backend.to_string());

        for (key, value) in &args.extra {
            let flag = format!("--{}", key.replace('_', "-"));
            match value {
                serde_json::Value::Bool(true) => {
                    cmd.arg(flag);
                }
                serde_json::Value::Bool(false) => {}
                serde_json::Value::String(s) => {
                    cmd.arg(flag).arg(s);
                }
                other => {
                    cmd.arg(flag).arg(other.to_string());
                }
            }
        }
        cmd
    }
}

#[async_trait]
impl TrainingBackend for CommandBackend {
    fn id(&self) -> &'static str {
        "command"
    }

    async fn run_training(
        &self,
        args: &TrainingArgs,
        dist: &DistributedArgs,
    ) -> TrainingResult<()> {
        let mut cmd = tokio::process::Command::from(self.build_command(args, dist));
        info!(
            program = %self.program.display(),
            data = %args.data_path.display(),
            out = %args.ckpt_output_dir.display(),
            "launching training"
        );
        // Stdio is inherited so training output streams to the operator.
        let status = cmd.status().await?;
        if !status.success() {
            return Err(TrainingError::Backend(format!(
                "training command {} exited with {status}",
                self.program.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn collect_args(cmd: &Command) -> Vec<OsString> {
        cmd.get_args().map(std::ffi::OsStr::to_os_string).collect()
    }

    #[test]
    fn test_build_command_passes_training_flags() {
        let backend = CommandBackend::new(PathBuf::from("/usr/bin/train"));
        let mut args = TrainingArgs::new(
            PathBuf::from("/models/base"),
            PathBuf::from("/data/p1.jsonl"),
            PathBuf::from("/out"),
        );
        args.num_epochs = 7;
        let dist = DistributedArgs { nproc_per_node: 4, ..DistributedArgs::default() };

        let cmd = backend.build_command(&args, &dist);
        let flags = collect_args(&cmd);

        assert!(flags.contains(&OsString::from("--num-epochs")));
        assert!(flags.contains(&OsString::from("7")));
        assert!(flags.contains(&OsString::from("--nproc-per-node")));
        assert!(flags.contains(&OsString::from("4")));
        assert!(flags.contains(&OsString::from("--rdzv-endpoint")));
        assert!(flags.contains(&OsString::from("--distributed-backend")));
        assert!(flags.contains(&OsString::from("fsdp")));
    }

    #[test]
    fn test_extra_booleans_become_bare_flags_or_nothing() {
        let backend = CommandBackend::new(PathBuf::from("train"));
        let mut args = TrainingArgs::new(
            PathBuf::from("/m"),
            PathBuf::from("/d"),
            PathBuf::from("/o"),
        );
        args.extra.insert("is_padding_free".to_string(), serde_json::json!(true));
        args.extra.insert("use_dolomite".to_string(), serde_json::json!(false));
        args.extra.insert("lora_rank".to_string(), serde_json::json!(4));

        let cmd = backend.build_command(&args, &DistributedArgs::default());
        let flags = collect_args(&cmd);

        assert!(flags.contains(&OsString::from("--is-padding-free")));
        assert!(!flags.contains(&OsString::from("--use-dolomite")));
        let lora_pos = flags.iter().position(|f| f == "--lora-rank").unwrap();
        assert_eq!(flags[lora_pos + 1], OsString::from("4"));
    }
}
