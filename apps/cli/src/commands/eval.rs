//! One-off checkpoint scoring commands.
//!
//! These run the same benchmark executables the phased orchestrator invokes,
//! against a single checkpoint, without touching any journal.

use crate::config::{self, KilnCliConfig};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use kiln_eval::{CheckpointScorer, MmluScorer, MtBenchScorer, ServingConfig};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Benchmark subcommands
#[derive(Subcommand, Debug)]
pub enum EvalCommand {
    /// Judge a checkpoint with the multi-turn benchmark
    MtBench {
        /// Checkpoint directory to score
        #[arg(long)]
        model: PathBuf,

        /// Judge model directory
        #[arg(long)]
        judge_model: PathBuf,

        /// Directory for benchmark artifacts
        #[arg(long, default_value = "mt_bench_output")]
        output_dir: PathBuf,

        /// Serving backend (vllm, llama-cpp)
        #[arg(long)]
        serving_backend: Option<String>,

        /// GPUs for serving
        #[arg(long)]
        gpus: Option<u32>,

        /// Benchmark executable (overrides config)
        #[arg(long)]
        mt_bench_exec: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score a checkpoint on knowledge tasks
    Mmlu {
        /// Checkpoint directory to score
        #[arg(long)]
        model: PathBuf,

        /// Custom tasks directory
        #[arg(long)]
        tasks_dir: Option<PathBuf>,

        /// Few-shot examples per task
        #[arg(long)]
        few_shots: Option<u32>,

        /// Serving backend (vllm, llama-cpp)
        #[arg(long)]
        serving_backend: Option<String>,

        /// GPUs for serving
        #[arg(long)]
        gpus: Option<u32>,

        /// Benchmark executable (overrides config)
        #[arg(long)]
        mmlu_exec: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(command: EvalCommand, cli_config: &KilnCliConfig) -> Result<()> {
    match command {
        EvalCommand::MtBench {
            model,
            judge_model,
            output_dir,
            serving_backend,
            gpus,
            mt_bench_exec,
            json,
        } => {
            let exec = config::resolve_exec(
                mt_bench_exec,
                cli_config.mt_bench_exec.as_deref(),
                "--mt-bench-exec",
                "mt_bench_exec",
            )?;
            let serving = cli_config.serving_config(serving_backend.as_deref(), gpus)?;
            mt_bench(exec, model, judge_model, output_dir, serving, json).await
        }
        EvalCommand::Mmlu {
            model,
            tasks_dir,
            few_shots,
            serving_backend,
            gpus,
            mmlu_exec,
            json,
        } => {
            let exec = config::resolve_exec(
                mmlu_exec,
                cli_config.mmlu_exec.as_deref(),
                "--mmlu-exec",
                "mmlu_exec",
            )?;
            let serving = cli_config.serving_config(serving_backend.as_deref(), gpus)?;
            mmlu(exec, model, tasks_dir, few_shots, serving, json).await
        }
    }
}

async fn mt_bench(
    exec: PathBuf,
    model: PathBuf,
    judge_model: PathBuf,
    output_dir: PathBuf,
    serving: ServingConfig,
    json_output: bool,
) -> Result<()> {
    let scorer = MtBenchScorer::new(exec, judge_model, output_dir, serving);
    let score = scorer
        .score(&model)
        .await
        .with_context(|| format!("failed to score {}", model.display()))?;
    report("mt-bench", &model, score, json_output)
}

async fn mmlu(
    exec: PathBuf,
    model: PathBuf,
    tasks_dir: Option<PathBuf>,
    few_shots: Option<u32>,
    serving: ServingConfig,
    json_output: bool,
) -> Result<()> {
    let mut scorer = MmluScorer::new(exec, serving);
    if let Some(tasks_dir) = tasks_dir {
        scorer = scorer.with_tasks_dir(tasks_dir);
    }
    if let Some(few_shots) = few_shots {
        scorer = scorer.with_few_shots(few_shots);
    }
    let score = scorer
        .score(&model)
        .await
        .with_context(|| format!("failed to score {}", model.display()))?;
    report("mmlu", &model, score, json_output)
}

fn report(benchmark: &str, model: &Path, score: f64, json_output: bool) -> Result<()> {
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "benchmark": benchmark,
                "checkpoint": model,
                "score": score,
            }))?
        );
        return Ok(());
    }

    println!();
    println!("{}", "Benchmark complete".bold().green());
    println!("  Benchmark: {}", benchmark.cyan());
    println!("  Checkpoint: {}", model.display().to_string().cyan());
    println!("  Score: {}", format!("{score:.2}").cyan());
    println!();
    Ok(())
}
