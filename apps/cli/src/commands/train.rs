//! Training command implementation.

use crate::config::{self, KilnCliConfig};
use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use kiln_eval::MtBenchScorer;
use kiln_orchestrator::{OrchestratorError, PhasedConfig, PhasedTrainer, ResumePolicy};
use kiln_training::{
    CommandBackend, DistributedArgs, DistributedBackend, PhaseOverrides, PhasedLayout,
    TrainingArgs, TrainingJournal,
};
use serde_json::json;
use std::path::PathBuf;

/// Training subcommands
#[derive(Subcommand, Debug)]
pub enum TrainCommand {
    /// Run the phased pipeline: two training rounds, then a benchmark
    ///
    /// Trains on the phase 1 data, continues from the newest phase 1
    /// checkpoint on the phase 2 data, then judges every phase 2 checkpoint
    /// and reports the best one. Progress is journaled at every phase
    /// boundary so an interrupted run resumes where it stopped.
    Phased(PhasedArgs),
}

/// Arguments for `kiln train phased`.
#[derive(clap::Args, Debug)]
pub struct PhasedArgs {
    /// Base directory for the phased cache (checkpoints, benchmark output, journal)
    #[arg(long)]
    pub base_dir: PathBuf,

    /// Starting model for phase 1
    #[arg(long)]
    pub model: PathBuf,

    /// Phase 1 training data
    #[arg(long)]
    pub phase1_data: PathBuf,

    /// Phase 2 training data
    #[arg(long)]
    pub phase2_data: PathBuf,

    /// Judge model directory for the final benchmark (absolute path)
    #[arg(long)]
    pub judge_model: PathBuf,

    /// Journal location (defaults to <BASE_DIR>/journalfile.yaml)
    #[arg(long)]
    pub journal_path: Option<PathBuf>,

    /// Override the number of epochs for phase 1
    #[arg(long)]
    pub phase1_epochs: Option<u32>,

    /// Override the checkpoint save interval (in samples) for phase 1
    #[arg(long)]
    pub phase1_save_samples: Option<u32>,

    /// Override the effective batch size for phase 1
    #[arg(long)]
    pub phase1_batch_size: Option<u32>,

    /// Override the number of epochs for phase 2
    #[arg(long)]
    pub phase2_epochs: Option<u32>,

    /// Override the checkpoint save interval (in samples) for phase 2
    #[arg(long)]
    pub phase2_save_samples: Option<u32>,

    /// Override the effective batch size for phase 2
    #[arg(long)]
    pub phase2_batch_size: Option<u32>,

    /// Maximum sequence length in tokens
    #[arg(long)]
    pub max_seq_len: Option<u32>,

    /// Learning rate
    #[arg(long)]
    pub learning_rate: Option<f64>,

    /// Distributed training backend (fsdp, deepspeed)
    #[arg(long)]
    pub distributed_backend: Option<String>,

    /// Processes (GPUs) per node
    #[arg(long)]
    pub nproc_per_node: Option<u32>,

    /// Number of nodes
    #[arg(long)]
    pub nnodes: Option<u32>,

    /// Rank of this node
    #[arg(long)]
    pub node_rank: Option<u32>,

    /// Rendezvous id shared by all nodes
    #[arg(long)]
    pub rdzv_id: Option<u32>,

    /// Rendezvous endpoint (host:port)
    #[arg(long)]
    pub rdzv_endpoint: Option<String>,

    /// Training launcher executable (overrides config)
    #[arg(long)]
    pub train_exec: Option<PathBuf>,

    /// Benchmark executable (overrides config)
    #[arg(long)]
    pub mt_bench_exec: Option<PathBuf>,

    /// Serving backend for the benchmark (vllm, llama-cpp)
    #[arg(long)]
    pub serving_backend: Option<String>,

    /// GPUs for benchmark serving
    #[arg(long)]
    pub gpus: Option<u32>,

    /// Resume a previous run without asking
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Discard any previous run and start over
    #[arg(long)]
    pub clear: bool,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(command: TrainCommand, cli_config: &KilnCliConfig) -> Result<()> {
    match command {
        TrainCommand::Phased(args) => phased(args, cli_config).await,
    }
}

async fn phased(args: PhasedArgs, cli_config: &KilnCliConfig) -> Result<()> {
    let train_exec = config::resolve_exec(
        args.train_exec,
        cli_config.train_exec.as_deref(),
        "--train-exec",
        "train_exec",
    )?;
    let mt_bench_exec = config::resolve_exec(
        args.mt_bench_exec,
        cli_config.mt_bench_exec.as_deref(),
        "--mt-bench-exec",
        "mt_bench_exec",
    )?;
    let serving = cli_config.serving_config(args.serving_backend.as_deref(), args.gpus)?;

    let mut base_args =
        TrainingArgs::new(args.model, args.phase1_data.clone(), args.base_dir.clone());
    if let Some(max_seq_len) = args.max_seq_len {
        base_args.max_seq_len = max_seq_len;
    }
    if let Some(learning_rate) = args.learning_rate {
        base_args.learning_rate = learning_rate;
    }
    if let Some(ref name) = args.distributed_backend {
        base_args.distributed_backend = name.parse::<DistributedBackend>()?;
    }

    let mut dist = DistributedArgs::default();
    if let Some(nproc_per_node) = args.nproc_per_node {
        dist.nproc_per_node = nproc_per_node;
    }
    if let Some(nnodes) = args.nnodes {
        dist.nnodes = nnodes;
    }
    if let Some(node_rank) = args.node_rank {
        dist.node_rank = node_rank;
    }
    if let Some(rdzv_id) = args.rdzv_id {
        dist.rdzv_id = rdzv_id;
    }
    if let Some(rdzv_endpoint) = args.rdzv_endpoint {
        dist.rdzv_endpoint = rdzv_endpoint;
    }

    let mut phased_config = PhasedConfig::new(
        args.base_dir,
        args.phase1_data,
        args.phase2_data,
        args.judge_model.clone(),
    );
    phased_config.journal_path = args.journal_path;
    phased_config.phase1_overrides = PhaseOverrides {
        num_epochs: args.phase1_epochs,
        save_samples: args.phase1_save_samples,
        effective_batch_size: args.phase1_batch_size,
    };
    phased_config.phase2_overrides = PhaseOverrides {
        num_epochs: args.phase2_epochs,
        save_samples: args.phase2_save_samples,
        effective_batch_size: args.phase2_batch_size,
    };
    phased_config.resume = if args.clear {
        ResumePolicy::Clear
    } else if args.yes {
        ResumePolicy::Resume
    } else {
        ResumePolicy::Fail
    };

    let layout = PhasedLayout::new(phased_config.base_dir.clone());
    let journal_path =
        phased_config.journal_path.clone().unwrap_or_else(|| layout.journal_path());

    if !args.json {
        println!();
        println!("{}", "Phased training".bold().cyan());
        println!("  Base dir: {}", phased_config.base_dir.display().to_string().cyan());
        println!("  Phase 1 data: {}", phased_config.phase1_data.display().to_string().dimmed());
        println!("  Phase 2 data: {}", phased_config.phase2_data.display().to_string().dimmed());
        println!("  Judge model: {}", phased_config.judge_model.display().to_string().dimmed());
        println!("  Launcher: {}", train_exec.display().to_string().dimmed());
        println!();
    }

    let backend = CommandBackend::new(train_exec);
    let scorer = MtBenchScorer::new(
        mt_bench_exec,
        args.judge_model,
        layout.phase2_eval_cache_dir(),
        serving,
    );
    let trainer = PhasedTrainer::new(phased_config, base_args, dist)?;

    let best = match trainer.run(&backend, &scorer).await {
        Ok(best) => best,
        Err(OrchestratorError::ResumeRefused { path }) => {
            anyhow::bail!(
                "found an existing journal at {}; pass --yes to resume it or --clear to start over",
                path.display()
            );
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        let journal = TrainingJournal::new(&journal_path)
            .context("failed to reload the journal after the run")?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "run_id": journal.model.run_id,
                "best_checkpoint": best.checkpoint,
                "score": best.score,
                "journal": journal_path,
            }))?
        );
        return Ok(());
    }

    println!();
    println!("{}", "Phased training complete".bold().green());
    println!("  Best checkpoint: {}", best.checkpoint.display().to_string().cyan());
    println!("  Score: {}", format!("{:.2}", best.score).cyan());
    println!("  Journal: {}", journal_path.display().to_string().dimmed());
    println!();
    Ok(())
}
