//! Kiln CLI - Command-line interface for the Kiln training orchestrator
//!
//! This CLI provides a `kiln` command for running phased multi-stage
//! training, inspecting the training journal, and scoring checkpoints.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{eval, journal, train};

/// Kiln CLI - Durable phased training orchestration
///
/// Kiln drives a model through two training rounds and a final benchmark,
/// journaling every phase boundary so an interrupted run can pick up where
/// it left off.
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    author,
    version,
    about = "Kiln - Durable phased training orchestration",
    long_about = "Kiln drives a model through two training rounds and a final benchmark.\nEvery phase boundary is committed to an on-disk journal, so an interrupted run\nresumes from the last completed phase instead of starting over."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run training
    ///
    /// Drives the phased pipeline: train on phase 1 data, continue from the
    /// newest checkpoint on phase 2 data, then benchmark every phase 2
    /// checkpoint and select the best one.
    #[command(subcommand)]
    Train(train::TrainCommand),

    /// Inspect or clear the training journal
    ///
    /// The journal records how far a phased run got and which checkpoints
    /// have been scored. `show` renders it; `clear` deletes it along with
    /// the phased cache.
    #[command(subcommand)]
    Journal(journal::JournalCommand),

    /// Score checkpoints with a benchmark
    ///
    /// One-off scoring outside a phased run, using the same benchmark
    /// commands the orchestrator invokes.
    #[command(subcommand)]
    Eval(eval::EvalCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let cli_config = config::load_config();

    // Initialize tracing; the CLI flag wins over the config file.
    let level = match args
        .log_level
        .as_deref()
        .or(cli_config.log_level.as_deref())
        .unwrap_or("info")
    {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // If no command provided, show help
    let command = if let Some(cmd) = args.command {
        cmd
    } else {
        Args::command().print_help()?;
        return Ok(());
    };

    // Execute command
    match command {
        Command::Train(cmd) => {
            train::execute(cmd, &cli_config).await?;
        }
        Command::Journal(cmd) => {
            journal::execute(cmd)?;
        }
        Command::Eval(cmd) => {
            eval::execute(cmd, &cli_config).await?;
        }
    }

    Ok(())
}
