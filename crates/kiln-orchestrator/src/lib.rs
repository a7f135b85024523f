//! Kiln Orchestrator
//!
//! The phased training state machine (`PhasedTrainer`) and the resumable
//! checkpoint evaluator it drives. Both operate on the journal from
//! `kiln-training` and collaborate with a `TrainingBackend` and a
//! `CheckpointScorer` supplied by the caller.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod phased;

pub use config::{PhasedConfig, ResumePolicy};
pub use error::{OrchestratorError, Result};
pub use evaluator::evaluate_checkpoints;
pub use phased::PhasedTrainer;
