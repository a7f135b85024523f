//! Kiln Training
//!
//! Training-domain primitives for the phased workflow:
//! - The durable training journal (`TrainingJournal`, `JournalModel`)
//! - Phase sequencing (`TrainingPhase`)
//! - Backend arguments (`TrainingArgs`, `DistributedArgs`)
//! - Checkpoint discovery under `hf_format/`
//! - The `TrainingBackend` trait and its command adapter

pub mod args;
pub mod backend;
pub mod checkpoints;
pub mod error;
pub mod journal;
pub mod layout;
pub mod phase;

pub use args::{DistributedArgs, DistributedBackend, PhaseOverrides, TrainingArgs};
pub use backend::{CommandBackend, TrainingBackend};
pub use checkpoints::{HF_FORMAT_DIR, checkpoint_number, discover_checkpoints, latest_checkpoint};
pub use error::{TrainingError, TrainingResult};
pub use journal::{EvalPhaseModel, EvalResult, JournalModel, TrainPhaseModel, TrainingJournal};
pub use layout::{JOURNAL_FILE_NAME, PhasedLayout};
pub use phase::TrainingPhase;
