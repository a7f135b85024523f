//! The training journal: the progress model for a phased run plus the
//! durable YAML store it is committed to.

pub mod model;
pub mod store;

pub use model::{EvalPhaseModel, EvalResult, JournalModel, TrainPhaseModel};
pub use store::TrainingJournal;
