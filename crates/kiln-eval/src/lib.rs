//! Kiln Eval
//!
//! Benchmark collaborators for the phased workflow: the `CheckpointScorer`
//! trait, serving configuration, and command adapters for MT-Bench and
//! MMLU. The benchmark math itself lives in the external programs these
//! adapters launch.

pub mod error;
pub mod mmlu;
pub mod mt_bench;
pub mod scorer;
pub mod serving;

pub use error::{ScorerError, ScorerResult};
pub use mmlu::MmluScorer;
pub use mt_bench::MtBenchScorer;
pub use scorer::CheckpointScorer;
pub use serving::{ServingBackend, ServingConfig};
