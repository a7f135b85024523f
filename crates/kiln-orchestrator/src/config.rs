use kiln_training::PhaseOverrides;
use std::path::PathBuf;

/// What to do when a journal from an earlier run is found at the journal
/// path. Decided once by the caller; the orchestrator never prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Continue from the journal's current phase.
    #[default]
    Resume,
    /// Wipe the phased cache and journal, then start over.
    Clear,
    /// Refuse to run and surface the decision to the operator.
    Fail,
}

/// Run-level inputs for the phased orchestrator.
///
/// Training knobs live in `TrainingArgs`; this is everything else the run
/// needs: where the phased cache lives, what data feeds each phase, and how
/// to react to a previous run's journal.
#[derive(Debug, Clone)]
pub struct PhasedConfig {
    /// Base directory of the phased cache.
    pub base_dir: PathBuf,
    /// Journal location override; `None` means `{base_dir}/journalfile.yaml`.
    pub journal_path: Option<PathBuf>,
    pub phase1_data: PathBuf,
    pub phase2_data: PathBuf,
    /// Judge model for the final benchmark; must be an absolute path to an
    /// existing directory.
    pub judge_model: PathBuf,
    pub phase1_overrides: PhaseOverrides,
    pub phase2_overrides: PhaseOverrides,
    pub resume: ResumePolicy,
}

impl PhasedConfig {
    #[must_use]
    pub fn new(base_dir: PathBuf, phase1_data: PathBuf, phase2_data: PathBuf, judge_model: PathBuf) -> Self {
        Self {
            base_dir,
            journal_path: None,
            phase1_data,
            phase2_data,
            judge_model,
            phase1_overrides: PhaseOverrides::default(),
            phase2_overrides: PhaseOverrides::default(),
            resume: ResumePolicy::default(),
        }
    }
}
