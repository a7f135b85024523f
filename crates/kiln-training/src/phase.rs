use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases of a phased training run, in execution order.
///
/// `Eval1` is the reserved MMLU gate between the two training phases. It is
/// carried in the data model and the journal schema but is not part of the
/// live sequence: `next()` routes `Train2` directly to `Eval2`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TrainingPhase {
    #[default]
    Train1,
    Train2,
    Eval1,
    Eval2,
    Done,
}

impl TrainingPhase {
    /// The phase that follows this one, or `None` once the run is done.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Train1 => Some(Self::Train2),
            Self::Train2 | Self::Eval1 => Some(Self::Eval2),
            Self::Eval2 => Some(Self::Done),
            Self::Done => None,
        }
    }

    #[must_use]
    pub fn is_done(self) -> bool {
        self == Self::Done
    }

    /// Whether `self` has already been passed when the run is at `current`.
    #[must_use]
    pub fn is_behind(self, current: Self) -> bool {
        self < current
    }
}

impl fmt::Display for TrainingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Train1 => "train1",
            Self::Train2 => "train2",
            Self::Eval1 => "eval1",
            Self::Eval2 => "eval2",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_sequence_skips_eval1() {
        assert_eq!(TrainingPhase::Train1.next(), Some(TrainingPhase::Train2));
        assert_eq!(TrainingPhase::Train2.next(), Some(TrainingPhase::Eval2));
        assert_eq!(TrainingPhase::Eval2.next(), Some(TrainingPhase::Done));
        assert_eq!(TrainingPhase::Done.next(), None);
    }

    #[test]
    fn test_phase_ordering_is_forward_only() {
        assert!(TrainingPhase::Train1 < TrainingPhase::Train2);
        assert!(TrainingPhase::Train2 < TrainingPhase::Eval2);
        assert!(TrainingPhase::Eval2 < TrainingPhase::Done);
        assert!(TrainingPhase::Train1.is_behind(TrainingPhase::Eval2));
        assert!(!TrainingPhase::Done.is_behind(TrainingPhase::Train1));
    }

    #[test]
    fn test_phase_serde_values_are_lowercase() {
        let yaml = serde_yaml::to_string(&TrainingPhase::Train2).unwrap();
        assert_eq!(yaml.trim(), "train2");
        let parsed: TrainingPhase = serde_yaml::from_str("eval2").unwrap();
        assert_eq!(parsed, TrainingPhase::Eval2);
    }
}
