use crate::error::TrainingResult;
use std::path::{Path, PathBuf};

/// File name of the journal inside the phased base directory.
pub const JOURNAL_FILE_NAME: &str = "journalfile.yaml";

/// Filesystem layout of a phased training run.
///
/// Everything lives under one base directory:
///
/// ```text
/// {base}/phase1/checkpoints
/// {base}/phase1/eval_cache
/// {base}/phase2/checkpoints
/// {base}/phase2/eval_cache
/// {base}/journalfile.yaml
/// ```
#[derive(Debug, Clone)]
pub struct PhasedLayout {
    base: PathBuf,
}

impl PhasedLayout {
    #[must_use]
    pub fn new(base: PathBuf) -> Self {
        Self { base }
    }

    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    #[must_use]
    pub fn phase1_dir(&self) -> PathBuf {
        self.base.join("phase1")
    }

    #[must_use]
    pub fn phase2_dir(&self) -> PathBuf {
        self.base.join("phase2")
    }

    #[must_use]
    pub fn phase1_checkpoints_dir(&self) -> PathBuf {
        self.phase1_dir().join("checkpoints")
    }

    #[must_use]
    pub fn phase1_eval_cache_dir(&self) -> PathBuf {
        self.phase1_dir().join("eval_cache")
    }

    #[must_use]
    pub fn phase2_checkpoints_dir(&self) -> PathBuf {
        self.phase2_dir().join("checkpoints")
    }

    #[must_use]
    pub fn phase2_eval_cache_dir(&self) -> PathBuf {
        self.phase2_dir().join("eval_cache")
    }

    /// Default journal location; callers may point the journal elsewhere.
    #[must_use]
    pub fn journal_path(&self) -> PathBuf {
        self.base.join(JOURNAL_FILE_NAME)
    }

    /// Create every directory of the layout.
    pub fn ensure_dirs(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(self.phase1_checkpoints_dir())?;
        std::fs::create_dir_all(self.phase1_eval_cache_dir())?;
        std::fs::create_dir_all(self.phase2_checkpoints_dir())?;
        std::fs::create_dir_all(self.phase2_eval_cache_dir())?;
        Ok(())
    }

    /// Remove both phase directories and the default journal file. Missing
    /// pieces are fine; the end state is what matters.
    pub fn clear(&self) -> TrainingResult<()> {
        for dir in [self.phase1_dir(), self.phase2_dir()] {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        match std::fs::remove_file(self.journal_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = PhasedLayout::new(PathBuf::from("/runs/phased"));

        assert_eq!(layout.phase1_checkpoints_dir(), PathBuf::from("/runs/phased/phase1/checkpoints"));
        assert_eq!(layout.phase2_eval_cache_dir(), PathBuf::from("/runs/phased/phase2/eval_cache"));
        assert_eq!(layout.journal_path(), PathBuf::from("/runs/phased/journalfile.yaml"));
    }

    #[test]
    fn test_ensure_dirs_then_clear() {
        let temp = TempDir::new().unwrap();
        let layout = PhasedLayout::new(temp.path().join("phased"));

        layout.ensure_dirs().unwrap();
        assert!(layout.phase1_checkpoints_dir().is_dir());
        assert!(layout.phase2_checkpoints_dir().is_dir());

        std::fs::write(layout.journal_path(), "current_phase: train1\n").unwrap();
        layout.clear().unwrap();
        assert!(!layout.phase1_dir().exists());
        assert!(!layout.phase2_dir().exists());
        assert!(!layout.journal_path().exists());

        // Clearing an already clean layout is a no-op.
        layout.clear().unwrap();
    }
}
