use crate::error::{TrainingError, TrainingResult};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Subdirectory where the training backend writes Hugging Face format
/// checkpoints, one `samples_<n>` directory per save.
pub const HF_FORMAT_DIR: &str = "hf_format";

/// Trailing integer in a checkpoint directory name (`samples_4830` -> 4830).
#[must_use]
pub fn checkpoint_number(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    let digits: String = name.chars().rev().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.chars().rev().collect::<String>().parse().ok()
}

/// Newest first: descending trailing number, unnumbered entries last,
/// ties broken by name.
pub(crate) fn compare_newest_first(a: &Path, b: &Path) -> Ordering {
    checkpoint_number(b)
        .cmp(&checkpoint_number(a))
        .then_with(|| a.cmp(b))
}

/// List the checkpoint directories under `{ckpt_root}/hf_format`, newest
/// first.
///
/// Errors with the expected directory when `hf_format` is missing or holds
/// no subdirectories, so a phase that produced nothing fails loudly instead
/// of evaluating an empty set.
pub fn discover_checkpoints(ckpt_root: &Path) -> TrainingResult<Vec<PathBuf>> {
    let hf_dir = ckpt_root.join(HF_FORMAT_DIR);
    let dir = match std::fs::read_dir(&hf_dir) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TrainingError::CheckpointsNotFound { dir: hf_dir });
        }
        Err(e) => return Err(e.into()),
    };

    let mut out = Vec::new();
    for entry in dir {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            out.push(path);
        }
    }
    if out.is_empty() {
        return Err(TrainingError::CheckpointsNotFound { dir: hf_dir });
    }
    out.sort_by(|a, b| compare_newest_first(a, b));
    Ok(out)
}

/// The most recent checkpoint under `{ckpt_root}/hf_format`.
pub fn latest_checkpoint(ckpt_root: &Path) -> TrainingResult<PathBuf> {
    let mut found = discover_checkpoints(ckpt_root)?;
    Ok(found.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_checkpoints(root: &Path, names: &[&str]) {
        let hf_dir = root.join(HF_FORMAT_DIR);
        for name in names {
            std::fs::create_dir_all(hf_dir.join(name)).unwrap();
        }
    }

    #[test]
    fn test_checkpoint_number_parses_trailing_digits() {
        assert_eq!(checkpoint_number(Path::new("x/samples_4830")), Some(4830));
        assert_eq!(checkpoint_number(Path::new("samples_0")), Some(0));
        assert_eq!(checkpoint_number(Path::new("x/final")), None);
    }

    #[test]
    fn test_discover_sorts_newest_first() {
        let temp = TempDir::new().unwrap();
        make_checkpoints(temp.path(), &["samples_200", "samples_1000", "samples_500"]);
        // A stray file must be ignored.
        std::fs::write(temp.path().join(HF_FORMAT_DIR).join("config.json"), "{}").unwrap();

        let found = discover_checkpoints(temp.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["samples_1000", "samples_500", "samples_200"]);

        let latest = latest_checkpoint(temp.path()).unwrap();
        assert!(latest.ends_with("samples_1000"));
    }

    #[test]
    fn test_discover_errors_name_the_expected_dir() {
        let temp = TempDir::new().unwrap();

        let err = discover_checkpoints(temp.path()).unwrap_err();
        assert!(err.to_string().contains(HF_FORMAT_DIR));

        // An existing but empty hf_format is just as useless.
        std::fs::create_dir_all(temp.path().join(HF_FORMAT_DIR)).unwrap();
        let err = discover_checkpoints(temp.path()).unwrap_err();
        assert!(matches!(err, TrainingError::CheckpointsNotFound { .. }));
    }

    #[test]
    fn test_unnumbered_checkpoints_sort_last() {
        let temp = TempDir::new().unwrap();
        make_checkpoints(temp.path(), &["final", "samples_100"]);

        let found = discover_checkpoints(temp.path()).unwrap();
        assert!(found[0].ends_with("samples_100"));
        assert!(found[1].ends_with("final"));
    }
}
