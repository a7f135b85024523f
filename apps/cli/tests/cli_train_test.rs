//! Integration tests for the `kiln train phased` command.
//!
//! End-to-end runs use stub shell scripts in place of the training launcher
//! and the benchmark, so they are unix-only.

use assert_cmd::Command;
use kiln_training::{PhasedLayout, TrainingJournal, TrainingPhase};
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

fn kiln() -> Command {
    Command::cargo_bin("kiln-cli").unwrap()
}

struct Setup {
    temp: TempDir,
}

impl Setup {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("phase1.jsonl"), "{}\n").unwrap();
        std::fs::write(temp.path().join("phase2.jsonl"), "{}\n").unwrap();
        std::fs::create_dir_all(temp.path().join("judge-model")).unwrap();
        Self { temp }
    }

    fn base_dir(&self) -> PathBuf {
        self.temp.path().join("phased")
    }

    /// A `kiln train phased` invocation with the required inputs filled in
    /// and the config file lookup pointed at the sandbox.
    fn phased_cmd(&self) -> Command {
        let mut cmd = kiln();
        cmd.env("HOME", self.temp.path());
        cmd.args(["train", "phased"]);
        cmd.arg("--base-dir").arg(self.base_dir());
        cmd.arg("--model").arg(self.temp.path().join("base-model"));
        cmd.arg("--phase1-data").arg(self.temp.path().join("phase1.jsonl"));
        cmd.arg("--phase2-data").arg(self.temp.path().join("phase2.jsonl"));
        cmd.arg("--judge-model").arg(self.temp.path().join("judge-model"));
        cmd
    }
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::write(path, body).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

/// Stub launcher that logs the invocation and fabricates one checkpoint in
/// whatever output directory it was pointed at.
#[cfg(unix)]
fn write_train_stub(setup: &Setup, call_log: &std::path::Path) -> PathBuf {
    let path = setup.temp.path().join("fake-train.sh");
    let body = format!(
        "#!/bin/sh\n\
         echo call >> {}\n\
         out=\"\"\n\
         while [ \"$#\" -gt 0 ]; do\n\
         \tif [ \"$1\" = \"--ckpt-output-dir\" ]; then\n\
         \t\tout=\"$2\"\n\
         \tfi\n\
         \tshift\n\
         done\n\
         mkdir -p \"$out/hf_format/samples_100\"\n",
        call_log.display()
    );
    write_script(&path, &body);
    path
}

#[cfg(unix)]
fn write_bench_stub(setup: &Setup, score: &str) -> PathBuf {
    let path = setup.temp.path().join("fake-bench.sh");
    write_script(&path, &format!("#!/bin/sh\necho {score}\n"));
    path
}

#[test]
fn test_phased_requires_training_launcher() {
    let setup = Setup::new();

    setup.phased_cmd().assert().failure().stderr(predicate::str::contains("--train-exec"));
}

#[test]
fn test_phased_rejects_missing_phase1_data() {
    let setup = Setup::new();
    std::fs::remove_file(setup.temp.path().join("phase1.jsonl")).unwrap();

    setup
        .phased_cmd()
        .arg("--train-exec")
        .arg("/bin/true")
        .arg("--mt-bench-exec")
        .arg("/bin/true")
        .assert()
        .failure()
        .stderr(predicate::str::contains("phase 1 data not found"));
}

#[cfg(unix)]
#[test]
fn test_phased_runs_end_to_end() {
    let setup = Setup::new();
    let call_log = setup.temp.path().join("train-calls.log");
    let train_exec = write_train_stub(&setup, &call_log);
    let bench_exec = write_bench_stub(&setup, "0.71");

    setup
        .phased_cmd()
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success()
        .stdout(predicate::str::contains("Phased training complete"))
        .stdout(predicate::str::contains("samples_100"))
        .stdout(predicate::str::contains("0.71"));

    // One launcher call per training phase.
    assert_eq!(std::fs::read_to_string(&call_log).unwrap().lines().count(), 2);

    let journal =
        TrainingJournal::new(&PhasedLayout::new(setup.base_dir()).journal_path()).unwrap();
    assert!(journal.was_loaded());
    assert_eq!(journal.current_phase(), TrainingPhase::Done);
    assert!(journal.model.final_output.is_some());
}

#[cfg(unix)]
#[test]
fn test_phased_json_output() {
    let setup = Setup::new();
    let call_log = setup.temp.path().join("train-calls.log");
    let train_exec = write_train_stub(&setup, &call_log);
    let bench_exec = write_bench_stub(&setup, "0.71");

    let assert = setup
        .phased_cmd()
        .arg("--json")
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success();

    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("train JSON output should be valid JSON");

    assert!((json["score"].as_f64().unwrap() - 0.71).abs() < f64::EPSILON);
    assert!(json["best_checkpoint"].as_str().unwrap().ends_with("samples_100"));
    assert!(json["run_id"].is_string());
}

#[cfg(unix)]
#[test]
fn test_phased_second_run_needs_a_decision() {
    let setup = Setup::new();
    let call_log = setup.temp.path().join("train-calls.log");
    let train_exec = write_train_stub(&setup, &call_log);
    let bench_exec = write_bench_stub(&setup, "0.71");

    setup
        .phased_cmd()
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success();
    assert_eq!(std::fs::read_to_string(&call_log).unwrap().lines().count(), 2);

    // A second invocation sees the journal and refuses without a decision.
    setup
        .phased_cmd()
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--clear"));

    // Resuming a finished run trains nothing and reports the recorded best.
    setup
        .phased_cmd()
        .arg("-y")
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success()
        .stdout(predicate::str::contains("0.71"));
    assert_eq!(std::fs::read_to_string(&call_log).unwrap().lines().count(), 2);
}

#[cfg(unix)]
#[test]
fn test_phased_clear_starts_over() {
    let setup = Setup::new();
    let call_log = setup.temp.path().join("train-calls.log");
    let train_exec = write_train_stub(&setup, &call_log);
    let bench_exec = write_bench_stub(&setup, "0.71");

    setup
        .phased_cmd()
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success();

    setup
        .phased_cmd()
        .arg("--clear")
        .arg("--train-exec")
        .arg(&train_exec)
        .arg("--mt-bench-exec")
        .arg(&bench_exec)
        .assert()
        .success();

    // Both phases ran twice.
    assert_eq!(std::fs::read_to_string(&call_log).unwrap().lines().count(), 4);
}
