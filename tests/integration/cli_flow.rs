//! Integration tests for the `live-demo` binary
//!
//! Every invocation gets its own data directory so nothing touches the
//! user's ~/.live-demo.

use super::common::workspace::TestWorkspace;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

struct Cli {
    data: TempDir,
    ws: TestWorkspace,
}

impl Cli {
    fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            ws: TestWorkspace::new(),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("live-demo").unwrap();
        cmd.arg("--data-dir")
            .arg(self.data.path())
            .arg("--workspace")
            .arg(&self.ws.path)
            .arg("--instant");
        cmd
    }
}

/// Record two steps from the command line and play them back
#[test]
fn test_record_and_replay_from_cli() {
    let cli = Cli::new();
    let demo = cli.data.path().join("demo.json");
    cli.ws.write("hello.txt", "hello\n");

    cli.cmd()
        .args(["record", "new"])
        .arg(&demo)
        .assert()
        .success()
        .stdout(predicate::str::contains("Recording into"));

    cli.cmd()
        .args(["record", "begin"])
        .arg(cli.ws.file("hello.txt"))
        .assert()
        .success();
    cli.ws.write("hello.txt", "hello world\n");
    cli.cmd()
        .args(["record", "commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded step 1"));

    cli.cmd()
        .args(["record", "begin"])
        .arg(cli.ws.file("hello.txt"))
        .assert()
        .success();
    cli.ws.write("hello.txt", "goodbye world\n");
    cli.cmd()
        .args(["record", "commit", "--mode", "paste"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PASTE"));

    cli.cmd()
        .args(["record", "finish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 steps"));

    cli.ws.write("hello.txt", "hello\n");
    cli.cmd()
        .arg("load")
        .arg(&demo)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 steps"));

    cli.cmd()
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step 1/2"));
    assert_eq!(cli.ws.read("hello.txt"), "hello world\n");

    cli.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("step 1/2 done"));

    cli.cmd().arg("next").assert().success();
    assert_eq!(cli.ws.read("hello.txt"), "goodbye world\n");

    cli.cmd()
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains("playback stopped"));

    cli.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No active session"));
}

/// Committing an unchanged file reports it and keeps the capture open
#[test]
fn test_commit_without_changes_reports_and_keeps_capture() {
    let cli = Cli::new();
    let demo = cli.data.path().join("demo.json");
    cli.ws.write("a.txt", "a\n");

    cli.cmd().args(["record", "new"]).arg(&demo).assert().success();
    cli.cmd()
        .args(["record", "begin"])
        .arg(cli.ws.file("a.txt"))
        .assert()
        .success();
    cli.cmd()
        .args(["record", "commit"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes"));

    cli.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Capturing: a.txt"));
}

/// Playback commands without a loaded recording fail with a hint
#[test]
fn test_next_without_recording_fails() {
    let cli = Cli::new();
    cli.cmd()
        .arg("next")
        .assert()
        .failure()
        .stderr(predicate::str::contains("live-demo load"));
}

/// A malformed recording is rejected at load time
#[test]
fn test_load_rejects_malformed_recording() {
    let cli = Cli::new();
    let demo = cli.data.path().join("bad.json");
    std::fs::write(
        &demo,
        r#"{"steps": [{"filename": "a.txt", "method": "SHOUT", "diff": ""}]}"#,
    )
    .unwrap();

    cli.cmd()
        .arg("load")
        .arg(&demo)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load recording"));
}
