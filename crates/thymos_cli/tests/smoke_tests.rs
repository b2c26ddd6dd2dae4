//! CLI smoke tests: basic binary behavior.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

fn cli_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_thymos"));
    // Keep the host environment from leaking provider settings into tests.
    cmd.env_remove("THYMOS_PROVIDER")
        .env_remove("THYMOS_STATE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn run_hook(state_dir: &Path, event: &str, extra: &[&str]) -> Output {
    let mut child = cli_bin()
        .env("THYMOS_STATE_DIR", state_dir)
        .args(extra)
        .arg("hook")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(event.as_bytes())
        .unwrap();
    child.wait_with_output().expect("failed to wait")
}

#[test]
fn test_help_flag() {
    let output = cli_bin().arg("--help").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Usage"),
        "Expected usage info in --help output"
    );
}

#[test]
fn test_version_flag() {
    let output = cli_bin().arg("--version").output().expect("failed to run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("thymos"),
        "Expected binary name in --version output"
    );
}

#[test]
fn test_dry_run_hook_prints_block() {
    let dir = tempfile::tempdir().unwrap();
    let event = r#"{"agent_id": "main", "user_key": "alice",
        "messages": [{"role": "user", "content": "hello"}]}"#;

    let output = run_hook(
        dir.path(),
        event,
        &["--dry-run", "--config", "/tmp/nonexistent_thymos_config_12345.toml"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("<emotion_state>"), "got: {}", stdout);
    assert!(stdout.contains("Felt mildly calm because Mock classification."));
    assert!(dir.path().join("main").join("emotion-state.json").is_file());
}

#[test]
fn test_garbage_event_exits_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_hook(dir.path(), "not json at all", &["--dry-run"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_show_empty_state_prints_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli_bin()
        .env("THYMOS_STATE_DIR", dir.path())
        .args(["show", "--agent", "main"])
        .output()
        .expect("failed to run");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}
