//! CLI smoke tests: verify basic binary behavior.

use std::path::Path;
use std::process::Command;

fn cli_bin(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_flow"));
    cmd.arg("--config")
        .arg("/tmp/nonexistent_flow_config_12345.toml")
        .env("FLOW_DATA_DIR", data_dir)
        .env("LLM_PROVIDER", "mock")
        .env("RUST_LOG", "warn")
        .env_remove("FLOW_API_URL");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to run");
    assert!(
        output.status.success(),
        "command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_flag() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(cli_bin(dir.path()).arg("--help"));
    assert!(stdout.contains("Usage"), "Expected usage info in --help output");
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("focus"));
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(cli_bin(dir.path()).arg("--version"));
    assert!(stdout.contains("flow"), "Expected binary name in --version output");
}

#[test]
fn test_prefs_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let shown = stdout_of(cli_bin(dir.path()).args(["prefs", "show"]));
    assert!(shown.contains("\"workMinutes\": 25"));

    let set = stdout_of(cli_bin(dir.path()).args([
        "prefs",
        "set",
        "--work-minutes",
        "50",
        "--coach",
        "minimal",
    ]));
    assert!(set.contains("\"workMinutes\": 50"));

    let shown = stdout_of(cli_bin(dir.path()).args(["prefs", "show"]));
    assert!(shown.contains("\"workMinutes\": 50"));
    assert!(shown.contains("\"coachPersonality\": \"minimal\""));
    assert!(dir.path().join("preferences.json").exists());
}

#[test]
fn test_prefs_rejects_out_of_range() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli_bin(dir.path())
        .args(["prefs", "set", "--work-minutes", "500"])
        .output()
        .expect("failed to run");
    assert!(!output.status.success());
}

#[test]
fn test_schedule_without_backend_uses_mock_data() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(cli_bin(dir.path()).args(["schedule", "plan", "my", "day"]));
    assert!(stdout.contains("Math Lecture"));
    assert!(stdout.contains("09:00-10:30"));

    let reply = stdout_of(cli_bin(dir.path()).args(["chat", "hello"]));
    assert!(reply.contains("I heard: hello."));
}

#[test]
fn test_plan_with_empty_workspace() {
    let dir = tempfile::tempdir().unwrap();
    let stdout = stdout_of(cli_bin(dir.path()).args(["plan", "schedule", "my", "week"]));
    assert!(stdout.contains("Nothing scheduled."));
    assert!(dir.path().join("memory.json").exists());
}

#[test]
fn test_plan_uses_local_preferences() {
    let dir = tempfile::tempdir().unwrap();
    stdout_of(cli_bin(dir.path()).args(["prefs", "set", "--study-time", "14:00"]));
    let stdout = stdout_of(cli_bin(dir.path()).args(["plan", "--json", "plan", "my", "day"]));
    assert!(stdout.contains("\"preferredStudyTime\": \"14:00\""));
}
