//! End-to-end checks of the command-line surface. None of these start a
//! real timer: they cover argument, config and spec errors that must fail
//! before the first tick.

use std::io::Write;
use std::process::Command;

/// Runs the binary and returns (exit code, stdout, stderr).
fn run_cli(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_pomodoro"))
        .args(args)
        .env_remove("POMODORO_CONFIG")
        .env_remove("POMODORO_LOG")
        .output()
        .expect("failed to execute pomodoro");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn help_lists_subcommands() {
    let (code, stdout, _) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("work"));
    assert!(stdout.contains("break"));
    assert!(stdout.contains("cycle"));
}

#[test]
fn version_exits_zero() {
    let (code, stdout, _) = run_cli(&["--version"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("pomodoro "));
}

#[test]
fn missing_subcommand_fails() {
    let (code, _, _) = run_cli(&[]);
    assert_eq!(code, 1);
}

#[test]
fn unknown_subcommand_fails() {
    let (code, _, stderr) = run_cli(&["nap"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("nap"));
}

#[test]
fn zero_minutes_fails() {
    let (code, stdout, _) = run_cli(&["work", "--minutes", "0"]);
    assert_eq!(code, 1);
    assert!(!stdout.contains("Starting"));
}

#[test]
fn non_integer_minutes_fails() {
    let (code, _, stderr) = run_cli(&["break", "-m", "five"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("five"));
}

#[test]
fn zero_cycles_fails() {
    let (code, _, _) = run_cli(&["cycle", "--cycles", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn tick_longer_than_session_fails_before_start() {
    let config = config_file("");
    let path = config.path().to_str().unwrap();
    let (code, stdout, stderr) = run_cli(&["--config", path, "--tick", "2m", "work", "-m", "1"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid countdown"), "stderr: {stderr}");
    assert!(!stdout.contains("Starting"));
}

#[test]
fn tick_longer_than_break_fails_whole_cycle() {
    let config = config_file("");
    let path = config.path().to_str().unwrap();
    let (code, stdout, _) = run_cli(&[
        "--config", path, "--tick", "3m", "cycle", "-w", "5", "-b", "2",
    ]);
    assert_eq!(code, 1);
    assert!(!stdout.contains("Starting"));
}

#[test]
fn bad_tick_flag_fails() {
    let config = config_file("");
    let path = config.path().to_str().unwrap();
    let (code, _, stderr) = run_cli(&["--config", path, "--tick", "soon", "work"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid --tick"), "stderr: {stderr}");
}

#[test]
fn sub_second_tick_flag_fails() {
    let config = config_file("");
    let path = config.path().to_str().unwrap();
    let (code, stdout, stderr) = run_cli(&["--config", path, "--tick", "500ms", "work"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid --tick"), "stderr: {stderr}");
    assert!(!stdout.contains("Starting"));
}

#[test]
fn missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let (code, _, stderr) = run_cli(&["--config", path.to_str().unwrap(), "work"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("failed to read config"), "stderr: {stderr}");
}

#[test]
fn malformed_config_fails() {
    let config = config_file("work = \"long\"\n");
    let path = config.path().to_str().unwrap();
    let (code, _, stderr) = run_cli(&["--config", path, "work"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("failed to parse config"), "stderr: {stderr}");
}

#[test]
fn config_tick_is_validated_against_session() {
    let config = config_file("break = 1\ntick = \"90s\"\n");
    let path = config.path().to_str().unwrap();
    let (code, _, stderr) = run_cli(&["--config", path, "break"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("exceeds total duration"), "stderr: {stderr}");
}
