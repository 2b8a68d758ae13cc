//! Integration tests for CLI commands.

use serde_json::json;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn write_config(dir: &TempDir, config: serde_json::Value) -> String {
    let path = dir.path().join("logsearch.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path.to_string_lossy().to_string()
}

fn unreachable_config(dir: &TempDir) -> String {
    write_config(
        dir,
        json!({ "hostname": "127.0.0.1", "port": 1, "index": "logstore", "timeout_secs": 2 }),
    )
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_logsearch"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    let success = output.status.success();

    (success, stdout, stderr)
}

#[test]
fn test_help_lists_commands() {
    let (success, stdout, _) = run_cli(&["--help"]);
    assert!(success);
    for command in ["status", "create-index", "insert", "select", "count", "contexts", "purge"] {
        assert!(stdout.contains(command), "missing {} in help", command);
    }
}

#[test]
fn test_missing_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.json");
    let (success, _, stderr) = run_cli(&["--config", path.to_str().unwrap(), "status"]);
    assert!(!success);
    assert!(stderr.contains("Failed to load config"));
}

#[test]
fn test_config_without_index_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(&temp_dir, json!({ "hostname": "localhost" }));
    let (success, _, stderr) = run_cli(&["--config", &config, "count"]);
    assert!(!success);
    assert!(stderr.contains("index name is not set"));
}

#[test]
fn test_status_reports_unreachable_engine() {
    let temp_dir = TempDir::new().unwrap();
    let config = unreachable_config(&temp_dir);
    let (success, stdout, stderr) = run_cli(&["--config", &config, "status"]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unreachable"));
}

#[test]
fn test_select_fails_cleanly_when_engine_is_down() {
    let temp_dir = TempDir::new().unwrap();
    let config = unreachable_config(&temp_dir);
    let (success, _, stderr) = run_cli(&[
        "--config", &config, "select", "--where", "userid = ?", "--param", "5",
    ]);
    assert!(!success);
    assert!(stderr.starts_with("Error: "));
}

#[test]
fn test_insert_rejects_invalid_ndjson() {
    let temp_dir = TempDir::new().unwrap();
    let config = unreachable_config(&temp_dir);
    let input = temp_dir.path().join("events.ndjson");
    fs::write(&input, "{\"eventname\": \"x\"\nnot json\n").unwrap();
    let (success, _, stderr) = run_cli(&["--config", &config, "insert", input.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Invalid event on line 1"));
}
