//! Corruption recovery tests for medlog.
//!
//! These tests verify the system can handle:
//! - Corrupted log files
//! - Empty or truncated log files
//! - Logs written by the browser tracker

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medlog"));
    cmd.env("MEDLOG_CONFIG", dir.join("config.toml"))
        .arg("--data-dir")
        .arg(dir);
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_log_file_reads_as_empty() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(dir.join("medication_logs.json"), "{ invalid json }}}}")
        .expect("Failed to write corrupted log file");

    cli(dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No medication logs yet."));
}

#[test]
fn test_recording_over_corrupted_file_starts_fresh() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let path = dir.join("medication_logs.json");

    fs::write(&path, "[{\"id\":1,\"medicine\":").unwrap();

    cli(dir)
        .args(["take", "Aspirin", "--at", "2024-03-01T08:00:00Z"])
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    let logs: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["medicine"], "Aspirin");
}

#[test]
fn test_empty_log_file() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(dir.join("medication_logs.json"), "").unwrap();

    cli(dir)
        .arg("last")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not taken yet"));
}

#[test]
fn test_wrong_shape_reads_as_empty() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(dir.join("medication_logs.json"), r#"{"medicationLogs": []}"#).unwrap();

    cli(dir)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No medication logs yet."));
}

#[test]
fn test_browser_export_loads() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(
        dir.join("medication_logs.json"),
        r#"[{"id":1709280000000,"medicine":"Ibuprofen","dateTime":"2024-03-01T08:00:00.000Z","isEdited":false},
            {"id":1709283600000,"medicine":"Aspirin","dateTime":"2024-03-01T09:00:00.000Z","isEdited":true}]"#,
    )
    .unwrap();

    cli(dir)
        .args(["history", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1709280000000"))
        .stdout(predicate::str::contains("(edited)"));

    cli(dir)
        .args(["delete", "1709280000000", "--pin", "0000"])
        .assert()
        .success();

    cli(dir)
        .args(["history", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ibuprofen").not());
}

#[test]
fn test_recording_after_max_id_does_not_overflow() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();
    let path = dir.join("medication_logs.json");

    fs::write(
        &path,
        r#"[{"id":9223372036854775807,"medicine":"Aspirin","dateTime":"2024-03-01T08:00:00Z","isEdited":false}]"#,
    )
    .unwrap();

    cli(dir)
        .args(["take", "Ibuprofen", "--at", "2024-03-01T09:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Id: 0"));

    let content = fs::read_to_string(&path).unwrap();
    let logs: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
    let ids: Vec<i64> = logs.iter().map(|l| l["id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![i64::MAX, 0]);
}

#[test]
fn test_padded_pin_in_config_is_reported() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(dir.join("config.toml"), "[security]\npin = \" 12 \"\n").unwrap();

    cli(dir)
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("whitespace"));
}

#[test]
fn test_invalid_config_is_reported() {
    let temp_dir = setup_test_dir();
    let dir = temp_dir.path();

    fs::write(dir.join("config.toml"), "[security]\npin = \"\"\n").unwrap();

    cli(dir)
        .arg("history")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pin must not be empty"));
}
