//! Integration tests for the `gatecode` CLI binary.
//!
//! These tests validate argument parsing, help output, shell completions,
//! error exit codes, and the snapshot-driven edit flow. Command-center
//! traffic goes to a local mock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `gatecode` binary with env isolation.
///
/// Clears all `GATECODE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn gatecode_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("gatecode");
    cmd.env("HOME", "/tmp/gatecode-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/gatecode-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("GATECODE_PROFILE")
        .env_remove("GATECODE_COMMAND_CENTER")
        .env_remove("GATECODE_API_KEY")
        .env_remove("GATECODE_OUTPUT")
        .env_remove("GATECODE_INSECURE")
        .env_remove("GATECODE_TIMEOUT");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write_snapshot(dir: &Path, rental_state: &str, codes: serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("snapshot.json");
    let snapshot = json!({
        "users": [
            { "userId": 10, "companyUuid": "acme", "sites": ["5"] },
            { "userId": 11, "companyUuid": "acme", "sites": ["5"] }
        ],
        "units": [
            { "unitId": 100, "siteId": 5, "rentalState": rental_state },
            { "unitId": 200, "siteId": 5, "rentalState": "rented" }
        ],
        "codes": codes
    });
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

fn edit_args(snapshot: &Path) -> Vec<String> {
    [
        "edit",
        "--snapshot",
        snapshot.to_str().unwrap(),
        "--site",
        "5",
        "--company",
        "acme",
        "--user",
        "10",
        "--unit",
        "100",
        "--code",
        "445566",
        "--dry-run",
        "-o",
        "plain",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = gatecode_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    gatecode_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("access codes")
            .and(predicate::str::contains("revoke"))
            .and(predicate::str::contains("set"))
            .and(predicate::str::contains("edit")),
    );
}

#[test]
fn test_version_flag() {
    gatecode_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gatecode"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    gatecode_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    gatecode_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_points_at_gatecode_dir() {
    gatecode_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gatecode").and(predicate::str::contains("config.toml")));
}

// ── Check ───────────────────────────────────────────────────────────

#[test]
fn test_check_accepts_policy_compliant_code() {
    gatecode_cmd()
        .args(["check", "445566", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("445566\tvalid"));
}

#[test]
fn test_check_rejects_with_reasons_and_usage_exit() {
    let output = gatecode_cmd()
        .args(["check", "12", "-o", "json-compact"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#""reasons":["too_short"]"#), "{stdout}");
}

// ── Command center ──────────────────────────────────────────────────

#[test]
fn test_revoke_without_config_fails() {
    let output = gatecode_cmd()
        .args(["revoke", "--site", "5", "--unit", "100", "-y"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("Configuration file not found"),
        "Expected missing-config error:\n{text}"
    );
}

#[test]
fn test_revoke_requires_confirmation_when_not_interactive() {
    let output = gatecode_cmd()
        .args([
            "-c",
            "https://cc.example.invalid",
            "revoke",
            "--site",
            "5",
            "--unit",
            "100",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("requires confirmation"));
}

#[test]
fn test_set_without_site_is_usage_error() {
    let output = gatecode_cmd()
        .args(["-c", "https://cc.example.invalid", "set", "--unit", "100"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("site"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_calls_command_center() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sites/5/access-codes/set"))
        .and(header("X-API-KEY", "cc-key"))
        .and(body_json(json!({ "unitIds": [100, 200], "options": [] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "ok" },
            "data": [
                { "unitId": 100, "status": "queued" },
                { "unitId": 200, "status": "queued" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        gatecode_cmd()
            .args([
                "-c", &uri, "--api-key", "cc-key", "set", "--site", "5", "--unit", "100",
                "--unit", "200", "-o", "json-compact",
            ])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(stdout.contains(r#""unitId":100"#), "{stdout}");
    assert!(stdout.contains(r#""status":"queued""#), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_command_center_envelope_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/sites/5/access-codes/set"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "meta": { "rc": "error", "msg": "unit offline" }
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        gatecode_cmd()
            .args(["-c", &uri, "set", "--site", "5", "--unit", "100"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("unit offline"));
}

// ── Edit ────────────────────────────────────────────────────────────

#[test]
fn test_edit_dry_run_supersedes_live_code() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(
        dir.path(),
        "rented",
        json!([{ "accessCode": "111111", "unitId": 100, "userId": 10, "siteId": 5, "state": "active" }]),
    );

    let mut args = edit_args(&snapshot);
    args.push("--write".into());
    gatecode_cmd().args(&args).assert().success().stdout(
        predicate::str::contains("100\t111111\tremove")
            .and(predicate::str::contains("100\t445566\tsetup")),
    );

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    let states: Vec<&str> = written["codes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["state"].as_str().unwrap())
        .collect();
    assert_eq!(states, vec!["remove", "setup"]);
}

#[test]
fn test_edit_locked_unit_is_permission_error() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), "gatelock", json!([]));

    let output = gatecode_cmd().args(edit_args(&snapshot)).output().unwrap();
    assert_eq!(output.status.code(), Some(5));
    assert!(combined_output(&output).contains("unit in gatelock"));
}

#[test]
fn test_edit_duplicate_code_is_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(
        dir.path(),
        "rented",
        json!([{ "accessCode": "445566", "unitId": 200, "userId": 11, "siteId": 5, "state": "active" }]),
    );

    let output = gatecode_cmd().args(edit_args(&snapshot)).output().unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("duplicate access code"));
}

#[test]
fn test_edit_unknown_user_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), "rented", json!([]));

    let mut args = edit_args(&snapshot);
    let user = args.iter().position(|a| a == "--user").unwrap();
    args[user + 1] = "99".into();

    let output = gatecode_cmd().args(&args).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_edit_missing_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let output = gatecode_cmd()
        .args(edit_args(&dir.path().join("absent.json")))
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}
