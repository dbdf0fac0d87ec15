//! Smoke tests for the pilotador CLI.
//!
//! These exercise the flag surface and exit-code contract without any
//! automation servers: unknown identifiers must fail before a session is
//! attempted, and an empty scenario selection must exit clean.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the pilotador binary
fn pilotador() -> Command {
    Command::cargo_bin("pilotador").expect("pilotador binary should exist")
}

#[test]
fn test_version_flag() {
    pilotador()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.1"));
}

#[test]
fn test_help_lists_platform_surface() {
    pilotador()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--platform"))
        .stdout(predicate::str::contains("--browser"))
        .stdout(predicate::str::contains("--retries"))
        .stdout(predicate::str::contains("--flaky-tests-only"))
        .stdout(predicate::str::contains("--distributed"));
}

#[test]
fn test_unknown_platform_fails_fast() {
    pilotador()
        .args(["--platform", "windows-phone"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported platform"));
}

#[test]
fn test_unknown_browser_fails_fast() {
    pilotador()
        .args(["--platform", "web", "--browser", "netscape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported browser"));
}

#[test]
fn test_empty_selection_exits_clean() {
    let reports = TempDir::new().unwrap();
    pilotador()
        .args([
            "--platform",
            "web",
            "--filter",
            "no_such_scenario",
            "--reports-dir",
        ])
        .arg(reports.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("PASSED"));

    // An empty session still persists its run metadata
    let results = reports.path().join("results");
    let run_files: Vec<_> = std::fs::read_dir(results)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("run_info_"))
        .collect();
    assert_eq!(run_files.len(), 1);
}

#[test]
fn test_empty_selection_writes_trend_report() {
    let reports = TempDir::new().unwrap();
    pilotador()
        .args(["--platform", "ios", "--filter", "nothing", "--reports-dir"])
        .arg(reports.path())
        .assert()
        .success();

    let trend = reports.path().join("results").join("trend_report.json");
    let text = std::fs::read_to_string(trend).unwrap();
    assert!(text.contains("runs"));
}
