//! Focused CLI argument parsing tests.
//!
//! These run the binary against small fixture files and an empty audit
//! stream; no flag should need more than that.

#![allow(deprecated)] // Command::cargo_bin is deprecated but replacement requires newer assert_cmd

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
signature "Visit Review" plate 10 visit * fields 8 {
    plate 10;
    plate 11;
}
"#;

fn signet() -> Command {
    let mut cmd = Command::cargo_bin("signet").unwrap();
    cmd.write_stdin("");
    cmd
}

// ============================================================================
// Version / Help
// ============================================================================

#[test]
fn version_flag_shows_version() {
    signet()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("signet"));
}

#[test]
fn short_version_flag_works() {
    signet().arg("-v").assert().success();
}

#[test]
fn help_flag_shows_usage() {
    signet()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--config"));
}

// ============================================================================
// Required arguments
// ============================================================================

#[test]
fn missing_config_is_a_usage_error() {
    signet().assert().failure().code(2);
}

#[test]
fn unreadable_config_exits_two() {
    signet()
        .args(["-c", "/nonexistent/study.sig"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn configuration_errors_abort_with_two() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    fs::write(&config, "signature \"Bad\" plate x visit * fields 8 { plate 10; }").unwrap();

    signet()
        .args(["-c", config.to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("configuration"));
}

// ============================================================================
// Outputs
// ============================================================================

#[test]
fn empty_stream_yields_an_empty_drf() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let drf = temp.path().join("resign.drf");
    fs::write(&config, CONFIG).unwrap();

    signet()
        .args(["-c", config.to_str().unwrap(), "-d", drf.to_str().unwrap()])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&drf).unwrap(), "");
}

#[test]
fn declined_change_lands_in_the_drf() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let drf = temp.path().join("resign.drf");
    fs::write(&config, CONFIG).unwrap();

    let sign = "d|20250101|130000|u1|1001|2|10|0||2||||||u1|8|Signature||";
    let change = "d|20250102|120000|u2|1001|2|11|0||2|||||42|55|12|Weight||";

    Command::cargo_bin("signet")
        .unwrap()
        .args(["-c", config.to_str().unwrap(), "-d", drf.to_str().unwrap()])
        .write_stdin(format!("{sign}\n{change}\n"))
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&drf).unwrap(), "1001|2|10\n");
}

#[test]
fn priority_file_flag_emits_and_exits() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let priority = temp.path().join("priority.txt");
    fs::write(
        &config,
        r#"signature "A" plate 10 visit * fields 8 { plate 10; plate 11 ignore fields 20; }"#,
    )
    .unwrap();

    signet()
        .args([
            "-c",
            config.to_str().unwrap(),
            "-P",
            priority.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&priority).unwrap(), "10|8|3\n11|20|1\n");
}

#[test]
fn report_flag_writes_headers() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let report = temp.path().join("report.txt");
    fs::write(&config, CONFIG).unwrap();

    signet()
        .args(["-c", config.to_str().unwrap(), "-x", report.to_str().unwrap()])
        .assert()
        .success();

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.starts_with("Region|Country|Center|Patient ID"));
}

#[test]
fn sdv_report_renames_the_signature_columns() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let report = temp.path().join("report.txt");
    fs::write(&config, CONFIG).unwrap();

    signet()
        .args([
            "-c",
            config.to_str().unwrap(),
            "-x",
            report.to_str().unwrap(),
            "-S",
        ])
        .assert()
        .success();

    let text = fs::read_to_string(&report).unwrap();
    assert!(text.contains("SDV Plate"));
    assert!(text.contains("SDV By"));
}

#[test]
fn db_flag_creates_the_signings_schema() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("study.sig");
    let db = temp.path().join("signings.db");
    fs::write(&config, CONFIG).unwrap();

    signet()
        .args(["-c", config.to_str().unwrap(), "-D", db.to_str().unwrap()])
        .assert()
        .success();

    assert!(db.exists());
}
