#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
//! Integration tests for the `rds-exporter` binary.
//!
//! Unlike the teacher's Postgres exporter, there is no local "RDS-in-a-box"
//! to start a full scrape against, so these tests only exercise paths that
//! don't require live AWS credentials: flag parsing, validation, and exit
//! codes. The binary is built once via `OnceLock` and reused across tests.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

static BINARY_PATH: OnceLock<PathBuf> = OnceLock::new();

fn get_binary_path() -> &'static PathBuf {
    BINARY_PATH.get_or_init(|| {
        let output = Command::new("cargo")
            .args(["build", "--bin", "rds-exporter"])
            .output()
            .expect("failed to build binary");

        assert!(
            output.status.success(),
            "failed to build binary:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );

        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("target")
            .join("debug")
            .join("rds-exporter")
    })
}

fn run_binary_with_args(args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new(get_binary_path()).args(args).output()
}

#[test]
fn test_binary_help_flag() {
    let output = run_binary_with_args(&["--help"]).expect("failed to execute binary");

    assert!(output.status.success(), "binary should exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("AWS RDS metric exporter"),
        "help output should contain the description"
    );
    assert!(stdout.contains("--aws-regions"));
    assert!(stdout.contains("--listen-address"));
    assert!(stdout.contains("--no-collect-quotas"));
}

#[test]
fn test_binary_version_flag() {
    let output = run_binary_with_args(&["--version"]).expect("failed to execute binary");

    assert!(output.status.success(), "binary should exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("rds-exporter"));
}

#[test]
fn test_binary_rejects_unknown_log_format() {
    let output =
        run_binary_with_args(&["--log-format", "xml"]).expect("failed to execute binary");

    assert!(
        !output.status.success(),
        "an unsupported log-format value should be rejected by clap"
    );
}

/// Without `--aws-regions` (or a config file), the merged config has an
/// empty region list, which `run::handle` rejects as a configuration error
/// (exit code 1, spec §6) before ever touching the network.
#[test]
fn test_binary_exits_with_config_error_when_no_regions_configured() {
    let output = Command::new(get_binary_path())
        .env_remove("PROMETHEUS_RDS_EXPORTER_AWS_REGIONS")
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to start binary")
        .wait_with_output()
        .expect("failed to wait for output");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("configuration error") || stderr.contains("no AWS regions"));
}
