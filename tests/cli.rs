//! CLI behaviour tests
//!
//! Argument handling, exit codes and report sections of the `probe` binary.
//! Runs only touch the loopback interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::net::TcpListener;
use std::process::Command;

fn probe_cmd() -> Command {
    let mut cmd = Command::cargo_bin("probe").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_no_arguments_prints_usage_and_fails() {
    probe_cmd()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--host"))
        .stderr(predicate::str::contains("USAGE:"))
        .stderr(predicate::str::contains("OPTIONS:"))
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_blank_host_is_rejected() {
    probe_cmd()
        .args(["--host", "   "])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("USAGE:"));
}

#[test]
fn test_unknown_flag_prints_error_and_help() {
    probe_cmd()
        .args(["-h", "127.0.0.1", "--bogus"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--bogus"))
        .stderr(predicate::str::contains("OPTIONS:"));
}

#[test]
fn test_invalid_timeout_is_rejected() {
    probe_cmd()
        .args(["-h", "127.0.0.1", "-t", "0"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_invalid_port_list_is_rejected() {
    probe_cmd()
        .args(["-h", "127.0.0.1", "-p", "90-80", "--ping-only"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Port list help"));
}

#[test]
fn test_ping_only_conflicts_with_stage_flags() {
    probe_cmd()
        .args(["-h", "127.0.0.1", "--ping-only", "--dns-check"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_long_help() {
    probe_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("USAGE:"))
        .stdout(predicate::str::contains("--traceroute"));
}

#[test]
fn test_ping_only_run_prints_connectivity_section() {
    probe_cmd()
        .args(["--host", "127.0.0.1", "--ping-only", "--timeout", "500", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diagnostic report for 127.0.0.1"))
        .stdout(predicate::str::contains("[Connectivity]"))
        .stdout(predicate::str::contains("Resolved address: 127.0.0.1"))
        .stdout(predicate::str::contains("[DNS]").not())
        .stdout(predicate::str::contains("[Ports]").not());
}

#[test]
fn test_selected_stages_with_explicit_ports() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    probe_cmd()
        .args(["-h", "127.0.0.1", "--dns-check", "-p", &port, "-t", "500", "--no-color"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[Connectivity]"))
        .stdout(predicate::str::contains("[DNS]"))
        .stdout(predicate::str::contains("[Ports]"))
        .stdout(predicate::str::contains(format!("Open ports: {}", port)))
        .stdout(predicate::str::contains("[Web]").not())
        .stdout(predicate::str::contains("[Trace]").not());
}

#[test]
fn test_json_output_is_parseable() {
    let output = probe_cmd()
        .args(["-h", "127.0.0.1", "--ping-only", "-t", "500", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["target"], "127.0.0.1");
    assert_eq!(
        value["connectivity"]["result"]["resolved_address"],
        "127.0.0.1"
    );
    assert!(value["dns"].is_null());
}
