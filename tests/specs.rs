// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Workspace-level integration tests for the `ignite` binary in telinit
//! mode. The binary never runs as pid 1 here, so it always takes the
//! client path.

use assert_cmd::Command;

fn ignite() -> Command {
    match Command::cargo_bin("ignite") {
        Ok(cmd) => cmd,
        Err(e) => panic!("ignite binary not built: {e}"),
    }
}

#[test]
fn no_argument_prints_usage_and_exits_one() {
    let output = ignite().output().expect("spawn ignite");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("usage"), "stderr was: {stderr}");
}

#[test]
fn help_exits_zero() {
    for flag in ["-h", "-?"] {
        let output = ignite().arg(flag).output().expect("spawn ignite");
        assert_eq!(output.status.code(), Some(0), "flag {flag}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("usage"), "stdout was: {stdout}");
    }
}

#[test]
fn version_exits_zero() {
    for flag in ["-v", "-V"] {
        let output = ignite().arg(flag).output().expect("spawn ignite");
        assert_eq!(output.status.code(), Some(0), "flag {flag}");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("ignite "), "stdout was: {stdout}");
    }
}

#[test]
fn unknown_option_exits_one() {
    let output = ignite().arg("-x").output().expect("spawn ignite");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn compat_options_alone_still_mean_nothing_to_do() {
    let output = ignite().args(["-a", "-b"]).output().expect("spawn ignite");
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn runlevel_without_a_daemon_fails_cleanly() {
    // No init is listening on the control socket in the test
    // environment; the delegated command must fail, not hang.
    let output = ignite().arg("3").output().expect("spawn ignite");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cannot reach init"), "stderr was: {stderr}");
}
