// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn help_and_version_flags() {
    assert_eq!(parse_args(&args(&["-h"])), Parsed::Help);
    assert_eq!(parse_args(&args(&["-?"])), Parsed::Help);
    assert_eq!(parse_args(&args(&["-v"])), Parsed::Version);
    assert_eq!(parse_args(&args(&["-V"])), Parsed::Version);
}

#[test]
fn compat_options_are_ignored() {
    assert_eq!(parse_args(&args(&["-a", "-b", "-s", "3"])), Parsed::Command("3".into()));
    // Options with arguments consume them.
    assert_eq!(parse_args(&args(&["-t", "10", "-e", "VAR=1", "q"])), Parsed::Command("q".into()));
}

#[test]
fn no_argument_means_nothing_to_do() {
    assert_eq!(parse_args(&[]), Parsed::Nothing);
    assert_eq!(parse_args(&args(&["-a"])), Parsed::Nothing);
}

#[test]
fn unknown_option_is_rejected() {
    assert_eq!(parse_args(&args(&["-x"])), Parsed::BadOption("-x".into()));
}

#[test]
fn runlevel_digits() {
    for (digit, level) in [("0", 0), ("3", 3), ("9", 9)] {
        assert_eq!(parse_command(digit), Some(wire::Request::Runlevel { level }));
    }
}

#[test]
fn reload_and_rescue() {
    assert_eq!(parse_command("q"), Some(wire::Request::Reload));
    assert_eq!(parse_command("Q"), Some(wire::Request::Reload));
    assert_eq!(parse_command("s"), Some(wire::Request::Runlevel { level: 1 }));
    assert_eq!(parse_command("S"), Some(wire::Request::Runlevel { level: 1 }));
}

#[test]
fn junk_commands_are_rejected() {
    assert_eq!(parse_command("x"), None);
    assert_eq!(parse_command("10"), None);
    assert_eq!(parse_command(""), None);
}
