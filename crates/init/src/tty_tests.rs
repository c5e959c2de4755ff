// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

#[test]
fn defaults_apply() {
    let record = record_from_spec("/dev/tty1").unwrap();
    assert_eq!(record.name, "getty@tty1");
    assert_eq!(
        record.argv,
        vec![
            GETTY.to_string(),
            "tty1".to_string(),
            "115200".to_string(),
            "linux".to_string()
        ]
    );
    assert_eq!(record.runlevels, RunlevelMask::default_service());
    assert_eq!(record.kind, SvcType::Service);
}

#[test]
fn explicit_baud_and_term() {
    let record = record_from_spec("ttyS0 38400 vt100").unwrap();
    assert_eq!(record.name, "getty@ttyS0");
    assert_eq!(record.argv[2], "38400");
    assert_eq!(record.argv[3], "vt100");
}

#[test]
fn leading_runlevel_mask() {
    let record = record_from_spec("[12345] /dev/tty2 9600").unwrap();
    assert!(record.in_runlevel(1));
    assert!(record.in_runlevel(5));
    assert!(!record.in_runlevel(7));
    assert_eq!(record.argv[2], "9600");
}

#[test]
fn empty_spec_is_rejected() {
    assert_eq!(record_from_spec(""), Err(SpecError::MissingCommand));
}
