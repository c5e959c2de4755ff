// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

#[test]
fn parse_numeric_mask() {
    let mask: RunlevelMask = "2345".parse().unwrap();
    for level in 2..=5 {
        assert!(mask.contains(level));
    }
    assert!(!mask.contains(1));
    assert!(!mask.contains(6));
    assert!(!mask.contains_bootstrap());
}

#[test]
fn parse_bootstrap_mask() {
    let mask: RunlevelMask = "S".parse().unwrap();
    assert!(mask.contains_bootstrap());
    assert!(mask.bootstrap_only());
    assert!(!mask.contains(2));
}

#[test]
fn parse_mixed_mask_is_not_bootstrap_only() {
    let mask: RunlevelMask = "S12".parse().unwrap();
    assert!(mask.contains_bootstrap());
    assert!(!mask.bootstrap_only());
    assert!(mask.contains(1));
    assert!(mask.contains(2));
}

#[test]
fn parse_rejects_garbage() {
    let err = "23x".parse::<RunlevelMask>().unwrap_err();
    assert_eq!(err, RunlevelError::BadMask('x'));
}

#[test]
fn display_round_trips() {
    for spec in ["2345", "019", "349S", "S"] {
        let mask: RunlevelMask = spec.parse().unwrap();
        let shown = mask.to_string();
        let reparsed: RunlevelMask = shown.parse().unwrap();
        assert_eq!(mask, reparsed, "round trip of {spec} via {shown}");
    }
}

#[test]
fn cfglevel_clamps_halt_and_reboot() {
    assert_eq!(clamp_cfglevel(0), 2);
    assert_eq!(clamp_cfglevel(6), 2);
    assert_eq!(clamp_cfglevel(10), 2);
}

#[test]
fn cfglevel_passes_normal_levels() {
    for level in [1, 2, 3, 4, 5, 7, 8, 9] {
        assert_eq!(clamp_cfglevel(level), level);
    }
}
