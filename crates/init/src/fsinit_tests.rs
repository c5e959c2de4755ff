// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

fn entries() -> Vec<FstabEntry> {
    fstab::parse_str(
        "/dev/sda1 /     ext4 defaults 0 1\n\
         /dev/sda2 /home ext4 defaults 0 2\n\
         /dev/sdb1 /data ext4 defaults 0 2\n",
    )
}

#[test]
fn clean_sweep_checks_every_pass() {
    let entries = entries();
    let mut checked = Vec::new();
    let outcome = fsck_sweep(&entries, |e| {
        checked.push(e.device.clone());
        Some(0)
    });
    assert_eq!(outcome, FsckOutcome::Clean);
    assert_eq!(checked, vec!["/dev/sda1", "/dev/sda2", "/dev/sdb1"]);
}

#[test]
fn corrected_errors_stop_later_passes() {
    let entries = entries();
    let mut checked = Vec::new();
    let outcome = fsck_sweep(&entries, |e| {
        checked.push(e.device.clone());
        if e.device == "/dev/sda1" {
            Some(1)
        } else {
            Some(0)
        }
    });
    assert_eq!(outcome, FsckOutcome::Dirty);
    // Pass 1 went dirty; pass 2 never ran.
    assert_eq!(checked, vec!["/dev/sda1"]);
}

#[test]
fn corrupt_device_is_fatal() {
    // fsck rc 4: uncorrected errors. Scenario: sulogin with reboot.
    let entries = entries();
    let outcome =
        fsck_sweep(&entries, |e| if e.device == "/dev/sda1" { Some(4) } else { Some(0) });
    assert_eq!(outcome, FsckOutcome::Fatal);
}

#[test]
fn skipped_entries_do_not_dirty_a_pass() {
    let entries = entries();
    let outcome = fsck_sweep(&entries, |e| {
        if e.device == "/dev/sda2" {
            None
        } else {
            Some(0)
        }
    });
    assert_eq!(outcome, FsckOutcome::Clean);
}

#[test]
fn resolve_uuid_and_label() {
    assert_eq!(
        resolve_device("UUID=abcd-1234"),
        Some(PathBuf::from("/dev/disk/by-uuid/abcd-1234"))
    );
    assert_eq!(
        resolve_device("LABEL=rootfs"),
        Some(PathBuf::from("/dev/disk/by-label/rootfs"))
    );
    assert_eq!(
        resolve_device("PARTUUID=0000-01"),
        Some(PathBuf::from("/dev/disk/by-partuuid/0000-01"))
    );
    assert_eq!(resolve_device("/dev/sda1"), Some(PathBuf::from("/dev/sda1")));
    assert_eq!(resolve_device("proc"), None);
    assert_eq!(resolve_device("none"), None);
}

#[test]
fn mounted_rw_matches_device_and_option() {
    let mounts = "\
/dev/sda1 / ext4 rw,relatime 0 0
/dev/sda2 /home ext4 ro,relatime 0 0
tmpfs /tmp tmpfs rw 0 0
";
    assert!(mounted_rw_in(mounts, Path::new("/dev/sda1")));
    assert!(!mounted_rw_in(mounts, Path::new("/dev/sda2")));
    assert!(!mounted_rw_in(mounts, Path::new("/dev/sdb1")));
}
