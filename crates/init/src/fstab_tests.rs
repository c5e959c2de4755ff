// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;

const SAMPLE: &str = "\
# /etc/fstab
UUID=abcd-1234  /      ext4  defaults,ro  0 1
/dev/sda2       /home  ext4  defaults     0 2
/dev/sda3       none   swap  sw           0 0
proc            /proc  proc  defaults     0 0
";

#[test]
fn parses_fields() {
    let entries = parse_str(SAMPLE);
    assert_eq!(entries.len(), 4);

    let root = &entries[0];
    assert_eq!(root.device, "UUID=abcd-1234");
    assert!(root.is_root());
    assert_eq!(root.passno, 1);
    assert!(root.has_option("ro"));
    assert!(!root.has_option("rw"));

    assert!(entries[2].is_swap());
    assert_eq!(entries[2].passno, 0);
}

#[test]
fn short_and_comment_lines_are_skipped() {
    let entries = parse_str("# comment\n\n/dev/sda1\n/dev/sda2 /mnt ext4\n");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].mountpoint, PathBuf::from("/mnt"));
    assert_eq!(entries[0].options, Vec::<String>::new());
}

#[test]
fn fsck_passes_group_and_order() {
    let entries = parse_str(
        "/dev/sdb1 /b ext4 defaults 0 2\n\
         /dev/sda1 / ext4 defaults 0 1\n\
         /dev/sdc1 /c ext4 defaults 0 2\n\
         proc /proc proc defaults 0 0\n",
    );
    let passes = fsck_passes(&entries);
    assert_eq!(passes.len(), 2);

    let (pass, batch) = &passes[0];
    assert_eq!(*pass, 1);
    assert_eq!(batch[0].device, "/dev/sda1");

    let (pass, batch) = &passes[1];
    assert_eq!(*pass, 2);
    // fstab order within the pass
    assert_eq!(batch[0].device, "/dev/sdb1");
    assert_eq!(batch[1].device, "/dev/sdc1");
}

#[test]
fn missing_file_is_an_error() {
    assert!(parse_file(Path::new("/no/such/fstab")).is_err());
}
