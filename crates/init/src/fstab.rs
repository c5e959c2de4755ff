// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! fstab reading. Consumed read-only by the bring-up sequencer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One fstab line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FstabEntry {
    pub device: String,
    pub mountpoint: PathBuf,
    pub fstype: String,
    pub options: Vec<String>,
    pub dump: u32,
    /// fsck pass number; 0 means never checked.
    pub passno: u32,
}

impl FstabEntry {
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    pub fn is_swap(&self) -> bool {
        self.fstype == "swap"
    }

    /// The root filesystem entry.
    pub fn is_root(&self) -> bool {
        self.mountpoint == Path::new("/")
    }
}

/// Parse fstab text. Comments and short lines are skipped.
pub fn parse_str(text: &str) -> Vec<FstabEntry> {
    let mut entries = Vec::new();
    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 {
            continue;
        }
        entries.push(FstabEntry {
            device: fields[0].to_string(),
            mountpoint: PathBuf::from(fields[1]),
            fstype: fields[2].to_string(),
            options: fields
                .get(3)
                .map(|o| o.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            dump: fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0),
            passno: fields.get(5).and_then(|f| f.parse().ok()).unwrap_or(0),
        });
    }
    entries
}

pub fn parse_file(path: &Path) -> io::Result<Vec<FstabEntry>> {
    Ok(parse_str(&fs::read_to_string(path)?))
}

/// Entries grouped by fsck pass, pass order ascending, skipping pass 0.
/// Entry order within a pass is fstab order.
pub fn fsck_passes(entries: &[FstabEntry]) -> Vec<(u32, Vec<&FstabEntry>)> {
    let mut passes = Vec::new();
    for pass in 1..=9 {
        let batch: Vec<&FstabEntry> = entries.iter().filter(|e| e.passno == pass).collect();
        if !batch.is_empty() {
            passes.push((pass, batch));
        }
    }
    passes
}

#[cfg(test)]
#[path = "fstab_tests.rs"]
mod tests;
