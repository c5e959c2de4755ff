// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Kernel command line parsing.

use std::fs;
use std::path::PathBuf;

/// Options recognised on the kernel command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmdlineOpts {
    pub debug: bool,
    pub rescue: bool,
    /// Runlevel override; wins over the configured default.
    pub cmdlevel: Option<u8>,
    pub console: Option<PathBuf>,
}

/// Parse a kernel command line string.
pub fn parse(cmdline: &str) -> CmdlineOpts {
    let mut opts = CmdlineOpts::default();
    for token in cmdline.split_whitespace() {
        match token {
            "debug" | "ignite.debug" => opts.debug = true,
            "rescue" | "single" => opts.rescue = true,
            _ => {
                if let Some(console) = token.strip_prefix("console=") {
                    // Options after a comma (baud etc.) belong to the
                    // kernel, not to the device path.
                    let device = console.split(',').next().unwrap_or(console);
                    let device = device.strip_prefix("/dev/").unwrap_or(device);
                    opts.console = Some(PathBuf::from(format!("/dev/{device}")));
                } else if token.len() == 1 {
                    if let Some(level) = token.chars().next().and_then(|c| c.to_digit(10)) {
                        opts.cmdlevel = Some(level as u8);
                    }
                }
            }
        }
    }
    opts
}

/// Read and parse `/proc/cmdline`.
pub fn read() -> CmdlineOpts {
    match fs::read_to_string("/proc/cmdline") {
        Ok(text) => parse(&text),
        Err(_) => CmdlineOpts::default(),
    }
}

#[cfg(test)]
#[path = "cmdline_tests.rs"]
mod tests;
