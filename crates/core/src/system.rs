// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Owned system-wide configuration and runtime scalars.
//!
//! One `SystemState` value replaces the process-global variables an init
//! traditionally scatters; the bootstrap driver owns it and lends it to
//! components for the life of the process.

use crate::runlevel::{clamp_cfglevel, DEFAULT_CFGLEVEL};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    pub hostname: Option<String>,
    /// Command that brings up networking.
    pub network_script: Option<String>,
    /// Directory of boot scripts executed after bootstrap.
    pub runparts_dir: Option<PathBuf>,
    /// Command the shutdown collaborator runs.
    pub shutdown_script: Option<String>,
    pub console: Option<PathBuf>,
    /// Default identity for `startx` services.
    pub username: Option<String>,
    pub fstab: PathBuf,

    /// Current runlevel. Meaningless while `bootstrap` is set.
    pub runlevel: u8,
    pub prevlevel: Option<u8>,
    /// Configured default runlevel, always valid (1..9, not 6).
    pub cfglevel: u8,
    /// Override from the kernel command line or telinit.
    pub cmdlevel: Option<u8>,

    pub rescue: bool,
    pub debug: bool,
    /// True from process start until bootstrap finalize.
    pub bootstrap: bool,
}

impl Default for SystemState {
    fn default() -> Self {
        Self {
            hostname: None,
            network_script: None,
            runparts_dir: None,
            shutdown_script: None,
            console: None,
            username: None,
            fstab: PathBuf::from("/etc/fstab"),
            runlevel: 0,
            prevlevel: None,
            cfglevel: DEFAULT_CFGLEVEL,
            cmdlevel: None,
            rescue: false,
            debug: false,
            bootstrap: true,
        }
    }
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configured default runlevel, clamping invalid input to 2.
    pub fn set_cfglevel(&mut self, level: u8) {
        self.cfglevel = clamp_cfglevel(level);
    }

    /// Record a runlevel change, remembering the previous level.
    pub fn enter_runlevel(&mut self, level: u8) {
        self.prevlevel = Some(self.runlevel);
        self.runlevel = level;
    }

    /// Level to enter when bootstrap completes: the kernel/telinit
    /// override when nonzero, the configured default otherwise.
    pub fn target_level(&self) -> u8 {
        match self.cmdlevel {
            Some(level) if level != 0 => level,
            _ => self.cfglevel,
        }
    }
}

#[cfg(test)]
#[path = "system_tests.rs"]
mod tests;
