// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Events dispatched on the init loop.
//!
//! Signals, inotify readiness, control-channel commands and child reaping
//! are all translated into these values before any state is touched, so
//! every mutation happens in loop context.

use std::fmt;
use std::path::PathBuf;

/// Requested flavor of shutdown, delegated to the external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    Halt,
    Poweroff,
    Reboot,
}

impl fmt::Display for ShutdownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownKind::Halt => "halt",
            ShutdownKind::Poweroff => "poweroff",
            ShutdownKind::Reboot => "reboot",
        };
        f.write_str(s)
    }
}

/// Events that drive state transitions in the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A reaped child and its raw wait status.
    ChildExited { pid: i32, status: i32 },

    /// A condition was asserted or retracted.
    ConditionChanged { name: String },

    /// A watched configuration path changed on disk.
    ConfigChanged { path: PathBuf },

    /// Change to the given numeric runlevel.
    RunlevelRequest { level: u8 },

    /// Re-parse configuration and reconcile the registry.
    Reload,

    /// Hand off to the shutdown collaborator.
    ShutdownRequest { kind: ShutdownKind },
}
