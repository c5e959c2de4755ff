// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use serde::{Deserialize, Serialize};

/// Command sent to the init process over the control channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Change to the given numeric runlevel. 0 and 6 delegate to the
    /// shutdown collaborator.
    Runlevel { level: u8 },

    /// Re-parse configuration, diff against the registry, apply.
    Reload,

    /// Report runlevel and per-service state.
    Status,

    /// Start a service by name.
    Start { name: String },

    /// Stop a service by name.
    Stop { name: String },

    /// Restart a service by name.
    Restart { name: String },

    Poweroff,

    Reboot,

    Halt,
}
