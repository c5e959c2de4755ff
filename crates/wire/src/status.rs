// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use serde::{Deserialize, Serialize};

/// One service line in a status reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub instance: u32,
    /// Record type keyword: `service`, `task`, `run`, `sysv`.
    pub kind: String,
    /// Lifecycle state: `halted`, `waiting`, ... `done`.
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<i32>,
    pub runlevels: String,
}

/// Snapshot of system state for `Request::Status`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemStatus {
    pub runlevel: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevlevel: Option<u8>,
    pub bootstrap: bool,
    pub services: Vec<ServiceEntry>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}
