// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Cgroup collaborator seam.
//!
//! Hierarchy setup is external; the core's contract is to place spawned
//! processes into a named group, best-effort.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CGROUP_ROOT: &str = "/sys/fs/cgroup";

/// Probe the cgroup hierarchy. Absence is not an error; placement just
/// becomes a no-op.
pub fn init() -> bool {
    let present = Path::new(CGROUP_ROOT).is_dir();
    if present {
        debug!("cgroup hierarchy at {CGROUP_ROOT}");
    } else {
        debug!("no cgroup hierarchy; placement disabled");
    }
    present
}

/// Move a pid into the named group. Failures are logged, never fatal.
pub fn place(pid: i32, group: &str) {
    let procs: PathBuf = [CGROUP_ROOT, group, "cgroup.procs"].iter().collect();
    if let Err(e) = std::fs::write(&procs, pid.to_string()) {
        warn!(pid, group, "cgroup placement failed: {e}");
    }
}
