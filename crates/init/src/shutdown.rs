// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Shutdown collaborator seam.
//!
//! The halt/poweroff/reboot machinery is external. The core's contract is
//! to hand over the requested action and the configured shutdown script.

use ignite_core::ShutdownKind;
use std::process::Command;
use tracing::{info, warn};

/// Delegate a shutdown request. Runs the configured shutdown script,
/// then leaves the rest to the collaborator.
pub fn delegate(kind: ShutdownKind, script: Option<&str>) {
    info!(%kind, "delegating shutdown");
    if let Some(script) = script {
        match Command::new("/bin/sh").arg("-c").arg(script).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%kind, "shutdown script exited with {status}"),
            Err(e) => warn!(%kind, "shutdown script failed to run: {e}"),
        }
    }
}
