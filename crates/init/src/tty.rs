// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! TTY collaborator seam.
//!
//! Device handling is external; the core's contract is to turn a `tty`
//! directive into a respawning getty record the supervisor raises like
//! any other service.

use ignite_core::service::{ServiceRecord, SpecError, SvcType};
use ignite_core::RunlevelMask;

const GETTY: &str = "/sbin/agetty";
const DEFAULT_BAUD: &str = "115200";
const DEFAULT_TERM: &str = "linux";

/// Build a getty service record from a `tty` directive argument:
/// `[LVLS] DEV [BAUD] [TERM]`.
pub fn record_from_spec(spec: &str) -> Result<ServiceRecord, SpecError> {
    let mut tokens = spec.split_whitespace().peekable();

    let mut runlevels = None;
    if let Some(token) = tokens.peek() {
        if let Some(inner) = token.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or(SpecError::UnterminatedMask)?;
            runlevels = Some(inner.parse::<RunlevelMask>()?);
            tokens.next();
        }
    }

    let device = tokens.next().ok_or(SpecError::MissingCommand)?;
    let baud = tokens.next().unwrap_or(DEFAULT_BAUD);
    let term = tokens.next().unwrap_or(DEFAULT_TERM);

    let line = device.strip_prefix("/dev/").unwrap_or(device);
    let mut record = ServiceRecord::parse(
        SvcType::Service,
        &format!("name:getty@{line} {GETTY} {line} {baud} {term}"),
    )?;
    if let Some(runlevels) = runlevels {
        record.runlevels = runlevels;
        record.bootstrap = runlevels.bootstrap_only();
    }
    Ok(record)
}

#[cfg(test)]
#[path = "tty_tests.rs"]
mod tests;
