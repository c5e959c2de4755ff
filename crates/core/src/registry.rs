// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Ordered store of service records.
//!
//! Records live in declaration order in one owned vector; a name index
//! provides O(1) identity lookup without owning anything. Pid lookup walks
//! the vector, which stays short for an init's service count.

use crate::service::{ServiceRecord, SvcState, SvcType};
use std::collections::HashMap;

/// Result of a registration against an existing or fresh identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A new record was appended.
    New,
    /// An existing record was updated in place; `restart` is set when the
    /// running process must be cycled to pick up the change.
    Updated { restart: bool },
}

/// Registry of supervised records (C4).
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    records: Vec<ServiceRecord>,
    by_name: HashMap<(String, u32), usize>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Register a record, updating in place when the identity exists.
    ///
    /// An in-place update never touches the live pid; it refreshes the
    /// command line, mask, conditions and options, and reports whether a
    /// restart is needed for the change to take effect. A type change
    /// forces stop-then-recreate semantics via a restart.
    pub fn register(&mut self, record: ServiceRecord) -> RegisterOutcome {
        let key = record.identity();
        match self.by_name.get(&key) {
            Some(&idx) => {
                let existing = &mut self.records[idx];
                let restart = existing.argv != record.argv || existing.kind != record.kind;
                if existing.kind != record.kind {
                    // Stop-then-recreate: the old process must not survive
                    // a type change.
                    existing.state = match existing.state {
                        SvcState::Running | SvcState::Starting | SvcState::Stopping => {
                            existing.state
                        }
                        _ => SvcState::Halted,
                    };
                    existing.exit_status = None;
                    existing.reset_restarts();
                }
                existing.kind = record.kind;
                existing.argv = record.argv;
                existing.runlevels = record.runlevels;
                existing.conditions = record.conditions;
                existing.pid_file = record.pid_file;
                existing.cgroup = record.cgroup;
                existing.user = record.user;
                existing.workdir = record.workdir;
                existing.rlimits = record.rlimits;
                existing.bootstrap = record.bootstrap;
                existing.needs_restart = existing.needs_restart || restart;
                existing.stale = false;
                RegisterOutcome::Updated { restart }
            }
            None => {
                self.by_name.insert(key, self.records.len());
                self.records.push(record);
                RegisterOutcome::New
            }
        }
    }

    pub fn find(&self, name: &str, instance: u32) -> Option<&ServiceRecord> {
        let idx = *self.by_name.get(&(name.to_string(), instance))?;
        self.records.get(idx)
    }

    pub fn find_mut(&mut self, name: &str, instance: u32) -> Option<&mut ServiceRecord> {
        let idx = *self.by_name.get(&(name.to_string(), instance))?;
        self.records.get_mut(idx)
    }

    /// Records in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.records.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ServiceRecord> {
        self.records.iter_mut()
    }

    /// Identities in declaration order, for step loops that need to
    /// re-borrow per record.
    pub fn identities(&self) -> Vec<(String, u32)> {
        self.records.iter().map(ServiceRecord::identity).collect()
    }

    /// Record exit info for a reaped child. Returns the identity of the
    /// owning record, if any.
    pub fn mark_exited(&mut self, pid: i32, status: i32) -> Option<(String, u32)> {
        let record = self.records.iter_mut().find(|r| r.pid == Some(pid))?;
        record.pid = None;
        record.exit_status = Some(status);
        Some(record.identity())
    }

    /// True while any record is mid-stop. Runlevel transitions defer new
    /// starts until this clears.
    pub fn any_stopping(&self) -> bool {
        self.records.iter().any(|r| r.state == SvcState::Stopping)
    }

    /// Drop bootstrap-only records that never started. Returns how many
    /// were pruned.
    pub fn prune_bootstrap(&mut self) -> usize {
        let before = self.records.len();
        self.retain(|r| {
            !(r.bootstrap
                && r.pid.is_none()
                && matches!(r.state, SvcState::Halted | SvcState::Waiting))
        });
        before - self.records.len()
    }

    /// Mark every record stale ahead of a reload sweep.
    pub fn mark_all_stale(&mut self) {
        for record in &mut self.records {
            record.stale = true;
        }
    }

    /// Sweep records still stale after a reload: settled ones are removed,
    /// live ones get a stop request and are removed once they exit.
    /// Returns identities of records that were asked to stop.
    pub fn sweep_stale(&mut self) -> Vec<(String, u32)> {
        let mut stopping = Vec::new();
        for record in &mut self.records {
            if record.stale && record.live() {
                record.stop_requested = true;
                stopping.push(record.identity());
            }
        }
        self.retain(|r| !(r.stale && !r.live()));
        stopping
    }

    /// Remove a stale record once its process is gone.
    pub fn remove_if_stale_settled(&mut self, name: &str, instance: u32) -> bool {
        let matched =
            self.find(name, instance).map(|r| r.stale && !r.live()).unwrap_or(false);
        if matched {
            let identity = (name.to_string(), instance);
            self.retain(|r| r.identity() != identity);
        }
        matched
    }

    fn retain(&mut self, keep: impl Fn(&ServiceRecord) -> bool) {
        self.records.retain(|r| keep(r));
        self.by_name.clear();
        for (idx, record) in self.records.iter().enumerate() {
            self.by_name.insert(record.identity(), idx);
        }
    }

    /// Records of the given type, declaration order.
    pub fn of_type(&self, kind: SvcType) -> impl Iterator<Item = &ServiceRecord> {
        self.records.iter().filter(move |r| r.kind == kind)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
