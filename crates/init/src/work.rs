// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Deferred work items: the loop's timer wheel (part of C1).
//!
//! A work item is a named unit of deferred work with a monotonic deadline.
//! Scheduling an id that is already pending is idempotent (single
//! in-flight instance); cancellation is O(1) and guarantees the item will
//! not fire.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Identity of a deferred work item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WorkId {
    /// First supervisor crank once bootstrap wiring is up.
    Crank,

    /// 100 ms bootstrap progress tick.
    Bootstrap,

    /// Bootstrap finalize.
    Finalize,

    /// SIGKILL escalation for a service that ignored SIGTERM.
    StopTimeout { name: String, instance: u32 },

    /// Delayed respawn after backoff.
    Respawn { name: String, instance: u32 },
}

#[derive(Debug)]
struct Entry {
    deadline: Instant,
    seq: u64,
}

/// Monotonic-deadline work queue.
///
/// Firing order for due items is deadline-then-FIFO; items sharing a
/// deadline fire in scheduling order.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: HashMap<WorkId, Entry>,
    seq: u64,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the item `delay` from `now`. A no-op when the id is
    /// already pending.
    pub fn schedule(&mut self, id: WorkId, delay: Duration, now: Instant) {
        if self.pending.contains_key(&id) {
            return;
        }
        self.seq += 1;
        self.pending.insert(id, Entry { deadline: now + delay, seq: self.seq });
    }

    /// Cancel a pending item. Returns true when something was cancelled.
    pub fn cancel(&mut self, id: &WorkId) -> bool {
        self.pending.remove(id).is_some()
    }

    pub fn is_pending(&self, id: &WorkId) -> bool {
        self.pending.contains_key(id)
    }

    /// Earliest pending deadline, for the loop's sleep.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|e| e.deadline).min()
    }

    /// Remove and return every item due at `now`, deadline-then-FIFO.
    pub fn take_due(&mut self, now: Instant) -> Vec<WorkId> {
        let mut due: Vec<(WorkId, Instant, u64)> = self
            .pending
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(id, e)| (id.clone(), e.deadline, e.seq))
            .collect();
        due.sort_by_key(|(_, deadline, seq)| (*deadline, *seq));
        let ids: Vec<WorkId> = due.into_iter().map(|(id, _, _)| id).collect();
        for id in &ids {
            self.pending.remove(id);
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
#[path = "work_tests.rs"]
mod tests;
