// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Supervision state machine (C6).
//!
//! `step` drives one record through its lifecycle; `step_all` cranks the
//! registry in declaration order. Decisions are computed by a pure
//! function over an immutable view, then applied, so the transition
//! logic stays testable without forking anything.

use crate::engine::Engine;
use crate::spawn::Spawner;
use crate::work::WorkId;
use ignite_core::service::{ServiceRecord, SvcState, SvcType};
use ignite_core::{Clock, ConditionStore, SystemState};
use nix::sys::signal::Signal;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Grace between SIGTERM and SIGKILL on stop.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// What one step decided for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    /// Record is gated; park it in WAITING.
    MarkWaiting,
    /// Record no longer belongs in this runlevel and has no process.
    MarkHalted,
    /// Spawn now.
    Start,
    /// SIGTERM, land in HALTED once the exit is reaped.
    StopHalt,
    /// SIGTERM, land in WAITING and start fresh (graceful restart).
    StopRestart,
}

/// True when the current (run)level permits the record.
pub(crate) fn level_allows(record: &ServiceRecord, sys: &SystemState) -> bool {
    if sys.bootstrap {
        record.runlevels.contains_bootstrap()
    } else {
        record.in_runlevel(sys.runlevel)
    }
}

/// Decide the next transition for a record.
///
/// `defer_start` holds back spawns while another record is mid-stop, so
/// a runlevel transition finishes its stops before anything new starts.
pub(crate) fn decide(
    record: &ServiceRecord,
    sys: &SystemState,
    conditions: &ConditionStore,
    now: Instant,
    defer_start: bool,
) -> Action {
    match record.state {
        SvcState::Starting | SvcState::Stopping | SvcState::Done | SvcState::Crashed => {
            Action::None
        }
        SvcState::Running => {
            if record.stop_requested || !level_allows(record, sys) {
                Action::StopHalt
            } else if record.needs_restart {
                Action::StopRestart
            } else {
                Action::None
            }
        }
        SvcState::Halted | SvcState::Waiting => {
            let parked = record.state == SvcState::Waiting;
            if record.stop_requested || !level_allows(record, sys) {
                if parked {
                    Action::MarkHalted
                } else {
                    Action::None
                }
            } else if !conditions.satisfied(&record.conditions)
                || record.backoff_until.is_some_and(|until| until > now)
                || defer_start
            {
                if parked {
                    Action::None
                } else {
                    Action::MarkWaiting
                }
            } else {
                Action::Start
            }
        }
    }
}

impl<S, C> Engine<S, C>
where
    S: Spawner,
    C: Clock,
{
    /// Drive one record one transition forward.
    ///
    /// `revive` lets a CRASHED record back into the machine; it is set on
    /// reload, runlevel changes and condition changes, and nowhere else.
    pub fn step(&mut self, name: &str, instance: u32, revive: bool) {
        if revive {
            if let Some(record) = self.registry.find_mut(name, instance) {
                if record.state == SvcState::Crashed {
                    record.reset_restarts();
                    record.backoff_until = None;
                    record.exit_status = None;
                    record.state = SvcState::Halted;
                    debug!(service = name, "revived from crashed");
                }
            }
        }

        let now = self.clock.now();
        let action = {
            let defer_start = self.registry.any_stopping();
            let Some(record) = self.registry.find(name, instance) else {
                return;
            };
            decide(record, &self.state, &self.conditions, now, defer_start)
        };

        match action {
            Action::None => {}
            Action::MarkWaiting => {
                if let Some(record) = self.registry.find_mut(name, instance) {
                    record.state = SvcState::Waiting;
                }
            }
            Action::MarkHalted => {
                if let Some(record) = self.registry.find_mut(name, instance) {
                    record.state = SvcState::Halted;
                }
            }
            Action::StopHalt | Action::StopRestart => self.begin_stop(name, instance),
            Action::Start => self.do_start(name, instance, now),
        }
    }

    /// Step every record, declaration order.
    pub fn step_all(&mut self, revive: bool) {
        for (name, instance) in self.registry.identities() {
            self.step(&name, instance, revive);
        }
    }

    /// Step every record of one type, declaration order.
    pub fn step_type(&mut self, kind: SvcType, revive: bool) {
        let targets: Vec<_> = self
            .registry
            .iter()
            .filter(|r| r.kind == kind)
            .map(ServiceRecord::identity)
            .collect();
        for (name, instance) in targets {
            self.step(&name, instance, revive);
        }
    }

    /// Apply only the stop-side decisions, declaration order. Used at the
    /// head of a runlevel transition so no new service can start before
    /// every leaving service is on its way down.
    pub(crate) fn step_stops(&mut self) {
        let now = self.clock.now();
        for (name, instance) in self.registry.identities() {
            let action = {
                let Some(record) = self.registry.find(&name, instance) else {
                    continue;
                };
                decide(record, &self.state, &self.conditions, now, true)
            };
            match action {
                Action::StopHalt | Action::StopRestart => self.begin_stop(&name, instance),
                Action::MarkHalted => {
                    if let Some(record) = self.registry.find_mut(&name, instance) {
                        record.state = SvcState::Halted;
                    }
                }
                _ => {}
            }
        }
    }

    /// Step services whose condition set mentions `name`. Condition
    /// changes revive CRASHED records.
    pub fn step_conditioned(&mut self, name: &str) {
        let targets: Vec<_> = self
            .registry
            .iter()
            .filter(|r| r.conditions.iter().any(|c| c == name))
            .map(ServiceRecord::identity)
            .collect();
        for (record_name, instance) in targets {
            self.step(&record_name, instance, true);
        }
    }

    /// True once every record the bootstrap driver awaits has finished:
    /// `run` records and bootstrap-tagged records, DONE or CRASHED.
    pub fn service_completed(&self) -> bool {
        self.registry
            .iter()
            .filter(|r| {
                r.bootstrap || (r.kind == SvcType::Run && r.runlevels.contains_bootstrap())
            })
            .all(|r| matches!(r.state, SvcState::Done | SvcState::Crashed))
    }

    /// Two-phase stop: SIGTERM now, SIGKILL after the grace period.
    pub(crate) fn begin_stop(&mut self, name: &str, instance: u32) {
        let pid = {
            let Some(record) = self.registry.find_mut(name, instance) else {
                return;
            };
            match record.pid {
                Some(pid) => {
                    record.state = SvcState::Stopping;
                    pid
                }
                None => {
                    record.state = SvcState::Halted;
                    return;
                }
            }
        };
        info!(service = name, pid, "stopping");
        if let Err(e) = self.spawner.kill(pid, Signal::SIGTERM) {
            warn!(service = name, pid, "SIGTERM failed: {e}");
        }
        let now = self.clock.now();
        self.work.schedule(
            WorkId::StopTimeout { name: name.to_string(), instance },
            STOP_GRACE,
            now,
        );
    }

    /// Grace expired: escalate to SIGKILL.
    pub(crate) fn stop_timeout(&mut self, name: &str, instance: u32) {
        let pid = self.registry.find(name, instance).and_then(|r| r.pid);
        if let Some(pid) = pid {
            warn!(service = name, pid, "stop grace expired, sending SIGKILL");
            if let Err(e) = self.spawner.kill(pid, Signal::SIGKILL) {
                warn!(service = name, pid, "SIGKILL failed: {e}");
            }
        }
    }

    fn do_start(&mut self, name: &str, instance: u32, now: Instant) {
        let Some(record) = self.registry.find(name, instance).cloned() else {
            return;
        };
        let ctx = self.spawn_ctx();
        match self.spawner.spawn(&record, &ctx) {
            Ok(pid) => {
                info!(service = name, pid, "started");
                self.progress.result(&record.argv.join(" "), true);
                if let Some(group) = record.cgroup.as_deref() {
                    crate::cgroup::place(pid, group);
                }
                if let Some(rec) = self.registry.find_mut(name, instance) {
                    rec.pid = Some(pid);
                    rec.state = SvcState::Running;
                    rec.needs_restart = false;
                    rec.exit_status = None;
                    rec.backoff_until = None;
                }
                self.assert_condition(&format!("pid/{name}"));
            }
            Err(e) => {
                error!(service = name, "spawn failed: {e}");
                self.progress.result(&record.argv.join(" "), false);
                if let Some(rec) = self.registry.find_mut(name, instance) {
                    rec.note_restart(now);
                    rec.state = SvcState::Crashed;
                }
            }
        }
    }

    /// A reaped child: transition its record.
    pub fn on_child_exit(&mut self, pid: i32, status: i32) {
        let Some((name, instance)) = self.registry.mark_exited(pid, status) else {
            debug!(pid, "reaped unowned child");
            return;
        };
        self.work.cancel(&WorkId::StopTimeout { name: name.clone(), instance });
        let now = self.clock.now();

        let (kind, stale, stop_requested, needs_restart, allowed) = {
            // The record just matched by pid; the lookup cannot miss.
            let Some(record) = self.registry.find(&name, instance) else {
                return;
            };
            (
                record.kind,
                record.stale,
                record.stop_requested,
                record.needs_restart,
                level_allows(record, &self.state),
            )
        };

        if stale {
            if let Some(record) = self.registry.find_mut(&name, instance) {
                record.state = SvcState::Halted;
            }
            self.registry.remove_if_stale_settled(&name, instance);
            debug!(service = %name, "removed after reload");
        } else if kind.oneshot() {
            let done = status == 0;
            if let Some(record) = self.registry.find_mut(&name, instance) {
                record.state = if done { SvcState::Done } else { SvcState::Crashed };
            }
            if done {
                debug!(service = %name, "completed");
                if name == "network" {
                    self.run_hook(crate::hooks::HookPoint::NetworkUp);
                }
            } else {
                warn!(service = %name, status, "one-shot failed");
            }
        } else if stop_requested || !allowed {
            if let Some(record) = self.registry.find_mut(&name, instance) {
                record.state = SvcState::Halted;
            }
            debug!(service = %name, "halted");
        } else if needs_restart {
            if let Some(record) = self.registry.find_mut(&name, instance) {
                record.state = SvcState::Waiting;
            }
            self.step(&name, instance, false);
        } else {
            // Unexpected exit: respawn within budget, with backoff.
            let respawn = {
                let Some(record) = self.registry.find_mut(&name, instance) else {
                    return;
                };
                if record.note_restart(now) {
                    let jitter = Duration::from_millis(self.clock.epoch_ms() % 100);
                    let delay = record.policy.backoff(record.attempts.saturating_sub(1)) + jitter;
                    record.state = SvcState::Waiting;
                    record.backoff_until = Some(now + delay);
                    Some(delay)
                } else {
                    record.state = SvcState::Crashed;
                    None
                }
            };
            match respawn {
                Some(delay) => {
                    info!(service = %name, status, delay_ms = delay.as_millis() as u64, "respawning");
                    self.work.schedule(
                        WorkId::Respawn { name: name.clone(), instance },
                        delay,
                        now,
                    );
                }
                None => {
                    error!(service = %name, "restart budget exhausted, crashed");
                }
            }
        }

        self.retract_condition(&format!("pid/{name}"));
        // A finished stop may have been holding back deferred starts.
        if !self.registry.any_stopping() {
            self.step_all(false);
        }
    }
}

#[cfg(test)]
#[path = "supervise_tests.rs"]
mod tests;
