// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Service records and the registration spec grammar.
//!
//! A spec string describes one supervised entity:
//!
//! ```text
//! [2345] <pid/foo,net/up> name:bar:1 pid:/run/bar.pid cgroup.system /sbin/bard -n
//! ```
//!
//! Runlevel mask, condition list and options are all optional; the argv is
//! not. Serializing a record with [`ServiceRecord::spec_string`] and
//! re-parsing it yields an equal record.

use crate::runlevel::{RunlevelError, RunlevelMask};
use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// How a record is supervised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvcType {
    /// Long-running daemon, respawned on exit.
    Service,
    /// One-shot, not waited for.
    Task,
    /// One-shot, awaited by the bootstrap driver.
    Run,
    /// Script-style start/stop service.
    Sysv,
}

impl SvcType {
    /// True for types that are respawned when their process exits.
    pub fn respawns(self) -> bool {
        matches!(self, SvcType::Service | SvcType::Sysv)
    }

    /// True for one-shot types that reach a terminal Done state.
    pub fn oneshot(self) -> bool {
        matches!(self, SvcType::Task | SvcType::Run)
    }

    pub fn keyword(self) -> &'static str {
        match self {
            SvcType::Service => "service",
            SvcType::Task => "task",
            SvcType::Run => "run",
            SvcType::Sysv => "sysv",
        }
    }
}

/// Lifecycle state of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SvcState {
    #[default]
    Halted,
    /// Gating conditions not yet satisfied.
    Waiting,
    Starting,
    Running,
    /// SIGTERM sent, waiting for exit (SIGKILL after the grace period).
    Stopping,
    /// Restart budget exhausted; only reload, runlevel change or a
    /// condition change revives the record.
    Crashed,
    /// Terminal for a one-shot that completed.
    Done,
}

impl SvcState {
    /// True for states with no process and no pending transition.
    pub fn settled(self) -> bool {
        matches!(self, SvcState::Halted | SvcState::Crashed | SvcState::Done)
    }
}

impl fmt::Display for SvcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SvcState::Halted => "halted",
            SvcState::Waiting => "waiting",
            SvcState::Starting => "starting",
            SvcState::Running => "running",
            SvcState::Stopping => "stopping",
            SvcState::Crashed => "crashed",
            SvcState::Done => "done",
        };
        f.write_str(s)
    }
}

/// Restart budget and backoff for respawning services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartPolicy {
    /// Restarts allowed inside one sliding window before Crashed.
    pub max_restarts: u32,
    /// Width of the sliding restart window.
    pub window: Duration,
    /// First backoff delay; doubles per attempt.
    pub base_backoff: Duration,
    /// Upper bound on the backoff delay.
    pub max_backoff: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            max_restarts: 10,
            window: Duration::from_secs(60),
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RestartPolicy {
    /// Backoff before the given attempt: `min(max, base * 2^attempts)`.
    /// The caller adds jitter.
    pub fn backoff(&self, attempts: u32) -> Duration {
        let factor = 1u32.checked_shl(attempts).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// A single resource limit applied to a spawned child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rlimit {
    /// Resource name as in setrlimit(2), e.g. `nofile`.
    pub resource: String,
    pub soft: u64,
    pub hard: u64,
}

/// Errors from spec-string parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("empty spec")]
    Empty,

    #[error(transparent)]
    Runlevels(#[from] RunlevelError),

    #[error("unterminated runlevel mask")]
    UnterminatedMask,

    #[error("unterminated condition list")]
    UnterminatedConditions,

    #[error("bad instance id in '{0}'")]
    BadInstance(String),

    #[error("spec has no command")]
    MissingCommand,
}

/// A supervised entity: identity, command line, gating and live status.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRecord {
    pub name: String,
    /// Instance id distinguishing multiple records of the same name.
    pub instance: u32,
    pub argv: Vec<String>,
    pub kind: SvcType,
    pub runlevels: RunlevelMask,
    /// Conditions that must all be On before the record may start.
    pub conditions: Vec<String>,
    pub pid_file: Option<PathBuf>,
    pub cgroup: Option<String>,
    pub user: Option<String>,
    pub workdir: Option<PathBuf>,
    pub rlimits: Vec<Rlimit>,
    pub policy: RestartPolicy,

    pub state: SvcState,
    pub pid: Option<i32>,
    pub exit_status: Option<i32>,
    /// Declared only for runlevel S; pruned after bootstrap if never started.
    pub bootstrap: bool,
    pub stop_requested: bool,
    /// Set when the command line changed on reload; cleared on next spawn.
    pub needs_restart: bool,
    /// Reload sweep mark: true until re-registered by the current parse.
    pub stale: bool,

    /// Spawn timestamps inside the current restart window.
    pub restart_times: VecDeque<Instant>,
    /// Consecutive restart attempts since the last stable run.
    pub attempts: u32,
    /// Earliest instant the next respawn may happen.
    pub backoff_until: Option<Instant>,
}

impl ServiceRecord {
    /// Parse a spec string into a fresh record of the given type.
    pub fn parse(kind: SvcType, spec: &str) -> Result<Self, SpecError> {
        let mut tokens = spec.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(SpecError::Empty);
        }

        let mut runlevels = None;
        let mut conditions = Vec::new();
        let mut name = None;
        let mut instance = 0;
        let mut pid_file = None;
        let mut cgroup = None;
        let mut argv: Vec<String> = Vec::new();

        for token in tokens {
            if !argv.is_empty() {
                argv.push(token.to_string());
                continue;
            }
            if let Some(inner) = token.strip_prefix('[') {
                let inner = inner.strip_suffix(']').ok_or(SpecError::UnterminatedMask)?;
                runlevels = Some(inner.parse::<RunlevelMask>()?);
            } else if let Some(inner) = token.strip_prefix('<') {
                let inner = inner.strip_suffix('>').ok_or(SpecError::UnterminatedConditions)?;
                conditions = inner
                    .split(',')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect();
            } else if let Some(value) = token.strip_prefix("name:") {
                let (base, id) = match value.split_once(':') {
                    Some((base, id)) => {
                        let id = id
                            .parse::<u32>()
                            .map_err(|_| SpecError::BadInstance(token.to_string()))?;
                        (base, id)
                    }
                    None => (value, 0),
                };
                name = Some(base.to_string());
                instance = id;
            } else if let Some(value) = token.strip_prefix("pid:") {
                pid_file = Some(PathBuf::from(value));
            } else if let Some(value) = token.strip_prefix("cgroup.") {
                cgroup = Some(value.to_string());
            } else {
                argv.push(token.to_string());
            }
        }

        if argv.is_empty() {
            return Err(SpecError::MissingCommand);
        }

        let runlevels = runlevels.unwrap_or_else(RunlevelMask::default_service);
        let name = name.unwrap_or_else(|| basename(&argv[0]));
        let bootstrap = runlevels.bootstrap_only();

        Ok(Self {
            name,
            instance,
            argv,
            kind,
            runlevels,
            conditions,
            pid_file,
            cgroup,
            user: None,
            workdir: None,
            rlimits: Vec::new(),
            policy: RestartPolicy::default(),
            state: SvcState::Halted,
            pid: None,
            exit_status: None,
            bootstrap,
            stop_requested: false,
            needs_restart: false,
            stale: false,
            restart_times: VecDeque::new(),
            attempts: 0,
            backoff_until: None,
        })
    }

    /// Serialize back into the spec grammar. `parse(kind, spec_string())`
    /// yields a record equal to a freshly parsed one.
    pub fn spec_string(&self) -> String {
        let mut out = format!("[{}]", self.runlevels);
        if !self.conditions.is_empty() {
            out.push_str(" <");
            out.push_str(&self.conditions.join(","));
            out.push('>');
        }
        out.push_str(" name:");
        out.push_str(&self.name);
        if self.instance != 0 {
            out.push_str(&format!(":{}", self.instance));
        }
        if let Some(ref pid_file) = self.pid_file {
            out.push_str(&format!(" pid:{}", pid_file.display()));
        }
        if let Some(ref cgroup) = self.cgroup {
            out.push_str(&format!(" cgroup.{cgroup}"));
        }
        for arg in &self.argv {
            out.push(' ');
            out.push_str(arg);
        }
        out
    }

    /// Identity key: `(name, instance)`.
    pub fn identity(&self) -> (String, u32) {
        (self.name.clone(), self.instance)
    }

    /// True when the record may run in the given numeric runlevel.
    pub fn in_runlevel(&self, level: u8) -> bool {
        self.runlevels.contains(level)
    }

    /// True while a process exists or a transition is in flight.
    pub fn live(&self) -> bool {
        self.pid.is_some()
            || matches!(self.state, SvcState::Starting | SvcState::Running | SvcState::Stopping)
    }

    /// Record a restart at `now` and report whether the budget still has
    /// room. Timestamps outside the window are forgotten first.
    pub fn note_restart(&mut self, now: Instant) -> bool {
        while let Some(&front) = self.restart_times.front() {
            if now.duration_since(front) > self.policy.window {
                self.restart_times.pop_front();
            } else {
                break;
            }
        }
        self.restart_times.push_back(now);
        self.attempts += 1;
        self.restart_times.len() <= self.policy.max_restarts as usize
    }

    /// Forget restart history after a revive (reload, runlevel change,
    /// condition change) or a stable run.
    pub fn reset_restarts(&mut self) {
        self.restart_times.clear();
        self.attempts = 0;
        self.backoff_until = None;
    }
}

fn basename(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
