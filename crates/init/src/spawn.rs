// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Child process spawning behind a seam the supervisor tests can fake.

use ignite_core::service::{Rlimit, ServiceRecord};
use nix::sys::resource::{setrlimit, Resource};
use nix::sys::signal::{kill, Signal};
use nix::sys::stat::{umask, Mode};
use nix::unistd::{setgid, setsid, setuid, Gid, Pid, Uid, User};
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Search path exported to every child.
const CHILD_PATH: &str = "/sbin:/usr/sbin:/bin:/usr/bin";

/// Errors from spawning or signalling a child.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Sys(#[from] nix::errno::Errno),
}

/// Environment inputs every spawn shares.
#[derive(Debug, Clone)]
pub struct SpawnCtx {
    pub fstab: PathBuf,
}

/// Seam between the state machine and the operating system.
pub trait Spawner {
    /// Fork and exec a record's command line; returns the child pid.
    fn spawn(&mut self, record: &ServiceRecord, ctx: &SpawnCtx) -> Result<i32, SpawnError>;

    /// Deliver a signal to a previously spawned pid.
    fn kill(&mut self, pid: i32, signal: Signal) -> Result<(), SpawnError>;
}

/// The real thing: `Command` plus a pre-exec block that detaches the
/// child into its own session, applies limits and drops privileges.
#[derive(Debug, Default)]
pub struct UnixSpawner;

impl Spawner for UnixSpawner {
    fn spawn(&mut self, record: &ServiceRecord, ctx: &SpawnCtx) -> Result<i32, SpawnError> {
        let identity = match record.user.as_deref() {
            Some(name) => {
                let user = User::from_name(name)?
                    .ok_or_else(|| SpawnError::UnknownUser(name.to_string()))?;
                Some((user.uid, user.gid))
            }
            None => None,
        };
        let limits = resolve_limits(&record.rlimits);

        let workdir = record.workdir.clone().unwrap_or_else(|| PathBuf::from("/"));
        let mut cmd = Command::new(&record.argv[0]);
        cmd.args(&record.argv[1..])
            .env_clear()
            .env("PATH", CHILD_PATH)
            .env("SHELL", "/bin/sh")
            .env("PWD", &workdir)
            .env("FSTAB_FILE", &ctx.fstab)
            .current_dir(&workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        unsafe {
            cmd.pre_exec(move || {
                setsid().map_err(sys_err)?;
                umask(Mode::from_bits_truncate(0o022));
                for (resource, soft, hard) in &limits {
                    setrlimit(*resource, *soft, *hard).map_err(sys_err)?;
                }
                if let Some((uid, gid)) = identity {
                    apply_identity(uid, gid)?;
                }
                Ok(())
            });
        }

        let child = cmd.spawn()?;
        // The child is reaped by the loop's SIGCHLD drain, never here.
        Ok(child.id() as i32)
    }

    fn kill(&mut self, pid: i32, signal: Signal) -> Result<(), SpawnError> {
        kill(Pid::from_raw(pid), signal)?;
        Ok(())
    }
}

fn apply_identity(uid: Uid, gid: Gid) -> io::Result<()> {
    setgid(gid).map_err(sys_err)?;
    setuid(uid).map_err(sys_err)?;
    Ok(())
}

fn sys_err(errno: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}

fn resolve_limits(rlimits: &[Rlimit]) -> Vec<(Resource, u64, u64)> {
    rlimits
        .iter()
        .filter_map(|r| {
            resource_by_name(&r.resource).map(|resource| (resource, r.soft, r.hard))
        })
        .collect()
}

fn resource_by_name(name: &str) -> Option<Resource> {
    Some(match name {
        "core" => Resource::RLIMIT_CORE,
        "cpu" => Resource::RLIMIT_CPU,
        "data" => Resource::RLIMIT_DATA,
        "fsize" => Resource::RLIMIT_FSIZE,
        "nofile" => Resource::RLIMIT_NOFILE,
        "nproc" => Resource::RLIMIT_NPROC,
        "stack" => Resource::RLIMIT_STACK,
        _ => return None,
    })
}

/// Recording spawner for supervisor tests. Spawns nothing; hands out
/// sequential fake pids and optionally fails the next spawn.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct FakeSpawner {
    pub spawned: Vec<(String, Vec<String>)>,
    pub killed: Vec<(i32, Signal)>,
    pub fail_next: bool,
    next_pid: i32,
}

#[cfg(test)]
impl FakeSpawner {
    pub fn new() -> Self {
        Self { next_pid: 100, ..Self::default() }
    }
}

#[cfg(test)]
impl Spawner for FakeSpawner {
    fn spawn(&mut self, record: &ServiceRecord, _ctx: &SpawnCtx) -> Result<i32, SpawnError> {
        if self.fail_next {
            self.fail_next = false;
            return Err(SpawnError::Io(io::Error::from(io::ErrorKind::NotFound)));
        }
        self.next_pid += 1;
        self.spawned.push((record.name.clone(), record.argv.clone()));
        Ok(self.next_pid)
    }

    fn kill(&mut self, pid: i32, signal: Signal) -> Result<(), SpawnError> {
        self.killed.push((pid, signal));
        Ok(())
    }
}
