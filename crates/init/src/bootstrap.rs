// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Bootstrap driver (C8).
//!
//! Sequences filesystem bring-up, configuration, hooks and the first
//! supervisor cranks, then polls completion on a 100 ms work item with a
//! hard two-minute deadline before finalizing into the target runlevel.

use crate::engine::Engine;
use crate::hooks::HookPoint;
use crate::spawn::Spawner;
use crate::work::WorkId;
use crate::{cgroup, cmdline, fsinit};
use ignite_core::service::{ServiceRecord, SvcType};
use ignite_core::Clock;
use nix::sys::signal::{signal, SigHandler, Signal};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bootstrap deadline: 1200 ticks of 100 ms = 120 s.
pub const BOOTSTRAP_TICKS: u32 = 1200;
/// Bootstrap worker cadence.
pub const TICK: Duration = Duration::from_millis(100);
/// Delay before finalize once services completed.
pub const FINALIZE_DELAY: Duration = Duration::from_millis(10);

/// Built-in helpers registered when present on disk.
const BUILTINS: &[(&str, &str)] = &[
    ("watchdogd", "/sbin/watchdogd"),
    ("keventd", "/sbin/keventd"),
];

/// The synchronous part of bootstrap, run before the loop starts.
///
/// Returns false when early bring-up was unrecoverable (sulogin has
/// already run and a reboot is delegated).
pub fn run<S, C>(engine: &mut Engine<S, C>) -> bool
where
    S: Spawner,
    C: Clock,
{
    if !fsinit::init(engine) {
        return false;
    }

    let opts = cmdline::read();
    engine.state.debug |= opts.debug;
    engine.state.rescue |= opts.rescue;
    if opts.cmdlevel.is_some() {
        engine.state.cmdlevel = opts.cmdlevel;
    }
    if let Some(console) = opts.console {
        engine.state.console = Some(console);
    }

    console_init(engine);
    engine.run_hook(HookPoint::Banner);
    engine.progress.step("bringing the system up");

    if engine.state.rescue {
        rescue_shell(engine);
    }

    debug!(count = engine.plugins.len(), "plugins loaded");
    ignore_early_signals();
    cgroup::init();

    fsinit::mount_all(engine);

    engine.load_config();
    register_builtins(engine);
    register_network(engine);

    engine.run_hook(HookPoint::BasefsUp);

    // Real signal handlers and the control socket are installed by the
    // reactor; from here everything runs as loop work.
    let now = engine.clock.now();
    engine.work.schedule(WorkId::Crank, Duration::ZERO, now);
    engine.work.schedule(WorkId::Bootstrap, TICK, now);
    true
}

impl<S, C> Engine<S, C>
where
    S: Spawner,
    C: Clock,
{
    /// The 100 ms bootstrap worker: monitor config, crank services,
    /// re-arm until completion or deadline.
    pub fn bootstrap_tick(&mut self) {
        self.install_config_watches();
        self.step_all(false);
        self.bootstrap_ticks = self.bootstrap_ticks.saturating_sub(1);

        if !self.service_completed() && self.bootstrap_ticks > 0 {
            let now = self.clock.now();
            self.work.schedule(WorkId::Bootstrap, TICK, now);
            return;
        }
        if !self.service_completed() {
            warn!("bootstrap timed out after 120 s, finalizing anyway");
        }

        let now = self.clock.now();
        self.work.schedule(WorkId::Finalize, FINALIZE_DELAY, now);
        self.run_parts();
        let target = self.state.target_level();
        self.change_runlevel(target);
    }

    /// Finalize: prune, hooks, rc.local, clear the bootstrap flag, raise
    /// the respawn services (which brings up TTYs).
    pub fn bootstrap_finalize(&mut self) {
        let pruned = self.registry.prune_bootstrap();
        if pruned > 0 {
            debug!(pruned, "pruned bootstrap-only records");
        }
        self.run_hook(HookPoint::SvcUp);
        self.step_all(false);
        self.run_rc_local();
        self.run_hook(HookPoint::SystemUp);
        self.progress.disable();
        self.state.bootstrap = false;
        self.step_type(SvcType::Service, false);
        self.step_type(SvcType::Sysv, false);
        info!(runlevel = self.state.runlevel, "bootstrap complete");
    }

    /// Execute the runparts directory, scripts in lexical order, each
    /// waited for. Skipped in rescue mode.
    fn run_parts(&mut self) {
        let Some(dir) = self.state.runparts_dir.clone() else {
            return;
        };
        if self.state.rescue {
            return;
        }
        let Ok(entries) = std::fs::read_dir(&dir) else {
            debug!("no runparts directory at {}", dir.display());
            return;
        };
        let mut scripts: Vec<PathBuf> =
            entries.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| is_executable(p)).collect();
        scripts.sort();
        for script in scripts {
            self.progress.step(&format!("running {}", script.display()));
            match Command::new(&script).status() {
                Ok(status) if status.success() => {}
                Ok(status) => warn!("{} exited with {status}", script.display()),
                Err(e) => warn!("{} failed to run: {e}", script.display()),
            }
        }
    }

    /// `/etc/rc.local`, when executable and not in rescue mode.
    fn run_rc_local(&mut self) {
        let rc_local = self.rc_local.clone();
        if self.state.rescue || !is_executable(&rc_local) {
            return;
        }
        info!("running {}", rc_local.display());
        match Command::new(&rc_local).status() {
            Ok(status) if status.success() => {}
            Ok(status) => warn!("{} exited with {status}", rc_local.display()),
            Err(e) => warn!("{} failed to run: {e}", rc_local.display()),
        }
    }
}

fn console_init<S, C>(engine: &mut Engine<S, C>)
where
    S: Spawner,
    C: Clock,
{
    let Some(ref console) = engine.state.console else {
        return;
    };
    if console.exists() {
        info!("console on {}", console.display());
    } else {
        warn!("configured console {} does not exist", console.display());
    }
}

/// Drop to a single-user shell, then continue the boot.
fn rescue_shell<S, C>(engine: &mut Engine<S, C>)
where
    S: Spawner,
    C: Clock,
{
    engine.progress.step("rescue mode");
    match Command::new("/sbin/sulogin").status() {
        Ok(status) => info!("rescue shell exited with {status}"),
        Err(e) => warn!("sulogin failed to run: {e}"),
    }
}

/// Early bring-up runs with terminal signals ignored; the reactor
/// installs the real loop-delivered handlers.
fn ignore_early_signals() {
    for sig in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGQUIT, Signal::SIGHUP] {
        // Safety: SigIgn installs no handler code.
        if let Err(e) = unsafe { signal(sig, SigHandler::SigIgn) } {
            warn!("ignoring {sig} failed: {e}");
        }
    }
}

fn register_builtins<S, C>(engine: &mut Engine<S, C>)
where
    S: Spawner,
    C: Clock,
{
    for (name, path) in BUILTINS {
        if Path::new(path).exists() {
            debug!(service = name, "registering built-in");
            engine.register_spec(
                SvcType::Service,
                &format!("[S123456789] name:{name} {path}"),
                None,
            );
        }
    }
}

/// The configured network script runs as an awaited bootstrap task.
fn register_network<S, C>(engine: &mut Engine<S, C>)
where
    S: Spawner,
    C: Clock,
{
    let Some(script) = engine.state.network_script.clone() else {
        return;
    };
    match ServiceRecord::parse(SvcType::Run, "[S] name:network /bin/sh") {
        Ok(mut record) => {
            record.argv = vec!["/bin/sh".to_string(), "-c".to_string(), script];
            engine.registry.register(record);
        }
        Err(e) => warn!("network script registration failed: {e}"),
    }
}

fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
