// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! The engine that coordinates the system.
//!
//! One single-threaded value owns every piece of mutable state: the
//! system scalars, the registry, conditions, the work queue and the
//! watcher. The reactor feeds it events; the supervisor methods (in
//! `supervise`) and the bootstrap driver (in `bootstrap`) are impl
//! blocks over this type.

use crate::conf::{self, Directive};
use crate::hooks::{HookPoint, Plugin};
use crate::progress::Progress;
use crate::spawn::{SpawnCtx, Spawner};
use crate::watch::Watcher;
use crate::work::{WorkId, WorkQueue};
use crate::{fsinit, shutdown, tty};
use ignite_core::service::{ServiceRecord, SvcType};
use ignite_core::{Clock, ConditionStore, Event, ServiceRegistry, ShutdownKind, SystemState};
use nix::sys::stat::{makedev, mknod, Mode, SFlag};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Runtime that coordinates the system.
pub struct Engine<S, C: Clock> {
    pub state: SystemState,
    pub registry: ServiceRegistry,
    pub conditions: ConditionStore,
    pub work: WorkQueue,
    pub watcher: Watcher,
    pub progress: Progress,
    pub plugins: Vec<Box<dyn Plugin>>,
    pub spawner: S,
    pub clock: C,

    pub conf_file: PathBuf,
    pub conf_dir: PathBuf,
    pub rc_local: PathBuf,

    /// Set once a shutdown has been delegated; the loop keeps serving
    /// until the collaborator takes the machine down.
    pub pending_shutdown: Option<ShutdownKind>,

    pub(crate) bootstrap_ticks: u32,
}

impl<S, C> Engine<S, C>
where
    S: Spawner,
    C: Clock,
{
    pub fn new(spawner: S, clock: C) -> Self {
        Self {
            state: SystemState::new(),
            registry: ServiceRegistry::new(),
            conditions: ConditionStore::new(),
            work: WorkQueue::new(),
            watcher: Watcher::new(),
            progress: Progress::default(),
            plugins: Vec::new(),
            spawner,
            clock,
            conf_file: PathBuf::from(conf::CONF_FILE),
            conf_dir: PathBuf::from(conf::CONF_DIR),
            rc_local: PathBuf::from("/etc/rc.local"),
            pending_shutdown: None,
            bootstrap_ticks: crate::bootstrap::BOOTSTRAP_TICKS,
        }
    }

    pub(crate) fn spawn_ctx(&self) -> SpawnCtx {
        SpawnCtx { fstab: self.state.fstab.clone() }
    }

    /// Dispatch one loop event. Every callback catches and logs; nothing
    /// here may block.
    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::ChildExited { pid, status } => self.on_child_exit(pid, status),
            Event::ConditionChanged { name } => self.step_conditioned(&name),
            Event::ConfigChanged { path } => {
                info!("configuration changed: {}", path.display());
                self.reload();
            }
            Event::RunlevelRequest { level } => self.request_runlevel(level),
            Event::Reload => self.reload(),
            Event::ShutdownRequest { kind } => self.request_shutdown(kind),
        }
    }

    /// Dispatch one due work item.
    pub fn handle_work(&mut self, id: WorkId) {
        match id {
            WorkId::Crank => self.step_all(false),
            WorkId::Bootstrap => self.bootstrap_tick(),
            WorkId::Finalize => self.bootstrap_finalize(),
            WorkId::StopTimeout { name, instance } => self.stop_timeout(&name, instance),
            WorkId::Respawn { name, instance } => self.step(&name, instance, false),
        }
    }

    /// Run every work item whose deadline has passed.
    pub fn run_due(&mut self) {
        let now = self.clock.now();
        for id in self.work.take_due(now) {
            self.handle_work(id);
        }
    }

    /// Runlevel request from the control channel, a signal or telinit.
    /// 0 and 6 delegate to the shutdown collaborator.
    pub fn request_runlevel(&mut self, level: u8) {
        match level {
            0 => self.request_shutdown(ShutdownKind::Poweroff),
            6 => self.request_shutdown(ShutdownKind::Reboot),
            1..=9 => self.change_runlevel(level),
            _ => warn!(level, "runlevel out of range, ignored"),
        }
    }

    pub fn request_shutdown(&mut self, kind: ShutdownKind) {
        if self.pending_shutdown.is_some() {
            debug!(%kind, "shutdown already pending");
            return;
        }
        self.pending_shutdown = Some(kind);
        shutdown::delegate(kind, self.state.shutdown_script.as_deref());
    }

    /// Change the current runlevel. Services leaving the level reach
    /// HALTED before anything new starts.
    pub fn change_runlevel(&mut self, level: u8) {
        if !self.state.bootstrap && level == self.state.runlevel {
            debug!(level, "already in requested runlevel");
            return;
        }
        info!(from = self.state.runlevel, to = level, "changing runlevel");
        self.state.enter_runlevel(level);
        // Stops first; starts are deferred while anything is stopping.
        self.step_stops();
        self.step_all(true);
    }

    /// Re-parse configuration, diff against the registry, apply, step.
    pub fn reload(&mut self) {
        info!("reloading configuration");
        self.registry.mark_all_stale();
        self.load_config();
        let stopping = self.registry.sweep_stale();
        for (name, instance) in stopping {
            self.step(&name, instance, false);
        }
        self.step_all(true);
    }

    /// Parse the config file plus include fragments and apply all
    /// directives, scalars before registrations.
    pub fn load_config(&mut self) {
        let directives = conf::load(&self.conf_file, &self.conf_dir);
        self.apply_directives(directives);
    }

    pub(crate) fn apply_directives(&mut self, directives: Vec<Directive>) {
        let (scalars, rest): (Vec<_>, Vec<_>) =
            directives.into_iter().partition(|d| is_scalar(d));
        for directive in scalars.into_iter().chain(rest) {
            self.apply_directive(directive);
        }
    }

    fn apply_directive(&mut self, directive: Directive) {
        match directive {
            Directive::User(name) => self.state.username = Some(name),
            Directive::Host(name) => {
                if let Err(e) = nix::unistd::sethostname(&name) {
                    warn!("sethostname({name}) failed: {e}");
                }
                self.state.hostname = Some(name);
            }
            Directive::Runlevel(level) => self.state.set_cfglevel(level),
            Directive::Console(dev) => self.state.console = Some(dev),
            Directive::Network(script) => self.state.network_script = Some(script),
            Directive::Runparts(dir) => self.state.runparts_dir = Some(dir),
            Directive::Shutdown(script) => self.state.shutdown_script = Some(script),

            Directive::Check(device) => self.legacy_check(&device),
            Directive::Module(name) => {
                self.register_spec(
                    SvcType::Task,
                    &format!("[S] name:modprobe@{name} /sbin/modprobe {name}"),
                    None,
                );
            }
            Directive::Mknod(spec) => apply_mknod(&spec),

            Directive::Service(spec) => self.register_spec(SvcType::Service, &spec, None),
            Directive::Task(spec) => self.register_spec(SvcType::Task, &spec, None),
            Directive::Run(spec) => self.register_spec(SvcType::Run, &spec, None),
            Directive::Startx(spec) => {
                let user = self.state.username.clone();
                self.register_spec(SvcType::Service, &spec, user);
            }
            Directive::Tty(spec) => match tty::record_from_spec(&spec) {
                Ok(record) => {
                    self.registry.register(record);
                }
                Err(e) => warn!("bad tty spec '{spec}': {e}"),
            },
        }
    }

    /// Register a spec string. Malformed specs warn and leave the
    /// registry unchanged.
    pub fn register_spec(&mut self, kind: SvcType, spec: &str, user: Option<String>) {
        match ServiceRecord::parse(kind, spec) {
            Ok(mut record) => {
                if record.user.is_none() {
                    record.user = user;
                }
                self.registry.register(record);
            }
            Err(e) => warn!("bad {} spec '{spec}': {e}", kind.keyword()),
        }
    }

    /// Legacy `check DEV`: fsck the device right now, and warn when
    /// fstab would check it again.
    fn legacy_check(&mut self, device: &str) {
        if let Ok(entries) = crate::fstab::parse_file(&self.state.fstab) {
            if entries.iter().any(|e| e.device == device && e.passno > 0) {
                warn!(device, "checked both by 'check' directive and fstab pass");
            }
        }
        match fsinit::run_fsck(device) {
            Ok(rc) if rc <= 1 => {}
            Ok(rc) => warn!(device, rc, "filesystem check reported errors"),
            Err(e) => warn!(device, "filesystem check failed to run: {e}"),
        }
    }

    /// Run a hook point: plugins first, then the oneshot condition.
    pub fn run_hook(&mut self, point: HookPoint) {
        debug!(hook = %point, "running hook");
        let mut plugins = std::mem::take(&mut self.plugins);
        for plugin in &mut plugins {
            plugin.on_hook(point);
        }
        self.plugins = plugins;

        let condition = point.condition();
        self.conditions.set_oneshot(condition);
        self.step_conditioned(condition);
        self.conditions.end_propagation();
    }

    /// Assert a condition and step the services gated on it.
    pub fn assert_condition(&mut self, name: &str) {
        if self.conditions.set(name) {
            self.step_conditioned(name);
        }
    }

    /// Retract a condition and step the services gated on it.
    pub fn retract_condition(&mut self, name: &str) {
        if self.conditions.clear(name) {
            self.step_conditioned(name);
        }
    }

    /// Install inotify monitors for the configuration paths. Idempotent;
    /// missing paths are retried on later calls.
    pub fn install_config_watches(&mut self) {
        if !self.watcher.is_initialized() {
            return;
        }
        for path in [self.conf_file.clone(), self.conf_dir.clone()] {
            if let Err(e) = self.watcher.add(&path) {
                warn!("watch on {} failed: {e}", path.display());
            }
        }
    }
}

fn is_scalar(directive: &Directive) -> bool {
    matches!(
        directive,
        Directive::User(_)
            | Directive::Host(_)
            | Directive::Runlevel(_)
            | Directive::Console(_)
            | Directive::Network(_)
            | Directive::Runparts(_)
            | Directive::Shutdown(_)
    )
}

/// `mknod PATH TYPE MAJOR MINOR [MODE]`. An existing node is fine.
fn apply_mknod(spec: &str) {
    let fields: Vec<&str> = spec.split_whitespace().collect();
    let parsed = (|| -> Option<(&str, SFlag, u64, u64, u32)> {
        let path = *fields.first()?;
        let kind = match *fields.get(1)? {
            "c" | "u" => SFlag::S_IFCHR,
            "b" => SFlag::S_IFBLK,
            "p" => SFlag::S_IFIFO,
            _ => return None,
        };
        let major = fields.get(2)?.parse().ok()?;
        let minor = fields.get(3)?.parse().ok()?;
        let mode = fields
            .get(4)
            .and_then(|m| u32::from_str_radix(m, 8).ok())
            .unwrap_or(0o600);
        Some((path, kind, major, minor, mode))
    })();

    let Some((path, kind, major, minor, mode)) = parsed else {
        warn!("bad mknod spec '{spec}'");
        return;
    };
    match mknod(Path::new(path), kind, Mode::from_bits_truncate(mode), makedev(major, minor)) {
        Ok(()) => {}
        Err(nix::errno::Errno::EEXIST) => {}
        Err(e) => warn!("mknod {path} failed: {e}"),
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
