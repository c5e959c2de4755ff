// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! The event loop (C1).
//!
//! A single-threaded reactor: kernel signals become loop events, the
//! control socket and the inotify fd are polled for readiness, and due
//! work items run after fd work. All state mutation happens here, on the
//! loop, through the engine.

use crate::engine::Engine;
use crate::spawn::Spawner;
use ignite_core::{Clock, Event, ShutdownKind};
use ignite_wire as wire;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use std::io;
use std::os::fd::RawFd;
use std::path::Path;
use tokio::io::unix::AsyncFd;
use tokio::net::UnixDatagram;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, error, warn};

/// Raw-fd wrapper so the loop can poll the watcher's fd without taking
/// ownership (the watcher owns and closes it).
struct WatchFd(RawFd);

impl std::os::fd::AsRawFd for WatchFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

struct Signals {
    chld: Signal,
    hup: Signal,
    int: Signal,
    usr1: Signal,
    usr2: Signal,
}

/// The loop shell around the engine.
pub struct Reactor<S, C: Clock> {
    pub engine: Engine<S, C>,
    socket: Option<UnixDatagram>,
    watch_fd: Option<AsyncFd<WatchFd>>,
}

impl<S, C> Reactor<S, C>
where
    S: Spawner,
    C: Clock,
{
    /// Wrap the engine, binding the control socket and registering the
    /// watcher fd when available. Failures degrade: the loop still runs.
    pub fn new(engine: Engine<S, C>, watcher_fd: Option<RawFd>) -> Self {
        let socket = match bind_control_socket() {
            Ok(socket) => Some(socket),
            Err(e) => {
                error!("control socket unavailable: {e}");
                None
            }
        };
        let watch_fd = watcher_fd.and_then(|fd| match AsyncFd::new(WatchFd(fd)) {
            Ok(fd) => Some(fd),
            Err(e) => {
                warn!("cannot poll inotify fd: {e}");
                None
            }
        });
        Self { engine, socket, watch_fd }
    }

    /// Run forever. Within one iteration: signals first, then fd work,
    /// then due timers.
    pub async fn run(mut self) {
        let mut signals = match install_signals() {
            Ok(signals) => signals,
            Err(e) => {
                // Without SIGCHLD there is no supervision; keep cranking
                // timers anyway rather than dying as pid 1.
                error!("signal setup failed: {e}");
                loop {
                    self.engine.run_due();
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                }
            }
        };

        let mut buf = vec![0u8; 64 * 1024];
        loop {
            self.engine.run_due();
            let deadline = self.engine.work.next_deadline();

            tokio::select! {
                biased;

                _ = signals.chld.recv() => {
                    for (pid, status) in reap_children() {
                        self.engine.handle_event(Event::ChildExited { pid, status });
                    }
                }
                _ = signals.int.recv() => {
                    // Ctrl-alt-del.
                    self.engine.handle_event(Event::RunlevelRequest { level: 6 });
                }
                _ = signals.hup.recv() => {
                    self.engine.handle_event(Event::Reload);
                }
                _ = signals.usr1.recv() => {
                    self.engine.handle_event(Event::ShutdownRequest { kind: ShutdownKind::Halt });
                }
                _ = signals.usr2.recv() => {
                    self.engine
                        .handle_event(Event::ShutdownRequest { kind: ShutdownKind::Poweroff });
                }

                result = recv_datagram(&self.socket, &mut buf) => {
                    match result {
                        Ok((len, addr)) => self.handle_datagram(&buf[..len], addr).await,
                        Err(e) => warn!("control socket receive failed: {e}"),
                    }
                }

                result = watch_ready(&self.watch_fd) => {
                    if let Err(e) = result {
                        warn!("inotify poll failed: {e}");
                    }
                    self.drain_watch_events();
                }

                _ = sleep_until(deadline) => {}
            }
        }
    }

    async fn handle_datagram(&mut self, payload: &[u8], addr: tokio::net::unix::SocketAddr) {
        let request = match wire::decode_request(payload) {
            Ok(request) => request,
            Err(e) => {
                warn!("bad control datagram: {e}");
                return;
            }
        };
        let response = self.engine.handle_request(request);
        let Some(ref socket) = self.socket else {
            return;
        };
        let Some(path) = addr.as_pathname().map(Path::to_path_buf) else {
            debug!("control client is unbound, no reply sent");
            return;
        };
        match wire::encode(&response) {
            Ok(bytes) => {
                if let Err(e) = socket.send_to(&bytes, &path).await {
                    debug!("control reply to {} failed: {e}", path.display());
                }
            }
            Err(e) => warn!("control reply encoding failed: {e}"),
        }
    }

    fn drain_watch_events(&mut self) {
        let events = match self.engine.watcher.read_events() {
            Ok(events) => events,
            Err(e) => {
                warn!("inotify read failed: {e}");
                return;
            }
        };
        let mut changed: Vec<std::path::PathBuf> =
            events.into_iter().map(|(path, _)| path).collect();
        changed.sort();
        changed.dedup();
        for path in changed {
            self.engine.handle_event(Event::ConfigChanged { path });
        }
    }
}

fn bind_control_socket() -> io::Result<UnixDatagram> {
    let path = Path::new(wire::CONTROL_SOCKET);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    UnixDatagram::bind(path)
}

fn install_signals() -> io::Result<Signals> {
    Ok(Signals {
        chld: signal(SignalKind::child())?,
        hup: signal(SignalKind::hangup())?,
        int: signal(SignalKind::interrupt())?,
        usr1: signal(SignalKind::user_defined1())?,
        usr2: signal(SignalKind::user_defined2())?,
    })
}

/// Drain every ready child with non-blocking wait-any.
fn reap_children() -> Vec<(i32, i32)> {
    let mut reaped = Vec::new();
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => reaped.push((pid.as_raw(), code)),
            Ok(WaitStatus::Signaled(pid, sig, _)) => {
                reaped.push((pid.as_raw(), 128 + sig as i32));
            }
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("waitpid failed: {e}");
                break;
            }
        }
    }
    reaped
}

async fn recv_datagram(
    socket: &Option<UnixDatagram>,
    buf: &mut [u8],
) -> io::Result<(usize, tokio::net::unix::SocketAddr)> {
    match socket {
        Some(socket) => socket.recv_from(buf).await,
        None => std::future::pending().await,
    }
}

async fn watch_ready(watch_fd: &Option<AsyncFd<WatchFd>>) -> io::Result<()> {
    match watch_fd {
        Some(fd) => {
            let mut guard = fd.readable().await?;
            guard.clear_ready();
            Ok(())
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        }
        None => std::future::pending().await,
    }
}
