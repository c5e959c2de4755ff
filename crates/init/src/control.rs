// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Control API (C9): runtime commands against the engine.
//!
//! Transport (the datagram socket) lives in the reactor; this module is
//! the request dispatch, so it stays testable without sockets.

use crate::engine::Engine;
use crate::spawn::Spawner;
use ignite_core::service::ServiceRecord;
use ignite_core::{Clock, Event, ShutdownKind};
use ignite_wire::{Request, Response, ServiceEntry, SystemStatus};
use tracing::info;

impl<S, C> Engine<S, C>
where
    S: Spawner,
    C: Clock,
{
    /// Apply one control-channel command and build its reply.
    pub fn handle_request(&mut self, request: Request) -> Response {
        info!(?request, "control request");
        match request {
            Request::Runlevel { level } => {
                if level > 9 {
                    return Response::error(format!("runlevel {level} out of range 0..9"));
                }
                self.handle_event(Event::RunlevelRequest { level });
                Response::Ok
            }
            Request::Reload => {
                self.handle_event(Event::Reload);
                Response::Ok
            }
            Request::Status => Response::Status { status: self.status() },
            Request::Start { name } => self.control_start(&name),
            Request::Stop { name } => self.control_stop(&name),
            Request::Restart { name } => self.control_restart(&name),
            Request::Poweroff => {
                self.handle_event(Event::ShutdownRequest { kind: ShutdownKind::Poweroff });
                Response::Ok
            }
            Request::Reboot => {
                self.handle_event(Event::ShutdownRequest { kind: ShutdownKind::Reboot });
                Response::Ok
            }
            Request::Halt => {
                self.handle_event(Event::ShutdownRequest { kind: ShutdownKind::Halt });
                Response::Ok
            }
        }
    }

    /// Snapshot for `status`.
    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            runlevel: self.state.runlevel,
            prevlevel: self.state.prevlevel,
            bootstrap: self.state.bootstrap,
            services: self
                .registry
                .iter()
                .map(|record| ServiceEntry {
                    name: record.name.clone(),
                    instance: record.instance,
                    kind: record.kind.keyword().to_string(),
                    state: record.state.to_string(),
                    pid: record.pid,
                    runlevels: record.runlevels.to_string(),
                })
                .collect(),
        }
    }

    fn named_instances(&self, name: &str) -> Vec<(String, u32)> {
        self.registry
            .iter()
            .filter(|r| r.name == name)
            .map(ServiceRecord::identity)
            .collect()
    }

    fn control_start(&mut self, name: &str) -> Response {
        let targets = self.named_instances(name);
        if targets.is_empty() {
            return Response::error(format!("no such service '{name}'"));
        }
        for (record_name, instance) in targets {
            if let Some(record) = self.registry.find_mut(&record_name, instance) {
                record.stop_requested = false;
            }
            self.step(&record_name, instance, true);
        }
        Response::Ok
    }

    fn control_stop(&mut self, name: &str) -> Response {
        let targets = self.named_instances(name);
        if targets.is_empty() {
            return Response::error(format!("no such service '{name}'"));
        }
        for (record_name, instance) in targets {
            if let Some(record) = self.registry.find_mut(&record_name, instance) {
                record.stop_requested = true;
            }
            self.step(&record_name, instance, false);
        }
        Response::Ok
    }

    fn control_restart(&mut self, name: &str) -> Response {
        let targets = self.named_instances(name);
        if targets.is_empty() {
            return Response::error(format!("no such service '{name}'"));
        }
        for (record_name, instance) in targets {
            if let Some(record) = self.registry.find_mut(&record_name, instance) {
                record.stop_requested = false;
                record.needs_restart = true;
            }
            self.step(&record_name, instance, true);
        }
        Response::Ok
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
