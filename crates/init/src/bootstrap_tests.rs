// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

use super::*;
use crate::spawn::FakeSpawner;
use crate::work::WorkId;
use ignite_core::{FakeClock, SvcState};

fn engine() -> Engine<FakeSpawner, FakeClock> {
    let mut engine = Engine::new(FakeSpawner::new(), FakeClock::new());
    engine.progress.disable();
    engine.conf_file = PathBuf::from("/nonexistent/ignite.conf");
    engine.conf_dir = PathBuf::from("/nonexistent/ignite.d");
    engine.rc_local = PathBuf::from("/nonexistent/rc.local");
    engine
}

fn finish(engine: &mut Engine<FakeSpawner, FakeClock>, name: &str) {
    let pid = engine.registry.find(name, 0).and_then(|r| r.pid);
    if let Some(pid) = pid {
        engine.on_child_exit(pid, 0);
    }
}

#[test]
fn tick_rearms_until_services_complete() {
    let mut engine = engine();
    engine.register_spec(SvcType::Run, "[S] name:setup /bin/setup", None);

    engine.bootstrap_tick();
    // setup spawned but not finished: the worker re-arms itself.
    assert_eq!(engine.registry.find("setup", 0).unwrap().state, SvcState::Running);
    assert!(engine.work.is_pending(&WorkId::Bootstrap));
    assert!(!engine.work.is_pending(&WorkId::Finalize));

    finish(&mut engine, "setup");
    engine.bootstrap_tick();
    assert!(engine.work.is_pending(&WorkId::Finalize));
}

#[test]
fn tick_enters_target_level_when_complete() {
    let mut engine = engine();
    engine.state.cfglevel = 3;
    engine.bootstrap_tick();

    assert_eq!(engine.state.runlevel, 3);
    assert!(engine.work.is_pending(&WorkId::Finalize));
    assert!(!engine.work.is_pending(&WorkId::Bootstrap));
}

#[test]
fn cmdlevel_overrides_cfglevel() {
    let mut engine = engine();
    engine.state.cfglevel = 3;
    engine.state.cmdlevel = Some(5);
    engine.bootstrap_tick();
    assert_eq!(engine.state.runlevel, 5);
}

#[test]
fn zero_cmdlevel_boots_into_cfglevel() {
    let mut engine = engine();
    engine.state.cfglevel = 3;
    engine.state.cmdlevel = Some(0);
    engine.bootstrap_tick();
    assert_eq!(engine.state.runlevel, 3);
    assert!(engine.pending_shutdown.is_none());
}

#[test]
fn deadline_forces_finalize() {
    let mut engine = engine();
    engine.register_spec(SvcType::Run, "[S] name:stuck /bin/stuck", None);
    engine.bootstrap_ticks = 1;

    engine.bootstrap_tick();
    // Out of ticks with an unfinished run record: finalize anyway.
    assert!(engine.work.is_pending(&WorkId::Finalize));
}

#[test]
fn finalize_prunes_and_raises_services() {
    let mut engine = engine();
    engine.state.cfglevel = 3;
    // Gated bootstrap task that never starts, and a normal service.
    engine.register_spec(SvcType::Task, "[S] <never/on> name:skipped /bin/skipped", None);
    engine.register_spec(SvcType::Service, "[234] name:svc /bin/svc", None);
    // The gated task can never complete; let the deadline force finalize.
    engine.bootstrap_ticks = 1;

    engine.bootstrap_tick();
    assert_eq!(engine.state.runlevel, 3);
    // Still bootstrap: the runlevel service has not started yet.
    assert_eq!(engine.registry.find("svc", 0).unwrap().state, SvcState::Halted);

    engine.bootstrap_finalize();

    assert!(!engine.state.bootstrap);
    assert!(engine.registry.find("skipped", 0).is_none(), "unstarted bootstrap record pruned");
    assert_eq!(engine.registry.find("svc", 0).unwrap().state, SvcState::Running);
    assert!(!engine.progress.is_enabled());
}

#[test]
fn finalize_is_idempotent_for_completed_tasks() {
    let mut engine = engine();
    engine.register_spec(SvcType::Task, "[S] name:mkdirs /bin/mkdirs", None);

    engine.bootstrap_tick();
    finish(&mut engine, "mkdirs");
    engine.bootstrap_tick();
    engine.bootstrap_finalize();
    assert_eq!(engine.registry.find("mkdirs", 0).unwrap().state, SvcState::Done);

    // A second cycle over the same config cannot re-run the task.
    engine.register_spec(SvcType::Task, "[S] name:mkdirs /bin/mkdirs", None);
    engine.step_all(false);
    assert_eq!(engine.registry.find("mkdirs", 0).unwrap().state, SvcState::Done);
    assert_eq!(engine.spawner.spawned.len(), 1);
}
