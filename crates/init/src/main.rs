// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! The `ignite` binary: pid 1 boots and supervises the system; any other
//! pid acts as a telinit-style control client.

use ignite_core::SystemClock;
use ignite_init::engine::Engine;
use ignite_init::reactor::Reactor;
use ignite_init::spawn::UnixSpawner;
use ignite_init::{bootstrap, telinit};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if nix::unistd::getpid().as_raw() != 1 {
        std::process::exit(telinit::run(&args));
    }

    init_logging(args.iter().any(|a| a == "debug"));
    info!("ignite {} booting", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            // pid 1 must not exit; without a runtime nothing can be
            // supervised, so park instead of panicking the kernel.
            error!("runtime setup failed: {e}");
            park_forever();
        }
    };

    runtime.block_on(async {
        let mut engine = Engine::new(UnixSpawner, SystemClock);
        if !bootstrap::run(&mut engine) {
            error!("early bring-up failed, shutdown delegated");
        }
        let watcher_fd = match engine.watcher.init() {
            Ok(fd) => Some(fd),
            Err(e) => {
                error!("inotify unavailable: {e}");
                None
            }
        };
        Reactor::new(engine, watcher_fd).run().await;
    });

    // The reactor never returns; reaching this point is a bug.
    error!("event loop returned");
    park_forever();
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn park_forever() -> ! {
    loop {
        std::thread::park();
    }
}
