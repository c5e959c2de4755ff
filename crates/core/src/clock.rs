// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Clock abstraction for testable time handling

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time.
///
/// The init process is strictly single-threaded, so clocks are plain
/// `Clone` values without cross-thread bounds.
pub trait Clock: Clone {
    fn now(&self) -> Instant;
    fn epoch_ms(&self) -> u64;
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Rc<Cell<Instant>>,
    epoch_ms: Rc<Cell<u64>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Rc::new(Cell::new(Instant::now())),
            epoch_ms: Rc::new(Cell::new(1_000_000)),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        self.current.set(self.current.get() + duration);
        self.epoch_ms.set(self.epoch_ms.get() + duration.as_millis() as u64);
    }

    /// Set the clock to a specific instant
    pub fn set(&self, instant: Instant) {
        self.current.set(instant);
    }

    /// Set the epoch milliseconds value
    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.set(ms);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.current.get()
    }

    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.get()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
