// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Named boolean conditions that gate service startup.
//!
//! Condition names are hierarchical, slash-separated paths such as
//! `pid/sshd` or `hook/basefs-up`. Services list the conditions they
//! require; the supervisor only starts a service once every required
//! condition reads [`CondState::On`]. Unknown names read as Off.

use std::collections::HashMap;
use std::fmt;

/// State of a named condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CondState {
    On,
    #[default]
    Off,
    /// The condition is changing (e.g. during reload) and must not be
    /// trusted as either On or Off.
    Flux,
}

impl fmt::Display for CondState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CondState::On => "on",
            CondState::Off => "off",
            CondState::Flux => "flux",
        };
        f.write_str(s)
    }
}

/// Store of named condition assertions.
///
/// The store is monotone within a single supervisor step: mutation happens
/// only between steps, and oneshot retraction is an explicit call the
/// engine makes after propagation.
#[derive(Debug, Default)]
pub struct ConditionStore {
    states: HashMap<String, CondState>,
    oneshot: Vec<String>,
}

impl ConditionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a condition. Unknown names are Off.
    pub fn get(&self, name: &str) -> CondState {
        self.states.get(name).copied().unwrap_or(CondState::Off)
    }

    /// Assert a condition. Returns true when the state changed.
    pub fn set(&mut self, name: &str) -> bool {
        self.transition(name, CondState::On)
    }

    /// Retract a condition. Returns true when the state changed.
    pub fn clear(&mut self, name: &str) -> bool {
        self.transition(name, CondState::Off)
    }

    /// Mark a condition as in flux. Returns true when the state changed.
    pub fn set_flux(&mut self, name: &str) -> bool {
        self.transition(name, CondState::Flux)
    }

    /// Assert a condition that is implicitly retracted after propagation.
    ///
    /// The engine steps gated services, then calls [`end_propagation`]
    /// to retract every pending oneshot.
    ///
    /// [`end_propagation`]: ConditionStore::end_propagation
    pub fn set_oneshot(&mut self, name: &str) -> bool {
        self.oneshot.push(name.to_string());
        self.transition(name, CondState::On)
    }

    /// Retract all pending oneshot conditions, returning the names that
    /// changed state.
    pub fn end_propagation(&mut self) -> Vec<String> {
        let pending = std::mem::take(&mut self.oneshot);
        pending.into_iter().filter(|name| self.clear(name)).collect()
    }

    /// True when every listed condition is On. An empty list is satisfied.
    pub fn satisfied(&self, names: &[String]) -> bool {
        names.iter().all(|n| self.get(n) == CondState::On)
    }

    fn transition(&mut self, name: &str, to: CondState) -> bool {
        match self.states.get_mut(name) {
            Some(state) if *state == to => false,
            Some(state) => {
                *state = to;
                true
            }
            None if to == CondState::Off => false,
            None => {
                self.states.insert(name.to_string(), to);
                true
            }
        }
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
