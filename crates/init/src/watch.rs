// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Configuration file watcher over inotify (C2).
//!
//! The watcher owns the kernel inotify instance and one entry per watched
//! path. Every entry owns its path exclusively; the path is dropped only
//! when the entry leaves the set.

use nix::errno::Errno;
use nix::sys::inotify::{AddWatchFlags, InitFlags, Inotify, InotifyEvent, WatchDescriptor};
use std::collections::HashMap;
use std::os::fd::{AsFd, AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from watcher operations.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Operation before [`Watcher::init`] succeeded.
    #[error("watcher not initialized")]
    NotInitialized,

    #[error(transparent)]
    Sys(#[from] Errno),
}

/// Inotify watcher over configuration files and directories.
///
/// Disabled until [`init`] has succeeded; all other calls fail with
/// [`WatchError::NotInitialized`] before that.
///
/// [`init`]: Watcher::init
#[derive(Debug, Default)]
pub struct Watcher {
    inotify: Option<Inotify>,
    entries: HashMap<WatchDescriptor, PathBuf>,
}

impl Watcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the kernel instance. Returns the pollable fd, which stays
    /// owned by the watcher.
    pub fn init(&mut self) -> Result<RawFd, WatchError> {
        if let Some(ref inotify) = self.inotify {
            return Ok(inotify.as_fd().as_raw_fd());
        }
        let inotify = Inotify::init(InitFlags::IN_NONBLOCK | InitFlags::IN_CLOEXEC)?;
        let fd = inotify.as_fd().as_raw_fd();
        self.inotify = Some(inotify);
        Ok(fd)
    }

    pub fn is_initialized(&self) -> bool {
        self.inotify.is_some()
    }

    /// Watch a path with the default mask (create, delete, moves, modify,
    /// attrib). A path that does not exist is a success no-op; the caller
    /// may retry on parent-directory events.
    pub fn add(&mut self, path: &Path) -> Result<(), WatchError> {
        self.add_mask(path, default_mask())
    }

    /// Watch a path with an explicit mask.
    pub fn add_mask(&mut self, path: &Path, mask: AddWatchFlags) -> Result<(), WatchError> {
        let inotify = self.inotify.as_ref().ok_or(WatchError::NotInitialized)?;
        if self.entries.values().any(|p| p == path) {
            return Ok(());
        }
        match inotify.add_watch(path, mask) {
            Ok(wd) => {
                self.entries.insert(wd, path.to_path_buf());
                Ok(())
            }
            Err(Errno::ENOENT) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the watch on a path.
    pub fn remove(&mut self, path: &Path) -> Result<(), WatchError> {
        let inotify = self.inotify.as_ref().ok_or(WatchError::NotInitialized)?;
        let wd = self
            .entries
            .iter()
            .find(|(_, p)| p.as_path() == path)
            .map(|(wd, _)| *wd);
        if let Some(wd) = wd {
            // EINVAL here means the kernel already dropped the watch
            // (e.g. the file was deleted); forget the entry either way.
            match inotify.rm_watch(wd) {
                Ok(()) | Err(Errno::EINVAL) => {}
                Err(e) => return Err(e.into()),
            }
            self.entries.remove(&wd);
        }
        Ok(())
    }

    pub fn find_by_wd(&self, wd: WatchDescriptor) -> Option<&Path> {
        self.entries.get(&wd).map(PathBuf::as_path)
    }

    pub fn find_by_path(&self, path: &Path) -> bool {
        self.entries.values().any(|p| p.as_path() == path)
    }

    /// Drain pending kernel events, resolving each to its watched path.
    pub fn read_events(&mut self) -> Result<Vec<(PathBuf, InotifyEvent)>, WatchError> {
        let inotify = self.inotify.as_ref().ok_or(WatchError::NotInitialized)?;
        match inotify.read_events() {
            Ok(events) => Ok(events
                .into_iter()
                .filter_map(|ev| {
                    self.entries.get(&ev.wd).map(|path| (path.clone(), ev))
                })
                .collect()),
            Err(Errno::EAGAIN) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove kernel watches and close the fd.
    pub fn teardown(&mut self) {
        if let Some(inotify) = self.inotify.take() {
            for wd in self.entries.keys() {
                let _ = inotify.rm_watch(*wd);
            }
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn default_mask() -> AddWatchFlags {
    AddWatchFlags::IN_CREATE
        | AddWatchFlags::IN_DELETE
        | AddWatchFlags::IN_MOVED_FROM
        | AddWatchFlags::IN_MOVED_TO
        | AddWatchFlags::IN_MODIFY
        | AddWatchFlags::IN_ATTRIB
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
