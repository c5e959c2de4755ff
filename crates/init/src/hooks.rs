// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Named bootstrap hook points.
//!
//! Plugins are external collaborators; the core's contract is to call
//! them at these points and to assert the matching oneshot condition so
//! config-declared services can gate on a hook having run.

use std::fmt;

/// Points in bootstrap at which collaborators may run code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// Console is up; a banner may be printed.
    Banner,
    /// Root filesystem checked and (re)mounted.
    RootfsUp,
    /// `mount -a` failed.
    MountError,
    /// All fstab mounts attempted.
    MountPost,
    /// Base filesystem ready; config may be read.
    BasefsUp,
    /// Networking script finished.
    NetworkUp,
    /// Bootstrap services are up.
    SvcUp,
    /// System fully up.
    SystemUp,
}

impl HookPoint {
    /// Condition asserted (oneshot) when the hook runs.
    pub fn condition(self) -> &'static str {
        match self {
            HookPoint::Banner => "hook/banner",
            HookPoint::RootfsUp => "hook/rootfs-up",
            HookPoint::MountError => "hook/mount-error",
            HookPoint::MountPost => "hook/mount-post",
            HookPoint::BasefsUp => "hook/basefs-up",
            HookPoint::NetworkUp => "hook/net-up",
            HookPoint::SvcUp => "hook/svc-up",
            HookPoint::SystemUp => "hook/system-up",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.condition().trim_start_matches("hook/"))
    }
}

/// External collaborator invoked at hook points.
pub trait Plugin {
    fn on_hook(&mut self, point: HookPoint);
}
