// SPDX-License-Identifier: MIT
// Copyright (c) 2026 The ignite Authors

//! Filesystem bring-up (C7).
//!
//! Fixed sequence: early mounts, fstab discovery, ordered fsck passes,
//! root remount, mount-all, swap, tmpfs finalize. fsck exit codes above 1
//! are fatal and drop to sulogin with reboot-on-exit; any other failure
//! logs and lets the boot continue degraded.

use crate::engine::Engine;
use crate::fstab::{self, FstabEntry};
use crate::hooks::HookPoint;
use crate::spawn::Spawner;
use ignite_core::{Clock, ShutdownKind};
use nix::errno::Errno;
use nix::mount::{mount, MsFlags};
use nix::sys::stat::{major, minor, stat, umask, Mode};
use nix::unistd::Group;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info, warn};

/// Fallback fstab consulted when the configured one is missing.
const FALLBACK_FSTAB: &str = "/usr/share/ignite/fstab";

/// Verdict of the ordered fsck sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FsckOutcome {
    /// Every checked device came back clean.
    Clean,
    /// Errors were corrected (rc 1); later passes were skipped and the
    /// root stays read-only.
    Dirty,
    /// Unrecoverable (rc > 1); sulogin territory.
    Fatal,
}

/// Early bring-up: umask, pseudo filesystems, fstab, fsck, root remount.
///
/// Returns false when the boot is unrecoverable and sulogin has already
/// run.
pub fn init<S, C>(engine: &mut Engine<S, C>) -> bool
where
    S: Spawner,
    C: Clock,
{
    umask(Mode::from_bits_truncate(0o022));
    early_mounts();

    let fstab_path = match find_fstab(&engine.state.fstab) {
        Some(path) => path,
        None => {
            sulogin_reboot(engine, "no usable fstab");
            return false;
        }
    };
    engine.state.fstab = fstab_path.clone();
    std::env::set_var("FSTAB_FILE", &fstab_path);

    let entries = match fstab::parse_file(&fstab_path) {
        Ok(entries) => entries,
        Err(e) => {
            sulogin_reboot(engine, &format!("cannot read {}: {e}", fstab_path.display()));
            return false;
        }
    };

    let outcome = fsck_sweep(&entries, |entry| {
        let device = resolve_device(&entry.device)?;
        if mounted_rw(&device) {
            debug!(device = %device.display(), "already mounted rw, skipping fsck");
            return None;
        }
        match run_fsck(&device.display().to_string()) {
            Ok(rc) => Some(rc),
            Err(e) => {
                warn!(device = %device.display(), "fsck did not run: {e}");
                None
            }
        }
    });

    match outcome {
        FsckOutcome::Fatal => {
            sulogin_reboot(engine, "filesystem check failed beyond repair");
            return false;
        }
        FsckOutcome::Dirty => {
            warn!("filesystem errors corrected, leaving root read-only");
        }
        FsckOutcome::Clean => remount_root_rw(&entries),
    }

    engine.run_hook(HookPoint::RootfsUp);
    true
}

/// Later bring-up: mount everything, swap on, tmpfs finalize.
pub fn mount_all<S, C>(engine: &mut Engine<S, C>)
where
    S: Spawner,
    C: Clock,
{
    engine.progress.step("mounting filesystems");
    let status = Command::new("mount")
        .arg("-na")
        .arg("-T")
        .arg(&engine.state.fstab)
        .status();
    match status {
        Ok(status) if status.success() => {}
        Ok(status) => {
            warn!("mount -a exited with {status}");
            engine.run_hook(HookPoint::MountError);
        }
        Err(e) => {
            warn!("mount -a failed to run: {e}");
            engine.run_hook(HookPoint::MountError);
        }
    }
    engine.run_hook(HookPoint::MountPost);

    if let Ok(entries) = fstab::parse_file(&engine.state.fstab) {
        for entry in entries.iter().filter(|e| e.is_swap()) {
            swap_on(entry);
        }
    }

    finalize_tmpfs();
}

/// Sweep fsck passes 1..9 in order. `check` returns the fsck exit code
/// for an entry, or None when the entry was skipped. A pass with a
/// non-zero code stops later passes.
pub(crate) fn fsck_sweep<F>(entries: &[FstabEntry], mut check: F) -> FsckOutcome
where
    F: FnMut(&FstabEntry) -> Option<i32>,
{
    for (pass, batch) in fstab::fsck_passes(entries) {
        let mut pass_rc = 0;
        for entry in batch {
            let Some(rc) = check(entry) else { continue };
            if rc > 1 {
                error!(device = %entry.device, pass, rc, "fsck unrecoverable");
                return FsckOutcome::Fatal;
            }
            pass_rc |= rc;
        }
        if pass_rc != 0 {
            warn!(pass, "fsck pass reported errors, stopping later passes");
            return FsckOutcome::Dirty;
        }
    }
    FsckOutcome::Clean
}

/// Run fsck on a device, preening. Returns the exit code.
pub fn run_fsck(device: &str) -> io::Result<i32> {
    info!(device, "checking filesystem");
    let status = Command::new("fsck").arg("-a").arg(device).status()?;
    Ok(status.code().unwrap_or(127))
}

/// Resolve an fstab device field to a device node path.
pub(crate) fn resolve_device(device: &str) -> Option<PathBuf> {
    if let Some(uuid) = device.strip_prefix("UUID=") {
        return Some(PathBuf::from("/dev/disk/by-uuid").join(uuid));
    }
    if let Some(label) = device.strip_prefix("LABEL=") {
        return Some(PathBuf::from("/dev/disk/by-label").join(label));
    }
    if let Some(partuuid) = device.strip_prefix("PARTUUID=") {
        return Some(PathBuf::from("/dev/disk/by-partuuid").join(partuuid));
    }
    if device == "/dev/root" {
        return resolve_dev_root();
    }
    if device.starts_with('/') {
        return Some(PathBuf::from(device));
    }
    // Pseudo devices (proc, tmpfs, none) have nothing to check.
    None
}

/// The kernel short form `/dev/root`: match the root device major:minor
/// against `/sys/block/*/dev` (and partitions one level down).
fn resolve_dev_root() -> Option<PathBuf> {
    let root = stat("/").ok()?;
    let want = format!("{}:{}", major(root.st_dev), minor(root.st_dev));

    let blocks = fs::read_dir("/sys/block").ok()?;
    for disk in blocks.filter_map(|e| e.ok()) {
        if let Some(name) = sysfs_dev_match(&disk.path(), &want) {
            return Some(name);
        }
        if let Ok(parts) = fs::read_dir(disk.path()) {
            for part in parts.filter_map(|e| e.ok()).filter(|e| e.path().is_dir()) {
                if let Some(name) = sysfs_dev_match(&part.path(), &want) {
                    return Some(name);
                }
            }
        }
    }
    None
}

fn sysfs_dev_match(sys_dir: &Path, want: &str) -> Option<PathBuf> {
    let dev = fs::read_to_string(sys_dir.join("dev")).ok()?;
    if dev.trim() == want {
        let name = sys_dir.file_name()?;
        Some(PathBuf::from("/dev").join(name))
    } else {
        None
    }
}

/// True when the device appears in /proc/mounts with the rw option.
fn mounted_rw(device: &Path) -> bool {
    let Ok(mounts) = fs::read_to_string("/proc/mounts") else {
        return false;
    };
    mounted_rw_in(&mounts, device)
}

pub(crate) fn mounted_rw_in(mounts: &str, device: &Path) -> bool {
    mounts.lines().any(|line| {
        let mut fields = line.split_whitespace();
        let (Some(dev), Some(_), Some(_), Some(opts)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return false;
        };
        Path::new(dev) == device && opts.split(',').any(|o| o == "rw")
    })
}

/// Remount `/` read-write iff fstab lists it without `ro`.
fn remount_root_rw(entries: &[FstabEntry]) {
    let Some(root) = entries.iter().find(|e| e.is_root()) else {
        return;
    };
    if root.has_option("ro") {
        info!("fstab keeps root read-only");
        return;
    }
    info!("remounting / read-write");
    do_mount(None, "/", None, MsFlags::MS_REMOUNT, None);
}

/// Ensure /proc, /dev and /sys are mounted. Already-mounted targets
/// surface EBUSY, which the wrapper swallows.
fn early_mounts() {
    let _ = fs::create_dir_all("/proc");
    let _ = fs::create_dir_all("/sys");
    let _ = fs::create_dir_all("/dev");
    do_mount(Some("proc"), "/proc", Some("proc"), MsFlags::empty(), None);
    do_mount(Some("sysfs"), "/sys", Some("sysfs"), MsFlags::empty(), None);
    do_mount(Some("devtmpfs"), "/dev", Some("devtmpfs"), MsFlags::empty(), Some("mode=0755"));
}

/// Late tmpfs mounts, each only if the target is not already a
/// mountpoint.
fn finalize_tmpfs() {
    let tty_gid = Group::from_name("tty")
        .ok()
        .flatten()
        .map(|g| g.gid.as_raw())
        .unwrap_or(5);
    let pts_data = format!("mode=0620,gid={tty_gid},ptmxmode=0666");

    mount_once("/dev/shm", "tmpfs", "tmpfs", "mode=0777");
    mount_once("/dev/pts", "devpts", "devpts", &pts_data);
    mount_once("/run", "tmpfs", "tmpfs", "size=10%");
    mount_once("/run/lock", "tmpfs", "tmpfs", "size=5242880");
    mount_once("/tmp", "tmpfs", "tmpfs", "mode=1777");
}

fn mount_once(target: &str, source: &str, fstype: &str, data: &str) {
    if is_mountpoint(target) {
        return;
    }
    let _ = fs::create_dir_all(target);
    do_mount(Some(source), target, Some(fstype), MsFlags::empty(), Some(data));
}

fn is_mountpoint(target: &str) -> bool {
    let Ok(mounts) = fs::read_to_string("/proc/mounts") else {
        return false;
    };
    mounts
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|mp| mp == target)
}

/// Thin mount wrapper: logs failures other than EBUSY.
fn do_mount(
    source: Option<&str>,
    target: &str,
    fstype: Option<&str>,
    flags: MsFlags,
    data: Option<&str>,
) {
    match mount(source, target, fstype, flags, data) {
        Ok(()) | Err(Errno::EBUSY) => {}
        Err(e) => warn!("mount {target} failed: {e}"),
    }
}

fn swap_on(entry: &FstabEntry) {
    let Some(device) = resolve_device(&entry.device) else {
        return;
    };
    info!(device = %device.display(), "enabling swap");
    match Command::new("swapon").arg(&device).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(device = %device.display(), "swapon exited with {status}"),
        Err(e) => warn!(device = %device.display(), "swapon failed to run: {e}"),
    }
}

fn find_fstab(configured: &Path) -> Option<PathBuf> {
    if configured.exists() {
        return Some(configured.to_path_buf());
    }
    let fallback = Path::new(FALLBACK_FSTAB);
    if fallback.exists() {
        info!("using fallback fstab at {FALLBACK_FSTAB}");
        return Some(fallback.to_path_buf());
    }
    None
}

/// Unrecoverable early-boot error: single-user shell, then reboot when
/// the operator logs out.
pub fn sulogin_reboot<S, C>(engine: &mut Engine<S, C>, reason: &str)
where
    S: Spawner,
    C: Clock,
{
    error!("{reason}; dropping to single-user shell");
    engine.progress.result(reason, false);
    match Command::new("/sbin/sulogin").status() {
        Ok(status) => info!("sulogin exited with {status}, rebooting"),
        Err(e) => error!("sulogin failed to run: {e}; rebooting"),
    }
    engine.request_shutdown(ShutdownKind::Reboot);
}

#[cfg(test)]
#[path = "fsinit_tests.rs"]
mod tests;
