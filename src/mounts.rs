//! Virtual filesystem bootstrap.
//!
//! The mounts applied here are the bare minimum the rest of boot depends on:
//! `/proc` and `/sys` for the kernel API, a tmpfs on `/run` for runtime state
//! (the command channel FIFO lives there), and `/dev/pts` for multi-user
//! terminals. The table is applied exactly once, in order, before anything
//! else starts.

use nix::mount::{mount, MsFlags};
use tracing::{info, warn};

/// What to do when a mount entry fails.
///
/// Every entry in the bootstrap table ignores failure: an already-mounted
/// target or missing kernel support must not abort the boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log and continue with the remaining entries.
    Ignore,
}

/// One entry of the bootstrap mount table.
#[derive(Debug, Clone)]
pub struct MountEntry {
    pub source: &'static str,
    pub target: &'static str,
    pub fstype: &'static str,
    pub flags: MsFlags,
    pub data: Option<&'static str>,
    pub policy: FailurePolicy,
}

/// The fixed, ordered bootstrap mount table.
pub fn mount_table() -> [MountEntry; 4] {
    [
        MountEntry {
            source: "proc",
            target: "/proc",
            fstype: "proc",
            flags: MsFlags::empty(),
            data: None,
            policy: FailurePolicy::Ignore,
        },
        MountEntry {
            source: "sysfs",
            target: "/sys",
            fstype: "sysfs",
            flags: MsFlags::empty(),
            data: None,
            policy: FailurePolicy::Ignore,
        },
        MountEntry {
            source: "tmpfs",
            target: "/run",
            fstype: "tmpfs",
            flags: MsFlags::MS_NOSUID | MsFlags::MS_NODEV | MsFlags::MS_NOEXEC,
            data: Some("mode=0755,size=32M"),
            policy: FailurePolicy::Ignore,
        },
        MountEntry {
            source: "devpts",
            target: "/dev/pts",
            fstype: "devpts",
            flags: MsFlags::empty(),
            data: None,
            policy: FailurePolicy::Ignore,
        },
    ]
}

/// Apply the mount table in order.
///
/// Each entry is independent; a failed entry is logged and skipped per its
/// failure policy. No retries, no rollback.
pub fn apply(entries: &[MountEntry]) {
    for entry in entries {
        // The target may not exist yet on a fresh root.
        if let Err(e) = std::fs::create_dir_all(entry.target) {
            warn!(target = entry.target, error = %e, "Failed to create mount target");
        }

        match mount(
            Some(entry.source),
            entry.target,
            Some(entry.fstype),
            entry.flags,
            entry.data,
        ) {
            Ok(()) => {
                info!(
                    source = entry.source,
                    target = entry.target,
                    fstype = entry.fstype,
                    "Mounted filesystem"
                );
            }
            Err(e) => match entry.policy {
                FailurePolicy::Ignore => {
                    warn!(target = entry.target, error = %e, "Failed to mount, continuing");
                }
            },
        }
    }
}
