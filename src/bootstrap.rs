//! Identity and hardware bootstrap.
//!
//! Runs once after the virtual filesystems are up: remount root
//! read-write, apply the hostname, get device nodes populated, bring the
//! network up. Every step is best-effort; a missing file or binary is a
//! skipped step, never a failed boot.

use crate::config::InitConfig;
use crate::process::{run_blocking, spawn_daemon};
use nix::mount::{mount, MsFlags};
use nix::unistd::sethostname;
use std::path::Path;
use tracing::{debug, info, warn};

/// Run the bootstrap steps in order.
pub fn run(config: &InitConfig) {
    remount_root_rw();
    apply_hostname(&config.hostname_file);
    start_device_manager(config);
    bring_up_network(config);
}

/// The kernel may have mounted root read-only; flip it read-write so the
/// rest of boot can write state.
fn remount_root_rw() {
    match mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REMOUNT,
        None::<&str>,
    ) {
        Ok(()) => info!("Remounted root read-write"),
        Err(e) => warn!(error = %e, "Failed to remount root read-write"),
    }
}

/// Read the first line of a hostname file, if present and non-empty.
pub(crate) fn read_hostname(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let line = content.lines().next()?.trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

fn apply_hostname(path: &Path) {
    match read_hostname(path) {
        Some(name) => match sethostname(&name) {
            Ok(()) => info!(hostname = %name, "Hostname set"),
            Err(e) => warn!(hostname = %name, error = %e, "Failed to set hostname"),
        },
        None => debug!(path = %path.display(), "No hostname file, keeping kernel default"),
    }
}

/// Start the device manager daemon and settle a device scan.
///
/// The fixed delay after spawning the daemon is an accepted race: udevd has
/// no readiness signal worth waiting on at this stage of boot.
fn start_device_manager(config: &InitConfig) {
    match spawn_daemon(&config.udevd_program, &[]) {
        Ok(Some(pid)) => {
            info!(pid = pid.as_raw(), "Device manager started");
            std::thread::sleep(config.settle_delay);
            if let Err(e) = run_blocking(&config.udevadm_program, &["trigger", "--action=add"]) {
                warn!(error = %e, "Device trigger failed");
            }
            if let Err(e) = run_blocking(&config.udevadm_program, &["settle"]) {
                warn!(error = %e, "Device settle failed");
            }
        }
        Ok(None) => debug!("No device manager present"),
        Err(e) => warn!(error = %e, "Failed to start device manager"),
    }
}

fn bring_up_network(config: &InitConfig) {
    match run_blocking(&config.network_script, &["start"]) {
        Ok(Some(_)) => info!("Network bring-up script finished"),
        Ok(None) => debug!("No network script present"),
        Err(e) => warn!(error = %e, "Network bring-up failed"),
    }
}
