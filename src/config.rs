//! Init system configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::command::DEFAULT_FIFO_PATH;

/// Init system configuration.
///
/// Every tunable path and interval lives here so that the supervisor can be
/// pointed at scratch paths when exercised outside a real boot.
#[derive(Debug, Clone)]
pub struct InitConfig {
    /// Path of the command channel FIFO
    pub fifo_path: PathBuf,
    /// Optional single-line hostname file
    pub hostname_file: PathBuf,
    /// Console device the supervised getty runs on
    pub tty_device: PathBuf,
    /// Login program to supervise
    pub getty_program: PathBuf,
    /// Arguments passed to the login program
    pub getty_args: Vec<String>,
    /// Optional network bring-up script, invoked with `start`
    pub network_script: PathBuf,
    /// Optional director program run once before the steady state
    pub director_program: PathBuf,
    /// Optional device manager daemon
    pub udevd_program: PathBuf,
    /// Device manager control tool, used to trigger and settle a scan
    pub udevadm_program: PathBuf,
    /// Fixed wait after starting the device manager
    pub settle_delay: Duration,
    /// Supervisor loop period
    pub loop_interval: Duration,
    /// Whether to mount virtual filesystems during bootstrap
    pub mount_filesystems: bool,
    /// Whether to enforce the PID 1 requirement
    pub require_pid1: bool,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from(DEFAULT_FIFO_PATH),
            hostname_file: PathBuf::from("/etc/hostname"),
            tty_device: PathBuf::from("/dev/tty1"),
            getty_program: PathBuf::from("/sbin/agetty"),
            getty_args: vec![
                "--noclear".to_string(),
                "tty1".to_string(),
                "115200".to_string(),
                "linux".to_string(),
            ],
            network_script: PathBuf::from("/etc/sanity.d/network"),
            director_program: PathBuf::from("/etc/sanity.d/director"),
            udevd_program: PathBuf::from("/sbin/udevd"),
            udevadm_program: PathBuf::from("/sbin/udevadm"),
            settle_delay: Duration::from_millis(500),
            loop_interval: Duration::from_millis(100),
            mount_filesystems: true,
            require_pid1: true,
        }
    }
}
