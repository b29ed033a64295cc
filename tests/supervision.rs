//! Fork-level tests for the supervisor loop: an empty slot actually
//! spawns, and a dead service is reaped and replaced with a fresh pid.

use nix::sys::signal::{kill, Signal};
use nix::sys::wait::waitpid;
use sanity::{InitConfig, Supervisor};
use std::path::PathBuf;
use std::time::Duration;
use tempdir::TempDir;

fn test_config(dir: &TempDir) -> InitConfig {
    InitConfig {
        fifo_path: dir.path().join("sanity.fifo"),
        hostname_file: dir.path().join("hostname"),
        network_script: dir.path().join("network"),
        director_program: dir.path().join("director"),
        udevd_program: dir.path().join("udevd"),
        udevadm_program: dir.path().join("udevadm"),
        // A long-lived stand-in for the login program.
        getty_program: PathBuf::from("/bin/sleep"),
        getty_args: vec!["60".to_string()],
        tty_device: PathBuf::from("/dev/null"),
        mount_filesystems: false,
        require_pid1: false,
        ..InitConfig::default()
    }
}

#[test]
fn empty_slot_spawns_and_respawns_with_a_new_pid() {
    let dir = TempDir::new("sanity-supervision").unwrap();
    let mut supervisor = Supervisor::new(test_config(&dir)).unwrap();
    assert!(supervisor.service().is_none());

    // The very first iteration fills the empty slot.
    supervisor.tick();
    let first = supervisor.service().expect("empty slot should spawn");

    // Kill the service; within a bounded number of iterations the exit is
    // reaped, the slot clears, and a replacement with a fresh pid is up.
    kill(first, Signal::SIGKILL).unwrap();
    let mut replacement = None;
    for _ in 0..50 {
        std::thread::sleep(Duration::from_millis(10));
        supervisor.tick();
        if let Some(pid) = supervisor.service() {
            if pid != first {
                replacement = Some(pid);
                break;
            }
        }
    }
    let second = replacement.expect("service should respawn after exit");
    assert_ne!(second, first);

    kill(second, Signal::SIGKILL).unwrap();
    let _ = waitpid(second, None);
}
