//! Shutdown sequencer.
//!
//! Every shutdown, restart, power-off and panic request in the system,
//! whatever its origin, funnels through [`execute`]. The sequence is fixed:
//! announce, graceful broadcast, grace period, forceful broadcast, flush,
//! kernel transition. Once entered it runs to a terminal branch and never
//! returns; a shutdown in progress cannot be aborted.

use nix::mount::{mount, MsFlags};
use nix::sys::reboot::{reboot, RebootMode};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::time::Duration;
use tracing::{info, warn};

/// Exit status used by the panic branch. PID 1 exiting is itself the
/// mechanism: the kernel treats it as a fatal condition and panics.
const PANIC_EXIT_CODE: i32 = 101;

/// Grace window between SIGTERM and SIGKILL broadcasts.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// What kind of shutdown to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Intent {
    /// Restart the machine
    Restart,
    /// Power the machine off
    PowerOff,
    /// Stop everything but leave the machine powered, awaiting manual
    /// power removal
    Halt,
    /// Terminate PID 1 so the kernel panics immediately
    Panic,
}

/// Run the shutdown sequence to its terminal branch.
///
/// `kernel_transition` is false only when running outside PID 1 (testing
/// and development); in that mode the process-wide broadcasts and the
/// reboot syscall are skipped and the process simply exits.
pub fn execute(intent: Intent, kernel_transition: bool) -> ! {
    info!(intent = ?intent, "Initiating system shutdown");

    if !kernel_transition {
        info!("Not PID 1, exiting instead of touching the kernel");
        std::process::exit(0);
    }

    // pid -1: every process except us. Failures here mean there is nobody
    // left to signal, which is fine.
    let _ = kill(Pid::from_raw(-1), Signal::SIGTERM);
    std::thread::sleep(GRACE_PERIOD);
    let _ = kill(Pid::from_raw(-1), Signal::SIGKILL);

    unsafe { libc::sync() };
    if let Err(e) = mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REMOUNT | MsFlags::MS_RDONLY,
        None::<&str>,
    ) {
        warn!(error = %e, "Failed to remount root read-only");
    }

    match intent {
        Intent::Restart => {
            let _ = reboot(RebootMode::RB_AUTOBOOT);
        }
        Intent::PowerOff => {
            let _ = reboot(RebootMode::RB_POWER_OFF);
        }
        Intent::Halt => {
            info!("System halted, awaiting power removal");
            loop {
                unsafe { libc::pause() };
            }
        }
        Intent::Panic => {
            info!("Terminating PID 1 on request, kernel will panic");
            std::process::exit(PANIC_EXIT_CODE);
        }
    }

    // reboot(2) only returns on error. There is nothing sane left to do.
    warn!("Kernel reboot call returned, exiting");
    std::process::exit(PANIC_EXIT_CODE);
}
