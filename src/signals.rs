//! Signal controller.
//!
//! SIGUSR1 requests power-off, SIGINT requests restart. The kernel delivers
//! SIGINT to PID 1 for Ctrl-Alt-Del once its own handling of the key
//! combination is disabled, which [`install`] does.
//!
//! Handlers only store into an atomic; the supervisor loop picks the
//! request up via [`take_request`] and runs the shutdown sequencer outside
//! signal context. This keeps the handlers async-signal-safe: no
//! allocation, a single atomic store, nothing else.

use crate::shutdown::Intent;
use nix::sys::reboot::set_cad_enabled;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::warn;

static SHUTDOWN_REQUEST: AtomicU8 = AtomicU8::new(REQ_NONE);

const REQ_NONE: u8 = 0;
const REQ_POWER_OFF: u8 = 1;
const REQ_RESTART: u8 = 2;

extern "C" fn handle_signal(sig: libc::c_int) {
    let request = match sig {
        libc::SIGUSR1 => REQ_POWER_OFF,
        libc::SIGINT => REQ_RESTART,
        _ => return,
    };
    SHUTDOWN_REQUEST.store(request, Ordering::SeqCst);
}

/// Install the operator signal handlers and take over Ctrl-Alt-Del from
/// the kernel. Best-effort; failures are logged and boot continues.
pub fn install() {
    let action = SigAction::new(
        SigHandler::Handler(handle_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    for sig in [Signal::SIGUSR1, Signal::SIGINT] {
        if let Err(e) = unsafe { sigaction(sig, &action) } {
            warn!(signal = ?sig, error = %e, "Failed to install signal handler");
        }
    }

    // With CAD disabled the kernel sends SIGINT to PID 1 instead of
    // rebooting on its own.
    if let Err(e) = set_cad_enabled(false) {
        warn!(error = %e, "Failed to take over ctrl-alt-del handling");
    }
}

/// Consume a pending shutdown request, if any.
///
/// Requests do not queue; if two signals land between polls the later one
/// wins, which is equivalent either way since both funnel into the same
/// sequencer.
pub fn take_request() -> Option<Intent> {
    match SHUTDOWN_REQUEST.swap(REQ_NONE, Ordering::SeqCst) {
        REQ_POWER_OFF => Some(Intent::PowerOff),
        REQ_RESTART => Some(Intent::Restart),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so concurrent test threads never race on the static.
    #[test]
    fn requests_are_latched_and_consumed_once() {
        assert_eq!(take_request(), None);

        handle_signal(libc::SIGUSR1);
        assert_eq!(take_request(), Some(Intent::PowerOff));
        assert_eq!(take_request(), None);

        handle_signal(libc::SIGINT);
        assert_eq!(take_request(), Some(Intent::Restart));
        assert_eq!(take_request(), None);

        // Latest request wins when two arrive between polls.
        handle_signal(libc::SIGUSR1);
        handle_signal(libc::SIGINT);
        assert_eq!(take_request(), Some(Intent::Restart));

        // Unmapped signals leave the latch alone.
        handle_signal(libc::SIGHUP);
        assert_eq!(take_request(), None);
    }
}
