//! The supervisor: PID 1 steady state.
//!
//! Owns the command channel, the single supervised service slot and the
//! lifecycle phase, and runs the polling loop from the end of bootstrap
//! until a shutdown request arrives. There is exactly one thread of
//! control here; command polling and reaping are non-blocking and the only
//! wait per iteration is a fixed short sleep.

use crate::command::{Command, CommandChannel};
use crate::config::InitConfig;
use crate::error::{Error, Result};
use crate::process::{self, run_blocking, Reaped};
use crate::shutdown::{self, Intent};
use crate::{bootstrap, mounts, signals};
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{dup2, execv, fork, setsid, ForkResult, Pid};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use tracing::{debug, info, warn};

/// Lifecycle phase of the init process.
///
/// The transition into `ShuttingDown` is one-way; the terminal phases
/// exist for reporting fidelity but are never observed in-process because
/// the shutdown sequencer diverges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Bootstrapping,
    Running,
    ShuttingDown,
    Halted,
    Rebooting,
    PoweredOff,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Bootstrapping => write!(f, "bootstrapping"),
            Phase::Running => write!(f, "running"),
            Phase::ShuttingDown => write!(f, "shutting-down"),
            Phase::Halted => write!(f, "halted"),
            Phase::Rebooting => write!(f, "rebooting"),
            Phase::PoweredOff => write!(f, "powered-off"),
        }
    }
}

/// The init process context: one instance per boot, single writer of all
/// of its own state.
pub struct Supervisor {
    config: InitConfig,
    channel: Option<CommandChannel>,
    /// The supervised service slot: at most one live getty at a time.
    service: Option<Pid>,
    phase: Phase,
}

impl Supervisor {
    /// Create the supervisor context.
    ///
    /// The PID 1 gate runs here, before any side effect: refusing to
    /// supervise a machine we do not own is the only startup-fatal error.
    pub fn new(config: InitConfig) -> Result<Self> {
        let pid = std::process::id();
        if config.require_pid1 && pid != 1 {
            return Err(Error::NotPid1(pid));
        }

        Ok(Self {
            config,
            channel: None,
            service: None,
            phase: Phase::Bootstrapping,
        })
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Pid currently occupying the supervised service slot, if any.
    pub fn service(&self) -> Option<Pid> {
        self.service
    }

    /// Bring the machine up and run the supervisor loop forever.
    pub fn run(mut self) -> ! {
        info!("Sanity init starting");

        if self.config.mount_filesystems {
            mounts::apply(&mounts::mount_table());
        }
        bootstrap::run(&self.config);
        signals::install();
        self.open_channel();
        self.run_director();

        self.phase = Phase::Running;
        info!(phase = %self.phase, "Entering supervisor loop");

        loop {
            self.tick();
            std::thread::sleep(self.config.loop_interval);
        }
    }

    /// Open the command channel. Best-effort: an unusable channel leaves
    /// the machine supervisable by signals alone.
    fn open_channel(&mut self) {
        match CommandChannel::open(&self.config.fifo_path) {
            Ok(channel) => self.channel = Some(channel),
            Err(e) => warn!(error = %e, "Command channel unavailable"),
        }
    }

    /// Run the optional director program once before the steady state.
    /// Without it the machine degrades to the console login the loop
    /// provides anyway.
    fn run_director(&self) {
        match run_blocking(&self.config.director_program, &[]) {
            Ok(Some(_)) => info!("Director finished"),
            Ok(None) => debug!("No director present, console login only"),
            Err(e) => warn!(error = %e, "Director failed"),
        }
    }

    /// One supervisor loop iteration: consume a pending signal request,
    /// poll the command channel, refill an empty service slot, drain
    /// orphans. [`run`](Self::run) calls this forever; it is public so a
    /// single iteration can be driven in isolation.
    pub fn tick(&mut self) {
        if let Some(intent) = signals::take_request() {
            self.shutdown(intent);
        }

        if let Some(command) = self.poll_command() {
            info!(command = ?command, "Lifecycle command received");
            self.shutdown(command.intent());
        }

        if self.service.is_none() {
            match self.spawn_getty() {
                Ok(pid) => {
                    info!(pid = pid.as_raw(), "Supervised login service started");
                    self.service = Some(pid);
                }
                // Leave the slot empty; the next iteration retries.
                Err(e) => warn!(error = %e, "Failed to spawn login service"),
            }
        }

        for reaped in process::reap_exited() {
            self.note_exit(&reaped);
        }
    }

    fn poll_command(&mut self) -> Option<Command> {
        self.channel.as_mut().and_then(|c| c.poll())
    }

    /// Funnel into the shutdown sequencer. The phase flip is one-way and
    /// happens before the sequencer so no further loop work can observe
    /// `Running`.
    fn shutdown(&mut self, intent: Intent) -> ! {
        self.phase = Phase::ShuttingDown;
        shutdown::execute(intent, self.config.require_pid1)
    }

    /// Record a reaped child. Only an exit of the supervised service clears
    /// the slot; any other pid was an orphan we absorbed.
    fn note_exit(&mut self, reaped: &Reaped) {
        if self.service == Some(reaped.pid) {
            info!(
                pid = reaped.pid.as_raw(),
                code = ?reaped.code,
                signal = ?reaped.signal,
                "Supervised login service exited"
            );
            self.service = None;
        } else {
            debug!(pid = reaped.pid.as_raw(), "Reaped orphan");
        }
    }

    /// Spawn the foreground login service on the console.
    ///
    /// The child gets its own session with the console as controlling
    /// terminal and stdio pointed at it before exec. Everything the child
    /// needs is allocated before the fork.
    fn spawn_getty(&self) -> Result<Pid> {
        let prog = cstring(self.config.getty_program.as_os_str().as_bytes())?;
        let tty = cstring(self.config.tty_device.as_os_str().as_bytes())?;

        let argv0 = self
            .config
            .getty_program
            .file_name()
            .unwrap_or(self.config.getty_program.as_os_str());
        let mut argv = vec![cstring(argv0.as_bytes())?];
        for arg in &self.config.getty_args {
            argv.push(cstring(arg.as_bytes())?);
        }

        match unsafe { fork() }? {
            ForkResult::Child => {
                let _ = setsid();
                if let Ok(fd) = open(tty.as_c_str(), OFlag::O_RDWR, Mode::empty()) {
                    unsafe { libc::ioctl(fd, libc::TIOCSCTTY, 1) };
                    let _ = dup2(fd, 0);
                    let _ = dup2(fd, 1);
                    let _ = dup2(fd, 2);
                }
                let _ = execv(&prog, &argv);
                unsafe { libc::_exit(1) }
            }
            ForkResult::Parent { child } => Ok(child),
        }
    }
}

fn cstring(bytes: &[u8]) -> Result<CString> {
    CString::new(bytes).map_err(|_| Error::SpawnFailed("embedded NUL in argument".to_string()))
}
