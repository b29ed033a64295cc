//! Command channel for communicating with the running init process.
//!
//! This is a named pipe, not a socket: external writers (the `insomnia`
//! tool) open it, write a short command word, and go away. The channel is
//! fire-and-forget and one-directional; no acknowledgement is ever written
//! back, and kernel pipe buffering is the only queuing that exists.

use crate::error::{Error, Result};
use crate::shutdown::Intent;
use nix::errno::Errno;
use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, mkfifo, read};
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default path for the command channel FIFO
pub const DEFAULT_FIFO_PATH: &str = "/run/sanity.fifo";

/// Commands are at most 63 bytes; a single read never consumes more.
const COMMAND_BUF_LEN: usize = 64;

/// A recognized lifecycle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Command {
    /// Restart the machine (`reboot`)
    Reboot,
    /// Power the machine off (`halt` or `off`)
    PowerOff,
    /// Terminate PID 1, panicking the kernel (`die` or `panic`)
    Panic,
}

impl Command {
    /// Match raw channel bytes against the fixed vocabulary.
    ///
    /// Matching is by prefix, case-sensitive. Anything unrecognized is
    /// silently ignored by returning `None`.
    pub fn parse(raw: &[u8]) -> Option<Command> {
        if raw.starts_with(b"reboot") {
            Some(Command::Reboot)
        } else if raw.starts_with(b"halt") || raw.starts_with(b"off") {
            Some(Command::PowerOff)
        } else if raw.starts_with(b"die") || raw.starts_with(b"panic") {
            Some(Command::Panic)
        } else {
            None
        }
    }

    /// The shutdown intent this command maps to.
    pub fn intent(self) -> Intent {
        match self {
            Command::Reboot => Intent::Restart,
            Command::PowerOff => Intent::PowerOff,
            Command::Panic => Intent::Panic,
        }
    }
}

/// The init-side reader of the command channel.
///
/// There is exactly one reader per boot; the owned descriptor is opened
/// non-blocking so the supervisor loop never stalls on it.
pub struct CommandChannel {
    path: PathBuf,
    fd: RawFd,
}

impl CommandChannel {
    /// Create the FIFO (removing any stale instance first) and open it for
    /// non-blocking reads.
    pub fn open(path: &Path) -> Result<Self> {
        // A stale FIFO from a previous boot may linger on a persistent /run.
        let _ = std::fs::remove_file(path);

        mkfifo(path, Mode::S_IRUSR | Mode::S_IWUSR).map_err(|e| Error::ChannelError {
            path: path.to_path_buf(),
            reason: format!("mkfifo: {e}"),
        })?;

        let fd = open(path, OFlag::O_RDONLY | OFlag::O_NONBLOCK, Mode::empty()).map_err(|e| {
            Error::ChannelError {
                path: path.to_path_buf(),
                reason: format!("open: {e}"),
            }
        })?;

        info!(path = %path.display(), "Command channel listening");
        Ok(Self {
            path: path.to_path_buf(),
            fd,
        })
    }

    /// One non-blocking read attempt against the channel.
    ///
    /// Returns immediately with `None` when no writer is sending or the
    /// bytes do not match the command vocabulary.
    pub fn poll(&mut self) -> Option<Command> {
        let mut buf = [0u8; COMMAND_BUF_LEN];
        match read(self.fd, &mut buf[..COMMAND_BUF_LEN - 1]) {
            Ok(0) => None,
            Ok(n) => {
                let raw = &buf[..n];
                let command = Command::parse(raw);
                if command.is_none() {
                    debug!(
                        raw = %String::from_utf8_lossy(raw).trim(),
                        "Ignoring unrecognized command"
                    );
                }
                command
            }
            Err(Errno::EAGAIN) => None,
            Err(e) => {
                warn!(error = %e, "Command channel read failed");
                None
            }
        }
    }

    /// Path this channel was created at.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for CommandChannel {
    fn drop(&mut self) {
        let _ = close(self.fd);
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_maps_to_commands() {
        assert_eq!(Command::parse(b"reboot"), Some(Command::Reboot));
        assert_eq!(Command::parse(b"halt"), Some(Command::PowerOff));
        assert_eq!(Command::parse(b"off"), Some(Command::PowerOff));
        assert_eq!(Command::parse(b"die"), Some(Command::Panic));
        assert_eq!(Command::parse(b"panic"), Some(Command::Panic));
    }

    #[test]
    fn matching_is_by_prefix() {
        // Writers need not send a terminator; trailing bytes are tolerated.
        assert_eq!(Command::parse(b"reboot\n"), Some(Command::Reboot));
        assert_eq!(Command::parse(b"halt now"), Some(Command::PowerOff));
    }

    #[test]
    fn unrecognized_input_is_ignored() {
        assert_eq!(Command::parse(b""), None);
        assert_eq!(Command::parse(b"xyz"), None);
        assert_eq!(Command::parse(b"REBOOT"), None);
        assert_eq!(Command::parse(b"shutdown"), None);
    }

    #[test]
    fn commands_map_to_intents() {
        assert_eq!(Command::Reboot.intent(), Intent::Restart);
        assert_eq!(Command::PowerOff.intent(), Intent::PowerOff);
        assert_eq!(Command::Panic.intent(), Intent::Panic);
    }
}
