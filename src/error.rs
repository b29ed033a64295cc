//! Error types for the sanity init system.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for init system operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the init system.
#[derive(Error, Debug)]
pub enum Error {
    /// Not running as PID 1
    #[error("Not running as PID 1 (current PID: {0})")]
    NotPid1(u32),

    /// Process spawn error
    #[error("Failed to spawn process: {0}")]
    SpawnFailed(String),

    /// Command channel error
    #[error("Command channel error: {path}: {reason}")]
    ChannelError { path: PathBuf, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Nix error
    #[error("System error: {0}")]
    Nix(#[from] nix::Error),
}
