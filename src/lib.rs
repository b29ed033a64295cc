//! Sanity - a minimal PID 1 init and supervisor for Linux.
//!
//! Sanity brings a machine from kernel handoff to a usable console and
//! keeps it there: it mounts the virtual filesystems, sets the hostname,
//! brings devices and networking up, then supervises a single console
//! login process for the lifetime of the machine while reaping every
//! orphan the kernel hands it.
//!
//! # Architecture
//!
//! - **mounts**: declarative, best-effort virtual filesystem table
//! - **bootstrap**: root remount, hostname, devices, network
//! - **command**: named-pipe command channel (`/run/sanity.fifo`)
//! - **signals**: operator signals latched into an atomic request flag
//! - **shutdown**: the single sequencer every shutdown path funnels into
//! - **supervisor**: the polling loop that owns the service slot and phase
//!
//! # Example
//!
//! ```no_run
//! use sanity::{InitConfig, Supervisor};
//!
//! fn main() -> anyhow::Result<()> {
//!     let supervisor = Supervisor::new(InitConfig::default())?;
//!     supervisor.run()
//! }
//! ```

pub mod bootstrap;
pub mod command;
pub mod config;
pub mod error;
pub mod mounts;
pub mod process;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

// Re-export main types
pub use command::{Command, CommandChannel, DEFAULT_FIFO_PATH};
pub use config::InitConfig;
pub use error::{Error, Result};
pub use shutdown::Intent;
pub use supervisor::{Phase, Supervisor};
