//! Sanity init binary.
//!
//! Runs as PID 1. The PID gate comes before everything, including logging:
//! a stray invocation on a live system must exit without side effects.

use clap::Parser;
use sanity::{InitConfig, Supervisor};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sanity", about = "A sane init - minimal PID 1 supervisor", version)]
struct Cli {
    /// Don't require running as PID 1 (development only)
    #[arg(long)]
    no_pid1: bool,

    /// Don't mount virtual filesystems
    #[arg(long)]
    no_mount: bool,

    /// Command channel FIFO path
    #[arg(long)]
    fifo: Option<PathBuf>,

    /// Console device for the login service
    #[arg(long)]
    tty: Option<PathBuf>,

    /// Login program to supervise
    #[arg(long)]
    getty: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !cli.no_pid1 && std::process::id() != 1 {
        std::process::exit(1);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = InitConfig {
        require_pid1: !cli.no_pid1,
        mount_filesystems: !cli.no_mount,
        ..InitConfig::default()
    };
    if let Some(fifo) = cli.fifo {
        config.fifo_path = fifo;
    }
    if let Some(tty) = cli.tty {
        config.tty_device = tty;
    }
    if let Some(getty) = cli.getty {
        config.getty_program = getty;
    }

    let supervisor = Supervisor::new(config)?;
    supervisor.run()
}
