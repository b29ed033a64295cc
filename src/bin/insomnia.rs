//! Insomnia - send a lifecycle command to a running sanity init.
//!
//! One-shot client for the command channel: opens the FIFO, writes the
//! command bytes, exits. Holds no state of its own and gets no reply; the
//! channel is fire-and-forget.

use anyhow::Context;
use clap::Parser;
use sanity::DEFAULT_FIFO_PATH;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "insomnia",
    about = "Send a lifecycle command to a running sanity init",
    version
)]
struct Cli {
    /// Command to send: reboot, off, die, or any raw command text
    command: String,

    /// Command channel FIFO path
    #[arg(long, default_value = DEFAULT_FIFO_PATH)]
    fifo: PathBuf,
}

/// `kill` and `die` both mean the literal `die`; everything else is
/// forwarded verbatim.
fn payload(command: &str) -> &str {
    match command {
        "kill" | "die" => "die",
        other => other,
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let payload = payload(&cli.command);

    let mut fifo = std::fs::OpenOptions::new()
        .write(true)
        .open(&cli.fifo)
        .with_context(|| {
            format!(
                "Cannot reach sanity (is {} there?)",
                cli.fifo.display()
            )
        })?;

    fifo.write_all(payload.as_bytes())
        .context("Failed to write command")?;

    if payload == "die" {
        println!("Insomnia: sent termination request to PID 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_is_normalized_to_die() {
        assert_eq!(payload("kill"), "die");
        assert_eq!(payload("die"), "die");
    }

    #[test]
    fn other_commands_are_forwarded_verbatim() {
        assert_eq!(payload("reboot"), "reboot");
        assert_eq!(payload("off"), "off");
        assert_eq!(payload("xyz"), "xyz");
    }
}
