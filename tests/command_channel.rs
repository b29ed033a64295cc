//! Integration tests for the command channel against a real FIFO.

use sanity::{Command, CommandChannel};
use std::io::Write;
use std::path::PathBuf;
use tempdir::TempDir;

fn open_channel(dir: &TempDir) -> (CommandChannel, PathBuf) {
    let path = dir.path().join("sanity.fifo");
    let channel = CommandChannel::open(&path).expect("channel should open");
    (channel, path)
}

fn send(path: &PathBuf, bytes: &[u8]) {
    // Writer side works because the channel holds the read side open.
    let mut fifo = std::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .expect("fifo should accept a writer");
    fifo.write_all(bytes).expect("write should succeed");
}

#[test]
fn poll_is_empty_without_a_writer() {
    let dir = TempDir::new("sanity-channel").unwrap();
    let (mut channel, _path) = open_channel(&dir);

    assert_eq!(channel.poll(), None);
    assert_eq!(channel.poll(), None);
}

#[test]
fn recognized_commands_arrive() {
    let dir = TempDir::new("sanity-channel").unwrap();
    let (mut channel, path) = open_channel(&dir);

    send(&path, b"reboot");
    assert_eq!(channel.poll(), Some(Command::Reboot));

    send(&path, b"off");
    assert_eq!(channel.poll(), Some(Command::PowerOff));

    send(&path, b"die");
    assert_eq!(channel.poll(), Some(Command::Panic));

    // Channel drains back to empty between writers.
    assert_eq!(channel.poll(), None);
}

#[test]
fn unrecognized_input_is_silently_ignored() {
    let dir = TempDir::new("sanity-channel").unwrap();
    let (mut channel, path) = open_channel(&dir);

    send(&path, b"xyz");
    assert_eq!(channel.poll(), None);

    // The channel keeps working after junk.
    send(&path, b"reboot");
    assert_eq!(channel.poll(), Some(Command::Reboot));
}

#[test]
fn a_single_poll_consumes_at_most_63_bytes() {
    let dir = TempDir::new("sanity-channel").unwrap();
    let (mut channel, path) = open_channel(&dir);

    // 63 junk bytes followed by a command, in one atomic pipe write. The
    // first poll must stop at the 63-byte bound, leaving the command
    // intact for the next poll; a wider read would split it.
    let mut message = vec![b'x'; 63];
    message.extend_from_slice(b"reboot");
    send(&path, &message);

    assert_eq!(channel.poll(), None);
    assert_eq!(channel.poll(), Some(Command::Reboot));
}

#[test]
fn stale_fifo_is_replaced_on_open() {
    let dir = TempDir::new("sanity-channel").unwrap();
    let path = dir.path().join("sanity.fifo");
    std::fs::write(&path, b"stale regular file").unwrap();

    let mut channel = CommandChannel::open(&path).expect("stale file should be replaced");
    assert_eq!(channel.poll(), None);

    send(&path, b"halt");
    assert_eq!(channel.poll(), Some(Command::PowerOff));
}
