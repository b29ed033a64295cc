//! Reap completeness: every child handed to the process is collected
//! within a bounded number of non-blocking reap passes.
//!
//! Kept in its own test binary so no other test's reaping can race this
//! one for the children spawned here.

use nix::unistd::Pid;
use sanity::process::{reap_exited, spawn_daemon};
use std::path::Path;
use std::time::Duration;

#[test]
fn exited_children_are_collected_within_bounded_polls() {
    let mut pending: Vec<Pid> = (0..3)
        .map(|_| {
            spawn_daemon(Path::new("/bin/true"), &[])
                .expect("spawn should succeed")
                .expect("/bin/true should be executable")
        })
        .collect();

    for _ in 0..50 {
        for reaped in reap_exited() {
            if let Some(i) = pending.iter().position(|p| *p == reaped.pid) {
                assert_eq!(reaped.code, Some(0));
                assert_eq!(reaped.signal, None);
                pending.swap_remove(i);
            }
        }
        if pending.is_empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(pending.is_empty(), "unreaped children: {pending:?}");
}
