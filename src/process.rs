//! Process spawning and reaping.
//!
//! Two distinct spawn operations exist on purpose: [`spawn_daemon`] is
//! fire-and-forget and is what the supervisor loop builds on, while
//! [`run_blocking`] waits for the child and is used only for boot-time setup
//! steps that must complete before the next step is meaningful. Neither is
//! ever mixed with the other's use case.

use crate::error::{Error, Result};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{execv, fork, ForkResult, Pid};
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::{debug, warn};

/// A child collected by [`reap_exited`].
#[derive(Debug, Clone)]
pub struct Reaped {
    /// Process ID
    pub pid: Pid,
    /// Exit code (if exited normally)
    pub code: Option<i32>,
    /// Signal (if killed by signal)
    pub signal: Option<Signal>,
}

/// Check whether a path names an executable regular file.
pub fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Spawn an external program without waiting for it.
///
/// Returns `Ok(None)` without side effects when the path is not executable.
/// The child is left to be collected later by [`reap_exited`].
pub fn spawn_daemon(program: &Path, args: &[&str]) -> Result<Option<Pid>> {
    if !is_executable(program) {
        debug!(program = %program.display(), "Not executable, skipping");
        return Ok(None);
    }

    let (prog, argv) = build_argv(program, args)?;
    match unsafe { fork() }? {
        ForkResult::Child => {
            let _ = execv(&prog, &argv);
            unsafe { libc::_exit(127) }
        }
        ForkResult::Parent { child } => {
            debug!(program = %program.display(), pid = child.as_raw(), "Spawned daemon");
            Ok(Some(child))
        }
    }
}

/// Spawn an external program and block until that specific child exits.
///
/// The exit status is discarded. Returns `Ok(None)` without side effects
/// when the path is not executable. This is the only blocking wait in the
/// system and must never be called from the supervisor loop.
pub fn run_blocking(program: &Path, args: &[&str]) -> Result<Option<Pid>> {
    if !is_executable(program) {
        debug!(program = %program.display(), "Not executable, skipping");
        return Ok(None);
    }

    let (prog, argv) = build_argv(program, args)?;
    match unsafe { fork() }? {
        ForkResult::Child => {
            let _ = execv(&prog, &argv);
            unsafe { libc::_exit(127) }
        }
        ForkResult::Parent { child } => {
            loop {
                match waitpid(child, None) {
                    Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => break,
                    Ok(_) => continue,
                    Err(Errno::EINTR) => continue,
                    Err(e) => {
                        warn!(pid = child.as_raw(), error = %e, "Wait for child failed");
                        break;
                    }
                }
            }
            Ok(Some(child))
        }
    }
}

/// Reap any exited children without blocking.
///
/// As PID 1 this collects every process the kernel has re-parented to us,
/// not just children we spawned ourselves. Called once per supervisor loop
/// iteration; drains until no more zombies are ready.
pub fn reap_exited() -> Vec<Reaped> {
    let mut reaped = Vec::new();

    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => {
                debug!(pid = pid.as_raw(), code = code, "Reaped child");
                reaped.push(Reaped {
                    pid,
                    code: Some(code),
                    signal: None,
                });
            }
            Ok(WaitStatus::Signaled(pid, sig, _)) => {
                debug!(pid = pid.as_raw(), signal = ?sig, "Reaped signaled child");
                reaped.push(Reaped {
                    pid,
                    code: None,
                    signal: Some(sig),
                });
            }
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "Error reaping children");
                break;
            }
        }
    }

    reaped
}

/// Build the exec path and argv. Allocated before fork so the child never
/// allocates between fork and exec.
fn build_argv(program: &Path, args: &[&str]) -> Result<(CString, Vec<CString>)> {
    let prog = CString::new(program.as_os_str().as_bytes())
        .map_err(|_| Error::SpawnFailed(format!("{}: embedded NUL", program.display())))?;

    let argv0 = program
        .file_name()
        .map(|n| n.as_bytes().to_vec())
        .unwrap_or_else(|| program.as_os_str().as_bytes().to_vec());

    let mut argv = Vec::with_capacity(args.len() + 1);
    argv.push(
        CString::new(argv0)
            .map_err(|_| Error::SpawnFailed(format!("{}: embedded NUL", program.display())))?,
    );
    for arg in args {
        argv.push(
            CString::new(*arg)
                .map_err(|_| Error::SpawnFailed(format!("{arg}: embedded NUL")))?,
        );
    }

    Ok((prog, argv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn missing_path_is_not_executable() {
        assert!(!is_executable(Path::new("/nonexistent/definitely/not/here")));
    }

    #[test]
    fn plain_file_is_not_executable() {
        let dir = TempDir::new("sanity-process").unwrap();
        let path = dir.path().join("data");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"not a program").unwrap();
        assert!(!is_executable(&path));
    }

    #[test]
    fn run_blocking_skips_non_executables() {
        let dir = TempDir::new("sanity-process").unwrap();
        let path = dir.path().join("missing-script");
        let result = run_blocking(&path, &["start"]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn spawn_daemon_skips_non_executables() {
        let result = spawn_daemon(Path::new("/nonexistent/udevd"), &[]).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn argv_starts_with_program_name() {
        let (prog, argv) = build_argv(Path::new("/sbin/agetty"), &["--noclear", "tty1"]).unwrap();
        assert_eq!(prog.to_str().unwrap(), "/sbin/agetty");
        assert_eq!(argv[0].to_str().unwrap(), "agetty");
        assert_eq!(argv.len(), 3);
    }
}
