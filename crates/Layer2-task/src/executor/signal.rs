//! Termination signals
//!
//! SIGTERM is delivered with `kill(2)` on Unix. Windows has no graceful
//! signal, so termination there is `TerminateProcess` via `start_kill`.

use std::io;
use std::process::ExitStatus;
use tokio::process::Child;

/// Outcome of a termination attempt
#[derive(Debug)]
pub(crate) enum Delivery {
    /// Signal handed to the OS
    Sent,

    /// No such process (already exited and reaped)
    ProcessGone,

    /// The OS refused the signal
    Failed(io::Error),
}

/// Send SIGTERM to `child`.
#[cfg(unix)]
pub(crate) fn send_sigterm(child: &mut Child) -> Delivery {
    let Some(pid) = child.id() else {
        return Delivery::ProcessGone;
    };

    // SAFETY: kill(2) has no memory-safety preconditions.
    let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
    if rc == 0 {
        return Delivery::Sent;
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Delivery::ProcessGone
    } else {
        Delivery::Failed(err)
    }
}

#[cfg(windows)]
pub(crate) fn send_sigterm(child: &mut Child) -> Delivery {
    match child.start_kill() {
        Ok(()) => Delivery::Sent,
        Err(e) if e.kind() == io::ErrorKind::InvalidInput => Delivery::ProcessGone,
        Err(e) => Delivery::Failed(e),
    }
}

/// Signal number that terminated the process, if any.
#[cfg(unix)]
pub fn exit_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
pub fn exit_signal(_status: &ExitStatus) -> Option<i32> {
    None
}

/// Conventional name of a signal number (`15` -> `SIGTERM`).
pub fn signal_name(signal: i32) -> String {
    let name = match signal {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        4 => "SIGILL",
        5 => "SIGTRAP",
        6 => "SIGABRT",
        8 => "SIGFPE",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        14 => "SIGALRM",
        15 => "SIGTERM",
        _ => return format!("SIG{}", signal),
    };
    name.to_string()
}
