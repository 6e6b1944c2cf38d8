// src/os/signal.rs
//! Broken-pipe policy.
//!
//! Collaborators talk to display daemons over sockets. With the default
//! disposition a write to a closed peer kills the process; once the policy
//! is installed the write fails with `EPIPE` and surfaces as an ordinary
//! error. The policy is process-wide and outlives teardown.

use log::{debug, warn};
use nix::sys::signal::{signal, SigHandler, Signal};

/// Sets `SIGPIPE` to ignored. Every bootstrap reinstalls it, so a
/// disposition restored by someone else in between does not stick.
pub fn ignore_broken_pipe() -> bool {
    // Safety: SIG_IGN installs no handler code, so no async-signal
    // safety requirements apply.
    match unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) } {
        Ok(previous) => {
            if previous != SigHandler::SigIgn {
                debug!("SIGPIPE ignored for this process");
            }
            true
        }
        Err(e) => {
            warn!("Failed to ignore SIGPIPE: {}", e);
            false
        }
    }
}

/// Whether `SIGPIPE` is currently ignored, queried from the kernel.
pub fn broken_pipe_ignored() -> bool {
    // Safety: a null new action only reads the current disposition.
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(libc::SIGPIPE, std::ptr::null(), &mut current) != 0 {
            return false;
        }
        current.sa_sigaction == libc::SIG_IGN
    }
}

/// Tests that change or assert the `SIGPIPE` disposition hold this lock.
#[cfg(test)]
pub(crate) static SIGPIPE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn restore_default_broken_pipe() {
    // Safety: SIG_DFL installs no handler code.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigDfl) }.unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn it_should_reinstall_the_policy_after_the_default_is_restored() {
        let _lock = SIGPIPE_TEST_LOCK
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        assert!(ignore_broken_pipe());
        assert!(broken_pipe_ignored());

        restore_default_broken_pipe();

        assert!(ignore_broken_pipe());
        assert!(broken_pipe_ignored());
    }
}
