//! Graceful child-process termination.
//!
//! Sends SIGTERM, waits out a grace period, then force-kills. Failures are
//! only traced since the caller already has a primary error to report.

use std::time::Duration;

use tokio::process::Child;

pub(super) async fn terminate_child(child: &mut Child, grace: Duration) {
    if !child_is_running(child) {
        return;
    }

    if request_shutdown(child) && tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return;
    }

    if let Err(error) = child.kill().await {
        tracing::trace!("failed to kill invoked process: {error}");
    }
}

fn child_is_running(child: &mut Child) -> bool {
    match child.try_wait() {
        Ok(Some(_)) => false,
        Ok(None) => true,
        Err(error) => {
            tracing::trace!("failed to query invoked process status: {error}");
            true
        }
    }
}

#[cfg(unix)]
fn request_shutdown(child: &Child) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(raw) = child.id().and_then(|id| i32::try_from(id).ok()) else {
        return false;
    };
    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => true,
        Err(error) => {
            tracing::trace!("failed to send SIGTERM to invoked process: {error}");
            false
        }
    }
}

#[cfg(not(unix))]
const fn request_shutdown(_child: &Child) -> bool {
    false
}
