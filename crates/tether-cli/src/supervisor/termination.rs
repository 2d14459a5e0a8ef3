//! Graceful-then-forced termination of the server's process group.

use std::io;
use std::process::{Child, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::SUPERVISOR_TARGET;

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a termination request concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The process had already exited; no signal was sent.
    AlreadyExited,
    /// The process exited within the grace period after a polite request.
    Graceful,
    /// The grace period elapsed and the process group was killed.
    Forced,
}

/// Asks the child to stop, waits up to `grace`, then kills it.
///
/// Returns the outcome together with the reaped exit status.
pub(crate) fn terminate_child(
    child: &mut Child,
    grace: Duration,
) -> io::Result<(TerminationOutcome, ExitStatus)> {
    if let Some(status) = child.try_wait()? {
        return Ok((TerminationOutcome::AlreadyExited, status));
    }

    let pid = child.id();
    request_stop(pid);
    let deadline = Instant::now() + grace;
    loop {
        if let Some(status) = child.try_wait()? {
            debug!(target: SUPERVISOR_TARGET, pid, ?status, "server exited after stop request");
            return Ok((TerminationOutcome::Graceful, status));
        }
        if Instant::now() >= deadline {
            break;
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }

    warn!(
        target: SUPERVISOR_TARGET,
        pid,
        grace_ms = grace.as_millis(),
        "server ignored stop request, killing"
    );
    force_stop(child)?;
    let status = child.wait()?;
    Ok((TerminationOutcome::Forced, status))
}

#[cfg(unix)]
fn request_stop(pid: u32) {
    signal_group(pid, nix::sys::signal::Signal::SIGTERM);
}

#[cfg(not(unix))]
fn request_stop(_pid: u32) {}

#[cfg(unix)]
fn force_stop(child: &mut Child) -> io::Result<()> {
    signal_group(child.id(), nix::sys::signal::Signal::SIGKILL);
    kill_leader(child)
}

#[cfg(not(unix))]
fn force_stop(child: &mut Child) -> io::Result<()> {
    kill_leader(child)
}

fn kill_leader(child: &mut Child) -> io::Result<()> {
    match child.kill() {
        Ok(()) => Ok(()),
        // Already reaped or exited between the last poll and now.
        Err(error) if error.kind() == io::ErrorKind::InvalidInput => Ok(()),
        Err(error) => Err(error),
    }
}

/// Signals every process in the group led by `pid`.
#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::errno::Errno;
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        warn!(target: SUPERVISOR_TARGET, pid, "process id out of range for signalling");
        return;
    };
    match killpg(Pid::from_raw(raw), signal) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(error) => {
            warn!(target: SUPERVISOR_TARGET, pid, ?signal, %error, "failed to signal server group");
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::CommandExt;
    use std::process::{Command, Stdio};

    use super::*;

    fn spawn_shell(script: &str) -> Child {
        Command::new("sh")
            .args(["-c", script])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .expect("spawn sh")
    }

    #[test]
    fn already_exited_child_is_not_signalled() {
        let mut child = spawn_shell("exit 0");
        child.wait().expect("wait");
        let (outcome, status) =
            terminate_child(&mut child, Duration::from_millis(100)).expect("terminate");
        assert_eq!(outcome, TerminationOutcome::AlreadyExited);
        assert!(status.success());
    }

    #[test]
    fn cooperative_child_stops_gracefully() {
        let mut child = spawn_shell("sleep 30");
        let (outcome, status) =
            terminate_child(&mut child, Duration::from_secs(5)).expect("terminate");
        assert_eq!(outcome, TerminationOutcome::Graceful);
        assert!(!status.success());
    }

    #[test]
    fn stubborn_child_is_killed_after_grace() {
        let mut child = spawn_shell("trap '' TERM; while true; do sleep 1; done");
        // Give the shell time to install its trap.
        thread::sleep(Duration::from_millis(200));
        let (outcome, _) =
            terminate_child(&mut child, Duration::from_millis(300)).expect("terminate");
        assert_eq!(outcome, TerminationOutcome::Forced);
    }
}
