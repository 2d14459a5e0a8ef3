//! Starting, observing, and stopping the server process.
//!
//! [`ServerLauncher`] and [`ServerProcess`] are the seams the lifecycle
//! controller drives; [`SystemLauncher`] and [`ChildProcess`] back them
//! with real OS processes.

mod error;
mod sink;
mod spawning;
mod termination;

use std::io;
use std::time::Duration;

pub use self::error::LaunchError;
pub(crate) use self::error::describe_code;
pub use self::sink::{SINK_HEADER_PREFIX, prepare_sink};
pub use self::spawning::{ChildProcess, LaunchRequest, STARTUP_GRACE, SystemLauncher};
pub use self::termination::TerminationOutcome;
pub(crate) use self::termination::terminate_child;

pub(crate) const SUPERVISOR_TARGET: &str = "tether::supervisor";

/// Liveness of the server as seen by a non-blocking poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Still running.
    Running,
    /// Exited; `code` is absent when a signal ended it.
    Exited {
        /// Exit code reported by the OS.
        code: Option<i32>,
    },
}

/// A started server that can be polled and stopped.
pub trait ServerProcess {
    /// OS process identifier.
    fn id(&self) -> u32;

    /// Reports whether the process is still running without blocking.
    fn poll_status(&mut self) -> ProcessStatus;

    /// Convenience wrapper over [`Self::poll_status`].
    fn is_alive(&mut self) -> bool {
        matches!(self.poll_status(), ProcessStatus::Running)
    }

    /// Stops the process: politely first, forcibly once `grace` elapses.
    ///
    /// Calling this on an exited process is a no-op.
    fn terminate(&mut self, grace: Duration) -> io::Result<TerminationOutcome>;
}

/// Starts the server and verifies it survives the startup grace period.
pub trait ServerLauncher {
    /// Handle type for the started process.
    type Process: ServerProcess;

    /// Truncates the sink, spawns the server, and waits out the grace period.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError`] when the sink cannot be prepared, the
    /// executable cannot be spawned, or the process exits during the grace
    /// period.
    fn start(&self, request: &LaunchRequest) -> Result<Self::Process, LaunchError>;
}
