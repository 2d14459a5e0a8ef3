//! Errors raised while starting the server process.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`super::ServerLauncher::start`].
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The output sink could not be truncated, stamped, or reopened.
    #[error("failed to prepare server log '{path}': {source}")]
    PrepareSink {
        /// Sink location.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The server executable does not exist on `PATH`.
    #[error("server executable '{program:?}' was not found; is it installed and on PATH?")]
    ExecutableNotFound {
        /// Program that was looked up.
        program: OsString,
    },
    /// The OS refused to spawn the server.
    #[error("failed to spawn server '{program:?}': {source}")]
    SpawnRefused {
        /// Program that failed to start.
        program: OsString,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The server exited during the startup grace period.
    #[error("server exited during startup ({}); check the server log", describe_code(*.code))]
    EarlyExit {
        /// Exit code, absent when the process was killed by a signal.
        code: Option<i32>,
    },
    /// Polling the freshly spawned process failed.
    #[error("failed to monitor server startup: {source}")]
    Monitor {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

pub(crate) fn describe_code(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => String::from("terminated by signal"),
    }
}
