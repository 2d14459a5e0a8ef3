use std::io;

use thiserror::Error;

use super::RunState;
use crate::connectivity::ConnectivityError;
use crate::supervisor::{LaunchError, describe_code};

/// Fatal conditions that end a run.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The server could not be started.
    #[error(transparent)]
    Launch(#[from] LaunchError),
    /// The server started but could not be made reachable.
    #[error(transparent)]
    Connectivity(#[from] ConnectivityError),
    /// The server exited while being supervised.
    #[error("server process died unexpectedly ({}); check the server log", describe_code(*.code))]
    ServerDied {
        /// Exit code, absent when a signal ended it.
        code: Option<i32>,
    },
    /// Operator output could not be written.
    #[error("failed to write launcher output: {0}")]
    Output(#[source] io::Error),
    /// The controller attempted an illegal state change.
    #[error("invalid run state transition from {from} to {to}")]
    InvalidTransition {
        /// State before the attempted move.
        from: RunState,
        /// Requested state.
        to: RunState,
    },
}
