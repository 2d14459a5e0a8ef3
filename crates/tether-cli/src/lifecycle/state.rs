//! The launcher's run state and its permitted transitions.

use strum::{Display, IntoStaticStr};

use super::LifecycleError;

/// Where the launcher is in its single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RunState {
    /// Nothing has happened yet.
    Idle,
    /// Spawning the server and establishing connectivity.
    Starting,
    /// Supervising the server.
    Running,
    /// Tearing down the server and the tunnel.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl RunState {
    /// Whether moving from `self` to `next` is allowed.
    ///
    /// The run only moves forward; `Starting` may skip `Running` when
    /// startup fails, and `Running` always passes through `ShuttingDown`.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Starting)
                | (Self::Starting, Self::Running | Self::ShuttingDown | Self::Stopped)
                | (Self::Running, Self::ShuttingDown)
                | (Self::ShuttingDown, Self::Stopped)
        )
    }
}

/// Single-writer holder of the current [`RunState`] and the path taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    history: Vec<RunState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            history: vec![RunState::Idle],
        }
    }
}

impl StateMachine {
    /// Current state.
    #[must_use]
    pub fn current(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Idle)
    }

    /// Every state visited, oldest first.
    #[must_use]
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Moves to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] when `next` is not
    /// reachable from the current state.
    pub fn advance(&mut self, next: RunState) -> Result<(), LifecycleError> {
        let from = self.current();
        if !from.can_advance_to(next) {
            return Err(LifecycleError::InvalidTransition { from, to: next });
        }
        self.history.push(next);
        Ok(())
    }
}
