//! Run orchestration for the launcher.
//!
//! [`LifecycleController`] owns the [`RunState`] and is its only writer. It
//! starts the server, resolves connectivity, supervises the server and its
//! log on a fixed cadence, and always finishes with the same teardown.

mod banner;
mod controller;
mod error;
mod interrupt;
mod output;
mod plan;
mod state;

pub use self::banner::EDITOR_DEBUG_PORT;
pub use self::controller::{LifecycleController, RunDeps, RunOutcome};
pub use self::error::LifecycleError;
pub use self::interrupt::{InterruptSignal, ShutdownError, SystemInterrupt};
pub use self::output::LauncherOutput;
pub use self::plan::{LaunchPlan, POLL_INTERVAL, STOP_GRACE};
pub use self::state::{RunState, StateMachine};

pub(crate) const LIFECYCLE_TARGET: &str = "tether::lifecycle";
