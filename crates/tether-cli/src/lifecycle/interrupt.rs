//! Operator stop requests.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(unix)]
use signal_hook::consts::signal::SIGHUP;
use signal_hook::consts::signal::{SIGINT, SIGTERM};
use thiserror::Error;

/// Something the supervising loop can ask "should we stop?".
pub trait InterruptSignal {
    /// True once a stop has been requested. Never resets.
    fn is_requested(&self) -> bool;
}

/// Errors raised while installing signal handlers.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Registering a handler failed.
    #[error("failed to install handler for signal {signal}: {source}")]
    Install {
        /// Signal number.
        signal: i32,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Latches on SIGINT, SIGTERM, or SIGHUP.
#[derive(Debug, Clone)]
pub struct SystemInterrupt {
    requested: Arc<AtomicBool>,
}

impl SystemInterrupt {
    /// Registers the handlers for the lifetime of the process.
    pub fn install() -> Result<Self, ShutdownError> {
        let requested = Arc::new(AtomicBool::new(false));
        for signal in handled_signals() {
            signal_hook::flag::register(signal, Arc::clone(&requested))
                .map_err(|source| ShutdownError::Install { signal, source })?;
        }
        Ok(Self { requested })
    }
}

impl InterruptSignal for SystemInterrupt {
    fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}

#[cfg(unix)]
const fn handled_signals() -> [i32; 3] {
    [SIGINT, SIGTERM, SIGHUP]
}

#[cfg(not(unix))]
const fn handled_signals() -> [i32; 2] {
    [SIGINT, SIGTERM]
}
