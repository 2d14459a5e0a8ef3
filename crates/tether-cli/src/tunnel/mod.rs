//! Client seam for the public tunnel provider.

mod agent;
mod log_stream;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use self::agent::{NgrokAgent, TUNNEL_START_TIMEOUT};
pub(crate) use self::log_stream::{AgentEvent, parse_agent_line};

pub(crate) const TUNNEL_TARGET: &str = "tether::tunnel";

/// How the tunnel treats the `Host` header of forwarded requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostHeader {
    /// Rewrite to match the local target address.
    Rewrite,
    /// Forward the public host unchanged.
    Preserve,
}

impl HostHeader {
    pub(crate) const fn as_flag(self) -> Option<&'static str> {
        match self {
            Self::Rewrite => Some("--host-header=rewrite"),
            Self::Preserve => None,
        }
    }
}

/// An established tunnel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tunnel {
    public_url: String,
}

impl Tunnel {
    /// Wraps the public URL reported by the provider.
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
        }
    }

    /// Internet-reachable address forwarding to the local target.
    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }
}

/// Errors reported by a [`TunnelClient`].
#[derive(Debug, Error)]
pub enum TunnelError {
    /// The agent binary is not installed.
    #[error("tunnel agent '{}' was not found; install ngrok or set NGROK_BIN", binary.display())]
    AgentNotFound {
        /// Binary that was looked up.
        binary: PathBuf,
    },
    /// The agent could not be spawned.
    #[error("failed to start tunnel agent '{}': {source}", binary.display())]
    Spawn {
        /// Binary that failed to start.
        binary: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The provider refused the tunnel.
    #[error("tunnel provider rejected the tunnel: {message}")]
    Rejected {
        /// Cause reported by the agent.
        message: String,
    },
    /// The agent exited before reporting a tunnel.
    #[error("tunnel agent exited before the tunnel was established")]
    AgentExited,
    /// No tunnel was reported in time.
    #[error("tunnel was not established within {}s", waited.as_secs())]
    Timeout {
        /// How long the client waited.
        waited: Duration,
    },
    /// Stopping the agent failed.
    #[error("failed to stop tunnel agent: {source}")]
    Stop {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Operations the launcher needs from a tunnel provider.
pub trait TunnelClient {
    /// Authenticates subsequent tunnels with `token`.
    fn set_auth_token(&mut self, token: &str);

    /// Opens a tunnel forwarding to `local_address`.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError`] when the provider cannot establish the tunnel.
    fn connect(&mut self, local_address: &str, host_header: HostHeader)
    -> Result<Tunnel, TunnelError>;

    /// Closes every tunnel opened by this client. Repeated calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns [`TunnelError::Stop`] when an agent could not be stopped.
    fn disconnect_all(&mut self) -> Result<(), TunnelError>;
}
