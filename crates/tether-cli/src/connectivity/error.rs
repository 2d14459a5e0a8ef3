use thiserror::Error;

use crate::tunnel::TunnelError;

/// Errors raised while making the server reachable.
#[derive(Debug, Error)]
pub enum ConnectivityError {
    /// The tunnel provider could not open a tunnel.
    #[error("failed to open tunnel to {local_address}: {source}")]
    TunnelFailed {
        /// Local target the tunnel should forward to.
        local_address: String,
        /// Provider failure.
        #[source]
        source: TunnelError,
    },
    /// The provider reported something that is not an absolute URL.
    #[error("tunnel provider returned an invalid public URL '{url}': {source}")]
    InvalidPublicUrl {
        /// Value reported by the provider.
        url: String,
        /// Parse failure.
        #[source]
        source: url::ParseError,
    },
    /// Closing the tunnel failed.
    #[error("failed to release tunnel: {source}")]
    Release {
        /// Provider failure.
        #[source]
        source: TunnelError,
    },
}
