//! Making the server reachable from the phone.
//!
//! Two strategies share one result shape: [`LocalConnectivity`] hands out the
//! LAN address, which is trusted as-is, while [`TunnelConnectivity`] opens a
//! public tunnel and embeds the passcode in the access link.

mod error;
mod local;
mod scheme;
mod tunnelled;

use tether_config::{Config, LauncherPaths};

pub use self::error::ConnectivityError;
pub use self::local::{LocalConnectivity, ROUTE_PROBE_TARGET, RouteProbe, UdpRouteProbe};
pub use self::scheme::{CertificatePair, Scheme};
pub use self::tunnelled::{PASSCODE_QUERY_KEY, TunnelConnectivity};

use crate::cli::LaunchMode;
use crate::passcode::Passcode;
use crate::tunnel::NgrokAgent;

pub(crate) const CONNECTIVITY_TARGET: &str = "tether::connectivity";

/// Where the server can be reached once connectivity is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityResult {
    base_url: String,
    access_url: String,
    mode: LaunchMode,
}

impl ConnectivityResult {
    /// Bundles the resolved addresses.
    pub fn new(base_url: impl Into<String>, access_url: impl Into<String>, mode: LaunchMode) -> Self {
        Self {
            base_url: base_url.into(),
            access_url: access_url.into(),
            mode,
        }
    }

    /// Scheme, host, and port without any embedded secret.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Link handed to the phone, carrying the passcode in tunnel mode.
    #[must_use]
    pub fn access_url(&self) -> &str {
        &self.access_url
    }

    /// Mode the addresses were resolved for.
    #[must_use]
    pub const fn mode(&self) -> LaunchMode {
        self.mode
    }
}

/// A mode-specific way of making the server reachable.
pub trait ConnectivityStrategy {
    /// Mode this strategy implements.
    fn mode(&self) -> LaunchMode;

    /// Establishes reachability for the server listening on `port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectivityError`] when the mode's prerequisite is
    /// unavailable.
    fn resolve(
        &mut self,
        port: u16,
        passcode: &Passcode,
    ) -> Result<ConnectivityResult, ConnectivityError>;

    /// Releases anything `resolve` acquired. Safe to call repeatedly and
    /// after a failed `resolve`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectivityError::Release`] when the tunnel could not be
    /// closed.
    fn release(&mut self) -> Result<(), ConnectivityError>;
}

/// Builds the production strategy for `mode`.
#[must_use]
pub fn strategy_for(
    mode: LaunchMode,
    config: &Config,
    paths: &LauncherPaths,
) -> Box<dyn ConnectivityStrategy> {
    let certificates = CertificatePair::from_paths(paths);
    match mode {
        LaunchMode::Local => Box::new(LocalConnectivity::new(
            UdpRouteProbe::default(),
            certificates,
        )),
        LaunchMode::Tunnel => Box::new(TunnelConnectivity::new(
            NgrokAgent::new(&config.ngrok_binary),
            config.ngrok_authtoken.clone(),
            certificates,
        )),
    }
}
