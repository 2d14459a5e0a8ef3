//! Reachability from anywhere through a public tunnel.

use tracing::{info, warn};
use url::Url;

use super::{
    CONNECTIVITY_TARGET, CertificatePair, ConnectivityError, ConnectivityResult,
    ConnectivityStrategy, Scheme,
};
use crate::cli::LaunchMode;
use crate::passcode::Passcode;
use crate::tunnel::{HostHeader, TunnelClient};

/// Query parameter carrying the passcode in the access URL.
pub const PASSCODE_QUERY_KEY: &str = "key";

/// Opens a tunnel to the local server and embeds the passcode in the link.
#[derive(Debug)]
pub struct TunnelConnectivity<T> {
    client: T,
    auth_token: Option<String>,
    certificates: CertificatePair,
    released: bool,
}

impl<T: TunnelClient> TunnelConnectivity<T> {
    /// Builds the strategy around `client`.
    pub const fn new(client: T, auth_token: Option<String>, certificates: CertificatePair) -> Self {
        Self {
            client,
            auth_token,
            certificates,
            released: false,
        }
    }
}

impl<T: TunnelClient> ConnectivityStrategy for TunnelConnectivity<T> {
    fn mode(&self) -> LaunchMode {
        LaunchMode::Tunnel
    }

    fn resolve(
        &mut self,
        port: u16,
        passcode: &Passcode,
    ) -> Result<ConnectivityResult, ConnectivityError> {
        match self.auth_token.as_deref() {
            Some(token) => self.client.set_auth_token(token),
            None => warn!(
                target: CONNECTIVITY_TARGET,
                "no tunnel auth token configured, tunnel may expire"
            ),
        }

        let scheme = Scheme::detect(&self.certificates);
        let local_address = format!("{scheme}://localhost:{port}");
        let tunnel = self
            .client
            .connect(&local_address, HostHeader::Rewrite)
            .map_err(|source| ConnectivityError::TunnelFailed {
                local_address: local_address.clone(),
                source,
            })?;

        let public_url = tunnel.public_url();
        Url::parse(public_url).map_err(|source| ConnectivityError::InvalidPublicUrl {
            url: public_url.to_owned(),
            source,
        })?;
        info!(target: CONNECTIVITY_TARGET, %local_address, %public_url, "tunnel open");

        let access_url = format!("{public_url}?{PASSCODE_QUERY_KEY}={passcode}");
        Ok(ConnectivityResult::new(
            public_url.to_owned(),
            access_url,
            LaunchMode::Tunnel,
        ))
    }

    fn release(&mut self) -> Result<(), ConnectivityError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.client
            .disconnect_all()
            .map_err(|source| ConnectivityError::Release { source })
    }
}
