//! Reachability on the local network through the host's LAN address.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tracing::{debug, warn};

use super::{
    CONNECTIVITY_TARGET, CertificatePair, ConnectivityError, ConnectivityResult,
    ConnectivityStrategy, Scheme,
};
use crate::cli::LaunchMode;
use crate::passcode::Passcode;

/// Public address used only to make the OS pick an outbound route.
pub const ROUTE_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)), 80);

/// Finds the local address the OS would use for outbound traffic.
pub trait RouteProbe {
    /// Returns the source address of the preferred outbound route.
    ///
    /// # Errors
    ///
    /// Returns an IO error when no interface has an outbound route.
    fn outbound_address(&self) -> io::Result<IpAddr>;
}

/// Connects a UDP socket, which selects a route without sending packets.
#[derive(Debug, Clone, Copy)]
pub struct UdpRouteProbe {
    target: SocketAddr,
}

impl UdpRouteProbe {
    /// Probes the route towards `target`.
    #[must_use]
    pub const fn towards(target: SocketAddr) -> Self {
        Self { target }
    }
}

impl Default for UdpRouteProbe {
    fn default() -> Self {
        Self::towards(ROUTE_PROBE_TARGET)
    }
}

impl RouteProbe for UdpRouteProbe {
    fn outbound_address(&self) -> io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(self.target)?;
        Ok(socket.local_addr()?.ip())
    }
}

/// Serves the LAN address directly; the access URL carries no passcode.
#[derive(Debug)]
pub struct LocalConnectivity<P = UdpRouteProbe> {
    probe: P,
    certificates: CertificatePair,
}

impl<P: RouteProbe> LocalConnectivity<P> {
    /// Builds the strategy around `probe`.
    pub const fn new(probe: P, certificates: CertificatePair) -> Self {
        Self {
            probe,
            certificates,
        }
    }

    fn host_address(&self) -> IpAddr {
        match self.probe.outbound_address() {
            Ok(ip) if !ip.is_unspecified() => ip,
            Ok(ip) => {
                warn!(target: CONNECTIVITY_TARGET, %ip, "route probe returned no address, using loopback");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
            Err(error) => {
                warn!(target: CONNECTIVITY_TARGET, %error, "no outbound route, using loopback");
                IpAddr::V4(Ipv4Addr::LOCALHOST)
            }
        }
    }
}

impl<P: RouteProbe> ConnectivityStrategy for LocalConnectivity<P> {
    fn mode(&self) -> LaunchMode {
        LaunchMode::Local
    }

    fn resolve(
        &mut self,
        port: u16,
        _passcode: &Passcode,
    ) -> Result<ConnectivityResult, ConnectivityError> {
        let scheme = Scheme::detect(&self.certificates);
        let endpoint = SocketAddr::new(self.host_address(), port);
        let base_url = format!("{scheme}://{endpoint}");
        debug!(target: CONNECTIVITY_TARGET, %base_url, "resolved local address");
        Ok(ConnectivityResult::new(
            base_url.clone(),
            base_url,
            LaunchMode::Local,
        ))
    }

    fn release(&mut self) -> Result<(), ConnectivityError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::Ipv6Addr;

    use rstest::rstest;

    use super::*;

    struct FixedProbe(io::Result<IpAddr>);

    impl RouteProbe for FixedProbe {
        fn outbound_address(&self) -> io::Result<IpAddr> {
            match &self.0 {
                Ok(ip) => Ok(*ip),
                Err(error) => Err(io::Error::new(error.kind(), error.to_string())),
            }
        }
    }

    fn absent_certificates() -> CertificatePair {
        CertificatePair::new("/nonexistent/server.key", "/nonexistent/server.cert")
    }

    fn passcode() -> Passcode {
        Passcode::new("123456")
    }

    #[rstest]
    #[case(Ok(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))), "http://192.168.1.20:3000")]
    #[case(Ok(IpAddr::V6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 7))), "http://[fd00::7]:3000")]
    #[case(Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED)), "http://127.0.0.1:3000")]
    #[case(
        Err(io::Error::new(io::ErrorKind::NetworkUnreachable, "no route")),
        "http://127.0.0.1:3000"
    )]
    fn composes_lan_url(#[case] probed: io::Result<IpAddr>, #[case] expected: &str) {
        let mut strategy = LocalConnectivity::new(FixedProbe(probed), absent_certificates());
        let result = strategy.resolve(3000, &passcode()).expect("resolve");
        assert_eq!(result.base_url(), expected);
        assert_eq!(result.access_url(), result.base_url());
        assert_eq!(result.mode(), LaunchMode::Local);
    }

    #[test]
    fn certificates_select_https() {
        let dir = tempfile::tempdir().expect("temp dir");
        let key = dir.path().join("server.key");
        let cert = dir.path().join("server.cert");
        fs::write(&key, "key").expect("key");
        fs::write(&cert, "cert").expect("cert");
        let probe = FixedProbe(Ok(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5))));
        let mut strategy = LocalConnectivity::new(probe, CertificatePair::new(key, cert));

        let result = strategy.resolve(8443, &passcode()).expect("resolve");
        assert_eq!(result.base_url(), "https://10.0.0.5:8443");
    }

    #[test]
    fn release_is_a_no_op() {
        let mut strategy = LocalConnectivity::new(
            FixedProbe(Ok(IpAddr::V4(Ipv4Addr::LOCALHOST))),
            absent_certificates(),
        );
        strategy.release().expect("first");
        strategy.release().expect("second");
    }
}
