//! URL scheme selection from certificate presence.

use std::fmt;
use std::path::PathBuf;

use tether_config::LauncherPaths;

/// Scheme the server is reachable on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// Plain HTTP.
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Chooses `https` only when both certificate files exist right now.
    #[must_use]
    pub fn detect(certificates: &CertificatePair) -> Self {
        if certificates.is_present() {
            Self::Https
        } else {
            Self::Http
        }
    }

    /// Lower-case scheme name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The TLS key and certificate the server loads when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePair {
    key: PathBuf,
    cert: PathBuf,
}

impl CertificatePair {
    /// Pairs an explicit key and certificate location.
    pub fn new(key: impl Into<PathBuf>, cert: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            cert: cert.into(),
        }
    }

    /// Uses the fixed locations under the launcher directory.
    #[must_use]
    pub fn from_paths(paths: &LauncherPaths) -> Self {
        Self::new(paths.tls_key_path(), paths.tls_cert_path())
    }

    /// True when both files exist.
    #[must_use]
    pub fn is_present(&self) -> bool {
        self.key.is_file() && self.cert.is_file()
    }
}
