//! File locations the launcher reads and writes.
//!
//! Every path hangs off the launcher's working directory, which is also the
//! working directory of the spawned server, so the server and the launcher
//! agree on where certificates and logs live.

use std::env;
use std::path::{Path, PathBuf};

use crate::ConfigError;

const SINK_FILE: &str = "server_log.txt";
const DOTENV_FILE: &str = ".env";
const CERTS_DIR: &str = "certs";
const TLS_KEY_FILE: &str = "server.key";
const TLS_CERT_FILE: &str = "server.cert";

/// Canonical launcher paths derived from a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherPaths {
    base_dir: PathBuf,
    sink_path: PathBuf,
    dotenv_path: PathBuf,
    tls_key_path: PathBuf,
    tls_cert_path: PathBuf,
}

impl LauncherPaths {
    /// Derives the paths relative to `base_dir`.
    #[must_use]
    pub fn from_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        let certs = base_dir.join(CERTS_DIR);
        Self {
            sink_path: base_dir.join(SINK_FILE),
            dotenv_path: base_dir.join(DOTENV_FILE),
            tls_key_path: certs.join(TLS_KEY_FILE),
            tls_cert_path: certs.join(TLS_CERT_FILE),
            base_dir,
        }
    }

    /// Derives the paths relative to the current working directory.
    pub fn current() -> Result<Self, ConfigError> {
        env::current_dir()
            .map(Self::from_dir)
            .map_err(|source| ConfigError::WorkingDirectory { source })
    }

    /// Directory the launcher and the server run in.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_path()
    }

    /// Text file capturing the server's combined output.
    #[must_use]
    pub fn sink_path(&self) -> &Path {
        self.sink_path.as_path()
    }

    /// Optional dotenv file holding configuration overrides.
    #[must_use]
    pub fn dotenv_path(&self) -> &Path {
        self.dotenv_path.as_path()
    }

    /// TLS private key whose presence, together with the certificate,
    /// selects `https`.
    #[must_use]
    pub fn tls_key_path(&self) -> &Path {
        self.tls_key_path.as_path()
    }

    /// TLS certificate paired with [`Self::tls_key_path`].
    #[must_use]
    pub fn tls_cert_path(&self) -> &Path {
        self.tls_cert_path.as_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_fixed_layout_under_base_dir() {
        let paths = LauncherPaths::from_dir("/srv/phone");
        assert_eq!(paths.base_dir(), Path::new("/srv/phone"));
        assert_eq!(paths.sink_path(), Path::new("/srv/phone/server_log.txt"));
        assert_eq!(paths.dotenv_path(), Path::new("/srv/phone/.env"));
        assert_eq!(paths.tls_key_path(), Path::new("/srv/phone/certs/server.key"));
        assert_eq!(
            paths.tls_cert_path(),
            Path::new("/srv/phone/certs/server.cert")
        );
    }
}
