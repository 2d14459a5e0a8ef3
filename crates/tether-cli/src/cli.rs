//! CLI argument definitions for the tether launcher.
//!
//! This module is shared by the runtime parser and the build script that
//! renders the manual page, so it only depends on `clap`.

use std::fmt;

use clap::{Parser, ValueEnum};

/// Connectivity strategy selected once at startup.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, ValueEnum)]
pub enum LaunchMode {
    /// Serve on the local network through the host's LAN address.
    Local,
    /// Publish the server through an outbound tunnel.
    #[default]
    #[value(name = "web")]
    Tunnel,
}

impl LaunchMode {
    /// Upper-case label used in operator banners.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Tunnel => "WEB",
        }
    }
}

impl fmt::Display for LaunchMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => formatter.write_str("local"),
            Self::Tunnel => formatter.write_str("web"),
        }
    }
}

/// Starts the phone-connect server and prints a link to reach it.
#[derive(Parser, Debug)]
#[command(name = "tether", version, about)]
pub(crate) struct Cli {
    /// Where the phone connects from: 'local' (same Wi-Fi) or 'web' (internet).
    #[arg(long, value_enum, default_value_t = LaunchMode::Tunnel)]
    pub(crate) mode: LaunchMode,
}
