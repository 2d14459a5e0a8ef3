//! Shared configuration for the tether launcher.
//!
//! The launcher reads its settings once at startup from two layers: an
//! optional `.env` file in its working directory and the process
//! environment. A variable that is already set in the environment is never
//! overridden by the file.

mod defaults;
mod error;
mod layers;
mod logging;
mod paths;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_NGROK_BINARY, DEFAULT_PORT, DEFAULT_SERVER_COMMAND,
    default_log_filter, default_log_format, default_server_command,
};
pub use error::ConfigError;
pub use layers::{
    APP_PASSWORD_KEY, LOG_FILTER_KEY, LOG_FORMAT_KEY, Layer, NGROK_AUTHTOKEN_KEY, NGROK_BIN_KEY,
    PORT_KEY, SERVER_COMMAND_KEY,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::LauncherPaths;

/// Resolved launcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Operator-fixed passcode; a random one is generated when absent.
    pub app_password: Option<String>,
    /// Tunnel auth token; tunnels run unauthenticated when absent.
    pub ngrok_authtoken: Option<String>,
    /// Port the server listens on.
    pub port: u16,
    /// `tracing` filter expression for launcher diagnostics.
    pub log_filter: String,
    /// Output format for launcher diagnostics.
    pub log_format: LogFormat,
    /// Server program followed by its arguments.
    pub server_command: Vec<String>,
    /// Tunnel agent executable.
    pub ngrok_binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_password: None,
            ngrok_authtoken: None,
            port: DEFAULT_PORT,
            log_filter: default_log_filter().to_owned(),
            log_format: default_log_format(),
            server_command: default_server_command(),
            ngrok_binary: DEFAULT_NGROK_BINARY.to_owned(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
