/// Port the server listens on when `PORT` is not configured.
pub const DEFAULT_PORT: u16 = 3000;

/// Default log filter expression used by the launcher.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Program and arguments used to start the server when no override is set.
pub const DEFAULT_SERVER_COMMAND: &[&str] = &["node", "server.js"];

/// Tunnel agent binary used when `NGROK_BIN` is not set.
pub const DEFAULT_NGROK_BINARY: &str = "ngrok";

/// Default log filter expression used by the launcher.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Default logging format for the launcher.
#[must_use]
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Compact
}

/// Owned copy of [`DEFAULT_SERVER_COMMAND`].
#[must_use]
pub fn default_server_command() -> Vec<String> {
    DEFAULT_SERVER_COMMAND
        .iter()
        .map(|part| (*part).to_owned())
        .collect()
}
