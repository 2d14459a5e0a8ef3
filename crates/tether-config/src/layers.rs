//! Layered loading: dotenv file first, process environment on top.

use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::str::FromStr;

use crate::defaults::{
    DEFAULT_NGROK_BINARY, DEFAULT_PORT, default_log_filter, default_log_format,
    default_server_command,
};
use crate::{Config, ConfigError, LauncherPaths, LogFormat};

/// Shared secret handed to the server and embedded in tunnel links.
pub const APP_PASSWORD_KEY: &str = "APP_PASSWORD";
/// Auth token applied to the tunnel agent.
pub const NGROK_AUTHTOKEN_KEY: &str = "NGROK_AUTHTOKEN";
/// Port the server listens on.
pub const PORT_KEY: &str = "PORT";
/// Log filter expression for the launcher's own diagnostics.
pub const LOG_FILTER_KEY: &str = "TETHER_LOG_FILTER";
/// Log output format for the launcher's own diagnostics.
pub const LOG_FORMAT_KEY: &str = "TETHER_LOG_FORMAT";
/// Whitespace separated override for the server program and arguments.
pub const SERVER_COMMAND_KEY: &str = "TETHER_SERVER_COMMAND";
/// Path or name of the tunnel agent executable.
pub const NGROK_BIN_KEY: &str = "NGROK_BIN";

/// A flat set of key/value pairs contributed by one configuration source.
pub type Layer = HashMap<String, String>;

impl Config {
    /// Loads configuration from `.env` in the working directory and the
    /// process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_in(&LauncherPaths::current()?)
    }

    /// Loads configuration from the dotenv file under `paths` and the
    /// process environment.
    pub fn load_in(paths: &LauncherPaths) -> Result<Self, ConfigError> {
        Self::load_from(paths.dotenv_path(), process_environment())
    }

    /// Loads configuration from an explicit dotenv path and environment.
    ///
    /// A missing dotenv file is treated as an empty layer.
    pub fn load_from<I>(dotenv_path: &Path, environment: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let dotenv = read_dotenv(dotenv_path)?;
        let environment: Layer = environment.into_iter().collect();
        Self::from_layers(&dotenv, &environment)
    }

    /// Merges the two layers into a resolved configuration.
    ///
    /// A key present in `environment` shadows the dotenv value even when it
    /// is empty; empty values resolve to "not configured".
    pub fn from_layers(dotenv: &Layer, environment: &Layer) -> Result<Self, ConfigError> {
        let lookup = |key: &str| -> Option<String> {
            environment
                .get(key)
                .or_else(|| dotenv.get(key))
                .filter(|value| !value.trim().is_empty())
                .cloned()
        };

        let port = match lookup(PORT_KEY) {
            Some(value) => value
                .trim()
                .parse::<u16>()
                .map_err(|source| ConfigError::InvalidPort { value, source })?,
            None => DEFAULT_PORT,
        };

        let log_format = match lookup(LOG_FORMAT_KEY) {
            Some(value) => LogFormat::from_str(value.trim())
                .map_err(|source| ConfigError::InvalidLogFormat { value, source })?,
            None => default_log_format(),
        };

        let server_command = match lookup(SERVER_COMMAND_KEY) {
            Some(value) => parse_command(&value)?,
            None => default_server_command(),
        };

        Ok(Self {
            app_password: lookup(APP_PASSWORD_KEY),
            ngrok_authtoken: lookup(NGROK_AUTHTOKEN_KEY),
            port,
            log_filter: lookup(LOG_FILTER_KEY).unwrap_or_else(|| default_log_filter().to_owned()),
            log_format,
            server_command,
            ngrok_binary: lookup(NGROK_BIN_KEY).unwrap_or_else(|| DEFAULT_NGROK_BINARY.to_owned()),
        })
    }
}

fn read_dotenv(path: &Path) -> Result<Layer, ConfigError> {
    if !path.exists() {
        return Ok(Layer::new());
    }
    let iter = dotenvy::from_path_iter(path).map_err(|source| ConfigError::ReadDotenv {
        path: path.to_path_buf(),
        source,
    })?;
    let mut layer = Layer::new();
    for item in iter {
        let (key, value) = item.map_err(|source| ConfigError::ReadDotenv {
            path: path.to_path_buf(),
            source,
        })?;
        layer.insert(key, value);
    }
    Ok(layer)
}

fn parse_command(value: &str) -> Result<Vec<String>, ConfigError> {
    let parts: Vec<String> = value.split_whitespace().map(str::to_owned).collect();
    if parts.is_empty() {
        return Err(ConfigError::EmptyServerCommand);
    }
    Ok(parts)
}

fn process_environment() -> impl Iterator<Item = (String, String)> {
    env::vars_os().filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}
