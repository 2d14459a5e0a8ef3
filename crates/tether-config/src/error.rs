use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

use crate::logging::LogFormatParseError;

/// Errors raised while resolving the launcher configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The dotenv file exists but could not be read or parsed.
    #[error("failed to read environment file '{path}': {source}")]
    ReadDotenv {
        /// Location of the dotenv file.
        path: PathBuf,
        /// Underlying dotenv error.
        #[source]
        source: dotenvy::Error,
    },
    /// `PORT` did not hold a valid TCP port number.
    #[error("PORT must be an integer between 0 and 65535, got '{value}': {source}")]
    InvalidPort {
        /// Raw configured value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: ParseIntError,
    },
    /// The configured log format is not recognised.
    #[error("unsupported log format '{value}' (expected 'json' or 'compact'): {source}")]
    InvalidLogFormat {
        /// Raw configured value.
        value: String,
        /// Underlying parse error.
        #[source]
        source: LogFormatParseError,
    },
    /// The server command override contained no program.
    #[error("TETHER_SERVER_COMMAND must name a program to run")]
    EmptyServerCommand,
    /// The working directory could not be determined.
    #[error("failed to resolve the launcher working directory: {source}")]
    WorkingDirectory {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
