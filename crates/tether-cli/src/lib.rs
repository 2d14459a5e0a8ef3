//! Launcher runtime for the tether phone-connect server.
//!
//! [`run`] parses the command line, loads configuration, installs logging
//! and signal handlers, and hands over to the
//! [`lifecycle::LifecycleController`]. Streams are injected so the whole
//! entrypoint can be driven from tests.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use thiserror::Error;
use tether_config::{Config, ConfigError, LauncherPaths};

pub mod cli;
pub mod connectivity;
pub mod lifecycle;
pub mod monitor;
pub mod passcode;
pub mod render;
pub mod supervisor;
pub mod telemetry;
pub mod tunnel;

use cli::Cli;
use lifecycle::{
    LaunchPlan, LauncherOutput, LifecycleController, RunDeps, ShutdownError, SystemInterrupt,
};
use render::TerminalQrRenderer;
use supervisor::SystemLauncher;
use telemetry::TelemetryError;

/// Failures that stop the launcher before a run begins.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(#[source] ConfigError),
    /// Logging could not be set up.
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    /// Signal handlers could not be installed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Supplies the configuration for a run.
pub(crate) trait ConfigLoader {
    fn load(&self) -> Result<(Config, LauncherPaths), AppError>;
}

/// Reads `.env` from the working directory, layered under the environment.
pub(crate) struct DotenvConfigLoader;

impl ConfigLoader for DotenvConfigLoader {
    fn load(&self) -> Result<(Config, LauncherPaths), AppError> {
        let paths = LauncherPaths::current().map_err(AppError::LoadConfiguration)?;
        let config = Config::load_in(&paths).map_err(AppError::LoadConfiguration)?;
        Ok((config, paths))
    }
}

/// Runs the launcher and returns the process exit status.
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with_loader(args, stdout, stderr, &DotenvConfigLoader)
}

pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => return report_usage(&error, stdout, stderr),
    };

    let prepared = loader.load().and_then(|(config, paths)| {
        telemetry::initialise(&config)?;
        let interrupt = SystemInterrupt::install()?;
        Ok((config, paths, interrupt))
    });
    let (config, paths, interrupt) = match prepared {
        Ok(prepared) => prepared,
        Err(error) => {
            let _ = writeln!(stderr, "❌ {error}");
            return ExitCode::FAILURE;
        }
    };

    let plan = LaunchPlan::new(cli.mode, &config, &paths);
    let deps = RunDeps {
        launcher: SystemLauncher::default(),
        connectivity: connectivity::strategy_for(cli.mode, &config, &paths),
        interrupt,
        renderer: TerminalQrRenderer,
    };
    let mut output = LauncherOutput::new(&mut *stdout, &mut *stderr);
    LifecycleController::new(plan, deps)
        .run(&mut output)
        .exit_code()
}

fn report_usage<W: Write, E: Write>(
    error: &clap::Error,
    stdout: &mut W,
    stderr: &mut E,
) -> ExitCode {
    let rendered = error.render();
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            let _ = write!(stdout, "{rendered}");
            ExitCode::SUCCESS
        }
        _ => {
            let _ = write!(stderr, "{rendered}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
