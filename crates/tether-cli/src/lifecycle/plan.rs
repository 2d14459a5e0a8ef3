//! The fixed inputs of one run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tether_config::{APP_PASSWORD_KEY, Config, LauncherPaths};

use crate::cli::LaunchMode;
use crate::passcode::Passcode;
use crate::supervisor::LaunchRequest;

/// Interval between supervision passes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Time the server gets to exit after a stop request before it is killed.
pub const STOP_GRACE: Duration = Duration::from_secs(2);

/// Everything the controller needs that does not change during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    mode: LaunchMode,
    port: u16,
    configured_passcode: Option<String>,
    auth_token_configured: bool,
    program: String,
    args: Vec<String>,
    working_dir: PathBuf,
    sink_path: PathBuf,
    poll_interval: Duration,
    stop_grace: Duration,
}

impl LaunchPlan {
    /// Derives the plan from resolved configuration.
    #[must_use]
    pub fn new(mode: LaunchMode, config: &Config, paths: &LauncherPaths) -> Self {
        let (program, args) = match config.server_command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        Self {
            mode,
            port: config.port,
            configured_passcode: config.app_password.clone(),
            auth_token_configured: config.ngrok_authtoken.is_some(),
            program,
            args,
            working_dir: paths.base_dir().to_path_buf(),
            sink_path: paths.sink_path().to_path_buf(),
            poll_interval: POLL_INTERVAL,
            stop_grace: STOP_GRACE,
        }
    }

    /// Overrides the supervision cadence.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the termination grace window.
    #[must_use]
    pub const fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    /// Selected connectivity mode.
    #[must_use]
    pub const fn mode(&self) -> LaunchMode {
        self.mode
    }

    /// Port the server listens on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Operator-fixed passcode, if any.
    #[must_use]
    pub fn configured_passcode(&self) -> Option<&str> {
        self.configured_passcode.as_deref()
    }

    /// Whether a tunnel auth token is available.
    #[must_use]
    pub const fn auth_token_configured(&self) -> bool {
        self.auth_token_configured
    }

    /// Location of the server log.
    #[must_use]
    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    /// Supervision cadence.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Termination grace window.
    #[must_use]
    pub const fn stop_grace(&self) -> Duration {
        self.stop_grace
    }

    /// Spawn instructions sharing `passcode` with the server.
    #[must_use]
    pub fn launch_request(&self, passcode: &Passcode) -> LaunchRequest {
        LaunchRequest::new(&self.program, &self.sink_path)
            .with_args(&self.args)
            .with_working_dir(&self.working_dir)
            .with_env(APP_PASSWORD_KEY, passcode.as_str())
    }
}
