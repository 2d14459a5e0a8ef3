//! Spawning the server with its output redirected into the sink.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::sink::prepare_sink;
use super::termination::{TerminationOutcome, terminate_child};
use super::{LaunchError, ProcessStatus, SUPERVISOR_TARGET, ServerLauncher, ServerProcess};

/// Time the server must stay alive before startup counts as successful.
pub const STARTUP_GRACE: Duration = Duration::from_secs(2);

const STARTUP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Everything required to start the server once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    program: OsString,
    args: Vec<OsString>,
    working_dir: Option<PathBuf>,
    env: Vec<(OsString, OsString)>,
    sink_path: PathBuf,
}

impl LaunchRequest {
    /// Builds a request for `program` writing its output to `sink_path`.
    pub fn new(program: impl Into<OsString>, sink_path: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: Vec::new(),
            sink_path: sink_path.into(),
        }
    }

    /// Appends command-line arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable on top of the inherited environment.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Runs the server from `dir`.
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Program to execute.
    #[must_use]
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments passed to the program.
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Extra environment entries.
    #[must_use]
    pub fn env(&self) -> &[(OsString, OsString)] {
        &self.env
    }

    /// Looks up an extra environment entry by key.
    #[must_use]
    pub fn env_value(&self, key: &str) -> Option<&OsStr> {
        self.env
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_os_str())
    }

    /// Location of the output sink.
    #[must_use]
    pub fn sink_path(&self) -> &Path {
        &self.sink_path
    }

    fn command(&self, sink: &File) -> io::Result<Command> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .envs(self.env.iter().map(|(key, value)| (key, value)))
            .stdin(Stdio::null())
            .stdout(Stdio::from(sink.try_clone()?))
            .stderr(Stdio::from(sink.try_clone()?));
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Own group so terminal interrupts reach the launcher only.
            command.process_group(0);
        }
        Ok(command)
    }
}

/// Starts the server as a real OS process.
#[derive(Debug, Clone, Copy)]
pub struct SystemLauncher {
    grace_period: Duration,
}

impl SystemLauncher {
    /// Creates a launcher with a custom startup grace period.
    #[must_use]
    pub const fn with_grace_period(grace_period: Duration) -> Self {
        Self { grace_period }
    }
}

impl Default for SystemLauncher {
    fn default() -> Self {
        Self::with_grace_period(STARTUP_GRACE)
    }
}

impl ServerLauncher for SystemLauncher {
    type Process = ChildProcess;

    fn start(&self, request: &LaunchRequest) -> Result<Self::Process, LaunchError> {
        let prepare_error = |source| LaunchError::PrepareSink {
            path: request.sink_path().to_path_buf(),
            source,
        };
        let sink = prepare_sink(request.sink_path()).map_err(prepare_error)?;
        let mut command = request.command(&sink).map_err(prepare_error)?;

        let mut child = command.spawn().map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                LaunchError::ExecutableNotFound {
                    program: request.program().to_os_string(),
                }
            } else {
                LaunchError::SpawnRefused {
                    program: request.program().to_os_string(),
                    source,
                }
            }
        })?;
        let pid = child.id();
        debug!(
            target: SUPERVISOR_TARGET,
            pid,
            program = ?request.program(),
            sink = %request.sink_path().display(),
            "server spawned"
        );

        if let Some(status) = wait_for_early_exit(&mut child, self.grace_period)? {
            warn!(target: SUPERVISOR_TARGET, pid, ?status, "server exited during startup grace");
            return Err(LaunchError::EarlyExit {
                code: status.code(),
            });
        }
        info!(target: SUPERVISOR_TARGET, pid, "server survived startup grace");
        Ok(ChildProcess {
            child,
            _sink: sink,
            exit: None,
        })
    }
}

fn wait_for_early_exit(
    child: &mut Child,
    grace: Duration,
) -> Result<Option<ExitStatus>, LaunchError> {
    let deadline = Instant::now() + grace;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if Instant::now() >= deadline => return Ok(None),
            Ok(None) => thread::sleep(STARTUP_POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::Monitor { source });
            }
        }
    }
}

/// A running server owned by the launcher.
///
/// Dropping it kills the process if it is still alive.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    _sink: File,
    exit: Option<ExitStatus>,
}

impl ServerProcess for ChildProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn poll_status(&mut self) -> ProcessStatus {
        if let Some(status) = self.exit {
            return ProcessStatus::Exited {
                code: status.code(),
            };
        }
        match self.child.try_wait() {
            Ok(Some(status)) => {
                self.exit = Some(status);
                ProcessStatus::Exited {
                    code: status.code(),
                }
            }
            Ok(None) => ProcessStatus::Running,
            Err(error) => {
                warn!(target: SUPERVISOR_TARGET, pid = self.id(), %error, "failed to poll server");
                ProcessStatus::Running
            }
        }
    }

    fn terminate(&mut self, grace: Duration) -> io::Result<TerminationOutcome> {
        if self.exit.is_some() {
            return Ok(TerminationOutcome::AlreadyExited);
        }
        let (outcome, status) = terminate_child(&mut self.child, grace)?;
        self.exit = Some(status);
        Ok(outcome)
    }
}

impl Drop for ChildProcess {
    fn drop(&mut self) {
        if self.exit.is_none() && matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
