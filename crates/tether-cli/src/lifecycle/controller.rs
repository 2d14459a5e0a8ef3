//! Drives one run: start, connect, supervise, tear down.

use std::io::Write;
use std::process::ExitCode;
use std::thread;

use tracing::{debug, info, warn};

use super::banner::{
    write_connection_banner, write_editor_not_detected, write_running_notice, write_shutting_down,
    write_starting, write_temporary_passcode, write_tunnel_preamble,
};
use super::{
    InterruptSignal, LIFECYCLE_TARGET, LaunchPlan, LauncherOutput, LifecycleError, RunState,
    StateMachine,
};
use crate::cli::LaunchMode;
use crate::connectivity::ConnectivityStrategy;
use crate::monitor::{LogSignalMonitor, SignalKind};
use crate::passcode::{Passcode, obtain_passcode};
use crate::render::QrRenderer;
use crate::supervisor::{ProcessStatus, ServerLauncher, ServerProcess};

/// How a run ended.
#[derive(Debug)]
pub struct RunOutcome {
    history: Vec<RunState>,
    failure: Option<LifecycleError>,
}

impl RunOutcome {
    /// States visited, oldest first.
    #[must_use]
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// The fatal condition, absent for an operator-requested stop.
    #[must_use]
    pub const fn failure(&self) -> Option<&LifecycleError> {
        self.failure.as_ref()
    }

    /// Process exit status for this outcome.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        if self.failure.is_some() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// The external collaborators a run is wired to.
pub struct RunDeps<L, I, R> {
    /// Starts the server.
    pub launcher: L,
    /// Makes the server reachable.
    pub connectivity: Box<dyn ConnectivityStrategy>,
    /// Reports operator stop requests.
    pub interrupt: I,
    /// Renders the access link as a QR code.
    pub renderer: R,
}

/// State machine coordinating the server, connectivity, and the log monitor.
pub struct LifecycleController<L, I, R> {
    plan: LaunchPlan,
    deps: RunDeps<L, I, R>,
    state: StateMachine,
}

impl<L, I, R> LifecycleController<L, I, R>
where
    L: ServerLauncher,
    I: InterruptSignal,
    R: QrRenderer,
{
    /// Prepares a controller in [`RunState::Idle`].
    pub fn new(plan: LaunchPlan, deps: RunDeps<L, I, R>) -> Self {
        Self {
            plan,
            deps,
            state: StateMachine::default(),
        }
    }

    /// Runs to completion, reporting any fatal condition on stderr.
    pub fn run<W: Write, E: Write>(mut self, output: &mut LauncherOutput<W, E>) -> RunOutcome {
        let failure = self.drive(output).err();
        if let Some(error) = &failure {
            warn!(target: LIFECYCLE_TARGET, %error, "run failed");
            if let Err(report_error) = output.stderr_line(format_args!("❌ {error}")) {
                warn!(target: LIFECYCLE_TARGET, error = %report_error, "failed to report failure");
            }
        }
        RunOutcome {
            history: self.state.history().to_vec(),
            failure,
        }
    }

    fn drive<W: Write, E: Write>(
        &mut self,
        output: &mut LauncherOutput<W, E>,
    ) -> Result<(), LifecycleError> {
        self.state.advance(RunState::Starting)?;
        let mut started = match self.start_server(output) {
            Ok(started) => started,
            Err(error) => {
                self.state.advance(RunState::Stopped)?;
                return Err(error);
            }
        };

        let supervised = self.connect_and_supervise(&mut started, output);
        self.shut_down(&mut started.0);
        supervised
    }

    fn start_server<W: Write, E: Write>(
        &mut self,
        output: &mut LauncherOutput<W, E>,
    ) -> Result<(L::Process, Passcode), LifecycleError> {
        let obtained = obtain_passcode(self.plan.configured_passcode());
        if obtained.is_generated() {
            write_temporary_passcode(output, &obtained.passcode)?;
        }
        write_starting(output, self.plan.mode())?;

        let request = self.plan.launch_request(&obtained.passcode);
        let process = self.deps.launcher.start(&request)?;
        info!(target: LIFECYCLE_TARGET, pid = process.id(), mode = %self.plan.mode(), "server started");
        Ok((process, obtained.passcode))
    }

    fn connect_and_supervise<W: Write, E: Write>(
        &mut self,
        (process, passcode): &mut (L::Process, Passcode),
        output: &mut LauncherOutput<W, E>,
    ) -> Result<(), LifecycleError> {
        if self.deps.interrupt.is_requested() {
            announce_shutdown(output);
            return Ok(());
        }
        if self.plan.mode() == LaunchMode::Tunnel {
            write_tunnel_preamble(output, self.plan.auth_token_configured())?;
        }
        let connectivity = self
            .deps
            .connectivity
            .resolve(self.plan.port(), passcode)?;
        let qr = match self.deps.renderer.render(connectivity.access_url()) {
            Ok(art) => Some(art),
            Err(error) => {
                warn!(target: LIFECYCLE_TARGET, %error, "skipping QR code");
                None
            }
        };
        write_connection_banner(output, &connectivity, passcode, qr.as_deref())?;
        write_running_notice(output, self.plan.sink_path())?;

        self.state.advance(RunState::Running)?;
        self.supervise(process, output)
    }

    fn supervise<W: Write, E: Write>(
        &self,
        process: &mut L::Process,
        output: &mut LauncherOutput<W, E>,
    ) -> Result<(), LifecycleError> {
        let mut monitor = LogSignalMonitor::new(self.plan.sink_path());
        loop {
            if self.deps.interrupt.is_requested() {
                info!(target: LIFECYCLE_TARGET, "stop requested");
                announce_shutdown(output);
                return Ok(());
            }
            thread::sleep(self.plan.poll_interval());

            if let ProcessStatus::Exited { code } = process.poll_status() {
                return Err(LifecycleError::ServerDied { code });
            }
            for signal in monitor.poll_new_signals() {
                match signal {
                    SignalKind::EditorNotDetected => {
                        if let Err(error) = write_editor_not_detected(output) {
                            warn!(target: LIFECYCLE_TARGET, %error, "failed to report editor diagnostic");
                        }
                    }
                }
            }
        }
    }

    /// Runs every teardown step; failures are logged so later steps still run.
    fn shut_down(&mut self, process: &mut L::Process) {
        if let Err(error) = self.state.advance(RunState::ShuttingDown) {
            warn!(target: LIFECYCLE_TARGET, %error, "unexpected state during teardown");
        }
        match process.terminate(self.plan.stop_grace()) {
            Ok(outcome) => debug!(target: LIFECYCLE_TARGET, ?outcome, "server terminated"),
            Err(error) => warn!(target: LIFECYCLE_TARGET, %error, "failed to terminate server"),
        }
        if let Err(error) = self.deps.connectivity.release() {
            warn!(target: LIFECYCLE_TARGET, %error, "failed to release connectivity");
        }
        if let Err(error) = self.state.advance(RunState::Stopped) {
            warn!(target: LIFECYCLE_TARGET, %error, "unexpected state during teardown");
        }
    }
}

/// An operator stop is not a failure, even when stdout is gone.
fn announce_shutdown<W: Write, E: Write>(output: &mut LauncherOutput<W, E>) {
    if let Err(error) = write_shutting_down(output) {
        warn!(target: LIFECYCLE_TARGET, %error, "failed to announce shutdown");
    }
}
