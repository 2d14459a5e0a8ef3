//! Fakes and harness for lifecycle behavioural coverage.
//!
//! The fakes share one [`Record`] so scenarios can assert how often the
//! controller touched each collaborator.

use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

use rstest::fixture;
use tempfile::TempDir;
use tether_config::{Config, LauncherPaths};

use crate::cli::LaunchMode;
use crate::connectivity::{
    ConnectivityError, ConnectivityResult, ConnectivityStrategy, PASSCODE_QUERY_KEY,
};
use crate::lifecycle::{
    InterruptSignal, LaunchPlan, LauncherOutput, LifecycleController, RunDeps, RunOutcome,
};
use crate::passcode::Passcode;
use crate::render::{QrRenderer, RenderError};
use crate::supervisor::{
    LaunchError, LaunchRequest, ProcessStatus, ServerLauncher, ServerProcess, TerminationOutcome,
};
use crate::tunnel::TunnelError;

pub(super) const PUBLIC_URL: &str = "https://tether-test.ngrok-free.app";
pub(super) const LAN_URL: &str = "http://192.168.1.20:3000";
const SAFETY_POLL_LIMIT: usize = 1_000;
const RUNNING_NOTICE_END: &str = "Press Ctrl+C to stop.\n";

/// Calls observed across all fakes.
#[derive(Debug, Default)]
pub(super) struct Record {
    pub(super) requests: Vec<LaunchRequest>,
    pub(super) polls: usize,
    pub(super) terminations: usize,
    pub(super) resolves: usize,
    pub(super) releases: usize,
}

type Shared = Rc<RefCell<Record>>;

#[derive(Debug, Clone, Copy, Default)]
pub(super) enum ServerBehaviour {
    #[default]
    StaysUp,
    ExitsAfter {
        polls: usize,
        code: i32,
    },
    CrashesOnStart {
        code: i32,
    },
}

struct FakeLauncher {
    record: Shared,
    behaviour: ServerBehaviour,
    log_lines: Vec<String>,
}

impl ServerLauncher for FakeLauncher {
    type Process = FakeProcess;

    fn start(&self, request: &LaunchRequest) -> Result<Self::Process, LaunchError> {
        self.record.borrow_mut().requests.push(request.clone());
        let mut log = String::from("--- Server Started at 2026-10-14T09:30:00Z ---\n");
        for line in &self.log_lines {
            log.push_str(line);
            log.push('\n');
        }
        fs::write(request.sink_path(), log).map_err(|source| LaunchError::PrepareSink {
            path: request.sink_path().to_path_buf(),
            source,
        })?;
        match self.behaviour {
            ServerBehaviour::CrashesOnStart { code } => {
                Err(LaunchError::EarlyExit { code: Some(code) })
            }
            behaviour => Ok(FakeProcess {
                record: Rc::clone(&self.record),
                behaviour,
                exited: None,
            }),
        }
    }
}

struct FakeProcess {
    record: Shared,
    behaviour: ServerBehaviour,
    exited: Option<i32>,
}

impl ServerProcess for FakeProcess {
    fn id(&self) -> u32 {
        4242
    }

    fn poll_status(&mut self) -> ProcessStatus {
        let polls = {
            let mut record = self.record.borrow_mut();
            record.polls += 1;
            record.polls
        };
        if let ServerBehaviour::ExitsAfter { polls: limit, code } = self.behaviour {
            if polls >= limit {
                self.exited = Some(code);
            }
        }
        if polls >= SAFETY_POLL_LIMIT {
            panic!("supervision loop never stopped");
        }
        match self.exited {
            Some(code) => ProcessStatus::Exited { code: Some(code) },
            None => ProcessStatus::Running,
        }
    }

    fn terminate(&mut self, _grace: Duration) -> std::io::Result<TerminationOutcome> {
        self.record.borrow_mut().terminations += 1;
        if self.exited.is_some() {
            return Ok(TerminationOutcome::AlreadyExited);
        }
        self.exited = Some(-1);
        Ok(TerminationOutcome::Graceful)
    }
}

struct FakeConnectivity {
    record: Shared,
    mode: LaunchMode,
    fails: bool,
}

impl ConnectivityStrategy for FakeConnectivity {
    fn mode(&self) -> LaunchMode {
        self.mode
    }

    fn resolve(
        &mut self,
        _port: u16,
        passcode: &Passcode,
    ) -> Result<ConnectivityResult, ConnectivityError> {
        self.record.borrow_mut().resolves += 1;
        if self.fails {
            return Err(ConnectivityError::TunnelFailed {
                local_address: String::from("http://localhost:3000"),
                source: TunnelError::Rejected {
                    message: String::from("ERR_NGROK_108"),
                },
            });
        }
        Ok(match self.mode {
            LaunchMode::Local => ConnectivityResult::new(LAN_URL, LAN_URL, LaunchMode::Local),
            LaunchMode::Tunnel => ConnectivityResult::new(
                PUBLIC_URL,
                format!("{PUBLIC_URL}?{PASSCODE_QUERY_KEY}={passcode}"),
                LaunchMode::Tunnel,
            ),
        })
    }

    fn release(&mut self) -> Result<(), ConnectivityError> {
        self.record.borrow_mut().releases += 1;
        Ok(())
    }
}

/// Requests a stop once the process has been polled `after` times.
struct PollCountInterrupt {
    record: Shared,
    after: Option<usize>,
}

impl InterruptSignal for PollCountInterrupt {
    fn is_requested(&self) -> bool {
        self.after
            .is_some_and(|after| self.record.borrow().polls >= after)
    }
}

/// Captures stdout and, when asked, goes away once the banner is complete.
#[derive(Default)]
struct OperatorStdout {
    captured: Vec<u8>,
    close_after_banner: bool,
    closed: bool,
}

impl Write for OperatorStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"));
        }
        self.captured.extend_from_slice(buf);
        if self.close_after_banner
            && String::from_utf8_lossy(&self.captured).contains(RUNNING_NOTICE_END)
        {
            self.closed = true;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct PlainRenderer;

impl QrRenderer for PlainRenderer {
    fn render(&self, text: &str) -> Result<String, RenderError> {
        Ok(format!("[qr {text}]\n"))
    }
}

pub(super) struct TestWorld {
    dir: TempDir,
    pub(super) mode: LaunchMode,
    pub(super) configured_passcode: Option<String>,
    pub(super) behaviour: ServerBehaviour,
    pub(super) tunnel_fails: bool,
    pub(super) interrupt_after: Option<usize>,
    pub(super) log_lines: Vec<String>,
    pub(super) stdout_closes_after_banner: bool,
    pub(super) record: Shared,
    pub(super) outcome: Option<RunOutcome>,
    pub(super) stdout: String,
    pub(super) stderr: String,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self {
            dir: tempfile::tempdir().expect("temp dir"),
            mode: LaunchMode::Tunnel,
            configured_passcode: None,
            behaviour: ServerBehaviour::default(),
            tunnel_fails: false,
            interrupt_after: None,
            log_lines: Vec::new(),
            stdout_closes_after_banner: false,
            record: Shared::default(),
            outcome: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

impl TestWorld {
    pub(super) fn run(&mut self) {
        let config = Config {
            app_password: self.configured_passcode.clone(),
            ..Config::default()
        };
        let paths = LauncherPaths::from_dir(self.dir.path());
        let plan = LaunchPlan::new(self.mode, &config, &paths)
            .with_poll_interval(Duration::from_millis(1))
            .with_stop_grace(Duration::from_millis(10));
        let deps = RunDeps {
            launcher: FakeLauncher {
                record: Rc::clone(&self.record),
                behaviour: self.behaviour,
                log_lines: self.log_lines.clone(),
            },
            connectivity: Box::new(FakeConnectivity {
                record: Rc::clone(&self.record),
                mode: self.mode,
                fails: self.tunnel_fails,
            }),
            interrupt: PollCountInterrupt {
                record: Rc::clone(&self.record),
                after: self.interrupt_after,
            },
            renderer: PlainRenderer,
        };

        let mut stdout = OperatorStdout {
            close_after_banner: self.stdout_closes_after_banner,
            ..OperatorStdout::default()
        };
        let mut stderr = Vec::new();
        let mut output = LauncherOutput::new(&mut stdout, &mut stderr);
        let outcome = LifecycleController::new(plan, deps).run(&mut output);
        self.stdout = String::from_utf8(stdout.captured).expect("stdout utf8");
        self.stderr = String::from_utf8(stderr).expect("stderr utf8");
        self.outcome = Some(outcome);
    }

    pub(super) fn outcome(&self) -> &RunOutcome {
        self.outcome.as_ref().expect("launcher has not run")
    }
}

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}
