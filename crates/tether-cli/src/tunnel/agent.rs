//! Tunnels backed by a locally spawned `ngrok` agent.

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use super::{AgentEvent, HostHeader, TUNNEL_TARGET, Tunnel, TunnelClient, TunnelError, parse_agent_line};
use crate::supervisor::terminate_child;

/// Upper bound on waiting for the agent to report its public URL.
pub const TUNNEL_START_TIMEOUT: Duration = Duration::from_secs(30);

const AGENT_STOP_GRACE: Duration = Duration::from_secs(2);

/// Environment variable the agent reads its account token from.
const AUTH_TOKEN_ENV: &str = "NGROK_AUTHTOKEN";

/// Drives the `ngrok` command-line agent.
#[derive(Debug)]
pub struct NgrokAgent {
    binary: PathBuf,
    auth_token: Option<String>,
    start_timeout: Duration,
    agents: Vec<Child>,
}

impl NgrokAgent {
    /// Creates a client that runs `binary`.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            auth_token: None,
            start_timeout: TUNNEL_START_TIMEOUT,
            agents: Vec::new(),
        }
    }

    /// Overrides how long `connect` waits for the public URL.
    #[must_use]
    pub const fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    fn command(&self, local_address: &str, host_header: HostHeader) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(["http", local_address]);
        if let Some(flag) = host_header.as_flag() {
            command.arg(flag);
        }
        command.args(["--log=stdout", "--log-format=json"]);
        if let Some(token) = &self.auth_token {
            command.env(AUTH_TOKEN_ENV, token);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        command
    }

    fn spawn(&self, local_address: &str, host_header: HostHeader) -> Result<Child, TunnelError> {
        self.command(local_address, host_header)
            .spawn()
            .map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    TunnelError::AgentNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    TunnelError::Spawn {
                        binary: self.binary.clone(),
                        source,
                    }
                }
            })
    }

    fn await_public_url(&self, events: &Receiver<AgentEvent>) -> Result<String, TunnelError> {
        let deadline = Instant::now() + self.start_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match events.recv_timeout(remaining) {
                Ok(AgentEvent::TunnelStarted { url }) => return Ok(url),
                Ok(AgentEvent::Failed { message }) => {
                    return Err(TunnelError::Rejected { message });
                }
                Ok(AgentEvent::Other) => {}
                Ok(AgentEvent::Exited) | Err(RecvTimeoutError::Disconnected) => {
                    return Err(TunnelError::AgentExited);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(TunnelError::Timeout {
                        waited: self.start_timeout,
                    });
                }
            }
        }
    }
}

impl TunnelClient for NgrokAgent {
    fn set_auth_token(&mut self, token: &str) {
        self.auth_token = Some(token.to_owned());
    }

    fn connect(
        &mut self,
        local_address: &str,
        host_header: HostHeader,
    ) -> Result<Tunnel, TunnelError> {
        let mut child = self.spawn(local_address, host_header)?;
        debug!(
            target: TUNNEL_TARGET,
            pid = child.id(),
            binary = %self.binary.display(),
            local_address,
            "tunnel agent spawned"
        );
        let Some(stdout) = child.stdout.take() else {
            stop_agent(&mut child);
            return Err(TunnelError::AgentExited);
        };
        let events = forward_events(stdout);

        match self.await_public_url(&events) {
            Ok(url) => {
                info!(target: TUNNEL_TARGET, public_url = %url, "tunnel established");
                self.agents.push(child);
                Ok(Tunnel::new(url))
            }
            Err(error) => {
                warn!(target: TUNNEL_TARGET, %error, "tunnel establishment failed");
                stop_agent(&mut child);
                Err(error)
            }
        }
    }

    fn disconnect_all(&mut self) -> Result<(), TunnelError> {
        let mut first_error = None;
        for mut child in self.agents.drain(..) {
            match terminate_child(&mut child, AGENT_STOP_GRACE) {
                Ok((outcome, _)) => {
                    debug!(target: TUNNEL_TARGET, pid = child.id(), ?outcome, "tunnel agent stopped");
                }
                Err(source) => {
                    first_error.get_or_insert(TunnelError::Stop { source });
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Drop for NgrokAgent {
    fn drop(&mut self) {
        for child in &mut self.agents {
            stop_agent(child);
        }
    }
}

fn stop_agent(child: &mut Child) {
    if let Err(error) = terminate_child(child, AGENT_STOP_GRACE) {
        warn!(target: TUNNEL_TARGET, pid = child.id(), %error, "failed to stop tunnel agent");
    }
}

/// Streams parsed log events from the agent until its stdout closes.
fn forward_events(stdout: ChildStdout) -> Receiver<AgentEvent> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            let event = parse_agent_line(&line);
            if event != AgentEvent::Other {
                debug!(target: TUNNEL_TARGET, ?event, "tunnel agent event");
            }
            // Keep draining after the receiver is gone so the agent never
            // blocks on a full pipe.
            if sender.send(event).is_err() {
                trace!(target: TUNNEL_TARGET, "tunnel event dropped");
            }
        }
        if sender.send(AgentEvent::Exited).is_err() {
            trace!(target: TUNNEL_TARGET, "agent exit went unobserved");
        }
    });
    receiver
}
