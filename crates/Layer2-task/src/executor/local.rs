//! Local launcher - runs commands on the host through the platform shell
//!
//! Each launched process gets one driver task that owns the `Child`:
//! - stdout/stderr chunks from the reader tasks are appended to the record
//! - the exit status is collected with `wait()`
//! - stop requests are answered through a control channel
//! - SIGTERM -> SIGKILL escalation after the configured grace period
//!
//! The record is finalized only once the exit has been observed *and* both
//! streams are closed, so the exit diagnostic is always the last chunk.

use crate::collector::{self, forward_stream, OutputChunk, OutputStream};
use crate::command::CommandLine;
use crate::executor::signal::{self, exit_signal, Delivery};
use crate::lifecycle;
use crate::process::{ProcessHandle, ProcessRecord};
use bgproc_foundation::{Error, Result, SupervisorConfig};
use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Request sent from the supervisor to a driver
#[derive(Debug)]
pub(crate) enum ControlRequest {
    /// Deliver SIGTERM and report what happened
    Terminate {
        reply: oneshot::Sender<TerminateReply>,
    },
}

/// Driver's answer to [`ControlRequest::Terminate`]
#[derive(Debug)]
pub(crate) enum TerminateReply {
    Sent,
    AlreadyExited { exit_code: Option<i32> },
    Failed(String),
}

/// Spawns commands and their drivers
#[derive(Debug, Clone)]
pub struct LocalLauncher {
    config: Arc<SupervisorConfig>,
}

impl LocalLauncher {
    pub fn new(config: Arc<SupervisorConfig>) -> Self {
        Self { config }
    }

    /// Shell binary and the flag that makes it run a command string
    fn shell(&self) -> (String, &'static str) {
        #[cfg(windows)]
        let (default, flag) = ("cmd", "/C");
        #[cfg(not(windows))]
        let (default, flag) = ("sh", "-c");

        let shell = self
            .config
            .shell
            .clone()
            .unwrap_or_else(|| default.to_string());
        (shell, flag)
    }

    /// Spawn `command` in `working_dir` and start its driver.
    ///
    /// Fails with [`Error::Spawn`] if the OS cannot create the process; in that
    /// case no record exists.
    pub(crate) fn launch(
        &self,
        command: &CommandLine,
        working_dir: &Path,
    ) -> Result<Arc<ProcessRecord>> {
        let shell_line = command.to_shell_line()?;
        let (shell, flag) = self.shell();

        let mut cmd = Command::new(&shell);
        cmd.arg(flag);
        #[cfg(windows)]
        cmd.raw_arg(&shell_line);
        #[cfg(not(windows))]
        cmd.arg(&shell_line);

        cmd.current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 호스트가 종료되어도 자식은 살려둠
            .kill_on_drop(false);

        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| {
            Error::Spawn(format!(
                "{} (command: '{}', cwd: '{}')",
                e,
                shell_line,
                working_dir.display()
            ))
        })?;

        let handle = ProcessHandle::new();
        let pid = child.id();
        debug!("Process {} spawned with pid {:?}", handle, pid);

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let record = Arc::new(ProcessRecord::new(
            handle,
            shell_line,
            working_dir,
            pid,
            control_tx,
        ));

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_stream(
                stdout,
                OutputStream::Stdout,
                chunk_tx.clone(),
                handle,
            ));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stream(
                stderr,
                OutputStream::Stderr,
                chunk_tx,
                handle,
            ));
        }

        let driver = ProcessDriver {
            record: Arc::clone(&record),
            child,
            chunks: chunk_rx,
            control: control_rx,
            kill_grace: self.config.kill_grace_period(),
        };
        tokio::spawn(driver.run());

        Ok(record)
    }
}

/// How the child ended, as seen by `wait()`
#[derive(Debug)]
enum Exit {
    Status(ExitStatus),
    WaitFailed(io::Error),
}

impl Exit {
    fn code(&self) -> Option<i32> {
        match self {
            Exit::Status(status) => status.code(),
            Exit::WaitFailed(_) => None,
        }
    }
}

/// Owns the child for its whole life
struct ProcessDriver {
    record: Arc<ProcessRecord>,
    child: Child,
    chunks: mpsc::UnboundedReceiver<OutputChunk>,
    control: mpsc::UnboundedReceiver<ControlRequest>,
    kill_grace: Option<Duration>,
}

/// Resolves at `deadline`, or never when there is none.
async fn deadline_reached(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl ProcessDriver {
    async fn run(mut self) {
        let handle = self.record.handle;
        let mut exit: Option<Exit> = None;
        let mut streams_open = true;
        let mut control_open = true;
        let mut kill_deadline: Option<Instant> = None;
        let mut escalated = false;

        while exit.is_none() || streams_open {
            tokio::select! {
                chunk = self.chunks.recv(), if streams_open => match chunk {
                    Some(chunk) => collector::collect(&self.record, chunk),
                    None => {
                        debug!("Process {} streams closed", handle);
                        streams_open = false;
                    }
                },
                status = self.child.wait(), if exit.is_none() => {
                    kill_deadline = None;
                    match &status {
                        Ok(status) => debug!("Process {} exited: {}", handle, status),
                        Err(e) => warn!("Process {} wait failed: {}", handle, e),
                    }
                    exit = Some(match status {
                        Ok(status) => Exit::Status(status),
                        Err(e) => Exit::WaitFailed(e),
                    });
                }
                request = self.control.recv(), if control_open => match request {
                    Some(request) => {
                        let deadline = self.handle_control(request, exit.as_ref());
                        // 첫 SIGTERM 기준으로 한 번만 설정 (반복 stop으로 연기되지 않음)
                        if kill_deadline.is_none() && !escalated {
                            kill_deadline = deadline;
                        }
                    }
                    None => control_open = false,
                },
                _ = deadline_reached(kill_deadline), if kill_deadline.is_some() && exit.is_none() => {
                    kill_deadline = None;
                    escalated = true;
                    self.escalate();
                }
            }
        }

        match exit {
            Some(Exit::Status(status)) => {
                lifecycle::on_exit(&self.record, status.code(), exit_signal(&status));
            }
            Some(Exit::WaitFailed(e)) => {
                lifecycle::on_failure(&self.record, &format!("Failed to wait for process: {}", e));
            }
            None => {}
        }
    }

    /// Returns the SIGKILL deadline when a SIGTERM was just delivered.
    fn handle_control(&mut self, request: ControlRequest, exit: Option<&Exit>) -> Option<Instant> {
        let ControlRequest::Terminate { reply } = request;

        let outcome = match exit {
            Some(exit) => TerminateReply::AlreadyExited {
                exit_code: exit.code(),
            },
            None => match signal::send_sigterm(&mut self.child) {
                Delivery::Sent => {
                    info!("Sent SIGTERM to process {}", self.record.handle);
                    TerminateReply::Sent
                }
                Delivery::ProcessGone => TerminateReply::AlreadyExited { exit_code: None },
                Delivery::Failed(e) => TerminateReply::Failed(e.to_string()),
            },
        };

        let deadline = match outcome {
            TerminateReply::Sent => self.kill_grace.map(|grace| Instant::now() + grace),
            _ => None,
        };
        if reply.send(outcome).is_err() {
            debug!("Process {} stop requester went away", self.record.handle);
        }
        deadline
    }

    fn escalate(&mut self) {
        let Some(grace) = self.kill_grace else {
            return;
        };
        match self.child.start_kill() {
            Ok(()) => lifecycle::on_escalation(&self.record, grace),
            Err(e) => warn!("Process {} SIGKILL failed: {}", self.record.handle, e),
        }
    }
}
