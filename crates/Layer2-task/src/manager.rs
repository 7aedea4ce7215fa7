//! Process Supervisor - start, poll, stop and shut down background processes
//!
//! Features:
//! - Non-blocking start through the platform shell
//! - Incremental output retrieval (each chunk is returned once)
//! - Graceful termination with optional SIGKILL escalation
//! - Shutdown that signals every running process

use crate::command::CommandLine;
use crate::executor::{ControlRequest, LocalLauncher, TerminateReply};
use crate::lifecycle;
use crate::process::{ProcessHandle, ProcessOutput, ProcessRecord, ProcessSummary, StartedProcess};
use crate::state::ProcessStatus;
use crate::store::ProcessStore;
use bgproc_foundation::{Error, Result, SupervisorConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Result of a stop request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StopOutcome {
    /// SIGTERM delivered; the process is still reported running until its
    /// exit is observed
    #[serde(rename = "termination_signal_sent")]
    SignalSent,

    /// Process had already finished
    AlreadyStopped {
        #[serde(rename = "finalStatus")]
        final_status: ProcessStatus,
    },

    /// Unknown handle
    NotFound,
}

/// What `shutdown` did
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShutdownReport {
    /// Processes that were sent SIGTERM
    pub signalled: Vec<ProcessHandle>,

    /// Processes whose termination failed
    pub failed: Vec<ProcessHandle>,

    /// Records dropped from the registry
    pub discarded: usize,
}

/// Process Supervisor - owns the registry and launches processes
#[derive(Clone)]
pub struct ProcessSupervisor {
    /// All records by handle
    store: Arc<ProcessStore>,

    /// Spawns children and their drivers
    launcher: Arc<LocalLauncher>,

    /// Configuration
    config: Arc<SupervisorConfig>,
}

impl ProcessSupervisor {
    /// Create a supervisor with the given configuration
    pub fn new(config: SupervisorConfig) -> Self {
        let config = Arc::new(config);
        Self {
            store: Arc::new(ProcessStore::new()),
            launcher: Arc::new(LocalLauncher::new(Arc::clone(&config))),
            config,
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Start `command_line` in the background.
    ///
    /// `working_dir` defaults to the configured directory (or the host's
    /// current directory). Returns as soon as the OS has created the process.
    pub async fn start(
        &self,
        command_line: &str,
        working_dir: Option<&Path>,
    ) -> Result<StartedProcess> {
        if command_line.is_empty() {
            return Err(Error::InvalidInput(
                "command must be a non-empty string".to_string(),
            ));
        }

        let working_dir = working_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.working_dir());

        let command = CommandLine::parse(command_line).map_err(|e| {
            warn!("Rejected command '{}': {}", command_line, e);
            e
        })?;

        info!(
            "Starting process: command='{}', cwd='{}'",
            command_line,
            working_dir.display()
        );

        let record = self.launcher.launch(&command, &working_dir).map_err(|e| {
            error!("Failed to start '{}': {}", command_line, e);
            e
        })?;
        let started = StartedProcess {
            handle: record.handle,
            status: record.status(),
            pid: record.pid,
        };
        self.store.insert(record).await;

        info!("Process {} started (pid {:?})", started.handle, started.pid);
        Ok(started)
    }

    /// Return status, exit code and everything printed since the last call.
    pub async fn get_output(&self, handle: &str) -> Result<ProcessOutput> {
        let record = self.lookup(handle).await.ok_or_else(|| {
            warn!("Output requested for non-existent process ID: {}", handle);
            Error::NotFound(format!("process {}", handle))
        })?;

        let output = record.drain();
        debug!(
            "Process {} output drained: {} stdout bytes, {} stderr bytes, status {}",
            record.handle,
            output.stdout.len(),
            output.stderr.len(),
            output.status
        );
        Ok(output)
    }

    /// Ask a process to terminate.
    ///
    /// Returning [`StopOutcome::SignalSent`] does not mean the process has
    /// exited; poll [`get_output`](Self::get_output) for that.
    pub async fn stop(&self, handle: &str) -> Result<StopOutcome> {
        let Some(record) = self.lookup(handle).await else {
            warn!("Stop requested for non-existent process ID: {}", handle);
            return Ok(StopOutcome::NotFound);
        };
        self.terminate(&record).await
    }

    /// Signal every running process, wait the configured grace period and
    /// discard the registry. Processes are not awaited.
    pub async fn shutdown(&self) -> ShutdownReport {
        info!("Shutting down, terminating managed processes...");

        let mut report = ShutdownReport::default();
        for record in self.store.running().await {
            match self.terminate(&record).await {
                Ok(StopOutcome::SignalSent) => report.signalled.push(record.handle),
                Ok(_) => {}
                Err(e) => {
                    error!("Failed to terminate process {} at shutdown: {}", record.handle, e);
                    report.failed.push(record.handle);
                }
            }
        }

        if !report.signalled.is_empty() {
            let grace = self.config.shutdown_grace_period();
            debug!("Waiting {:?} after signalling {} processes", grace, report.signalled.len());
            tokio::time::sleep(grace).await;
        }

        report.discarded = self.store.clear().await;
        info!(
            "Shutdown complete: {} signalled, {} failed, {} records discarded",
            report.signalled.len(),
            report.failed.len(),
            report.discarded
        );
        report
    }

    /// Summaries of all known processes, oldest first.
    pub async fn list(&self) -> Vec<ProcessSummary> {
        self.store
            .all()
            .await
            .iter()
            .map(|record| record.summary())
            .collect()
    }

    /// Number of processes still running
    pub async fn running_count(&self) -> usize {
        self.store.running().await.len()
    }

    async fn lookup(&self, handle: &str) -> Option<Arc<ProcessRecord>> {
        let handle = ProcessHandle::parse(handle)?;
        self.store.get(&handle).await
    }

    async fn terminate(&self, record: &Arc<ProcessRecord>) -> Result<StopOutcome> {
        let status = record.status();
        if status.is_terminal() {
            info!("Process {} already {}", record.handle, status);
            return Ok(StopOutcome::AlreadyStopped {
                final_status: status,
            });
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let reply = if record.request(ControlRequest::Terminate { reply: reply_tx }) {
            reply_rx.await.ok()
        } else {
            None
        };

        match reply {
            Some(TerminateReply::Sent) => {
                info!("Termination signal sent to process {}", record.handle);
                Ok(StopOutcome::SignalSent)
            }
            Some(TerminateReply::AlreadyExited { exit_code }) => {
                lifecycle::on_stop_found_exited(record, exit_code);
                Ok(StopOutcome::AlreadyStopped {
                    final_status: record.status(),
                })
            }
            // driver finished (and finalized) before it could answer
            None => {
                lifecycle::on_stop_found_exited(record, None);
                Ok(StopOutcome::AlreadyStopped {
                    final_status: record.status(),
                })
            }
            Some(TerminateReply::Failed(reason)) => {
                let message = format!("Failed to stop process: {}", reason);
                lifecycle::on_failure(record, &message);
                Err(Error::Internal(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> ProcessSupervisor {
        ProcessSupervisor::new(SupervisorConfig::default())
    }

    /// Register a record whose driver side is owned by the test
    async fn register(
        sup: &ProcessSupervisor,
    ) -> (
        Arc<ProcessRecord>,
        tokio::sync::mpsc::UnboundedReceiver<ControlRequest>,
    ) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let record = Arc::new(ProcessRecord::new(
            ProcessHandle::new(),
            "sleep 30".to_string(),
            Path::new("/tmp"),
            None,
            tx,
        ));
        sup.store.insert(Arc::clone(&record)).await;
        (record, rx)
    }

    #[tokio::test]
    async fn test_stop_when_driver_saw_exit() {
        let sup = supervisor();
        let (record, mut control) = register(&sup).await;

        // 드라이버가 이미 종료를 관찰한 경우
        tokio::spawn(async move {
            if let Some(ControlRequest::Terminate { reply }) = control.recv().await {
                let _ = reply.send(TerminateReply::AlreadyExited { exit_code: Some(0) });
            }
        });

        let outcome = sup.stop(&record.handle.to_string()).await.unwrap();
        assert_eq!(
            outcome,
            StopOutcome::AlreadyStopped {
                final_status: ProcessStatus::Exited
            }
        );
        assert_eq!(record.status(), ProcessStatus::Exited);
        assert_eq!(record.exit_code(), Some(0));
        assert!(record.ended_at().is_some());
    }

    #[tokio::test]
    async fn test_stop_when_driver_is_gone() {
        let sup = supervisor();
        let (record, control) = register(&sup).await;
        drop(control);

        let outcome = sup.stop(&record.handle.to_string()).await.unwrap();
        assert_eq!(
            outcome,
            StopOutcome::AlreadyStopped {
                final_status: ProcessStatus::Exited
            }
        );
        assert_eq!(record.exit_code(), None);

        // 종료 상태는 이후 stop에서도 유지됨
        assert_eq!(
            sup.stop(&record.handle.to_string()).await.unwrap(),
            StopOutcome::AlreadyStopped {
                final_status: ProcessStatus::Exited
            }
        );
    }

    #[tokio::test]
    async fn test_stop_delivery_failure_marks_error() {
        let sup = supervisor();
        let (record, mut control) = register(&sup).await;

        tokio::spawn(async move {
            if let Some(ControlRequest::Terminate { reply }) = control.recv().await {
                let _ = reply.send(TerminateReply::Failed("EPERM".to_string()));
            }
        });

        let result = sup.stop(&record.handle.to_string()).await;
        assert!(matches!(result, Err(Error::Internal(_))));

        let output = sup.get_output(&record.handle.to_string()).await.unwrap();
        assert_eq!(output.status, ProcessStatus::Error);
        assert_eq!(output.exit_code, None);
        assert!(output
            .stderr
            .contains("[Process Supervisor Error] Failed to stop process: EPERM"));
    }

    #[tokio::test]
    async fn test_start_rejects_empty_command() {
        let sup = supervisor();
        assert!(matches!(
            sup.start("", None).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            sup.start("   ", None).await,
            Err(Error::Spawn(_))
        ));
        assert!(sup.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_handles() {
        let sup = supervisor();
        let unknown = ProcessHandle::new().to_string();

        assert!(matches!(
            sup.get_output(&unknown).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            sup.get_output("garbage").await,
            Err(Error::NotFound(_))
        ));
        assert_eq!(sup.stop(&unknown).await.unwrap(), StopOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_running() {
        let report = supervisor().shutdown().await;
        assert!(report.signalled.is_empty());
        assert!(report.failed.is_empty());
        assert_eq!(report.discarded, 0);
    }

    #[test]
    fn test_stop_outcome_wire_shape() {
        let sent = serde_json::to_value(StopOutcome::SignalSent).unwrap();
        assert_eq!(sent["status"], "termination_signal_sent");

        let stopped = serde_json::to_value(StopOutcome::AlreadyStopped {
            final_status: ProcessStatus::Exited,
        })
        .unwrap();
        assert_eq!(stopped["status"], "already_stopped");
        assert_eq!(stopped["finalStatus"], "exited");
    }
}
