//! Process record and handle types

use crate::collector::OutputStream;
use crate::executor::ControlRequest;
use crate::state::ProcessStatus;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

/// Unique identifier for a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessHandle(pub Uuid);

impl ProcessHandle {
    /// Generate a new random handle
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a handle string. Anything that is not a UUID yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for ProcessHandle {
    fn default() -> Self {
        Self::new()
    }
}

// 전체 UUID를 출력 (handle은 외부 호출자가 그대로 돌려보내야 함)
impl std::fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable part of a record, guarded by one lock so status, exit code and
/// buffers are always observed together.
#[derive(Debug)]
struct RecordState {
    status: ProcessStatus,
    exit_code: Option<i32>,
    stdout: Vec<String>,
    stderr: Vec<String>,
    ended_at: Option<DateTime<Utc>>,
}

/// Registry entry for one started process
#[derive(Debug)]
pub struct ProcessRecord {
    pub handle: ProcessHandle,

    /// Command line as handed to the shell
    pub command_line: String,

    pub working_dir: PathBuf,

    pub started_at: DateTime<Utc>,

    /// OS process id, if the platform reported one
    pub pid: Option<u32>,

    state: Mutex<RecordState>,

    control: UnboundedSender<ControlRequest>,
}

impl ProcessRecord {
    pub(crate) fn new(
        handle: ProcessHandle,
        command_line: String,
        working_dir: &Path,
        pid: Option<u32>,
        control: UnboundedSender<ControlRequest>,
    ) -> Self {
        Self {
            handle,
            command_line,
            working_dir: working_dir.to_path_buf(),
            started_at: Utc::now(),
            pid,
            state: Mutex::new(RecordState {
                status: ProcessStatus::Running,
                exit_code: None,
                stdout: Vec::new(),
                stderr: Vec::new(),
                ended_at: None,
            }),
            control,
        }
    }

    pub fn status(&self) -> ProcessStatus {
        self.state.lock().status
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.state.lock().exit_code
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().ended_at
    }

    /// Append a chunk to one of the buffers. Empty chunks are dropped.
    pub(crate) fn append(&self, stream: OutputStream, text: String) {
        if text.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        match stream {
            OutputStream::Stdout => state.stdout.push(text),
            OutputStream::Stderr => state.stderr.push(text),
        }
    }

    /// Take everything buffered since the previous drain.
    ///
    /// Status, exit code and both buffers are read and cleared under a single
    /// lock, so a chunk is returned by exactly one drain.
    pub fn drain(&self) -> ProcessOutput {
        let mut state = self.state.lock();
        let stdout = std::mem::take(&mut state.stdout).concat();
        let stderr = std::mem::take(&mut state.stderr).concat();
        ProcessOutput {
            handle: self.handle,
            status: state.status,
            exit_code: state.exit_code,
            stdout,
            stderr,
        }
    }

    /// Move to a terminal status, optionally appending a diagnostic to stderr
    /// in the same critical section.
    ///
    /// The diagnostic is appended even when the record is already terminal;
    /// the status and exit code are only written by the first transition.
    /// Returns whether this call performed the transition.
    pub(crate) fn finalize(
        &self,
        next: ProcessStatus,
        exit_code: Option<i32>,
        diagnostic: Option<String>,
    ) -> bool {
        let mut state = self.state.lock();
        if let Some(text) = diagnostic {
            state.stderr.push(text);
        }
        if !state.status.can_transition_to(next) {
            return false;
        }
        state.status = next;
        // error 상태에서는 exit code를 기록하지 않음
        state.exit_code = match next {
            ProcessStatus::Exited => exit_code,
            _ => None,
        };
        state.ended_at = Some(Utc::now());
        true
    }

    /// Hand a request to the record's driver. `false` when the driver is gone.
    pub(crate) fn request(&self, request: ControlRequest) -> bool {
        self.control.send(request).is_ok()
    }

    pub fn summary(&self) -> ProcessSummary {
        let state = self.state.lock();
        ProcessSummary {
            handle: self.handle,
            command_line: self.command_line.clone(),
            working_dir: self.working_dir.clone(),
            pid: self.pid,
            status: state.status,
            exit_code: state.exit_code,
            started_at: self.started_at,
            ended_at: state.ended_at,
        }
    }
}

/// Result of `start`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedProcess {
    #[serde(rename = "processId")]
    pub handle: ProcessHandle,

    pub status: ProcessStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

/// Result of `get_output`: status plus output produced since the last call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOutput {
    #[serde(rename = "processId")]
    pub handle: ProcessHandle,

    pub status: ProcessStatus,

    /// `None` while running or after a runtime error
    pub exit_code: Option<i32>,

    pub stdout: String,

    pub stderr: String,
}

/// Read-only view of a record, used by `list`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    #[serde(rename = "processId")]
    pub handle: ProcessHandle,
    pub command_line: String,
    pub working_dir: PathBuf,
    pub pid: Option<u32>,
    pub status: ProcessStatus,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn record() -> ProcessRecord {
        let (tx, _rx) = mpsc::unbounded_channel();
        ProcessRecord::new(
            ProcessHandle::new(),
            "echo hi".to_string(),
            Path::new("/tmp"),
            Some(42),
            tx,
        )
    }

    #[test]
    fn test_handle_parse() {
        let handle = ProcessHandle::new();
        assert_eq!(ProcessHandle::parse(&handle.to_string()), Some(handle));
        assert_eq!(ProcessHandle::parse("not-a-uuid"), None);
        assert_eq!(ProcessHandle::parse(""), None);
    }

    #[test]
    fn test_drain_is_incremental() {
        let record = record();
        record.append(OutputStream::Stdout, "a\n".into());
        record.append(OutputStream::Stdout, "b\n".into());
        record.append(OutputStream::Stderr, "warn\n".into());

        let first = record.drain();
        assert_eq!(first.status, ProcessStatus::Running);
        assert_eq!(first.exit_code, None);
        assert_eq!(first.stdout, "a\nb\n");
        assert_eq!(first.stderr, "warn\n");

        let second = record.drain();
        assert_eq!(second.stdout, "");
        assert_eq!(second.stderr, "");

        record.append(OutputStream::Stdout, "c".into());
        assert_eq!(record.drain().stdout, "c");
    }

    #[test]
    fn test_finalize_once() {
        let record = record();
        assert!(record.finalize(ProcessStatus::Exited, Some(0), Some("done\n".into())));
        assert!(!record.finalize(ProcessStatus::Error, None, Some("late\n".into())));

        let output = record.drain();
        assert_eq!(output.status, ProcessStatus::Exited);
        assert_eq!(output.exit_code, Some(0));
        // diagnostics are kept even after the first transition
        assert_eq!(output.stderr, "done\nlate\n");
        assert!(record.ended_at().is_some());
    }

    #[test]
    fn test_error_has_no_exit_code() {
        let record = record();
        assert!(record.finalize(ProcessStatus::Error, Some(1), None));
        assert_eq!(record.status(), ProcessStatus::Error);
        assert_eq!(record.exit_code(), None);
    }

    #[test]
    fn test_output_wire_shape() {
        let record = record();
        record.append(OutputStream::Stdout, "x".into());
        let value = serde_json::to_value(record.drain()).unwrap();

        assert_eq!(value["processId"], record.handle.to_string());
        assert_eq!(value["status"], "running");
        assert!(value["exitCode"].is_null());
        assert_eq!(value["stdout"], "x");
        assert_eq!(value["stderr"], "");
    }
}
