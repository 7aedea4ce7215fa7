//! Lifecycle Tracker - terminal transitions and their diagnostics
//!
//! Every terminal transition appends one diagnostic block to the record's
//! stderr buffer, so a poller always learns why a process stopped.

use crate::executor::signal::signal_name;
use crate::process::ProcessRecord;
use crate::state::ProcessStatus;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Prefix of informational diagnostics
pub const INFO_PREFIX: &str = "[Process Supervisor Info]";

/// Prefix of failure diagnostics
pub const ERROR_PREFIX: &str = "[Process Supervisor Error]";

fn or_null<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "null".to_string(), |v| v.to_string())
}

/// Diagnostic appended when the process has exited and its streams closed.
pub fn exit_diagnostic(exit_code: Option<i32>, signal: Option<i32>) -> String {
    format!(
        "\n{} Process exited with code {} (signal: {})\n",
        INFO_PREFIX,
        or_null(exit_code),
        or_null(signal.map(signal_name)),
    )
}

/// Diagnostic appended on a runtime failure.
pub fn failure_diagnostic(message: &str) -> String {
    format!("\n{} {}\n", ERROR_PREFIX, message)
}

/// Diagnostic appended when SIGTERM was not honored within `grace`.
pub fn escalation_diagnostic(grace: Duration) -> String {
    format!(
        "\n{} Process did not exit within {}s of SIGTERM, sent SIGKILL\n",
        INFO_PREFIX,
        grace.as_secs_f64()
    )
}

/// Process exited (normally or by a signal) and both streams are closed.
pub(crate) fn on_exit(record: &ProcessRecord, exit_code: Option<i32>, signal: Option<i32>) {
    info!(
        "Process {} closed: code={}, signal={}",
        record.handle,
        or_null(exit_code),
        or_null(signal.map(signal_name))
    );

    let transitioned = record.finalize(
        ProcessStatus::Exited,
        exit_code,
        Some(exit_diagnostic(exit_code, signal)),
    );
    if !transitioned {
        debug!(
            "Process {} already {}, exit recorded as diagnostic only",
            record.handle,
            record.status()
        );
    }
}

/// The runtime reported a failure for a running process.
pub(crate) fn on_failure(record: &ProcessRecord, message: &str) {
    error!("Process {} failed: {}", record.handle, message);

    if !record.finalize(ProcessStatus::Error, None, Some(failure_diagnostic(message))) {
        debug!("Process {} already {}", record.handle, record.status());
    }
}

/// SIGKILL was sent after the grace period.
pub(crate) fn on_escalation(record: &ProcessRecord, grace: Duration) {
    warn!(
        "Process {} ignored SIGTERM for {:?}, sending SIGKILL",
        record.handle, grace
    );
    record.append(
        crate::collector::OutputStream::Stderr,
        escalation_diagnostic(grace),
    );
}

/// Exit already observed by a stop request before the driver finalized.
/// No diagnostic; the driver appends it once streams close.
pub(crate) fn on_stop_found_exited(record: &ProcessRecord, exit_code: Option<i32>) {
    if record.finalize(ProcessStatus::Exited, exit_code, None) {
        info!(
            "Process {} was already gone when stop was requested",
            record.handle
        );
    }
}
