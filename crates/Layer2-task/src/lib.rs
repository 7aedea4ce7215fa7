//! # bgproc-task
//!
//! Background process supervision for bgproc.
//! Starts shell commands without blocking, captures their output and tracks
//! their lifecycle until they exit.
//!
//! ## Features
//!
//! - Non-blocking process start through the platform shell
//! - **Incremental stdout/stderr retrieval**
//! - Lifecycle tracking (`running` -> `exited` | `error`)
//! - **SIGTERM with SIGKILL escalation**
//! - Shutdown coordination

pub mod collector;
pub mod command;
pub mod executor;
pub mod lifecycle;
pub mod manager;
pub mod process;
pub mod state;
pub mod store;

pub use collector::{OutputChunk, OutputStream, Utf8ChunkDecoder};
pub use command::{tokenize, CommandLine, CommandToken};
pub use executor::{exit_signal, signal_name, LocalLauncher};
pub use manager::{ProcessSupervisor, ShutdownReport, StopOutcome};
pub use process::{ProcessHandle, ProcessOutput, ProcessRecord, ProcessSummary, StartedProcess};
pub use state::ProcessStatus;
pub use store::ProcessStore;
