//! Process executors
//!
//! - `LocalLauncher` - spawns a command through the platform shell and starts
//!   the driver task that owns the child
//! - `signal` - SIGTERM delivery and signal naming

pub mod local;
pub mod signal;

pub use local::LocalLauncher;
pub(crate) use local::{ControlRequest, TerminateReply};
pub use signal::{exit_signal, signal_name};
