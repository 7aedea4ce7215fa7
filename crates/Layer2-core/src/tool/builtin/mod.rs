//! Builtin Tools - 기본 제공 도구
//!
//! - `start_process`, `get_process_output`, `stop_process`

mod process;

pub use process::{process_tools, GetProcessOutputTool, StartProcessTool, StopProcessTool};
