//! # bgproc-core
//!
//! Tool layer for bgproc.
//!
//! ## 모듈 구조
//!
//! - `tool`: 프로세스 도구 (start/get_output/stop), ToolRegistry, RuntimeContext
//!
//! ## Layer 관계
//!
//! ```text
//! Layer4-cli  ──▶  bgproc-core (이 crate)  ──▶  bgproc-task (ProcessSupervisor)
//!                        │
//!                        └──▶  bgproc-foundation (Tool, Error, Config)
//! ```

pub mod tool;

pub use tool::{
    process_tools, GetProcessOutputTool, RuntimeContext, StartProcessTool, StopProcessTool,
    ToolRegistry,
};

// Layer1 re-exports
pub use bgproc_foundation::{Error, Result, Tool, ToolContext, ToolResult};
