//! Core Module - 핵심 인터페이스
//!
//! - `traits.rs`: 도구 인터페이스 (Tool, ToolContext, ToolMeta)

pub mod traits;

// Tool trait & related
pub use traits::{Tool, ToolContext, ToolExecutionResult, ToolMeta};

// ToolResult alias (traits::ToolExecutionResult의 별칭)
pub use traits::ToolResult;
