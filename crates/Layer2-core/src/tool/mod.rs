//! Tool System - 외부 호출자가 사용하는 도구 시스템
//!
//! Layer1의 Tool trait을 구현하고, ToolRegistry로 도구를 관리합니다.
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  ToolRegistry                                                │
//! │  ├── register(tool) - 도구 등록                              │
//! │  ├── execute(name) - 이름으로 실행                           │
//! │  └── schemas() - MCP 호환 스키마                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  RuntimeContext (ToolContext 구현)                           │
//! │  └── working_dir() - 상대 경로 기준                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Builtin Tools (Tool trait 구현)                             │
//! │  ├── StartProcessTool - 프로세스 시작                        │
//! │  ├── GetProcessOutputTool - 출력 조회                        │
//! │  └── StopProcessTool - 프로세스 정지                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 사용법
//!
//! ```ignore
//! use bgproc_core::tool::{RuntimeContext, ToolRegistry};
//!
//! let registry = ToolRegistry::with_process_tools(supervisor);
//! let ctx = RuntimeContext::current("session-1");
//!
//! let result = registry.execute("start_process", input, &ctx).await?;
//! ```

pub mod builtin;
mod context;
mod registry;

// Re-exports: Tool trait from Layer1
pub use bgproc_foundation::{Tool, ToolContext};

pub use builtin::{process_tools, GetProcessOutputTool, StartProcessTool, StopProcessTool};
pub use context::RuntimeContext;
pub use registry::ToolRegistry;
