//! # bgproc-foundation
//!
//! Foundation layer for bgproc:
//! - Core: 핵심 Trait 정의 (Tool, ToolContext)
//! - Config: 감독자 설정 (SupervisorConfig)
//! - Storage: JsonStore (설정 파일)
//! - Error: 공통 에러 타입

pub mod config;
pub mod core;
pub mod error;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use core::{Tool, ToolContext, ToolExecutionResult, ToolMeta, ToolResult};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{SupervisorConfig, SupervisorConfigLayer, SUPERVISOR_CONFIG_FILE};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::JsonStore;
