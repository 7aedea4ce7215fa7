//! Process Tools - 백그라운드 프로세스 시작/출력 조회/정지
//!
//! ## 제공 도구
//!
//! - `start_process` - 명령을 백그라운드에서 시작하고 processId 반환
//! - `get_process_output` - 마지막 호출 이후의 stdout/stderr 와 상태 조회
//! - `stop_process` - SIGTERM 전송 (종료를 기다리지 않음)
//!
//! ## 사용 예시
//!
//! ```ignore
//! // 개발 서버 시작
//! let started = start_process.execute(json!({
//!     "command": "npm run dev",
//!     "cwd": "frontend"
//! }), &ctx).await?;
//!
//! // 출력 확인 (호출할 때마다 새 출력만)
//! get_process_output.execute(json!({"processId": id}), &ctx).await?;
//!
//! // 정지
//! stop_process.execute(json!({"processId": id}), &ctx).await?;
//! ```

use crate::tool::context::resolve_path;
use async_trait::async_trait;
use bgproc_foundation::{Error, Result, Tool, ToolContext, ToolMeta, ToolResult};
use bgproc_task::ProcessSupervisor;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Required, non-empty string argument
fn required_str<'a>(input: &'a Value, key: &str) -> Result<&'a str> {
    match input.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.as_str()),
        Some(Value::String(_)) => Err(Error::InvalidInput(format!(
            "{} must be a non-empty string",
            key
        ))),
        Some(_) => Err(Error::InvalidInput(format!("{} must be a string", key))),
        None => Err(Error::InvalidInput(format!("{} is required", key))),
    }
}

/// Optional string argument; `null` counts as absent
fn optional_str<'a>(input: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match input.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(Error::InvalidInput(format!("{} must be a string", key))),
    }
}

// ============================================================================
// StartProcessTool
// ============================================================================

/// 프로세스 시작 도구
pub struct StartProcessTool {
    supervisor: ProcessSupervisor,
}

impl StartProcessTool {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self { supervisor }
    }
}

#[async_trait]
impl Tool for StartProcessTool {
    fn name(&self) -> &str {
        "start_process"
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new("start_process")
            .display_name("Start Process")
            .description(
                "Starts a shell command in the background and returns immediately with a processId. \
                 Use get_process_output to read what it prints and stop_process to terminate it. \
                 Intended for long-running processes such as dev servers or watchers.",
            )
            .category("process")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command line to run (e.g. 'npm run dev')"
                },
                "cwd": {
                    "type": "string",
                    "description": "Working directory. Relative paths resolve against the session directory; defaults to the supervisor's working directory"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, input: Value, ctx: &dyn ToolContext) -> Result<ToolResult> {
        let command = required_str(&input, "command")?;
        let cwd = optional_str(&input, "cwd")?
            .map(|dir| resolve_path(ctx.working_dir(), Path::new(dir)));

        let started = self.supervisor.start(command, cwd.as_deref()).await?;
        info!(
            "[{}] start_process -> {}",
            ctx.session_id(),
            started.handle
        );

        let mut result = ToolResult::json(&json!({
            "processId": started.handle.to_string(),
            "status": "started"
        }));
        if let Some(pid) = started.pid {
            result = result.with_metadata("pid", json!(pid));
        }
        Ok(result)
    }
}

// ============================================================================
// GetProcessOutputTool
// ============================================================================

/// 출력 조회 도구
pub struct GetProcessOutputTool {
    supervisor: ProcessSupervisor,
}

impl GetProcessOutputTool {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self { supervisor }
    }
}

#[async_trait]
impl Tool for GetProcessOutputTool {
    fn name(&self) -> &str {
        "get_process_output"
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new("get_process_output")
            .display_name("Get Process Output")
            .description(
                "Returns the status, exit code and any stdout/stderr the process produced since \
                 the previous call for the same processId. Output is returned only once.",
            )
            .category("process")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "processId": {
                    "type": "string",
                    "description": "The processId returned by start_process"
                },
                "lines_since_last_call": {
                    "type": "number",
                    "description": "Accepted for compatibility; all new output is always returned"
                }
            },
            "required": ["processId"]
        })
    }

    async fn execute(&self, input: Value, _ctx: &dyn ToolContext) -> Result<ToolResult> {
        let process_id = required_str(&input, "processId")?;
        match input.get("lines_since_last_call") {
            None | Some(Value::Null) | Some(Value::Number(_)) => {}
            Some(_) => {
                return Err(Error::InvalidInput(
                    "lines_since_last_call must be a number".to_string(),
                ))
            }
        }

        let output = self.supervisor.get_output(process_id).await?;
        Ok(ToolResult::json(&serde_json::to_value(&output)?))
    }
}

// ============================================================================
// StopProcessTool
// ============================================================================

/// 프로세스 정지 도구
pub struct StopProcessTool {
    supervisor: ProcessSupervisor,
}

impl StopProcessTool {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self { supervisor }
    }
}

#[async_trait]
impl Tool for StopProcessTool {
    fn name(&self) -> &str {
        "stop_process"
    }

    fn meta(&self) -> ToolMeta {
        ToolMeta::new("stop_process")
            .display_name("Stop Process")
            .description(
                "Sends a termination signal to a background process. Does not wait for it to exit; \
                 poll get_process_output to observe the final status.",
            )
            .category("process")
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "processId": {
                    "type": "string",
                    "description": "The processId returned by start_process"
                }
            },
            "required": ["processId"]
        })
    }

    async fn execute(&self, input: Value, ctx: &dyn ToolContext) -> Result<ToolResult> {
        let process_id = required_str(&input, "processId")?;

        let outcome = self.supervisor.stop(process_id).await?;
        info!("[{}] stop_process {} -> {:?}", ctx.session_id(), process_id, outcome);

        let mut value = serde_json::to_value(&outcome)?;
        if let Value::Object(map) = &mut value {
            map.insert("processId".to_string(), json!(process_id));
        }
        Ok(ToolResult::json(&value))
    }
}

/// 프로세스 도구 3종 (같은 supervisor 공유)
pub fn process_tools(supervisor: ProcessSupervisor) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(StartProcessTool::new(supervisor.clone())),
        Arc::new(GetProcessOutputTool::new(supervisor.clone())),
        Arc::new(StopProcessTool::new(supervisor)),
    ]
}
