//! Tool Registry - 도구 등록 및 관리
//!
//! ## 기능
//! - 도구 등록/조회/제거
//! - 프로세스 도구 일괄 등록
//! - 이름으로 실행 (에러는 `Error: <message>` 결과로 변환)

use super::builtin;
use bgproc_foundation::{Error, Result, Tool, ToolContext, ToolResult};
use bgproc_task::ProcessSupervisor;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// 도구 레지스트리
///
/// ## 사용법
/// ```ignore
/// let registry = ToolRegistry::with_process_tools(supervisor);
///
/// let result = registry
///     .execute("start_process", json!({"command": "npm run dev"}), &ctx)
///     .await?;
/// ```
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로세스 도구를 포함한 레지스트리 생성
    pub fn with_process_tools(supervisor: ProcessSupervisor) -> Self {
        let mut registry = Self::new();
        registry.register_all(builtin::process_tools(supervisor));
        registry
    }

    /// 도구 등록
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        debug!("Registering tool '{}'", name);
        self.tools.insert(name, tool);
    }

    /// 여러 도구 한번에 등록
    pub fn register_all(&mut self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool);
        }
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// 도구 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// 모든 도구 이름 (정렬됨)
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// JSON Schema 형식으로 모든 도구 정보 반환 (MCP 호환)
    pub fn schemas(&self) -> Vec<Value> {
        self.names()
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| {
                let meta = tool.meta();
                serde_json::json!({
                    "name": meta.name,
                    "description": meta.description,
                    "input_schema": tool.schema()
                })
            })
            .collect()
    }

    /// 이름으로 도구 실행
    ///
    /// Unknown names fail with [`Error::ToolNotFound`]. Errors raised by the
    /// tool itself become an error result whose text is `Error: <message>`.
    pub async fn execute(
        &self,
        name: &str,
        input: Value,
        ctx: &dyn ToolContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        match tool.execute(input, ctx).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("Tool '{}' failed: {}", name, e);
                Ok(ToolResult::error(format!("Error: {}", e))
                    .with_metadata("kind", Value::String(e.kind().to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::RuntimeContext;
    use bgproc_foundation::SupervisorConfig;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        ToolRegistry::with_process_tools(ProcessSupervisor::new(SupervisorConfig::default()))
    }

    #[test]
    fn test_process_tools_registered() {
        let registry = registry();
        assert_eq!(
            registry.names(),
            vec!["get_process_output", "start_process", "stop_process"]
        );

        let schemas = registry.schemas();
        assert_eq!(schemas.len(), 3);
        assert_eq!(schemas[1]["name"], "start_process");
        assert_eq!(schemas[1]["input_schema"]["required"], json!(["command"]));
        assert!(!schemas[0]["description"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let ctx = RuntimeContext::new("test", ".");
        let result = registry().execute("take_screenshot", json!({}), &ctx).await;
        assert!(matches!(result, Err(Error::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_errors_become_results() {
        let ctx = RuntimeContext::new("test", ".");
        let result = registry()
            .execute("start_process", json!({}), &ctx)
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.text().starts_with("Error: "));
        assert_eq!(result.metadata["kind"], "invalid_argument");
    }
}
