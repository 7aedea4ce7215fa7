//! Core Traits - 핵심 인터페이스 정의
//!
//! Layer2에서 구현해야 하는 도구 trait을 정의합니다.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Layer4-CLI                                                 │
//! │  └── 요청 디스패치 (tools/list, tools/call)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Core                                                │
//! │  └── Tool trait 구현 (start/get_output/stop process)        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer2-Task                                                │
//! │  └── ProcessSupervisor                                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Layer1-Foundation (이 레이어)                              │
//! │  └── Trait 정의, Error, Config                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

// ============================================================================
// Tool Trait - 도구 인터페이스
// ============================================================================

/// 도구 메타데이터
#[derive(Debug, Clone)]
pub struct ToolMeta {
    /// 도구 이름 (고유 식별자)
    pub name: String,
    /// 표시 이름
    pub display_name: String,
    /// 설명
    pub description: String,
    /// 카테고리 (process, filesystem 등)
    pub category: String,
}

impl ToolMeta {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            category: "general".to_string(),
        }
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn category(mut self, cat: impl Into<String>) -> Self {
        self.category = cat.into();
        self
    }
}

/// 도구 실행 결과 (Tool trait용)
#[derive(Debug, Clone)]
pub struct ToolExecutionResult {
    /// 성공 여부
    pub success: bool,
    /// 출력 내용
    pub output: String,
    /// 에러 메시지 (실패 시)
    pub error: Option<String>,
    /// 추가 메타데이터
    pub metadata: HashMap<String, Value>,
}

impl ToolExecutionResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            error: None,
            metadata: HashMap::new(),
        }
    }

    /// JSON 값을 출력으로 하는 성공 결과
    pub fn json(value: &Value) -> Self {
        Self::success(value.to_string())
    }

    pub fn error(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            success: false,
            output: String::new(),
            error: Some(msg),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Text shown to the caller: the output on success, the error otherwise.
    pub fn text(&self) -> &str {
        if self.success {
            &self.output
        } else {
            self.error.as_deref().unwrap_or("Unknown error")
        }
    }
}

// 하위 호환성을 위한 type alias
pub type ToolResult = ToolExecutionResult;

/// 도구 인터페이스
///
/// Layer2-core에서 구현합니다.
#[async_trait]
pub trait Tool: Send + Sync {
    /// 도구 이름 (고유 식별자)
    fn name(&self) -> &str;

    /// 도구 메타데이터 반환
    fn meta(&self) -> ToolMeta;

    /// JSON 스키마 반환 (MCP 호환)
    fn schema(&self) -> Value;

    /// 도구 실행
    ///
    /// # Arguments
    /// * `input` - JSON 형식의 입력 파라미터
    /// * `context` - 실행 컨텍스트
    async fn execute(&self, input: Value, context: &dyn ToolContext) -> Result<ToolResult>;
}

/// 도구 실행 컨텍스트
pub trait ToolContext: Send + Sync {
    /// 현재 작업 디렉토리
    fn working_dir(&self) -> &Path;

    /// 세션 ID
    fn session_id(&self) -> &str;
}
