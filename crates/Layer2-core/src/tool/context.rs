//! Runtime Context - ToolContext 구현

use bgproc_foundation::ToolContext;
use std::path::{Path, PathBuf};

/// Tool 실행 컨텍스트
///
/// 도구 실행에 필요한 환경을 제공합니다:
/// - 작업 디렉토리 (상대 경로 `cwd` 해석 기준)
/// - 세션 정보
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    session_id: String,
    working_dir: PathBuf,
}

impl RuntimeContext {
    /// 새 컨텍스트 생성
    pub fn new(session_id: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            working_dir: working_dir.into(),
        }
    }

    /// 현재 디렉토리 기준 컨텍스트
    pub fn current(session_id: impl Into<String>) -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::new(session_id, working_dir)
    }

    /// Resolve `path` against the context's working directory.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        resolve_path(self.working_dir(), path.as_ref())
    }
}

impl ToolContext for RuntimeContext {
    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// 상대 경로는 `base` 기준으로, 절대 경로는 그대로
pub(crate) fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
