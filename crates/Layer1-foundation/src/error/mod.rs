//! Error types for bgproc
//!
//! 모든 에러를 중앙에서 관리

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// bgproc 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 프로세스 관련
    // ========================================================================
    /// The OS refused to create the process, or the command line has no
    /// executable token.
    #[error("Failed to start process: {0}")]
    Spawn(String),

    // ========================================================================
    // Tool 관련
    // ========================================================================
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    // ========================================================================
    // 일반
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // 기타
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// 사용자 입력으로 인해 발생한 에러인지 확인
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::InvalidInput(_)
                | Error::Spawn(_)
                | Error::ToolNotFound(_)
        )
    }

    /// Short machine-readable name, used by the tool layer when reporting errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Spawn(_) => "spawn_error",
            Error::ToolNotFound(_) => "method_not_found",
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "invalid_argument",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Internal(_) => "internal_error",
        }
    }
}

// ============================================================================
// From 구현 (추가 변환)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing() {
        assert!(Error::InvalidInput("x".into()).is_user_facing());
        assert!(Error::NotFound("x".into()).is_user_facing());
        assert!(!Error::Internal("x".into()).is_user_facing());
    }

    #[test]
    fn test_display() {
        let err = Error::Spawn("No such file or directory".into());
        assert_eq!(
            err.to_string(),
            "Failed to start process: No such file or directory"
        );
        assert_eq!(err.kind(), "spawn_error");
    }

    #[test]
    fn test_from_str() {
        let err: Error = "boom".into();
        assert!(matches!(err, Error::Internal(ref m) if m == "boom"));
    }
}
