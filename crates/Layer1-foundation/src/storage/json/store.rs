//! JSON 파일 저장소

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Directory name used for both the global and the per-project store.
const APP_DIR: &str = "bgproc";

/// JSON 설정 저장소
#[derive(Debug, Clone)]
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// 글로벌 설정 (~/.config/bgproc/)
    pub fn global() -> Result<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join(APP_DIR);
        Ok(Self::new(dir))
    }

    /// 프로젝트 설정 (.bgproc/)
    pub fn project(root: impl Into<PathBuf>) -> Self {
        Self::new(root.into().join(format!(".{}", APP_DIR)))
    }

    /// 현재 디렉토리 프로젝트 설정
    pub fn current_project() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::Config(format!("Cannot get current directory: {}", e)))?;
        Ok(Self::project(cwd))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn file_path(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }

    /// JSON 로드
    pub fn load<T: DeserializeOwned>(&self, filename: &str) -> Result<T> {
        let path = self.file_path(filename);
        load_file(&path)
    }

    /// JSON 로드 (Optional)
    pub fn load_optional<T: DeserializeOwned>(&self, filename: &str) -> Result<Option<T>> {
        let path = self.file_path(filename);
        if !path.exists() {
            return Ok(None);
        }
        self.load(filename).map(Some)
    }
}

/// Read and parse a single JSON file.
pub(crate) fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}
