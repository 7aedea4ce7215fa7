//! Supervisor Config - 프로세스 감독자 설정
//!
//! 글로벌(`~/.config/bgproc/`) → 프로젝트(`.bgproc/`) 순서로 병합 로드

use crate::storage::{load_file, JsonStore};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// 설정 파일명
pub const SUPERVISOR_CONFIG_FILE: &str = "supervisor.json";

/// 프로세스 감독자 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupervisorConfig {
    /// Working directory used when `start` is given none. Falls back to the
    /// host's current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_working_dir: Option<PathBuf>,

    /// SIGTERM 후 SIGKILL 전송 여부
    #[serde(default = "default_true")]
    pub kill_escalation: bool,

    /// SIGTERM → SIGKILL 대기 시간 (ms)
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,

    /// 종료 시 자식 프로세스 신호 후 대기 시간 (ms)
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Shell program override (`sh` / `cmd` when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<String>,

    /// Extra environment for every child
    #[serde(default = "default_env")]
    pub env: HashMap<String, String>,
}

/// 설정 파일 한 계층 - 파일에 적힌 키만 `Some`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SupervisorConfigLayer {
    pub default_working_dir: Option<PathBuf>,
    pub kill_escalation: Option<bool>,
    pub kill_grace_ms: Option<u64>,
    pub shutdown_grace_ms: Option<u64>,
    pub shell: Option<String>,
    pub env: Option<HashMap<String, String>>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            default_working_dir: None,
            kill_escalation: true,
            kill_grace_ms: default_kill_grace_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            shell: None,
            env: default_env(),
        }
    }
}

impl SupervisorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// 글로벌 + 프로젝트 병합 로드
    pub fn load() -> Result<Self> {
        let mut stores = Vec::new();

        // 1. 글로벌 설정
        if let Ok(global) = JsonStore::global() {
            stores.push(global);
        }

        // 2. 프로젝트 설정
        if let Ok(project) = JsonStore::current_project() {
            stores.push(project);
        }

        Self::load_layered(&stores)
    }

    /// Merge `supervisor.json` from each store in order, later stores winning.
    /// Stores without the file are skipped.
    pub fn load_layered(stores: &[JsonStore]) -> Result<Self> {
        let mut config = Self::new();
        for store in stores {
            if let Some(layer) =
                store.load_optional::<SupervisorConfigLayer>(SUPERVISOR_CONFIG_FILE)?
            {
                debug!("Loaded config from {}", store.base_dir().display());
                config.merge(layer);
            }
        }
        Ok(config)
    }

    /// Load a single explicit file on top of the defaults.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::new();
        config.merge(load_file(path.as_ref())?);
        Ok(config)
    }

    /// 계층 병합 - 계층에 있는 키가 우선, `env`는 키 단위로 합침
    pub fn merge(&mut self, layer: SupervisorConfigLayer) {
        if let Some(dir) = layer.default_working_dir {
            self.default_working_dir = Some(dir);
        }
        if let Some(enabled) = layer.kill_escalation {
            self.kill_escalation = enabled;
        }
        if let Some(ms) = layer.kill_grace_ms {
            self.kill_grace_ms = ms;
        }
        if let Some(ms) = layer.shutdown_grace_ms {
            self.shutdown_grace_ms = ms;
        }
        if let Some(shell) = layer.shell {
            self.shell = Some(shell);
        }
        if let Some(env) = layer.env {
            self.env.extend(env);
        }
    }

    // ========================================================================
    // Builder
    // ========================================================================

    pub fn default_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.default_working_dir = Some(dir.into());
        self
    }

    pub fn kill_grace(mut self, grace: Duration) -> Self {
        self.kill_escalation = true;
        self.kill_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn without_kill_escalation(mut self) -> Self {
        self.kill_escalation = false;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = grace.as_millis() as u64;
        self
    }

    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Delay between SIGTERM and SIGKILL, `None` when escalation is off.
    pub fn kill_grace_period(&self) -> Option<Duration> {
        self.kill_escalation
            .then(|| Duration::from_millis(self.kill_grace_ms))
    }

    pub fn shutdown_grace_period(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Resolved default working directory.
    pub fn working_dir(&self) -> PathBuf {
        self.default_working_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn default_true() -> bool {
    true
}

fn default_kill_grace_ms() -> u64 {
    5_000
}

fn default_shutdown_grace_ms() -> u64 {
    500
}

fn default_env() -> HashMap<String, String> {
    HashMap::from([("PYTHONIOENCODING".to_string(), "utf-8".to_string())])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SupervisorConfig::default();
        assert_eq!(config.kill_grace_period(), Some(Duration::from_secs(5)));
        assert_eq!(config.shutdown_grace_period(), Duration::from_millis(500));
        assert_eq!(
            config.env.get("PYTHONIOENCODING").map(String::as_str),
            Some("utf-8")
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SupervisorConfig = serde_json::from_str(r#"{"killGraceMs": 250}"#).unwrap();
        assert_eq!(config.kill_grace_ms, 250);
        assert!(config.kill_escalation);
        assert_eq!(config.shutdown_grace_ms, 500);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = SupervisorConfig::default();
        let layer: SupervisorConfigLayer = serde_json::from_str(
            r#"{"defaultWorkingDir": "/srv", "shell": "bash", "env": {"FOO": "bar"}, "killEscalation": false}"#,
        )
        .unwrap();
        base.merge(layer);

        assert_eq!(base.default_working_dir, Some(PathBuf::from("/srv")));
        assert_eq!(base.shell.as_deref(), Some("bash"));
        assert_eq!(base.env.get("FOO").map(String::as_str), Some("bar"));
        assert!(base.env.contains_key("PYTHONIOENCODING"));
        assert_eq!(base.kill_grace_period(), None);
    }

    #[test]
    fn test_merge_empty_layer_keeps_values() {
        let mut base = SupervisorConfig::default()
            .shutdown_grace(Duration::from_millis(20))
            .without_kill_escalation();
        let before = base.clone();
        base.merge(SupervisorConfigLayer::default());
        assert_eq!(base, before);
    }

    fn write_layer(dir: &Path, json: &str) -> JsonStore {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(SUPERVISOR_CONFIG_FILE), json).unwrap();
        JsonStore::new(dir)
    }

    #[test]
    fn test_project_layer_overrides_global() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_layer(
            &dir.path().join("global"),
            r#"{"killEscalation": false, "killGraceMs": 100, "shutdownGraceMs": 50, "shell": "bash", "env": {"A": "1"}}"#,
        );
        // 프로젝트 계층이 기본값과 같은 값으로 되돌릴 수 있어야 함
        let project = write_layer(
            &dir.path().join("project"),
            r#"{"killEscalation": true, "killGraceMs": 5000, "shutdownGraceMs": 500, "env": {"B": "2"}}"#,
        );

        let config = SupervisorConfig::load_layered(&[global, project]).unwrap();
        assert!(config.kill_escalation);
        assert_eq!(config.kill_grace_ms, 5_000);
        assert_eq!(config.shutdown_grace_ms, 500);
        // 프로젝트에 없는 키는 글로벌 값 유지
        assert_eq!(config.shell.as_deref(), Some("bash"));
        assert_eq!(config.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(config.env.get("B").map(String::as_str), Some("2"));
        assert!(config.env.contains_key("PYTHONIOENCODING"));
    }

    #[test]
    fn test_layered_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_layer(&dir.path().join("global"), r#"{"killGraceMs": 250}"#);
        let empty = JsonStore::new(dir.path().join("nothing"));

        let config = SupervisorConfig::load_layered(&[global, empty]).unwrap();
        assert_eq!(config.kill_grace_period(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_layered_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_layer(dir.path(), r#"{"killGraceMs": "soon"}"#);
        assert!(SupervisorConfig::load_layered(&[bad]).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SUPERVISOR_CONFIG_FILE);
        std::fs::write(&path, r#"{"shutdownGraceMs": 50, "env": {"A": "1"}}"#).unwrap();

        let config = SupervisorConfig::load_from(&path).unwrap();
        assert_eq!(config.shutdown_grace_period(), Duration::from_millis(50));
        assert_eq!(config.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(config.kill_grace_ms, 5_000);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SupervisorConfig::load_from(dir.path().join("nope.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_working_dir_fallback() {
        let config = SupervisorConfig::default();
        assert_eq!(config.working_dir(), std::env::current_dir().unwrap());
    }
}
