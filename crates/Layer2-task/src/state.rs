//! Process state machine
//!
//! ```text
//! Running ──exit──▶ Exited
//!    │
//!    └──failure──▶ Error
//! ```

use serde::{Deserialize, Serialize};

/// Lifecycle status of a supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// Process is running (initial state)
    Running,

    /// Process terminated, normally or by a signal
    Exited,

    /// Process failed at the runtime level
    Error,
}

impl ProcessStatus {
    /// Check if this is a terminal state (cannot transition further)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessStatus::Exited | ProcessStatus::Error)
    }

    /// Check if process is currently running
    pub fn is_running(&self) -> bool {
        matches!(self, ProcessStatus::Running)
    }

    /// Wire name of the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Exited => "exited",
            ProcessStatus::Error => "error",
        }
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: ProcessStatus) -> bool {
        self.is_running() && next.is_terminal()
    }
}

impl std::fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        assert!(ProcessStatus::Running.can_transition_to(ProcessStatus::Exited));
        assert!(ProcessStatus::Running.can_transition_to(ProcessStatus::Error));
        assert!(!ProcessStatus::Running.can_transition_to(ProcessStatus::Running));
        assert!(!ProcessStatus::Exited.can_transition_to(ProcessStatus::Error));
        assert!(!ProcessStatus::Error.can_transition_to(ProcessStatus::Exited));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProcessStatus::Exited).unwrap(),
            "\"exited\""
        );
        let status: ProcessStatus = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(status, ProcessStatus::Running);
        assert_eq!(ProcessStatus::Error.to_string(), "error");
    }
}
