//! Job snapshots as seen by pollers

use serde::{Deserialize, Serialize};

/// Lifecycle of a background job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Fragments are still arriving
    Running,
    /// The reply finished normally
    Completed,
    /// The agent failed; the message holds whatever arrived before
    Failed,
}

impl JobStatus {
    /// Check if the status represents a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Latest known output of a job
///
/// `completed` is true for every terminal status, so clients that only look
/// at it stop polling on failures too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub message: String,
    pub completed: bool,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn running(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            completed: false,
            status: JobStatus::Running,
            error: None,
        }
    }

    pub fn completed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            completed: true,
            status: JobStatus::Completed,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            completed: true,
            status: JobStatus::Failed,
            error: Some(error.into()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_snapshot_json() {
        let json = serde_json::to_value(JobSnapshot::running("Hel")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"message": "Hel", "completed": false, "status": "running"})
        );
    }

    #[test]
    fn test_failed_snapshot_is_completed() {
        let snapshot = JobSnapshot::failed("partial", "connection reset");
        assert!(snapshot.completed);
        assert!(snapshot.is_terminal());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "connection reset");
    }
}
