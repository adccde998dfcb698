//! Generation run bookkeeping.
//!
//! One `GenerationRecord` is written per successful run, followed by the
//! pending validation markers an external review workflow picks up.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{DepartmentId, GenerationId};

/// Lifecycle of a generation run.
///
/// `Idle → Running → {Success, Timeout, Error}`. A finished run may be
/// followed by a new one, which re-enters `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Idle,
    Running,
    Success,
    Timeout,
    Error,
}

/// Summary row persisted for a generation run. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    /// Wall-clock time the record was produced.
    pub generated_at: DateTime<Utc>,
    /// Requested first exam date.
    pub start_date: NaiveDate,
    /// Date of the last scheduled exam.
    pub end_date: NaiveDate,
    pub elapsed_seconds: f64,
    pub total_exams: usize,
    pub total_blocks: usize,
    pub total_students: usize,
    pub conflicts_detected: usize,
    pub status: RunStatus,
}

/// Who has to sign off a generated schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidatorRole {
    /// Head of one department reviews that department's exams.
    DepartmentHead(DepartmentId),
    /// Institution-level sign-off.
    ViceDean,
}

/// Review state of one validation marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Initial review marker seeded after a successful run.
///
/// The engine only creates `Pending` markers; it never reads them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMarker {
    pub generation_id: GenerationId,
    pub role: ValidatorRole,
    pub status: ValidationStatus,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Idle => "IDLE",
            RunStatus::Running => "RUNNING",
            RunStatus::Success => "SUCCESS",
            RunStatus::Timeout => "TIMEOUT",
            RunStatus::Error => "ERROR",
        }
    }

    /// Whether the run has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Success | RunStatus::Timeout | RunStatus::Error)
    }

    /// Whether `next` is a legal successor state.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match (self, next) {
            (RunStatus::Idle, RunStatus::Running) => true,
            (RunStatus::Running, n) => n.is_terminal(),
            (s, RunStatus::Running) => s.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValidationMarker {
    /// Pending marker for one role.
    pub fn pending(generation_id: GenerationId, role: ValidatorRole) -> Self {
        Self {
            generation_id,
            role,
            status: ValidationStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_transitions() {
        assert!(RunStatus::Idle.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Success));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Timeout));
        assert!(RunStatus::Running.can_transition_to(RunStatus::Error));
        assert!(RunStatus::Success.can_transition_to(RunStatus::Running));
        assert!(RunStatus::Error.can_transition_to(RunStatus::Running));

        assert!(!RunStatus::Idle.can_transition_to(RunStatus::Success));
        assert!(!RunStatus::Running.can_transition_to(RunStatus::Running));
        assert!(!RunStatus::Success.can_transition_to(RunStatus::Timeout));
    }

    #[test]
    fn test_run_status_display_and_serde() {
        assert_eq!(RunStatus::Timeout.to_string(), "TIMEOUT");
        let json = serde_json::to_string(&RunStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }

    #[test]
    fn test_pending_marker() {
        let m = ValidationMarker::pending(3, ValidatorRole::DepartmentHead(2));
        assert_eq!(m.status, ValidationStatus::Pending);
        assert_eq!(m.role, ValidatorRole::DepartmentHead(2));
        assert_eq!(m.generation_id, 3);
    }
}
