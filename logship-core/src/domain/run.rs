//! Run outcome types

use serde::{Deserialize, Serialize};

/// Outcome of one side-effecting step (save or forward) within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step was not needed for this run
    Skipped,
    Succeeded,
    /// The step was attempted and failed with the given message
    Failed(String),
}

impl StepOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Per-invocation outcome of a sync run
///
/// Not persisted anywhere; reported for observability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// No previous snapshot was available, so this run establishes the baseline
    pub baseline: bool,
    /// Number of lines found in the remote log that were not in the snapshot
    pub new_lines: usize,
    pub save: StepOutcome,
    pub forward: StepOutcome,
}

impl RunResult {
    pub fn persisted(&self) -> bool {
        self.save.succeeded()
    }

    pub fn forwarded(&self) -> bool {
        self.forward.succeeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_result_success_flags() {
        let result = RunResult {
            baseline: true,
            new_lines: 0,
            save: StepOutcome::Succeeded,
            forward: StepOutcome::Skipped,
        };
        assert!(result.persisted());
        assert!(!result.forwarded());
    }

    #[test]
    fn test_failed_forward_is_not_forwarded() {
        let result = RunResult {
            baseline: false,
            new_lines: 2,
            save: StepOutcome::Succeeded,
            forward: StepOutcome::Failed("connection refused".to_string()),
        };
        assert!(result.persisted());
        assert!(!result.forwarded());
    }

    #[test]
    fn test_step_outcome_serialization() {
        let json = serde_json::to_value(StepOutcome::Failed("denied".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "failed", "error": "denied" }));

        let json = serde_json::to_value(StepOutcome::Skipped).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "skipped" }));
    }
}
