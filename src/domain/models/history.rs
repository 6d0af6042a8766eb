use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one evolution iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationStatus {
    /// A proposal was validated, applied, and committed (or was already
    /// identical to HEAD, which is a benign no-op).
    #[serde(rename = "COMMITTED")]
    Committed,

    /// The proposal failed the syntactic check; the live file was left
    /// untouched.
    #[serde(rename = "REJECTED_VALIDATION_FAILED")]
    RejectedValidationFailed,

    /// Applying or committing the proposal failed; the live file may
    /// already have been overwritten.
    #[serde(rename = "EXECUTION_FAILED")]
    ExecutionFailed,

    /// No usable proposal was obtained this iteration.
    #[serde(rename = "NO_PROPOSAL")]
    NoProposal,
}

impl fmt::Display for IterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Committed => "COMMITTED",
            Self::RejectedValidationFailed => "REJECTED_VALIDATION_FAILED",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::NoProposal => "NO_PROPOSAL",
        };
        write!(f, "{name}")
    }
}

/// One recorded evolution iteration.
///
/// Iteration numbers are monotonic and continue across process restarts:
/// the orchestrator seeds its counter from the log length at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: u64,
    pub status: IterationStatus,
    pub reason: String,
}

impl HistoryEntry {
    pub fn new(iteration: u64, status: IterationStatus, reason: impl Into<String>) -> Self {
        Self {
            iteration,
            status,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_wire_spelling() {
        let json = serde_json::to_string(&IterationStatus::RejectedValidationFailed).unwrap();
        assert_eq!(json, "\"REJECTED_VALIDATION_FAILED\"");

        let parsed: IterationStatus = serde_json::from_str("\"NO_PROPOSAL\"").unwrap();
        assert_eq!(parsed, IterationStatus::NoProposal);
    }

    #[test]
    fn entry_round_trips() {
        let entry = HistoryEntry::new(7, IterationStatus::Committed, "added logging");
        let json = serde_json::to_string(&entry).unwrap();
        let back: HistoryEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
