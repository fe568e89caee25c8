//! Durable orchestration state.
//!
//! Loaded at the start of every command, mutated only as an in-memory draft,
//! and persisted wholesale at command end. The `pending_round` marker is the
//! system's sole cross-invocation mutual-exclusion primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coverage::CompletionGates;

/// Process-wide durable state, `docs/orchestration-state.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrchestrationState {
    pub version: u32,
    /// Last merged round number; 0 before any round has merged.
    pub round: u32,
    /// Round prepared but not yet merged, if any. At most one may exist.
    pub pending_round: Option<u32>,
    /// Consecutive merged rounds that accepted zero candidates.
    pub consecutive_no_findings: u32,
    pub completed: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub history: Vec<RoundHistoryEntry>,
}

impl Default for OrchestrationState {
    fn default() -> Self {
        Self {
            version: 1,
            round: 0,
            pending_round: None,
            consecutive_no_findings: 0,
            completed: false,
            last_run_at: None,
            history: vec![],
        }
    }
}

/// Append-only per-round history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundHistoryEntry {
    pub round: u32,
    pub at: DateTime<Utc>,
    pub accepted_journeys: usize,
    pub rejected_journeys: usize,
    pub accepted_features: usize,
    pub rejected_features: usize,
    pub no_findings_streak: u32,
    pub gates: CompletionGates,
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_has_no_pending_round() {
        let state = OrchestrationState::default();
        assert_eq!(state.round, 0);
        assert!(state.pending_round.is_none());
        assert!(!state.completed);
    }

    #[test]
    fn state_round_trips() {
        let mut state = OrchestrationState::default();
        state.round = 3;
        state.pending_round = Some(4);
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"pendingRound\":4"));
        let back: OrchestrationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pending_round, Some(4));
    }
}
