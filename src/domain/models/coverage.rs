//! Coverage summaries and the five completion gates.
//!
//! Summaries are derived documents: recomputed from scratch on every merge,
//! never patched incrementally, so they always reflect the accepted maps
//! exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Journey-side coverage, persisted as the summary of
/// `docs/journey-coverage.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JourneyCoverageSummary {
    pub total_journeys: usize,
    pub routes_discovered: usize,
    /// Percentage of expected routes discovered; `None` when no expected
    /// routes are configured (target inapplicable).
    pub route_coverage_pct: Option<f64>,
    pub by_role: BTreeMap<String, usize>,
}

/// Per-role tallies for feature coverage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleFeatureTally {
    pub total: usize,
    pub exercised: usize,
}

/// Feature-side coverage, persisted as the summary of
/// `docs/feature-coverage.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureCoverageSummary {
    pub total_feature_units: usize,
    pub exercised_feature_units: usize,
    pub feature_coverage_pct: f64,
    pub by_role: BTreeMap<String, RoleFeatureTally>,
}

/// One history row appended per merged round.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageHistoryEntry<S> {
    pub round: u32,
    pub at: DateTime<Utc>,
    pub summary: S,
}

/// Versioned coverage document: current summary plus append-only history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageFile<S> {
    #[serde(default = "default_coverage_version")]
    pub version: u32,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: S,
    #[serde(default = "Vec::new")]
    pub history: Vec<CoverageHistoryEntry<S>>,
}

const fn default_coverage_version() -> u32 {
    1
}

impl<S: Default> Default for CoverageFile<S> {
    fn default() -> Self {
        Self {
            version: default_coverage_version(),
            last_updated: None,
            summary: S::default(),
            history: Vec::new(),
        }
    }
}

impl<S: Clone> CoverageFile<S> {
    /// Replace the summary and append a history row for the round.
    pub fn record(&mut self, round: u32, at: DateTime<Utc>, summary: S) {
        self.last_updated = Some(at);
        self.summary = summary.clone();
        self.history.push(CoverageHistoryEntry { round, at, summary });
    }
}

/// The five independent completion criteria. All must hold for the
/// discovery process to be considered complete; none is sticky.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionGates {
    pub route_gate: bool,
    pub feature_gate: bool,
    pub role_gate: bool,
    pub frontier_gate: bool,
    pub stagnation_gate: bool,
}

impl CompletionGates {
    pub fn all_pass(&self) -> bool {
        self.route_gate
            && self.feature_gate
            && self.role_gate
            && self.frontier_gate
            && self.stagnation_gate
    }
}
