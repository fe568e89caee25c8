//! Worker-reported candidates.
//!
//! Candidates are transient: they exist only inside a round's output payload
//! and are either promoted into an accepted map or rejected with a reason.
//! Workers are external processes, so every field is optional at the parse
//! layer; validation decides what is actually required.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three legal shapes of a worker output file.
///
/// Any payload that matches none of these is a fatal shape error for the
/// whole merge.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkerPayload {
    /// Bare array of candidate objects.
    Batch(Vec<Value>),
    /// Object wrapping a `candidates` array.
    Wrapped { candidates: Vec<Value> },
    /// A single candidate object; only counted when it carries a
    /// `candidateType` tag.
    Single(Map<String, Value>),
}

impl WorkerPayload {
    /// Normalize the payload into a flat candidate sequence.
    pub fn into_candidates(self) -> Vec<Value> {
        match self {
            Self::Batch(values) => values,
            Self::Wrapped { candidates } => candidates,
            Self::Single(map) => {
                if map.contains_key("candidateType") {
                    vec![Value::Object(map)]
                } else {
                    vec![]
                }
            }
        }
    }
}

/// Which accepted map a candidate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Journey,
    Feature,
}

impl CandidateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Journey => "journey",
            Self::Feature => "feature",
        }
    }
}

/// One step of a reported journey. Unknown worker fields are preserved so
/// accepted journeys re-serialize what the worker observed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyStep {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<StepEvidence>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Evidence attached to a single journey step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Top-level journey evidence entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JourneyEvidenceEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Evidence object on a feature candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureEvidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A follow-up frontier item reported alongside an accepted finding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveredItem {
    pub id: Option<String>,
    pub kind: Option<String>,
    pub mode: Option<String>,
    pub role: Option<String>,
    pub route: Option<String>,
    pub state: Option<String>,
    pub selector: Option<String>,
    pub action: Option<String>,
    pub note: Option<String>,
    pub goal: Option<String>,
    pub expected: Option<String>,
    pub priority: Option<i64>,
}

/// A journey finding as reported by a worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JourneyCandidate {
    pub id: Option<String>,
    pub mode: Option<String>,
    pub role: Option<String>,
    pub goal: Option<String>,
    pub entrypoint: Option<String>,
    pub route: Option<String>,
    pub steps: Vec<JourneyStep>,
    pub key_routes: Vec<String>,
    #[serde(alias = "terminal_state")]
    pub terminal_state: Option<String>,
    pub evidence: Vec<JourneyEvidenceEntry>,
    pub confidence: Option<f64>,
    pub discovered_frontier: Vec<DiscoveredItem>,
}

impl JourneyCandidate {
    /// Key routes used for the fingerprint and the accepted record: explicit
    /// `keyRoutes` when present, else the routes of the reported steps.
    pub fn effective_key_routes(&self) -> Vec<String> {
        if self.key_routes.is_empty() {
            self.steps
                .iter()
                .filter_map(|step| step.route.clone())
                .filter(|route| !route.is_empty())
                .collect()
        } else {
            self.key_routes.clone()
        }
    }
}

/// A feature finding as reported by a worker.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureCandidate {
    pub id: Option<String>,
    pub mode: Option<String>,
    pub role: Option<String>,
    pub route: Option<String>,
    pub state: Option<String>,
    pub selector: Option<String>,
    pub action: Option<String>,
    pub expected: Option<String>,
    pub discovered_after: Option<String>,
    pub status: Option<String>,
    pub evidence: Option<FeatureEvidence>,
    pub confidence: Option<f64>,
    pub revealed_units: Vec<DiscoveredItem>,
    pub discovered_frontier: Vec<DiscoveredItem>,
}

/// Truthiness helper for optional worker strings: present and non-empty.
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}
