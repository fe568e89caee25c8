//! Accepted maps: the permanent record of merged findings.
//!
//! Fingerprints are unique across each map for all time; once accepted, a
//! fingerprint can never be accepted again, even in a later round.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::candidate::{
    DiscoveredItem, FeatureEvidence, JourneyEvidenceEntry, JourneyStep,
};

/// Persisted journey map, `docs/journey-map.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JourneyMap {
    #[serde(default = "default_map_version")]
    pub version: u32,
    #[serde(default)]
    pub journeys: Vec<AcceptedJourney>,
}

impl Default for JourneyMap {
    fn default() -> Self {
        Self {
            version: default_map_version(),
            journeys: vec![],
        }
    }
}

/// Persisted feature map, `docs/feature-map.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureMap {
    #[serde(default = "default_map_version")]
    pub version: u32,
    #[serde(default)]
    pub features: Vec<AcceptedFeature>,
}

impl Default for FeatureMap {
    fn default() -> Self {
        Self {
            version: default_map_version(),
            features: vec![],
        }
    }
}

const fn default_map_version() -> u32 {
    1
}

/// An accepted end-to-end journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptedJourney {
    pub id: String,
    pub candidate_type: String,
    pub mode: String,
    pub role: String,
    pub goal: String,
    pub entrypoint: String,
    pub steps: Vec<JourneyStep>,
    pub terminal_state: String,
    pub key_routes: Vec<String>,
    pub status: String,
    pub evidence: Vec<JourneyEvidenceEntry>,
    pub confidence: f64,
    pub discovered_frontier: Vec<DiscoveredItem>,
    pub fingerprint: String,
    pub accepted_round: u32,
    pub accepted_at: Option<DateTime<Utc>>,
    pub source_file: String,
}

impl Default for AcceptedJourney {
    fn default() -> Self {
        Self {
            id: String::new(),
            candidate_type: "journey".to_string(),
            mode: "discover_new".to_string(),
            role: String::new(),
            goal: String::new(),
            entrypoint: String::new(),
            steps: vec![],
            terminal_state: String::new(),
            key_routes: vec![],
            status: "accepted".to_string(),
            evidence: vec![],
            confidence: 0.0,
            discovered_frontier: vec![],
            fingerprint: String::new(),
            accepted_round: 0,
            accepted_at: None,
            source_file: String::new(),
        }
    }
}

/// An accepted feature-level interaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptedFeature {
    pub id: String,
    pub candidate_type: String,
    pub mode: String,
    pub role: String,
    pub route: String,
    pub state: String,
    pub selector: String,
    pub action: String,
    pub expected: String,
    pub discovered_after: String,
    pub status: String,
    pub evidence: FeatureEvidence,
    pub confidence: f64,
    pub revealed_units: Vec<DiscoveredItem>,
    pub discovered_frontier: Vec<DiscoveredItem>,
    pub fingerprint: String,
    pub accepted_round: u32,
    pub accepted_at: Option<DateTime<Utc>>,
    pub source_file: String,
}

impl Default for AcceptedFeature {
    fn default() -> Self {
        Self {
            id: String::new(),
            candidate_type: "feature".to_string(),
            mode: "exercise".to_string(),
            role: String::new(),
            route: String::new(),
            state: String::new(),
            selector: String::new(),
            action: String::new(),
            expected: String::new(),
            discovered_after: String::new(),
            status: "exercised".to_string(),
            evidence: FeatureEvidence::default(),
            confidence: 0.0,
            revealed_units: vec![],
            discovered_frontier: vec![],
            fingerprint: String::new(),
            accepted_round: 0,
            accepted_at: None,
            source_file: String::new(),
        }
    }
}
