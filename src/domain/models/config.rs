//! Orchestration configuration.
//!
//! Persisted as `docs/orchestration.config.json`. Loaded through figment
//! (defaults, then file, then `UXMAP_*` environment overrides); the
//! `alias` attributes let snake_case env keys land on camelCase fields.

use serde::{Deserialize, Serialize};

/// Tunables for scheduling, validation, and the completion gates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Roles the target application is explored under. Every role must end
    /// up with at least one accepted journey for the role gate to pass.
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,

    /// Routes the application is expected to expose. Empty means the route
    /// coverage target is inapplicable.
    #[serde(default, alias = "expected_routes")]
    pub expected_routes: Vec<String>,

    /// Feature units expected to be exercised, as plain keys or
    /// feature-shaped objects. Empty means coverage is measured against the
    /// set of accepted feature fingerprints instead.
    #[serde(default, alias = "expected_feature_units")]
    pub expected_feature_units: Vec<ExpectedFeatureUnit>,

    #[serde(
        default = "default_target_route_coverage_pct",
        alias = "target_route_coverage_pct"
    )]
    pub target_route_coverage_pct: f64,

    #[serde(
        default = "default_target_feature_coverage_pct",
        alias = "target_feature_coverage_pct"
    )]
    pub target_feature_coverage_pct: f64,

    /// Consecutive no-findings rounds required before the stagnation gate
    /// opens.
    #[serde(default = "default_stagnation_threshold", alias = "stagnation_threshold")]
    pub stagnation_threshold: u32,

    /// Candidates below this confidence are rejected outright.
    #[serde(default = "default_minimum_confidence", alias = "minimum_confidence")]
    pub minimum_confidence: f64,

    /// Cap on tasks dispatched per round; overflow shards stay frontier-side.
    #[serde(default = "default_max_workers_per_round", alias = "max_workers_per_round")]
    pub max_workers_per_round: usize,

    /// Maximum frontier items assigned to one task.
    #[serde(default = "default_shard_size", alias = "default_shard_size")]
    pub default_shard_size: usize,
}

const fn default_version() -> u32 {
    1
}

fn default_roles() -> Vec<String> {
    vec![
        "admin".to_string(),
        "manager".to_string(),
        "worker".to_string(),
    ]
}

const fn default_target_route_coverage_pct() -> f64 {
    95.0
}

const fn default_target_feature_coverage_pct() -> f64 {
    100.0
}

const fn default_stagnation_threshold() -> u32 {
    3
}

const fn default_minimum_confidence() -> f64 {
    0.6
}

const fn default_max_workers_per_round() -> usize {
    6
}

const fn default_shard_size() -> usize {
    4
}

impl Default for OrchestrationConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            roles: default_roles(),
            expected_routes: vec![],
            expected_feature_units: vec![],
            target_route_coverage_pct: default_target_route_coverage_pct(),
            target_feature_coverage_pct: default_target_feature_coverage_pct(),
            stagnation_threshold: default_stagnation_threshold(),
            minimum_confidence: default_minimum_confidence(),
            max_workers_per_round: default_max_workers_per_round(),
            default_shard_size: default_shard_size(),
        }
    }
}

/// An expected feature unit: either a pre-normalized key string or a
/// feature-shaped object reduced to its fingerprint at coverage time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpectedFeatureUnit {
    Key(String),
    Unit {
        #[serde(default)]
        role: String,
        #[serde(default)]
        route: String,
        #[serde(default)]
        state: String,
        #[serde(default)]
        selector: String,
        #[serde(default)]
        action: String,
    },
}
