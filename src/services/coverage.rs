//! Coverage computation and gate evaluation.
//!
//! Summaries are always computed from the full accepted maps, never patched
//! incrementally. Gates are re-evaluated on every merge and are not sticky;
//! frontier growth in a later round can close a previously open gate.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::domain::models::{
    CompletionGates, FeatureCoverageSummary, FeatureFrontierItem, FeatureMap, FrontierFile,
    JourneyCoverageSummary, JourneyFrontierItem, JourneyMap, OrchestrationConfig,
    RoleFeatureTally,
};
use crate::services::fingerprint::{expected_feature_key, feature_unit_key, normalize};

/// Round a percentage to two decimals.
fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Compute journey coverage from the accepted journey map.
pub fn journey_coverage(
    map: &JourneyMap,
    config: &OrchestrationConfig,
) -> JourneyCoverageSummary {
    let mut by_role: BTreeMap<String, usize> = BTreeMap::new();
    let mut discovered_routes: HashSet<String> = HashSet::new();

    for journey in &map.journeys {
        let role = if journey.role.is_empty() {
            "unknown".to_string()
        } else {
            journey.role.clone()
        };
        *by_role.entry(role).or_insert(0) += 1;

        for route in &journey.key_routes {
            discovered_routes.insert(normalize(route));
        }
        for step in &journey.steps {
            if let Some(route) = &step.route {
                if !route.is_empty() {
                    discovered_routes.insert(normalize(route));
                }
            }
        }
    }

    let expected: Vec<String> = config
        .expected_routes
        .iter()
        .map(|route| normalize(route))
        .filter(|route| !route.is_empty())
        .collect();

    let route_coverage_pct = if expected.is_empty() {
        None
    } else {
        let covered = expected
            .iter()
            .filter(|route| discovered_routes.contains(*route))
            .count();
        #[allow(clippy::cast_precision_loss)]
        Some(round_two(covered as f64 / expected.len() as f64 * 100.0))
    };

    JourneyCoverageSummary {
        total_journeys: map.journeys.len(),
        routes_discovered: discovered_routes.len(),
        route_coverage_pct,
        by_role,
    }
}

/// Compute feature coverage from the accepted feature map.
///
/// With expected feature units configured the denominator is fixed;
/// otherwise it is the set of distinct accepted fingerprints, with
/// "exercised" meaning status `exercised` or mode `exercise`.
pub fn feature_coverage(
    map: &FeatureMap,
    config: &OrchestrationConfig,
) -> FeatureCoverageSummary {
    let mut by_role: BTreeMap<String, RoleFeatureTally> = BTreeMap::new();
    let mut all_keys: HashSet<String> = HashSet::new();
    let mut exercised_keys: HashSet<String> = HashSet::new();

    for feature in &map.features {
        let key = if feature.fingerprint.is_empty() {
            feature_unit_key(
                &feature.role,
                &feature.route,
                &feature.state,
                &feature.selector,
                &feature.action,
            )
        } else {
            feature.fingerprint.clone()
        };
        all_keys.insert(key.clone());

        let role = if feature.role.is_empty() {
            "unknown".to_string()
        } else {
            feature.role.clone()
        };
        let tally = by_role.entry(role).or_default();
        tally.total += 1;

        if normalize(&feature.status) == "exercised" || normalize(&feature.mode) == "exercise" {
            exercised_keys.insert(key);
            tally.exercised += 1;
        }
    }

    let expected: Vec<String> = config
        .expected_feature_units
        .iter()
        .map(expected_feature_key)
        .filter(|key| !key.is_empty())
        .collect();

    let (total_feature_units, exercised_feature_units) = if expected.is_empty() {
        (all_keys.len(), exercised_keys.len())
    } else {
        let exercised = expected
            .iter()
            .filter(|key| exercised_keys.contains(*key))
            .count();
        (expected.len(), exercised)
    };

    let feature_coverage_pct = if total_feature_units == 0 {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        round_two(exercised_feature_units as f64 / total_feature_units as f64 * 100.0)
    };

    FeatureCoverageSummary {
        total_feature_units,
        exercised_feature_units,
        feature_coverage_pct,
        by_role,
    }
}

/// Evaluate the five completion gates.
pub fn evaluate_gates(
    journey_summary: &JourneyCoverageSummary,
    feature_summary: &FeatureCoverageSummary,
    journey_frontier: &FrontierFile<JourneyFrontierItem>,
    feature_frontier: &FrontierFile<FeatureFrontierItem>,
    no_findings_streak: u32,
    config: &OrchestrationConfig,
) -> CompletionGates {
    let route_gate = journey_summary
        .route_coverage_pct
        .is_none_or(|pct| pct >= config.target_route_coverage_pct);

    let feature_gate = feature_summary.feature_coverage_pct >= config.target_feature_coverage_pct;

    let role_gate = config
        .roles
        .iter()
        .all(|role| journey_summary.by_role.get(role).copied().unwrap_or(0) > 0);

    let frontier_gate = journey_frontier.items.is_empty() && feature_frontier.items.is_empty();

    let stagnation_gate = no_findings_streak >= config.stagnation_threshold;

    CompletionGates {
        route_gate,
        feature_gate,
        role_gate,
        frontier_gate,
        stagnation_gate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AcceptedFeature, AcceptedJourney, ExpectedFeatureUnit};
    use serde_json::json;

    fn journey(role: &str, key_routes: &[&str]) -> AcceptedJourney {
        AcceptedJourney {
            role: role.to_string(),
            key_routes: key_routes.iter().map(|r| (*r).to_string()).collect(),
            ..Default::default()
        }
    }

    fn feature(role: &str, selector: &str, status: &str) -> AcceptedFeature {
        AcceptedFeature {
            role: role.to_string(),
            route: "/r".to_string(),
            state: "default".to_string(),
            selector: selector.to_string(),
            action: "click".to_string(),
            mode: "inventory".to_string(),
            status: status.to_string(),
            fingerprint: feature_unit_key(role, "/r", "default", selector, "click"),
            ..Default::default()
        }
    }

    #[test]
    fn route_pct_is_null_without_expected_routes() {
        let map = JourneyMap {
            journeys: vec![journey("admin", &["/a"])],
            ..Default::default()
        };
        let summary = journey_coverage(&map, &OrchestrationConfig::default());
        assert_eq!(summary.route_coverage_pct, None);
        assert_eq!(summary.routes_discovered, 1);
        assert_eq!(summary.by_role["admin"], 1);
    }

    #[test]
    fn route_pct_measures_expected_routes() {
        let mut config = OrchestrationConfig::default();
        config.expected_routes = vec!["/a".to_string(), "/b".to_string(), "/c".to_string()];
        let map = JourneyMap {
            journeys: vec![journey("admin", &["/A", "/b"])],
            ..Default::default()
        };
        let summary = journey_coverage(&map, &config);
        assert_eq!(summary.route_coverage_pct, Some(66.67));
    }

    #[test]
    fn route_pct_stays_within_bounds() {
        let mut config = OrchestrationConfig::default();
        config.expected_routes = vec!["/a".to_string()];
        let empty = journey_coverage(&JourneyMap::default(), &config);
        assert_eq!(empty.route_coverage_pct, Some(0.0));

        let map = JourneyMap {
            journeys: vec![journey("admin", &["/a", "/extra"])],
            ..Default::default()
        };
        let full = journey_coverage(&map, &config);
        assert_eq!(full.route_coverage_pct, Some(100.0));
    }

    #[test]
    fn step_routes_count_toward_discovery() {
        let mut accepted = journey("admin", &[]);
        accepted.steps = vec![serde_json::from_value(json!({"route": "/from-step"})).unwrap()];
        let map = JourneyMap {
            journeys: vec![accepted],
            ..Default::default()
        };
        let summary = journey_coverage(&map, &OrchestrationConfig::default());
        assert_eq!(summary.routes_discovered, 1);
    }

    #[test]
    fn feature_pct_without_expected_units_uses_fingerprints() {
        let map = FeatureMap {
            features: vec![
                feature("admin", "#a", "exercised"),
                feature("admin", "#b", "inventoried"),
            ],
            ..Default::default()
        };
        let summary = feature_coverage(&map, &OrchestrationConfig::default());
        assert_eq!(summary.total_feature_units, 2);
        assert_eq!(summary.exercised_feature_units, 1);
        assert_eq!(summary.feature_coverage_pct, 50.0);
        assert_eq!(summary.by_role["admin"].total, 2);
        assert_eq!(summary.by_role["admin"].exercised, 1);
    }

    #[test]
    fn feature_pct_against_expected_units() {
        let mut config = OrchestrationConfig::default();
        config.expected_feature_units = vec![
            ExpectedFeatureUnit::Key("admin|/r|default|#a|click".to_string()),
            ExpectedFeatureUnit::Key("admin|/r|default|#missing|click".to_string()),
        ];
        let map = FeatureMap {
            features: vec![feature("admin", "#a", "exercised")],
            ..Default::default()
        };
        let summary = feature_coverage(&map, &config);
        assert_eq!(summary.total_feature_units, 2);
        assert_eq!(summary.exercised_feature_units, 1);
        assert_eq!(summary.feature_coverage_pct, 50.0);
    }

    #[test]
    fn exercise_mode_counts_as_exercised() {
        let mut accepted = feature("admin", "#a", "pending");
        accepted.mode = "exercise".to_string();
        let map = FeatureMap {
            features: vec![accepted],
            ..Default::default()
        };
        let summary = feature_coverage(&map, &OrchestrationConfig::default());
        assert_eq!(summary.exercised_feature_units, 1);
    }

    #[test]
    fn empty_feature_map_yields_zero_pct() {
        let summary = feature_coverage(&FeatureMap::default(), &OrchestrationConfig::default());
        assert_eq!(summary.feature_coverage_pct, 0.0);
        assert_eq!(summary.total_feature_units, 0);
    }

    #[test]
    fn gates_cover_all_criteria() {
        let mut config = OrchestrationConfig::default();
        config.roles = vec!["admin".to_string()];
        config.target_feature_coverage_pct = 100.0;
        config.stagnation_threshold = 2;

        let journey_summary = JourneyCoverageSummary {
            total_journeys: 1,
            routes_discovered: 1,
            route_coverage_pct: None,
            by_role: [("admin".to_string(), 1)].into_iter().collect(),
        };
        let feature_summary = FeatureCoverageSummary {
            total_feature_units: 1,
            exercised_feature_units: 1,
            feature_coverage_pct: 100.0,
            by_role: BTreeMap::new(),
        };

        let gates = evaluate_gates(
            &journey_summary,
            &feature_summary,
            &FrontierFile::default(),
            &FrontierFile::default(),
            2,
            &config,
        );
        assert!(gates.all_pass());

        let gates = evaluate_gates(
            &journey_summary,
            &feature_summary,
            &FrontierFile {
                version: 1,
                items: vec![JourneyFrontierItem::default()],
            },
            &FrontierFile::default(),
            2,
            &config,
        );
        assert!(!gates.frontier_gate);
        assert!(!gates.all_pass());
    }

    #[test]
    fn role_gate_requires_every_configured_role() {
        let mut config = OrchestrationConfig::default();
        config.roles = vec!["admin".to_string(), "manager".to_string()];
        let journey_summary = JourneyCoverageSummary {
            by_role: [("admin".to_string(), 2)].into_iter().collect(),
            ..Default::default()
        };
        let gates = evaluate_gates(
            &journey_summary,
            &FeatureCoverageSummary::default(),
            &FrontierFile::default(),
            &FrontierFile::default(),
            0,
            &config,
        );
        assert!(!gates.role_gate);
    }
}
