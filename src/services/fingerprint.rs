//! Stable identity: normalization, fingerprints, and deterministic ids.
//!
//! Fingerprints are the deduplication identity of accepted records; frontier
//! keys are a distinct identity for backlog items (they include `mode`, so
//! the same target can legitimately appear once per discovery mode).

use std::collections::HashSet;

use crate::domain::models::{
    ExpectedFeatureUnit, FeatureCandidate, FeatureFrontierItem, FeatureMode, JourneyCandidate,
    JourneyFrontierItem, JourneyMode,
};

/// Lowercase, trim, and collapse internal whitespace runs to single spaces.
pub fn normalize(value: &str) -> String {
    value
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_opt(value: &Option<String>) -> String {
    normalize(value.as_deref().unwrap_or(""))
}

/// 32-bit rolling hash (`h * 31 + unit`), hex-encoded to 8 chars.
///
/// Cryptographically unimportant; only stability across runs matters.
/// Collisions are resolved downstream by numeric suffixing.
pub fn stable_hash(input: &str) -> String {
    let mut hash: u32 = 0;
    for unit in input.encode_utf16() {
        hash = hash.wrapping_mul(31).wrapping_add(u32::from(unit));
    }
    format!("{hash:08x}")
}

/// Identity of a journey: role, goal, ordered key routes, terminal state.
pub fn journey_fingerprint(candidate: &JourneyCandidate) -> String {
    let routes = candidate
        .effective_key_routes()
        .iter()
        .map(|route| normalize(route))
        .collect::<Vec<_>>()
        .join(">");

    [
        normalize_opt(&candidate.role),
        normalize_opt(&candidate.goal),
        routes,
        normalize_opt(&candidate.terminal_state),
    ]
    .join("|")
}

/// Identity of a feature unit: role, route, state, selector, action.
pub fn feature_fingerprint(candidate: &FeatureCandidate) -> String {
    [
        normalize_opt(&candidate.role),
        normalize_opt(&candidate.route),
        normalize_opt(&candidate.state),
        normalize_opt(&candidate.selector),
        normalize_opt(&candidate.action),
    ]
    .join("|")
}

/// Fingerprint-equivalent key for a feature unit's raw fields.
pub fn feature_unit_key(
    role: &str,
    route: &str,
    state: &str,
    selector: &str,
    action: &str,
) -> String {
    [
        normalize(role),
        normalize(route),
        normalize(state),
        normalize(selector),
        normalize(action),
    ]
    .join("|")
}

/// Key an expected feature unit from config down to its coverage identity.
pub fn expected_feature_key(unit: &ExpectedFeatureUnit) -> String {
    match unit {
        ExpectedFeatureUnit::Key(key) => normalize(key),
        ExpectedFeatureUnit::Unit {
            role,
            route,
            state,
            selector,
            action,
        } => feature_unit_key(role, route, state, selector, action),
    }
}

/// Frontier identity for a journey item. Includes mode and note so the same
/// target can be queued once per strategy.
pub fn journey_frontier_key(item: &JourneyFrontierItem) -> String {
    let mode = if item.mode.is_empty() {
        JourneyMode::default().as_str()
    } else {
        item.mode.as_str()
    };
    [
        normalize(mode),
        normalize(&item.role),
        normalize(&item.route),
        normalize(&item.state),
        normalize(&item.note),
    ]
    .join("|")
}

/// Frontier identity for a feature item.
pub fn feature_frontier_key(item: &FeatureFrontierItem) -> String {
    let mode = if item.mode.is_empty() {
        FeatureMode::default().as_str()
    } else {
        item.mode.as_str()
    };
    [
        normalize(mode),
        normalize(&item.role),
        normalize(&item.route),
        normalize(&item.state),
        normalize(&item.selector),
        normalize(&item.action),
    ]
    .join("|")
}

/// Assign a stable id for an accepted record.
///
/// Uses the candidate-supplied id when present and unused; otherwise derives
/// `<prefix>-<hash>` from the fingerprint, appending `-2`, `-3`, ... on
/// collision. The chosen id is inserted into `existing_ids`.
pub fn ensure_id(
    prefix: &str,
    supplied: Option<&str>,
    existing_ids: &mut HashSet<String>,
    fingerprint: &str,
) -> String {
    if let Some(provided) = supplied.map(str::trim).filter(|s| !s.is_empty()) {
        if !existing_ids.contains(provided) {
            existing_ids.insert(provided.to_string());
            return provided.to_string();
        }
    }

    let generated = format!("{prefix}-{}", stable_hash(fingerprint));
    if !existing_ids.contains(&generated) {
        existing_ids.insert(generated.clone());
        return generated;
    }

    let mut suffix = 2u64;
    loop {
        let unique = format!("{generated}-{suffix}");
        if !existing_ids.contains(&unique) {
            existing_ids.insert(unique.clone());
            return unique;
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn journey(value: serde_json::Value) -> JourneyCandidate {
        serde_json::from_value(value).unwrap()
    }

    fn feature(value: serde_json::Value) -> FeatureCandidate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Submit   Order\n"), "submit order");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn journey_fingerprint_ignores_case_and_spacing() {
        let a = journey(json!({
            "role": "Admin",
            "goal": "Create   report",
            "keyRoutes": ["/Dashboard", "/Reports"],
            "terminalState": "report saved"
        }));
        let b = journey(json!({
            "role": "admin ",
            "goal": "create report",
            "keyRoutes": ["/dashboard", "/reports "],
            "terminal_state": "Report Saved"
        }));
        assert_eq!(journey_fingerprint(&a), journey_fingerprint(&b));
    }

    #[test]
    fn journey_fingerprint_uses_step_routes_when_key_routes_absent() {
        let a = journey(json!({
            "role": "admin",
            "goal": "g",
            "steps": [{"route": "/a"}, {"route": "/b"}],
            "terminalState": "t"
        }));
        let b = journey(json!({
            "role": "admin",
            "goal": "g",
            "keyRoutes": ["/a", "/b"],
            "terminalState": "t"
        }));
        assert_eq!(journey_fingerprint(&a), journey_fingerprint(&b));
    }

    #[test]
    fn feature_fingerprint_is_order_sensitive_tuple() {
        let a = feature(json!({
            "role": "admin", "route": "/r", "state": "default",
            "selector": "#save", "action": "click"
        }));
        assert_eq!(feature_fingerprint(&a), "admin|/r|default|#save|click");
    }

    #[test]
    fn expected_key_matches_unit_fingerprint() {
        let unit = ExpectedFeatureUnit::Unit {
            role: "Admin".to_string(),
            route: "/r".to_string(),
            state: "Default".to_string(),
            selector: "#save".to_string(),
            action: "Click".to_string(),
        };
        assert_eq!(expected_feature_key(&unit), "admin|/r|default|#save|click");
    }

    #[test]
    fn frontier_keys_default_empty_mode() {
        let blank = JourneyFrontierItem {
            id: "a".to_string(),
            mode: String::new(),
            role: "admin".to_string(),
            route: "/dashboard".to_string(),
            ..Default::default()
        };
        let explicit = JourneyFrontierItem {
            mode: "discover_new".to_string(),
            ..blank.clone()
        };
        assert_eq!(journey_frontier_key(&blank), journey_frontier_key(&explicit));

        let blank = FeatureFrontierItem {
            id: "b".to_string(),
            mode: String::new(),
            selector: "#x".to_string(),
            action: "click".to_string(),
            ..Default::default()
        };
        let explicit = FeatureFrontierItem {
            mode: "inventory".to_string(),
            ..blank.clone()
        };
        assert_eq!(feature_frontier_key(&blank), feature_frontier_key(&explicit));
    }

    #[test]
    fn ensure_id_prefers_supplied_then_hash_then_suffix() {
        let mut ids = HashSet::new();
        assert_eq!(ensure_id("journey", Some("mine"), &mut ids, "fp"), "mine");

        let hashed = ensure_id("journey", Some("mine"), &mut ids, "fp");
        assert_eq!(hashed, format!("journey-{}", stable_hash("fp")));

        let suffixed = ensure_id("journey", None, &mut ids, "fp");
        assert_eq!(suffixed, format!("journey-{}-2", stable_hash("fp")));
    }

    #[test]
    fn stable_hash_is_fixed_width() {
        assert_eq!(stable_hash("").len(), 8);
        assert_eq!(stable_hash("admin|/dashboard").len(), 8);
    }

    proptest! {
        #[test]
        fn fingerprint_deterministic_under_case_and_padding(
            role in "[a-zA-Z ]{1,12}",
            goal in "[a-zA-Z ]{1,20}",
            terminal in "[a-zA-Z ]{1,12}",
        ) {
            let a = journey(json!({
                "role": role, "goal": goal,
                "keyRoutes": ["/x"], "terminalState": terminal
            }));
            let b = journey(json!({
                "role": format!("  {}  ", role.to_uppercase()),
                "goal": goal.to_lowercase(),
                "keyRoutes": ["/X"],
                "terminalState": terminal.to_uppercase()
            }));
            prop_assert_eq!(journey_fingerprint(&a), journey_fingerprint(&b));
        }
    }
}
