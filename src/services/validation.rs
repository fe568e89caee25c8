//! Candidate validation.
//!
//! Pure pass/fail checks with a human-readable rejection reason. Rejections
//! are data, not errors: the merge engine records every one in the audit log
//! and keeps going.

use serde_json::Value;

use crate::domain::models::candidate::present;
use crate::domain::models::{FeatureCandidate, JourneyCandidate};

/// Parse a raw candidate value into `T`, mapping failures to the rejection
/// reasons the audit log records.
///
/// Anything that would require guessing a worker's intent is rejected, never
/// coerced past validation.
pub fn parse_candidate<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, String> {
    if !value.is_object() {
        return Err("Candidate is not an object".to_string());
    }
    serde_json::from_value(value.clone()).map_err(|err| format!("Malformed candidate: {err}"))
}

/// Validate a journey candidate against the acceptance rules.
pub fn validate_journey(candidate: &JourneyCandidate, minimum_confidence: f64) -> Result<(), String> {
    if !present(&candidate.role) {
        return Err("Missing role".to_string());
    }
    if !present(&candidate.goal) {
        return Err("Missing goal".to_string());
    }
    if candidate.steps.is_empty() && candidate.key_routes.is_empty() {
        return Err("Missing steps and keyRoutes".to_string());
    }
    if !has_journey_evidence(candidate) {
        return Err("Missing evidence".to_string());
    }
    check_confidence(candidate.confidence, minimum_confidence)
}

/// Validate a feature candidate against the acceptance rules.
pub fn validate_feature(candidate: &FeatureCandidate, minimum_confidence: f64) -> Result<(), String> {
    if !present(&candidate.role)
        || !present(&candidate.route)
        || !present(&candidate.state)
        || !present(&candidate.selector)
        || !present(&candidate.action)
    {
        return Err(
            "Missing one of required fields: role, route, state, selector, action".to_string(),
        );
    }
    if !present(&candidate.expected) {
        return Err("Missing expected assertion".to_string());
    }
    if !has_feature_evidence(candidate) {
        return Err("Missing evidence".to_string());
    }
    check_confidence(candidate.confidence, minimum_confidence)
}

/// Absent confidence normalizes to 0 and therefore fails unless the
/// configured minimum is 0.
fn check_confidence(confidence: Option<f64>, minimum: f64) -> Result<(), String> {
    let confidence = confidence.unwrap_or(0.0);
    if confidence.is_nan() || confidence < minimum {
        return Err(format!("Confidence below minimum ({minimum})"));
    }
    Ok(())
}

/// A journey needs either a top-level evidence entry with any payload field,
/// or at least one step whose evidence has a url/screenshot/log.
fn has_journey_evidence(candidate: &JourneyCandidate) -> bool {
    let top_level = candidate.evidence.iter().any(|entry| {
        present(&entry.path) || present(&entry.url) || present(&entry.note) || present(&entry.log)
    });

    let step_level = candidate.steps.iter().any(|step| {
        step.evidence.as_ref().is_some_and(|evidence| {
            present(&evidence.url) || present(&evidence.screenshot) || present(&evidence.log)
        })
    });

    top_level || step_level
}

/// A feature needs evidence with a url AND at least one of
/// assertion/screenshot/log.
fn has_feature_evidence(candidate: &FeatureCandidate) -> bool {
    candidate.evidence.as_ref().is_some_and(|evidence| {
        present(&evidence.url)
            && (present(&evidence.assertion)
                || present(&evidence.screenshot)
                || present(&evidence.log))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn journey(value: serde_json::Value) -> JourneyCandidate {
        serde_json::from_value(value).unwrap()
    }

    fn feature(value: serde_json::Value) -> FeatureCandidate {
        serde_json::from_value(value).unwrap()
    }

    fn valid_feature_value() -> serde_json::Value {
        json!({
            "role": "admin",
            "route": "/dashboard",
            "state": "default",
            "selector": "#filter",
            "action": "click",
            "expected": "Filter popup opens",
            "evidence": {"url": "/dashboard", "assertion": "popup visible"},
            "confidence": 0.9
        })
    }

    #[test]
    fn journey_requires_role_and_goal() {
        let missing_role = journey(json!({"goal": "g"}));
        assert_eq!(validate_journey(&missing_role, 0.0), Err("Missing role".to_string()));

        let missing_goal = journey(json!({"role": "admin"}));
        assert_eq!(validate_journey(&missing_goal, 0.0), Err("Missing goal".to_string()));
    }

    #[test]
    fn journey_requires_steps_or_key_routes() {
        let candidate = journey(json!({"role": "admin", "goal": "g"}));
        assert_eq!(
            validate_journey(&candidate, 0.0),
            Err("Missing steps and keyRoutes".to_string())
        );
    }

    #[test]
    fn journey_step_evidence_counts() {
        let candidate = journey(json!({
            "role": "admin",
            "goal": "g",
            "steps": [{"route": "/a", "evidence": {"screenshot": "a.png"}}],
            "confidence": 0.8
        }));
        assert_eq!(validate_journey(&candidate, 0.6), Ok(()));
    }

    #[test]
    fn journey_without_evidence_rejected() {
        let candidate = journey(json!({
            "role": "admin",
            "goal": "g",
            "keyRoutes": ["/a"],
            "confidence": 0.9
        }));
        assert_eq!(
            validate_journey(&candidate, 0.6),
            Err("Missing evidence".to_string())
        );
    }

    #[test]
    fn absent_confidence_fails_unless_minimum_is_zero() {
        let mut raw = json!({
            "role": "admin",
            "goal": "g",
            "keyRoutes": ["/a"],
            "evidence": [{"url": "/a"}]
        });
        let candidate = journey(raw.clone());
        assert_eq!(
            validate_journey(&candidate, 0.6),
            Err("Confidence below minimum (0.6)".to_string())
        );
        assert_eq!(validate_journey(&candidate, 0.0), Ok(()));

        raw["confidence"] = json!(0.59);
        let candidate = journey(raw);
        assert!(validate_journey(&candidate, 0.6).is_err());
    }

    #[test]
    fn feature_requires_all_target_fields() {
        let mut raw = valid_feature_value();
        raw.as_object_mut().unwrap().remove("selector");
        assert_eq!(
            validate_feature(&feature(raw), 0.6),
            Err("Missing one of required fields: role, route, state, selector, action".to_string())
        );
    }

    #[test]
    fn feature_requires_expected_assertion() {
        let mut raw = valid_feature_value();
        raw.as_object_mut().unwrap().remove("expected");
        assert_eq!(
            validate_feature(&feature(raw), 0.6),
            Err("Missing expected assertion".to_string())
        );
    }

    #[test]
    fn feature_evidence_needs_url_plus_proof() {
        let mut raw = valid_feature_value();
        raw["evidence"] = json!({"url": "/dashboard"});
        assert_eq!(
            validate_feature(&feature(raw.clone()), 0.6),
            Err("Missing evidence".to_string())
        );

        raw["evidence"] = json!({"assertion": "popup visible"});
        assert_eq!(
            validate_feature(&feature(raw), 0.6),
            Err("Missing evidence".to_string())
        );
    }

    #[test]
    fn valid_feature_passes() {
        assert_eq!(validate_feature(&feature(valid_feature_value()), 0.6), Ok(()));
    }

    #[test]
    fn non_object_candidate_rejected_at_parse() {
        let err = parse_candidate::<FeatureCandidate>(&json!("not an object")).unwrap_err();
        assert_eq!(err, "Candidate is not an object");
    }

    #[test]
    fn type_mismatch_rejected_at_parse() {
        let err =
            parse_candidate::<JourneyCandidate>(&json!({"steps": "not-an-array"})).unwrap_err();
        assert!(err.starts_with("Malformed candidate:"));
    }
}
