//! Merge engine: fold one round's worker outputs into the accepted maps.
//!
//! The pass is pure: it consumes the round's outputs plus the current
//! persisted documents and produces every updated document in memory. The
//! caller persists them afterwards, so a crash mid-merge never leaves the
//! accepted maps ahead of the frontier or state files. Re-running the pass
//! is guarded by the pending-round marker, not by this module.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::domain::models::{
    round_slug, AcceptedFeature, AcceptedJourney, AuditDecision, AuditRecord, CandidateKind,
    CompletionGates, DiscoveredItem, FeatureCandidate, FeatureCoverageSummary,
    FeatureFrontierItem, FeatureMap, FeatureMode, FrontierFile, JourneyCandidate,
    JourneyCoverageSummary, JourneyFrontierItem, JourneyMap, JourneyMode, ManifestMergeSummary,
    OrchestrationConfig, OrchestrationState, RoundHistoryEntry, RoundManifest, RoundStatus,
    TaskItems, WorkerPayload,
};
use crate::services::coverage::{evaluate_gates, feature_coverage, journey_coverage};
use crate::services::fingerprint::{
    ensure_id, feature_fingerprint, feature_frontier_key, feature_unit_key, journey_fingerprint,
    journey_frontier_key, normalize, stable_hash,
};
use crate::services::validation::{parse_candidate, validate_feature, validate_journey};

/// One parsed worker output file, discovered in lexicographic name order.
#[derive(Debug, Clone)]
pub struct WorkerOutput {
    pub file_name: String,
    pub payload: WorkerPayload,
}

/// Everything the merge pass reads. Assembled by the `merge-round` command.
#[derive(Debug)]
pub struct MergeInputs {
    pub round: u32,
    pub manifest: RoundManifest,
    pub outputs: Vec<WorkerOutput>,
    /// Items of each dispatched task, keyed by task id; used to requeue
    /// shards whose worker never reported.
    pub task_shards: BTreeMap<String, TaskItems>,
    pub journey_map: JourneyMap,
    pub feature_map: FeatureMap,
    pub journey_frontier: FrontierFile<JourneyFrontierItem>,
    pub feature_frontier: FrontierFile<FeatureFrontierItem>,
    pub config: OrchestrationConfig,
    pub state: OrchestrationState,
    pub now: DateTime<Utc>,
}

/// Everything the merge pass produces. Persisted by the caller only after
/// the whole pass succeeded.
#[derive(Debug)]
pub struct MergeOutcome {
    pub journey_map: JourneyMap,
    pub feature_map: FeatureMap,
    pub journey_frontier: FrontierFile<JourneyFrontierItem>,
    pub feature_frontier: FrontierFile<FeatureFrontierItem>,
    pub journey_coverage: JourneyCoverageSummary,
    pub feature_coverage: FeatureCoverageSummary,
    pub journey_audit: Vec<AuditRecord>,
    pub feature_audit: Vec<AuditRecord>,
    pub gates: CompletionGates,
    pub completed: bool,
    pub state: OrchestrationState,
    pub manifest: RoundManifest,
    pub summary: MergeSummary,
}

/// `merge-summary.json` written into the round directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub round: u32,
    pub round_slug: String,
    pub merged_at: DateTime<Utc>,
    pub counts: MergeCounts,
    pub coverage: CoverageBlock,
    pub frontier: FrontierRemaining,
    pub no_findings_streak: u32,
    pub gates: CompletionGates,
    pub completed: bool,
    pub rejected_examples: RejectedExamples,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCounts {
    pub accepted_journeys: usize,
    pub rejected_journeys: usize,
    pub accepted_features: usize,
    pub rejected_features: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageBlock {
    pub journey: JourneyCoverageSummary,
    pub feature: FeatureCoverageSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontierRemaining {
    pub journey_remaining: usize,
    pub feature_remaining: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedExamples {
    pub journey: Vec<RejectedExample>,
    pub feature: Vec<RejectedExample>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedExample {
    pub reason: String,
    pub source_file: String,
}

struct RawCandidate {
    value: Value,
    source_file: String,
}

struct Rejection {
    value: Value,
    source_file: String,
    reason: String,
}

/// Run the merge pass for a pending round.
pub fn merge_round(inputs: MergeInputs) -> MergeOutcome {
    let MergeInputs {
        round,
        mut manifest,
        outputs,
        task_shards,
        mut journey_map,
        mut feature_map,
        journey_frontier,
        feature_frontier,
        config,
        mut state,
        now,
    } = inputs;

    // Step 2: normalize payload shapes into per-domain candidate sequences,
    // in deterministic output order. First occurrence wins on duplicates.
    let mut journey_raw: Vec<RawCandidate> = Vec::new();
    let mut feature_raw: Vec<RawCandidate> = Vec::new();
    let mut reported_task_ids: HashSet<String> = HashSet::new();

    for output in outputs {
        let fallback = if output.file_name.contains("journey-") {
            CandidateKind::Journey
        } else {
            CandidateKind::Feature
        };
        let task_id = output
            .file_name
            .strip_suffix(".json")
            .unwrap_or(&output.file_name)
            .to_string();
        reported_task_ids.insert(task_id);

        for value in output.payload.clone().into_candidates() {
            let kind = candidate_kind(&value, fallback);
            let raw = RawCandidate {
                value,
                source_file: output.file_name.clone(),
            };
            match kind {
                CandidateKind::Journey => journey_raw.push(raw),
                CandidateKind::Feature => feature_raw.push(raw),
            }
        }
    }

    // Steps 3-5: validate, dedupe by fingerprint, assign ids, accept.
    let mut seen_journey_fps: HashSet<String> = journey_map
        .journeys
        .iter()
        .map(accepted_journey_fingerprint)
        .collect();
    let mut seen_feature_fps: HashSet<String> = feature_map
        .features
        .iter()
        .map(accepted_feature_fingerprint)
        .collect();
    let mut journey_ids: HashSet<String> =
        journey_map.journeys.iter().map(|j| j.id.clone()).collect();
    let mut feature_ids: HashSet<String> =
        feature_map.features.iter().map(|f| f.id.clone()).collect();

    let mut accepted_journeys: Vec<AcceptedJourney> = Vec::new();
    let mut rejected_journeys: Vec<Rejection> = Vec::new();

    for raw in journey_raw {
        let candidate: JourneyCandidate = match parse_candidate(&raw.value) {
            Ok(candidate) => candidate,
            Err(reason) => {
                rejected_journeys.push(Rejection {
                    value: raw.value,
                    source_file: raw.source_file,
                    reason,
                });
                continue;
            }
        };
        if let Err(reason) = validate_journey(&candidate, config.minimum_confidence) {
            rejected_journeys.push(Rejection {
                value: raw.value,
                source_file: raw.source_file,
                reason,
            });
            continue;
        }

        let fingerprint = journey_fingerprint(&candidate);
        if seen_journey_fps.contains(&fingerprint) {
            rejected_journeys.push(Rejection {
                value: raw.value,
                source_file: raw.source_file,
                reason: "Duplicate journey fingerprint".to_string(),
            });
            continue;
        }
        seen_journey_fps.insert(fingerprint.clone());

        let id = ensure_id(
            "journey",
            candidate.id.as_deref(),
            &mut journey_ids,
            &fingerprint,
        );
        accepted_journeys.push(accept_journey(
            id,
            &candidate,
            fingerprint,
            round,
            now,
            raw.source_file,
        ));
    }

    let mut accepted_features: Vec<AcceptedFeature> = Vec::new();
    let mut rejected_features: Vec<Rejection> = Vec::new();

    for raw in feature_raw {
        let candidate: FeatureCandidate = match parse_candidate(&raw.value) {
            Ok(candidate) => candidate,
            Err(reason) => {
                rejected_features.push(Rejection {
                    value: raw.value,
                    source_file: raw.source_file,
                    reason,
                });
                continue;
            }
        };
        if let Err(reason) = validate_feature(&candidate, config.minimum_confidence) {
            rejected_features.push(Rejection {
                value: raw.value,
                source_file: raw.source_file,
                reason,
            });
            continue;
        }

        let fingerprint = feature_fingerprint(&candidate);
        if seen_feature_fps.contains(&fingerprint) {
            rejected_features.push(Rejection {
                value: raw.value,
                source_file: raw.source_file,
                reason: "Duplicate feature unit".to_string(),
            });
            continue;
        }
        seen_feature_fps.insert(fingerprint.clone());

        let id = ensure_id(
            "feature",
            candidate.id.as_deref(),
            &mut feature_ids,
            &fingerprint,
        );
        accepted_features.push(accept_feature(
            id,
            &candidate,
            fingerprint,
            round,
            now,
            raw.source_file,
        ));
    }

    journey_map.journeys.extend(accepted_journeys.iter().cloned());
    feature_map.features.extend(accepted_features.iter().cloned());

    // Step 6: frontier reconciliation. Assigned items leave the frontier;
    // shards of unreported tasks come straight back, tagged as requeued.
    let assigned_journeys: HashSet<&String> = manifest.selected_journey_ids.iter().collect();
    let assigned_features: HashSet<&String> = manifest.selected_feature_ids.iter().collect();

    let mut journey_frontier = FrontierFile {
        version: journey_frontier.version,
        items: journey_frontier
            .items
            .into_iter()
            .filter(|item| !assigned_journeys.contains(&item.id))
            .collect::<Vec<_>>(),
    };
    let mut feature_frontier = FrontierFile {
        version: feature_frontier.version,
        items: feature_frontier
            .items
            .into_iter()
            .filter(|item| !assigned_features.contains(&item.id))
            .collect::<Vec<_>>(),
    };

    for task in &manifest.tasks {
        if reported_task_ids.contains(&task.task_id) {
            continue;
        }
        warn!(task_id = %task.task_id, "no output reported; requeueing shard");
        match task_shards.get(&task.task_id) {
            Some(TaskItems::Journey(items)) => {
                for item in items {
                    let mut item = item.clone();
                    item.note = requeue_note(&item.note);
                    journey_frontier.items.push(item);
                }
            }
            Some(TaskItems::Feature(items)) => {
                for item in items {
                    let mut item = item.clone();
                    item.note = requeue_note(&item.note);
                    feature_frontier.items.push(item);
                }
            }
            None => {}
        }
    }

    // Step 7: ingest follow-up discoveries from accepted findings.
    let mut discovered: Vec<DiscoveredItem> = Vec::new();
    for journey in &accepted_journeys {
        discovered.extend(journey.discovered_frontier.iter().cloned());
    }
    for feature in &accepted_features {
        discovered.extend(feature.revealed_units.iter().cloned());
        discovered.extend(feature.discovered_frontier.iter().cloned());
    }

    let mut journey_keys: HashSet<String> = journey_frontier
        .items
        .iter()
        .map(journey_frontier_key)
        .collect();
    let mut feature_keys: HashSet<String> = feature_frontier
        .items
        .iter()
        .map(feature_frontier_key)
        .collect();

    for item in discovered {
        match discovered_kind(&item) {
            CandidateKind::Journey => {
                let coerced = coerce_journey_item(&item);
                let key = journey_frontier_key(&coerced);
                if journey_keys.insert(key) {
                    journey_frontier.items.push(coerced);
                }
            }
            CandidateKind::Feature => {
                let coerced = coerce_feature_item(&item);
                let key = feature_frontier_key(&coerced);
                if feature_keys.insert(key) {
                    feature_frontier.items.push(coerced);
                }
            }
        }
    }

    // Step 8: coverage, recomputed from the fully updated maps.
    let journey_summary = journey_coverage(&journey_map, &config);
    let feature_summary = feature_coverage(&feature_map, &config);

    // Step 9: audit records, accepted before rejected, per domain.
    let journey_audit = audit_records(round, now, &accepted_journeys, &rejected_journeys);
    let feature_audit = audit_records(round, now, &accepted_features, &rejected_features);

    // Step 10: state, gates, history.
    let findings = accepted_journeys.len() + accepted_features.len();
    if findings == 0 {
        state.consecutive_no_findings += 1;
    } else {
        state.consecutive_no_findings = 0;
    }

    let gates = evaluate_gates(
        &journey_summary,
        &feature_summary,
        &journey_frontier,
        &feature_frontier,
        state.consecutive_no_findings,
        &config,
    );
    let completed = gates.all_pass();

    state.round = round;
    state.pending_round = None;
    state.completed = completed;
    state.last_run_at = Some(now);
    state.history.push(RoundHistoryEntry {
        round,
        at: now,
        accepted_journeys: accepted_journeys.len(),
        rejected_journeys: rejected_journeys.len(),
        accepted_features: accepted_features.len(),
        rejected_features: rejected_features.len(),
        no_findings_streak: state.consecutive_no_findings,
        gates,
        completed,
    });

    let summary = MergeSummary {
        round,
        round_slug: round_slug(round),
        merged_at: now,
        counts: MergeCounts {
            accepted_journeys: accepted_journeys.len(),
            rejected_journeys: rejected_journeys.len(),
            accepted_features: accepted_features.len(),
            rejected_features: rejected_features.len(),
        },
        coverage: CoverageBlock {
            journey: journey_summary.clone(),
            feature: feature_summary.clone(),
        },
        frontier: FrontierRemaining {
            journey_remaining: journey_frontier.items.len(),
            feature_remaining: feature_frontier.items.len(),
        },
        no_findings_streak: state.consecutive_no_findings,
        gates,
        completed,
        rejected_examples: RejectedExamples {
            journey: rejected_examples(&rejected_journeys),
            feature: rejected_examples(&rejected_features),
        },
    };

    manifest.status = RoundStatus::Merged;
    manifest.merged_at = Some(now);
    manifest.merge_summary = Some(ManifestMergeSummary {
        accepted_journeys: accepted_journeys.len(),
        accepted_features: accepted_features.len(),
        completed,
    });

    info!(
        round,
        accepted_journeys = accepted_journeys.len(),
        rejected_journeys = rejected_journeys.len(),
        accepted_features = accepted_features.len(),
        rejected_features = rejected_features.len(),
        completed,
        "merged round"
    );

    MergeOutcome {
        journey_map,
        feature_map,
        journey_frontier,
        feature_frontier,
        journey_coverage: journey_summary,
        feature_coverage: feature_summary,
        journey_audit,
        feature_audit,
        gates,
        completed,
        state,
        manifest,
        summary,
    }
}

/// Explicit type tag wins; otherwise the task's agent family decides.
fn candidate_kind(value: &Value, fallback: CandidateKind) -> CandidateKind {
    match value.get("candidateType").and_then(Value::as_str) {
        Some("journey") => CandidateKind::Journey,
        Some("feature") => CandidateKind::Feature,
        _ => fallback,
    }
}

fn requeue_note(note: &str) -> String {
    format!("{note} [requeued: missing output]").trim().to_string()
}

/// Classify a follow-up discovery: explicit kind, then mode, then shape.
fn discovered_kind(item: &DiscoveredItem) -> CandidateKind {
    match item.kind.as_deref() {
        Some("journey") => return CandidateKind::Journey,
        Some("feature") => return CandidateKind::Feature,
        _ => {}
    }
    if let Some(mode) = item.mode.as_deref() {
        if JourneyMode::from_str(mode).is_some() {
            return CandidateKind::Journey;
        }
        if FeatureMode::from_str(mode).is_some() {
            return CandidateKind::Feature;
        }
    }
    let has_selector = item.selector.as_deref().is_some_and(|s| !s.is_empty());
    let has_action = item.action.as_deref().is_some_and(|s| !s.is_empty());
    if has_selector || has_action {
        CandidateKind::Feature
    } else {
        CandidateKind::Journey
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|s| !s.is_empty())
}

fn coerce_journey_item(item: &DiscoveredItem) -> JourneyFrontierItem {
    // The id hash is taken over the raw fields; frontier dedup keys are
    // taken over the coerced item afterwards.
    let raw_key = [
        normalize(item.mode.as_deref().unwrap_or("discover_new")),
        normalize(item.role.as_deref().unwrap_or("")),
        normalize(item.route.as_deref().unwrap_or("")),
        normalize(item.state.as_deref().unwrap_or("")),
        normalize(item.note.as_deref().unwrap_or("")),
    ]
    .join("|");

    JourneyFrontierItem {
        id: non_empty(&item.id)
            .unwrap_or_else(|| format!("journey-frontier-{}", stable_hash(&raw_key))),
        mode: non_empty(&item.mode).unwrap_or_else(|| "discover_new".to_string()),
        role: non_empty(&item.role).unwrap_or_else(|| "admin".to_string()),
        route: non_empty(&item.route).unwrap_or_else(|| "/dashboard".to_string()),
        state: non_empty(&item.state).unwrap_or_else(|| "default".to_string()),
        note: non_empty(&item.note)
            .or_else(|| non_empty(&item.goal))
            .unwrap_or_else(|| "Discovered follow-up journey".to_string()),
        priority: Some(item.priority.unwrap_or(3)),
    }
}

fn coerce_feature_item(item: &DiscoveredItem) -> FeatureFrontierItem {
    let raw_key = [
        normalize(item.mode.as_deref().unwrap_or("inventory")),
        normalize(item.role.as_deref().unwrap_or("")),
        normalize(item.route.as_deref().unwrap_or("")),
        normalize(item.state.as_deref().unwrap_or("")),
        normalize(item.selector.as_deref().unwrap_or("")),
        normalize(item.action.as_deref().unwrap_or("")),
    ]
    .join("|");

    FeatureFrontierItem {
        id: non_empty(&item.id)
            .unwrap_or_else(|| format!("feature-frontier-{}", stable_hash(&raw_key))),
        mode: non_empty(&item.mode).unwrap_or_else(|| "inventory".to_string()),
        role: non_empty(&item.role).unwrap_or_else(|| "admin".to_string()),
        route: non_empty(&item.route).unwrap_or_else(|| "/dashboard".to_string()),
        state: non_empty(&item.state).unwrap_or_else(|| "default".to_string()),
        selector: non_empty(&item.selector).unwrap_or_else(|| "unknown-selector".to_string()),
        action: non_empty(&item.action).unwrap_or_else(|| "click".to_string()),
        note: non_empty(&item.note)
            .or_else(|| non_empty(&item.expected))
            .unwrap_or_else(|| "Discovered follow-up feature".to_string()),
        priority: Some(item.priority.unwrap_or(3)),
    }
}

fn accept_journey(
    id: String,
    candidate: &JourneyCandidate,
    fingerprint: String,
    round: u32,
    now: DateTime<Utc>,
    source_file: String,
) -> AcceptedJourney {
    AcceptedJourney {
        id,
        candidate_type: "journey".to_string(),
        mode: non_empty(&candidate.mode).unwrap_or_else(|| "discover_new".to_string()),
        role: candidate.role.clone().unwrap_or_default(),
        goal: candidate.goal.clone().unwrap_or_default(),
        entrypoint: non_empty(&candidate.entrypoint)
            .or_else(|| non_empty(&candidate.route))
            .unwrap_or_else(|| "/dashboard".to_string()),
        steps: candidate.steps.clone(),
        terminal_state: non_empty(&candidate.terminal_state)
            .unwrap_or_else(|| "terminal state unspecified".to_string()),
        key_routes: candidate.effective_key_routes(),
        status: "accepted".to_string(),
        evidence: candidate.evidence.clone(),
        confidence: candidate.confidence.unwrap_or(0.0),
        discovered_frontier: candidate.discovered_frontier.clone(),
        fingerprint,
        accepted_round: round,
        accepted_at: Some(now),
        source_file,
    }
}

fn accept_feature(
    id: String,
    candidate: &FeatureCandidate,
    fingerprint: String,
    round: u32,
    now: DateTime<Utc>,
    source_file: String,
) -> AcceptedFeature {
    AcceptedFeature {
        id,
        candidate_type: "feature".to_string(),
        mode: non_empty(&candidate.mode).unwrap_or_else(|| "exercise".to_string()),
        role: candidate.role.clone().unwrap_or_default(),
        route: candidate.route.clone().unwrap_or_default(),
        state: candidate.state.clone().unwrap_or_default(),
        selector: candidate.selector.clone().unwrap_or_default(),
        action: candidate.action.clone().unwrap_or_default(),
        expected: candidate.expected.clone().unwrap_or_default(),
        discovered_after: candidate.discovered_after.clone().unwrap_or_default(),
        status: non_empty(&candidate.status).unwrap_or_else(|| "exercised".to_string()),
        evidence: candidate.evidence.clone().unwrap_or_default(),
        confidence: candidate.confidence.unwrap_or(0.0),
        revealed_units: candidate.revealed_units.clone(),
        discovered_frontier: candidate.discovered_frontier.clone(),
        fingerprint,
        accepted_round: round,
        accepted_at: Some(now),
        source_file,
    }
}

/// Fingerprint of an already-accepted journey, recomputed when the stored
/// one is missing (hand-edited maps).
fn accepted_journey_fingerprint(journey: &AcceptedJourney) -> String {
    if !journey.fingerprint.is_empty() {
        return journey.fingerprint.clone();
    }
    let routes = journey
        .key_routes
        .iter()
        .map(|route| normalize(route))
        .collect::<Vec<_>>()
        .join(">");
    [
        normalize(&journey.role),
        normalize(&journey.goal),
        routes,
        normalize(&journey.terminal_state),
    ]
    .join("|")
}

fn accepted_feature_fingerprint(feature: &AcceptedFeature) -> String {
    if !feature.fingerprint.is_empty() {
        return feature.fingerprint.clone();
    }
    feature_unit_key(
        &feature.role,
        &feature.route,
        &feature.state,
        &feature.selector,
        &feature.action,
    )
}

fn audit_records<T: Serialize>(
    round: u32,
    now: DateTime<Utc>,
    accepted: &[T],
    rejected: &[Rejection],
) -> Vec<AuditRecord>
where
    T: AcceptedRecord,
{
    let mut records = Vec::with_capacity(accepted.len() + rejected.len());
    for entry in accepted {
        records.push(AuditRecord {
            round,
            decision: AuditDecision::Accepted,
            at: now,
            id: Some(entry.record_id().to_string()),
            fingerprint: Some(entry.record_fingerprint().to_string()),
            reason: None,
            source_file: entry.record_source().to_string(),
            candidate: serde_json::to_value(entry).unwrap_or(Value::Null),
        });
    }
    for entry in rejected {
        records.push(AuditRecord {
            round,
            decision: AuditDecision::Rejected,
            at: now,
            id: None,
            fingerprint: None,
            reason: Some(entry.reason.clone()),
            source_file: entry.source_file.clone(),
            candidate: entry.value.clone(),
        });
    }
    records
}

fn rejected_examples(rejected: &[Rejection]) -> Vec<RejectedExample> {
    rejected
        .iter()
        .take(5)
        .map(|entry| RejectedExample {
            reason: entry.reason.clone(),
            source_file: entry.source_file.clone(),
        })
        .collect()
}

trait AcceptedRecord: Serialize {
    fn record_id(&self) -> &str;
    fn record_fingerprint(&self) -> &str;
    fn record_source(&self) -> &str;
}

impl AcceptedRecord for AcceptedJourney {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn record_fingerprint(&self) -> &str {
        &self.fingerprint
    }
    fn record_source(&self) -> &str {
        &self.source_file
    }
}

impl AcceptedRecord for AcceptedFeature {
    fn record_id(&self) -> &str {
        &self.id
    }
    fn record_fingerprint(&self) -> &str {
        &self.fingerprint
    }
    fn record_source(&self) -> &str {
        &self.source_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{AgentType, ManifestTask};
    use serde_json::json;

    fn manifest_with_task(
        round: u32,
        task_id: &str,
        agent_type: AgentType,
        ids: Vec<String>,
    ) -> RoundManifest {
        let (journey_ids, feature_ids) = if agent_type.is_journey() {
            (ids.clone(), vec![])
        } else {
            (vec![], ids.clone())
        };
        RoundManifest {
            round,
            round_slug: round_slug(round),
            created_at: Utc::now(),
            status: RoundStatus::Prepared,
            selected_journey_ids: journey_ids,
            selected_feature_ids: feature_ids,
            tasks: vec![ManifestTask {
                task_id: task_id.to_string(),
                agent_type,
                prompt_file: agent_type.prompt_file(),
                item_count: ids.len(),
                ids,
            }],
            merged_at: None,
            merge_summary: None,
        }
    }

    fn base_inputs(manifest: RoundManifest, outputs: Vec<WorkerOutput>) -> MergeInputs {
        let round = manifest.round;
        MergeInputs {
            round,
            manifest,
            outputs,
            task_shards: BTreeMap::new(),
            journey_map: JourneyMap::default(),
            feature_map: FeatureMap::default(),
            journey_frontier: FrontierFile::default(),
            feature_frontier: FrontierFile::default(),
            config: OrchestrationConfig::default(),
            state: OrchestrationState {
                pending_round: Some(round),
                round: round - 1,
                ..Default::default()
            },
            now: Utc::now(),
        }
    }

    fn output(file_name: &str, payload: Value) -> WorkerOutput {
        WorkerOutput {
            file_name: file_name.to_string(),
            payload: serde_json::from_value(payload).unwrap(),
        }
    }

    fn valid_feature(selector: &str) -> Value {
        json!({
            "role": "admin",
            "route": "/dashboard",
            "state": "default",
            "selector": selector,
            "action": "click",
            "expected": "popup opens",
            "evidence": {"url": "/dashboard", "assertion": "popup visible"},
            "confidence": 0.9
        })
    }

    fn valid_journey(goal: &str) -> Value {
        json!({
            "role": "manager",
            "goal": goal,
            "keyRoutes": ["/dashboard", "/reports"],
            "terminalState": "report saved",
            "evidence": [{"url": "/reports"}],
            "confidence": 0.8
        })
    }

    #[test]
    fn accepts_valid_feature_and_updates_everything() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec!["seed-feature-admin-dashboard-filter".to_string()],
        );
        let outputs = vec![output(
            "task-01-feature-exercise.json",
            json!([valid_feature("#filter")]),
        )];
        let mut inputs = base_inputs(manifest, outputs);
        inputs.feature_frontier = FrontierFile {
            version: 1,
            items: vec![FeatureFrontierItem {
                id: "seed-feature-admin-dashboard-filter".to_string(),
                ..Default::default()
            }],
        };

        let outcome = merge_round(inputs);

        assert_eq!(outcome.feature_map.features.len(), 1);
        let accepted = &outcome.feature_map.features[0];
        assert_eq!(accepted.fingerprint, "admin|/dashboard|default|#filter|click");
        assert_eq!(accepted.status, "exercised");
        assert_eq!(accepted.accepted_round, 1);

        assert!(outcome.feature_frontier.items.is_empty());
        assert_eq!(outcome.feature_coverage.feature_coverage_pct, 100.0);
        assert_eq!(outcome.summary.counts.accepted_features, 1);
        assert_eq!(outcome.state.pending_round, None);
        assert_eq!(outcome.state.round, 1);
        assert_eq!(outcome.state.consecutive_no_findings, 0);
        assert_eq!(outcome.manifest.status, RoundStatus::Merged);
        assert!(outcome.manifest.merged_at.is_some());
    }

    #[test]
    fn duplicate_fingerprint_is_rejected_with_exact_reason() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec![],
        );
        let outputs = vec![output(
            "task-01-feature-exercise.json",
            json!([valid_feature("#filter"), valid_feature("  #FILTER ")]),
        )];
        let outcome = merge_round(base_inputs(manifest, outputs));

        assert_eq!(outcome.feature_map.features.len(), 1);
        assert_eq!(outcome.summary.counts.rejected_features, 1);
        assert_eq!(
            outcome.summary.rejected_examples.feature[0].reason,
            "Duplicate feature unit"
        );
    }

    #[test]
    fn fingerprint_already_in_map_blocks_reacceptance() {
        let manifest = manifest_with_task(
            2,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec![],
        );
        let outputs = vec![output(
            "task-01-feature-exercise.json",
            json!([valid_feature("#filter")]),
        )];
        let mut inputs = base_inputs(manifest, outputs);
        inputs.feature_map.features.push(AcceptedFeature {
            id: "feature-existing".to_string(),
            fingerprint: "admin|/dashboard|default|#filter|click".to_string(),
            ..Default::default()
        });

        let outcome = merge_round(inputs);
        assert_eq!(outcome.feature_map.features.len(), 1);
        assert_eq!(outcome.summary.counts.rejected_features, 1);
    }

    #[test]
    fn unreported_task_requeues_items_with_note_suffix() {
        let manifest = manifest_with_task(
            1,
            "task-01-journey-discover-new",
            AgentType::JourneyDiscoverNew,
            vec!["seed-journey-admin-dashboard".to_string()],
        );
        let mut inputs = base_inputs(manifest, vec![]);
        let item = JourneyFrontierItem {
            id: "seed-journey-admin-dashboard".to_string(),
            note: "Map the primary flow".to_string(),
            ..Default::default()
        };
        inputs.journey_frontier = FrontierFile {
            version: 1,
            items: vec![item.clone()],
        };
        inputs.task_shards.insert(
            "task-01-journey-discover-new".to_string(),
            TaskItems::Journey(vec![item]),
        );

        let outcome = merge_round(inputs);
        assert_eq!(outcome.journey_frontier.items.len(), 1);
        assert_eq!(
            outcome.journey_frontier.items[0].note,
            "Map the primary flow [requeued: missing output]"
        );
        assert_eq!(outcome.state.consecutive_no_findings, 1);
    }

    #[test]
    fn unreported_feature_task_requeues_onto_feature_frontier() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-inventory",
            AgentType::FeatureInventory,
            vec!["seed-feature-admin-dashboard-filter".to_string()],
        );
        let mut inputs = base_inputs(manifest, vec![]);
        let item = FeatureFrontierItem {
            id: "seed-feature-admin-dashboard-filter".to_string(),
            selector: "button[aria-label*='filter']".to_string(),
            action: "click".to_string(),
            note: "Open filter popup".to_string(),
            ..Default::default()
        };
        inputs.feature_frontier = FrontierFile {
            version: 1,
            items: vec![item.clone()],
        };
        inputs.task_shards.insert(
            "task-01-feature-inventory".to_string(),
            TaskItems::Feature(vec![item]),
        );

        let outcome = merge_round(inputs);
        assert!(outcome.journey_frontier.items.is_empty());
        assert_eq!(outcome.feature_frontier.items.len(), 1);
        let requeued = &outcome.feature_frontier.items[0];
        assert_eq!(requeued.selector, "button[aria-label*='filter']");
        assert_eq!(requeued.action, "click");
        assert_eq!(requeued.note, "Open filter popup [requeued: missing output]");
    }

    #[test]
    fn requeue_note_trims_when_original_note_empty() {
        assert_eq!(requeue_note(""), "[requeued: missing output]");
    }

    #[test]
    fn discovered_follow_ups_are_coerced_and_deduped() {
        let manifest = manifest_with_task(
            1,
            "task-01-journey-discover-new",
            AgentType::JourneyDiscoverNew,
            vec![],
        );
        let mut candidate = valid_journey("file a report");
        candidate["discoveredFrontier"] = json!([
            {"selector": "#export", "route": "/reports"},
            {"selector": "#export", "route": "/reports"},
            {"goal": "review archived reports"}
        ]);
        let outputs = vec![output(
            "task-01-journey-discover-new.json",
            json!([candidate]),
        )];

        let outcome = merge_round(base_inputs(manifest, outputs));

        assert_eq!(outcome.feature_frontier.items.len(), 1);
        let feature = &outcome.feature_frontier.items[0];
        assert_eq!(feature.mode, "inventory");
        assert_eq!(feature.role, "admin");
        assert_eq!(feature.action, "click");
        assert_eq!(feature.priority, Some(3));
        assert!(feature.id.starts_with("feature-frontier-"));

        assert_eq!(outcome.journey_frontier.items.len(), 1);
        let journey = &outcome.journey_frontier.items[0];
        assert_eq!(journey.note, "review archived reports");
        assert_eq!(journey.route, "/dashboard");
    }

    #[test]
    fn candidate_type_tag_overrides_file_name_classification() {
        let manifest = manifest_with_task(
            1,
            "task-01-journey-discover-new",
            AgentType::JourneyDiscoverNew,
            vec![],
        );
        let mut feature = valid_feature("#filter");
        feature["candidateType"] = json!("feature");
        let outputs = vec![output(
            "task-01-journey-discover-new.json",
            json!([feature]),
        )];

        let outcome = merge_round(base_inputs(manifest, outputs));
        assert_eq!(outcome.feature_map.features.len(), 1);
        assert!(outcome.journey_map.journeys.is_empty());
    }

    #[test]
    fn streak_resets_on_findings_and_drives_stagnation_gate() {
        let manifest = manifest_with_task(
            3,
            "task-01-journey-discover-new",
            AgentType::JourneyDiscoverNew,
            vec![],
        );
        let outputs = vec![output(
            "task-01-journey-discover-new.json",
            json!([valid_journey("g")]),
        )];
        let mut inputs = base_inputs(manifest, outputs);
        inputs.state.consecutive_no_findings = 2;

        let outcome = merge_round(inputs);
        assert_eq!(outcome.state.consecutive_no_findings, 0);
        assert!(!outcome.gates.stagnation_gate);
    }

    #[test]
    fn audit_records_accepted_then_rejected() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec![],
        );
        let outputs = vec![output(
            "task-01-feature-exercise.json",
            json!([valid_feature("#a"), {"role": "admin"}]),
        )];
        let outcome = merge_round(base_inputs(manifest, outputs));

        assert_eq!(outcome.feature_audit.len(), 2);
        assert_eq!(outcome.feature_audit[0].decision, AuditDecision::Accepted);
        assert!(outcome.feature_audit[0].id.is_some());
        assert_eq!(outcome.feature_audit[1].decision, AuditDecision::Rejected);
        assert_eq!(
            outcome.feature_audit[1].reason.as_deref(),
            Some("Missing one of required fields: role, route, state, selector, action")
        );
        assert_eq!(
            outcome.feature_audit[1].source_file,
            "task-01-feature-exercise.json"
        );
    }

    #[test]
    fn history_entry_appended_per_round() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec![],
        );
        let outcome = merge_round(base_inputs(manifest, vec![]));
        assert_eq!(outcome.state.history.len(), 1);
        let entry = &outcome.state.history[0];
        assert_eq!(entry.round, 1);
        assert_eq!(entry.no_findings_streak, 1);
    }

    #[test]
    fn completion_requires_all_gates() {
        let manifest = manifest_with_task(
            1,
            "task-01-feature-exercise",
            AgentType::FeatureExercise,
            vec![],
        );
        let outputs = vec![output(
            "task-01-feature-exercise.json",
            json!([valid_feature("#filter")]),
        )];
        let mut inputs = base_inputs(manifest, outputs);
        inputs.config.roles = vec!["admin".to_string()];

        // Feature and frontier gates pass, but the accepted feature resets
        // the streak and no journey covers the admin role.
        let outcome = merge_round(inputs);
        assert!(outcome.gates.feature_gate);
        assert!(outcome.gates.frontier_gate);
        assert!(!outcome.gates.role_gate);
        assert!(!outcome.completed);
    }
}
