//! Implementation of the `uxmap merge-round` command.

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::cli::display::{gate_marker, pct_or_dash};
use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::OrchestratorError;
use crate::domain::models::{
    round_slug, CoverageFile, FeatureCoverageSummary, FeatureFrontierItem, FeatureMap,
    FrontierFile, JourneyCoverageSummary, JourneyFrontierItem, JourneyMap, OrchestrationState,
};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::workspace::Workspace;
use crate::services::merge::{merge_round, MergeInputs, MergeSummary};
use crate::services::report;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeOutput {
    pub success: bool,
    pub summary: MergeSummary,
}

impl CommandOutput for MergeOutput {
    fn to_human(&self) -> String {
        let s = &self.summary;
        let mut lines = vec![
            format!("Merged {}.", s.round_slug),
            format!(
                "  journeys: {} accepted, {} rejected",
                s.counts.accepted_journeys, s.counts.rejected_journeys
            ),
            format!(
                "  features: {} accepted, {} rejected",
                s.counts.accepted_features, s.counts.rejected_features
            ),
            format!(
                "  coverage: routes {} | features {}%",
                pct_or_dash(s.coverage.journey.route_coverage_pct),
                s.coverage.feature.feature_coverage_pct
            ),
            format!(
                "  frontier: {} journey, {} feature item(s) remaining",
                s.frontier.journey_remaining, s.frontier.feature_remaining
            ),
            format!(
                "  gates: route {} | feature {} | role {} | frontier {} | stagnation {}",
                gate_marker(s.gates.route_gate),
                gate_marker(s.gates.feature_gate),
                gate_marker(s.gates.role_gate),
                gate_marker(s.gates.frontier_gate),
                gate_marker(s.gates.stagnation_gate),
            ),
        ];
        for example in s
            .rejected_examples
            .journey
            .iter()
            .chain(&s.rejected_examples.feature)
        {
            lines.push(format!(
                "  rejected: {} ({})",
                example.reason, example.source_file
            ));
        }
        lines.push(if s.completed {
            "Discovery complete: all gates passed.".to_string()
        } else {
            "Discovery continues: run `uxmap prepare-round` for the next round.".to_string()
        });
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Merge the pending round. Everything is computed in memory first; files
/// are only written once the whole pass has succeeded.
pub fn execute(root: &Path, json_mode: bool) -> Result<()> {
    let ws = Workspace::new(root);
    let config = ConfigLoader::load(&ws.config_path())?;
    let state: OrchestrationState = ws.read_json(&ws.state_path())?;

    let round = state.pending_round.ok_or(OrchestratorError::NoPendingRound)?;
    let slug = round_slug(round);

    let manifest = ws.read_manifest(round, &slug)?;
    let outputs = ws.read_round_outputs(&slug)?;
    let task_shards = ws.read_task_shards(&slug)?;

    let journey_map: JourneyMap = ws.read_json(&ws.journey_map_path())?;
    let feature_map: FeatureMap = ws.read_json(&ws.feature_map_path())?;
    let journey_frontier: FrontierFile<JourneyFrontierItem> =
        ws.read_json(&ws.journey_frontier_path())?;
    let feature_frontier: FrontierFile<FeatureFrontierItem> =
        ws.read_json(&ws.feature_frontier_path())?;

    let now = Utc::now();
    let outcome = merge_round(MergeInputs {
        round,
        manifest,
        outputs,
        task_shards,
        journey_map,
        feature_map,
        journey_frontier,
        feature_frontier,
        config: config.clone(),
        state,
        now,
    });

    ws.write_json(&ws.journey_map_path(), &outcome.journey_map)?;
    ws.write_json(&ws.feature_map_path(), &outcome.feature_map)?;
    ws.write_json(&ws.journey_frontier_path(), &outcome.journey_frontier)?;
    ws.write_json(&ws.feature_frontier_path(), &outcome.feature_frontier)?;

    let mut journey_coverage: CoverageFile<JourneyCoverageSummary> =
        ws.read_json(&ws.journey_coverage_path())?;
    journey_coverage.record(round, now, outcome.journey_coverage.clone());
    ws.write_json(&ws.journey_coverage_path(), &journey_coverage)?;

    let mut feature_coverage: CoverageFile<FeatureCoverageSummary> =
        ws.read_json(&ws.feature_coverage_path())?;
    feature_coverage.record(round, now, outcome.feature_coverage.clone());
    ws.write_json(&ws.feature_coverage_path(), &feature_coverage)?;

    ws.write_text(
        &ws.journey_map_md_path(),
        &report::journey_markdown(&outcome.journey_map, &config),
    )?;
    ws.write_text(
        &ws.feature_map_md_path(),
        &report::feature_markdown(&outcome.feature_map),
    )?;

    ws.append_jsonl(&ws.journey_candidates_path(), &outcome.journey_audit)?;
    ws.append_jsonl(&ws.feature_candidates_path(), &outcome.feature_audit)?;

    ws.write_json(&ws.state_path(), &outcome.state)?;
    ws.write_json(&ws.merge_summary_path(&slug), &outcome.summary)?;
    ws.write_json(&ws.manifest_path(&slug), &outcome.manifest)?;

    let result = MergeOutput {
        success: true,
        summary: outcome.summary,
    };
    output(&result, json_mode);
    Ok(())
}
