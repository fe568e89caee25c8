//! Implementation of the `uxmap status` command.

use anyhow::Result;
use std::path::Path;

use crate::cli::display::{list_table, pct_or_dash};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{
    CoverageFile, FeatureCoverageSummary, FeatureFrontierItem, FeatureMap, FrontierFile,
    JourneyCoverageSummary, JourneyFrontierItem, JourneyMap, OrchestrationState,
};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::workspace::Workspace;

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusOutput {
    pub workspace: String,
    pub config: ConfigStatus,
    pub state: StateStatus,
    pub counts: CountStatus,
    pub coverage: CoverageStatus,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigStatus {
    pub roles: Vec<String>,
    pub target_route_coverage_pct: f64,
    pub target_feature_coverage_pct: f64,
    pub stagnation_threshold: u32,
    pub minimum_confidence: f64,
    pub max_workers_per_round: usize,
    pub default_shard_size: usize,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateStatus {
    pub round: u32,
    pub pending_round: Option<u32>,
    pub consecutive_no_findings: u32,
    pub completed: bool,
    pub last_run_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountStatus {
    pub accepted_journeys: usize,
    pub accepted_features: usize,
    pub journey_frontier: usize,
    pub feature_frontier: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct CoverageStatus {
    pub journey: JourneyCoverageSummary,
    pub feature: FeatureCoverageSummary,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let pending = self
            .state
            .pending_round
            .map_or_else(|| "none".to_string(), |round| round.to_string());

        let mut table = list_table(&["metric", "value"]);
        table.add_row(vec!["round".to_string(), self.state.round.to_string()]);
        table.add_row(vec!["pending round".to_string(), pending]);
        table.add_row(vec![
            "completed".to_string(),
            self.state.completed.to_string(),
        ]);
        table.add_row(vec![
            "no-findings streak".to_string(),
            self.state.consecutive_no_findings.to_string(),
        ]);
        table.add_row(vec![
            "accepted journeys".to_string(),
            self.counts.accepted_journeys.to_string(),
        ]);
        table.add_row(vec![
            "accepted features".to_string(),
            self.counts.accepted_features.to_string(),
        ]);
        table.add_row(vec![
            "journey frontier".to_string(),
            self.counts.journey_frontier.to_string(),
        ]);
        table.add_row(vec![
            "feature frontier".to_string(),
            self.counts.feature_frontier.to_string(),
        ]);
        table.add_row(vec![
            "route coverage".to_string(),
            pct_or_dash(self.coverage.journey.route_coverage_pct),
        ]);
        table.add_row(vec![
            "feature coverage".to_string(),
            format!("{}%", self.coverage.feature.feature_coverage_pct),
        ]);

        format!("Workspace: {}\n{table}", self.workspace)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Read-only snapshot of the workspace.
pub fn execute(root: &Path, json_mode: bool) -> Result<()> {
    let ws = Workspace::new(root);
    let config = ConfigLoader::load(&ws.config_path())?;
    let state: OrchestrationState = ws.read_json(&ws.state_path())?;
    let journey_map: JourneyMap = ws.read_json(&ws.journey_map_path())?;
    let feature_map: FeatureMap = ws.read_json(&ws.feature_map_path())?;
    let journey_frontier: FrontierFile<JourneyFrontierItem> =
        ws.read_json(&ws.journey_frontier_path())?;
    let feature_frontier: FrontierFile<FeatureFrontierItem> =
        ws.read_json(&ws.feature_frontier_path())?;
    let journey_coverage: CoverageFile<JourneyCoverageSummary> =
        ws.read_json(&ws.journey_coverage_path())?;
    let feature_coverage: CoverageFile<FeatureCoverageSummary> =
        ws.read_json(&ws.feature_coverage_path())?;

    let result = StatusOutput {
        workspace: ws.root().display().to_string(),
        config: ConfigStatus {
            roles: config.roles.clone(),
            target_route_coverage_pct: config.target_route_coverage_pct,
            target_feature_coverage_pct: config.target_feature_coverage_pct,
            stagnation_threshold: config.stagnation_threshold,
            minimum_confidence: config.minimum_confidence,
            max_workers_per_round: config.max_workers_per_round,
            default_shard_size: config.default_shard_size,
        },
        state: StateStatus {
            round: state.round,
            pending_round: state.pending_round,
            consecutive_no_findings: state.consecutive_no_findings,
            completed: state.completed,
            last_run_at: state.last_run_at,
        },
        counts: CountStatus {
            accepted_journeys: journey_map.journeys.len(),
            accepted_features: feature_map.features.len(),
            journey_frontier: journey_frontier.items.len(),
            feature_frontier: feature_frontier.items.len(),
        },
        coverage: CoverageStatus {
            journey: journey_coverage.summary,
            feature: feature_coverage.summary,
        },
    };
    output(&result, json_mode);
    Ok(())
}
